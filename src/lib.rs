//! geotempl - declarative JSON feature-templating.
//!
//! A template document mixes static JSON with directive keys (`$source`,
//! `$filter`, `@context`, `$options`) and `${...}` expressions. This crate
//! compiles such a document into an immutable tree of builder nodes that a
//! renderer walks once per data record to emit structured output.
//!
//! The workspace splits along the compiler/renderer seam:
//!
//! - [`geotempl_cql`]: the expression language embedded in templates
//! - [`geotempl_template_core`]: the builder tree and node factory
//! - [`geotempl_json_template`]: the JSON template reader
//!
//! ```
//! use geotempl::compile_template_str;
//!
//! let root = compile_template_str(r#"{"$source": "Roads", "name": "${name}"}"#).unwrap();
//! assert_eq!(root.children().len(), 1);
//! ```

pub use geotempl_cql as cql;
pub use geotempl_json_template::{JsonTemplateReader, ReaderConfiguration};
pub use geotempl_template_core::{
    BuilderMaker, EncodingHints, Namespaces, RootBuilder, TemplateBuilder, TemplateCompileError,
    TemplateReader, VendorOption, VendorOptions, WatchHandle,
};

use log::debug;

/// Parses JSON template source and compiles it into a builder tree with a
/// default configuration (no namespaces, no watch handles).
pub fn compile_template_str(template: &str) -> Result<RootBuilder, TemplateCompileError> {
    let document: serde_json::Value = serde_json::from_str(template)?;
    let reader = JsonTemplateReader::new(document, ReaderConfiguration::default(), Vec::new());
    let root = reader.root_builder()?;
    debug!("compiled template with {} root children", root.children().len());
    Ok(root)
}
