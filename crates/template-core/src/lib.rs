//! Core abstractions for feature-template compilation
//!
//! This crate defines the contract between template readers (JSON today,
//! other formats later) and the rendering pipeline: the builder tree a
//! reader produces, the node factory it constructs nodes with, and the
//! error surface shared by both sides.
//!
//! ## Key abstractions
//!
//! - **`TemplateBuilder`**: the tagged builder tree, owned root to leaf
//! - **`BuilderMaker`**: configuration-carrying node factory
//! - **`VendorOptions` / `EncodingHints`**: root-level settings carried in
//!   the tree for the renderer
//! - **`TemplateReader`**: trait implemented by each template format reader

pub mod builders;
pub mod error;
pub mod maker;
pub mod options;

pub use builders::{
    AttributeBuilder, CompositeBuilder, IteratingBuilder, RootBuilder, SourceSpec, StaticBuilder,
    TemplateBuilder,
};
pub use error::TemplateCompileError;
pub use maker::{BuilderMaker, NodeConfig};
pub use options::{EncodingHints, VendorOption, VendorOptions};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Namespace prefix to URI mapping, used to qualify names at render time.
pub type Namespaces = HashMap<String, String>;

/// An opaque handle to a template file dependency. Readers forward these
/// onto the root builder untouched; reload policy lives with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchHandle {
    path: PathBuf,
}

impl WatchHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A reader that compiles one template document into a builder tree.
///
/// Compilation is all-or-nothing: either a complete `RootBuilder` comes
/// back, or a single error describing the first problem found.
pub trait TemplateReader {
    fn root_builder(&self) -> Result<RootBuilder, TemplateCompileError>;
}
