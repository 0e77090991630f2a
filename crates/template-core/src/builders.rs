//! The builder tree produced by template compilation.
//!
//! Each node is exclusively owned by its parent; the root is owned by the
//! caller. Once compilation returns, the tree is read-only: the renderer
//! walks it once per record without further mutation.
use crate::error::TemplateCompileError;
use crate::options::{EncodingHints, VendorOptions};
use crate::{Namespaces, WatchHandle};
use geotempl_cql::{CompiledContent, Expression};
use log::debug;
use serde_json::Value;
use std::sync::Arc;

/// A node of the compiled template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBuilder {
    Root(RootBuilder),
    Composite(CompositeBuilder),
    Iterating(IteratingBuilder),
    Static(StaticBuilder),
    Attribute(AttributeBuilder),
}

impl TemplateBuilder {
    pub fn name(&self) -> Option<&str> {
        match self {
            TemplateBuilder::Root(_) => None,
            TemplateBuilder::Composite(c) => c.name(),
            TemplateBuilder::Iterating(i) => i.name(),
            TemplateBuilder::Static(s) => s.name(),
            TemplateBuilder::Attribute(a) => a.name(),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, TemplateBuilder::Root(_))
    }

    /// Whether this variant can carry a `$source` / `$filter` pair.
    pub fn is_source_capable(&self) -> bool {
        matches!(
            self,
            TemplateBuilder::Composite(_) | TemplateBuilder::Iterating(_)
        )
    }

    pub fn children(&self) -> &[TemplateBuilder] {
        match self {
            TemplateBuilder::Root(r) => r.children(),
            TemplateBuilder::Composite(c) => c.children(),
            TemplateBuilder::Iterating(i) => i.children(),
            TemplateBuilder::Static(_) | TemplateBuilder::Attribute(_) => &[],
        }
    }

    pub fn add_child(&mut self, child: TemplateBuilder) -> Result<(), TemplateCompileError> {
        match self {
            TemplateBuilder::Root(r) => r.add_child(child),
            TemplateBuilder::Composite(c) => c.children.push(child),
            TemplateBuilder::Iterating(i) => i.children.push(child),
            other => {
                return Err(TemplateCompileError::InvalidNodeConfiguration(format!(
                    "a {} node cannot own children",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn source_spec(&self) -> Option<&SourceSpec> {
        match self {
            TemplateBuilder::Composite(c) => Some(&c.source),
            TemplateBuilder::Iterating(i) => Some(&i.source),
            _ => None,
        }
    }

    /// Sets the node's data source. The first source set in a directive
    /// scope wins; later ones are ignored.
    pub fn set_source(&mut self, source: Expression) -> Result<(), TemplateCompileError> {
        match self {
            TemplateBuilder::Composite(c) => c.source.set_source(source),
            TemplateBuilder::Iterating(i) => i.source.set_source(source),
            other => {
                return Err(TemplateCompileError::InvalidNodeConfiguration(format!(
                    "a data source cannot be set on a {} node",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: Expression) -> Result<(), TemplateCompileError> {
        match self {
            TemplateBuilder::Composite(c) => c.source.set_filter(filter),
            TemplateBuilder::Iterating(i) => i.source.set_filter(filter),
            other => {
                return Err(TemplateCompileError::InvalidNodeConfiguration(format!(
                    "a filter cannot be set on a {} node",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn top_level_feature(&self) -> bool {
        match self {
            TemplateBuilder::Composite(c) => c.top_level_feature,
            TemplateBuilder::Iterating(i) => i.top_level_feature,
            _ => false,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            TemplateBuilder::Root(_) => "root",
            TemplateBuilder::Composite(_) => "composite",
            TemplateBuilder::Iterating(_) => "iterating",
            TemplateBuilder::Static(_) => "static",
            TemplateBuilder::Attribute(_) => "attribute",
        }
    }
}

/// The source capability shared by composite and iterating nodes: what
/// collection/path the node reads from, an optional filter, and whether the
/// node's rendering produces its own enclosing object in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    source: Option<Expression>,
    filter: Option<Expression>,
    own_output: bool,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            source: None,
            filter: None,
            own_output: true,
        }
    }
}

impl SourceSpec {
    pub(crate) fn with_own_output(own_output: bool) -> Self {
        Self {
            own_output,
            ..Self::default()
        }
    }

    pub fn source(&self) -> Option<&Expression> {
        self.source.as_ref()
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    pub fn has_own_output(&self) -> bool {
        self.own_output
    }

    pub fn set_source(&mut self, source: Expression) {
        if self.source.is_some() {
            debug!("ignoring redefined $source, the first definition wins");
            return;
        }
        self.source = Some(source);
    }

    pub fn set_filter(&mut self, filter: Expression) {
        self.filter = Some(filter);
    }
}

/// The tree root: encoding hints, vendor options and the child list.
/// Carries no source or filter of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct RootBuilder {
    children: Vec<TemplateBuilder>,
    encoding_hints: EncodingHints,
    vendor_options: VendorOptions,
    namespaces: Arc<Namespaces>,
    watchers: Vec<WatchHandle>,
}

impl RootBuilder {
    pub(crate) fn new(namespaces: Arc<Namespaces>) -> Self {
        Self {
            children: Vec::new(),
            encoding_hints: EncodingHints::default(),
            vendor_options: VendorOptions::default(),
            namespaces,
            watchers: Vec::new(),
        }
    }

    pub fn children(&self) -> &[TemplateBuilder] {
        &self.children
    }

    pub fn add_child(&mut self, child: TemplateBuilder) {
        self.children.push(child);
    }

    pub fn encoding_hints(&self) -> &EncodingHints {
        &self.encoding_hints
    }

    pub fn encoding_hints_mut(&mut self) -> &mut EncodingHints {
        &mut self.encoding_hints
    }

    pub fn vendor_options(&self) -> &VendorOptions {
        &self.vendor_options
    }

    pub fn vendor_options_mut(&mut self) -> &mut VendorOptions {
        &mut self.vendor_options
    }

    pub fn namespaces(&self) -> &Arc<Namespaces> {
        &self.namespaces
    }

    pub fn watchers(&self) -> &[WatchHandle] {
        &self.watchers
    }

    pub fn attach_watchers(&mut self, watchers: Vec<WatchHandle>) {
        self.watchers = watchers;
    }
}

/// An object-shaped grouping node with ordered named children.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBuilder {
    pub(crate) name: Option<String>,
    pub(crate) source: SourceSpec,
    pub(crate) top_level_feature: bool,
    pub(crate) flattened: bool,
    pub(crate) separator: String,
    pub(crate) namespaces: Arc<Namespaces>,
    pub(crate) children: Vec<TemplateBuilder>,
}

impl CompositeBuilder {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    /// Whether, at render time, this node's output context is the top-level
    /// record rather than a nested property. Fixed at construction.
    pub fn top_level_feature(&self) -> bool {
        self.top_level_feature
    }

    pub fn is_flattened(&self) -> bool {
        self.flattened
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn namespaces(&self) -> &Arc<Namespaces> {
        &self.namespaces
    }

    pub fn children(&self) -> &[TemplateBuilder] {
        &self.children
    }
}

/// Represents a JSON array: iterates its source per record, instantiating
/// the child template once per item.
#[derive(Debug, Clone, PartialEq)]
pub struct IteratingBuilder {
    pub(crate) name: Option<String>,
    pub(crate) source: SourceSpec,
    pub(crate) top_level_feature: bool,
    pub(crate) namespaces: Arc<Namespaces>,
    pub(crate) children: Vec<TemplateBuilder>,
}

impl IteratingBuilder {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub fn top_level_feature(&self) -> bool {
        self.top_level_feature
    }

    pub fn namespaces(&self) -> &Arc<Namespaces> {
        &self.namespaces
    }

    pub fn children(&self) -> &[TemplateBuilder] {
        &self.children
    }
}

/// A verbatim JSON fragment with no embedded expressions, rendered
/// unchanged for every record.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticBuilder {
    pub(crate) name: Option<String>,
    pub(crate) payload: Value,
}

impl StaticBuilder {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// A dynamic leaf: one scalar property whose value or presence is computed
/// per record.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuilder {
    pub(crate) name: Option<String>,
    pub(crate) content: CompiledContent,
    pub(crate) filter: Option<Expression>,
}

impl AttributeBuilder {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn content(&self) -> &CompiledContent {
        &self.content
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }
}
