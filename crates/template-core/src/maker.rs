//! The node factory.
//!
//! `BuilderMaker` carries only the cross-node defaults (flatten/separator
//! settings and the namespace map). Every node-creation site gets a fresh
//! `NodeConfig` value from [`BuilderMaker::node`], fills it with chained
//! setters and consumes it with [`NodeConfig::build`], so no field state
//! can bleed between sibling nodes.
use crate::builders::{
    AttributeBuilder, CompositeBuilder, IteratingBuilder, RootBuilder, SourceSpec, StaticBuilder,
    TemplateBuilder,
};
use crate::error::TemplateCompileError;
use crate::options::DEFAULT_SEPARATOR;
use crate::Namespaces;
use geotempl_cql::parse_content_and_filter;
use serde_json::Value;
use std::sync::Arc;

/// Configuration-carrying constructor for template builder nodes.
#[derive(Debug, Clone)]
pub struct BuilderMaker {
    flat_output: bool,
    separator: String,
    namespaces: Arc<Namespaces>,
}

impl Default for BuilderMaker {
    fn default() -> Self {
        Self::new(Arc::new(Namespaces::new()))
    }
}

impl BuilderMaker {
    pub fn new(namespaces: Arc<Namespaces>) -> Self {
        Self {
            flat_output: false,
            separator: DEFAULT_SEPARATOR.to_string(),
            namespaces,
        }
    }

    /// Updates the flattening default inherited by every node built after
    /// this call. Set while the root's `$options` block resolves.
    pub fn set_flat_output(&mut self, flat_output: bool) {
        self.flat_output = flat_output;
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.separator = separator.into();
    }

    pub fn namespaces(&self) -> &Arc<Namespaces> {
        &self.namespaces
    }

    /// Starts a fresh per-call node configuration.
    pub fn node(&self) -> NodeConfig<'_> {
        NodeConfig {
            maker: self,
            name: None,
            payload: None,
            content: None,
            collection: false,
            top_level_feature: false,
            own_output: true,
            root: false,
        }
    }
}

/// An immutable-per-call node configuration. Variant selection happens in
/// [`NodeConfig::build`]: `root` wins, then a payload makes a static node, a
/// collection flag an iterating node, content an attribute, and anything
/// else a composite.
#[derive(Debug)]
pub struct NodeConfig<'a> {
    maker: &'a BuilderMaker,
    name: Option<String>,
    payload: Option<Value>,
    content: Option<String>,
    collection: bool,
    top_level_feature: bool,
    own_output: bool,
    root: bool,
}

impl NodeConfig<'_> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Verbatim JSON payload; forces a static node.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Raw attribute text, compiled into content and an optional
    /// `$filter{...}` predicate at build time; forces an attribute node.
    pub fn content_and_filter(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Forces an iterating node.
    pub fn collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn top_level_feature(mut self, top_level_feature: bool) -> Self {
        self.top_level_feature = top_level_feature;
        self
    }

    pub fn own_output(mut self, own_output: bool) -> Self {
        self.own_output = own_output;
        self
    }

    /// Forces the root variant; excludes every node-shaping field.
    pub fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    /// Produces exactly one immutable node, or fails when the configured
    /// fields do not fit any single variant.
    pub fn build(self) -> Result<TemplateBuilder, TemplateCompileError> {
        if self.root {
            if self.payload.is_some() || self.content.is_some() || self.collection {
                return Err(TemplateCompileError::InvalidNodeConfiguration(
                    "a root node carries no payload, content or collection flag".to_string(),
                ));
            }
            return Ok(TemplateBuilder::Root(RootBuilder::new(Arc::clone(
                &self.maker.namespaces,
            ))));
        }
        if let Some(payload) = self.payload {
            if self.content.is_some() || self.collection {
                return Err(TemplateCompileError::InvalidNodeConfiguration(
                    "a static payload excludes content and the collection flag".to_string(),
                ));
            }
            return Ok(TemplateBuilder::Static(StaticBuilder {
                name: self.name,
                payload,
            }));
        }
        if self.collection {
            if self.content.is_some() {
                return Err(TemplateCompileError::InvalidNodeConfiguration(
                    "an iterating node cannot carry attribute content".to_string(),
                ));
            }
            return Ok(TemplateBuilder::Iterating(IteratingBuilder {
                name: self.name,
                source: SourceSpec::with_own_output(self.own_output),
                top_level_feature: self.top_level_feature,
                namespaces: Arc::clone(&self.maker.namespaces),
                children: Vec::new(),
            }));
        }
        if let Some(text) = self.content {
            let (content, filter) = parse_content_and_filter(&text)?;
            return Ok(TemplateBuilder::Attribute(AttributeBuilder {
                name: self.name,
                content,
                filter,
            }));
        }
        Ok(TemplateBuilder::Composite(CompositeBuilder {
            name: self.name,
            source: SourceSpec::with_own_output(self.own_output),
            top_level_feature: self.top_level_feature,
            flattened: self.maker.flat_output,
            separator: self.maker.separator.clone(),
            namespaces: Arc::clone(&self.maker.namespaces),
            children: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotempl_cql::CompiledContent;
    use serde_json::json;

    #[test]
    fn variant_selection_follows_configured_fields() {
        let maker = BuilderMaker::default();
        assert!(matches!(
            maker.node().root(true).build().unwrap(),
            TemplateBuilder::Root(_)
        ));
        assert!(matches!(
            maker.node().payload(json!([1, 2])).build().unwrap(),
            TemplateBuilder::Static(_)
        ));
        assert!(matches!(
            maker.node().collection(true).build().unwrap(),
            TemplateBuilder::Iterating(_)
        ));
        assert!(matches!(
            maker.node().content_and_filter("${x}").build().unwrap(),
            TemplateBuilder::Attribute(_)
        ));
        assert!(matches!(
            maker.node().name("group").build().unwrap(),
            TemplateBuilder::Composite(_)
        ));
    }

    #[test]
    fn conflicting_fields_are_rejected() {
        let maker = BuilderMaker::default();
        let err = maker
            .node()
            .payload(json!(1))
            .content_and_filter("${x}")
            .build();
        assert!(matches!(
            err,
            Err(TemplateCompileError::InvalidNodeConfiguration(_))
        ));
        let err = maker.node().root(true).collection(true).build();
        assert!(matches!(
            err,
            Err(TemplateCompileError::InvalidNodeConfiguration(_))
        ));
    }

    #[test]
    fn no_state_bleeds_between_configurations() {
        let maker = BuilderMaker::default();
        let first = maker.node().name("first").build().unwrap();
        let second = maker.node().build().unwrap();
        assert_eq!(first.name(), Some("first"));
        assert_eq!(second.name(), None);
    }

    #[test]
    fn flatten_defaults_reach_later_nodes_only() {
        let mut maker = BuilderMaker::default();
        let before = maker.node().name("a").build().unwrap();
        maker.set_flat_output(true);
        maker.set_separator(".");
        let after = maker.node().name("b").build().unwrap();
        match (before, after) {
            (TemplateBuilder::Composite(before), TemplateBuilder::Composite(after)) => {
                assert!(!before.is_flattened());
                assert_eq!(before.separator(), "_");
                assert!(after.is_flattened());
                assert_eq!(after.separator(), ".");
            }
            _ => panic!("expected composite nodes"),
        }
    }

    #[test]
    fn attribute_content_is_compiled_at_build_time() {
        let maker = BuilderMaker::default();
        let node = maker
            .node()
            .name("n")
            .content_and_filter("$filter{a = 1}, ${b}")
            .build()
            .unwrap();
        let TemplateBuilder::Attribute(attribute) = node else {
            panic!("expected an attribute node");
        };
        assert!(matches!(attribute.content(), CompiledContent::Expression(_)));
        assert!(attribute.filter().is_some());
    }
}
