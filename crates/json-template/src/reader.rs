//! The tree compiler: walks a parsed template document and grows the
//! builder tree through the node factory.
use crate::lexicon::{
    CONTEXT_KEY, FILTER_KEY, SOURCE_KEY, VENDOR_OPTIONS_KEY, drops_attribute, has_directives,
    is_array_control_node, is_dynamic, is_jump_field,
};
use geotempl_cql as cql;
use geotempl_template_core::{
    BuilderMaker, Namespaces, RootBuilder, TemplateBuilder, TemplateCompileError, TemplateReader,
    VendorOption, WatchHandle, options,
};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Maximum object/array nesting accepted before compilation aborts with
/// [`TemplateCompileError::ExcessiveNesting`]. Bounds stack usage against
/// pathological templates.
pub const MAX_TEMPLATE_DEPTH: usize = 128;

/// Reader-level configuration: the namespace map handed to the node
/// factory and carried in the tree.
#[derive(Debug, Clone, Default)]
pub struct ReaderConfiguration {
    namespaces: Arc<Namespaces>,
}

impl ReaderConfiguration {
    pub fn new(namespaces: Namespaces) -> Self {
        Self {
            namespaces: Arc::new(namespaces),
        }
    }

    pub fn namespaces(&self) -> &Arc<Namespaces> {
        &self.namespaces
    }

    /// A fresh node factory for one compilation run. Factories are never
    /// shared between compilations.
    pub fn builder_maker(&self) -> BuilderMaker {
        BuilderMaker::new(Arc::clone(&self.namespaces))
    }
}

/// Produces the builder tree from an already-parsed JSON template document.
pub struct JsonTemplateReader {
    template: Value,
    configuration: ReaderConfiguration,
    watchers: Vec<WatchHandle>,
}

impl JsonTemplateReader {
    pub fn new(
        template: Value,
        configuration: ReaderConfiguration,
        watchers: Vec<WatchHandle>,
    ) -> Self {
        Self {
            template,
            configuration,
            watchers,
        }
    }
}

impl TemplateReader for JsonTemplateReader {
    fn root_builder(&self) -> Result<RootBuilder, TemplateCompileError> {
        let mut compiler = TreeCompiler {
            maker: self.configuration.builder_maker(),
        };
        let mut root = compiler.maker.node().root(true).build()?;
        if !has_directives(&self.template.to_string()) {
            // Nothing to compile: the whole document renders verbatim.
            let node = compiler.maker.node().payload(self.template.clone()).build()?;
            root.add_child(node)?;
        } else {
            compiler.compile_value(None, &self.template, &mut root, 0)?;
        }
        let TemplateBuilder::Root(mut root) = root else {
            return Err(TemplateCompileError::InvalidNodeConfiguration(
                "the root configuration did not produce a root node".to_string(),
            ));
        };
        root.attach_watchers(self.watchers.clone());
        Ok(root)
    }
}

/// Walk state for one compilation run. The maker is owned here so vendor
/// option resolution can push new construction defaults mid-walk.
struct TreeCompiler {
    maker: BuilderMaker,
}

impl TreeCompiler {
    fn compile_value(
        &mut self,
        name: Option<&str>,
        node: &Value,
        current: &mut TemplateBuilder,
        depth: usize,
    ) -> Result<(), TemplateCompileError> {
        match node {
            Value::Object(object) => self.compile_object(object, current, depth),
            Value::Array(elements) => self.compile_array(name, node, elements, current, depth),
            scalar => self.compile_attribute(name, scalar, current),
        }
    }

    fn compile_object(
        &mut self,
        object: &Map<String, Value>,
        current: &mut TemplateBuilder,
        depth: usize,
    ) -> Result<(), TemplateCompileError> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(TemplateCompileError::ExcessiveNesting(MAX_TEMPLATE_DEPTH));
        }
        // A control node configures the builder it appears under instead of
        // contributing fields of its own.
        if is_array_control_node(object) {
            return self.apply_control(object, current);
        }

        // Directives, attributes and static fields at root scope land on an
        // implicit composite, created at most once per object scope: a root
        // never directly owns a source or attribute node.
        let mut implicit: Option<TemplateBuilder> = None;

        for (key, value) in object {
            if is_jump_field(key, value) {
                debug!("skipping reserved field '{key}'");
                continue;
            }
            match key.as_str() {
                SOURCE_KEY => {
                    let target = self.composite_if_needed(current, &mut implicit)?;
                    target.set_source(cql::parse_expression(&scalar_text(value))?)?;
                }
                FILTER_KEY => {
                    let target = self.composite_if_needed(current, &mut implicit)?;
                    target.set_filter(cql::parse_filter(&scalar_text(value))?)?;
                }
                CONTEXT_KEY => match attach_point(current, &mut implicit) {
                    TemplateBuilder::Root(root) => {
                        root.encoding_hints_mut()
                            .insert_if_absent(CONTEXT_KEY, value.clone());
                    }
                    _ => {
                        return Err(TemplateCompileError::MalformedDirective(
                            "@context is only recognized at the template root".to_string(),
                        ))
                    }
                },
                VENDOR_OPTIONS_KEY => match attach_point(current, &mut implicit) {
                    TemplateBuilder::Root(root) => self.resolve_vendor_options(value, root)?,
                    _ => {
                        return Err(TemplateCompileError::MalformedDirective(
                            "$options is only recognized at the template root".to_string(),
                        ))
                    }
                },
                _ => self.compile_field(key, value, current, &mut implicit, depth)?,
            }
        }

        if let Some(composite) = implicit {
            current.add_child(composite)?;
        }
        Ok(())
    }

    /// Classifies one ordinary (non-directive) object field.
    fn compile_field(
        &mut self,
        key: &str,
        value: &Value,
        current: &mut TemplateBuilder,
        implicit: &mut Option<TemplateBuilder>,
        depth: usize,
    ) -> Result<(), TemplateCompileError> {
        let serialized = value.to_string();
        // A $source-only object value configures the enclosing builder and
        // contributes no child of its own. Filter-bearing control objects
        // are dynamic and compile to a named composite carrying the filter
        // themselves.
        if let Value::Object(child_object) = value
            && is_array_control_node(child_object)
            && !is_dynamic(&serialized)
        {
            let target = self.composite_if_needed(current, implicit)?;
            return self.apply_control(child_object, target);
        }
        if !is_dynamic(&serialized) {
            // Fast path: embed pure static subtrees verbatim, no recursion.
            let target = self.composite_if_needed(current, implicit)?;
            let node = self
                .maker
                .node()
                .name(key)
                .payload(value.clone())
                .build()?;
            target.add_child(node)?;
            return Ok(());
        }
        match value {
            Value::Object(child_object) => {
                let target = attach_point(current, implicit);
                let top_level = inherits_top_level_feature(target);
                let mut composite = self
                    .maker
                    .node()
                    .name(key)
                    .top_level_feature(top_level)
                    .build()?;
                self.compile_object(child_object, &mut composite, depth + 1)?;
                target.add_child(composite)?;
            }
            Value::Array(elements) => {
                let target = attach_point(current, implicit);
                self.compile_array(Some(key), value, elements, target, depth + 1)?;
            }
            scalar => {
                let target = self.composite_if_needed(current, implicit)?;
                self.compile_attribute(Some(key), scalar, target)?;
            }
        }
        Ok(())
    }

    fn compile_array(
        &mut self,
        name: Option<&str>,
        node: &Value,
        elements: &[Value],
        parent: &mut TemplateBuilder,
        depth: usize,
    ) -> Result<(), TemplateCompileError> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(TemplateCompileError::ExcessiveNesting(MAX_TEMPLATE_DEPTH));
        }
        let top_level = inherits_top_level_feature(parent);
        let mut config = self
            .maker
            .node()
            .collection(true)
            .top_level_feature(top_level);
        if let Some(name) = name {
            config = config.name(name);
        }
        let mut iterating = config.build()?;

        if !is_dynamic(&node.to_string()) {
            // The whole array is static: one verbatim child, no per-element
            // decomposition.
            let mut config = self.maker.node().payload(node.clone());
            if let Some(name) = name {
                config = config.name(name);
            }
            iterating.add_child(config.build()?)?;
        } else {
            for element in elements {
                match element {
                    Value::Object(object) => {
                        if is_array_control_node(object) {
                            self.compile_object(object, &mut iterating, depth + 1)?;
                        } else if is_dynamic(&element.to_string()) {
                            let element_top_level = inherits_top_level_feature(parent);
                            let mut composite = self
                                .maker
                                .node()
                                .top_level_feature(element_top_level)
                                .build()?;
                            self.compile_object(object, &mut composite, depth + 1)?;
                            iterating.add_child(composite)?;
                        } else {
                            let node = self.maker.node().payload(element.clone()).build()?;
                            iterating.add_child(node)?;
                        }
                    }
                    Value::Array(inner) => {
                        self.compile_array(None, element, inner, &mut iterating, depth + 1)?;
                    }
                    scalar => self.compile_attribute(None, scalar, &mut iterating)?,
                }
            }
        }
        parent.add_child(iterating)
    }

    fn compile_attribute(
        &self,
        name: Option<&str>,
        node: &Value,
        current: &mut TemplateBuilder,
    ) -> Result<(), TemplateCompileError> {
        let text = scalar_text(node);
        if drops_attribute(&text) {
            debug!("dropping attribute with reserved envelope text");
            return Ok(());
        }
        let mut config = self.maker.node().content_and_filter(text);
        if let Some(name) = name {
            config = config.name(name);
        }
        current.add_child(config.build()?)
    }

    /// Applies a control node's `$source`/`$filter` pair to the given
    /// builder. Produces no children.
    fn apply_control(
        &self,
        object: &Map<String, Value>,
        target: &mut TemplateBuilder,
    ) -> Result<(), TemplateCompileError> {
        if let Some(source) = object.get(SOURCE_KEY) {
            target.set_source(cql::parse_expression(&scalar_text(source))?)?;
        }
        if let Some(filter) = object.get(FILTER_KEY) {
            target.set_filter(cql::parse_filter(&scalar_text(filter))?)?;
        }
        Ok(())
    }

    /// The explicit implicit-composite step: under a root parent, directives
    /// and leaves need a composite to land on. Created once per scope, it
    /// absorbs every later root-scope field as well.
    fn composite_if_needed<'t>(
        &self,
        current: &'t mut TemplateBuilder,
        implicit: &'t mut Option<TemplateBuilder>,
    ) -> Result<&'t mut TemplateBuilder, TemplateCompileError> {
        if implicit.is_none() && current.is_root() {
            trace!("synthesizing implicit composite under the root");
            let composite = self.maker.node().top_level_feature(true).build()?;
            return Ok(implicit.insert(composite));
        }
        Ok(attach_point(current, implicit))
    }

    /// Resolves the root `$options` block and pushes the flatten/separator
    /// results into the factory defaults for every node built afterwards.
    fn resolve_vendor_options(
        &mut self,
        node: &Value,
        root: &mut RootBuilder,
    ) -> Result<(), TemplateCompileError> {
        let Value::Object(option_block) = node else {
            return Err(TemplateCompileError::MalformedDirective(
                "$options must be defined as a JSON object".to_string(),
            ));
        };
        if let Some(value) = option_block.get(options::FLAT_OUTPUT) {
            let expr = cql::parse_expression(&scalar_text(value))?;
            root.vendor_options_mut()
                .insert(options::FLAT_OUTPUT, VendorOption::Expression(expr));
        }
        if let Some(value) = option_block.get(options::SEPARATOR) {
            let expr = cql::parse_expression(&scalar_text(value))?;
            root.vendor_options_mut()
                .insert(options::SEPARATOR, VendorOption::Expression(expr));
        }
        if let Some(value) = option_block.get(CONTEXT_KEY) {
            root.vendor_options_mut()
                .insert(options::CONTEXT, VendorOption::Json(value.clone()));
        }
        let flat_output = root.vendor_options().flat_output();
        let separator = root.vendor_options().separator();
        debug!("vendor options resolved: flat_output={flat_output}, separator='{separator}'");
        self.maker.set_flat_output(flat_output);
        self.maker.set_separator(separator);
        Ok(())
    }
}

/// The builder new children land on: the implicit composite once it
/// exists, the current builder otherwise.
fn attach_point<'t>(
    current: &'t mut TemplateBuilder,
    implicit: &'t mut Option<TemplateBuilder>,
) -> &'t mut TemplateBuilder {
    match implicit {
        Some(composite) => composite,
        None => current,
    }
}

/// Top-level-feature propagation: true when the constructing parent is the
/// root, or a source-capable node whose output merges into its parent's.
fn inherits_top_level_feature(parent: &TemplateBuilder) -> bool {
    match parent {
        TemplateBuilder::Root(_) => true,
        other => other
            .source_spec()
            .is_some_and(|spec| !spec.has_own_output()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
