//! End-to-end template compilation through the public crate surface.

use geotempl::cql::{CompiledContent, Expression};
use geotempl::{
    JsonTemplateReader, Namespaces, ReaderConfiguration, TemplateBuilder, TemplateCompileError,
    TemplateReader, compile_template_str,
};
use serde_json::json;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn static_document_compiles_to_a_single_verbatim_node() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let template = r#"{"meta": {"title": "Road atlas"}, "pages": [1, 2, 3]}"#;
    let root = compile_template_str(template)?;

    assert_eq!(root.children().len(), 1);
    let TemplateBuilder::Static(payload) = &root.children()[0] else {
        panic!("expected a single static child, got {:?}", root.children());
    };
    assert_eq!(
        payload.payload(),
        &json!({"meta": {"title": "Road atlas"}, "pages": [1, 2, 3]})
    );
    Ok(())
}

#[test]
fn directives_and_attributes_round_trip_through_the_implicit_composite() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(
        r#"{
            "$source": "Cities",
            "$filter": "population > 10000",
            "name": "${name}",
            "country": "${address.country}"
        }"#,
    )?;

    assert_eq!(root.children().len(), 1);
    let TemplateBuilder::Composite(composite) = &root.children()[0] else {
        panic!("expected the implicit composite");
    };
    assert!(composite.top_level_feature());
    assert_eq!(
        composite.source().source(),
        Some(&Expression::Literal(json!("Cities")))
    );
    assert!(matches!(
        composite.source().filter(),
        Some(Expression::Comparison { .. })
    ));

    let names: Vec<_> = composite
        .children()
        .iter()
        .map(|child| child.name())
        .collect();
    assert_eq!(names, vec![Some("name"), Some("country")]);
    let TemplateBuilder::Attribute(country) = &composite.children()[1] else {
        panic!("expected a dynamic attribute for 'country'");
    };
    assert!(matches!(
        country.content(),
        CompiledContent::Expression(Expression::Property(_))
    ));
    Ok(())
}

#[test]
fn static_array_inside_a_dynamic_scope_stays_verbatim_under_its_iterating_node() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(r#"{"rows": ["${label}", [10, 20]]}"#)?;

    let TemplateBuilder::Iterating(rows) = &root.children()[0] else {
        panic!("expected an iterating node for 'rows'");
    };
    assert_eq!(rows.name(), Some("rows"));
    let TemplateBuilder::Iterating(inner) = &rows.children()[1] else {
        panic!("expected a nested iterating node for the static array");
    };
    assert_eq!(inner.children().len(), 1);
    let TemplateBuilder::Static(payload) = &inner.children()[0] else {
        panic!("expected the static array embedded verbatim");
    };
    assert_eq!(payload.payload(), &json!([10, 20]));
    Ok(())
}

#[test]
fn vendor_option_defaults_hold_without_an_options_block() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(r#"{"block": {"p": "${p}"}}"#)?;

    assert!(!root.vendor_options().flat_output());
    assert_eq!(root.vendor_options().separator(), "_");
    let TemplateBuilder::Composite(block) = &root.children()[0] else {
        panic!("expected a composite for 'block'");
    };
    assert!(!block.is_flattened());
    assert_eq!(block.separator(), "_");
    Ok(())
}

#[test]
fn vendor_options_flatten_nodes_built_after_the_block() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(
        r#"{
            "$options": {"flatOutput": "true", "separator": "."},
            "block": {"p": "${p}"}
        }"#,
    )?;

    assert!(root.vendor_options().flat_output());
    assert_eq!(root.vendor_options().separator(), ".");
    let TemplateBuilder::Composite(block) = &root.children()[0] else {
        panic!("expected a composite for 'block'");
    };
    assert!(block.is_flattened());
    assert_eq!(block.separator(), ".");
    Ok(())
}

#[test]
fn array_control_element_configures_the_iteration_and_leaves_no_child() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(
        r#"{
            "stops": [
                {"$source": "Stops", "$filter": "kind = 'bus'"},
                {"code": "${code}"}
            ]
        }"#,
    )?;

    let TemplateBuilder::Iterating(stops) = &root.children()[0] else {
        panic!("expected an iterating node for 'stops'");
    };
    assert_eq!(
        stops.source().source(),
        Some(&Expression::Literal(json!("Stops")))
    );
    assert!(stops.source().filter().is_some());
    assert_eq!(stops.children().len(), 1);
    assert!(matches!(stops.children()[0], TemplateBuilder::Composite(_)));
    Ok(())
}

#[test]
fn context_is_kept_as_an_encoding_hint_and_envelope_fields_are_skipped() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(
        r#"{
            "@context": {"geo": "http://example.com/geo"},
            "type": "FeatureCollection",
            "features": [{"properties": {"p": "${p}"}}]
        }"#,
    )?;

    assert_eq!(
        root.encoding_hints().get("@context"),
        Some(&json!({"geo": "http://example.com/geo"}))
    );
    assert!(root.children().is_empty());
    Ok(())
}

#[test]
fn envelope_text_never_survives_as_an_attribute() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = compile_template_str(r#"{"items": ["${name}", "FeatureCollection"]}"#)?;

    let TemplateBuilder::Iterating(items) = &root.children()[0] else {
        panic!("expected an iterating node for 'items'");
    };
    assert_eq!(items.children().len(), 1);
    assert!(matches!(items.children()[0], TemplateBuilder::Attribute(_)));
    Ok(())
}

#[test]
fn reader_configuration_namespaces_reach_the_compiled_tree() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut namespaces = Namespaces::new();
    namespaces.insert("gsml".to_string(), "urn:cgi:xmlns:GSML:2.0".to_string());
    let reader = JsonTemplateReader::new(
        json!({"unit": "${gsml:name}"}),
        ReaderConfiguration::new(namespaces),
        Vec::new(),
    );
    let root = reader.root_builder()?;

    assert_eq!(
        root.namespaces().get("gsml").map(String::as_str),
        Some("urn:cgi:xmlns:GSML:2.0")
    );
    let TemplateBuilder::Composite(composite) = &root.children()[0] else {
        panic!("expected the implicit composite");
    };
    let TemplateBuilder::Attribute(unit) = &composite.children()[0] else {
        panic!("expected a dynamic attribute for 'unit'");
    };
    assert!(matches!(
        unit.content(),
        CompiledContent::Expression(Expression::Property(_))
    ));
    Ok(())
}

#[test]
fn broken_json_and_broken_expressions_both_fail_compilation() {
    let _ = env_logger::builder().is_test(true).try_init();

    let err = compile_template_str(r#"{"unterminated": "#).unwrap_err();
    assert!(matches!(err, TemplateCompileError::JsonParse(_)));

    let err = compile_template_str(r#"{"p": "${name ???}"}"#).unwrap_err();
    assert!(matches!(err, TemplateCompileError::MalformedExpression(_)));
}
