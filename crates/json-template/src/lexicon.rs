//! The directive lexicon: the fixed set of recognized directive keys and
//! the predicates that classify template fields while the compiler walks
//! the document.
use serde_json::{Map, Value};

/// Sets the enclosing source-capable node's data source.
pub const SOURCE_KEY: &str = "$source";
/// Sets the enclosing node's filter expression.
pub const FILTER_KEY: &str = "$filter";
/// Root-level encoding hint holding a context document.
pub const CONTEXT_KEY: &str = "@context";
/// Root-level vendor option block.
pub const VENDOR_OPTIONS_KEY: &str = "$options";
/// Marks an embedded expression anywhere in a serialized value.
pub const EXPR_START: &str = "${";

const FEATURE_COLLECTION: &str = "FeatureCollection";

/// Whether a serialized subtree contains dynamic content.
///
/// Classification is a substring probe on the serialized form, not a
/// structural parse: a `$filter` appearing inside a static string still
/// counts as dynamic. False positives only force recursion into a subtree
/// that ends up static; false negatives would break the renderer, so the
/// conservative probe is kept deliberately.
pub fn is_dynamic(serialized: &str) -> bool {
    serialized.contains(EXPR_START) || serialized.contains(FILTER_KEY)
}

/// Whether a serialized document mentions any directive at all. A template
/// with no directives and no markers compiles to a single verbatim static
/// node, skipping the walk entirely.
pub fn has_directives(serialized: &str) -> bool {
    is_dynamic(serialized)
        || serialized.contains(SOURCE_KEY)
        || serialized.contains(VENDOR_OPTIONS_KEY)
        || serialized.contains(CONTEXT_KEY)
}

/// Fields owned by the output envelope writer rather than the template:
/// `"type": "FeatureCollection"` and the `features` key (both key matches
/// are ASCII case-insensitive). The compiler skips them entirely.
pub fn is_jump_field(name: &str, value: &Value) -> bool {
    (name.eq_ignore_ascii_case("type")
        && value.as_str().is_some_and(|text| text == FEATURE_COLLECTION))
        || name.eq_ignore_ascii_case("features")
}

/// An attribute scalar mentioning the envelope type is likewise dropped.
/// The probe is `contains`, not equality, matching the reference behavior.
pub fn drops_attribute(text: &str) -> bool {
    text.contains(FEATURE_COLLECTION)
}

/// An array control node is an object element consisting solely of
/// `$source`, solely of `$filter`, or both: it configures the enclosing
/// iterating node instead of contributing a data element.
pub fn is_array_control_node(object: &Map<String, Value>) -> bool {
    (object.len() == 1
        && (object.contains_key(SOURCE_KEY) || object.contains_key(FILTER_KEY)))
        || (object.len() == 2
            && object.contains_key(SOURCE_KEY)
            && object.contains_key(FILTER_KEY))
}
