use crate::span::Span;
use crate::value::Value;

/// Reserved attribute key under which adjusters record per-span warnings.
///
/// Warnings are stored as an array of strings directly in the span's
/// attributes, so they survive any serialization of the span without schema
/// changes. They are additive; nothing ever removes them.
pub const WARNINGS_KEY: &str = "quiver.adjuster.warnings";

/// Appends a warning string to the span's reserved warnings attribute.
///
/// A non-array value already stored under [`WARNINGS_KEY`] is replaced; the
/// key is reserved and such a value can only come from misbehaving
/// instrumentation.
pub fn add_warning(span: &mut Span, warning: impl Into<String>) {
    let warning = Value::String(warning.into());
    match span.attributes.get_mut(WARNINGS_KEY) {
        Some(Value::Array(warnings)) => warnings.push(warning),
        _ => {
            span.attributes.insert(WARNINGS_KEY, Value::Array(vec![warning]));
        }
    }
}

/// Returns the warnings recorded on a span, in the order they were added.
pub fn warnings(span: &Span) -> Vec<&str> {
    match span.attributes.get(WARNINGS_KEY) {
        Some(Value::Array(warnings)) => warnings.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
