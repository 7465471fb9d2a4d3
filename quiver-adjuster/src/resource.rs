use quiver_trace::{add_warning, Trace};

use crate::{Adjuster, AdjusterError};

/// Identification keys that describe the producing SDK rather than the
/// operation, and therefore belong on the resource.
const RESOURCE_ATTRIBUTE_KEYS: [&str; 5] = [
    "telemetry.sdk.language",
    "telemetry.sdk.name",
    "telemetry.sdk.version",
    "telemetry.distro.name",
    "telemetry.distro.version",
];

/// Moves SDK identification attributes from spans onto their resource.
///
/// Some SDKs record these keys per span. If the resource has no value for the
/// key, the span's value is moved there; if the resource holds an equal
/// value, the span's redundant copy is removed. A conflicting resource value
/// leaves the span untouched and records a warning naming the key, so the
/// discrepancy stays visible instead of being papered over.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveResourceAttributes;

enum Action {
    Move,
    RemoveRedundant,
    Conflict,
}

impl Adjuster for MoveResourceAttributes {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        for resource_spans in &mut trace.resource_spans {
            let resource = &mut resource_spans.resource;
            for scope_spans in &mut resource_spans.scope_spans {
                for span in &mut scope_spans.spans {
                    for key in RESOURCE_ATTRIBUTE_KEYS {
                        let action = match (span.attributes.get(key), resource.attributes.get(key))
                        {
                            (None, _) => continue,
                            (Some(_), None) => Action::Move,
                            (Some(span_value), Some(resource_value))
                                if span_value == resource_value =>
                            {
                                Action::RemoveRedundant
                            }
                            (Some(_), Some(_)) => Action::Conflict,
                        };
                        match action {
                            Action::Move => {
                                if let Some(value) = span.attributes.remove(key) {
                                    resource.attributes.insert(key, value);
                                }
                            }
                            Action::RemoveRedundant => {
                                span.attributes.remove(key);
                            }
                            Action::Conflict => add_warning(
                                span,
                                format!(
                                    "conflicting values between span and resource for attribute {key}"
                                ),
                            ),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quiver_trace::{warnings, Attributes, Resource, ResourceSpans, ScopeSpans, Span, Value};

    use super::*;

    fn trace_with(resource: Attributes, span_attributes: Attributes) -> Trace {
        Trace {
            resource_spans: vec![ResourceSpans {
                resource: Resource { attributes: resource },
                scope_spans: vec![ScopeSpans {
                    spans: vec![Span {
                        attributes: span_attributes,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
            }],
        }
    }

    #[test]
    fn test_missing_resource_value_is_moved() {
        let mut trace = trace_with(
            Attributes::new(),
            Attributes::from_iter([("telemetry.sdk.language", "Go")]),
        );
        MoveResourceAttributes.adjust(&mut trace).unwrap();

        let resource = &trace.resource_spans[0].resource;
        assert_eq!(
            resource.attributes.get("telemetry.sdk.language"),
            Some(&Value::String("Go".to_owned()))
        );
        let span = trace.spans().next().unwrap();
        assert!(!span.attributes.contains_key("telemetry.sdk.language"));
        assert!(warnings(span).is_empty());
    }

    #[test]
    fn test_equal_resource_value_removes_span_copy() {
        let mut trace = trace_with(
            Attributes::from_iter([("telemetry.sdk.name", "opentelemetry")]),
            Attributes::from_iter([("telemetry.sdk.name", "opentelemetry")]),
        );
        MoveResourceAttributes.adjust(&mut trace).unwrap();

        let span = trace.spans().next().unwrap();
        assert!(!span.attributes.contains_key("telemetry.sdk.name"));
        assert!(warnings(span).is_empty());
    }

    #[test]
    fn test_conflicting_resource_value_warns_and_keeps_span_value() {
        let mut trace = trace_with(
            Attributes::from_iter([("telemetry.sdk.language", "Java")]),
            Attributes::from_iter([("telemetry.sdk.language", "Go")]),
        );
        MoveResourceAttributes.adjust(&mut trace).unwrap();

        let resource = &trace.resource_spans[0].resource;
        assert_eq!(
            resource.attributes.get("telemetry.sdk.language"),
            Some(&Value::String("Java".to_owned()))
        );
        let span = trace.spans().next().unwrap();
        assert_eq!(
            span.attributes.get("telemetry.sdk.language"),
            Some(&Value::String("Go".to_owned()))
        );
        assert_eq!(
            warnings(span),
            ["conflicting values between span and resource for attribute telemetry.sdk.language"]
        );
    }

    #[test]
    fn test_unrelated_attributes_stay_on_the_span() {
        let mut trace = trace_with(
            Attributes::new(),
            Attributes::from_iter([("http.method", "GET")]),
        );
        MoveResourceAttributes.adjust(&mut trace).unwrap();

        let span = trace.spans().next().unwrap();
        assert_eq!(
            span.attributes.get("http.method"),
            Some(&Value::String("GET".to_owned()))
        );
    }
}
