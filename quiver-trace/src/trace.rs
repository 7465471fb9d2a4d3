use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::span::Span;

/// The entity that produced a group of spans, such as a process or host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Attributes describing the resource, keys unique.
    pub attributes: Attributes,
}

/// The instrumentation scope that emitted a group of spans.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// The instrumentation scope name, e.g. the library that produced the spans.
    pub name: String,
    /// The instrumentation scope version.
    pub version: String,
    /// Attributes describing the scope.
    pub attributes: Attributes,
}

/// Spans emitted by one instrumentation scope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSpans {
    /// The emitting scope.
    pub scope: Scope,
    /// The spans, in storage order.
    pub spans: Vec<Span>,
}

/// Spans emitted by one resource, grouped by instrumentation scope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpans {
    /// The emitting resource.
    pub resource: Resource,
    /// The scope groups, in storage order.
    pub scope_spans: Vec<ScopeSpans>,
}

/// A full trace as loaded from storage: all spans sharing one trace
/// identifier, grouped by resource and scope.
///
/// The model does not enforce that every span carries the same trace ID;
/// that invariant is the trace reader's responsibility.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// The resource groups, in storage order.
    pub resource_spans: Vec<ResourceSpans>,
}

impl Trace {
    /// Iterates over every span of the trace in document order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.resource_spans.iter().flat_map(|resource| {
            resource
                .scope_spans
                .iter()
                .flat_map(|scope| scope.spans.iter())
        })
    }

    /// Iterates mutably over every span of the trace in document order.
    pub fn spans_mut(&mut self) -> impl Iterator<Item = &mut Span> {
        self.resource_spans.iter_mut().flat_map(|resource| {
            resource
                .scope_spans
                .iter_mut()
                .flat_map(|scope| scope.spans.iter_mut())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SpanId;

    fn span(id: u64) -> Span {
        Span {
            span_id: SpanId::from_u64(id),
            ..Default::default()
        }
    }

    #[test]
    fn test_spans_iterates_in_document_order() {
        let trace = Trace {
            resource_spans: vec![
                ResourceSpans {
                    scope_spans: vec![
                        ScopeSpans {
                            spans: vec![span(1), span(2)],
                            ..Default::default()
                        },
                        ScopeSpans {
                            spans: vec![span(3)],
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                ResourceSpans {
                    scope_spans: vec![ScopeSpans {
                        spans: vec![span(4)],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
        };

        let ids: Vec<_> = trace.spans().map(|s| s.span_id.to_u64()).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
    }
}
