use quiver_trace::Trace;

use crate::{Adjuster, AdjusterError};

/// Sorts every attribute mapping and event list of the trace into canonical
/// order.
///
/// Resource, scope, span, event and link attributes are ordered
/// lexicographically by key; span events are ordered by event name. Values
/// are never modified, so this is a pure permutation and idempotent.
///
/// Content hashing in [`DeduplicateSpans`](crate::DeduplicateSpans) relies on
/// this canonical order to recognize spans that differ only in attribute
/// order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortAttributesAndEvents;

impl Adjuster for SortAttributesAndEvents {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        for resource_spans in &mut trace.resource_spans {
            resource_spans.resource.attributes.sort_keys();
            for scope_spans in &mut resource_spans.scope_spans {
                scope_spans.scope.attributes.sort_keys();
                for span in &mut scope_spans.spans {
                    span.attributes.sort_keys();
                    span.events.sort_by(|a, b| a.name.cmp(&b.name));
                    for event in &mut span.events {
                        event.attributes.sort_keys();
                    }
                    for link in &mut span.links {
                        link.attributes.sort_keys();
                    }
                }
            }
        }
        Ok(())
    }
}
