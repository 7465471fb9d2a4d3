use quiver_trace::{add_warning, Trace};

use crate::{Adjuster, AdjusterError};

const WARNING_INVALID_LINK: &str = "invalid span link removed";

/// Removes span links that reference the all-zero trace ID.
///
/// Such links are emitted by instrumentation that populates link structures
/// without a valid trace context. Every removal is recorded as a warning on
/// the owning span; valid links keep their relative order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveInvalidLinks;

impl Adjuster for RemoveInvalidLinks {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        for span in trace.spans_mut() {
            let before = span.links.len();
            span.links.retain(|link| !link.trace_id.is_zero());
            for _ in span.links.len()..before {
                add_warning(span, WARNING_INVALID_LINK);
            }
        }
        Ok(())
    }
}
