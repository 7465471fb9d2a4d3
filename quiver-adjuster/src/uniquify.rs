use std::collections::{HashMap, HashSet};

use quiver_trace::{add_warning, SpanId, SpanKind, Trace};

use crate::{Adjuster, AdjusterError};

const WARNING_TOO_MANY_SPANS: &str = "cannot assign unique span ID, too many spans in the trace";

/// Resolves span ID collisions between the client and server side of one
/// call.
///
/// Some instrumentation reuses a single span ID for both halves of an RPC.
/// Later steps (tree reconstruction, clock skew, UI rendering) require unique
/// IDs, so every server span sharing its ID with a client span is renumbered
/// and re-parented onto the client span. Parent references held by other
/// spans are rewritten to follow the renumbering.
///
/// New IDs are drawn from a big-endian counter that skips IDs already present
/// in the trace. If the counter wraps around the entire ID space, the span is
/// left unmodified and a warning is recorded instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpanIdUniquifier;

impl Adjuster for SpanIdUniquifier {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        let mut uniquifier = Uniquifier::new(trace);
        uniquifier.renumber_server_spans(trace);
        uniquifier.rewrite_parent_ids(trace);
        Ok(())
    }
}

struct Uniquifier {
    /// Span kinds found per span ID, used to detect client/server sharing.
    kinds_by_id: HashMap<SpanId, Vec<SpanKind>>,
    /// Every ID in use, including freshly allocated ones.
    used: HashSet<SpanId>,
    /// The highest counter value handed out so far.
    max_used: SpanId,
    /// Renumbered IDs, old to new.
    renumbered: HashMap<SpanId, SpanId>,
}

impl Uniquifier {
    fn new(trace: &Trace) -> Self {
        let mut kinds_by_id: HashMap<SpanId, Vec<SpanKind>> = HashMap::new();
        for span in trace.spans() {
            kinds_by_id.entry(span.span_id).or_default().push(span.kind);
        }
        let used = kinds_by_id.keys().copied().collect();
        Self {
            kinds_by_id,
            used,
            max_used: SpanId::ZERO,
            renumbered: HashMap::new(),
        }
    }

    /// Renumbers every server span whose ID is shared with a client span,
    /// making the client span its parent.
    fn renumber_server_spans(&mut self, trace: &mut Trace) {
        for span in trace.spans_mut() {
            if span.kind != SpanKind::Server || !self.is_shared_with_client(span.span_id) {
                continue;
            }
            let Some(new_id) = self.make_unique_span_id() else {
                add_warning(span, WARNING_TOO_MANY_SPANS);
                continue;
            };
            self.used.insert(new_id);
            self.renumbered.insert(span.span_id, new_id);
            // The client span that shared the ID becomes the logical parent.
            span.parent_span_id = span.span_id;
            span.span_id = new_id;
        }
    }

    /// Rewrites parent references that still point at a renumbered ID.
    ///
    /// Required as a second pass: renumbering a span invalidates the parent
    /// pointers of its descendants, which may live anywhere in the trace. The
    /// renumbered span itself is skipped to avoid making it its own parent.
    fn rewrite_parent_ids(&self, trace: &mut Trace) {
        for span in trace.spans_mut() {
            if let Some(&new_id) = self.renumbered.get(&span.parent_span_id)
                && span.span_id != new_id
            {
                span.parent_span_id = new_id;
            }
        }
    }

    fn is_shared_with_client(&self, id: SpanId) -> bool {
        self.kinds_by_id
            .get(&id)
            .is_some_and(|kinds| kinds.contains(&SpanKind::Client))
    }

    /// Allocates the next span ID not yet used in the trace.
    ///
    /// Returns `None` once the counter wraps back to zero, i.e. the entire ID
    /// space is exhausted.
    fn make_unique_span_id(&mut self) -> Option<SpanId> {
        let mut id = self.max_used.wrapping_next();
        while !id.is_zero() {
            if !self.used.contains(&id) {
                self.max_used = id;
                return Some(id);
            }
            id = id.wrapping_next();
        }
        None
    }
}
