use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use quiver_trace::{add_warning, Resource, Span, SpanId, Trace, Value};

use crate::{Adjuster, AdjusterError};

const WARNING_DUPLICATE_SPAN_ID: &str = "duplicate span IDs; skipping clock skew adjustment";

/// Corrects span timestamps for clock skew between hosts.
///
/// Spans from different hosts commonly disagree on wall clock time. This
/// adjuster walks the span tree from the roots and, whenever a child span
/// lives on a different host than its parent, computes a time delta that
/// makes the child consistent with the (already adjusted) parent under the
/// assumption that network latency is split evenly between request and
/// response. The delta is applied to the child's start and end times and to
/// all of its event timestamps, then carried down to the child's own subtree.
///
/// Two spans are considered to be on the same host when the `ip` attribute of
/// their enclosing resources yields the same host key; a missing or
/// unparseable attribute yields an unknown host, for which the skew is
/// recomputed at every boundary.
///
/// Span IDs must already be unique (see
/// [`SpanIdUniquifier`](crate::SpanIdUniquifier)); duplicates are skipped
/// with a warning. Deltas larger than the configured maximum are reported as
/// a warning instead of applied, and a maximum of zero disables the
/// correction entirely.
#[derive(Clone, Copy, Debug)]
pub struct ClockSkew {
    max_delta: TimeDelta,
}

impl ClockSkew {
    /// Creates a clock skew adjuster with the given maximum correction.
    pub fn new(max_delta: Duration) -> Self {
        Self {
            max_delta: TimeDelta::from_std(max_delta).unwrap_or(TimeDelta::MAX),
        }
    }
}

impl Adjuster for ClockSkew {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        let forest = Forest::build(trace);
        for &root in &forest.roots {
            forest.adjust_subtree(trace, root, self.max_delta);
        }
        Ok(())
    }
}

/// The carried correction state during the tree walk.
#[derive(Clone)]
struct Skew {
    delta: TimeDelta,
    host_key: String,
}

/// Position of a span within the nested trace structure.
#[derive(Clone, Copy)]
struct Location {
    resource: usize,
    scope: usize,
    span: usize,
}

/// One span in the reconstructed tree.
///
/// The tree is an arena of nodes with index-based child references; spans
/// themselves stay inside the trace and are addressed by [`Location`].
struct Node {
    location: Location,
    host_key: String,
    children: Vec<usize>,
}

struct Forest {
    nodes: Vec<Node>,
    /// Indices of root nodes in document order, for a deterministic walk.
    roots: Vec<usize>,
}

impl Forest {
    /// Indexes every span, then connects children to parents. Spans with a
    /// zero or unresolvable parent ID become roots; the latter get a warning.
    /// The first span wins a duplicated ID, later ones are warned and left
    /// out of the tree.
    fn build(trace: &mut Trace) -> Self {
        let mut nodes = Vec::new();
        let mut by_id: HashMap<SpanId, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (r, resource_spans) in trace.resource_spans.iter().enumerate() {
            let host = host_key(&resource_spans.resource);
            for (s, scope_spans) in resource_spans.scope_spans.iter().enumerate() {
                for (i, span) in scope_spans.spans.iter().enumerate() {
                    let location = Location { resource: r, scope: s, span: i };
                    if by_id.contains_key(&span.span_id) {
                        duplicates.push(location);
                        continue;
                    }
                    by_id.insert(span.span_id, nodes.len());
                    nodes.push(Node {
                        location,
                        host_key: host.clone(),
                        children: Vec::new(),
                    });
                }
            }
        }

        for location in duplicates {
            add_warning(span_at_mut(trace, location), WARNING_DUPLICATE_SPAN_ID);
        }

        let mut roots = Vec::new();
        for index in 0..nodes.len() {
            let span = span_at(trace, nodes[index].location);
            let parent_id = span.parent_span_id;
            if parent_id.is_zero() {
                roots.push(index);
            } else if let Some(&parent) = by_id.get(&parent_id) {
                nodes[parent].children.push(index);
            } else {
                let location = nodes[index].location;
                add_warning(
                    span_at_mut(trace, location),
                    format!("invalid parent span ID={parent_id}"),
                );
                // Treat spans with an unresolvable parent as roots.
                roots.push(index);
            }
        }

        Self { nodes, roots }
    }

    /// Depth-first walk applying the carried skew, recomputing it whenever
    /// the walk crosses onto a different (or unknown) host.
    fn adjust_subtree(&self, trace: &mut Trace, root: usize, max_delta: TimeDelta) {
        let initial = Skew {
            delta: TimeDelta::zero(),
            host_key: self.nodes[root].host_key.clone(),
        };
        let mut stack: Vec<(usize, Option<usize>, Skew)> = vec![(root, None, initial)];

        while let Some((index, parent, mut skew)) = stack.pop() {
            let node = &self.nodes[index];

            if let Some(parent) = parent
                && (node.host_key != skew.host_key || node.host_key.is_empty())
            {
                // This span is from a different host. Its parent has already
                // been adjusted, so the parent's timestamps are trustworthy.
                let (parent_start, parent_end) = {
                    let span = span_at(trace, self.nodes[parent].location);
                    (span.start_time, span.end_time)
                };
                skew = Skew {
                    delta: calculate_skew(span_at(trace, node.location), parent_start, parent_end),
                    host_key: node.host_key.clone(),
                };
            }

            adjust_timestamps(span_at_mut(trace, node.location), &skew, max_delta);

            for &child in node.children.iter().rev() {
                stack.push((child, Some(index), skew.clone()));
            }
        }
    }
}

fn span_at(trace: &Trace, location: Location) -> &Span {
    &trace.resource_spans[location.resource].scope_spans[location.scope].spans[location.span]
}

fn span_at_mut(trace: &mut Trace, location: Location) -> &mut Span {
    &mut trace.resource_spans[location.resource].scope_spans[location.scope].spans[location.span]
}

/// Derives a string representation of the host a resource runs on, from its
/// `ip` attribute.
///
/// Accepts a string address, a 32-bit address packed into an integer, or a
/// raw 4- or 16-byte address. Anything else yields an empty key, meaning the
/// host is unknown.
fn host_key(resource: &Resource) -> String {
    match resource.attributes.get("ip") {
        Some(Value::String(ip)) => ip.clone(),
        Some(Value::I64(packed)) => Ipv4Addr::from(*packed as u32).to_string(),
        Some(Value::Bytes(bytes)) => match bytes.as_slice() {
            &[a, b, c, d] => Ipv4Addr::new(a, b, c, d).to_string(),
            bytes => <[u8; 16]>::try_from(bytes)
                .map(|octets| Ipv6Addr::from(octets).to_string())
                .unwrap_or_default(),
        },
        _ => String::new(),
    }
}

/// Computes the delta that aligns a child span with its parent.
fn calculate_skew(child: &Span, parent_start: DateTime<Utc>, parent_end: DateTime<Utc>) -> TimeDelta {
    let parent_duration = parent_end - parent_start;
    let child_duration = child.end_time - child.start_time;

    if child_duration > parent_duration {
        // When the child lasted longer than the parent, it was either async
        // or the parent timed out before the child responded. The only
        // reasonable adjustment is to make sure the child does not start
        // before the parent.
        if child.start_time < parent_start {
            return parent_start - child.start_time;
        }
        return TimeDelta::zero();
    }
    if child.start_time >= parent_start && child.end_time <= parent_end {
        // The child already fits within the parent span, do not adjust.
        return TimeDelta::zero();
    }
    // Assume that network latency is equally split between request and
    // response: parent_start + latency = child_start + delta.
    let latency = (parent_duration - child_duration) / 2;
    parent_start + latency - child.start_time
}

fn adjust_timestamps(span: &mut Span, skew: &Skew, max_delta: TimeDelta) {
    if skew.delta.is_zero() {
        return;
    }
    if skew.delta.abs() > max_delta {
        if max_delta.is_zero() {
            add_warning(
                span,
                format!(
                    "clock skew adjustment disabled; not applying calculated delta of {}",
                    format_delta(skew.delta)
                ),
            );
        } else {
            add_warning(
                span,
                format!(
                    "max clock skew adjustment delta of {} exceeded; not applying calculated delta of {}",
                    format_delta(max_delta),
                    format_delta(skew.delta)
                ),
            );
        }
        return;
    }

    let Some(start_time) = span.start_time.checked_add_signed(skew.delta) else {
        return;
    };
    let Some(end_time) = span.end_time.checked_add_signed(skew.delta) else {
        return;
    };
    span.start_time = start_time;
    span.end_time = end_time;
    add_warning(
        span,
        format!(
            "this span's timestamps were adjusted by {}",
            format_delta(skew.delta)
        ),
    );
    for event in &mut span.events {
        if let Some(time) = event.time.checked_add_signed(skew.delta) {
            event.time = time;
        }
    }
}

/// Renders a delta in the most natural whole unit, e.g. `35ms` or `-2s`.
fn format_delta(delta: TimeDelta) -> String {
    let nanos = delta.num_nanoseconds().unwrap_or(i64::MAX);
    let (sign, nanos) = if nanos < 0 {
        ("-", nanos.unsigned_abs())
    } else {
        ("", nanos.unsigned_abs())
    };
    if nanos == 0 {
        "0s".to_owned()
    } else if nanos % 1_000_000_000 == 0 {
        format!("{sign}{}s", nanos / 1_000_000_000)
    } else if nanos % 1_000_000 == 0 {
        format!("{sign}{}ms", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        format!("{sign}{}us", nanos / 1_000)
    } else {
        format!("{sign}{nanos}ns")
    }
}
