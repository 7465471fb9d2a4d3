use std::collections::HashSet;
use std::hash::Hasher;
use std::io;

use fnv::FnvHasher;
use quiver_trace::{add_warning, Attributes, Span, Trace};
use serde::Serialize;

use crate::{Adjuster, AdjusterError};

/// Removes spans that are exact duplicates of an earlier span.
///
/// Storage backends commonly receive the same span twice, e.g. from retried
/// writes. Each span is hashed over the canonical serialization of its
/// enclosing resource attributes, scope attributes and the span itself; only
/// the first span with a given hash is kept. Relative order among survivors
/// is preserved, and the seen-hash set spans the whole trace, so duplicates
/// are found across resource groups as long as their context matches.
///
/// Attributes must already be in canonical order (see
/// [`SortAttributesAndEvents`](crate::SortAttributesAndEvents)) for the hash
/// to be order-independent. A span that fails to serialize is kept
/// unconditionally and given a warning; a hashing problem must never lose
/// data.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeduplicateSpans;

impl Adjuster for DeduplicateSpans {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        let mut seen = SeenHashes::default();
        for resource_spans in &mut trace.resource_spans {
            let resource = &resource_spans.resource;
            for scope_spans in &mut resource_spans.scope_spans {
                let scope = &scope_spans.scope;
                scope_spans.spans.retain_mut(|span| {
                    match span_hash(&resource.attributes, &scope.attributes, span) {
                        Ok(hash) => seen.first_occurrence(hash),
                        Err(error) => {
                            add_warning(span, format!("failed to compute span hash: {error}"));
                            true
                        }
                    }
                });
            }
        }
        Ok(())
    }
}

/// Accumulator of span hashes already encountered in this trace.
#[derive(Default)]
struct SeenHashes(HashSet<u64>);

impl SeenHashes {
    /// Records the hash, returning `true` only the first time it is seen.
    fn first_occurrence(&mut self, hash: u64) -> bool {
        self.0.insert(hash)
    }
}

/// The canonical hash input: a span together with the attributes of its
/// enclosing resource and scope. Field order is part of the canonical form.
#[derive(Serialize)]
struct CanonicalSpan<'a> {
    resource: &'a Attributes,
    scope: &'a Attributes,
    span: &'a Span,
}

/// Computes the 64-bit FNV-1a hash of the span's canonical serialization.
fn span_hash(resource: &Attributes, scope: &Attributes, span: &Span) -> Result<u64, serde_json::Error> {
    let mut hasher = FnvHasher::default();
    serde_json::to_writer(HashWriter(&mut hasher), &CanonicalSpan { resource, scope, span })?;
    Ok(hasher.finish())
}

/// Feeds serialized bytes straight into a hasher without buffering.
struct HashWriter<'a>(&'a mut FnvHasher);

impl io::Write for HashWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quiver_trace::{ResourceSpans, ScopeSpans, SpanId};

    use super::*;

    fn span(id: u64, name: &str) -> Span {
        Span {
            span_id: SpanId::from_u64(id),
            name: name.to_owned(),
            ..Default::default()
        }
    }

    fn trace_of(spans: Vec<Span>) -> Trace {
        Trace {
            resource_spans: vec![ResourceSpans {
                scope_spans: vec![ScopeSpans {
                    spans,
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_identical_spans_collapse() {
        let mut trace = trace_of(vec![
            span(1, "query"),
            span(1, "query"),
            span(2, "render"),
        ]);
        DeduplicateSpans.adjust(&mut trace).unwrap();

        let names: Vec<_> = trace.spans().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["query", "render"]);
    }

    #[test]
    fn test_duplicates_found_across_scopes() {
        let mut trace = Trace {
            resource_spans: vec![
                ResourceSpans {
                    scope_spans: vec![ScopeSpans {
                        spans: vec![span(1, "query")],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                ResourceSpans {
                    scope_spans: vec![ScopeSpans {
                        spans: vec![span(1, "query")],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
        };
        DeduplicateSpans.adjust(&mut trace).unwrap();
        assert_eq!(trace.spans().count(), 1);
    }

    #[test]
    fn test_differing_context_prevents_deduplication() {
        let mut trace = trace_of(vec![span(1, "query"), span(1, "query")]);
        trace.resource_spans.push(ResourceSpans {
            resource: quiver_trace::Resource {
                attributes: Attributes::from_iter([("service", "other")]),
            },
            scope_spans: vec![ScopeSpans {
                spans: vec![span(1, "query")],
                ..Default::default()
            }],
        });
        DeduplicateSpans.adjust(&mut trace).unwrap();

        // The duplicate within the first resource collapses; the copy under a
        // different resource survives because its context hashes differently.
        assert_eq!(trace.spans().count(), 2);
    }

    #[test]
    fn test_survivor_order_is_preserved() {
        let mut trace = trace_of(vec![
            span(1, "a"),
            span(2, "b"),
            span(1, "a"),
            span(3, "c"),
        ]);
        DeduplicateSpans.adjust(&mut trace).unwrap();

        let names: Vec<_> = trace.spans().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_canonical_serialization() {
        let empty = Attributes::new();
        let json = serde_json::to_string(&CanonicalSpan {
            resource: &empty,
            scope: &empty,
            span: &span(1, "query"),
        })
        .unwrap();
        // Hashes are derived from this exact byte sequence. Any change here
        // resurrects previously collapsed duplicates.
        insta::assert_snapshot!(json, @r#"{"resource":{},"scope":{},"span":{"trace_id":"00000000000000000000000000000000","span_id":"0000000000000001","parent_span_id":"0000000000000000","name":"query","kind":"unspecified","start_time":"1970-01-01T00:00:00Z","end_time":"1970-01-01T00:00:00Z","status":{"code":"unset","message":""},"attributes":{},"events":[],"links":[]}}"#);
    }

    #[test]
    fn test_hash_is_stable() {
        let a = span(1, "query");
        let b = span(1, "query");
        let empty = Attributes::new();
        assert_eq!(
            span_hash(&empty, &empty, &a).unwrap(),
            span_hash(&empty, &empty, &b).unwrap()
        );
        let c = span(2, "query");
        assert_ne!(
            span_hash(&empty, &empty, &a).unwrap(),
            span_hash(&empty, &empty, &c).unwrap()
        );
    }
}
