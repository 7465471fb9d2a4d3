//! Deterministic, in-place adjustments applied to traces before they are
//! returned to clients.
//!
//! Traces arrive from storage the way instrumentation wrote them: span IDs
//! shared between the client and server side of one call, timestamps skewed
//! between hosts, duplicate spans from retried writes, and attributes in
//! arbitrary order. Each [`Adjuster`] fixes one of these problems by mutating
//! the [`Trace`] in place; [`standard`] composes them in the canonical order.
//!
//! Per-span anomalies never fail the adjustment. They are recorded as
//! warnings on the affected span (see [`quiver_trace::add_warning`]) and the
//! rest of the trace is processed normally. An [`AdjusterError`] is reserved
//! for conditions that make an adjuster's entire output untrustworthy.
//!
//! Adjusters hold no mutable state beyond the trace passed in, so one
//! adjuster value may be used concurrently across independent traces.
//! Identical input and configuration produce byte-identical output.

#![warn(missing_docs)]

mod clockskew;
mod config;
mod dedupe;
mod ip;
mod links;
mod resource;
mod sequence;
mod sort;
mod uniquify;

pub use self::clockskew::*;
pub use self::config::*;
pub use self::dedupe::*;
pub use self::ip::*;
pub use self::links::*;
pub use self::resource::*;
pub use self::sequence::*;
pub use self::sort::*;
pub use self::uniquify::*;

use quiver_trace::Trace;

/// An in-place trace transformation.
///
/// Implementations mutate the given trace and must be deterministic. A
/// returned error means the adjuster's entire output is untrustworthy; this
/// should be rare. Recoverable per-span anomalies belong in span warnings
/// instead, so that the trace is still served.
pub trait Adjuster {
    /// Adjusts the trace in place.
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError>;
}

/// Creates the standard adjustment pipeline.
///
/// The order is fixed and load-bearing:
///
/// 1. [`SpanIdUniquifier`]: later steps assume unique span IDs.
/// 2. [`SortAttributesAndEvents`]: establishes the canonical order that
///    makes content hashes comparable.
/// 3. [`DeduplicateSpans`]: hashes spans while they are still byte-identical
///    copies. Running this after [`ClockSkew`] would let skew warnings leak
///    into the hash input and keep duplicates alive.
/// 4. [`ClockSkew`]: needs the tree built from uniquified parent IDs.
/// 5. [`NormalizeIpAttributes`], [`MoveResourceAttributes`], and
///    [`RemoveInvalidLinks`]: independent cosmetic cleanups.
///
/// Composed with the continue-on-error [`Sequence`], so one failing adjuster
/// does not prevent the others from running.
pub fn standard(config: &AdjusterConfig) -> Sequence {
    Sequence::new()
        .with(SpanIdUniquifier)
        .with(SortAttributesAndEvents)
        .with(DeduplicateSpans)
        .with(ClockSkew::new(config.max_clock_skew))
        .with(NormalizeIpAttributes)
        .with(MoveResourceAttributes)
        .with(RemoveInvalidLinks)
}
