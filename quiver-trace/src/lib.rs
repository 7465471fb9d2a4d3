//! Data model for traces flowing through the Quiver query pipeline.
//!
//! A [`Trace`] is an ordered sequence of [`ResourceSpans`] groups, each
//! pairing one [`Resource`] with the instrumentation scopes and [`Span`]s it
//! produced. Attribute values are dynamically typed through the [`Value`]
//! union and stored in insertion-ordered [`Attributes`] mappings with unique
//! keys.
//!
//! The model deliberately enforces very little: span IDs within a trace
//! *should* be unique and timestamps *should* be consistent, but traces
//! produced by buggy instrumentation violate both. Violations are tolerated
//! here and corrected (or warned about) by the adjusters in `quiver-adjuster`.
//!
//! # Warnings
//!
//! Recoverable per-span anomalies are recorded on the span itself under the
//! reserved [`WARNINGS_KEY`] attribute, so they travel through existing
//! serialization without schema changes. See [`add_warning`].

#![warn(missing_docs)]

mod attributes;
mod ids;
mod span;
mod trace;
mod value;
mod warnings;

pub use self::attributes::*;
pub use self::ids::*;
pub use self::span::*;
pub use self::trace::*;
pub use self::value::*;
pub use self::warnings::*;
