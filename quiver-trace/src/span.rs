use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::ids::{SpanId, TraceId};

/// The role a span plays in an interaction between services.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// The span's kind was not recorded by the instrumentation.
    #[default]
    Unspecified,
    /// An internal operation within an application.
    Internal,
    /// The server side of a remote call.
    Server,
    /// The client side of a remote call.
    Client,
    /// The initiator of an asynchronous message.
    Producer,
    /// The consumer of an asynchronous message.
    Consumer,
}

/// The result status recorded on a span.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    /// The operation completed without a recorded verdict.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
}

/// A span's status code together with an optional free-form message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanStatus {
    /// The status code.
    pub code: StatusCode,
    /// A developer-facing description, usually only set for errors.
    pub message: String,
}

/// A timestamped event recorded while a span was active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    /// The event name.
    pub name: String,
    /// The time at which the event occurred.
    pub time: DateTime<Utc>,
    /// Attributes further describing the event.
    pub attributes: Attributes,
}

/// A reference from one span to a span in this or another trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanLink {
    /// The trace containing the linked span. All-zero marks an invalid link.
    pub trace_id: TraceId,
    /// Attributes further describing the link.
    pub attributes: Attributes,
}

/// One timed operation within a trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The trace this span belongs to.
    pub trace_id: TraceId,
    /// The span's identifier, unique within the trace when instrumentation
    /// behaves. Duplicates are tolerated and resolved by adjusters.
    pub span_id: SpanId,
    /// The identifier of the parent span, or [`SpanId::ZERO`] for roots.
    pub parent_span_id: SpanId,
    /// The operation name.
    pub name: String,
    /// The span's kind.
    pub kind: SpanKind,
    /// The time the operation started.
    pub start_time: DateTime<Utc>,
    /// The time the operation ended.
    pub end_time: DateTime<Utc>,
    /// The result status.
    pub status: SpanStatus,
    /// Attributes recorded on the span.
    pub attributes: Attributes,
    /// Timestamped events recorded while the span was active.
    pub events: Vec<SpanEvent>,
    /// References to related spans.
    pub links: Vec<SpanLink>,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            trace_id: TraceId::ZERO,
            span_id: SpanId::ZERO,
            parent_span_id: SpanId::ZERO,
            name: String::new(),
            kind: SpanKind::Unspecified,
            start_time: DateTime::UNIX_EPOCH,
            end_time: DateTime::UNIX_EPOCH,
            status: SpanStatus::default(),
            attributes: Attributes::new(),
            events: Vec::new(),
            links: Vec::new(),
        }
    }
}
