use std::error::Error;

use quiver_trace::Trace;

use crate::Adjuster;

/// A failure that invalidates an adjuster's output.
#[derive(Debug, thiserror::Error)]
pub enum AdjusterError {
    /// A single adjuster failed.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// Multiple adjusters of a [`Sequence`] failed.
    ///
    /// The component errors are kept in execution order; the combined message
    /// is derived from them rather than replacing them.
    #[error("{} adjusters failed: {}", .0.len(), join_messages(.0))]
    Multiple(Vec<AdjusterError>),
}

impl AdjusterError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error from a message and an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the component errors in execution order.
    ///
    /// For a single failure this is a slice containing just `self`.
    pub fn errors(&self) -> &[AdjusterError] {
        match self {
            Self::Failed { .. } => std::slice::from_ref(self),
            Self::Multiple(errors) => errors,
        }
    }
}

fn join_messages(errors: &[AdjusterError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs adjusters in declared order, accumulating every failure.
///
/// Execution continues past a failing adjuster; all errors are combined into
/// one [`AdjusterError::Multiple`] at the end. Use this when a partially
/// adjusted trace is still worth serving, which is the normal case.
#[derive(Default)]
pub struct Sequence {
    adjusters: Vec<Box<dyn Adjuster + Send + Sync>>,
}

impl Sequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an adjuster to the sequence.
    pub fn with(mut self, adjuster: impl Adjuster + Send + Sync + 'static) -> Self {
        self.adjusters.push(Box::new(adjuster));
        self
    }
}

impl Adjuster for Sequence {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        let mut errors = Vec::new();
        for adjuster in &self.adjusters {
            if let Err(error) = adjuster.adjust(trace) {
                quiver_log::debug!("adjuster failed, continuing with the rest: {error}");
                errors.push(error);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AdjusterError::Multiple(errors))
        }
    }
}

/// Runs adjusters in declared order, stopping at the first failure.
///
/// Identical to [`Sequence`] except that adjusters after a failing one are
/// skipped and the first error is returned as-is.
#[derive(Default)]
pub struct FailFastSequence {
    adjusters: Vec<Box<dyn Adjuster + Send + Sync>>,
}

impl FailFastSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an adjuster to the sequence.
    pub fn with(mut self, adjuster: impl Adjuster + Send + Sync + 'static) -> Self {
        self.adjusters.push(Box::new(adjuster));
        self
    }
}

impl Adjuster for FailFastSequence {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        for adjuster in &self.adjusters {
            adjuster.adjust(trace)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail_with: Option<&'static str>,
    }

    impl Adjuster for Counting {
        fn adjust(&self, _trace: &mut Trace) -> Result<(), AdjusterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(message) => Err(AdjusterError::new(message)),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_sequence_runs_all_and_aggregates() {
        quiver_log::init_test!();
        let calls = Arc::new(AtomicUsize::new(0));
        let sequence = Sequence::new()
            .with(Counting { calls: calls.clone(), fail_with: Some("first failure") })
            .with(Counting { calls: calls.clone(), fail_with: None })
            .with(Counting { calls: calls.clone(), fail_with: Some("second failure") });

        let error = sequence.adjust(&mut Trace::default()).unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(error.errors().len(), 2);
        assert_eq!(
            error.to_string(),
            "2 adjusters failed: first failure; second failure"
        );
    }

    #[test]
    fn test_sequence_without_failures_is_ok() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sequence = Sequence::new()
            .with(Counting { calls: calls.clone(), fail_with: None })
            .with(Counting { calls: calls.clone(), fail_with: None });

        assert!(sequence.adjust(&mut Trace::default()).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sequence = FailFastSequence::new()
            .with(Counting { calls: calls.clone(), fail_with: None })
            .with(Counting { calls: calls.clone(), fail_with: Some("boom") })
            .with(Counting { calls: calls.clone(), fail_with: None });

        let error = sequence.adjust(&mut Trace::default()).unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(error.to_string(), "boom");
    }
}
