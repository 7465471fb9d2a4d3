use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the standard adjustment pipeline.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdjusterConfig {
    /// The maximum absolute timestamp correction [`ClockSkew`](crate::ClockSkew)
    /// may apply to any single span.
    ///
    /// Corrections larger than this are recorded as a warning on the span
    /// instead of being applied. The default of zero disables clock skew
    /// correction entirely.
    pub max_clock_skew: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disables_clock_skew() {
        let config: AdjusterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_clock_skew, Duration::ZERO);
    }

    #[test]
    fn test_deserialize() {
        let config: AdjusterConfig =
            serde_json::from_str(r#"{"max_clock_skew":{"secs":1,"nanos":0}}"#).unwrap();
        assert_eq!(config.max_clock_skew, Duration::from_secs(1));
    }
}
