//! Logging facade for Quiver services and libraries.
//!
//! # Setup
//!
//! Binaries invoke [`init`] once with a [`LogConfig`]. The configuration
//! implements `serde` traits, so it can be embedded in configuration files.
//!
//! ```
//! use quiver_log::{LogConfig, LogLevel};
//!
//! let config = LogConfig {
//!     level: LogLevel::Debug,
//!     ..LogConfig::default()
//! };
//!
//! quiver_log::init(&config);
//! ```
//!
//! # Logging
//!
//! Libraries use the re-exported level macros: [`error!`], [`warn!`],
//! [`info!`], [`debug!`] and [`trace!`]. Log messages should start lowercase
//! and end without punctuation.
//!
//! Note that per-span anomalies discovered while adjusting a trace are *not*
//! logged; they are recorded as warnings on the span itself and travel with
//! the trace. The log stream is for operator-facing diagnostics only.
//!
//! # Testing
//!
//! Unit tests can call [`init_test!`] at the beginning of a test to capture
//! output through the test writer:
//!
//! ```
//! #[test]
//! fn test_something() {
//!     quiver_log::init_test!();
//! }
//! ```

#![warn(missing_docs)]

mod setup;
pub use setup::*;

mod test;
pub use test::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
