//! Prometheus metrics and structured logging for the price monitor.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus counters for poll cycles, slot updates and extraction errors
//! - Text exposition for the gateway's `/metrics` route

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
