//! monitor-gateway - HTTP front end for the price feeder.
//!
//! # Routes
//!
//! ```text
//! GET /            → Prices JSON (503 while the cache is cold)
//! GET /api/prices  → same as /
//! GET /health      → FeedStatus JSON
//! GET /metrics     → Prometheus text
//! ```
//!
//! Handlers only read the feeder's cache; no request ever waits on the
//! observer connection.

mod config;
mod error;
mod server;
mod source;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use server::{create_router, run_server, AppState};
pub use source::PriceSource;
