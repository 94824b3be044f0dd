//! Oracle price monitor service.
//!
//! Wires the block feeder to the HTTP gateway:
//! - configuration file and CLI overrides
//! - feeder start-up (fatal if the observer is unreachable)
//! - gateway lifetime bound to Ctrl-C, then the feeder stop sequence

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, CliOverrides};
pub use error::{AppError, AppResult};
