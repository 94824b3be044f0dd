//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] monitor_feed::FeedError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] monitor_gateway::GatewayError),
}

pub type AppResult<T> = Result<T, AppError>;
