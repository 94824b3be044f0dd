//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Block decode error: {0}")]
    Decode(String),

    #[error("Malformed exchange rate {piece:?}: {reason}")]
    MalformedRate { piece: String, reason: String },

    #[error("Malformed supply amount {amount:?} for {denom:?}")]
    MalformedSupply { denom: String, amount: String },

    #[error("No rates found")]
    NoRates,

    #[error("No supply found")]
    NoSupply,

    #[error("Initial observer connection failed: {0}")]
    StartupConnect(#[source] monitor_ws::WsError),

    #[error("Observer connection error: {0}")]
    Connection(#[from] monitor_ws::WsError),
}

impl FeedError {
    /// Whether the error means the cache has not been warmed yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NoRates | Self::NoSupply)
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
