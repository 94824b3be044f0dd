//! WebSocket client for the block observer feed.
//!
//! Provides a request/response style connection over a single duplex stream:
//! - Bounded write and read deadlines per call
//! - One mutex spanning each I/O call, shared with the close sequence
//! - Pre-serialized `new_block` subscription request

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{ConnectionConfig, ConnectionState, ObserverConnection, DEFAULT_OBSERVER_URL};
pub use error::{WsError, WsResult};
pub use message::SubscribeRequest;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
