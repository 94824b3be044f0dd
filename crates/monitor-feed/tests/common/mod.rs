//! Shared helpers for feeder integration tests.

pub mod mock_observer;
