//! Feeder: owns the observer connection and keeps the fact cache warm.
//!
//! A single background task polls the observer on a fixed tick. Each cycle
//! sends the pre-encoded new-block request, then waits for the response. A
//! failed read keeps the loop in [`PollPhase::AwaitResponse`], so the next
//! tick reads again without re-sending.

use crate::cache::{FactCache, FeedStatus};
use crate::error::{FeedError, FeedResult};
use crate::parser::parse_block;
use monitor_core::{Prices, DEFAULT_CHAIN_ID};
use monitor_telemetry::Metrics;
use monitor_ws::{ConnectionConfig, ObserverConnection, SubscribeRequest};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Feeder configuration.
#[derive(Debug, Clone)]
pub struct FeederConfig {
    pub connection: ConnectionConfig,
    /// Chain whose blocks are requested.
    pub chain_id: String,
    /// Poll tick.
    pub poll_interval: Duration,
    /// Upper bound on how long `start` waits for the first rate table.
    pub ready_timeout: Duration,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            poll_interval: Duration::from_millis(100),
            ready_timeout: Duration::from_secs(60),
        }
    }
}

/// Where the poll loop is within one request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollPhase {
    /// Next tick sends a fresh request.
    Request,
    /// A request is outstanding; next tick reads again.
    AwaitResponse,
}

/// Price feeder.
pub struct Feeder {
    conn: Arc<ObserverConnection>,
    cache: Arc<FactCache>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Feeder {
    /// Connect, start polling, and wait until the first rate table arrives or
    /// the ready timeout elapses.
    ///
    /// Only the initial connection is fatal. Hitting the ready timeout is
    /// logged and the feeder is returned anyway.
    pub async fn start(config: FeederConfig) -> FeedResult<Self> {
        let conn = ObserverConnection::connect(config.connection.clone())
            .await
            .map_err(FeedError::StartupConnect)?;
        Metrics::observer_connected();

        let request = SubscribeRequest::new_block(&config.chain_id).encode()?;
        let conn = Arc::new(conn);
        let cache = Arc::new(FactCache::new());
        let cancel = CancellationToken::new();
        let ready = Arc::new(Notify::new());

        let poll = PollLoop {
            conn: Arc::clone(&conn),
            cache: Arc::clone(&cache),
            cancel: cancel.clone(),
            ready: Arc::clone(&ready),
            request,
            interval: config.poll_interval,
        };
        let task = tokio::spawn(poll.run());

        info!(
            chain_id = %config.chain_id,
            interval = ?config.poll_interval,
            "Feeder started, waiting for first exchange rates"
        );
        match tokio::time::timeout(config.ready_timeout, ready.notified()).await {
            Ok(()) => info!("Feeder ready"),
            Err(_) => warn!(
                timeout = ?config.ready_timeout,
                "No exchange rates within ready timeout, continuing"
            ),
        }

        Ok(Self {
            conn,
            cache,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// Current price table, joined from the cache. Never touches the network.
    pub fn prices(&self) -> FeedResult<Prices> {
        self.cache.prices()
    }

    pub fn status(&self) -> FeedStatus {
        self.cache.status()
    }

    pub fn cache(&self) -> &Arc<FactCache> {
        &self.cache
    }

    /// Stop polling and close the connection.
    ///
    /// When this returns the poll task has exited and no further observer I/O
    /// happens. Calling it again is a no-op.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().take() else {
            return;
        };
        info!("Stopping feeder");
        self.cancel.cancel();
        self.conn.close().await;
        Metrics::observer_closed();

        if let Err(e) = task.await {
            error!(?e, "Poll task ended abnormally");
        }
        info!("Feeder stopped");
    }
}

impl std::fmt::Debug for Feeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feeder")
            .field("conn", &self.conn)
            .field("stopped", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Background poll task state.
struct PollLoop {
    conn: Arc<ObserverConnection>,
    cache: Arc<FactCache>,
    cancel: CancellationToken,
    ready: Arc<Notify>,
    /// Encoded once, re-sent unchanged every cycle.
    request: String,
    interval: Duration,
}

impl PollLoop {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut phase = PollPhase::Request;
        let mut ready_signaled = false;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if phase == PollPhase::Request {
                let sent = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    sent = self.conn.send_text(&self.request) => sent,
                };
                if let Err(e) = sent {
                    warn!(error = %e, "Failed to send block request, skipping cycle");
                    Metrics::poll_error("write");
                    continue;
                }
                phase = PollPhase::AwaitResponse;
            }

            let payload = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                read = self.conn.read_payload() => read,
            };
            let payload = match payload {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Failed to read block, retrying next tick");
                    Metrics::poll_error("read");
                    continue;
                }
            };
            phase = PollPhase::Request;

            let block = match parse_block(&payload) {
                Ok(block) => block,
                Err(e) => {
                    warn!(error = %e, len = payload.len(), "Dropping undecodable block");
                    Metrics::block_decode_error();
                    continue;
                }
            };
            Metrics::block_parsed();

            let update = self.cache.apply_block(&block);
            debug!(
                height = ?block.height(),
                rates = update.rates,
                supply = update.supply,
                "Block applied"
            );

            if update.rates && !ready_signaled {
                ready_signaled = true;
                self.ready.notify_one();
            }
        }

        debug!("Poll loop exited");
    }
}
