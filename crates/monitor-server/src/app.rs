//! Application lifecycle.

use crate::config::AppConfig;
use crate::error::AppResult;
use monitor_feed::Feeder;
use monitor_gateway::{run_server, PriceSource};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// The running service: one feeder, one gateway.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    ///
    /// The feeder must connect before the gateway binds. Once the gateway has
    /// drained, the feeder stop sequence runs whether or not serving failed.
    pub async fn run_until<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            observer_url = %self.config.observer_url,
            chain_id = %self.config.chain_id,
            "Starting feeder"
        );
        let feeder = Arc::new(Feeder::start(self.config.feeder_config()).await?);

        let source: Arc<dyn PriceSource> = feeder.clone();
        let served = run_server(source, self.config.gateway_config(), shutdown).await;
        if let Err(e) = &served {
            error!(error = %e, "Gateway failed");
        }

        feeder.stop().await;
        info!("Shutdown complete");
        served.map_err(Into::into)
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(?e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
