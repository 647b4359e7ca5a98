pub mod config;
pub use config::SimConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::Agent;
use crate::transport::{HttpTransport, UpdateTransport};
use crate::updater::{ArtifactFetcher, HttpFetcher, ScriptApplier, UpdateApplier};

pub struct Simulation {
    config: Arc<SimConfig>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Spawns one task per fake instance, then blocks until Ctrl-C. On the
    /// signal every agent observes the cancellation token independently and
    /// is given a grace period to wind down.
    pub async fn run(&self) -> Result<()> {
        self.config.validate()?;

        let transport = Arc::new(HttpTransport::new(self.config.server.clone()));
        let fetcher = Arc::new(HttpFetcher::new());
        let applier = Arc::new(ScriptApplier::new());

        let agents = build_agents(self.config.clone(), transport, fetcher, applier);
        info!(
            "spawning {} fake instances against {}",
            agents.len(),
            self.config.server
        );

        let cancel = CancellationToken::new();
        let mut handles = Vec::new();
        for agent in agents {
            let cancel = cancel.clone();
            let id = agent.id().to_string();
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    _ = agent.run() => {}
                    _ = cancel.cancelled() => {
                        info!("{} shutting down", id);
                    }
                }
            }));
        }

        tokio::signal::ctrl_c().await?;
        info!("shutting down simulation..");
        cancel.cancel();

        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
        }

        Ok(())
    }
}

/// Builds the pool: sequential distinct ids, fresh session ids, the same
/// shared read-only configuration and collaborators for everyone.
pub fn build_agents(
    config: Arc<SimConfig>,
    transport: Arc<dyn UpdateTransport>,
    fetcher: Arc<dyn ArtifactFetcher>,
    applier: Arc<dyn UpdateApplier>,
) -> Vec<Agent> {
    (0..config.instances)
        .map(|i| {
            Agent::new(
                i,
                config.clone(),
                transport.clone(),
                fetcher.clone(),
                applier.clone(),
            )
        })
        .collect()
}
