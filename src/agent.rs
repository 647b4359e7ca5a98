use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, thread_rng};
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::request::{App, Request};
use crate::protocol::response::Response;
use crate::protocol::{EventResult, EventType};
use crate::simulation::SimConfig;
use crate::transport::UpdateTransport;
use crate::updater::{ARTIFACT_NAME, ArtifactFetcher, UpdateApplier};

/// One simulated device. Owns its identity and lifecycle state exclusively;
/// nothing here is shared with other agents.
pub struct Agent {
    id: String,
    session_id: String,
    version: String,
    app_id: String,
    track: String,
    pings_remaining: u32,
    config: Arc<SimConfig>,
    transport: Arc<dyn UpdateTransport>,
    fetcher: Arc<dyn ArtifactFetcher>,
    applier: Arc<dyn UpdateApplier>,
}

/// What one update check resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    NoUpdate,
    Update { version: String, codebase: String },
}

impl Agent {
    pub fn new(
        index: u32,
        config: Arc<SimConfig>,
        transport: Arc<dyn UpdateTransport>,
        fetcher: Arc<dyn ArtifactFetcher>,
        applier: Arc<dyn UpdateApplier>,
    ) -> Self {
        Self {
            id: format!("fake-client-{:03}", index),
            session_id: Uuid::new_v4().to_string(),
            version: config.version.clone(),
            app_id: config.app_id.clone(),
            track: config.group_id.clone(),
            pings_remaining: config.ping_count,
            config,
            transport,
            fetcher,
            applier,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn pings_remaining(&self) -> u32 {
        self.pings_remaining
    }

    /// Check-and-update loop. Never returns on its own; the pool races this
    /// future against its cancellation token, so every sleep and exchange in
    /// `run_once` doubles as a cancellation point.
    pub async fn run(mut self) {
        info!("{} starting at version {}", self.id, self.version);
        loop {
            self.run_once().await;
        }
    }

    /// One full cycle: random idle sleep, update check, and, when the server
    /// offers something, the download/install/report sequence. Never fails;
    /// every error is logged under this agent's id and ends the cycle.
    pub async fn run_once(&mut self) {
        sleep(check_interval(self.config.min_sleep, self.config.max_sleep)).await;

        let request = self.omaha_request(
            Some((EventType::UpdateComplete, EventResult::SuccessReboot)),
            true,
            false,
        );
        let response = match self.transport.exchange(&self.id, &request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{}: update check failed: {}", self.id, e);
                return;
            }
        };

        match self.evaluate(&response) {
            CheckOutcome::NoUpdate => {}
            CheckOutcome::Update { version, codebase } => {
                self.perform_update(version, codebase).await;
            }
        }
    }

    /// Decides whether a response offers an update. Access is fully
    /// defensive: servers may omit the app entry, the update check, the URL
    /// list or the manifest, and none of those may take the agent down.
    fn evaluate(&self, response: &Response) -> CheckOutcome {
        let Some(app) = response.app() else {
            warn!("{}: response carried no app entry", self.id);
            return CheckOutcome::NoUpdate;
        };
        let Some(update_check) = app.update_check.as_ref() else {
            warn!("{}: response carried no update check", self.id);
            return CheckOutcome::NoUpdate;
        };
        if !update_check.is_ok() {
            info!("{}: update check status: {}", self.id, update_check.status);
            return CheckOutcome::NoUpdate;
        }
        let Some(codebase) = update_check.first_codebase() else {
            warn!("{}: update offered without a codebase url", self.id);
            return CheckOutcome::NoUpdate;
        };
        let Some(version) = update_check.manifest_version() else {
            warn!("{}: update offered without a manifest version", self.id);
            return CheckOutcome::NoUpdate;
        };
        CheckOutcome::Update {
            version: version.to_string(),
            codebase: codebase.to_string(),
        }
    }

    async fn perform_update(&mut self, version: String, codebase: String) {
        self.report(EventType::DownloadStarted, EventResult::Success).await;
        if let Err(e) = self.fetcher.fetch(&codebase, ARTIFACT_NAME).await {
            warn!("{}: download failed: {:#}", self.id, e);
        }
        self.report(EventType::DownloadFinished, EventResult::Success).await;

        if let Err(e) = self.applier.apply().await {
            warn!("{}: update apply failed: {:#}", self.id, e);
        }
        self.report(EventType::UpdateComplete, EventResult::Success).await;

        // Reboot lock: hold the completion report back, one ping per second.
        while self.pings_remaining > 0 {
            self.send_ping().await;
            self.pings_remaining -= 1;
            sleep(Duration::from_secs(1)).await;
        }

        info!("{}: updated from {} to {}", self.id, self.version, version);
        self.version = version;
        self.session_id = Uuid::new_v4().to_string();

        // The local version change is durable even if this report is lost.
        self.report(EventType::UpdateComplete, EventResult::SuccessReboot).await;
    }

    async fn report(&self, event_type: EventType, result: EventResult) {
        let request = self.omaha_request(Some((event_type, result)), false, false);
        if let Err(e) = self.transport.exchange(&self.id, &request).await {
            warn!("{}: event report failed: {}", self.id, e);
        }
    }

    async fn send_ping(&self) {
        let request = self.omaha_request(None, false, true);
        if let Err(e) = self.transport.exchange(&self.id, &request).await {
            warn!("{}: ping failed: {}", self.id, e);
        }
    }

    fn omaha_request(
        &self,
        event: Option<(EventType, EventResult)>,
        update_check: bool,
        ping: bool,
    ) -> Request {
        let mut app = App::new(&self.app_id, &self.version);
        app.machine_id = self.id.clone();
        app.boot_id = self.session_id.clone();
        app.track = self.track.clone();
        app.oem = self.config.oem.clone();

        if update_check {
            app.request_update_check();
        }
        if ping {
            app.add_ping();
        }
        if let Some((event_type, result)) = event {
            app.add_event(event_type, result);
        }

        Request::with_app(app)
    }
}

/// Uniform sleep in [min, max] seconds, inclusive. Collapsed or inverted
/// bounds sleep exactly `min`.
fn check_interval(min_sleep: u64, max_sleep: u64) -> Duration {
    let secs = if max_sleep > min_sleep {
        thread_rng().gen_range(min_sleep..=max_sleep)
    } else {
        min_sleep
    };
    Duration::from_secs(secs)
}
