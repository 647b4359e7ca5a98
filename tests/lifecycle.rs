// End-to-end lifecycle scenarios, driven through scripted collaborators so a
// whole update cycle runs without a real server. Paused tokio time makes the
// idle and ping sleeps instant.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use fakeflock::agent::Agent;
use fakeflock::error::{Error, Result};
use fakeflock::protocol::request::Request;
use fakeflock::protocol::response::{Response, parse_response};
use fakeflock::simulation::SimConfig;
use fakeflock::transport::UpdateTransport;
use fakeflock::updater::{ArtifactFetcher, UpdateApplier};

const UPDATE_OK: &str = r#"<response protocol="3.0">
    <app appid="io.test.app" status="ok">
        <updatecheck status="ok">
            <urls><url codebase="http://pkgs.test/app/"/></urls>
            <manifest version="9.9.9"/>
        </updatecheck>
    </app>
</response>"#;

const NO_UPDATE: &str = r#"<response protocol="3.0">
    <app appid="io.test.app" status="ok">
        <updatecheck status="noupdate"/>
    </app>
</response>"#;

const EMPTY_URLS: &str = r#"<response protocol="3.0">
    <app appid="io.test.app" status="ok">
        <updatecheck status="ok">
            <urls></urls>
            <manifest version="9.9.9"/>
        </updatecheck>
    </app>
</response>"#;

/// What each exchange carried, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Check,
    Event(&'static str, &'static str),
    Ping,
}

/// Replies with one canned body forever and records what was sent.
struct ScriptedTransport {
    body: &'static str,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    fn new(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn log(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl UpdateTransport for ScriptedTransport {
    async fn exchange(&self, _agent_id: &str, request: &Request) -> Result<Response> {
        let app = request.apps.first().expect("request without app entry");
        let kind = if app.update_check.is_some() {
            Sent::Check
        } else if app.ping.is_some() {
            Sent::Ping
        } else if let Some(event) = &app.event {
            Sent::Event(event.event_type, event.event_result)
        } else {
            panic!("request carried neither check, ping nor event");
        };
        self.sent.lock().push(kind);

        parse_response(self.body)
    }
}

/// Every exchange fails at the network layer.
struct DeadTransport;

#[async_trait]
impl UpdateTransport for DeadTransport {
    async fn exchange(&self, _agent_id: &str, _request: &Request) -> Result<Response> {
        Err(Error::Network("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ArtifactFetcher for RecordingFetcher {
    async fn fetch(&self, base_url: &str, artifact: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push((base_url.to_string(), artifact.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct CountingApplier {
    applies: AtomicU32,
}

#[async_trait]
impl UpdateApplier for CountingApplier {
    async fn apply(&self) -> anyhow::Result<()> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config(ping_count: u32) -> Arc<SimConfig> {
    Arc::new(SimConfig {
        app_id: "io.test.app".to_string(),
        group_id: "stable".to_string(),
        oem: "testoem".to_string(),
        version: "1.0.0".to_string(),
        instances: 1,
        min_sleep: 1,
        max_sleep: 1,
        ping_count,
        ..SimConfig::default()
    })
}

fn test_agent(
    transport: Arc<dyn UpdateTransport>,
    fetcher: Arc<RecordingFetcher>,
    applier: Arc<CountingApplier>,
    ping_count: u32,
) -> Agent {
    Agent::new(0, test_config(ping_count), transport, fetcher, applier)
}

#[tokio::test(start_paused = true)]
async fn full_update_cycle() {
    let transport = ScriptedTransport::new(UPDATE_OK);
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(transport.clone(), fetcher.clone(), applier.clone(), 2);
    let session_before = agent.session_id().to_string();

    agent.run_once().await;

    assert_eq!(agent.version(), "9.9.9");
    assert_ne!(agent.session_id(), session_before);
    assert_eq!(agent.pings_remaining(), 0);

    assert_eq!(
        fetcher.calls.lock().as_slice(),
        &[("http://pkgs.test/app/".to_string(), "webapp.tar.gz".to_string())]
    );
    assert_eq!(applier.applies.load(Ordering::SeqCst), 1);

    // Reported in this exact order: check, download started/finished,
    // installed, the reboot-lock pings, completion.
    assert_eq!(
        transport.log(),
        vec![
            Sent::Check,
            Sent::Event("13", "1"),
            Sent::Event("14", "1"),
            Sent::Event("3", "1"),
            Sent::Ping,
            Sent::Ping,
            Sent::Event("3", "2"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn zero_ping_count_skips_reboot_lock() {
    let transport = ScriptedTransport::new(UPDATE_OK);
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(transport.clone(), fetcher, applier, 0);

    agent.run_once().await;

    assert_eq!(agent.version(), "9.9.9");
    assert!(!transport.log().contains(&Sent::Ping));
}

#[tokio::test(start_paused = true)]
async fn noupdate_cycles_leave_state_alone() {
    let transport = ScriptedTransport::new(NO_UPDATE);
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(transport.clone(), fetcher.clone(), applier.clone(), 2);
    let session_before = agent.session_id().to_string();

    for _ in 0..5 {
        agent.run_once().await;
    }

    assert_eq!(agent.version(), "1.0.0");
    assert_eq!(agent.session_id(), session_before);
    assert_eq!(agent.pings_remaining(), 2);
    assert_eq!(transport.log(), vec![Sent::Check; 5]);
    assert!(fetcher.calls.lock().is_empty());
    assert_eq!(applier.applies.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_url_list_is_a_noop_cycle() {
    let transport = ScriptedTransport::new(EMPTY_URLS);
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(transport.clone(), fetcher.clone(), applier, 1);
    let session_before = agent.session_id().to_string();

    agent.run_once().await;

    assert_eq!(agent.version(), "1.0.0");
    assert_eq!(agent.session_id(), session_before);
    assert_eq!(transport.log(), vec![Sent::Check]);
    assert!(fetcher.calls.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_response_is_a_noop_cycle() {
    let transport = ScriptedTransport::new("<response><app></respons");
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(transport.clone(), fetcher, applier, 1);

    agent.run_once().await;

    assert_eq!(agent.version(), "1.0.0");
    assert_eq!(agent.pings_remaining(), 1);
}

#[tokio::test(start_paused = true)]
async fn network_failures_never_kill_the_agent() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let mut agent = test_agent(Arc::new(DeadTransport), fetcher, applier, 0);

    for _ in 0..10 {
        agent.run_once().await;
    }

    assert_eq!(agent.version(), "1.0.0");
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_loop() {
    use tokio_util::sync::CancellationToken;

    let transport = ScriptedTransport::new(NO_UPDATE);
    let fetcher = Arc::new(RecordingFetcher::default());
    let applier = Arc::new(CountingApplier::default());
    let agent = test_agent(transport, fetcher, applier, 0);

    let cancel = CancellationToken::new();
    let agent_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = agent.run() => {}
            _ = agent_cancel.cancelled() => {}
        }
    });

    tokio::task::yield_now().await;
    cancel.cancel();

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("agent task did not stop on cancellation")
        .expect("agent task panicked");
}
