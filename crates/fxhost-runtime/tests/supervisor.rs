//! Supervisor lifecycle tests against a shell-script stand-in for FXServer.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fxhost_core::{
    ActionResult, ApplicationState, ControlChannel, ControlChannelError, ControlChannelFactory,
    EntryKind, FixedSecret, InstallationLayout, SOURCE_RCON, SOURCE_SUPERVISOR, Settings,
    StopKind, SupervisorEvent, SupportedOs, UpdateError, Updater,
};
use fxhost_runtime::{ServerSupervisor, SupervisorDeps, SupervisorEventBroadcaster};
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};

const LONG_RUNNING: &str = "#!/bin/sh\necho launched >> ../launches\necho \"server starting\"\necho \"warming up\" >&2\nexec sleep 30\n";
const SLOW_STOP: &str = "#!/bin/sh\necho launched >> ../launches\ntrap 'sleep 0.3; exit 0' TERM\nwhile :; do sleep 0.05; done\n";
const CRASHING: &str = "#!/bin/sh\necho \"about to crash\"\nsleep 0.2\nexit 3\n";

fn write_script(layout: &InstallationLayout, script: &str) {
    let exe = layout.executable(SupportedOs::Linux);
    std::fs::create_dir_all(&layout.game_path).unwrap();
    std::fs::write(&exe, script).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct FakeUpdater {
    layout: InstallationLayout,
    install_script: Option<&'static str>,
    fail: bool,
    binaries: AtomicUsize,
    data: AtomicUsize,
}

#[async_trait]
impl Updater for FakeUpdater {
    async fn update_binaries(&self) -> Result<(), UpdateError> {
        self.binaries.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        if self.fail {
            return Err(UpdateError::NoReleases);
        }
        if let Some(script) = self.install_script {
            write_script(&self.layout, script);
        }
        Ok(())
    }

    async fn update_data(&self) -> Result<(), UpdateError> {
        self.data.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(self.layout.working_dir())?;
        Ok(())
    }
}

struct FakeChannel {
    login_ok: bool,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl ControlChannel for FakeChannel {
    async fn connect(&self, _host: &str, _port: u16) -> Result<bool, ControlChannelError> {
        Ok(true)
    }

    async fn login(&self, secret: &str) -> Result<bool, ControlChannelError> {
        assert_eq!(secret, "testingpassword123");
        Ok(self.login_ok)
    }

    async fn send(&self, command: &str) -> Result<Option<String>, ControlChannelError> {
        self.sent.lock().unwrap().push(command.to_string());
        Ok(Some(format!("{command} handled\n")))
    }
}

struct FakeFactory(Arc<FakeChannel>);

impl ControlChannelFactory for FakeFactory {
    fn create(&self) -> Arc<dyn ControlChannel> {
        self.0.clone()
    }
}

struct Options {
    script: Option<&'static str>,
    install_script: Option<&'static str>,
    with_data: bool,
    login_ok: bool,
    fail_update: bool,
    settle_ms: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            script: Some(LONG_RUNNING),
            install_script: None,
            with_data: true,
            login_ok: true,
            fail_update: false,
            settle_ms: 50,
        }
    }
}

struct Harness {
    tmp: TempDir,
    supervisor: ServerSupervisor,
    updater: Arc<FakeUpdater>,
    channel: Arc<FakeChannel>,
    events: broadcast::Receiver<SupervisorEvent>,
}

fn harness(opts: Options) -> Harness {
    let tmp = TempDir::new().unwrap();
    let game = tmp.path().join("FiveM");

    let mut settings = Settings::default();
    settings.paths.game_path = game.display().to_string();
    settings.paths.updates_path = tmp.path().join("Updates").display().to_string();
    settings.paths.data_path = game.join("server-data").display().to_string();
    settings.control.settle_delay_ms = opts.settle_ms;
    settings.control.retry_interval_ms = 10;
    settings.control.max_connect_attempts = 3;

    let layout = settings.paths.layout();
    if let Some(script) = opts.script {
        write_script(&layout, script);
    }
    if opts.with_data {
        std::fs::create_dir_all(layout.working_dir()).unwrap();
    }

    let updater = Arc::new(FakeUpdater {
        layout,
        install_script: opts.install_script,
        fail: opts.fail_update,
        binaries: AtomicUsize::new(0),
        data: AtomicUsize::new(0),
    });
    let channel = Arc::new(FakeChannel {
        login_ok: opts.login_ok,
        sent: Mutex::new(Vec::new()),
    });
    let broadcaster = Arc::new(SupervisorEventBroadcaster::new());
    let events = broadcaster.subscribe();

    let mut deps = SupervisorDeps::new(settings, SupportedOs::Linux, updater.clone());
    deps.channels = Arc::new(FakeFactory(channel.clone()));
    deps.secrets = Arc::new(FixedSecret::default());
    deps.emitter = broadcaster;
    deps.shutdown_grace = Duration::from_secs(2);

    Harness {
        tmp,
        supervisor: ServerSupervisor::new(deps),
        updater,
        channel,
        events,
    }
}

async fn wait_for(supervisor: &ServerSupervisor, state: ApplicationState) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while supervisor.state() != state {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {state}, still {}",
            supervisor.state()
        );
        sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        sleep(Duration::from_millis(10)).await;
    }
}

fn drain(events: &mut broadcast::Receiver<SupervisorEvent>) -> Vec<SupervisorEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

fn transitions(events: &[SupervisorEvent]) -> Vec<(ApplicationState, ApplicationState)> {
    events
        .iter()
        .filter_map(|e| match e {
            SupervisorEvent::StateChanged { old, new } => Some((*old, *new)),
            SupervisorEvent::Stopped { .. } => None,
        })
        .collect()
}

fn stop_kinds(events: &[SupervisorEvent]) -> Vec<StopKind> {
    events.iter().filter_map(SupervisorEvent::stop_kind).collect()
}

fn launches(root: &Path) -> usize {
    std::fs::read_to_string(root.join("FiveM").join("launches"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_write_stop_lifecycle() {
    let mut h = harness(Options::default());

    assert_eq!(h.supervisor.start().await, ActionResult::Success);
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    assert!(h.supervisor.has_control_channel());
    assert!(h.supervisor.pid().await.is_some());
    assert!(h.supervisor.start_time().await.is_some());

    let again = h.supervisor.start().await;
    assert!(again.reason().unwrap().starts_with("Server is already running"));

    assert_eq!(h.supervisor.write_line("status").await, ActionResult::Success);
    assert_eq!(*h.channel.sent.lock().unwrap(), ["status"]);

    wait_until(|| h.supervisor.entries_since(None).len() >= 3).await;
    let entries = h.supervisor.entries_since(None);
    assert!(entries.iter().any(|e| e.contents == "server starting" && e.kind == EntryKind::Console));
    assert!(entries.iter().any(|e| e.contents == "warming up" && e.kind == EntryKind::Error));
    assert!(entries.iter().any(|e| e.source == SOURCE_RCON && e.contents == "status handled"));

    assert_eq!(h.supervisor.stop().await, ActionResult::Success);
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
    assert!(!h.supervisor.has_control_channel());
    assert!(h.supervisor.pid().await.is_none());

    let last = h.supervisor.entries_since(None).pop().unwrap();
    assert_eq!(last.source, SOURCE_SUPERVISOR);
    assert_eq!(last.contents, "Server Stopped!");

    let events = drain(&mut h.events);
    assert_eq!(
        transitions(&events),
        [
            (ApplicationState::Stopped, ApplicationState::PreStart),
            (ApplicationState::PreStart, ApplicationState::Starting),
            (ApplicationState::Starting, ApplicationState::Ready),
            (ApplicationState::Ready, ApplicationState::Stopping),
            (ApplicationState::Stopping, ApplicationState::Stopped),
        ]
    );
    assert_eq!(stop_kinds(&events), [StopKind::Normal]);
}

#[tokio::test]
async fn write_rejected_while_stopped() {
    let h = harness(Options::default());
    let result = h.supervisor.write_line("status").await;
    assert!(!result.is_success());
    assert!(h.channel.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_when_stopped_is_a_noop_but_restart_fails() {
    let mut h = harness(Options::default());
    assert_eq!(h.supervisor.stop().await, ActionResult::Success);
    assert!(!h.supervisor.restart().await.is_success());
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn crash_during_startup_is_unexpected_and_not_restarted() {
    let mut h = harness(Options {
        script: Some(CRASHING),
        settle_ms: 5_000,
        ..Options::default()
    });

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Stopped).await;
    sleep(Duration::from_millis(100)).await;

    let events = drain(&mut h.events);
    assert_eq!(stop_kinds(&events), [StopKind::Unexpected]);
    assert!(
        transitions(&events).contains(&(ApplicationState::Starting, ApplicationState::Stopped))
    );
    assert!(!transitions(&events).iter().any(|(_, new)| *new == ApplicationState::Ready));
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restart_relaunches_exactly_once() {
    let mut h = harness(Options::default());

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    drain(&mut h.events);

    assert_eq!(h.supervisor.restart().await, ActionResult::Success);
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    assert_eq!(launches(h.tmp.path()), 2);

    let events = drain(&mut h.events);
    assert_eq!(stop_kinds(&events), [StopKind::Normal]);
    assert_eq!(
        transitions(&events),
        [
            (ApplicationState::Ready, ApplicationState::Restarting),
            (ApplicationState::Restarting, ApplicationState::PreStart),
            (ApplicationState::PreStart, ApplicationState::Starting),
            (ApplicationState::Starting, ApplicationState::Ready),
        ]
    );

    h.supervisor.stop().await;
    assert_eq!(launches(h.tmp.path()), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn kill_is_reported_as_unexpected() {
    let mut h = harness(Options::default());

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;

    assert_eq!(h.supervisor.kill().await, ActionResult::Success);
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
    assert_eq!(stop_kinds(&drain(&mut h.events)), [StopKind::Unexpected]);
    assert!(!h.supervisor.kill().await.is_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_login_still_reaches_ready_without_writes() {
    let h = harness(Options {
        login_ok: false,
        ..Options::default()
    });

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    assert!(!h.supervisor.has_control_channel());

    assert_eq!(h.supervisor.write_line("status").await, ActionResult::Success);
    assert!(h.channel.sent.lock().unwrap().is_empty());

    h.supervisor.stop().await;
}

#[tokio::test]
async fn failed_install_enters_failed() {
    let mut h = harness(Options {
        script: None,
        fail_update: true,
        ..Options::default()
    });

    let result = h.supervisor.start().await;
    assert!(!result.is_success());
    assert_eq!(h.supervisor.state(), ApplicationState::Failed);
    assert_eq!(h.updater.binaries.load(Ordering::SeqCst), 1);
    assert_eq!(
        transitions(&drain(&mut h.events)),
        [
            (ApplicationState::Stopped, ApplicationState::Installing),
            (ApplicationState::Installing, ApplicationState::Failed),
        ]
    );

    // Failed is left only through an explicit request
    assert_eq!(h.supervisor.stop().await, ActionResult::Success);
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
}

#[tokio::test]
async fn install_that_yields_no_binary_fails_after_prestart() {
    let mut h = harness(Options {
        script: None,
        ..Options::default()
    });

    assert!(!h.supervisor.start().await.is_success());
    assert_eq!(
        transitions(&drain(&mut h.events)),
        [
            (ApplicationState::Stopped, ApplicationState::Installing),
            (ApplicationState::Installing, ApplicationState::PreStart),
            (ApplicationState::PreStart, ApplicationState::Failed),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn installs_missing_binaries_and_data_before_launch() {
    let h = harness(Options {
        script: None,
        install_script: Some(LONG_RUNNING),
        with_data: false,
        ..Options::default()
    });
    assert!(!h.supervisor.is_installed());
    assert!(!h.supervisor.is_data_path_valid());

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    assert_eq!(h.updater.binaries.load(Ordering::SeqCst), 1);
    assert_eq!(h.updater.data.load(Ordering::SeqCst), 1);

    h.supervisor.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_while_running_stops_first() {
    let h = harness(Options::default());

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;

    let result = h.supervisor.request_update();
    assert_eq!(result.reason(), Some("Stopping instance!"));

    wait_until(|| h.updater.binaries.load(Ordering::SeqCst) == 1).await;
    wait_for(&h.supervisor, ApplicationState::Stopped).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_queued_while_stopping_runs_once() {
    let mut h = harness(Options {
        script: Some(SLOW_STOP),
        ..Options::default()
    });

    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;

    let stopper = h.supervisor.clone();
    let stop = tokio::spawn(async move { stopper.stop().await });
    wait_for(&h.supervisor, ApplicationState::Stopping).await;
    assert_eq!(h.supervisor.request_update().reason(), Some("Stopping instance!"));
    assert_eq!(stop.await.unwrap(), ActionResult::Success);

    wait_until(|| h.updater.binaries.load(Ordering::SeqCst) == 1).await;
    wait_for(&h.supervisor, ApplicationState::Stopped).await;
    drain(&mut h.events);

    // A plain stop afterwards must not pick up the consumed request
    assert!(h.supervisor.start().await.is_success());
    wait_for(&h.supervisor, ApplicationState::Ready).await;
    assert_eq!(h.supervisor.stop().await, ActionResult::Success);
    sleep(Duration::from_millis(100)).await;

    assert_eq!(h.updater.binaries.load(Ordering::SeqCst), 1);
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
    assert!(
        !transitions(&drain(&mut h.events))
            .iter()
            .any(|(_, new)| *new == ApplicationState::Installing)
    );
}

#[tokio::test]
async fn update_when_stopped_runs_immediately() {
    let mut h = harness(Options::default());

    assert_eq!(h.supervisor.request_update(), ActionResult::Success);
    assert_eq!(h.supervisor.state(), ApplicationState::Installing);
    assert_eq!(
        h.supervisor.request_update().reason(),
        Some("An update is already in progress")
    );

    wait_for(&h.supervisor, ApplicationState::Stopped).await;
    assert_eq!(h.updater.binaries.load(Ordering::SeqCst), 1);
    assert_eq!(
        transitions(&drain(&mut h.events)),
        [
            (ApplicationState::Stopped, ApplicationState::Installing),
            (ApplicationState::Installing, ApplicationState::Stopped),
        ]
    );
}

#[tokio::test]
async fn failed_update_returns_to_stopped() {
    let h = harness(Options {
        fail_update: true,
        ..Options::default()
    });

    assert!(!h.supervisor.update_now().await.is_success());
    assert_eq!(h.supervisor.state(), ApplicationState::Stopped);
}

#[tokio::test]
async fn metadata_without_live_process() {
    let h = harness(Options::default());
    assert_eq!(h.supervisor.application_name(), "FiveM Dedicated Server");
    assert_eq!(h.supervisor.max_users(), 32);
    assert!(!h.supervisor.supports_sleep());
    assert!(!h.supervisor.sleep().is_success());
    assert_eq!(h.supervisor.cpu_usage().await, 0.0);
    assert_eq!(h.supervisor.ram_usage_mb().await, 0);
    assert!(h.supervisor.uptime().await.is_none());
}
