//! Lifecycle supervisor for one FXServer instance.
//!
//! The supervisor owns the current [`ApplicationState`], the live process
//! handle and the control channel. Transitions come from three places:
//! operator calls, the exit watcher of the running process, and the
//! control-channel bootstrap. They all go through the same state lock.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fxhost_core::{
    ActionResult, ApplicationState, ConsoleEntry, ConsoleInterceptor, ControlChannel,
    ControlChannelFactory, EntryKind, InstallationLayout, NoopEmitter, RandomSecret,
    SOURCE_RCON, SOURCE_SUPERVISOR, SecretGenerator, Settings, StopKind, SupervisorEvent,
    SupervisorEventEmitter, SupportedOs, UpdateError, Updater,
};
use tokio::process::Child;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::args::build_launch_arguments;
use crate::console::ConsoleCapture;
use crate::control::{ControlChannelBootstrapper, ControlTimings, QuakeRconFactory};
use crate::process::{ProcessError, ServerProcessHandle, UsageSampler, launch_server, shutdown_child};
use crate::stream::spawn_stream_reader;

/// Display name of the supervised application.
pub const APPLICATION_NAME: &str = "FiveM Dedicated Server";

/// Time a stopping server gets to exit after SIGTERM.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Collaborators injected into the supervisor.
pub struct SupervisorDeps {
    pub settings: Settings,
    pub platform: SupportedOs,
    pub updater: Arc<dyn Updater>,
    pub channels: Arc<dyn ControlChannelFactory>,
    pub secrets: Arc<dyn SecretGenerator>,
    pub emitter: Arc<dyn SupervisorEventEmitter>,
    pub shutdown_grace: Duration,
}

impl SupervisorDeps {
    /// Production defaults: UDP RCON, random secrets, no event sink.
    pub fn new(settings: Settings, platform: SupportedOs, updater: Arc<dyn Updater>) -> Self {
        Self {
            settings,
            platform,
            updater,
            channels: Arc::new(QuakeRconFactory::default()),
            secrets: Arc::new(RandomSecret),
            emitter: Arc::new(NoopEmitter),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// Work to run once the server has stopped normally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PostStopAction {
    #[default]
    None,
    Update,
}

struct StateCell {
    state: ApplicationState,
    /// Incremented on every launch; stale bootstraps compare against it
    launch: u64,
    /// Set and taken under the same lock as `state`
    pending: PostStopAction,
}

struct Inner {
    settings: Settings,
    layout: InstallationLayout,
    platform: SupportedOs,
    updater: Arc<dyn Updater>,
    channels: Arc<dyn ControlChannelFactory>,
    secrets: Arc<dyn SecretGenerator>,
    emitter: Arc<dyn SupervisorEventEmitter>,
    timings: ControlTimings,
    shutdown_grace: Duration,
    state: Mutex<StateCell>,
    process: AsyncMutex<Option<ServerProcessHandle>>,
    console: Arc<ConsoleCapture>,
    channel: Mutex<Option<Arc<dyn ControlChannel>>>,
    usage: UsageSampler,
}

/// Why the exit watcher stopped waiting.
enum ExitCause {
    Exited(std::io::Result<std::process::ExitStatus>),
    Stop,
    Kill,
}

/// Supervises one server instance. Cheap to clone.
#[derive(Clone)]
pub struct ServerSupervisor {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ServerSupervisor {
    pub fn new(deps: SupervisorDeps) -> Self {
        let layout = deps.settings.paths.layout();
        let timings = ControlTimings::from(&deps.settings.control);
        Self {
            inner: Arc::new(Inner {
                layout,
                timings,
                settings: deps.settings,
                platform: deps.platform,
                updater: deps.updater,
                channels: deps.channels,
                secrets: deps.secrets,
                emitter: deps.emitter,
                shutdown_grace: deps.shutdown_grace,
                state: Mutex::new(StateCell {
                    state: ApplicationState::Stopped,
                    launch: 0,
                    pending: PostStopAction::None,
                }),
                process: AsyncMutex::new(None),
                console: Arc::new(ConsoleCapture::new()),
                channel: Mutex::new(None),
                usage: UsageSampler::new(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn state(&self) -> ApplicationState {
        lock(&self.inner.state).state
    }

    /// Replace the state inside the lock. Identical values emit nothing.
    fn apply(&self, cell: &mut StateCell, new: ApplicationState) -> ApplicationState {
        let old = std::mem::replace(&mut cell.state, new);
        if old != new {
            info!(%old, %new, "State changed");
            self.inner
                .emitter
                .emit(SupervisorEvent::state_changed(old, new));
        }
        old
    }

    fn set_state(&self, new: ApplicationState) -> ApplicationState {
        let mut cell = lock(&self.inner.state);
        self.apply(&mut cell, new)
    }

    /// Move to `new` only if `allowed` accepts the current state.
    fn transition(
        &self,
        allowed: fn(ApplicationState) -> bool,
        new: ApplicationState,
    ) -> Result<ApplicationState, ApplicationState> {
        let mut cell = lock(&self.inner.state);
        if !allowed(cell.state) {
            return Err(cell.state);
        }
        Ok(self.apply(&mut cell, new))
    }

    fn is_starting(&self, launch: u64) -> bool {
        let cell = lock(&self.inner.state);
        cell.state == ApplicationState::Starting && cell.launch == launch
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn layout(&self) -> &InstallationLayout {
        &self.inner.layout
    }

    pub fn is_installed(&self) -> bool {
        self.inner.layout.is_installed(self.inner.platform)
    }

    pub fn is_data_path_valid(&self) -> bool {
        self.inner.layout.is_data_path_valid()
    }

    pub const fn application_name(&self) -> &'static str {
        APPLICATION_NAME
    }

    pub fn max_users(&self) -> u32 {
        self.inner.settings.server.max_players
    }

    pub const fn supports_sleep(&self) -> bool {
        false
    }

    /// Whether console writes currently reach an authenticated channel.
    pub fn has_control_channel(&self) -> bool {
        lock(&self.inner.channel).is_some()
    }

    /// Console entries strictly newer than `since`, oldest first.
    pub fn entries_since(&self, since: Option<DateTime<Utc>>) -> Vec<ConsoleEntry> {
        self.inner.console.entries_since(since)
    }

    pub fn add_console_interceptor(&self, interceptor: Arc<dyn ConsoleInterceptor>) {
        self.inner.console.add_interceptor(interceptor);
    }

    async fn live_process<T>(&self, f: impl FnOnce(&ServerProcessHandle) -> T) -> Option<T> {
        if !self.state().has_live_process() {
            return None;
        }
        self.inner.process.lock().await.as_ref().map(f)
    }

    pub async fn pid(&self) -> Option<u32> {
        self.live_process(|h| h.pid).await
    }

    pub async fn start_time(&self) -> Option<DateTime<Utc>> {
        self.live_process(|h| h.started_at).await
    }

    pub async fn uptime(&self) -> Option<chrono::Duration> {
        self.live_process(ServerProcessHandle::uptime).await
    }

    /// CPU usage of the server process in percent; 0 without a live process.
    pub async fn cpu_usage(&self) -> f32 {
        match self.pid().await {
            Some(pid) => self
                .inner
                .usage
                .sample(pid)
                .map_or(0.0, |u| u.cpu_percent),
            None => 0.0,
        }
    }

    /// Resident memory of the server process in MiB; 0 without a live process.
    pub async fn ram_usage_mb(&self) -> u64 {
        match self.pid().await {
            Some(pid) => self.inner.usage.sample(pid).map_or(0, |u| u.memory_mb()),
            None => 0,
        }
    }

    // ------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------

    /// Start the server, installing binaries and data first when missing.
    pub async fn start(&self) -> ActionResult {
        self.launch(ApplicationState::can_start).await
    }

    fn relaunch(self) -> Pin<Box<dyn Future<Output = ActionResult> + Send>> {
        Box::pin(async move { self.launch(|s| s == ApplicationState::Restarting).await })
    }

    async fn launch(&self, allowed: fn(ApplicationState) -> bool) -> ActionResult {
        let installed = self.is_installed();
        let first = if installed {
            ApplicationState::PreStart
        } else {
            ApplicationState::Installing
        };
        if let Err(current) = self.transition(allowed, first) {
            return ActionResult::failure(format!("Server is already running ({current})"));
        }

        if !installed {
            info!("Server binaries missing, installing");
            if let Err(e) = self.inner.updater.update_binaries().await {
                error!(error = %e, "Failed to install the server");
                self.set_state(ApplicationState::Failed);
                return ActionResult::failure(format!("Failed to install the server: {e}"));
            }
            self.set_state(ApplicationState::PreStart);
        }

        if !self.is_data_path_valid() {
            debug!("Data path is invalid, updating data");
            if let Err(e) = self.inner.updater.update_data().await {
                error!(error = %e, "Failed to install server data");
            }
        }

        if !self.is_installed() {
            warn!("FiveM is not installed");
            self.set_state(ApplicationState::Failed);
            return ActionResult::failure("FiveM is not installed");
        }

        match self.spawn_server().await {
            Ok(()) => ActionResult::Success,
            Err(e) => {
                error!(error = %e, "Failed to launch the server");
                self.set_state(ApplicationState::Failed);
                ActionResult::failure(e.to_string())
            }
        }
    }

    async fn spawn_server(&self) -> Result<(), ProcessError> {
        let inner = &self.inner;
        let secret = inner.secrets.generate();
        let args = build_launch_arguments(&inner.settings.server, &inner.layout, &secret)?;

        // Held until the handle is stored so the exit handler cannot run first
        let mut slot = inner.process.lock().await;

        let mut child = launch_server(&inner.layout, inner.platform, &args)?;
        let pid = child.id().ok_or(ProcessError::NoPid)?;

        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, EntryKind::Console, Arc::clone(&inner.console));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, EntryKind::Error, Arc::clone(&inner.console));
        }
        let stdin = child.stdin.take();

        let launch = {
            let mut cell = lock(&inner.state);
            cell.launch += 1;
            self.apply(&mut cell, ApplicationState::Starting);
            cell.launch
        };

        let stop = CancellationToken::new();
        let kill = CancellationToken::new();
        let watcher = tokio::spawn(self.clone().watch_exit(child, pid, stop.clone(), kill.clone()));
        *slot = Some(ServerProcessHandle {
            pid,
            started_at: Utc::now(),
            stop,
            kill,
            watcher,
            _stdin: stdin,
        });
        drop(slot);

        tokio::spawn(self.clone().bootstrap(secret, launch));
        Ok(())
    }

    async fn bootstrap(self, secret: String, launch: u64) {
        let inner = &self.inner;
        let channel = inner.channels.create();
        let bootstrapper = ControlChannelBootstrapper::new(
            Arc::clone(&channel),
            inner.settings.control.host.clone(),
            inner.settings.control_port(),
            inner.timings,
        );

        let outcome = bootstrapper
            .run(&secret, || self.is_starting(launch))
            .await;
        debug!(status = ?outcome.status, attempts = outcome.session.attempt_count, "RCON bootstrap finished");
        if !outcome.completes_startup() {
            return;
        }

        let mut cell = lock(&inner.state);
        if cell.state != ApplicationState::Starting || cell.launch != launch {
            debug!("Server left Starting during RCON bootstrap");
            return;
        }
        if outcome.session.is_usable() {
            *lock(&inner.channel) = Some(channel);
        }
        self.apply(&mut cell, ApplicationState::Ready);
    }

    // ------------------------------------------------------------------
    // Exit handling
    // ------------------------------------------------------------------

    async fn watch_exit(
        self,
        mut child: Child,
        pid: u32,
        stop: CancellationToken,
        kill: CancellationToken,
    ) {
        let cause = tokio::select! {
            status = child.wait() => ExitCause::Exited(status),
            () = kill.cancelled() => ExitCause::Kill,
            () = stop.cancelled() => ExitCause::Stop,
        };
        let status = match cause {
            ExitCause::Exited(status) => status,
            ExitCause::Stop => shutdown_child(&mut child, self.inner.shutdown_grace).await,
            ExitCause::Kill => shutdown_child(&mut child, Duration::ZERO).await,
        };

        match status {
            Ok(status) => info!(pid, %status, "Server process exited"),
            Err(e) => warn!(pid, error = %e, "Failed to reap server process"),
        }
        self.handle_exit(pid).await;
    }

    async fn handle_exit(&self, pid: u32) {
        lock(&self.inner.channel).take();
        {
            let mut slot = self.inner.process.lock().await;
            if slot.as_ref().is_some_and(|h| h.pid == pid) {
                slot.take();
            }
        }

        let (prior, kind, pending) = {
            let mut cell = lock(&self.inner.state);
            let prior = cell.state;
            let pending = std::mem::take(&mut cell.pending);
            let kind = if prior.expects_exit() {
                StopKind::Normal
            } else {
                StopKind::Unexpected
            };
            if prior != ApplicationState::Restarting {
                self.apply(&mut cell, ApplicationState::Stopped);
            }
            (prior, kind, pending)
        };

        match kind {
            StopKind::Normal => info!("Server stopped normally"),
            StopKind::Unexpected => warn!(state = %prior, "Server stopped unexpectedly"),
        }
        self.inner.emitter.emit(SupervisorEvent::stopped(kind));

        if pending == PostStopAction::Update && prior == ApplicationState::Stopping {
            self.begin_update();
        } else if prior == ApplicationState::Restarting {
            info!("Restarting server");
            let relaunch = self.clone().relaunch();
            tokio::spawn(async move {
                let result = relaunch.await;
                if let Some(reason) = result.reason() {
                    warn!(%reason, "Restart failed");
                }
            });
        }
    }

    // ------------------------------------------------------------------
    // Stop / restart / kill
    // ------------------------------------------------------------------

    /// Stop the server. A no-op when already stopped.
    pub async fn stop(&self) -> ActionResult {
        self.stop_application(false).await
    }

    /// Stop the server and start it again once the process has exited.
    pub async fn restart(&self) -> ActionResult {
        self.stop_application(true).await
    }

    async fn stop_application(&self, restart: bool) -> ActionResult {
        let target = if restart {
            ApplicationState::Restarting
        } else {
            ApplicationState::Stopping
        };

        {
            let mut cell = lock(&self.inner.state);
            match cell.state {
                ApplicationState::Stopped if restart => {
                    return ActionResult::failure("Server is not running");
                }
                ApplicationState::Stopped => return ActionResult::Success,
                ApplicationState::Failed if !restart => {
                    self.apply(&mut cell, ApplicationState::Stopped);
                    return ActionResult::Success;
                }
                ApplicationState::Starting | ApplicationState::Ready => {
                    self.apply(&mut cell, target);
                }
                other => return ActionResult::failure(format!("Cannot stop while {other}")),
            }
        }

        let handle = self.inner.process.lock().await.take();
        match handle {
            Some(handle) => {
                handle.stop.cancel();
                if let Err(e) = handle.watcher.await {
                    warn!(error = %e, "Exit watcher ended abnormally");
                }
            }
            // The exit handler already owns it and will observe the new state
            None => debug!("Server process already exiting"),
        }

        self.inner.console.append(ConsoleEntry::new(
            SOURCE_SUPERVISOR,
            EntryKind::Console,
            "Server Stopped!",
        ));
        ActionResult::Success
    }

    /// Terminate the process immediately without a stop request.
    ///
    /// The exit is reported as unexpected.
    pub async fn kill(&self) -> ActionResult {
        let handle = self.inner.process.lock().await.take();
        let Some(handle) = handle else {
            return ActionResult::failure("Server is not running");
        };

        warn!(pid = handle.pid, "Killing server process");
        handle.kill.cancel();
        if let Err(e) = handle.watcher.await {
            warn!(error = %e, "Exit watcher ended abnormally");
        }
        ActionResult::Success
    }

    pub fn sleep(&self) -> ActionResult {
        ActionResult::failure("Sleep is not supported")
    }

    // ------------------------------------------------------------------
    // Console input
    // ------------------------------------------------------------------

    /// Send a command line to the server through the control channel.
    ///
    /// Rejected while stopped. Without an authenticated channel the command
    /// is dropped. Responses are appended to the console.
    pub async fn write_line(&self, command: &str) -> ActionResult {
        let state = self.state();
        if !state.accepts_console_input() {
            return ActionResult::failure(format!("Cannot send commands while {state}"));
        }

        let channel = lock(&self.inner.channel).clone();
        let Some(channel) = channel else {
            debug!(%command, "No RCON session, dropping command");
            return ActionResult::Success;
        };

        match channel.send(command).await {
            Ok(Some(response)) => {
                for line in response.lines().filter(|l| !l.trim().is_empty()) {
                    self.inner.console.append(ConsoleEntry::new(
                        SOURCE_RCON,
                        EntryKind::Console,
                        line,
                    ));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, %command, "RCON send failed"),
        }
        ActionResult::Success
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Update the server binaries.
    ///
    /// When stopped the update starts right away in the background. While
    /// running, a stop is requested and the update follows once the process
    /// has exited normally; the returned failure says so.
    pub fn request_update(&self) -> ActionResult {
        let state = {
            let mut cell = lock(&self.inner.state);
            match cell.state {
                ApplicationState::Stopped | ApplicationState::Failed => {
                    self.apply(&mut cell, ApplicationState::Installing);
                    None
                }
                // Recorded before the lock drops so the exit handler sees it
                other @ (ApplicationState::Starting
                | ApplicationState::Ready
                | ApplicationState::Stopping) => {
                    cell.pending = PostStopAction::Update;
                    Some(other)
                }
                other => Some(other),
            }
        };

        match state {
            None => {
                self.spawn_update_job();
                ActionResult::Success
            }
            Some(ApplicationState::Installing) => {
                ActionResult::failure("An update is already in progress")
            }
            Some(ApplicationState::Starting | ApplicationState::Ready) => {
                let this = self.clone();
                tokio::spawn(async move {
                    this.stop().await;
                });
                ActionResult::failure("Stopping instance!")
            }
            Some(ApplicationState::Stopping) => ActionResult::failure("Stopping instance!"),
            Some(other) => ActionResult::failure(format!("Cannot update while {other}")),
        }
    }

    /// Update the server binaries and wait for the result.
    ///
    /// Only allowed while stopped or failed.
    pub async fn update_now(&self) -> ActionResult {
        if let Err(current) = self.transition(ApplicationState::can_start, ApplicationState::Installing) {
            return ActionResult::failure(format!("Cannot update while {current}"));
        }
        match self.perform_update().await {
            Ok(()) => ActionResult::Success,
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }

    /// Install the baseline data set. Only allowed without a running server.
    pub async fn update_data(&self) -> ActionResult {
        let state = self.state();
        if !state.can_start() {
            return ActionResult::failure(format!("Cannot update data while {state}"));
        }
        match self.inner.updater.update_data().await {
            Ok(()) => ActionResult::Success,
            Err(e) => {
                error!(error = %e, "Failed to install server data");
                ActionResult::failure(e.to_string())
            }
        }
    }

    fn begin_update(&self) {
        if self
            .transition(|s| s == ApplicationState::Stopped, ApplicationState::Installing)
            .is_ok()
        {
            self.spawn_update_job();
        }
    }

    fn spawn_update_job(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let _ = this.perform_update().await;
        });
    }

    /// Run the binary update. Ends in Stopped whatever the outcome.
    async fn perform_update(&self) -> Result<(), UpdateError> {
        info!("Updating server");
        let result = self.inner.updater.update_binaries().await;
        match &result {
            Ok(()) => info!("Update complete"),
            Err(e) => error!(error = %e, "Failed to update the server version"),
        }
        self.set_state(ApplicationState::Stopped);
        result
    }
}
