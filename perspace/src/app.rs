mod channels;
mod effects;
mod scheduler;
mod subscriptions;

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::{Config, MappingEngine, SavedBindings, WallpaperGroups};
use crate::effect::Effect;
use crate::event_emitter::EventEmitter;
use crate::platform::BridgeHost;
use perspace_ipc::{Command, HostEvent, HostRequest, Response};

pub use channels::{IpcCommandWithResponse, SnapshotRequest};
use channels::{create_channels, spawn_servers, LoopChannels};
use effects::{execute_effects, EffectContext};
use scheduler::Scheduler;
use subscriptions::Subscriptions;

/// How long shutdown waits for the bridge to flush the final requests.
const BRIDGE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

struct Paths {
    config: PathBuf,
    saved_bindings: PathBuf,
    wallpapers: PathBuf,
}

impl Paths {
    fn default_paths() -> Self {
        Self {
            config: Config::default_path(),
            saved_bindings: SavedBindings::default_path(),
            wallpapers: WallpaperGroups::default_path(),
        }
    }
}

/// The daemon. Engine, host mirror and timers all live on one thread and are
/// only touched from the select loop in `run_loop`.
pub struct App {
    engine: RefCell<MappingEngine>,
    host: BridgeHost,
    scheduler: RefCell<Scheduler>,
    subscriptions: RefCell<Subscriptions<mpsc::UnboundedSender<HostRequest>>>,
    emitter: EventEmitter,
    paths: Paths,
}

enum Exit {
    Quit,
    Interrupted,
    BridgeGone,
}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build tokio runtime")?;
        rt.block_on(Self::run_async(config))
    }

    async fn run_async(config: Config) -> Result<()> {
        tracing::info!("perspace daemon starting");
        let (loop_channels, server_channels) = create_channels();
        let mut bridge = spawn_servers(server_channels);

        let LoopChannels {
            mut host_event_rx,
            request_tx,
            mut ipc_rx,
            mut snapshot_rx,
            broadcaster,
        } = loop_channels;

        let paths = Paths::default_paths();
        let saved_bindings = SavedBindings::load(&paths.saved_bindings);
        let wallpapers = WallpaperGroups::load(&paths.wallpapers);
        if !saved_bindings.is_empty() {
            tracing::info!(
                "Found {} host bindings saved by an earlier run",
                saved_bindings.0.len()
            );
        }

        let app = App {
            engine: RefCell::new(MappingEngine::new(config, saved_bindings, wallpapers)),
            host: BridgeHost::new(request_tx),
            scheduler: RefCell::new(Scheduler::new()),
            subscriptions: RefCell::new(Subscriptions::new()),
            emitter: EventEmitter::new(broadcaster),
            paths,
        };

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let exit = loop {
            let deadline = app.scheduler.borrow().next_deadline();
            tokio::select! {
                Some(event) = host_event_rx.recv() => app.handle_host_event(event),
                Some((cmd, resp_tx)) = ipc_rx.recv() => {
                    let quit = cmd == Command::Quit;
                    let response = app.handle_command(&cmd);
                    if resp_tx.send(response).await.is_err() {
                        tracing::debug!("Control client went away before the response");
                    }
                    if quit {
                        break Exit::Quit;
                    }
                }
                Some(resp_tx) = snapshot_rx.recv() => {
                    let snapshot = app.engine.borrow().snapshot(&app.host);
                    let _ = resp_tx.send(snapshot);
                }
                _ = wait_until(deadline) => app.run_due_tasks(),
                _ = &mut ctrl_c => break Exit::Interrupted,
                _ = &mut bridge => break Exit::BridgeGone,
            }
        };

        match exit {
            Exit::Quit => tracing::info!("Quit requested"),
            Exit::Interrupted => tracing::info!("Interrupted"),
            Exit::BridgeGone => {
                // Nothing can reach the host, so leave saved bindings on disk for the next run
                anyhow::bail!("Host bridge stopped");
            }
        }

        app.shutdown();
        // Dropping the last request sender lets the bridge drain and exit
        drop(app);
        if tokio::time::timeout(BRIDGE_FLUSH_TIMEOUT, bridge).await.is_err() {
            tracing::warn!("Host bridge did not finish flushing");
        }
        tracing::info!("perspace daemon exiting");
        Ok(())
    }

    fn handle_host_event(&self, event: HostEvent) {
        tracing::debug!("Host event: {:?}", event);
        self.host.apply_event(&event);
        let effects = self
            .engine
            .borrow_mut()
            .handle_host_event(&self.host, &event);
        self.execute(effects);
    }

    fn handle_command(&self, cmd: &Command) -> Response {
        tracing::debug!("Command: {:?}", cmd);
        if *cmd == Command::ReloadConfig {
            self.reload_config();
            return Response::Ok;
        }
        let result = self.engine.borrow_mut().process_command(&self.host, cmd);
        self.execute(result.effects);
        result.response
    }

    fn reload_config(&self) {
        let config = Config::load(&self.paths.config);
        let wallpapers = WallpaperGroups::load(&self.paths.wallpapers);
        let effects = {
            let mut engine = self.engine.borrow_mut();
            engine.set_wallpapers(wallpapers);
            engine.reload_config(&self.host, config)
        };
        tracing::info!("Configuration reloaded");
        self.execute(effects);
    }

    /// Run every task whose deadline has passed. Tasks scheduled while doing
    /// so wait for the next loop iteration, even with zero delay.
    fn run_due_tasks(&self) {
        let now = Instant::now();
        loop {
            let task = self.scheduler.borrow_mut().pop_due(now);
            let Some(task) = task else {
                break;
            };
            tracing::debug!("Running deferred {:?}", task);
            let effects = self.engine.borrow_mut().run_task(&self.host, task);
            self.execute(effects);
        }
    }

    /// Collapse secondary windows and give the host its bindings back.
    fn shutdown(&self) {
        let effects = self
            .engine
            .borrow_mut()
            .handle_host_event(&self.host, &HostEvent::Disable);
        self.execute(effects);
    }

    fn execute(&self, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }
        let ctx = EffectContext {
            host: &self.host,
            scheduler: &self.scheduler,
            subscriptions: &self.subscriptions,
            emitter: &self.emitter,
            bindings_path: &self.paths.saved_bindings,
        };
        execute_effects(effects, &ctx);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
