//! Discovery Worker
//!
//! One dedicated thread owns every call into the host. Consumers send
//! commands over a channel and read results from the `RegistryPublisher`;
//! nothing they do ever waits on a discovery pass.

use crate::discovery::{Engine, MissLog};
use crate::error::WorkerStopped;
use crate::host::HostRuntime;
use crate::registry::{RegistryPublisher, RoleRegistry};

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Name of the worker thread
pub const WORKER_THREAD: &str = "rolemap-discovery";

/// Retry policy of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Passes attempted per command before giving up
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on every further retry
    pub initial_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

type Job = Box<dyn FnOnce(&dyn HostRuntime, Option<&RoleRegistry>) + Send>;

enum Command {
    /// First discovery of a session
    Attach,
    /// Re-run in the same session, keeping validated containers
    Rediscover,
    /// The host moved on (e.g. server switch); start a new session
    HostTransition,
    /// Drop the current mapping
    Detach,
    Run(Job),
    Shutdown,
}

/// Handle to the discovery thread
pub struct DiscoveryWorker {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl DiscoveryWorker {
    pub fn spawn(
        host: Arc<dyn HostRuntime>,
        publisher: Arc<RegistryPublisher>,
        engine: Engine,
        config: WorkerConfig,
    ) -> std::io::Result<Self> {
        let (commands, inbox) = unbounded();
        let state = WorkerState {
            host,
            publisher,
            engine,
            config,
            misses: MissLog::default(),
        };
        let thread = thread::Builder::new()
            .name(WORKER_THREAD.to_string())
            .spawn(move || state.run(inbox))?;
        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    fn send(&self, command: Command) -> Result<(), WorkerStopped> {
        self.commands.send(command).map_err(|_| WorkerStopped)
    }

    pub fn attach(&self) -> Result<(), WorkerStopped> {
        self.send(Command::Attach)
    }

    pub fn rediscover(&self) -> Result<(), WorkerStopped> {
        self.send(Command::Rediscover)
    }

    pub fn host_transition(&self) -> Result<(), WorkerStopped> {
        self.send(Command::HostTransition)
    }

    pub fn detach(&self) -> Result<(), WorkerStopped> {
        self.send(Command::Detach)
    }

    /// Run `job` on the worker thread with the host and current registry
    ///
    /// The result arrives on the returned channel once every previously
    /// queued command has finished.
    pub fn run<T, F>(&self, job: F) -> Result<Receiver<T>, WorkerStopped>
    where
        T: Send + 'static,
        F: FnOnce(&dyn HostRuntime, Option<&RoleRegistry>) -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.send(Command::Run(Box::new(move |host, registry| {
            let _ = tx.send(job(host, registry));
        })))?;
        Ok(rx)
    }

    /// Stop the worker after the queued commands and wait for it
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(Command::Shutdown);
            if thread.join().is_err() {
                error!("Discovery worker panicked");
            }
        }
    }
}

impl Drop for DiscoveryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerState {
    host: Arc<dyn HostRuntime>,
    publisher: Arc<RegistryPublisher>,
    engine: Engine,
    config: WorkerConfig,
    misses: MissLog,
}

impl WorkerState {
    fn run(mut self, inbox: Receiver<Command>) {
        debug!("Discovery worker started");
        while let Ok(command) = inbox.recv() {
            match command {
                Command::Attach => self.discover(true),
                Command::Rediscover => self.discover(false),
                Command::HostTransition => {
                    self.detach();
                    self.discover(true);
                }
                Command::Detach => self.detach(),
                Command::Run(job) => {
                    let current = self.publisher.current();
                    job(self.host.as_ref(), current.as_deref());
                }
                Command::Shutdown => break,
            }
        }
        debug!("Discovery worker stopped");
    }

    fn detach(&self) {
        if let Some(current) = self.publisher.current() {
            self.publisher.invalidate(current.version());
        }
    }

    fn discover(&mut self, new_session: bool) {
        let version = self.publisher.next_version(new_session);
        if let Err(e) = self.publisher.begin_resolving() {
            warn!("Skipping pass {}: {}", version, e);
            return;
        }
        let previous = if new_session {
            None
        } else {
            self.publisher.current()
        };

        let attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.initial_backoff;
        for attempt in 1..=attempts {
            let result = self.engine.run_pass(
                self.host.as_ref(),
                version,
                previous.as_deref(),
                &mut self.misses,
            );
            match result {
                Ok(registry) => {
                    match self.publisher.publish(registry) {
                        Ok(true) => {}
                        Ok(false) => {
                            info!("Session of {} was invalidated mid-pass; restarting", version);
                            self.discover(true);
                        }
                        Err(e) => error!("Failed to publish {}: {}", version, e),
                    }
                    return;
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    info!(
                        "Pass {} attempt {}/{} failed: {}; retrying in {:?}",
                        version, attempt, attempts, e, backoff
                    );
                    thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    error!("Pass {} failed after {} attempt(s): {}", version, attempt, e);
                    if let Err(e) = self.publisher.fail(&e.to_string()) {
                        error!("Failed to abandon {}: {}", version, e);
                    }
                    return;
                }
            }
        }
    }
}
