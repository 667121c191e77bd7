//! Session: the lifecycle owner of a running dashboard.
//!
//! [`Session::init`] takes the registry, starts the scheduler thread, and
//! hands back the two channel ends the outside world needs: a command
//! sender for the Command Source and a render receiver for the Display
//! Surface. [`Session::shutdown`] stops the scheduler and joins it.
//!
//! The scheduler runs an immediate poll cycle at startup and then waits on
//! the command channel with a deadline:
//!
//! - deadline reached → poll cycle, re-arm for another [`POLL_INTERVAL`]
//! - `fetchData` command → new snapshot from the parameters, immediate poll
//!   cycle, timer restarted
//! - shutdown or all command senders dropped → exit
//!
//! Cycles are fire-and-forget and may overlap. Stale deliveries are dropped
//! by the display using the cycle id on each payload.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::activity;
use crate::poller::{Fetch, Poller, RenderPayload};
use crate::registry::{Parameters, Registry, RegistrySnapshot};

/// Fixed refresh period between timer-triggered poll cycles.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3_600_000);

// ---------------------------------------------------------------------------
// Command channel messages
// ---------------------------------------------------------------------------

/// User input event: `{ "command": "fetchData", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum Command {
    /// Re-template every endpoint with new parameters and poll immediately.
    FetchData(Parameters),
}

/// Internal scheduler message.
#[derive(Debug)]
enum Control {
    User(Command),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Cloneable handle used by a Command Source to send user input events.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Control>,
}

impl CommandSender {
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Control::User(command))
            .context("session is no longer running")
    }
}

/// A running polling session.
pub struct Session {
    names: Vec<String>,
    current: Arc<RwLock<Arc<RegistrySnapshot>>>,
    control: Sender<Control>,
    scheduler: Option<JoinHandle<()>>,
}

impl Session {
    /// Start a session with the default [`POLL_INTERVAL`].
    pub fn init(registry: Registry, fetcher: Arc<dyn Fetch>) -> Result<(Self, Receiver<RenderPayload>)> {
        Self::init_with_interval(registry, fetcher, POLL_INTERVAL)
    }

    /// Start a session with an explicit timer period.
    pub fn init_with_interval(
        registry: Registry,
        fetcher: Arc<dyn Fetch>,
        interval: Duration,
    ) -> Result<(Self, Receiver<RenderPayload>)> {
        let (render_tx, render_rx) = channel::unbounded();
        let (control_tx, control_rx) = channel::unbounded();

        let names = registry.names();
        let current = Arc::new(RwLock::new(Arc::new(registry.snapshot())));
        let scheduler = Scheduler {
            registry,
            current: Arc::clone(&current),
            poller: Poller::new(fetcher, render_tx),
            control: control_rx,
            interval,
        };

        let handle = thread::Builder::new()
            .name("apiview-scheduler".to_string())
            .spawn(move || scheduler.run())
            .context("failed to spawn scheduler thread")?;

        activity::log_event(&format!("session started endpoints={}", names.len()));

        let session = Self {
            names,
            current,
            control: control_tx,
            scheduler: Some(handle),
        };

        Ok((session, render_rx))
    }

    /// Ordered endpoint names, for initialising the display's tabs.
    pub fn endpoint_names(&self) -> &[String] {
        &self.names
    }

    /// A sender for the Command Source.
    pub fn commands(&self) -> CommandSender {
        CommandSender {
            tx: self.control.clone(),
        }
    }

    /// The snapshot the next poll cycle will use.
    pub fn current_snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().clone()
    }

    /// Stop the scheduler and wait for it. In-flight fetches are not
    /// cancelled; their payloads go to a channel nobody reads.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.control.send(Control::Shutdown);
        if let Some(handle) = self.scheduler.take() {
            let _ = handle.join();
            activity::log_event("session stopped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct Scheduler {
    registry: Registry,
    current: Arc<RwLock<Arc<RegistrySnapshot>>>,
    poller: Poller,
    control: Receiver<Control>,
    interval: Duration,
}

impl Scheduler {
    fn run(self) {
        self.poll();
        let mut deadline = Instant::now() + self.interval;

        loop {
            let wait = deadline.saturating_duration_since(Instant::now());
            match self.control.recv_timeout(wait) {
                Ok(Control::User(Command::FetchData(params))) => {
                    activity::log_event(&format!(
                        "command fetchData projectId=\"{}\" appName=\"{}\" pipelineName=\"{}\"",
                        params.project_id, params.app_name, params.pipeline_name
                    ));
                    *self.current.write() = Arc::new(self.registry.apply_parameters(&params));
                    self.poll();
                    deadline = Instant::now() + self.interval;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.poll();
                    deadline = Instant::now() + self.interval;
                }
                Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn poll(&self) {
        let snapshot = self.current.read().clone();
        self.poller.run_poll_cycle(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
