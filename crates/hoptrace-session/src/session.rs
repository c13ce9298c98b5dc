use crate::notify::{Notification, Subscribers};
use crate::state::{SessionEvent, SessionState};
use hoptrace_graph::{apply_hop, export_csv, finalize, reset};
use hoptrace_model::{SourceInfo, Topology};
use hoptrace_trace::{parse_line, RunId, TraceEvent, TraceLauncher, TraceProcess};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session busy: traceroute to {target} is still running")]
    Busy { target: String },
}

/// One traceroute run at a time plus the topology it produced.
///
/// Process output arrives on an internal channel and is applied by
/// [`Session::pump`] or [`Session::wait_for_close`] on the caller's thread,
/// so all state changes happen in one place and in arrival order.
pub struct Session {
    launcher: Arc<dyn TraceLauncher>,
    source: SourceInfo,
    state: SessionState,
    run: RunId,
    target: Option<String>,
    topology: Topology,
    process: Option<Box<dyn TraceProcess>>,
    events_tx: Sender<TraceEvent>,
    events_rx: Receiver<TraceEvent>,
    subscribers: Subscribers,
}

impl Session {
    pub fn new(launcher: Arc<dyn TraceLauncher>, source: SourceInfo) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            launcher,
            source,
            state: SessionState::Idle,
            run: RunId::default(),
            target: None,
            topology: Topology::default(),
            process: None,
            events_tx,
            events_rx,
            subscribers: Subscribers::default(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<Notification> {
        self.subscribers.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// Resets the topology and launches a traceroute to `target`.
    ///
    /// A blank target is ignored (`Ok(false)`). Starting while a run is
    /// still [`SessionState::Running`] is rejected with
    /// [`SessionError::Busy`]; a stopped run that has not reported its exit
    /// yet is abandoned instead.
    pub fn start(&mut self, target: &str) -> Result<bool, SessionError> {
        let target = target.trim();
        if target.is_empty() {
            debug!("ignoring start with empty target");
            return Ok(false);
        }
        if self.state == SessionState::Running {
            return Err(SessionError::Busy {
                target: self.target.clone().unwrap_or_default(),
            });
        }

        self.kill_process();
        self.run = self.run.next();
        self.target = Some(target.to_string());
        self.topology = reset(&self.source);
        self.publish_topology();

        match self
            .launcher
            .launch(target, self.run, self.events_tx.clone())
        {
            Ok(process) => {
                info!(host = %target, run = self.run.0, "session started");
                self.process = Some(process);
                self.state = SessionState::Running;
                self.subscribers.emit(Notification::StopToggle(true));
            }
            Err(err) => {
                warn!(host = %target, error = %format!("{err:#}"), "traceroute could not be launched");
                self.state = SessionState::Finalizing;
                self.finish_run(None);
            }
        }
        Ok(true)
    }

    /// Kills the running process. The topology is kept and still closed
    /// once the process reports its exit.
    pub fn stop(&mut self) -> bool {
        let Some(next) = self.state.on(SessionEvent::StopRequested) else {
            return false;
        };
        self.kill_process();
        self.state = next;
        info!(run = self.run.0, "stop requested");
        self.subscribers.emit(Notification::StopToggle(false));
        true
    }

    /// Drops the topology and any live run. Late output from that run is
    /// discarded.
    pub fn clear(&mut self) {
        let was_live = self.state.is_live();
        self.kill_process();
        self.run = self.run.next();
        self.state = SessionState::Idle;
        self.target = None;
        self.topology = Topology::default();

        self.publish_topology();
        self.subscribers.emit(Notification::Cleared);
        if was_live {
            self.subscribers.emit(Notification::StopToggle(false));
        }
    }

    pub fn export_csv(&self) -> String {
        export_csv(&self.topology)
    }

    /// Applies one process event. Returns whether it was accepted.
    pub fn handle_event(&mut self, event: TraceEvent) -> bool {
        if event.run() != self.run {
            debug!(event_run = event.run().0, run = self.run.0, "dropping stale event");
            return false;
        }

        match event {
            TraceEvent::Line { line, .. } => {
                let Some(next) = self.state.on(SessionEvent::LineReceived) else {
                    return false;
                };
                self.state = next;
                match parse_line(&line) {
                    Some(hop) => {
                        if apply_hop(&mut self.topology, &hop) {
                            self.publish_topology();
                        }
                    }
                    None => debug!(%line, "unparsed traceroute line"),
                }
                true
            }
            TraceEvent::Closed { status, .. } => {
                let Some(next) = self.state.on(SessionEvent::ProcessClosed) else {
                    return false;
                };
                self.state = next;
                self.finish_run(status);
                true
            }
        }
    }

    /// Applies every queued event without blocking.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.handle_event(event) {
                handled += 1;
            }
        }
        handled
    }

    /// Applies events until the current run closes or `timeout` elapses.
    /// Returns `true` if no run is live afterwards.
    pub fn wait_for_close(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state.is_live() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.handle_event(event);
                }
                Err(_) => break,
            }
        }
        !self.state.is_live()
    }

    /// Kills any live process and detaches all subscribers.
    pub fn dispose(&mut self) {
        self.kill_process();
        self.run = self.run.next();
        self.state = SessionState::Idle;
        self.subscribers.clear();
    }

    fn finish_run(&mut self, status: Option<i32>) {
        self.process = None;
        if let Some(target) = self.target.clone() {
            if finalize(&mut self.topology, &target) {
                self.publish_topology();
            }
        }
        let hops = self.topology.hop_count();
        if hops == 0 {
            warn!(run = self.run.0, ?status, "traceroute finished without any hops");
        } else {
            info!(run = self.run.0, ?status, hops, "traceroute finished");
        }
        self.state = SessionState::Idle;
        self.subscribers.emit(Notification::StopToggle(false));
    }

    fn kill_process(&mut self) {
        if let Some(mut process) = self.process.take() {
            if let Err(err) = process.kill() {
                warn!(run = self.run.0, error = %format!("{err:#}"), "failed to kill traceroute");
            }
        }
    }

    fn publish_topology(&mut self) {
        self.subscribers
            .emit(Notification::TopologyUpdated(self.topology.clone()));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.kill_process();
    }
}
