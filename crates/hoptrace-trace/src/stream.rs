use crate::lines::LineBuffer;
use crate::runner::TraceSettings;
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifies one launch within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A complete stdout line, in arrival order.
    Line { run: RunId, line: String },
    /// The process exited. Sent exactly once per launch.
    Closed { run: RunId, status: Option<i32> },
}

impl TraceEvent {
    pub fn run(&self) -> RunId {
        match self {
            TraceEvent::Line { run, .. } | TraceEvent::Closed { run, .. } => *run,
        }
    }
}

/// Handle to a launched traceroute.
pub trait TraceProcess: Send {
    /// Asks the process to terminate. Completion is still reported through
    /// [`TraceEvent::Closed`].
    fn kill(&mut self) -> Result<()>;
}

pub trait TraceLauncher: Send + Sync {
    fn launch(
        &self,
        target: &str,
        run: RunId,
        events: Sender<TraceEvent>,
    ) -> Result<Box<dyn TraceProcess>>;
}

/// Spawns the platform's traceroute binary.
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    settings: TraceSettings,
}

impl SystemLauncher {
    pub fn new(settings: TraceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TraceSettings {
        &self.settings
    }
}

const READ_CHUNK: usize = 4096;
const REAP_POLL: Duration = Duration::from_millis(10);

impl TraceLauncher for SystemLauncher {
    fn launch(
        &self,
        target: &str,
        run: RunId,
        events: Sender<TraceEvent>,
    ) -> Result<Box<dyn TraceProcess>> {
        let program = self.settings.program();
        let mut child = Command::new(program)
            .args(self.settings.args_for(target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program} for {target}"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("missing {program} stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("missing {program} stderr"))?;

        info!(%program, host = %target, run = run.0, pid = child.id(), "traceroute started");

        let child = Arc::new(Mutex::new(child));

        thread::spawn(move || log_stderr(stderr, run));

        let reaper = Arc::clone(&child);
        thread::spawn(move || {
            forward_stdout(stdout, run, &events);
            let status = reap(&reaper);
            match status {
                Some(0) => debug!(run = run.0, "traceroute exited cleanly"),
                Some(code) => warn!(run = run.0, code, "traceroute exited with non-zero status"),
                None => warn!(run = run.0, "traceroute terminated without exit code"),
            }
            let _ = events.send(TraceEvent::Closed { run, status });
        });

        Ok(Box::new(SystemProcess { child, run }))
    }
}

fn forward_stdout(mut stdout: ChildStdout, run: RunId, events: &Sender<TraceEvent>) {
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stdout.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                for line in buffer.push(&chunk[..n]) {
                    let _ = events.send(TraceEvent::Line { run, line });
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(run = run.0, error = %err, "failed reading traceroute stdout");
                break;
            }
        }
    }
    if let Some(line) = buffer.finish() {
        let _ = events.send(TraceEvent::Line { run, line });
    }
}

fn log_stderr(stderr: ChildStderr, run: RunId) {
    let reader = BufReader::new(stderr);
    for line in reader.lines().map_while(|line| line.ok()) {
        if !line.trim().is_empty() {
            warn!(run = run.0, "traceroute: {}", line.trim());
        }
    }
}

/// Waits for exit without holding the lock across the wait, so `kill`
/// stays available.
fn reap(child: &Mutex<Child>) -> Option<i32> {
    loop {
        let polled = match child.lock() {
            Ok(mut child) => child.try_wait(),
            Err(_) => return None,
        };
        match polled {
            Ok(Some(status)) => return status.code(),
            Ok(None) => thread::sleep(REAP_POLL),
            Err(err) => {
                warn!(error = %err, "failed waiting on traceroute");
                return None;
            }
        }
    }
}

struct SystemProcess {
    child: Arc<Mutex<Child>>,
    run: RunId,
}

impl TraceProcess for SystemProcess {
    fn kill(&mut self) -> Result<()> {
        let mut child = self
            .child
            .lock()
            .map_err(|_| anyhow!("traceroute handle poisoned"))?;
        match child.kill() {
            Ok(()) => {
                debug!(run = self.run.0, "kill signal sent");
                Ok(())
            }
            // already exited and reaped
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err).context("failed to kill traceroute"),
        }
    }
}
