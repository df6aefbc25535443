use crate::core::events::EngineEvent;
use crate::core::model::*;
use crate::core::parser::{parse_line, LineSignal};
use crate::plugins::registry::Invocation;
use futures::FutureExt;
use std::io::{BufRead, BufReader, Read};
use std::panic::AssertUnwindSafe;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Running counters for one job. Only the owning supervisor touches it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobRuntimeState {
    items_completed: u32,
    items_total: u32,
    pending_title: String,
}

impl JobRuntimeState {
    pub fn items_completed(&self) -> u32 {
        self.items_completed
    }

    pub fn items_total(&self) -> u32 {
        self.items_total
    }

    pub fn pending_title(&self) -> &str {
        &self.pending_title
    }

    /// Count reported on success.
    pub fn final_count(&self) -> u32 {
        self.items_completed.max(self.items_total)
    }

    /// Folds one parser signal into the counters and returns the events to forward.
    ///
    /// Both a `Destination:` line and an `[ExtractAudio]` line bump the
    /// completed counter, so a converted track is usually counted twice.
    /// The total shown on success is `max(completed, total)` and relies on this.
    pub fn apply(&mut self, signal: LineSignal) -> Vec<ProgressEvent> {
        match signal {
            LineSignal::Progress(p) => vec![ProgressEvent::Percent(p)],
            LineSignal::ItemBoundary { index, total } => {
                if index == 0 || total == 0 {
                    return vec![];
                }
                let title = std::mem::take(&mut self.pending_title);
                vec![self.boundary(index, total, title)]
            }
            LineSignal::Destination { title } => {
                self.pending_title = title;
                self.items_completed = self.items_completed.saturating_add(1);
                vec![]
            }
            LineSignal::ExtractAudio => {
                self.items_completed = self.items_completed.saturating_add(1);
                vec![]
            }
            LineSignal::SongCount { now, total } => {
                let pct = if total == 0 { 0.0 } else { now as f64 / total as f64 * 100.0 };
                let mut out = vec![ProgressEvent::Percent(Percent {
                    pct: pct.clamp(0.0, 100.0),
                    speed: String::new(),
                    eta: String::new(),
                    total_size: total.to_string(),
                    downloaded_size: now.to_string(),
                })];
                if now >= 1 && total >= 1 {
                    out.push(self.boundary(now, total, String::new()));
                }
                out
            }
        }
    }

    fn boundary(&mut self, index: u32, total: u32, title: String) -> ProgressEvent {
        if total >= self.items_total {
            self.items_total = total;
        }
        self.items_completed = self.items_completed.max(index);
        ProgressEvent::ItemBoundary { index, total, title }
    }
}

/// Drives one job from spawn to outcome.
pub struct JobSupervisor {
    job_id: JobId,
    invocation: Invocation,
    status: JobStatus,
    state: JobRuntimeState,
    fold: fn(&mut JobRuntimeState, LineSignal) -> Vec<ProgressEvent>,
}

impl JobSupervisor {
    pub fn new(job_id: JobId, invocation: Invocation) -> Self {
        Self {
            job_id,
            invocation,
            status: JobStatus::Queued,
            state: JobRuntimeState::default(),
            fold: JobRuntimeState::apply,
        }
    }

    /// Runs the job to completion. Always ends with exactly one
    /// `JobFinished` event and never panics or returns an error to the caller.
    pub async fn run(mut self, events: mpsc::UnboundedSender<EngineEvent>) -> JobOutcome {
        self.set_status(JobStatus::Running, &events);

        let result = AssertUnwindSafe(self.execute(&events)).catch_unwind().await;
        let outcome = match result {
            Ok(Ok(())) => JobOutcome::Succeeded { items_completed: self.state.final_count() },
            Ok(Err(failure)) => JobOutcome::Failed(failure),
            Err(panic) => JobOutcome::Failed(JobFailure::unexpected(panic_message(&panic))),
        };

        match &outcome {
            JobOutcome::Succeeded { items_completed } => {
                info!(job_id = %self.job_id, items_completed, "job succeeded")
            }
            JobOutcome::Failed(f) => info!(job_id = %self.job_id, reason = %f, "job failed"),
        }

        self.status = outcome.status();
        let _ = events.send(EngineEvent::JobFinished { job_id: self.job_id, outcome: outcome.clone() });
        outcome
    }

    fn set_status(&mut self, status: JobStatus, events: &mpsc::UnboundedSender<EngineEvent>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        let _ = events.send(EngineEvent::JobStatusChanged { job_id: self.job_id, status });
    }

    async fn execute(&mut self, events: &mpsc::UnboundedSender<EngineEvent>) -> Result<(), JobFailure> {
        debug!(
            job_id = %self.job_id,
            program = %self.invocation.program,
            args = ?self.invocation.args,
            "spawning downloader"
        );

        // stdout and stderr share one pipe so lines arrive in the order they were written.
        let (reader, writer) = os_pipe::pipe()?;
        let writer_err = writer.try_clone()?;
        let spawned = {
            let mut cmd = Command::new(&self.invocation.program);
            cmd.args(&self.invocation.args)
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(writer_err)
                .kill_on_drop(true);
            cmd.spawn()
        };
        // `cmd` took the parent's write ends out of scope with it, so EOF follows the child's exit.
        let mut child = spawned.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => JobFailure::ToolNotFound { tool: self.invocation.tool },
            _ => JobFailure::from(e),
        })?;

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        let pump = tokio::task::spawn_blocking(move || pump_lines(reader, line_tx));

        while let Some(raw) = line_rx.recv().await {
            let line = raw.trim_end();
            if line.is_empty() {
                continue;
            }
            for signal in parse_line(line) {
                for event in (self.fold)(&mut self.state, signal) {
                    let _ = events.send(EngineEvent::Progress { job_id: self.job_id, event });
                }
            }
        }
        pump.await.map_err(JobFailure::unexpected)??;

        let status = child.wait().await?;
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(JobFailure::ExitCode(code)),
            None => Err(JobFailure::Terminated),
        }
    }
}

/// Reads `reader` line by line (lossy UTF-8) into `tx` until EOF. Blocking.
fn pump_lines<R: Read>(reader: R, tx: mpsc::UnboundedSender<String>) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
            return Ok(());
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
