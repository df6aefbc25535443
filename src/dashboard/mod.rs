pub mod card;
pub mod input;

use crate::core::classify::{classify_content_type, classify_platform};
use crate::core::events::EngineEvent;
use crate::core::model::{JobId, JobOutcome, JobStatus, ProgressEvent};
use crate::i18n::{describe_failure, Messages};
use card::{Card, CardStyles};
use indicatif::{MultiProgress, ProgressBar};
use std::collections::HashMap;
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// Single consumer of engine events; owns every card on screen.
pub struct Dashboard {
    mp: MultiProgress,
    styles: CardStyles,
    messages: &'static Messages,
    cards: HashMap<JobId, Card>,
    order: Vec<JobId>,
    outcomes: HashMap<JobId, JobOutcome>,
}

impl Dashboard {
    pub fn with_target(mp: MultiProgress, messages: &'static Messages) -> anyhow::Result<Self> {
        Ok(Self {
            mp,
            styles: CardStyles::new()?,
            messages,
            cards: HashMap::new(),
            order: vec![],
            outcomes: HashMap::new(),
        })
    }

    pub fn println(&self, line: impl AsRef<str>) {
        let _ = self.mp.println(line.as_ref());
    }

    /// Applies one event. Returns the outcome when the event finished a job.
    pub fn apply(&mut self, evt: EngineEvent) -> Option<(JobId, JobOutcome)> {
        tracing::trace!(job_id = %evt.job_id(), "dashboard event");
        match evt {
            EngineEvent::JobAdded { job_id, descriptor } => {
                let bar = self.mp.add(ProgressBar::new(0));
                self.cards.insert(job_id, Card::new(bar, &self.styles, &descriptor, self.messages));
                self.order.push(job_id);
            }
            EngineEvent::JobStatusChanged { job_id, status } => {
                if let (JobStatus::Running, Some(card)) = (status, self.cards.get_mut(&job_id)) {
                    card.set_running();
                }
            }
            EngineEvent::Progress { job_id, event } => {
                let card = self.cards.get_mut(&job_id)?;
                match event {
                    ProgressEvent::Percent(p) => card.update_progress(&p),
                    ProgressEvent::ItemBoundary { index, total, title } => card.update_track(index, total, &title),
                }
            }
            EngineEvent::JobFinished { job_id, outcome } => {
                if let Some(card) = self.cards.get_mut(&job_id) {
                    match &outcome {
                        JobOutcome::Succeeded { items_completed } => card.set_done(&self.styles, *items_completed),
                        JobOutcome::Failed(f) => card.set_error(&self.styles, &describe_failure(f, self.messages)),
                    }
                }
                self.outcomes.insert(job_id, outcome.clone());
                return Some((job_id, outcome));
            }
        }
        None
    }

    /// Removes finished cards from the screen.
    pub fn clear_finished(&mut self) {
        let finished: Vec<JobId> = self
            .cards
            .iter()
            .filter(|(_, c)| c.is_finished())
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            if let Some(card) = self.cards.remove(&id) {
                self.mp.remove(card.bar());
            }
            self.outcomes.remove(&id);
        }
        self.order.retain(|id| self.cards.contains_key(id));
    }

    /// One line per finished job, in submission order.
    pub fn summary(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|id| {
                let card = self.cards.get(id)?;
                let outcome = self.outcomes.get(id)?;
                Some(match outcome {
                    JobOutcome::Succeeded { items_completed } => {
                        format!("- {} ({}) {}", self.messages.done, items_completed, card.url())
                    }
                    JobOutcome::Failed(f) => format!(
                        "- {}: {} {}",
                        self.messages.error_tag.trim(),
                        describe_failure(f, self.messages),
                        card.url()
                    ),
                })
            })
            .collect()
    }

    pub fn print_summary(&self) {
        self.println(format!("{}:", self.messages.summary_header));
        for line in self.summary() {
            self.println(line);
        }
    }
}

/// Log sink that hides the cards while a line is written to stderr.
#[derive(Clone)]
pub struct LogWriter {
    mp: MultiProgress,
}

impl LogWriter {
    pub fn new(mp: MultiProgress) -> Self {
        Self { mp }
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.mp.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// `🔍 🎬 YouTube  ·  ♪ Track` for a URL being entered.
pub fn input_hint(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    let mut parts = vec![];
    if let Some(p) = classify_platform(url) {
        parts.push(p.label().to_string());
    }
    let ct = classify_content_type(url);
    parts.push(format!("{} {}", ct.icon(), ct.title()));
    format!("🔍 {}", parts.join("  ·  "))
}
