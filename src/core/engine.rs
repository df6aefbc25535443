use crate::core::classify::{classify_content_type, classify_platform};
use crate::core::events::EngineEvent;
use crate::core::model::*;
use crate::core::supervisor::JobSupervisor;
use crate::plugins::registry::{ToolContext, ToolRegistry};
use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_out_dir: PathBuf,
    pub tools: ToolContext,
}

/// Accepts submissions and runs one supervisor task per job.
///
/// Every job reports into the same unbounded channel; the receiver returned
/// by [`Engine::new`] is meant for a single consumer (the dashboard loop).
#[derive(Clone)]
pub struct Engine {
    registry: Arc<ToolRegistry>,
    config: Arc<EngineConfig>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    jobs: Arc<Mutex<HashMap<JobId, JoinHandle<JobOutcome>>>>,
}

/// Resolves `Auto` from the URL, defaulting to YouTube.
pub fn resolve_platform(choice: PlatformChoice, url: &str) -> Platform {
    match choice {
        PlatformChoice::Fixed(p) => p,
        PlatformChoice::Auto => classify_platform(url).unwrap_or(Platform::Youtube),
    }
}

impl Engine {
    pub fn new(registry: ToolRegistry, config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            event_tx,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        };
        (engine, event_rx)
    }

    pub fn default_out_dir(&self) -> &std::path::Path {
        &self.config.default_out_dir
    }

    /// Queues a download and starts it right away. Each call creates an
    /// independent job, even for a URL that was submitted before.
    pub async fn submit(
        &self,
        url: &str,
        platform: PlatformChoice,
        format: FormatChoice,
        out_dir: Option<PathBuf>,
    ) -> anyhow::Result<JobId> {
        let url = url.trim();
        if url.is_empty() {
            anyhow::bail!("empty url");
        }

        let out_dir = out_dir.unwrap_or_else(|| self.config.default_out_dir.clone());
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("create out_dir {}", out_dir.display()))?;

        let descriptor = JobDescriptor {
            url: url.to_string(),
            platform: resolve_platform(platform, url),
            content_type: classify_content_type(url),
            format,
            out_dir,
        };
        let invocation = self.registry.build(&descriptor, &self.config.tools);

        let job_id = Uuid::new_v4();
        info!(
            %job_id,
            url = %descriptor.url,
            platform = %descriptor.platform,
            content_type = ?descriptor.content_type,
            format = descriptor.format.label(),
            "job submitted"
        );

        let _ = self.event_tx.send(EngineEvent::JobAdded { job_id, descriptor });
        let _ = self.event_tx.send(EngineEvent::JobStatusChanged { job_id, status: JobStatus::Queued });

        let tx = self.event_tx.clone();
        let handle = tokio::spawn(JobSupervisor::new(job_id, invocation).run(tx));
        self.jobs.lock().await.insert(job_id, handle);

        Ok(job_id)
    }

    /// Waits for one job and forgets it. `None` if the id is unknown or already waited on.
    pub async fn wait_job(&self, job_id: JobId) -> Option<JobOutcome> {
        let handle = self.jobs.lock().await.remove(&job_id)?;
        Some(join_outcome(handle).await)
    }

    /// Waits for every job submitted so far.
    pub async fn wait_all(&self) -> Vec<(JobId, JobOutcome)> {
        let handles: Vec<_> = self.jobs.lock().await.drain().collect();
        let mut out = Vec::with_capacity(handles.len());
        for (job_id, handle) in handles {
            out.push((job_id, join_outcome(handle).await));
        }
        out
    }

    /// Drops bookkeeping for jobs that already finished.
    pub async fn forget_finished(&self) {
        self.jobs.lock().await.retain(|_, h| !h.is_finished());
    }
}

async fn join_outcome(handle: JoinHandle<JobOutcome>) -> JobOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => JobOutcome::Failed(JobFailure::unexpected(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn engine_with_missing_tools(out_dir: PathBuf) -> (Engine, mpsc::UnboundedReceiver<EngineEvent>) {
        let tools = ToolContext {
            ytdlp_bin: "missing-yt-dlp-for-tests-3f9a".into(),
            spotdl_bin: "missing-spotdl-for-tests-3f9a".into(),
            ..ToolContext::default()
        };
        Engine::new(ToolRegistry::with_defaults(), EngineConfig { default_out_dir: out_dir, tools })
    }

    fn temp_out_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("music-downloader-test-{}-{}", tag, Uuid::new_v4()))
    }

    #[test]
    fn test_resolve_platform() {
        assert_eq!(Platform::Spotify, resolve_platform(PlatformChoice::Auto, "https://open.spotify.com/track/1"));
        assert_eq!(Platform::Youtube, resolve_platform(PlatformChoice::Auto, "https://example.com/a.mp3"));
        assert_eq!(
            Platform::Soundcloud,
            resolve_platform(PlatformChoice::Fixed(Platform::Soundcloud), "https://youtu.be/x")
        );
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let (engine, _rx) = engine_with_missing_tools(temp_out_dir("empty"));
        assert!(engine.submit("   ", PlatformChoice::Auto, FormatChoice::default(), None).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_tool_is_named_per_platform() {
        let out = temp_out_dir("missing");
        let (engine, _rx) = engine_with_missing_tools(out.clone());

        let spotify = engine
            .submit("https://open.spotify.com/album/1", PlatformChoice::Auto, FormatChoice::Flac, None)
            .await
            .unwrap();
        let youtube = engine
            .submit("https://youtu.be/abc", PlatformChoice::Auto, FormatChoice::Flac, None)
            .await
            .unwrap();

        assert_eq!(
            Some(JobOutcome::Failed(JobFailure::ToolNotFound { tool: "spotdl" })),
            engine.wait_job(spotify).await
        );
        assert_eq!(
            Some(JobOutcome::Failed(JobFailure::ToolNotFound { tool: "yt-dlp" })),
            engine.wait_job(youtube).await
        );
        assert_eq!(None, engine.wait_job(youtube).await);
        assert!(out.is_dir());
        let _ = std::fs::remove_dir_all(out);
    }

    #[tokio::test]
    async fn test_resubmission_creates_independent_job() {
        let out = temp_out_dir("resubmit");
        let (engine, mut rx) = engine_with_missing_tools(out.clone());
        let url = "https://soundcloud.com/artist/sets/mix";

        let first = engine.submit(url, PlatformChoice::Auto, FormatChoice::Opus, None).await.unwrap();
        assert!(matches!(engine.wait_job(first).await, Some(JobOutcome::Failed(_))));
        let second = engine.submit(url, PlatformChoice::Auto, FormatChoice::Opus, None).await.unwrap();
        assert!(matches!(engine.wait_job(second).await, Some(JobOutcome::Failed(_))));
        assert_ne!(first, second);

        let mut finished = HashMap::new();
        while let Ok(evt) = rx.try_recv() {
            if let EngineEvent::JobFinished { job_id, .. } = evt {
                *finished.entry(job_id).or_insert(0) += 1;
            }
        }
        assert_eq!(Some(&1), finished.get(&first));
        assert_eq!(Some(&1), finished.get(&second));
        let _ = std::fs::remove_dir_all(out);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_failure_does_not_block_running_jobs() {
        let out = temp_out_dir("concurrent");
        let tools = ToolContext { spotdl_bin: "missing-spotdl-for-tests-3f9a".into(), ..ToolContext::default() };
        let (engine, _rx) = Engine::new(
            ToolRegistry::with_defaults(),
            EngineConfig { default_out_dir: out.clone(), tools },
        );

        // a long-running job submitted directly through a supervisor
        let (tx, _slow_rx) = mpsc::unbounded_channel();
        let slow = tokio::spawn(
            JobSupervisor::new(
                Uuid::new_v4(),
                crate::plugins::registry::Invocation {
                    tool: "yt-dlp",
                    program: "sh".into(),
                    args: vec!["-c".into(), "sleep 30".into()],
                },
            )
            .run(tx),
        );

        let job = engine
            .submit("https://open.spotify.com/track/1", PlatformChoice::Auto, FormatChoice::default(), None)
            .await
            .unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), engine.wait_job(job))
            .await
            .expect("spawn failure should be reported promptly");

        assert!(matches!(outcome, Some(JobOutcome::Failed(JobFailure::ToolNotFound { .. }))));
        assert!(!slow.is_finished());
        slow.abort();
        let _ = std::fs::remove_dir_all(out);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_each_finish_once() {
        let out = temp_out_dir("many");
        let (engine, mut rx) = engine_with_missing_tools(out.clone());
        let urls = [
            "https://youtu.be/a",
            "https://open.spotify.com/track/b",
            "https://soundcloud.com/c/d",
            "https://music.yandex.ru/album/e",
        ];

        let mut ids = vec![];
        for url in urls {
            ids.push(engine.submit(url, PlatformChoice::Auto, FormatChoice::default(), None).await.unwrap());
        }
        let outcomes = futures::future::join_all(ids.iter().map(|id| engine.wait_job(*id))).await;
        assert!(outcomes.iter().all(|o| matches!(o, Some(JobOutcome::Failed(JobFailure::ToolNotFound { .. })))));

        let mut finished = HashMap::new();
        while let Ok(evt) = rx.try_recv() {
            if let EngineEvent::JobFinished { job_id, .. } = evt {
                *finished.entry(job_id).or_insert(0) += 1;
            }
        }
        assert_eq!(urls.len(), finished.len());
        assert!(finished.values().all(|n| *n == 1));
        let _ = std::fs::remove_dir_all(out);
    }

    #[tokio::test]
    async fn test_finished_job_is_released() {
        let out = temp_out_dir("release");
        let (engine, mut rx) = engine_with_missing_tools(out.clone());
        let job = engine
            .submit("https://youtu.be/abc", PlatformChoice::Auto, FormatChoice::default(), None)
            .await
            .unwrap();

        while let Some(evt) = rx.recv().await {
            if matches!(evt, EngineEvent::JobFinished { .. }) {
                break;
            }
        }
        let outcome = tokio::time::timeout(Duration::from_secs(5), engine.wait_job(job))
            .await
            .expect("finished job should join promptly");
        assert!(outcome.is_some());
        assert!(engine.jobs.lock().await.is_empty());
        let _ = std::fs::remove_dir_all(out);
    }

    #[tokio::test]
    async fn test_event_order_for_a_job() {
        let out = temp_out_dir("order");
        let (engine, mut rx) = engine_with_missing_tools(out.clone());
        let job = engine
            .submit("https://youtu.be/abc", PlatformChoice::Auto, FormatChoice::default(), None)
            .await
            .unwrap();
        engine.wait_job(job).await;

        let mut kinds = vec![];
        while let Ok(evt) = rx.try_recv() {
            assert_eq!(job, evt.job_id());
            kinds.push(match evt {
                EngineEvent::JobAdded { .. } => "added",
                EngineEvent::JobStatusChanged { status: JobStatus::Queued, .. } => "queued",
                EngineEvent::JobStatusChanged { status: JobStatus::Running, .. } => "running",
                EngineEvent::JobStatusChanged { .. } => "other",
                EngineEvent::Progress { .. } => "progress",
                EngineEvent::JobFinished { .. } => "finished",
            });
        }
        assert_eq!(vec!["added", "queued", "running", "finished"], kinds);
        let _ = std::fs::remove_dir_all(out);
    }
}
