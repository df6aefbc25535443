mod core;
mod dashboard;
mod i18n;
mod plugins;

use crate::core::engine::{Engine, EngineConfig};
use crate::core::events::EngineEvent;
use crate::core::model::{FormatChoice, JobId, JobOutcome, PlatformChoice};
use crate::dashboard::input::{parse_input, InputCommand, HELP};
use crate::dashboard::{input_hint, Dashboard, LogWriter};
use crate::i18n::{get_messages, Locale, Messages};
use crate::plugins::registry::{ToolContext, ToolRegistry};
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::MultiProgress;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn common_args(cmd: Command, registry: &ToolRegistry) -> Command {
    let cmd = cmd
        .arg(
            Arg::new("platform")
                .long("platform")
                .help("auto, youtube, soundcloud, spotify or yandex")
                .default_value("auto")
                .num_args(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("mp3-320, mp3-128, flac, m4a, opus, wav or original")
                .default_value("mp3-320")
                .num_args(1),
        )
        .arg(
            Arg::new("out_dir")
                .long("out-dir")
                .help("Output directory [default: ~/Music/Downloads]")
                .num_args(1),
        );
    registry.augment_command(cmd)
}

fn build_cli(registry: &ToolRegistry) -> Command {
    let download = Command::new("download").about("Download one or more links and wait for them").arg(
        Arg::new("urls")
            .help("Track, album or playlist URLs")
            .action(ArgAction::Append)
            .num_args(1..)
            .required(true),
    );
    let queue = Command::new("queue").about("Read URLs from stdin and download them as they arrive");

    Command::new("music-downloader")
        .about("Music downloader dashboard for yt-dlp and spotdl")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("locale")
                .long("locale")
                .help("Dashboard language: en or ru")
                .default_value("en")
                .global(true)
                .num_args(1),
        )
        .arg(
            Arg::new("log_file")
                .long("log-file")
                .help("Write logs to this file instead of stderr")
                .global(true)
                .num_args(1),
        )
        .subcommand(common_args(download, registry))
        .subcommand(common_args(queue, registry))
}

/// Logs go to `log_file` when given, otherwise to stderr between card redraws.
fn init_logging(log_file: Option<&String>, mp: MultiProgress) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(LogWriter::new(mp)))
            .init(),
    }
    Ok(())
}

fn default_out_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("Downloads")
}

/// Per-session choices applied to every new submission.
struct Settings {
    platform: PlatformChoice,
    format: FormatChoice,
    out_dir: Option<PathBuf>,
}

impl Settings {
    fn from_matches(m: &ArgMatches) -> anyhow::Result<Self> {
        let platform = match m.get_one::<String>("platform") {
            Some(p) => p.parse()?,
            None => PlatformChoice::Auto,
        };
        let format = match m.get_one::<String>("format") {
            Some(f) => FormatChoice::from_label(f).with_context(|| {
                let known: Vec<_> = FormatChoice::ALL.iter().map(|f| f.label()).collect();
                format!("unknown format {}; expected one of {}", f, known.join(", "))
            })?,
            None => FormatChoice::default(),
        };
        Ok(Self { platform, format, out_dir: None })
    }

    fn describe(&self, fallback_out: &std::path::Path) -> String {
        let platform = match self.platform {
            PlatformChoice::Auto => "auto",
            PlatformChoice::Fixed(p) => p.as_str(),
        };
        let out = self.out_dir.as_deref().unwrap_or(fallback_out);
        format!("platform={} format={} out={}", platform, self.format.label(), out.display())
    }
}

/// Warns when the general-purpose downloader cannot be run at all.
async fn probe_ytdlp(ctx: &ToolContext, dashboard: &Dashboard, messages: &Messages) {
    let ok = tokio::process::Command::new(&ctx.ytdlp_bin)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);
    if ok {
        return;
    }
    tracing::warn!(bin = %ctx.ytdlp_bin, "yt-dlp probe failed");
    let install = if cfg!(windows) {
        "winget install yt-dlp"
    } else {
        "pip install -U yt-dlp (or your package manager)"
    };
    dashboard.println(messages.tool_missing);
    dashboard.println(format!("   {}: {}", messages.install_hint, install));
}

async fn run_download(
    engine: &Engine,
    rx: &mut UnboundedReceiver<EngineEvent>,
    dashboard: &mut Dashboard,
    messages: &'static Messages,
    settings: &Settings,
    urls: Vec<String>,
) -> anyhow::Result<()> {
    let mut pending = HashSet::new();
    for url in urls {
        match engine.submit(&url, settings.platform, settings.format, settings.out_dir.clone()).await {
            Ok(job_id) => {
                pending.insert(job_id);
            }
            Err(e) => dashboard.println(format!("{} {}: {:#}", messages.error_tag.trim(), url, e)),
        }
    }

    while !pending.is_empty() {
        let Some(evt) = rx.recv().await else { break };
        if let Some((job_id, _)) = dashboard.apply(evt) {
            pending.remove(&job_id);
        }
    }

    let results = engine.wait_all().await;
    while let Ok(evt) = rx.try_recv() {
        dashboard.apply(evt);
    }
    dashboard.print_summary();

    let failed = results.iter().filter(|(_, o)| matches!(o, JobOutcome::Failed(_))).count();
    if failed > 0 {
        anyhow::bail!("{} of {} downloads failed", failed, results.len());
    }
    Ok(())
}

async fn run_queue(
    engine: &Engine,
    rx: &mut UnboundedReceiver<EngineEvent>,
    dashboard: &mut Dashboard,
    messages: &'static Messages,
    mut settings: Settings,
) -> anyhow::Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut outstanding: HashSet<JobId> = HashSet::new();

    dashboard.println(messages.prompt);
    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("read stdin")? else {
                    stdin_open = false;
                    if outstanding.is_empty() {
                        break;
                    }
                    continue;
                };
                match parse_input(&line) {
                    InputCommand::Empty => {}
                    InputCommand::Submit(url) => {
                        dashboard.println(input_hint(&url));
                        match engine.submit(&url, settings.platform, settings.format, settings.out_dir.clone()).await {
                            Ok(job_id) => {
                                outstanding.insert(job_id);
                            }
                            Err(e) => dashboard.println(format!("{} {:#}", messages.error_tag.trim(), e)),
                        }
                    }
                    InputCommand::SetPlatform(p) => match p.parse::<PlatformChoice>() {
                        Ok(choice) => settings.platform = choice,
                        Err(e) => dashboard.println(format!("{} {}", messages.error_tag.trim(), e)),
                    },
                    InputCommand::SetFormat(f) => {
                        settings.format = FormatChoice::from_label(&f).unwrap_or_else(|| {
                            dashboard.println(format!("{}: {}", f, messages.unknown_format));
                            FormatChoice::default()
                        });
                    }
                    InputCommand::SetOutDir(dir) => settings.out_dir = Some(dir),
                    InputCommand::Clear => {
                        dashboard.clear_finished();
                        engine.forget_finished().await;
                        dashboard.println(messages.queue_cleared);
                    }
                    InputCommand::Help => {
                        dashboard.println(HELP);
                        dashboard.println(settings.describe(engine.default_out_dir()));
                    }
                    InputCommand::Quit => break,
                    InputCommand::Unknown(cmd) => {
                        dashboard.println(format!("{}: {}", messages.unknown_command, cmd));
                    }
                }
            }
            evt = rx.recv() => {
                let Some(evt) = evt else { break };
                if let Some((job_id, _)) = dashboard.apply(evt) {
                    outstanding.remove(&job_id);
                    // the task is past its last send; joining it releases the handle
                    engine.wait_job(job_id).await;
                    if !stdin_open && outstanding.is_empty() {
                        break;
                    }
                }
            }
        }
    }

    dashboard.print_summary();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let app = build_cli(&registry);
    let matches = app.get_matches();

    let (mode, m) = matches.subcommand().context("missing subcommand")?;
    let mp = MultiProgress::new();
    init_logging(m.get_one::<String>("log_file"), mp.clone())?;
    let messages = get_messages(m.get_one::<String>("locale").map(|s| Locale::from_str(s)).unwrap_or_default());

    let mut tools = ToolContext::default();
    registry.apply_matches(m, &mut tools)?;
    let settings = Settings::from_matches(m)?;
    let out_dir = m
        .get_one::<String>("out_dir")
        .map(PathBuf::from)
        .unwrap_or_else(default_out_dir);
    tracing::debug!(out_dir = %out_dir.display(), ?tools, "starting");

    let mut dashboard = Dashboard::with_target(mp, messages)?;
    probe_ytdlp(&tools, &dashboard, messages).await;

    let (engine, mut rx) = Engine::new(registry, EngineConfig { default_out_dir: out_dir, tools });

    match mode {
        "download" => {
            let urls: Vec<String> = m
                .get_many::<String>("urls")
                .context("no urls given")?
                .cloned()
                .collect();
            run_download(&engine, &mut rx, &mut dashboard, messages, &settings, urls).await
        }
        "queue" => run_queue(&engine, &mut rx, &mut dashboard, messages, settings).await,
        other => anyhow::bail!("unknown subcommand {}", other),
    }
}
