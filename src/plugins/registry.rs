use crate::core::model::{JobDescriptor, Platform};
use clap::{ArgMatches, Command};

/// Whether the downloader should restrict file names to what Windows accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameSafety {
    Windows,
    Permissive,
}

impl FilenameSafety {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Permissive
        }
    }
}

/// Settings shared by all tools; computed once at startup.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub filename_safety: FilenameSafety,
    pub ytdlp_bin: String,
    pub spotdl_bin: String,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            filename_safety: FilenameSafety::for_host(),
            ytdlp_bin: crate::plugins::ytdlp::command::TOOL_NAME.to_string(),
            spotdl_bin: crate::plugins::spotdl::command::TOOL_NAME.to_string(),
        }
    }
}

/// A fully built external process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Display name used when the program cannot be found.
    pub tool: &'static str,
    pub program: String,
    pub args: Vec<String>,
}

pub trait DownloaderTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, platform: Platform) -> bool;
    fn program(&self, ctx: &ToolContext) -> String;
    fn build_args(&self, job: &JobDescriptor, ctx: &ToolContext) -> Vec<String>;
}

pub trait CliPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn augment_command(&self, cmd: Command) -> Command;
    fn apply_matches(&self, matches: &ArgMatches, ctx: &mut ToolContext) -> anyhow::Result<()>;
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn DownloaderTool>>,
    /// Used for any platform no specialised tool claims.
    fallback: Box<dyn DownloaderTool>,
    cli_plugins: Vec<Box<dyn CliPlugin>>,
}

impl ToolRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self {
            tools: vec![],
            fallback: Box::new(crate::plugins::ytdlp::command::YtDlp::new()),
            cli_plugins: vec![],
        };

        reg.tools.push(Box::new(crate::plugins::spotdl::command::SpotDl::new()));

        reg.cli_plugins.push(Box::new(crate::plugins::ytdlp::cli::YtDlpCliPlugin::new()));
        reg.cli_plugins.push(Box::new(crate::plugins::spotdl::cli::SpotDlCliPlugin::new()));
        reg
    }

    pub fn augment_command(&self, cmd: Command) -> Command {
        self.cli_plugins
            .iter()
            .fold(cmd, |c, p| p.augment_command(c))
    }

    pub fn apply_matches(&self, matches: &ArgMatches, ctx: &mut ToolContext) -> anyhow::Result<()> {
        for p in &self.cli_plugins {
            tracing::debug!(plugin = p.name(), "applying cli options");
            p.apply_matches(matches, ctx)?;
        }
        Ok(())
    }

    pub fn tool_for(&self, platform: Platform) -> &dyn DownloaderTool {
        self.tools
            .iter()
            .find(|t| t.supports(platform))
            .map(|t| t.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Builds the argv for a job. Pure: the same job and context always
    /// yield the same invocation.
    pub fn build(&self, job: &JobDescriptor, ctx: &ToolContext) -> Invocation {
        let tool = self.tool_for(job.platform);
        Invocation {
            tool: tool.name(),
            program: tool.program(ctx),
            args: tool.build_args(job, ctx),
        }
    }
}
