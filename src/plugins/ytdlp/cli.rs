use crate::plugins::registry::{CliPlugin, ToolContext};
use clap::{Arg, ArgMatches, Command};

pub struct YtDlpCliPlugin;

impl YtDlpCliPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl CliPlugin for YtDlpCliPlugin {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn augment_command(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("ytdlp_bin")
                .long("yt-dlp-bin")
                .help_heading("YT-DLP")
                .help("Path to the yt-dlp binary (YouTube, SoundCloud, Yandex Music)")
                .default_value(super::command::TOOL_NAME)
                .num_args(1),
        )
    }

    fn apply_matches(&self, matches: &ArgMatches, ctx: &mut ToolContext) -> anyhow::Result<()> {
        if let Some(v) = matches.get_one::<String>("ytdlp_bin") {
            if v.trim().is_empty() {
                anyhow::bail!("--yt-dlp-bin must not be empty");
            }
            ctx.ytdlp_bin = v.clone();
        }
        Ok(())
    }
}
