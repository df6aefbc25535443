use crate::plugins::registry::{CliPlugin, ToolContext};
use clap::{Arg, ArgMatches, Command};

pub struct SpotDlCliPlugin;

impl SpotDlCliPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl CliPlugin for SpotDlCliPlugin {
    fn name(&self) -> &'static str {
        "spotdl"
    }

    fn augment_command(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("spotdl_bin")
                .long("spotdl-bin")
                .help_heading("SPOTIFY")
                .help("Path to the spotdl binary")
                .default_value(super::command::TOOL_NAME)
                .num_args(1),
        )
    }

    fn apply_matches(&self, matches: &ArgMatches, ctx: &mut ToolContext) -> anyhow::Result<()> {
        if let Some(v) = matches.get_one::<String>("spotdl_bin") {
            if v.trim().is_empty() {
                anyhow::bail!("--spotdl-bin must not be empty");
            }
            ctx.spotdl_bin = v.clone();
        }
        Ok(())
    }
}
