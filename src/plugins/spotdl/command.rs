use crate::core::model::{Codec, JobDescriptor, Platform};
use crate::plugins::registry::{DownloaderTool, ToolContext};

pub const TOOL_NAME: &str = "spotdl";

pub struct SpotDl;

impl SpotDl {
    pub fn new() -> Self {
        Self
    }
}

impl DownloaderTool for SpotDl {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn supports(&self, platform: Platform) -> bool {
        platform == Platform::Spotify
    }

    fn program(&self, ctx: &ToolContext) -> String {
        ctx.spotdl_bin.clone()
    }

    fn build_args(&self, job: &JobDescriptor, _ctx: &ToolContext) -> Vec<String> {
        let (codec, bitrate) = job.format.codec_and_bitrate();

        let mut args = vec![
            job.url.clone(),
            "--output".to_string(),
            job.out_dir.to_string_lossy().into_owned(),
        ];
        if codec != Codec::Best {
            args.push("--format".to_string());
            args.push(codec.as_str().to_string());
            if let Some(kbps) = bitrate {
                args.push("--bitrate".to_string());
                args.push(format!("{}k", kbps));
            }
        }
        args
    }
}
