use crate::core::model::{Codec, ContentType, JobDescriptor, Platform};
use crate::plugins::registry::{DownloaderTool, FilenameSafety, ToolContext};

pub const TOOL_NAME: &str = "yt-dlp";

/// Pipe-separated so every progress line splits into exactly five fields.
pub const PROGRESS_TEMPLATE: &str = "%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s|%(progress._total_bytes_str)s|%(progress._downloaded_bytes_str)s";

const TRACK_TEMPLATE: &str = "%(uploader,artist,channel|Unknown)s - %(title)s.%(ext)s";
const ALBUM_TEMPLATE: &str = "%(uploader,artist,channel|Unknown)s - %(album,playlist_title|Album)s/%(track_number,playlist_index|00)02d - %(title)s.%(ext)s";
const PLAYLIST_TEMPLATE: &str = "%(playlist_uploader,uploader,channel|Playlist)s - %(playlist_title,title|Untitled)s/%(playlist_index|00)02d - %(title)s.%(ext)s";

pub fn output_template(ct: ContentType) -> &'static str {
    match ct {
        ContentType::Track => TRACK_TEMPLATE,
        ContentType::Album => ALBUM_TEMPLATE,
        ContentType::Playlist => PLAYLIST_TEMPLATE,
    }
}

pub struct YtDlp;

impl YtDlp {
    pub fn new() -> Self {
        Self
    }
}

impl DownloaderTool for YtDlp {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn supports(&self, platform: Platform) -> bool {
        platform != Platform::Spotify
    }

    fn program(&self, ctx: &ToolContext) -> String {
        ctx.ytdlp_bin.clone()
    }

    fn build_args(&self, job: &JobDescriptor, ctx: &ToolContext) -> Vec<String> {
        let (codec, bitrate) = job.format.codec_and_bitrate();

        let mut args: Vec<String> = vec![
            "--no-warnings".into(),
            "--newline".into(),
            "--progress-template".into(),
            PROGRESS_TEMPLATE.into(),
            match ctx.filename_safety {
                FilenameSafety::Windows => "--windows-filenames".into(),
                FilenameSafety::Permissive => "--no-windows-filenames".into(),
            },
            "-f".into(),
            "bestaudio/best".into(),
        ];

        if codec != Codec::Best {
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push(codec.as_str().to_string());
            if let (Codec::Mp3, Some(kbps)) = (codec, bitrate) {
                args.push("--audio-quality".to_string());
                args.push(format!("{}k", kbps));
            }
        }

        args.push("--embed-thumbnail".to_string());
        args.push("--add-metadata".to_string());
        args.push(match job.content_type {
            ContentType::Track => "--no-playlist".into(),
            ContentType::Album | ContentType::Playlist => "--yes-playlist".into(),
        });

        let out = job.out_dir.join(output_template(job.content_type));
        args.push("-o".to_string());
        args.push(out.to_string_lossy().into_owned());
        args.push(job.url.clone());
        args
    }
}
