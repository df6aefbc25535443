use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Youtube,
    Soundcloud,
    Spotify,
    Yandex,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Soundcloud => "soundcloud",
            Platform::Spotify => "spotify",
            Platform::Yandex => "yandex",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Youtube => "🎬 YouTube",
            Platform::Soundcloud => "☁  SoundCloud",
            Platform::Spotify => "🎵 Spotify",
            Platform::Yandex => "🎧 Yandex Music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform as picked by the user; `Auto` is resolved from the URL at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformChoice {
    #[default]
    Auto,
    Fixed(Platform),
}

impl FromStr for PlatformChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = match s.trim().to_ascii_lowercase().as_str() {
            "auto" => return Ok(Self::Auto),
            "youtube" | "yt" => Platform::Youtube,
            "soundcloud" | "sc" => Platform::Soundcloud,
            "spotify" => Platform::Spotify,
            "yandex" | "yandex-music" => Platform::Yandex,
            other => anyhow::bail!("unknown platform: {}", other),
        };
        Ok(Self::Fixed(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Track,
    Album,
    Playlist,
}

impl ContentType {
    pub fn icon(&self) -> &'static str {
        match self {
            ContentType::Track => "♪",
            ContentType::Album => "◉",
            ContentType::Playlist => "≡",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ContentType::Track => "Track",
            ContentType::Album => "Album",
            ContentType::Playlist => "Playlist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Mp3,
    Flac,
    M4a,
    Opus,
    Wav,
    /// Keep whatever the source serves; no extraction.
    Best,
}

impl Codec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Mp3 => "mp3",
            Codec::Flac => "flac",
            Codec::M4a => "m4a",
            Codec::Opus => "opus",
            Codec::Wav => "wav",
            Codec::Best => "best",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatChoice {
    #[default]
    Mp3_320,
    Mp3_128,
    Flac,
    M4a,
    Opus,
    Wav,
    Original,
}

impl FormatChoice {
    pub const ALL: [FormatChoice; 7] = [
        FormatChoice::Mp3_320,
        FormatChoice::Mp3_128,
        FormatChoice::Flac,
        FormatChoice::M4a,
        FormatChoice::Opus,
        FormatChoice::Wav,
        FormatChoice::Original,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormatChoice::Mp3_320 => "mp3-320",
            FormatChoice::Mp3_128 => "mp3-128",
            FormatChoice::Flac => "flac",
            FormatChoice::M4a => "m4a",
            FormatChoice::Opus => "opus",
            FormatChoice::Wav => "wav",
            FormatChoice::Original => "original",
        }
    }

    /// Accepts `mp3-320`, `mp3 320k`, `mp3_320` and friends.
    pub fn from_label(s: &str) -> Option<Self> {
        let norm: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let norm = norm.trim_end_matches('k');
        match norm {
            "mp3320" | "mp3" => Some(Self::Mp3_320),
            "mp3128" => Some(Self::Mp3_128),
            "flac" => Some(Self::Flac),
            "m4a" => Some(Self::M4a),
            "opus" => Some(Self::Opus),
            "wav" => Some(Self::Wav),
            "original" | "best" => Some(Self::Original),
            _ => None,
        }
    }

    pub fn codec_and_bitrate(&self) -> (Codec, Option<u32>) {
        match self {
            FormatChoice::Mp3_320 => (Codec::Mp3, Some(320)),
            FormatChoice::Mp3_128 => (Codec::Mp3, Some(128)),
            FormatChoice::Flac => (Codec::Flac, None),
            FormatChoice::M4a => (Codec::M4a, None),
            FormatChoice::Opus => (Codec::Opus, None),
            FormatChoice::Wav => (Codec::Wav, None),
            FormatChoice::Original => (Codec::Best, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub url: String,
    pub platform: Platform,
    pub content_type: ContentType,
    pub format: FormatChoice,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Percent {
    pub pct: f64,
    pub speed: String,
    pub eta: String,
    pub total_size: String,
    pub downloaded_size: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Percent(Percent),
    ItemBoundary { index: u32, total: u32, title: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    #[error("'{tool}' not found")]
    ToolNotFound { tool: &'static str },

    #[error("exited with code {0}")]
    ExitCode(i32),

    #[error("terminated by signal")]
    Terminated,

    #[error("{0}")]
    Unexpected(String),
}

pub const MAX_FAILURE_MESSAGE: usize = 80;

impl JobFailure {
    pub fn unexpected(msg: impl fmt::Display) -> Self {
        let msg = msg.to_string();
        JobFailure::Unexpected(msg.chars().take(MAX_FAILURE_MESSAGE).collect())
    }
}

impl From<std::io::Error> for JobFailure {
    fn from(e: std::io::Error) -> Self {
        JobFailure::unexpected(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { items_completed: u32 },
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Succeeded { .. } => JobStatus::Succeeded,
            JobOutcome::Failed(_) => JobStatus::Failed,
        }
    }
}
