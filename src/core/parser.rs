use crate::core::model::Percent;
use lazy_static::lazy_static;
use regex::Regex;

/// What a single output line tells us. One line may carry several signals.
#[derive(Debug, Clone, PartialEq)]
pub enum LineSignal {
    Progress(Percent),
    ItemBoundary { index: u32, total: u32 },
    Destination { title: String },
    ExtractAudio,
    SongCount { now: u32, total: u32 },
}

lazy_static! {
    static ref ITEM_OF: Regex = Regex::new(r"Downloading item (\d+) of (\d+)").unwrap();
    static ref VIDEO_OF: Regex = Regex::new(r"Downloading video (\d+) of (\d+)").unwrap();
    static ref DESTINATION: Regex = Regex::new(r"Destination:.*?([^/\\]+)\.\w{1,5}$").unwrap();
    static ref SONGS: Regex = Regex::new(r"(\d+)/(\d+)\s+song").unwrap();
}

const EXTRACT_AUDIO_MARKER: &str = "[ExtractAudio]";

/// Classifies one line of downloader output. Never fails: lines nobody
/// recognises yield an empty vec.
pub fn parse_line(line: &str) -> Vec<LineSignal> {
    if let Some(p) = parse_progress(line) {
        return vec![LineSignal::Progress(p)];
    }

    for re in [&*ITEM_OF, &*VIDEO_OF] {
        if let Some((index, total)) = capture_pair(re, line) {
            return vec![LineSignal::ItemBoundary { index, total }];
        }
    }

    let mut signals = Vec::new();
    if let Some(c) = DESTINATION.captures(line) {
        signals.push(LineSignal::Destination { title: c[1].to_string() });
    }
    if line.contains(EXTRACT_AUDIO_MARKER) {
        signals.push(LineSignal::ExtractAudio);
    }
    if let Some((now, total)) = capture_pair(&SONGS, line) {
        signals.push(LineSignal::SongCount { now, total });
    }
    signals
}

/// `percent|speed|eta|total|downloaded`, as requested via `--progress-template`.
pub fn parse_progress(line: &str) -> Option<Percent> {
    let parts: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    let [pct_s, speed, eta, total, downloaded] = parts[..] else {
        return None;
    };

    let pct: f64 = match pct_s.replace('%', "").trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::trace!(line, "dropping malformed progress line");
            return None;
        }
    };
    if !pct.is_finite() {
        return None;
    }

    Some(Percent {
        pct: pct.clamp(0.0, 100.0),
        speed: speed.to_string(),
        eta: eta.to_string(),
        total_size: total.to_string(),
        downloaded_size: downloaded.to_string(),
    })
}

fn capture_pair(re: &Regex, line: &str) -> Option<(u32, u32)> {
    let c = re.captures(line)?;
    let a = c[1].parse().ok()?;
    let b = c[2].parse().ok()?;
    Some((a, b))
}
