use crate::core::model::{JobDescriptor, Percent};
use crate::i18n::Messages;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_WIDTH: usize = 44;
/// Bar length in steps; one step is a tenth of a percent.
const BAR_STEPS: u64 = 1000;
const URL_MAX: usize = 60;
const TITLE_MAX: usize = 32;
const ERROR_MAX: usize = 55;

#[derive(Clone)]
pub struct CardStyles {
    running: ProgressStyle,
    done: ProgressStyle,
    failed: ProgressStyle,
}

impl CardStyles {
    pub fn new() -> anyhow::Result<Self> {
        let template = |colors: &str| format!("{{prefix}}\n{{bar:{}.{}}}\n{{msg}}", BAR_WIDTH, colors);
        let running = ProgressStyle::with_template(&template("green/dim"))?.progress_chars("█░");
        let done = ProgressStyle::with_template(&template("green"))?.progress_chars("█░");
        let failed = ProgressStyle::with_template(&template("red/red"))?.progress_chars("✗✗");
        Ok(Self { running, done, failed })
    }
}

/// One job on screen: header, bar, info line.
pub struct Card {
    bar: ProgressBar,
    messages: &'static Messages,
    url: String,
    pct: String,
    speed: String,
    eta: String,
    size: String,
    track: String,
    finished: bool,
}

impl Card {
    pub fn new(bar: ProgressBar, styles: &CardStyles, job: &JobDescriptor, messages: &'static Messages) -> Self {
        bar.set_length(BAR_STEPS);
        bar.set_style(styles.running.clone());
        bar.set_prefix(format!(
            "{:<5}{:<18}{}",
            job.content_type.icon(),
            format!("[{}]", job.platform.as_str().to_uppercase()),
            shorten(&job.url, URL_MAX)
        ));

        let mut card = Self {
            bar,
            messages,
            url: job.url.clone(),
            pct: format_pct(0.0),
            speed: String::new(),
            eta: String::new(),
            size: String::new(),
            track: messages.queued.to_string(),
            finished: false,
        };
        card.redraw();
        card
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_running(&mut self) {
        self.track = self.messages.downloading.to_string();
        self.redraw();
    }

    pub fn update_progress(&mut self, p: &Percent) {
        self.set_bar(p.pct);

        let speed = visible(&p.speed);
        let eta = visible(&p.eta);
        self.speed = speed.map(|s| format!("⚡ {}", s)).unwrap_or_default();
        self.eta = eta.map(|s| format!("⏱ {}", s)).unwrap_or_default();

        let (dl, total) = (&p.downloaded_size, &p.total_size);
        self.size = if total != "N/A" && total != "~0" {
            format!("💾 {} / {}", dl, total)
        } else if !dl.is_empty() {
            format!("💾 {}", dl)
        } else {
            String::new()
        };
        self.redraw();
    }

    /// Shows `[now/total] title` and moves the bar to the start of item `now`.
    pub fn update_track(&mut self, now: u32, total: u32, title: &str) {
        let mut label = format!("[{}/{}]", now, total);
        if !title.is_empty() {
            label.push(' ');
            label.push_str(&shorten(title, TITLE_MAX));
        }
        self.track = label;

        if total > 0 {
            let pct = now.saturating_sub(1) as f64 / total as f64 * 100.0;
            self.set_bar(pct);
        }
        self.redraw();
    }

    pub fn set_done(&mut self, styles: &CardStyles, items: u32) {
        self.bar.set_style(styles.done.clone());
        self.bar.set_position(BAR_STEPS);
        self.pct = "100.0%".to_string();
        self.speed.clear();
        self.eta.clear();
        self.track = if items > 1 {
            format!("{} · {} {}", self.messages.done, items, self.messages.tracks)
        } else {
            self.messages.done.to_string()
        };
        self.finished = true;
        self.redraw();
        self.bar.finish();
    }

    pub fn set_error(&mut self, styles: &CardStyles, reason: &str) {
        self.bar.set_style(styles.failed.clone());
        self.pct = self.messages.error_tag.to_string();
        self.track = reason.chars().take(ERROR_MAX).collect();
        self.finished = true;
        self.redraw();
        self.bar.abandon();
    }

    fn set_bar(&mut self, pct: f64) {
        let pct = pct.clamp(0.0, 100.0);
        self.pct = format_pct(pct);
        self.bar.set_position((pct * 10.0).round() as u64);
    }

    fn redraw(&self) {
        self.bar.set_message(format!(
            "{:<8}{:<14}{:<14}{:<22}{}",
            self.pct, self.speed, self.eta, self.size, self.track
        ));
    }
}

fn format_pct(pct: f64) -> String {
    format!("{:5.1}%", pct)
}

/// yt-dlp reports unknown speed/eta as `N/A` or `Unknown`.
fn visible(s: &str) -> Option<&str> {
    match s {
        "" | "N/A" | "Unknown" => None,
        other => Some(other),
    }
}

pub fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ContentType, FormatChoice, Platform};
    use crate::i18n::EN;
    use std::path::PathBuf;

    fn card() -> (Card, CardStyles) {
        let styles = CardStyles::new().unwrap();
        let job = JobDescriptor {
            url: "https://www.youtube.com/playlist?list=PL0123456789abcdefghijklmnopqrstuvwxyzABCDEFGH".into(),
            platform: Platform::Youtube,
            content_type: ContentType::Playlist,
            format: FormatChoice::Mp3_320,
            out_dir: PathBuf::from("/music"),
        };
        (Card::new(ProgressBar::hidden(), &styles, &job, &EN), styles)
    }

    fn percent(pct: f64, speed: &str, eta: &str, total: &str, dl: &str) -> Percent {
        Percent {
            pct,
            speed: speed.into(),
            eta: eta.into(),
            total_size: total.into(),
            downloaded_size: dl.into(),
        }
    }

    #[test]
    fn test_header_is_shortened() {
        let (c, _) = card();
        let prefix = c.bar().prefix();
        assert!(prefix.starts_with("≡"));
        assert!(prefix.contains("[YOUTUBE]"));
        assert!(prefix.ends_with('…'));
        assert!(c.bar().message().contains(EN.queued));
    }

    #[test]
    fn test_progress_line() {
        let (mut c, _) = card();
        c.update_progress(&percent(45.0, "1.2MiB/s", "00:10", "10MiB", "4.5MiB"));
        let msg = c.bar().message();
        assert!(msg.starts_with(" 45.0%"));
        assert!(msg.contains("⚡ 1.2MiB/s"));
        assert!(msg.contains("⏱ 00:10"));
        assert!(msg.contains("💾 4.5MiB / 10MiB"));
        assert_eq!(450, c.bar().position());
    }

    #[test]
    fn test_unknown_values_are_hidden() {
        let (mut c, _) = card();
        c.update_progress(&percent(1.0, "Unknown", "N/A", "N/A", "12KiB"));
        let msg = c.bar().message();
        assert!(!msg.contains('⚡'));
        assert!(!msg.contains('⏱'));
        assert!(msg.contains("💾 12KiB"));
        assert!(!msg.contains(" / "));
    }

    #[test]
    fn test_track_moves_bar_to_item_start() {
        let (mut c, _) = card();
        c.update_track(3, 4, "A very long title that will certainly be cut short");
        let msg = c.bar().message();
        assert!(msg.contains("[3/4] A very long title that will cert…"));
        assert_eq!(500, c.bar().position());
    }

    #[test]
    fn test_done_and_error() {
        let (mut c, styles) = card();
        c.set_done(&styles, 7);
        assert!(c.is_finished());
        assert!(c.bar().message().contains("✅ Done · 7 tracks"));

        let (mut c, styles) = card();
        c.set_error(&styles, &"x".repeat(100));
        assert!(c.is_finished());
        assert!(c.bar().message().contains(&"x".repeat(ERROR_MAX)));
        assert!(!c.bar().message().contains(&"x".repeat(ERROR_MAX + 1)));
    }
}
