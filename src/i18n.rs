//! Dashboard strings. Select with `--locale` (e.g. `--locale ru`).

use crate::core::model::JobFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" | "ru_ru" | "russian" => Self::Ru,
            _ => Self::En,
        }
    }
}

pub struct Messages {
    pub queued: &'static str,
    pub downloading: &'static str,
    pub done: &'static str,
    pub tracks: &'static str,
    pub error_tag: &'static str,
    pub not_found: &'static str,
    pub exit_code: &'static str,
    pub terminated: &'static str,
    pub prompt: &'static str,
    pub queue_cleared: &'static str,
    pub unknown_format: &'static str,
    pub unknown_command: &'static str,
    pub tool_missing: &'static str,
    pub install_hint: &'static str,
    pub summary_header: &'static str,
}

pub static EN: Messages = Messages {
    queued: "⏳ Queued",
    downloading: "⚡ Downloading…",
    done: "✅ Done",
    tracks: "tracks",
    error_tag: " ERR",
    not_found: "not found",
    exit_code: "Error (code",
    terminated: "Terminated",
    prompt: "Paste a track / album / playlist URL (:help for commands)",
    queue_cleared: "Finished downloads cleared",
    unknown_format: "unknown format, using mp3-320",
    unknown_command: "unknown command",
    tool_missing: "⚠  yt-dlp not found.",
    install_hint: "Install it with",
    summary_header: "Summary",
};

pub static RU: Messages = Messages {
    queued: "⏳ В очереди",
    downloading: "⚡ Загружается…",
    done: "✅ Готово",
    tracks: "треков",
    error_tag: " ERR",
    not_found: "не найден",
    exit_code: "Ошибка (код",
    terminated: "Прервано",
    prompt: "Вставьте URL трека / альбома / плейлиста (:help — команды)",
    queue_cleared: "Завершённые загрузки убраны",
    unknown_format: "неизвестный формат, используется mp3-320",
    unknown_command: "неизвестная команда",
    tool_missing: "⚠  yt-dlp не найден.",
    install_hint: "Установите",
    summary_header: "Итог",
};

pub fn get_messages(locale: Locale) -> &'static Messages {
    match locale {
        Locale::En => &EN,
        Locale::Ru => &RU,
    }
}

/// Short, user-facing reason for a failed job.
pub fn describe_failure(failure: &JobFailure, m: &Messages) -> String {
    match failure {
        JobFailure::ToolNotFound { tool } => format!("'{}' {}", tool, m.not_found),
        JobFailure::ExitCode(code) => format!("{} {})", m.exit_code, code),
        JobFailure::Terminated => m.terminated.to_string(),
        JobFailure::Unexpected(msg) => msg.clone(),
    }
}
