use crate::core::model::{ContentType, Platform};
use lazy_static::lazy_static;
use regex::Regex;

const PLATFORM_MARKERS: &[(Platform, &[&str])] = &[
    (Platform::Youtube, &["youtube.com", "youtu.be"]),
    (Platform::Soundcloud, &["soundcloud.com"]),
    (Platform::Spotify, &["spotify.com"]),
    (Platform::Yandex, &["music.yandex"]),
];

pub fn classify_platform(url: &str) -> Option<Platform> {
    let u = url.to_lowercase();
    PLATFORM_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| u.contains(m)))
        .map(|(p, _)| *p)
}

/// Never fails; anything unrecognised is treated as a single track.
pub fn classify_content_type(url: &str) -> ContentType {
    lazy_static! {
        static ref SOUNDCLOUD_SET: Regex = Regex::new(r"soundcloud\.com/[^/]+/sets/").unwrap();
        static ref SOUNDCLOUD_TRACK: Regex = Regex::new(r"soundcloud\.com/[^/]+/[^/?]+$").unwrap();
    }

    let u = url.to_lowercase();
    // `/track/` must win over `/album/`: some providers nest tracks under albums.
    if u.contains("/track/") {
        return ContentType::Track;
    }
    if u.contains("/album/") {
        return ContentType::Album;
    }
    if u.contains("/playlist/") || u.contains("/playlists/") || u.contains("list=") {
        return ContentType::Playlist;
    }
    if u.contains("watch?v=") || u.contains("youtu.be/") {
        return ContentType::Track;
    }
    if SOUNDCLOUD_SET.is_match(&u) {
        return ContentType::Playlist;
    }
    if SOUNDCLOUD_TRACK.is_match(&u) {
        return ContentType::Track;
    }
    ContentType::Track
}
