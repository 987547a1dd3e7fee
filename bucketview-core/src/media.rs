use serde::Serialize;

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif"];
const VIDEO_SUFFIXES: &[&str] = &[".mp4", ".mov", ".avi"];

/// What kind of media an object key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify an object key by its suffix.
    ///
    /// Matching is case sensitive and exact: `.JPG` is not recognized.
    /// The uploader always writes lowercase suffixes, and anything else in
    /// a bucket is treated as not gallery media. Returns `None` for
    /// unsupported keys, which are excluded from the gallery entirely.
    pub fn classify(key: &str) -> Option<Self> {
        if IMAGE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)) {
            Some(Self::Image)
        } else if VIDEO_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Capture date embedded in an object key as a `YYYYMMDD_` prefix.
///
/// Components are kept as the raw substrings; the key naming convention is
/// trusted, so `99991332_x.jpg` still parses. No calendar validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDate {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl CaptureDate {
    /// Parse the date prefix from an object key.
    ///
    /// The key must start with exactly eight ASCII digits followed by an
    /// underscore. The anchor applies to the full key, so a directory
    /// prefix before the digits (`2024/20240101_a.jpg`) defeats the match.
    pub fn from_key(key: &str) -> Option<Self> {
        let bytes = key.as_bytes();
        if bytes.len() < 9 || bytes[8] != b'_' {
            return None;
        }
        if !bytes[..8].iter().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            year: key[..4].to_string(),
            month: key[4..6].to_string(),
            day: key[6..8].to_string(),
        })
    }

    /// The `YYYY-MM-DD` grouping key for this date.
    pub fn date_key(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }
}
