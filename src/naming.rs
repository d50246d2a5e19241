//! Deterministic download filenames.

use crate::page::strip_query;

/// Builds `<label>_<stem>_img_<secs>_photo.jpg` names for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamer {
    label: String,
}

impl FileNamer {
    pub fn new(raw_label: &str, default_label: &str) -> Self {
        let label = sanitize_label(raw_label);
        let label = if label.is_empty() {
            sanitize_label(default_label)
        } else {
            label
        };
        Self { label }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pure in its inputs: `fallback_secs` is only used when the URL carries
    /// no trailing timestamp.
    pub fn file_name(&self, url: &str, ordinal: usize, fallback_secs: u64) -> String {
        let secs = trailing_digits(url)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_secs.to_string());
        let stem = jpg_stem(strip_query(url))
            .map(str::to_string)
            .unwrap_or_else(|| format!("photo_{ordinal}"));
        format!("{}_{}_img_{}_photo.jpg", self.label, stem, secs)
    }
}

/// Whitespace runs become `_`, then anything outside `[A-Za-z0-9_.-]` is dropped.
pub fn sanitize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

/// The run of ASCII digits ending `url`, kept verbatim however long it is.
fn trailing_digits(url: &str) -> Option<&str> {
    let rest = url.trim_end_matches(|c: char| c.is_ascii_digit());
    (rest.len() < url.len()).then(|| &url[rest.len()..])
}

/// Name of the first path segment that ends in `.jpg` (any case), without
/// the extension. `/a/photo.JPG` gives `photo`.
fn jpg_stem(path: &str) -> Option<&str> {
    path.split('/').skip(1).find_map(|segment| {
        let lower = segment.to_ascii_lowercase();
        match lower.rfind(".jpg") {
            Some(pos) if pos > 0 => Some(&segment[..pos]),
            _ => None,
        }
    })
}
