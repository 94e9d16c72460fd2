// src/utils.rs

use crate::constants;
use regex::Regex;
use std::{
    ffi::OsStr,
    path::Path,
    sync::LazyLock,
};
use url::Url;

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn sanitize_filename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() {
        return "unknown".to_string();
    }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, " ").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();
    if name.is_empty() {
        return "unnamed".to_string();
    }

    if name.as_bytes().len() > constants::MAX_FILENAME_BYTES {
        name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string();
    }
    name
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    &s[..i]
}

/// 从 URL 推导默认输出文件名。m3u8 链接取主干并替换扩展名为 mp4，
/// 直链保留原始扩展名。推导不出文件名时退回默认名。
pub fn filename_from_url(url_str: &str, keep_extension: bool) -> String {
    let name = Url::parse(url_str)
        .ok()
        .and_then(|u| u.path_segments().and_then(|segments| segments.last().map(str::to_string)))
        .filter(|s| !s.is_empty())
        .map(|s| sanitize_filename(&s))
        .unwrap_or_else(|| constants::DEFAULT_OUTPUT_FILE.to_string());

    if keep_extension {
        return name;
    }
    match Path::new(&name).file_stem() {
        Some(stem) => format!("{}.mp4", stem.to_string_lossy()),
        None => name,
    }
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 {
        text.to_string()
    } else {
        format!("{}...", &text[..end_pos])
    }
}
