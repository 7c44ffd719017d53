//! Filename sanitization and output path resolution

use std::path::{Path, PathBuf};

use crate::spotify::models::TrackDescriptor;

/// Windows reserved device names. Illegal as a filename or as the part
/// before the first dot, regardless of case.
const RESERVED_NAMES: [&str; 22] = [
    "AUX", "CON", "NUL", "PRN", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a single path component for safe filesystem usage.
///
/// Replaces filesystem-illegal characters and control characters with `_`,
/// collapses a leading reserved device name to `_`, and replaces a leading
/// whitespace character or a trailing whitespace/dot character with `_`.
pub fn fix_filename(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '|' | '<' | '>' | '"' | '?' | '*' => '_',
            c if (c as u32) <= 0x1f => '_',
            c => c,
        })
        .collect();

    for reserved in RESERVED_NAMES {
        let matches_reserved = out
            .get(..reserved.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(reserved));
        if matches_reserved {
            let rest = &out[reserved.len()..];
            if rest.is_empty() || rest.starts_with('.') {
                out = format!("_{rest}");
                break;
            }
        }
    }

    if let Some(first) = out.chars().next() {
        if first.is_whitespace() {
            out.replace_range(..first.len_utf8(), "_");
        }
    }
    if let Some(last) = out.chars().last() {
        if last.is_whitespace() || last == '.' {
            let start = out.len() - last.len_utf8();
            out.replace_range(start.., "_");
        }
    }

    out
}

/// Render the output filename template for a track.
///
/// Each placeholder value is sanitized individually, so path separators
/// written into the template itself survive.
pub fn render_template(
    template: &str,
    descriptor: &TrackDescriptor,
    requested_id: &str,
    ext: &str,
) -> String {
    let artist = descriptor.artists.first().map(String::as_str).unwrap_or("");

    template
        .replace("{artist}", &fix_filename(artist))
        .replace("{album}", &fix_filename(&descriptor.album))
        .replace("{song_name}", &fix_filename(&descriptor.title))
        .replace("{release_year}", &fix_filename(&descriptor.release_year))
        .replace("{disc_number}", &fix_filename(&descriptor.disc_number.to_string()))
        .replace("{track_number}", &fix_filename(&descriptor.track_number.to_string()))
        .replace("{id}", &fix_filename(&descriptor.id))
        .replace("{track_id}", &fix_filename(requested_id))
        .replace("{ext}", ext)
}

/// Pick the collision-suffixed sibling of `path` with the smallest positive
/// integer not already taken in the target directory.
pub fn with_collision_suffix(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    let ext = path.extension().and_then(|s| s.to_str());
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut n: u32 = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// A path counts as a complete download only if it exists with non-zero
/// size. Zero-byte leftovers from a crashed run are incomplete.
pub fn file_complete(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
