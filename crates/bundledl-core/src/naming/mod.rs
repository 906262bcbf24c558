//! On-disk name resolution for downloaded files.
//!
//! A server-provided `Content-Disposition` filename wins; otherwise the name
//! is built from the product's display name and the format's extension.

mod disposition;
mod sanitize;

pub use disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

/// Name used when every other rule yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Normalized extension of a format name: leading dot stripped, lowercased.
///
/// `".PDF"` → `"pdf"`, `"epub"` → `"epub"`.
pub fn format_extension(format_name: &str) -> String {
    format_name.trim().trim_start_matches('.').to_lowercase()
}

/// Builds the fallback filename from a display name and a format name.
///
/// The result is lowercased and sanitized. Supplementary archives and video
/// bundles are published under pseudo-extensions and are renamed to zips.
pub fn fallback_filename(display_name: &str, format_name: &str) -> String {
    qualified_fallback_filename(display_name, None, format_name)
}

/// Like [`fallback_filename`], with `qualifier` (e.g. a platform tag) joined
/// to the stem: `game` + `windows` + `download` → `game_windows_video.zip`.
pub fn qualified_fallback_filename(
    display_name: &str,
    qualifier: Option<&str>,
    format_name: &str,
) -> String {
    let mut base = sanitize_filename(&display_name.to_lowercase());
    if let Some(q) = qualifier.map(|q| sanitize_filename(&q.to_lowercase())) {
        if !q.is_empty() {
            base = format!("{}_{}", base, q);
        }
    }
    let ext = format_extension(format_name);
    let raw = match ext.as_str() {
        "" => base,
        "supplement" => format!("{}_supplement.zip", base),
        "download" => format!("{}_video.zip", base),
        _ => format!("{}.{}", base, ext),
    };
    usable(sanitize_filename(&raw)).unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Sanitized filename from a `Content-Disposition` value, if it yields a usable one.
pub fn disposition_filename(content_disposition: &str) -> Option<String> {
    parse_content_disposition_filename(content_disposition)
        .and_then(|raw| usable(sanitize_filename(&raw)))
}

/// Resolves the on-disk filename for a download.
///
/// Precedence: the sanitized `Content-Disposition` filename, if the header is
/// present and parses to something usable; else [`fallback_filename`].
/// A malformed header silently falls through to the fallback.
pub fn resolve_filename(
    content_disposition: Option<&str>,
    display_name: &str,
    format_name: &str,
) -> String {
    content_disposition
        .and_then(disposition_filename)
        .unwrap_or_else(|| fallback_filename(display_name, format_name))
}

fn usable(name: String) -> Option<String> {
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}
