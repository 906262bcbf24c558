//! Filesystem-safe filename sanitization.

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

/// Longest suffix still treated as an extension when shortening a name.
const MAX_EXTENSION: usize = 16;

/// Sanitizes a candidate filename so it is a single, portable path component.
///
/// - Path separators (`/`, `\`) become `_`
/// - Characters illegal on common filesystems (`: ! ? * " < > |`) become spaces
/// - Control characters are dropped
/// - Runs of spaces collapse to one; leading/trailing spaces and dots are trimmed
/// - Length is limited to 255 bytes on a char boundary; the stem is
///   shortened so the extension survives
///
/// Case is preserved.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_space = false;

    for c in name.chars() {
        let replacement = match c {
            '/' | '\\' => Some('_'),
            ':' | '!' | '?' | '*' | '"' | '<' | '>' | '|' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        };
        let Some(r) = replacement else {
            continue;
        };
        if r == ' ' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(r);
            prev_space = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.len() <= NAME_MAX {
        return trimmed.to_string();
    }

    let (stem, ext) = match trimmed.rfind('.') {
        Some(dot) if dot > 0 && trimmed.len() - dot <= MAX_EXTENSION => trimmed.split_at(dot),
        _ => (trimmed, ""),
    };
    let stem = truncate_on_boundary(stem, NAME_MAX - ext.len()).trim_end_matches([' ', '.']);
    format!("{}{}", stem, ext)
}

fn truncate_on_boundary(s: &str, max: usize) -> &str {
    let mut take = s.len().min(max);
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}
