//! Response header collection and parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::str;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Headers of the final response (after redirects) that a download cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the status line, if one was seen.
    pub status: Option<u32>,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
    /// Raw `Last-Modified` value if present.
    pub last_modified: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }
}

/// Accumulates raw header lines from curl's header callback.
///
/// curl reports the headers of every response in a redirect chain; a new
/// status line starts a new block so only the final response is kept.
#[derive(Debug, Default)]
pub struct HeaderLines {
    lines: Vec<String>,
}

impl HeaderLines {
    pub fn push(&mut self, data: &[u8]) {
        let Ok(s) = str::from_utf8(data) else {
            return;
        };
        let line = s.trim_end();
        if line.starts_with("HTTP/") {
            self.lines.clear();
        }
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
    }

    pub fn parse(&self) -> ResponseHead {
        parse_headers(&self.lines)
    }
}

/// Parse collected header lines into a `ResponseHead`.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.starts_with("HTTP/") {
            head.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse::<u32>().ok());
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            head.content_disposition = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("last-modified") {
            head.last_modified = Some(value.to_string());
        }
    }

    head
}

/// Obsolete date forms HTTP/1.1 recipients must still accept: RFC 850 and asctime.
const OBSOLETE_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Parse an HTTP date into a `SystemTime`.
///
/// Accepts the preferred form (`Wed, 21 Oct 2015 07:28:00 GMT`) and the two
/// obsolete ones. On failure the error of the preferred form is returned.
pub fn parse_http_date(value: &str) -> Result<SystemTime, chrono::ParseError> {
    let value = value.trim();
    let (secs, nanos) = match DateTime::parse_from_rfc2822(value) {
        Ok(dt) => (dt.timestamp(), dt.timestamp_subsec_nanos()),
        Err(err) => {
            let naive = OBSOLETE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .ok_or(err)?;
            let dt = Utc.from_utc_datetime(&naive);
            (dt.timestamp(), dt.timestamp_subsec_nanos())
        }
    };
    Ok(if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + Duration::from_nanos(nanos as u64)
    })
}
