use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_SIZE, MAX_SIZE_HINT, MIN_SIZE_HINT};

/// Text and pixel size sent to the QR image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrRequest {
    pub data: String,
    pub size: i64,
}

impl QrRequest {
    pub fn new(data: impl Into<String>, size: i64) -> Self {
        Self {
            data: data.into(),
            size,
        }
    }

    /// Whitespace-only text never produces a request.
    pub fn is_blank(&self) -> bool {
        self.data.trim().is_empty()
    }

    /// `<endpoint>?data=<percent-encoded data>&size=<size>`. The data is
    /// encoded as typed, surrounding whitespace included.
    pub fn to_url(&self, endpoint: &str) -> String {
        format!(
            "{}?data={}&size={}",
            endpoint,
            encode_component(&self.data),
            self.size
        )
    }
}

/// `urlencoding` escapes that `encodeURIComponent` leaves as literals.
const COMPONENT_LITERALS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Percent-encodes a query value the way `encodeURIComponent` does: ASCII
/// alphanumerics and `-_.!~*'()` stay literal, everything else is escaped
/// as UTF-8.
pub fn encode_component(text: &str) -> String {
    // A literal `%` is escaped to `%25`, so these sequences only come from
    // the five characters above.
    COMPONENT_LITERALS
        .iter()
        .fold(urlencoding::encode(text).into_owned(), |encoded, (escape, literal)| {
            encoded.replace(escape, literal)
        })
}

/// Lenient integer parse of the size field.
///
/// Leading whitespace and an optional sign are accepted, digits are read
/// until the first non-digit. No digits, a zero result, or a value that
/// does not fit fall back to the default size. The advertised 100..=1000
/// range is not enforced.
pub fn normalize_size(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    let parsed = match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => return DEFAULT_SIZE,
    };

    if parsed == 0 {
        DEFAULT_SIZE
    } else {
        parsed
    }
}

/// Whether the size lies in the range the form advertises. Sizes outside
/// it are still sent.
pub fn is_advertised_size(size: i64) -> bool {
    (MIN_SIZE_HINT..=MAX_SIZE_HINT).contains(&size)
}

/// Raw bytes returned by the image service, kept opaque.
#[derive(Debug, Clone)]
pub struct QrImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl QrImage {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Inline `data:` URI for pasting the preview into a browser.
    pub fn to_data_uri(&self) -> String {
        let mime = self.content_type.as_deref().unwrap_or("image/png");
        format!("data:{};base64,{}", mime, STANDARD.encode(&self.bytes))
    }
}
