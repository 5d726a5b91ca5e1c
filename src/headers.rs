use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `[TagName "TagValue"]`, value captured between the first quote and the final `"]`.
static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[(\S+)\s+"(.*)"\]$"#).expect("valid header regex"));

/// Tag pairs of the PGN preamble. No tag is guaranteed present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap(HashMap<String, String>);

impl HeaderMap {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    /// Tag value, or `""` when the tag is missing.
    pub fn value(&self, tag: &str) -> &str {
        self.get(tag).unwrap_or("")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses the leading bracketed lines of `pgn`.
///
/// The header block ends at the first line that is empty or does not start with `[`.
/// Lines inside the block that do not match the tag-pair shape are skipped; a repeated tag
/// keeps its last value.
pub fn parse_headers(pgn: &str) -> HeaderMap {
    let mut headers = HashMap::new();

    for line in pgn.lines() {
        if !line.starts_with('[') {
            break;
        }
        if let Some(caps) = HEADER_LINE.captures(line) {
            headers.insert(caps[1].to_string(), caps[2].to_string());
        }
    }

    HeaderMap(headers)
}

/// Move text after the first blank line, line breaks folded into single spaces.
///
/// Returns `""` when the PGN has no blank-line separator.
pub fn extract_movetext(pgn: &str) -> String {
    let Some(body) = body_after_separator(pgn) else {
        return String::new();
    };

    body.lines()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn body_after_separator(pgn: &str) -> Option<&str> {
    let lf = pgn.find("\n\n").map(|idx| idx + 2);
    let crlf = pgn.find("\r\n\r\n").map(|idx| idx + 4);

    let start = match (lf, crlf) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some(&pgn[start..])
}
