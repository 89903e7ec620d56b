//! Utility functions for URL parsing and numeric formatting.

use thiserror::Error;

/// Length of a YouTube video identifier.
const SOURCE_ID_LEN: usize = 11;

/// Errors that can occur during source identifier extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceIdError {
    /// URL does not match any recognized shape.
    #[error("Unsupported source URL: {0}")]
    UnsupportedUrl(String),

    /// A recognized shape was found but the identifier is malformed.
    #[error("Malformed source identifier in URL: {0}")]
    MalformedId(String),
}

/// Result type for source identifier extraction.
pub type SourceIdResult<T> = Result<T, SourceIdError>;

/// Extract the 11-character source identifier from a URL.
///
/// Recognized shapes:
/// - `youtube.com/watch?v=ID` (the `v` parameter may appear anywhere in the query)
/// - `youtube.com/embed/ID`
/// - `youtu.be/ID`
/// - `youtube.com/v/ID`
///
/// Anything after the identifier (query, fragment, extra path) is ignored.
pub fn extract_source_id(url: &str) -> SourceIdResult<String> {
    let trimmed = url.trim();
    let lowered = trimmed.to_ascii_lowercase();

    let candidate = if lowered.contains("youtube.com/watch?") {
        extract_from_watch_query(trimmed)
    } else if let Some(rest) = after_marker(trimmed, &lowered, "youtu.be/") {
        Some(rest)
    } else if let Some(rest) = after_marker(trimmed, &lowered, "youtube.com/embed/") {
        Some(rest)
    } else {
        after_marker(trimmed, &lowered, "youtube.com/v/")
    };

    let Some(segment) = candidate else {
        return Err(SourceIdError::UnsupportedUrl(trimmed.to_string()));
    };

    validate_source_id(segment, trimmed)
}

/// Return the text that follows `marker`, matched case-insensitively.
fn after_marker<'a>(url: &'a str, lowered: &str, marker: &str) -> Option<&'a str> {
    lowered.find(marker).map(|pos| &url[pos + marker.len()..])
}

/// Extract the `v` parameter from a watch URL's query string.
fn extract_from_watch_query(url: &str) -> Option<&str> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("v="))
}

/// Take the identifier from the head of `segment` and validate it.
fn validate_source_id(segment: &str, url: &str) -> SourceIdResult<String> {
    let end = segment
        .find(|c: char| !is_id_char(c))
        .unwrap_or(segment.len());
    let id = &segment[..end];

    if id.len() != SOURCE_ID_LEN {
        return Err(SourceIdError::MalformedId(url.to_string()));
    }

    Ok(id.to_string())
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_source_id_recognized_shapes() {
        assert_eq!(
            extract_source_id("https://www.youtube.com/watch?v=abcdefghijk").unwrap(),
            "abcdefghijk"
        );
        assert_eq!(
            extract_source_id("https://youtu.be/abcdefghijk").unwrap(),
            "abcdefghijk"
        );
        assert_eq!(
            extract_source_id("https://youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_source_id("https://youtube.com/v/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_extract_source_id_ignores_trailing_parts() {
        assert_eq!(
            extract_source_id("https://youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmRdnEQy4qtr")
                .unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_source_id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_source_id("https://youtu.be/dQw4w9WgXcQ?t=30").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_source_id("  https://YOUTUBE.COM/watch?v=A_b-C_d-E_f  ").unwrap(),
            "A_b-C_d-E_f"
        );
    }

    #[test]
    fn test_extract_source_id_rejects_unknown_urls() {
        assert!(matches!(
            extract_source_id("https://example.com/watch?v=abcdefghijk"),
            Err(SourceIdError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            extract_source_id("https://youtube.com/shorts/abcdefghijk"),
            Err(SourceIdError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            extract_source_id(""),
            Err(SourceIdError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            extract_source_id("https://youtube.com/watch?list=abc"),
            Err(SourceIdError::UnsupportedUrl(_))
        ));
    }

    #[test]
    fn test_extract_source_id_rejects_malformed_ids() {
        assert!(matches!(
            extract_source_id("https://youtube.com/watch?v=abc123"),
            Err(SourceIdError::MalformedId(_))
        ));
        assert!(matches!(
            extract_source_id("https://youtu.be/abc123def456789"),
            Err(SourceIdError::MalformedId(_))
        ));
        assert!(matches!(
            extract_source_id("https://youtu.be/"),
            Err(SourceIdError::MalformedId(_))
        ));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(5.999), 6.0);
        assert_eq!(round2(4.0), 4.0);
    }
}
