//! Small helpers shared by storage, sync, and the gist client.

/// Longest remote error text kept on a mapping row or in the sync log
pub const MAX_ERROR_MESSAGE_CHARS: usize = 180;

/// Trimmed `value`, or `None` when only whitespace is left
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Whether `value` is an absolute HTTP(S) URL
pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Fold a remote error body onto one line and clip it for storage
pub fn clip_error_message(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_ERROR_MESSAGE_CHARS)
        .collect()
}

/// Unix time in milliseconds, the unit of every stored timestamp
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_or_rejects() {
        assert_eq!(non_blank("  ghp_token \n"), Some("ghp_token"));
        assert_eq!(non_blank(" \t "), None);
    }

    #[test]
    fn http_url_requires_scheme() {
        assert!(is_http_url("http://127.0.0.1:9000"));
        assert!(is_http_url("https://api.github.com"));
        assert!(!is_http_url("git@github.com:octocat/gist.git"));
        assert!(!is_http_url("api.github.com"));
    }

    #[test]
    fn error_messages_fit_on_one_line() {
        assert_eq!(
            clip_error_message("  Validation Failed\n  files are required "),
            "Validation Failed files are required"
        );
        let long = "x".repeat(500);
        assert_eq!(clip_error_message(&long).len(), MAX_ERROR_MESSAGE_CHARS);
    }
}
