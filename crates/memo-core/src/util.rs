//! Shared utility functions used across multiple modules.

/// Current Unix timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether two millisecond timestamps are strictly closer than `window_ms`.
pub const fn within_window(a: i64, b: i64, window_ms: i64) -> bool {
    a.abs_diff(b) < window_ms.unsigned_abs()
}

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_window_is_exclusive() {
        assert!(within_window(0, 4_999, 5_000));
        assert!(!within_window(0, 5_000, 5_000));
        assert!(within_window(10_000, 5_001, 5_000));
        assert!(!within_window(10_000, 4_999, 5_000));
    }

    #[test]
    fn within_window_handles_extremes() {
        assert!(!within_window(i64::MIN, i64::MAX, 1_000));
    }

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" blue ".to_string())),
            Some("blue".to_string())
        );
    }
}
