//! Room label rules shared by the server and the senders.

use alloc::format;
use alloc::string::String;

/// Prefix of labels synthesized when a requested label is already taken.
pub const PLACEHOLDER_PREFIX: &str = "dummy";

/// Placeholder label for the given sequence number, e.g. `dummy7`.
pub fn placeholder(sequence: i64) -> String {
    format!("{PLACEHOLDER_PREFIX}{sequence}")
}

/// Whether the label was synthesized by [`placeholder`].
pub fn is_placeholder(label: &str) -> bool {
    label
        .strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Trimmed label, or `None` when nothing usable is left.
pub fn normalize(label: &str) -> Option<&str> {
    let trimmed = label.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_format() {
        assert_eq!(placeholder(3), "dummy3");
        assert!(is_placeholder("dummy3"));
        assert!(!is_placeholder("dummy"));
        assert!(!is_placeholder("dummyRoom"));
        assert!(!is_placeholder("T4"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  T4教室 "), Some("T4教室"));
        assert_eq!(normalize("   "), None);
    }
}
