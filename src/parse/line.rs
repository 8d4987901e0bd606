//! Line splitting for the `key: value` status format.

/// Splits one status line into a key and a value around the first colon.
///
/// Both sides are whitespace-trimmed. A line without a colon yields the
/// whole (trimmed) text as the key and an empty value; an empty line
/// yields two empty strings. This function never fails, so banner lines
/// and section headers fall through as unrecognized keys.
pub fn split_field(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_pair() {
        assert_eq!(split_field("Total Accesses: 131"), ("Total Accesses", "131"));
    }

    #[test]
    fn test_value_keeps_later_colons() {
        assert_eq!(
            split_field("ProxyBalancer[0]Name: balancer://myproxy1"),
            ("ProxyBalancer[0]Name", "balancer://myproxy1")
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(split_field(""), ("", ""));
    }

    #[test]
    fn test_no_colon_is_key_only() {
        assert_eq!(split_field("localhost"), ("localhost", ""));
        assert_eq!(split_field("TLSSessionCacheStatus"), ("TLSSessionCacheStatus", ""));
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(split_field("  CPUUser :  .25  "), ("CPUUser", ".25"));
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(split_field("Scoreboard:"), ("Scoreboard", ""));
    }

    proptest! {
        // Joining a key and value with ": " and splitting again is lossless
        // for any key without a colon.
        #[test]
        fn prop_join_split_round_trip(
            key in "[A-Za-z][A-Za-z0-9 \\[\\]]{0,30}",
            value in "[ -~]{0,40}",
        ) {
            let key = key.trim();
            let value = value.trim();
            let line = format!("{}: {}", key, value);
            prop_assert_eq!(split_field(&line), (key, value));
        }
    }
}
