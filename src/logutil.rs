//! Log helpers: chat text is user-controlled and often multi-line, so it is escaped to a
//! single bounded line before it reaches the log.

/// Longest preview of a chat line that goes into a log record.
pub const MAX_PREVIEW: usize = 160;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`, `\r` => `\\r`, `\t` => `\\t`, backslash => `\\\\`
/// - other control characters => `\xNN`
///
/// Output is cut after [MAX_PREVIEW] characters with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_summary_text() {
        let summary = "you have 1 new message\n[5s ago] alice: hi\n";
        assert_eq!(
            escape_log(summary),
            "you have 1 new message\\n[5s ago] alice: hi\\n"
        );
    }

    #[test]
    fn truncates_long_lines() {
        let long = "x".repeat(MAX_PREVIEW + 20);
        let esc = escape_log(&long);
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
        assert!(esc.ends_with('…'));
    }
}
