/// Longest line a chat server accepts, in characters.
pub const MAX_CHAT_LINE_CHARS: usize = 500;

/// Cut `s` to at most `max_chars` characters, ending with `...` when cut.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out = s.chars().take(keep).collect::<String>();
    out.push_str("...");
    out
}
