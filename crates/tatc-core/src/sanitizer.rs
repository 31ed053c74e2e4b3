//! Chat text sanitization.
//!
//! Runs before language detection: emotes, URIs, emoji and mentions carry no
//! language signal and only confuse the classifier.

use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

use crate::domain::Emote;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SanitizeOptions {
    pub strip_emoji: bool,
    pub strip_username: bool,
}

fn uri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[a-z]+://\S+").expect("valid regex"))
}

fn emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            // Keycaps first, so the base digit goes with its combining mark.
            r"[0-9#*]\x{FE0F}?\x{20E3}|[\p{Extended_Pictographic}\p{Emoji_Modifier}\p{Regional_Indicator}\x{200D}\x{FE0F}\x{20E3}]",
        )
        .expect("valid regex")
    })
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Chat usernames may contain non-latin characters.
    RE.get_or_init(|| Regex::new(r"@\S{4,25}").expect("valid regex"))
}

/// Parse the raw emote metadata tag (`id:0-4,12-16/id2:6-10`).
///
/// Tag ranges are inclusive; the returned emotes use an exclusive end. The
/// result is deduplicated by `(start, end)` and sorted by `start`. Malformed
/// segments are skipped.
pub fn parse_emotes(tag: &str) -> Vec<Emote> {
    let mut seen = HashSet::new();
    let mut emotes = Vec::new();

    for segment in tag.split('/') {
        let Some((id, ranges)) = segment.split_once(':') else {
            continue;
        };
        for range in ranges.split(',') {
            let Some((start, end)) = range.trim().split_once('-') else {
                continue;
            };
            let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
            else {
                continue;
            };
            if end < start || !seen.insert((start, end)) {
                continue;
            }
            emotes.push(Emote {
                id: id.trim().to_string(),
                start,
                end: end + 1,
            });
        }
    }

    emotes.sort_by_key(|e| e.start);
    emotes
}

/// Remove every occurrence of each emote's literal text.
///
/// Removal is by value rather than by position: the same emote may recur and
/// offsets reported by the chat network can drift.
pub fn strip_emotes(text: &str, emotes: &[Emote]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut terms: Vec<String> = Vec::new();
    for emote in emotes {
        if emote.start >= emote.end || emote.end > chars.len() {
            continue;
        }
        let term: String = chars[emote.start..emote.end].iter().collect();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }

    let mut out = text.to_string();
    for term in &terms {
        out = out.replace(term.as_str(), "");
    }
    out
}

pub fn strip_uris(text: &str) -> String {
    uri_re().replace_all(text, "").into_owned()
}

pub fn strip_emoji(text: &str) -> String {
    emoji_re().replace_all(text, "").into_owned()
}

pub fn strip_usernames(text: &str) -> String {
    username_re().replace_all(text, "").into_owned()
}

/// Full sanitization pass. Only leading/trailing whitespace is trimmed; gaps
/// left behind by removals are kept as-is.
pub fn sanitize(text: &str, emotes: &[Emote], opts: SanitizeOptions) -> String {
    let mut out = strip_emotes(text, emotes);
    out = strip_uris(&out);
    if opts.strip_emoji {
        out = strip_emoji(&out);
    }
    if opts.strip_username {
        out = strip_usernames(&out);
    }
    out.trim().to_string()
}
