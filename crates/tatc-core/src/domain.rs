use serde::{Deserialize, Serialize};

/// Pseudo-language reported for text that looks like morse code.
pub const MORSE_CODE_LANGUAGE_ID: &str = "morse_code";

/// Pseudo-target requesting a morse decode instead of a translation.
pub const DECODED_MORSE_LANGUAGE_ID: &str = "decoded_morse";

/// Engine name of the table-driven morse decoder.
pub const MORSE_CODE_ENGINE: &str = "morse_code_engine";

/// Languages whose script is CJK (used to pick the training script filter).
pub const CJK_LANGUAGES: &[&str] = &["ja", "zh", "zh-cn", "zh-tw"];

pub fn is_cjk_language(language_id: &str) -> bool {
    CJK_LANGUAGES.contains(&language_id)
}

/// Ids that label morse handling rather than a natural language. They are
/// never trained into a model.
pub fn is_pseudo_language(language_id: &str) -> bool {
    language_id == MORSE_CODE_LANGUAGE_ID || language_id == DECODED_MORSE_LANGUAGE_ID
}

/// Channel name (lower-cased, without `#`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelName(pub String);

impl ChannelName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().trim_start_matches('#').to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound chat event as delivered by the chat connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: ChannelName,
    pub author: String,
    pub text: String,
    /// Raw emote metadata tag (`id:start-end,start-end/id:start-end`).
    #[serde(default)]
    pub emotes: String,
}

/// One persisted (language, word, weight) row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordWeight {
    pub language_id: String,
    pub word: String,
    pub weight: u32,
}

/// Aggregated store match for one language.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub language_id: String,
    pub matched_word_count: u32,
    pub summed_weight: u64,
    pub sample_size: usize,
}

impl DetectionResult {
    pub fn score(&self) -> f64 {
        if self.sample_size == 0 {
            return 0.0;
        }
        self.summed_weight as f64 / self.sample_size as f64
    }
}

impl std::fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[language_id=\"{}\" count=\"{}\" score=\"{}\"]",
            self.language_id,
            self.matched_word_count,
            self.score()
        )
    }
}

/// A translation of one text into one target language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationResult {
    pub expected_language: String,
    /// Source language reported by the backend; empty when unknown.
    pub detected_language: String,
    pub translated_text: String,
}

impl TranslationResult {
    pub fn new(
        expected_language: impl Into<String>,
        detected_language: &str,
        translated_text: impl Into<String>,
    ) -> Self {
        Self {
            expected_language: expected_language.into(),
            detected_language: detected_language.trim().to_lowercase(),
            translated_text: translated_text.into(),
        }
    }

    pub fn has_detected_language(&self) -> bool {
        !self.detected_language.is_empty()
    }
}

/// An emote span inside a chat message, in character offsets.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Emote {
    pub id: String,
    pub start: usize,
    /// Exclusive.
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_language_is_normalized() {
        let r = TranslationResult::new("es", "  EN ", "hola");
        assert_eq!(r.detected_language, "en");
        assert!(r.has_detected_language());
        assert!(!TranslationResult::new("es", "", "hola").has_detected_language());
    }

    #[test]
    fn score_divides_by_sample_size() {
        let r = DetectionResult {
            language_id: "en".to_string(),
            matched_word_count: 2,
            summed_weight: 3,
            sample_size: 4,
        };
        assert_eq!(r.score(), 0.75);
    }

    #[test]
    fn morse_ids_are_pseudo_languages() {
        assert!(is_pseudo_language(MORSE_CODE_LANGUAGE_ID));
        assert!(is_pseudo_language(DECODED_MORSE_LANGUAGE_ID));
        assert!(!is_pseudo_language("en"));
        assert!(!is_pseudo_language(""));
    }

    #[test]
    fn channel_names_are_normalized() {
        assert_eq!(ChannelName::new(" #SomeChannel").as_str(), "somechannel");
    }
}
