use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::{
    detection::{DetectionModel, LanguageScore},
    domain::MORSE_CODE_LANGUAGE_ID,
};

fn morse_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only dots, dashes, whitespace and word slashes, with at least one symbol.
    RE.get_or_init(|| Regex::new(r"^[\s/]*[.\-・][.\-・\s/]*$").expect("valid regex"))
}

pub fn looks_like_morse(text: &str) -> bool {
    morse_re().is_match(text)
}

/// Decorator that reports [`MORSE_CODE_LANGUAGE_ID`] for morse-looking text
/// and delegates everything else.
pub struct MorseHeuristicModel {
    inner: Arc<dyn DetectionModel>,
}

impl MorseHeuristicModel {
    pub fn new(inner: Arc<dyn DetectionModel>) -> Self {
        Self { inner }
    }
}

impl DetectionModel for MorseHeuristicModel {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn detect(&self, text: &str) -> Vec<LanguageScore> {
        if looks_like_morse(text) {
            return vec![LanguageScore::new(MORSE_CODE_LANGUAGE_ID, 1.0)];
        }
        self.inner.detect(text)
    }

    fn train(&self, text: &str, expected_language: &str) {
        self.inner.train(text, expected_language);
    }
}
