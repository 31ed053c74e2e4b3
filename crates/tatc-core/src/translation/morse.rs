use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, OnceLock},
};

use regex::Regex;
use tracing::{info, warn};

use crate::{
    domain::{TranslationResult, DECODED_MORSE_LANGUAGE_ID, MORSE_CODE_ENGINE, MORSE_CODE_LANGUAGE_ID},
    translation::{catalog::MORSE_LANGUAGES, TranslationStream, Translator},
    Result,
};

const BUILTIN_TABLE: &str = include_str!("../../resources/morse_code.json");

fn word_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*/\s*|\s{2,}").expect("valid regex"))
}

/// Morse symbol → decoded character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MorseTable {
    codes: HashMap<String, String>,
}

impl MorseTable {
    pub fn from_json(raw: &str) -> Result<Self> {
        let codes: HashMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self { codes })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table = Self::from_json(&raw)?;
        info!("loaded {} morse symbols from {}", table.len(), path.display());
        Ok(table)
    }

    /// `path` when it exists, otherwise the table bundled with the crate.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        warn!("{} not found, using the bundled morse table", path.display());
        Ok(Self::builtin())
    }

    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_TABLE).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Words are split on `/` or runs of two or more spaces, symbols on
    /// whitespace. Unknown symbols decode to nothing.
    pub fn decode(&self, text: &str) -> String {
        let normalized = text.replace('・', ".");
        word_separator_re()
            .split(normalized.trim())
            .map(|word| {
                word.split_whitespace()
                    .filter_map(|symbol| self.codes.get(symbol).map(String::as_str))
                    .collect::<String>()
            })
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decodes morse without calling any provider.
pub struct MorseCodeTranslator {
    table: Arc<MorseTable>,
}

impl MorseCodeTranslator {
    pub fn new(table: Arc<MorseTable>) -> Self {
        Self { table }
    }
}

impl Translator for MorseCodeTranslator {
    fn engine(&self) -> &str {
        MORSE_CODE_ENGINE
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        MORSE_LANGUAGES
    }

    fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult> {
        Ok(TranslationResult::new(
            target_language,
            MORSE_CODE_LANGUAGE_ID,
            self.table.decode(text),
        ))
    }
}

/// Adds the `decoded_morse` pseudo-target to any backend. The decode is
/// emitted first, then the wrapped backend's results for the other targets.
pub struct MorseDecorator {
    decoder: MorseCodeTranslator,
    inner: Arc<dyn Translator>,
}

impl MorseDecorator {
    pub fn new(inner: Arc<dyn Translator>, table: Arc<MorseTable>) -> Self {
        Self {
            decoder: MorseCodeTranslator::new(table),
            inner,
        }
    }
}

impl Translator for MorseDecorator {
    fn engine(&self) -> &str {
        self.inner.engine()
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        self.inner.supported_languages()
    }

    fn supported_engines(&self) -> &'static [&'static str] {
        self.inner.supported_engines()
    }

    fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult> {
        if target_language == DECODED_MORSE_LANGUAGE_ID {
            return self.decoder.translate_one(text, target_language);
        }
        self.inner.translate_one(text, target_language)
    }

    fn translate<'a>(&'a self, text: &'a str, targets: Vec<String>) -> TranslationStream<'a> {
        let (morse, rest): (Vec<String>, Vec<String>) = targets
            .into_iter()
            .partition(|t| t == DECODED_MORSE_LANGUAGE_ID);

        let decoded = morse
            .into_iter()
            .take(1)
            .map(move |target| self.decoder.translate_one(text, &target));
        let remaining: TranslationStream<'a> = if rest.is_empty() {
            Box::new(std::iter::empty())
        } else {
            self.inner.translate(text, rest)
        };
        Box::new(decoded.chain(remaining))
    }
}
