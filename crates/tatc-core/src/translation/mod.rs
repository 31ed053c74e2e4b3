//! Translation backends.
//!
//! Every backend turns `(text, targets)` into a lazy, target-ordered stream of
//! per-target results. Provider I/O goes through [`crate::ports::ProviderClient`];
//! the backends here only build requests and interpret payloads.

mod bing;
pub mod catalog;
mod generic;
mod google;
pub mod morse;

use std::fmt;

use crate::{domain::TranslationResult, Error, Result};

pub use bing::BingTranslator;
pub use catalog::SUPPORTED_ENGINES;
pub use generic::GenericTranslator;
pub use google::GoogleTranslator;
pub use morse::{MorseCodeTranslator, MorseDecorator, MorseTable};

/// Lazy per-target result stream. Nothing is fetched until it is polled.
pub type TranslationStream<'a> = Box<dyn Iterator<Item = Result<TranslationResult>> + Send + 'a>;

pub trait Translator: Send + Sync {
    fn engine(&self) -> &str;

    fn supported_languages(&self) -> &'static [&'static str];

    fn supported_engines(&self) -> &'static [&'static str] {
        SUPPORTED_ENGINES
    }

    fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult>;

    /// One result per target, in target order. A failing target yields an
    /// `Err` item and the remaining targets are still attempted.
    fn translate<'a>(&'a self, text: &'a str, targets: Vec<String>) -> TranslationStream<'a> {
        Box::new(
            targets
                .into_iter()
                .map(move |target| self.translate_one(text, &target)),
        )
    }

    /// Requested ids that this backend knows, in catalog order and spelling.
    fn validate_languages(&self, requested: &[String]) -> Result<Vec<String>> {
        let wanted: Vec<String> = requested.iter().map(|l| l.trim().to_lowercase()).collect();
        let valid: Vec<String> = self
            .supported_languages()
            .iter()
            .filter(|l| wanted.iter().any(|w| w == &l.to_lowercase()))
            .map(|l| l.to_string())
            .collect();
        if valid.is_empty() {
            return Err(Error::Validation(format!(
                "no supported languages in {requested:?} for {}",
                self.engine()
            )));
        }
        Ok(valid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Google,
    Bing,
    MorseCode,
    Generic,
}

/// Registry key for a backend: normalized engine name plus the morse flag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EngineKey {
    engine: String,
    pub morse_code_support: bool,
}

impl EngineKey {
    pub fn new(engine: &str, morse_code_support: bool) -> Result<Self> {
        let engine = engine.trim().to_lowercase();
        if engine.is_empty() {
            return Err(Error::Validation("translation engine is blank".to_string()));
        }
        Ok(Self {
            engine,
            morse_code_support,
        })
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn kind(&self) -> EngineKind {
        match self.engine.as_str() {
            "google" => EngineKind::Google,
            "bing" => EngineKind::Bing,
            crate::domain::MORSE_CODE_ENGINE => EngineKind::MorseCode,
            _ => EngineKind::Generic,
        }
    }
}

impl fmt::Display for EngineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.morse_code_support {
            write!(f, "{}+morse", self.engine)
        } else {
            f.write_str(&self.engine)
        }
    }
}

fn missing_field(engine: &str, what: &str) -> Error {
    Error::Backend(format!("{engine} payload has no {what}"))
}
