//! Language detection models.
//!
//! All models share the [`DetectionModel`] contract; the [`crate::registry::Registry`]
//! picks one by [`ModelKind`] and memoizes it.

pub mod morse;
pub mod naive_bayes;
pub mod static_model;

use std::{fmt, str::FromStr};

use crate::errors::Error;

pub use morse::MorseHeuristicModel;
pub use naive_bayes::NaiveBayesModel;
pub use static_model::StaticModel;

/// One candidate language with a score in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageScore {
    pub language_id: String,
    pub score: f64,
}

impl LanguageScore {
    pub fn new(language_id: impl Into<String>, score: f64) -> Self {
        Self {
            language_id: language_id.into(),
            score,
        }
    }
}

pub trait DetectionModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate languages, best first. Empty means "unknown".
    fn detect(&self, text: &str) -> Vec<LanguageScore>;

    /// Learn that `text` is written in `expected_language`. May be a no-op.
    /// Never fails: problems are logged.
    fn train(&self, text: &str, expected_language: &str);
}

/// Configuration string selecting a detection model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// Frequency-store classifier, used when the engine reports source languages.
    Adaptive,
    /// Frequency-store classifier regardless of the engine.
    AdaptiveForced,
    /// Static detector with every language loaded.
    Legacy,
    /// Static detector that grows its language set on training.
    LegacyLazy,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::AdaptiveForced => "adaptive-forced",
            Self::Legacy => "legacy",
            Self::LegacyLazy => "legacy-lazy",
        }
    }

    /// Without a backend that reports source languages the adaptive model
    /// never receives training signal, so it falls back to the static detector
    /// unless explicitly forced.
    pub fn effective_for(self, default_engine: &str) -> Self {
        if self == Self::AdaptiveForced {
            return self;
        }
        if matches!(default_engine, "google" | "bing") {
            self
        } else {
            Self::Legacy
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adaptive" => Ok(Self::Adaptive),
            "adaptive-forced" => Ok(Self::AdaptiveForced),
            "legacy" => Ok(Self::Legacy),
            "legacy-lazy" => Ok(Self::LegacyLazy),
            other => Err(Error::Validation(format!(
                "unknown language detection model: {other:?}"
            ))),
        }
    }
}
