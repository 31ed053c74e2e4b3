use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    domain::TranslationResult,
    ports::{ProviderClient, ProviderRequest},
    translation::{catalog::GOOGLE_LANGUAGES, missing_field, Translator},
    Result,
};

const ENGINE: &str = "google";

/// `translate_a/single` array form: `[[["hola","hello",..],..], null, "en", ..]`.
pub(crate) fn parse_payload(target_language: &str, payload: &Value) -> Result<TranslationResult> {
    let sentences = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| missing_field(ENGINE, "sentence list"))?;

    let translated: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    let detected = payload.get(2).and_then(Value::as_str).unwrap_or_default();

    Ok(TranslationResult::new(target_language, detected, translated))
}

pub struct GoogleTranslator {
    provider: Arc<dyn ProviderClient>,
}

impl GoogleTranslator {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }
}

impl Translator for GoogleTranslator {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        GOOGLE_LANGUAGES
    }

    fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult> {
        let payload = self.provider.fetch(&ProviderRequest {
            engine: ENGINE,
            text,
            target_language,
            detailed: true,
        })?;
        let result = parse_payload(target_language, &payload)?;
        debug!(
            "google [{target_language}] detected={:?}",
            result.detected_language
        );
        Ok(result)
    }
}
