use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    domain::TranslationResult,
    ports::{ProviderClient, ProviderRequest},
    translation::{catalog::BING_LANGUAGES, missing_field, Translator},
    Result,
};

const ENGINE: &str = "bing";

/// `[{"detectedLanguage":{"language":..},"translations":[{"text":..}]}]`,
/// or the bare object.
pub(crate) fn parse_payload(target_language: &str, payload: &Value) -> Result<TranslationResult> {
    let entry = match payload {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(payload),
        _ => None,
    }
    .ok_or_else(|| missing_field(ENGINE, "translation entry"))?;

    let translated = entry
        .pointer("/translations/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| missing_field(ENGINE, "translation text"))?;
    let detected = entry
        .pointer("/detectedLanguage/language")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(TranslationResult::new(target_language, detected, translated))
}

pub struct BingTranslator {
    provider: Arc<dyn ProviderClient>,
}

impl BingTranslator {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }
}

impl Translator for BingTranslator {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        BING_LANGUAGES
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
            "bing [{target_language}] detected={:?}",
            result.detected_language
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn reads_array_and_bare_object_forms() {
        let array = json!([{
            "detectedLanguage": {"language": "ja", "score": 1.0},
            "translations": [{"text": "hello", "to": "en"}]
        }]);
        let result = parse_payload("en", &array).unwrap();
        assert_eq!(result.translated_text, "hello");
        assert_eq!(result.detected_language, "ja");

        let object = json!({"translations": [{"text": "hola"}]});
        let result = parse_payload("es", &object).unwrap();
        assert_eq!(result.translated_text, "hola");
        assert_eq!(result.detected_language, "");
    }

    #[test]
    fn missing_text_is_a_backend_error() {
        for payload in [json!([]), json!("hola"), json!([{"translations": []}])] {
            assert!(matches!(
                parse_payload("es", &payload),
                Err(Error::Backend(_))
            ));
        }
    }
}
