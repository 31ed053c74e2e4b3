use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::TranslationResult,
    ports::{ProviderClient, ProviderRequest},
    translation::{catalog::GENERIC_LANGUAGES, missing_field, Translator},
    Result,
};

/// Pass-through backend for any engine without a dedicated parser. It never
/// reports a detected language.
pub struct GenericTranslator {
    engine: String,
    provider: Arc<dyn ProviderClient>,
}

impl GenericTranslator {
    pub fn new(engine: impl Into<String>, provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            engine: engine.into(),
            provider,
        }
    }
}

pub(crate) fn parse_payload(
    engine: &str,
    target_language: &str,
    payload: &Value,
) -> Result<TranslationResult> {
    let translated = payload
        .as_str()
        .or_else(|| payload.get("translatedText").and_then(Value::as_str))
        .ok_or_else(|| missing_field(engine, "translatedText"))?;
    Ok(TranslationResult::new(target_language, "", translated))
}

impl Translator for GenericTranslator {
    fn engine(&self) -> &str {
        &self.engine
    }

    fn supported_languages(&self) -> &'static [&'static str] {
        GENERIC_LANGUAGES
    }

    fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult> {
        let payload = self.provider.fetch(&ProviderRequest {
            engine: &self.engine,
            text,
            target_language,
            detailed: false,
        })?;
        parse_payload(&self.engine, target_language, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{translation::tests::FakeProvider, Error};
    use serde_json::json;

    #[test]
    fn accepts_object_or_bare_string() {
        let r = parse_payload("libretranslate", "es", &json!({"translatedText": "hola"})).unwrap();
        assert_eq!(r.translated_text, "hola");
        assert!(!r.has_detected_language());

        let r = parse_payload("libretranslate", "es", &json!("hola")).unwrap();
        assert_eq!(r.translated_text, "hola");

        assert!(matches!(
            parse_payload("libretranslate", "es", &json!({"error": "nope"})),
            Err(Error::Backend(_))
        ));
    }

    #[test]
    fn failing_target_does_not_stop_the_rest() {
        let provider = Arc::new(FakeProvider::new(|req| {
            if req.target_language == "fr" {
                Err(Error::Backend("provider down".into()))
            } else {
                Ok(json!(format!("{}:{}", req.target_language, req.text)))
            }
        }));
        let t = GenericTranslator::new("deepl", provider.clone());

        let results: Vec<_> = t
            .translate("hi", vec!["es".into(), "fr".into(), "de".into()])
            .collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().translated_text, "es:hi");
        assert!(matches!(results[1], Err(Error::Backend(_))));
        assert_eq!(results[2].as_ref().unwrap().translated_text, "de:hi");

        let calls = provider.calls.lock().unwrap();
        assert!(calls.iter().all(|(engine, _, _, detailed)| engine == "deepl" && !detailed));
    }

    #[test]
    fn stream_is_lazy() {
        let provider = Arc::new(FakeProvider::new(|_| Ok(json!("x"))));
        let t = GenericTranslator::new("deepl", provider.clone());
        let mut stream = t.translate("hi", vec!["es".into(), "fr".into()]);
        assert_eq!(provider.call_count(), 0);
        stream.next();
        assert_eq!(provider.call_count(), 1);
    }
}
