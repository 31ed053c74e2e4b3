//! Process-wide memo of detection models and translation backends.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::info;

use crate::{
    detection::{
        static_model::LAZY_DEFAULT_LANGUAGES, DetectionModel, ModelKind, MorseHeuristicModel,
        NaiveBayesModel, StaticModel,
    },
    ports::ProviderClient,
    store::FrequencyStore,
    translation::{
        BingTranslator, EngineKey, EngineKind, GenericTranslator, GoogleTranslator,
        MorseCodeTranslator, MorseDecorator, MorseTable, Translator,
    },
    Result,
};

/// Builds each model/backend at most once per configuration key and hands
/// out shared instances afterwards.
pub struct Registry {
    store: Arc<FrequencyStore>,
    provider: Arc<dyn ProviderClient>,
    morse_table: Arc<MorseTable>,
    models: Mutex<HashMap<(ModelKind, bool), Arc<dyn DetectionModel>>>,
    translators: Mutex<HashMap<EngineKey, Arc<dyn Translator>>>,
}

impl Registry {
    pub fn new(
        store: Arc<FrequencyStore>,
        provider: Arc<dyn ProviderClient>,
        morse_table: Arc<MorseTable>,
    ) -> Self {
        Self {
            store,
            provider,
            morse_table,
            models: Mutex::new(HashMap::new()),
            translators: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<FrequencyStore> {
        &self.store
    }

    pub fn model(&self, kind: ModelKind, morse_code_support: bool) -> Arc<dyn DetectionModel> {
        let mut models = self.models.lock().unwrap_or_else(|e| e.into_inner());
        models
            .entry((kind, morse_code_support))
            .or_insert_with(|| {
                info!("creating detection model {kind} (morse={morse_code_support})");
                self.build_model(kind, morse_code_support)
            })
            .clone()
    }

    pub fn translator(&self, engine: &str, morse_code_support: bool) -> Result<Arc<dyn Translator>> {
        let key = EngineKey::new(engine, morse_code_support)?;
        let mut translators = self.translators.lock().unwrap_or_else(|e| e.into_inner());
        let translator = translators
            .entry(key)
            .or_insert_with_key(|key| {
                info!("creating translation backend {key}");
                self.build_translator(key)
            })
            .clone();
        Ok(translator)
    }

    fn build_model(&self, kind: ModelKind, morse_code_support: bool) -> Arc<dyn DetectionModel> {
        let base: Arc<dyn DetectionModel> = match kind {
            ModelKind::Adaptive | ModelKind::AdaptiveForced => {
                Arc::new(NaiveBayesModel::new(self.store.clone()))
            }
            ModelKind::Legacy => Arc::new(StaticModel::all_languages()),
            ModelKind::LegacyLazy => Arc::new(StaticModel::lazy(LAZY_DEFAULT_LANGUAGES)),
        };
        if morse_code_support {
            Arc::new(MorseHeuristicModel::new(base))
        } else {
            base
        }
    }

    fn build_translator(&self, key: &EngineKey) -> Arc<dyn Translator> {
        let base: Arc<dyn Translator> = match key.kind() {
            EngineKind::Google => Arc::new(GoogleTranslator::new(self.provider.clone())),
            EngineKind::Bing => Arc::new(BingTranslator::new(self.provider.clone())),
            EngineKind::MorseCode => {
                return Arc::new(MorseCodeTranslator::new(self.morse_table.clone()));
            }
            EngineKind::Generic => {
                Arc::new(GenericTranslator::new(key.engine(), self.provider.clone()))
            }
        };
        if key.morse_code_support {
            Arc::new(MorseDecorator::new(base, self.morse_table.clone()))
        } else {
            base
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{store::tests::tmp, translation::tests::FakeProvider, Error};
    use serde_json::Value;

    pub(crate) fn registry_with(provider: Arc<dyn ProviderClient>) -> Registry {
        let dir = tmp("tatc-registry");
        Registry::new(
            Arc::new(FrequencyStore::new(dir.join("models.db"))),
            provider,
            Arc::new(MorseTable::builtin()),
        )
    }

    fn registry() -> Registry {
        registry_with(Arc::new(FakeProvider::new(|_| Ok(Value::Null))))
    }

    #[test]
    fn models_are_memoized_per_key() {
        let r = registry();
        let a = r.model(ModelKind::Adaptive, false);
        let b = r.model(ModelKind::Adaptive, false);
        let c = r.model(ModelKind::Adaptive, true);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.name(), "naive-bayes");
        assert_eq!(r.model(ModelKind::LegacyLazy, false).name(), "static-lazy");
    }

    #[test]
    fn translators_are_memoized_per_key() {
        let r = registry();
        let a = r.translator("google", false).unwrap();
        let b = r.translator(" GOOGLE ", false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let decorated = r.translator("google", true).unwrap();
        assert!(!Arc::ptr_eq(&a, &decorated));
        assert_eq!(decorated.engine(), "google");

        assert_eq!(r.translator("bing", false).unwrap().engine(), "bing");
        assert_eq!(r.translator("deepl", false).unwrap().engine(), "deepl");
        assert_eq!(
            r.translator("morse_code_engine", true).unwrap().engine(),
            "morse_code_engine"
        );
    }

    #[test]
    fn blank_engine_is_rejected() {
        let r = registry();
        assert!(matches!(r.translator("", false), Err(Error::Validation(_))));
    }

    #[test]
    fn concurrent_lookups_share_one_instance() {
        let r = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = r.clone();
                std::thread::spawn(move || r.translator("bing", true).unwrap())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(instances.iter().all(|t| Arc::ptr_eq(t, &instances[0])));
    }
}
