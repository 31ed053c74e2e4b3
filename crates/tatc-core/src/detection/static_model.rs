use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex, OnceLock, RwLock},
};

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use tracing::{info, warn};

use crate::detection::{DetectionModel, LanguageScore};

/// Initial language set of the lazy-subset variant.
pub const LAZY_DEFAULT_LANGUAGES: &[&str] = &["en", "ja", "zh"];

/// ISO 639-1 code → lingua language, for every language lingua knows.
fn languages_by_code() -> &'static BTreeMap<String, Language> {
    static MAP: OnceLock<BTreeMap<String, Language>> = OnceLock::new();
    MAP.get_or_init(|| {
        Language::all()
            .into_iter()
            .map(|l| (l.iso_code_639_1().to_string().to_lowercase(), l))
            .collect()
    })
}

pub fn language_for_code(code: &str) -> Option<Language> {
    languages_by_code()
        .get(&code.trim().to_lowercase())
        .copied()
}

fn code_of(language: Language) -> String {
    language.iso_code_639_1().to_string().to_lowercase()
}

#[derive(Debug)]
enum LanguageSet {
    All,
    Subset(HashSet<Language>),
}

impl LanguageSet {
    fn build(&self) -> LanguageDetector {
        match self {
            LanguageSet::Subset(langs) if langs.len() >= 2 => {
                let langs: Vec<Language> = langs.iter().copied().collect();
                LanguageDetectorBuilder::from_languages(&langs).build()
            }
            _ => LanguageDetectorBuilder::from_all_languages().build(),
        }
    }

    fn describe(&self) -> String {
        match self {
            LanguageSet::All => "all".to_string(),
            LanguageSet::Subset(langs) => {
                let mut codes: Vec<String> = langs.iter().map(|l| code_of(*l)).collect();
                codes.sort();
                codes.join(", ")
            }
        }
    }
}

/// Wrapper over a fixed statistical detector.
///
/// The detector is built on first use. The lazy-subset variant starts small
/// and rebuilds itself when trained on a language it has not loaded yet;
/// readers keep using their snapshot while the replacement is built.
pub struct StaticModel {
    /// Guards (re)loading; holding it serializes builders.
    languages: Mutex<LanguageSet>,
    current: RwLock<Option<Arc<LanguageDetector>>>,
}

impl StaticModel {
    /// Every supported language, loaded once.
    pub fn all_languages() -> Self {
        Self {
            languages: Mutex::new(LanguageSet::All),
            current: RwLock::new(None),
        }
    }

    /// Start with `codes` and grow on training. Unknown codes are ignored.
    pub fn lazy(codes: &[&str]) -> Self {
        let langs: HashSet<Language> = codes.iter().filter_map(|c| language_for_code(c)).collect();
        Self {
            languages: Mutex::new(LanguageSet::Subset(langs)),
            current: RwLock::new(None),
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(
            *self.languages.lock().unwrap_or_else(|e| e.into_inner()),
            LanguageSet::Subset(_)
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Codes currently loaded by the lazy-subset variant (`None` for all).
    pub fn loaded_languages(&self) -> Option<Vec<String>> {
        let guard = self.languages.lock().unwrap_or_else(|e| e.into_inner());
        match &*guard {
            LanguageSet::All => None,
            LanguageSet::Subset(langs) => {
                let mut codes: Vec<String> = langs.iter().map(|l| code_of(*l)).collect();
                codes.sort();
                Some(codes)
            }
        }
    }

    fn snapshot(&self) -> Option<Arc<LanguageDetector>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn detector(&self) -> Arc<LanguageDetector> {
        if let Some(d) = self.snapshot() {
            return d;
        }

        let guard = self.languages.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have finished loading while we waited.
        if let Some(d) = self.snapshot() {
            return d;
        }
        info!("loading language models: [{}]", guard.describe());
        let detector = Arc::new(guard.build());
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(detector.clone());
        detector
    }
}

impl DetectionModel for StaticModel {
    fn name(&self) -> &'static str {
        if self.is_lazy() {
            "static-lazy"
        } else {
            "static"
        }
    }

    fn detect(&self, text: &str) -> Vec<LanguageScore> {
        match self.detector().detect_language_of(text) {
            Some(language) => vec![LanguageScore::new(code_of(language), 1.0)],
            None => Vec::new(),
        }
    }

    fn train(&self, _text: &str, expected_language: &str) {
        let mut guard = self.languages.lock().unwrap_or_else(|e| e.into_inner());
        let LanguageSet::Subset(langs) = &mut *guard else {
            return;
        };
        let Some(language) = language_for_code(expected_language) else {
            warn!("no language model for {expected_language:?}");
            return;
        };
        if !langs.insert(language) {
            return;
        }

        let replacement = Arc::new(guard.build());
        let previous = self
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(replacement);
        if let Some(previous) = previous {
            info!("unloading language models");
            previous.unload_language_models();
        }
        info!("reloaded language models: [{}]", guard.describe());
    }
}
