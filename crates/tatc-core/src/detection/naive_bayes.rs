use std::{
    collections::BTreeSet,
    sync::{Arc, OnceLock},
};

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::{
    detection::{DetectionModel, LanguageScore},
    domain::{is_cjk_language, DetectionResult},
    store::FrequencyStore,
};

const CJK: &str = r"\x{3040}-\x{30FF}\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}";

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"[{CJK}]|\w+")).expect("valid regex"))
}

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]+|\d+").expect("valid regex"))
}

fn cjk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("[{CJK}]")).expect("valid regex"))
}

fn non_cjk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("[^{CJK}]")).expect("valid regex"))
}

/// Split text into its vocabulary: single CJK code points and word runs,
/// lower-cased, without punctuation or digits, deduplicated.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.trim().to_lowercase();
    let cleaned = noise_re().replace_all(&lowered, "");
    token_re()
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keep only characters of the expected language's script family so training
/// on mixed-script text cannot teach e.g. kanji to an English model.
pub fn retain_script(text: &str, expected_language: &str) -> String {
    if is_cjk_language(expected_language) {
        non_cjk_re().replace_all(text, "").into_owned()
    } else {
        cjk_re().replace_all(text, "").into_owned()
    }
}

/// Bag-of-words classifier over the frequency store.
///
/// Scores are `summed_weight / token_count`. Results are kept while their score
/// does not drop below the best seen so far, so ties are all reported.
pub struct NaiveBayesModel {
    store: Arc<FrequencyStore>,
}

impl NaiveBayesModel {
    pub fn new(store: Arc<FrequencyStore>) -> Self {
        Self { store }
    }

    fn query(&self, words: &[String]) -> Vec<DetectionResult> {
        match self.store.query(words) {
            Ok(results) => results,
            Err(e) => {
                error!("frequency store query failed: {e}");
                Vec::new()
            }
        }
    }

    fn detect_words(&self, words: &[String]) -> Vec<LanguageScore> {
        let mut highest = f64::NEG_INFINITY;
        let mut out = Vec::new();
        for result in self.query(words) {
            debug!("detection result: {result}");
            let score = result.score();
            if score > 0.0 && highest <= score {
                highest = score;
                out.push(LanguageScore::new(result.language_id, score));
            }
        }
        out
    }

    /// Whether writing `words` under `expected_language` would add anything.
    fn needs_training(&self, words: &[String], expected_language: &str) -> bool {
        if expected_language.trim().is_empty() {
            warn!("(pre-training) expected language is blank");
            return false;
        }
        if words.is_empty() {
            warn!("(pre-training) no tokens left to train on");
            return false;
        }

        for result in self.query(words) {
            if result.language_id != expected_language {
                continue;
            }
            debug!("(pre-training) [word_count={}] {result}", words.len());
            return (result.matched_word_count as usize) < words.len();
        }
        debug!("(pre-training) {words:?} does not match {expected_language:?}");
        true
    }

    fn log_post_training(&self, words: &[String], expected_language: &str) {
        let detected: Vec<String> = self
            .query(words)
            .into_iter()
            .map(|r| {
                debug!("(post-training) {r}");
                r.language_id
            })
            .collect();

        if detected.iter().any(|l| l == expected_language) {
            info!("(post-training) language of text detected: {detected:?}");
        } else {
            warn!("(post-training) language of text not detected: {detected:?}");
        }
    }
}

impl DetectionModel for NaiveBayesModel {
    fn name(&self) -> &'static str {
        "naive-bayes"
    }

    fn detect(&self, text: &str) -> Vec<LanguageScore> {
        self.detect_words(&tokenize(text))
    }

    fn train(&self, text: &str, expected_language: &str) {
        let expected_language = expected_language.trim().to_lowercase();
        let words = tokenize(&retain_script(text, &expected_language));
        if !self.needs_training(&words, &expected_language) {
            return;
        }

        match self.store.insert_missing(&expected_language, &words) {
            Ok(n) => info!("trained {expected_language}: {n} new words"),
            Err(e) => error!("training {expected_language} failed: {e}"),
        }
        self.log_post_training(&words, &expected_language);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::seeded_store;

    fn model(prefix: &str, seeds: &[(&str, &str)]) -> NaiveBayesModel {
        NaiveBayesModel::new(Arc::new(seeded_store(prefix, seeds)))
    }

    #[test]
    fn tokenize_dedups_and_strips_noise() {
        assert_eq!(
            tokenize("  Hello, hello WORLD 42! "),
            vec!["hello".to_string(), "world".to_string()]
        );
        // CJK code points are tokens on their own.
        let tokens = tokenize("日本語です 日本");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.contains(&"日".to_string()));
        assert!(tokens.contains(&"す".to_string()));
    }

    #[test]
    fn retain_script_separates_cjk() {
        assert_eq!(retain_script("hello 日本", "en"), "hello ");
        assert_eq!(retain_script("hello 日本", "ja"), "日本");
    }

    #[test]
    fn single_language_scores_weight_over_token_count() {
        let m = model("tatc-nb-single", &[("en", "hello,4\nthere,2\n")]);
        let detected = m.detect("hello there friend");
        assert_eq!(detected, vec![LanguageScore::new("en", 2.0)]);

        let detected = m.detect("hello");
        assert_eq!(detected, vec![LanguageScore::new("en", 4.0)]);
    }

    #[test]
    fn running_max_keeps_ties_and_drops_lower_scores() {
        let m = model(
            "tatc-nb-ties",
            &[("en", "hello,1\n"), ("nl", "hello,1\n"), ("de", "hallo,1\n")],
        );
        let detected = m.detect("hello");
        let ids: Vec<&str> = detected.iter().map(|d| d.language_id.as_str()).collect();
        assert_eq!(ids, vec!["en", "nl"]);

        let detected = m.detect("hello hallo there");
        let ids: Vec<&str> = detected.iter().map(|d| d.language_id.as_str()).collect();
        assert_eq!(ids, vec!["de", "en", "nl"]);
    }

    #[test]
    fn unknown_words_detect_nothing() {
        let m = model("tatc-nb-unknown", &[("en", "hello,1\n")]);
        assert!(m.detect("zzz qqq").is_empty());
        assert!(m.detect("   ").is_empty());
    }

    #[test]
    fn training_teaches_new_words_once() {
        let m = model("tatc-nb-train", &[("en", "hello,3\n")]);
        assert!(m.detect("hola amigos").is_empty());

        m.train("Hola amigos", "ES");
        let once = m.detect("hola amigos");
        assert_eq!(once, vec![LanguageScore::new("es", 1.0)]);

        m.train("Hola amigos", "es");
        assert_eq!(m.detect("hola amigos"), once);
        assert_eq!(m.store.weight_of("es", "hola").unwrap(), Some(1));
    }

    #[test]
    fn training_never_changes_existing_weights() {
        let m = model("tatc-nb-weights", &[("en", "hello,3\n")]);
        m.train("hello world", "en");
        assert_eq!(m.store.weight_of("en", "hello").unwrap(), Some(3));
        assert_eq!(m.store.weight_of("en", "world").unwrap(), Some(1));
    }

    #[test]
    fn training_filters_foreign_script() {
        let m = model("tatc-nb-script", &[]);
        m.train("hello 日本", "en");
        assert_eq!(m.store.weight_of("en", "hello").unwrap(), Some(1));
        assert_eq!(m.store.weight_of("en", "日").unwrap(), None);

        m.train("hello 日本", "ja");
        assert_eq!(m.store.weight_of("ja", "日").unwrap(), Some(1));
        assert_eq!(m.store.weight_of("ja", "hello").unwrap(), None);
    }

    #[test]
    fn blank_language_or_empty_text_is_not_trained() {
        let m = model("tatc-nb-skip", &[]);
        m.train("hello", " ");
        m.train("!!! 123", "en");
        assert_eq!(m.store.count_words("en").unwrap(), 0);
        assert_eq!(m.store.count_words("").unwrap(), 0);
    }

    #[test]
    fn store_failures_degrade_to_no_result() {
        let m = NaiveBayesModel::new(Arc::new(FrequencyStore::new(
            "/proc/tatc-cannot-create/models.db",
        )));
        assert!(m.detect("hello").is_empty());
        m.train("hello", "en");
    }
}
