//! Per-message orchestration: sanitize, detect, translate, learn, deliver.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    config::{ChannelConfig, Environment, TRANSLATIONS},
    detection::DetectionModel,
    domain::{
        is_pseudo_language, ChatMessage, TranslationResult, DECODED_MORSE_LANGUAGE_ID,
        MORSE_CODE_LANGUAGE_ID,
    },
    registry::Registry,
    sanitizer::{parse_emotes, sanitize},
    utils::{truncate_text, MAX_CHAT_LINE_CHARS},
    Error, Result,
};

/// What one inbound message produced.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    /// Outbound chat lines, in backend response order.
    pub messages: Vec<String>,
    /// Targets whose translation failed; the other targets were still tried.
    pub failures: Vec<Error>,
}

impl ProcessOutcome {
    fn skipped(reason: &str) -> Self {
        debug!("skipped: {reason}");
        Self::default()
    }
}

pub struct Pipeline {
    env: Environment,
    registry: Arc<Registry>,
}

impl Pipeline {
    pub fn new(env: Environment, registry: Arc<Registry>) -> Self {
        Self { env, registry }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn model_for(&self, cfg: &ChannelConfig) -> Arc<dyn DetectionModel> {
        self.registry
            .model(self.env.effective_detection_model(), cfg.morse_code_support)
    }

    /// Languages scoring at or above the channel threshold, best first.
    fn detect(&self, model: &dyn DetectionModel, text: &str, threshold: f64) -> Vec<String> {
        let mut detected: Vec<String> = Vec::new();
        for candidate in model.detect(text) {
            if candidate.score >= threshold && !detected.contains(&candidate.language_id) {
                detected.push(candidate.language_id);
            }
        }
        detected
    }

    fn effective_targets(cfg: &ChannelConfig, detected: &[String]) -> Vec<String> {
        if cfg.morse_code_support && detected.iter().any(|l| l == MORSE_CODE_LANGUAGE_ID) {
            return vec![DECODED_MORSE_LANGUAGE_ID.to_string()];
        }
        cfg.target_languages
            .iter()
            .filter(|t| !detected.iter().any(|d| d.eq_ignore_ascii_case(t)))
            .cloned()
            .collect()
    }

    fn source_label(detected: &[String], result: &TranslationResult) -> String {
        if !detected.is_empty() {
            detected.join(",")
        } else if result.has_detected_language() {
            result.detected_language.clone()
        } else {
            "unknown".to_string()
        }
    }

    pub fn process(
        &self,
        cfg: &ChannelConfig,
        author: &str,
        text: &str,
        emotes: &str,
    ) -> Result<ProcessOutcome> {
        if !cfg.enabled {
            return Err(Error::Config(format!(
                "the module {TRANSLATIONS:?} is not enabled"
            )));
        }
        if text.starts_with(&self.env.command_prefix) {
            return Ok(ProcessOutcome::skipped("command"));
        }

        let sanitized = sanitize(text, &parse_emotes(emotes), cfg.sanitize_options());
        if sanitized.is_empty() {
            return Ok(ProcessOutcome::skipped("nothing left after sanitizing"));
        }
        if cfg.is_ignored_word(&sanitized) {
            return Ok(ProcessOutcome::skipped("ignored word"));
        }

        let model = self.model_for(cfg);
        let detected = self.detect(model.as_ref(), &sanitized, cfg.detection_threshold);
        debug!(
            "author={author:?} detected={detected:?} original_text={text:?} sanitized_text={sanitized:?}"
        );
        if detected.iter().any(|l| cfg.is_ignored_language(l)) {
            return Ok(ProcessOutcome::skipped("ignored language"));
        }

        let targets = Self::effective_targets(cfg, &detected);
        if targets.is_empty() {
            return Ok(ProcessOutcome::skipped("no target languages"));
        }

        let translator = self
            .registry
            .translator(&cfg.translation_engine, cfg.morse_code_support)?;

        let mut outcome = ProcessOutcome::default();
        let mut known = detected.clone();
        for item in translator.translate(&sanitized, targets) {
            let result = match item {
                Ok(result) => result,
                Err(e) => {
                    error!("translation via {} failed: {e}", translator.engine());
                    outcome.failures.push(e);
                    continue;
                }
            };

            if result.has_detected_language()
                && !is_pseudo_language(&result.detected_language)
                && !known.contains(&result.detected_language)
            {
                info!(
                    "training {} on backend-reported language {:?}",
                    model.name(),
                    result.detected_language
                );
                model.train(&sanitized, &result.detected_language);
                known.push(result.detected_language.clone());
            }

            if result
                .detected_language
                .eq_ignore_ascii_case(&result.expected_language)
            {
                debug!("dropping no-op translation into {}", result.expected_language);
                continue;
            }
            if result.has_detected_language() && cfg.is_ignored_language(&result.detected_language) {
                debug!("dropping translation from ignored {}", result.detected_language);
                continue;
            }
            if result.translated_text.trim().is_empty() {
                debug!("dropping empty translation into {}", result.expected_language);
                continue;
            }

            let source = Self::source_label(&detected, &result);
            info!(
                "[{source} -> {}] {author}: {}",
                result.expected_language, result.translated_text
            );
            let line = format!("[{source}] {author}: {}", result.translated_text);
            outcome
                .messages
                .push(truncate_text(&line, MAX_CHAT_LINE_CHARS));
        }
        Ok(outcome)
    }

    /// [`Pipeline::process`] for a chat event: every error is logged and, in
    /// debug mode, chat-visible errors become `Error: "<message>"` lines.
    pub fn handle(&self, message: &ChatMessage, cfg: &ChannelConfig) -> Vec<String> {
        let visible = |e: &Error| cfg.debug_mode && e.is_chat_visible();
        match self.process(cfg, &message.author, &message.text, &message.emotes) {
            Ok(outcome) => {
                let mut lines = outcome.messages;
                lines.extend(
                    outcome
                        .failures
                        .iter()
                        .filter(|e| visible(e))
                        .map(|e| format!("Error: {:?}", e.to_string())),
                );
                lines
            }
            Err(e @ Error::Config(_)) => {
                warn!("#{}: {e}", message.channel);
                Vec::new()
            }
            Err(e) => {
                error!("#{}: {e}", message.channel);
                if visible(&e) {
                    vec![format!("Error: {:?}", e.to_string())]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChannelName, MORSE_CODE_ENGINE},
        store::tests::seeded_store,
        translation::{tests::FakeProvider, MorseTable},
    };
    use serde_json::json;

    /// Google-shaped provider: translates to `<target>:<text>` and reports
    /// `source` as the detected language.
    fn google_provider(source: &'static str) -> Arc<FakeProvider> {
        Arc::new(FakeProvider::new(move |req| {
            if req.target_language == "fr" && source == "fail-fr" {
                return Err(Error::Backend("provider down".into()));
            }
            let reported = if source == "fail-fr" { "en" } else { source };
            Ok(json!([
                [[format!("{}:{}", req.target_language, req.text), req.text]],
                null,
                reported
            ]))
        }))
    }

    fn pipeline(prefix: &str, provider: Arc<FakeProvider>) -> Pipeline {
        let store = seeded_store(prefix, &[("en", "hello,1\nthere,1\n"), ("de", "hallo,1\n")]);
        let registry = Registry::new(Arc::new(store), provider, Arc::new(MorseTable::builtin()));
        Pipeline::new(Environment::default(), Arc::new(registry))
    }

    fn config(targets: &[&str]) -> ChannelConfig {
        let mut cfg = ChannelConfig::defaults(&Environment::default());
        cfg.target_languages = targets.iter().map(|t| t.to_string()).collect();
        cfg
    }

    #[test]
    fn detected_message_is_translated_and_labelled() {
        let p = pipeline("tatc-pipe-e2e", google_provider("en"));
        let out = p.process(&config(&["es"]), "alice", "hello there", "").unwrap();
        assert_eq!(out.messages, vec!["[en] alice: es:hello there"]);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn ignored_word_delivers_nothing() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-ignore", provider.clone());
        let mut cfg = config(&["es"]);
        cfg.ignore_words = vec!["hello there".into()];
        let out = p.process(&cfg, "alice", "hello there", "").unwrap();
        assert!(out.messages.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn no_op_translation_is_suppressed_and_teaches_the_model() {
        let provider = google_provider("es");
        let p = pipeline("tatc-pipe-noop", provider.clone());
        let out = p
            .process(&config(&["es", "fr"]), "bob", "hola amigos", "")
            .unwrap();

        // Unknown to the store, so the backend's answer labels the line.
        assert_eq!(out.messages, vec!["[es] bob: fr:hola amigos"]);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(
            p.registry().store().weight_of("es", "hola").unwrap(),
            Some(1)
        );
    }

    #[test]
    fn targets_already_detected_are_skipped() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-targets", provider.clone());
        let out = p
            .process(&config(&["EN", "es"]), "alice", "hello there", "")
            .unwrap();
        assert_eq!(out.messages.len(), 1);
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "es");
    }

    #[test]
    fn only_detected_targets_means_skip() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-none", provider.clone());
        let out = p.process(&config(&["en"]), "alice", "hello", "").unwrap();
        assert!(out.messages.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn ignored_detected_language_is_skipped() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-ignlang", provider.clone());
        let mut cfg = config(&["es"]);
        cfg.ignore_languages = vec!["en".into()];
        assert!(p.process(&cfg, "a", "hello", "").unwrap().messages.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn commands_and_emote_only_messages_are_skipped() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-skip", provider.clone());
        let cfg = config(&["es"]);
        assert!(p.process(&cfg, "a", "!translate es", "").unwrap().messages.is_empty());
        assert!(p.process(&cfg, "a", "Kappa", "25:0-4").unwrap().messages.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn disabled_channel_is_a_config_error() {
        let p = pipeline("tatc-pipe-disabled", google_provider("en"));
        let mut cfg = config(&["es"]);
        cfg.enabled = false;
        assert!(matches!(
            p.process(&cfg, "a", "hello", ""),
            Err(Error::Config(_))
        ));

        let msg = ChatMessage {
            channel: ChannelName::new("chan"),
            author: "a".into(),
            text: "hello".into(),
            emotes: String::new(),
        };
        cfg.debug_mode = true;
        assert!(p.handle(&msg, &cfg).is_empty());
    }

    #[test]
    fn failing_target_is_reported_in_debug_mode_only() {
        let p = pipeline("tatc-pipe-fail", google_provider("fail-fr"));
        let mut cfg = config(&["es", "fr", "de"]);
        let out = p.process(&cfg, "alice", "hello there", "").unwrap();
        assert_eq!(out.messages.len(), 2);
        assert_eq!(out.failures.len(), 1);

        let msg = ChatMessage {
            channel: ChannelName::new("chan"),
            author: "alice".into(),
            text: "hello there".into(),
            emotes: String::new(),
        };
        assert_eq!(p.handle(&msg, &cfg).len(), 2);

        cfg.debug_mode = true;
        let lines = p.handle(&msg, &cfg);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Error: \"backend error: provider down\"");
    }

    #[test]
    fn morse_is_decoded_without_calling_the_provider() {
        let provider = google_provider("en");
        let p = pipeline("tatc-pipe-morse", provider.clone());
        let mut cfg = config(&["es"]);
        cfg.morse_code_support = true;
        let out = p.process(&cfg, "sam", "... --- ...", "").unwrap();
        assert_eq!(out.messages, vec!["[morse_code] sam: sos"]);
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn morse_engine_never_teaches_its_pseudo_language() {
        let p = pipeline("tatc-pipe-morse-train", google_provider("en"));
        let mut morse_channel = config(&["es"]);
        morse_channel.translation_engine = MORSE_CODE_ENGINE.into();
        p.process(&morse_channel, "x", "hello there", "").unwrap();
        let store = p.registry().store();
        assert_eq!(store.weight_of(MORSE_CODE_LANGUAGE_ID, "hello").unwrap(), None);
        assert_eq!(store.count_words(MORSE_CODE_LANGUAGE_ID).unwrap(), 0);

        // Another channel sharing the store still detects plain English.
        let mut google_channel = config(&["es"]);
        google_channel.morse_code_support = true;
        let out = p.process(&google_channel, "y", "hello there", "").unwrap();
        assert_eq!(out.messages, vec!["[en] y: es:hello there"]);
    }

    #[test]
    fn blank_engine_is_a_validation_error() {
        let p = pipeline("tatc-pipe-engine", google_provider("en"));
        let mut cfg = config(&["es"]);
        cfg.translation_engine = " ".into();
        assert!(matches!(
            p.process(&cfg, "a", "hello", ""),
            Err(Error::Validation(_))
        ));
    }
}
