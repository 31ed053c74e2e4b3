use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    detection::ModelKind,
    domain::ChannelName,
    errors::Error,
    sanitizer::SanitizeOptions,
    Result,
};

/// Module name of the translation pipeline inside a channel's configuration.
pub const TRANSLATIONS: &str = "translations";

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Environment {
    pub command_prefix: String,
    pub default_translation_engine: String,
    pub default_ignore_words: Vec<String>,
    pub language_detection_model: ModelKind,
    pub language_detection_threshold: f64,

    pub database_file: PathBuf,
    pub resources_dir: PathBuf,
    pub channels_file: PathBuf,
}

impl Environment {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let cwd = env::current_dir()?;

        let command_prefix = env_str("TATC_COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!".to_string());
        let default_translation_engine = env_str("TATC_DEFAULT_TRANSLATION_ENGINE")
            .and_then(non_empty)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "google".to_string());
        let default_ignore_words = parse_csv(env_str("TATC_DEFAULT_IGNORE_WORDS"));

        let language_detection_model = env_str("TATC_LANGUAGE_DETECTION_MODEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "adaptive".to_string())
            .parse::<ModelKind>()
            .map_err(|e| Error::Config(format!("TATC_LANGUAGE_DETECTION_MODEL: {e}")))?;

        let language_detection_threshold = match env_str("TATC_LANGUAGE_DETECTION_THRESHOLD") {
            Some(raw) => parse_threshold(&raw)?,
            None => 0.75,
        };

        let database_file = env_path("TATC_DATABASE_FILE").unwrap_or_else(|| cwd.join("models.db"));
        let resources_dir = env_path("TATC_RESOURCES_DIR").unwrap_or_else(|| cwd.join("resources"));
        let channels_file =
            env_path("TATC_CHANNELS_FILE").unwrap_or_else(|| cwd.join("channels.json"));

        Ok(Self {
            command_prefix,
            default_translation_engine,
            default_ignore_words,
            language_detection_model,
            language_detection_threshold,
            database_file,
            resources_dir,
            channels_file,
        })
    }

    /// The detection model actually used, after the engine-based downgrade.
    pub fn effective_detection_model(&self) -> ModelKind {
        self.language_detection_model
            .effective_for(&self.default_translation_engine)
    }

    pub fn morse_code_file(&self) -> PathBuf {
        self.resources_dir.join("morse_code.json")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            default_translation_engine: "google".to_string(),
            default_ignore_words: Vec::new(),
            language_detection_model: ModelKind::Adaptive,
            language_detection_threshold: 0.75,
            database_file: PathBuf::from("models.db"),
            resources_dir: PathBuf::from("resources"),
            channels_file: PathBuf::from("channels.json"),
        }
    }
}

fn parse_threshold(raw: &str) -> Result<f64> {
    let v = raw.trim().parse::<f64>().map_err(|_| {
        Error::Config(format!(
            "TATC_LANGUAGE_DETECTION_THRESHOLD is not a number: {raw:?}"
        ))
    })?;
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::Config(format!(
            "TATC_LANGUAGE_DETECTION_THRESHOLD must be within [0, 1], got {v}"
        )));
    }
    Ok(v)
}

/// Translation settings as stored in `channels.json`; unset keys fall back to
/// the environment when resolved.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub enabled: Option<bool>,
    pub translation_engine: Option<String>,
    pub target_languages: Vec<String>,
    pub ignore_languages: Vec<String>,
    pub ignore_words: Option<Vec<String>>,
    pub sanitize_emojis: Option<bool>,
    pub sanitize_usernames: Option<bool>,
    pub morse_code_support: Option<bool>,
    pub detection_threshold: Option<f64>,
    pub debug_mode: Option<bool>,
}

/// One channel entry of `channels.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelEntry {
    pub enabled: Option<bool>,
    pub debug_mode: Option<bool>,
    pub translations: TranslationSettings,
}

/// Fully resolved per-channel configuration consumed by the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    pub enabled: bool,
    pub translation_engine: String,
    /// Ordered, duplicate-free.
    pub target_languages: Vec<String>,
    pub ignore_languages: Vec<String>,
    pub ignore_words: Vec<String>,
    pub sanitize_emojis: bool,
    pub sanitize_usernames: bool,
    pub morse_code_support: bool,
    pub detection_threshold: f64,
    pub debug_mode: bool,
}

impl ChannelConfig {
    pub fn defaults(env: &Environment) -> Self {
        ChannelEntry::default().resolve(env)
    }

    pub fn sanitize_options(&self) -> SanitizeOptions {
        SanitizeOptions {
            strip_emoji: self.sanitize_emojis,
            strip_username: self.sanitize_usernames,
        }
    }

    pub fn is_ignored_language(&self, language_id: &str) -> bool {
        self.ignore_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language_id))
    }

    pub fn is_ignored_word(&self, text: &str) -> bool {
        self.ignore_words.iter().any(|w| w == text)
    }
}

impl ChannelEntry {
    pub fn resolve(&self, env: &Environment) -> ChannelConfig {
        let t = &self.translations;
        let engine = t
            .translation_engine
            .clone()
            .and_then(non_empty)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| env.default_translation_engine.clone());

        ChannelConfig {
            enabled: t.enabled.unwrap_or(true),
            translation_engine: engine,
            target_languages: normalize_languages(&t.target_languages),
            ignore_languages: normalize_languages(&t.ignore_languages),
            ignore_words: t
                .ignore_words
                .clone()
                .map(|ws| dedup_trimmed(&ws))
                .unwrap_or_else(|| env.default_ignore_words.clone()),
            sanitize_emojis: t.sanitize_emojis.unwrap_or(true),
            sanitize_usernames: t.sanitize_usernames.unwrap_or(false),
            morse_code_support: t.morse_code_support.unwrap_or(false),
            detection_threshold: t
                .detection_threshold
                .filter(|v| (0.0..=1.0).contains(v))
                .unwrap_or(env.language_detection_threshold),
            debug_mode: t.debug_mode.or(self.debug_mode).unwrap_or(false),
        }
    }
}

/// All channel entries loaded from `channels.json`.
#[derive(Clone, Debug, Default)]
pub struct ChannelConfigs {
    entries: BTreeMap<ChannelName, ChannelEntry>,
}

impl ChannelConfigs {
    /// Load from disk; a missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: BTreeMap<String, ChannelEntry> = serde_json::from_str(raw)?;
        Ok(Self {
            entries: parsed
                .into_iter()
                .map(|(name, entry)| (ChannelName::new(name), entry))
                .collect(),
        })
    }

    /// Channels the bot should join.
    pub fn enabled_channels(&self) -> Vec<ChannelName> {
        self.entries
            .iter()
            .filter(|(_, e)| e.enabled.unwrap_or(true))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Resolved configuration for a channel; unknown channels get defaults.
    pub fn get(&self, channel: &ChannelName, env: &Environment) -> ChannelConfig {
        self.entries
            .get(channel)
            .map(|e| e.resolve(env))
            .unwrap_or_else(|| ChannelConfig::defaults(env))
    }
}

fn normalize_languages(values: &[String]) -> Vec<String> {
    let lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
    dedup_trimmed(&lowered)
}

/// Trim, drop blanks, drop duplicates (first occurrence wins).
fn dedup_trimmed(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|o| o == v) {
            out.push(v.to_string());
        }
    }
    out
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    let values: Vec<String> = v
        .unwrap_or_default()
        .split(',')
        .map(|s| s.to_string())
        .collect();
    dedup_trimmed(&values)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_environment() {
        let env = Environment {
            default_translation_engine: "bing".to_string(),
            default_ignore_words: vec!["lol".to_string()],
            language_detection_threshold: 0.5,
            ..Environment::default()
        };
        let cfg = ChannelConfig::defaults(&env);
        assert!(cfg.enabled);
        assert_eq!(cfg.translation_engine, "bing");
        assert_eq!(cfg.ignore_words, vec!["lol"]);
        assert!(cfg.sanitize_emojis);
        assert!(!cfg.sanitize_usernames);
        assert!(!cfg.morse_code_support);
        assert_eq!(cfg.detection_threshold, 0.5);
        assert!(!cfg.debug_mode);
    }

    #[test]
    fn channels_json_is_resolved_per_channel() {
        let raw = r##"{
          "#SomeChannel": {
            "debug_mode": true,
            "translations": {
              "translation_engine": " Google ",
              "target_languages": ["ES", "ja", "es", " "],
              "ignore_words": [" gg ", "gg"],
              "detection_threshold": 3.0
            }
          },
          "quiet": { "enabled": false, "translations": { "enabled": false } }
        }"##;
        let env = Environment::default();
        let configs = ChannelConfigs::from_json(raw).unwrap();

        let cfg = configs.get(&ChannelName::new("somechannel"), &env);
        assert_eq!(cfg.translation_engine, "google");
        assert_eq!(cfg.target_languages, vec!["es", "ja"]);
        assert_eq!(cfg.ignore_words, vec!["gg"]);
        assert_eq!(cfg.detection_threshold, 0.75);
        assert!(cfg.debug_mode);

        let quiet = configs.get(&ChannelName::new("quiet"), &env);
        assert!(!quiet.enabled);
        assert_eq!(
            configs.enabled_channels(),
            vec![ChannelName::new("somechannel")]
        );

        let unknown = configs.get(&ChannelName::new("elsewhere"), &env);
        assert_eq!(unknown, ChannelConfig::defaults(&env));
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert_eq!(parse_threshold(" 0.4 ").unwrap(), 0.4);
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("abc").is_err());
    }

    #[test]
    fn missing_channels_file_is_empty() {
        let configs = ChannelConfigs::load(Path::new("/nonexistent/tatc/channels.json")).unwrap();
        assert!(configs.enabled_channels().is_empty());
    }
}
