//! HTTP adapter for translation providers.
//!
//! Implements [`ProviderClient`] over blocking reqwest: the Google web
//! endpoint, the Microsoft Translator v3 API and any LibreTranslate-compatible
//! server for generic engines. Payloads are returned untouched; parsing lives
//! in `tatc_core::translation`.

use std::{env, time::Duration};

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use tatc_core::{
    errors::Error,
    ports::{ProviderClient, ProviderRequest},
    Result,
};
use tracing::debug;

const GOOGLE_URL: &str = "https://translate.googleapis.com/translate_a/single";
const BING_URL: &str = "https://api.cognitive.microsofttranslator.com/translate";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub bing_api_key: Option<String>,
    pub bing_region: Option<String>,
    /// Base URL of a LibreTranslate-compatible server.
    pub generic_endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bing_api_key: None,
            bing_region: None,
            generic_endpoint: None,
            timeout: Duration::from_millis(10_000),
        }
    }
}

impl HttpConfig {
    /// Read `TATC_BING_API_KEY`, `TATC_BING_REGION`, `TATC_GENERIC_ENDPOINT`
    /// and `TATC_HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        let timeout = match env_str("TATC_HTTP_TIMEOUT_MS") {
            Some(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("TATC_HTTP_TIMEOUT_MS is not a number: {raw:?}"))
                })?;
                Duration::from_millis(ms)
            }
            None => HttpConfig::default().timeout,
        };
        Ok(Self {
            bing_api_key: env_str("TATC_BING_API_KEY"),
            bing_region: env_str("TATC_BING_REGION"),
            generic_endpoint: env_str("TATC_GENERIC_ENDPOINT")
                .map(|s| s.trim_end_matches('/').to_string()),
            timeout,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn backend(engine: &str, what: &str, e: impl std::fmt::Display) -> Error {
    Error::Backend(format!("{engine} {what}: {e}"))
}

#[derive(Clone, Debug)]
pub struct HttpProvider {
    cfg: HttpConfig,
    http: Client,
}

impl HttpProvider {
    pub fn new(cfg: HttpConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build: {e}")))?;
        Ok(Self { cfg, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(HttpConfig::from_env()?)
    }

    /// The array form answered here always carries the source language, so
    /// `detailed` needs no extra parameter.
    fn google(&self, req: &ProviderRequest<'_>) -> RequestBuilder {
        self.http.get(GOOGLE_URL).query(&[
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", req.target_language),
            ("dt", "t"),
            ("q", req.text),
        ])
    }

    fn bing(&self, req: &ProviderRequest<'_>) -> Result<RequestBuilder> {
        let key = self
            .cfg
            .bing_api_key
            .as_deref()
            .ok_or_else(|| Error::Backend("bing: TATC_BING_API_KEY is not set".to_string()))?;

        let mut builder = self
            .http
            .post(BING_URL)
            .query(&[("api-version", "3.0"), ("to", req.target_language)])
            .header("Ocp-Apim-Subscription-Key", key)
            .json(&json!([{ "Text": req.text }]));
        if let Some(region) = self.cfg.bing_region.as_deref() {
            builder = builder.header("Ocp-Apim-Subscription-Region", region);
        }
        Ok(builder)
    }

    fn generic(&self, req: &ProviderRequest<'_>) -> Result<RequestBuilder> {
        let base = self.cfg.generic_endpoint.as_deref().ok_or_else(|| {
            Error::Backend(format!(
                "{}: TATC_GENERIC_ENDPOINT is not set",
                req.engine
            ))
        })?;
        Ok(self.http.post(format!("{base}/translate")).json(&json!({
            "q": req.text,
            "source": "auto",
            "target": req.target_language,
            "format": "text",
        })))
    }

    fn request(&self, req: &ProviderRequest<'_>) -> Result<RequestBuilder> {
        match req.engine {
            "google" => Ok(self.google(req)),
            "bing" => self.bing(req),
            _ => self.generic(req),
        }
    }
}

impl ProviderClient for HttpProvider {
    fn fetch(&self, req: &ProviderRequest<'_>) -> Result<Value> {
        let engine = req.engine;
        debug!("{engine} request: target={}", req.target_language);

        let resp = self
            .request(req)?
            .send()
            .map_err(|e| backend(engine, "request error", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(Error::Backend(format!(
                "{engine} translation failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        resp.json::<Value>()
            .map_err(|e| backend(engine, "json error", e))
    }
}
