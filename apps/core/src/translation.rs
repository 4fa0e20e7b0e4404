//! Best-effort machine translation for user-facing text.
//!
//! `HttpTranslator` talks to a LibreTranslate-compatible `/translate`
//! endpoint. Callers go through [`translate_or_original`], which never fails:
//! on any error the untranslated text comes back.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::TriageConfig;
use crate::error::{AppError, AppResult};

const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Language of the stored texts; requests for it skip the network.
pub const SOURCE_LANGUAGE: &str = "en";

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String>;
}

/// Returns the input unchanged. Used when no translation service is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> AppResult<String> {
        Ok(text.to_string())
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

pub struct HttpTranslator {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(base_url: &Url, api_key: Option<String>) -> AppResult<Self> {
        let client = Client::builder().timeout(TRANSLATE_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: base_url.join("translate")?,
            api_key,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
        let payload = TranslateRequest {
            q: text,
            source: "auto",
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let res = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Translation request failed with status {}: {}",
                status, body
            )));
        }

        let body: TranslateResponse = res.json().await?;
        Ok(body.translated_text)
    }
}

/// Translator selected by configuration: HTTP when a URL is set, otherwise no-op.
pub fn translator_from_config(config: &TriageConfig) -> AppResult<Box<dyn Translator>> {
    match &config.translate_url {
        Some(url) => Ok(Box::new(HttpTranslator::new(
            url,
            config.translate_api_key.clone(),
        )?)),
        None => Ok(Box::new(NoopTranslator)),
    }
}

/// Translates `text`, returning it unchanged on failure or for English targets.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target_lang: &str,
) -> String {
    let target = target_lang.trim().to_lowercase();
    if target.is_empty() || target == SOURCE_LANGUAGE || text.trim().is_empty() {
        return text.to_string();
    }
    match translator.translate(text, &target).await {
        Ok(translated) if !translated.trim().is_empty() => {
            debug!(target = %target, "Translated text");
            translated
        }
        Ok(_) => text.to_string(),
        Err(e) => {
            warn!(
                "Translation to '{}' failed, keeping original: {}",
                target, e
            );
            text.to_string()
        }
    }
}
