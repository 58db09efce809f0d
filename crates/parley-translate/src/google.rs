//! Google translate endpoint.

use std::time::Duration;

use async_trait::async_trait;
use parley_config::TranslationConfig;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::TranslateError;
use crate::translator::Translator;

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Client for the public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    endpoint: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| TranslateError::InvalidEndpoint(endpoint.to_string()))?;
        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
            timeout,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslateError> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn id(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status { status, message });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;
        let translated = parse_segments(&body)?;

        debug!("Translated {} chars into {} chars", text.chars().count(), translated.chars().count());
        Ok(translated)
    }
}

/// Concatenate the first field of every segment in `body[0]`.
///
/// `[[["Hello","你好",null,null,1],[" world","世界",...]],null,"zh-CN",...]`
pub fn parse_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::MalformedResponse("missing segment list".to_string()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

#[cfg(test)]
#[path = "google_tests.rs"]
mod tests;
