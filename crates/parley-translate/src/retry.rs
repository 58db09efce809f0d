//! Fixed-delay retry around a translator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::TranslateError;
use crate::translator::Translator;

/// Retries failed calls a fixed number of times with a fixed delay.
pub struct RetryingTranslator {
    inner: Arc<dyn Translator>,
    attempts: u32,
    delay: Duration,
}

impl RetryingTranslator {
    /// `attempts` counts extra tries after the first failure.
    pub fn new(inner: Arc<dyn Translator>, attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            attempts,
            delay,
        }
    }
}

#[async_trait]
impl Translator for RetryingTranslator {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let mut attempt = 0;
        loop {
            match self.inner.translate(text, source, target).await {
                Ok(translated) => return Ok(translated),
                Err(e) if attempt < self.attempts => {
                    attempt += 1;
                    warn!(
                        "Translate via {} failed (attempt {}/{}): {}",
                        self.inner.id(),
                        attempt,
                        self.attempts + 1,
                        e
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
