//! The remote translate call contract.

use async_trait::async_trait;

use crate::error::TranslateError;

/// Translates text between languages.
///
/// Implementations make a single attempt unless they say otherwise; retry
/// policy is layered on with [`crate::RetryingTranslator`].
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &str;

    /// Translate `text` from `source` (or `auto`) into `target`.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;
}
