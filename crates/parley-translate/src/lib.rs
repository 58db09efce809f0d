//! # Parley Translate
//!
//! The remote `translate(text, source, target) -> text` call.
//!
//! - [`Translator`]: the call contract
//! - [`GoogleTranslator`]: HTTP client for the `translate_a/single` endpoint
//! - [`RetryingTranslator`]: optional fixed-delay retry layer
//! - [`lang`]: script detection used to decide what to translate

pub mod error;
pub mod google;
pub mod lang;
pub mod retry;
pub mod translator;

use std::sync::Arc;

use parley_config::TranslationConfig;

pub use error::TranslateError;
pub use google::GoogleTranslator;
pub use lang::{contains_han, is_shortcut_command};
pub use retry::RetryingTranslator;
pub use translator::Translator;

/// Build the configured translator, with retries when `retry_attempts > 0`.
pub fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>, TranslateError> {
    let google: Arc<dyn Translator> = Arc::new(GoogleTranslator::from_config(config)?);
    if config.retry_attempts == 0 {
        return Ok(google);
    }
    Ok(Arc::new(RetryingTranslator::new(
        google,
        config.retry_attempts,
        config.retry_delay(),
    )))
}
