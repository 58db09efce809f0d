//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, StorageBackend};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_translation(config, &mut result);
        Self::validate_cache(config, &mut result);
        Self::validate_queue(config, &mut result);
        Self::validate_input(config, &mut result);
        Self::validate_selectors(config, &mut result);
        Self::validate_storage(config, &mut result);

        result
    }

    fn validate_translation(config: &Config, result: &mut ValidationResult) {
        let translation = &config.translation;

        if let Err(e) = url::Url::parse(&translation.endpoint) {
            result.add_error(ValidationError::new(
                "translation.endpoint",
                format!("Invalid URL: {}", e),
            ));
        }

        if translation.target_lang.trim().is_empty() {
            result.add_error(ValidationError::new(
                "translation.target_lang",
                "target_lang cannot be empty",
            ));
        }

        if translation.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "translation.timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        }

        if translation.retry_attempts > 5 {
            result.add_warning(ValidationWarning::new(
                "translation.retry_attempts",
                "retry_attempts is high (>5), a failing endpoint will stall drain batches",
            ));
        }
    }

    fn validate_cache(config: &Config, result: &mut ValidationResult) {
        if config.cache.ttl_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "cache.ttl_secs",
                "ttl_secs is 0, every cache entry expires immediately",
            ));
        }

        if config.cache.cache_key == config.cache.history_key {
            result.add_error(ValidationError::new(
                "cache.history_key",
                "history_key must differ from cache_key",
            ));
        }
    }

    fn validate_queue(config: &Config, result: &mut ValidationResult) {
        if config.queue.concurrency == 0 {
            result.add_error(ValidationError::new(
                "queue.concurrency",
                "concurrency must be greater than 0",
            ));
        }

        if config.queue.concurrency > 10 {
            result.add_warning(ValidationWarning::new(
                "queue.concurrency",
                "concurrency is high (>10), the endpoint may rate-limit requests",
            ));
        }

        if config.queue.reapply_batch_size == 0 {
            result.add_error(ValidationError::new(
                "queue.reapply_batch_size",
                "reapply_batch_size must be greater than 0",
            ));
        }
    }

    fn validate_input(config: &Config, result: &mut ValidationResult) {
        if config.input.source_lang == config.input.target_lang {
            result.add_warning(ValidationWarning::new(
                "input.target_lang",
                "input source and target languages are identical",
            ));
        }

        if config.input.cache_key == config.cache.cache_key {
            result.add_error(ValidationError::new(
                "input.cache_key",
                "input cache_key must differ from cache.cache_key",
            ));
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        let selectors = &config.selectors;
        let lists = [
            ("selectors.app_root", &selectors.app_root),
            ("selectors.containers", &selectors.containers),
            ("selectors.messages", &selectors.messages),
            ("selectors.text", &selectors.text),
            ("selectors.conversation_roots", &selectors.conversation_roots),
            ("selectors.compose_box", &selectors.compose_box),
        ];

        for (path, list) in lists {
            if list.is_empty() {
                result.add_error(ValidationError::new(path, "selector list cannot be empty"));
            } else if list.iter().any(|s| s.trim().is_empty()) {
                result.add_error(ValidationError::new(path, "selector cannot be blank"));
            }
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        if config.storage.backend == StorageBackend::File && config.storage.path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "storage.path",
                "path is required for the file backend",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
