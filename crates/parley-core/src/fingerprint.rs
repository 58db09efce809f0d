//! Message identity.
//!
//! A message has no natural key on the host page. Two identities are derived
//! from its normalized text:
//!
//! - the history key `msg_<hash>`, stable across observations, used to find a
//!   previously displayed translation;
//! - the [`Fingerprint`] `msg_<hash>_<millis>`, unique per observation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 31-multiplier rolling hash over UTF-16 code units, wrapped to 32 bits and
/// made non-negative.
pub fn simple_hash(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Trimmed text, the form every identity is derived from.
pub fn normalize(text: &str) -> &str {
    text.trim()
}

/// Stable history key of a message text.
pub fn history_key(text: &str) -> String {
    format!("msg_{}", simple_hash(normalize(text)))
}

/// Per-observation identity of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(text: &str, observed_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}_{}",
            history_key(text),
            observed_at.timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
