//! # Parley Core
//!
//! Message records and how they are found on the host page.
//!
//! - [`MessageRecord`]: one observation of a chat message
//! - [`fingerprint`]: per-observation fingerprints and stable history keys
//! - [`MessageExtractor`]: finds message elements and reads their text
//! - [`HostSelectors`]: the configured selector lists, compiled
//! - [`markers`]: attributes and classes written into the host document

pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod markers;
pub mod record;
pub mod selectors;

pub use error::CoreError;
pub use extractor::MessageExtractor;
pub use fingerprint::{Fingerprint, history_key, simple_hash};
pub use record::MessageRecord;
pub use selectors::HostSelectors;
