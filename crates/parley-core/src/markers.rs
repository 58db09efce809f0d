//! Attribute and class markers written into the host document.

/// Set on a message element once a scan has picked it up.
pub const PROCESSED_ATTR: &str = "data-processed";

/// Set on a message element once a translation has been displayed for it.
pub const TRANSLATED_ATTR: &str = "data-translated";

/// Value of both boolean markers.
pub const MARKER_VALUE: &str = "true";

/// Class of an injected translation annotation.
pub const ANNOTATION_CLASS: &str = "parley-translation-result";

/// Prefix of the annotation text.
pub const ANNOTATION_PREFIX: &str = "🔄 ";
