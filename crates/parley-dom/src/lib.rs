//! # Parley DOM
//!
//! The boundary between the translation pipeline and a document it does not
//! own.
//!
//! - [`HostDocument`]: element queries, attribute markers, annotation
//!   injection and batched mutation notifications
//! - [`SelectorList`]: the CSS subset used to describe host markup
//! - [`MemoryDocument`]: an in-process document used by the CLI replay and
//!   by tests
//!
//! Element handles ([`NodeId`]) are non-owning. A handle whose subtree was
//! re-rendered by the host simply stops being connected; every operation on it
//! becomes a no-op.

pub mod document;
pub mod error;
pub mod memory;
pub mod node_spec;
pub mod selector;

pub use document::{HostDocument, MutationBatch, MutationKind, MutationRecord, MutationStream, NodeId};
pub use error::DomError;
pub use memory::MemoryDocument;
pub use node_spec::NodeSpec;
pub use selector::{SelectorList, SelectorSet};
