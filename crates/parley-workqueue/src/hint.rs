//! Transient on-screen hints.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parley_dom::{HostDocument, NodeId, NodeSpec};
use tracing::debug;

/// Kind of hint. At most one hint of each kind is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    Translation,
    Error,
    Info,
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HintKind::Translation => "translation",
            HintKind::Error => "error",
            HintKind::Info => "info",
        };
        f.write_str(name)
    }
}

/// Surface for short user-facing messages.
pub trait HintSink: Send + Sync {
    fn show(&self, kind: HintKind, message: &str);
}

/// Shows hints as elements appended to the document root and removes them
/// after a fixed duration.
pub struct DomHints {
    doc: Arc<dyn HostDocument>,
    duration: Duration,
}

impl DomHints {
    pub fn new(doc: Arc<dyn HostDocument>, duration: Duration) -> Self {
        Self { doc, duration }
    }

    fn hint_id(kind: HintKind) -> String {
        format!("parley-hint-{}", kind)
    }

    fn find(&self, kind: HintKind) -> Option<NodeId> {
        let id = Self::hint_id(kind);
        let root = self.doc.root();
        self.doc
            .children(root)
            .into_iter()
            .find(|node| self.doc.attribute(*node, "id").as_deref() == Some(id.as_str()))
    }
}

impl HintSink for DomHints {
    fn show(&self, kind: HintKind, message: &str) {
        if let Some(existing) = self.find(kind) {
            self.doc.remove_node(existing);
        }

        let spec = NodeSpec::element("div")
            .attr("id", Self::hint_id(kind))
            .attr("class", "parley-hint")
            .text(message);
        let Some(node) = self.doc.append_element(self.doc.root(), &spec) else {
            return;
        };
        debug!("Hint shown ({}): {}", kind, message);

        let doc = self.doc.clone();
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            doc.remove_node(node);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_dom::MemoryDocument;

    #[tokio::test(start_paused = true)]
    async fn test_hint_auto_dismisses() {
        let doc = Arc::new(MemoryDocument::new(&NodeSpec::element("body")));
        let hints = DomHints::new(doc.clone(), Duration::from_secs(3));

        hints.show(HintKind::Translation, "Translated");
        let node = doc.select_first("#parley-hint-translation").unwrap();
        assert_eq!(doc.text_content(node).as_deref(), Some("Translated"));

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert!(!doc.is_connected(node));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_hint_per_kind() {
        let doc = Arc::new(MemoryDocument::new(&NodeSpec::element("body")));
        let hints = DomHints::new(doc.clone(), Duration::from_secs(3));

        hints.show(HintKind::Error, "first");
        hints.show(HintKind::Error, "second");
        hints.show(HintKind::Info, "other");

        let errors = doc.select("#parley-hint-error").unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(doc.text_content(errors[0]).as_deref(), Some("second"));
        assert_eq!(doc.select(".parley-hint").unwrap().len(), 2);
    }
}
