//! End-to-end tests of the message pipeline on an in-memory page.
//!
//! These drive a full session: host mutations are flushed by hand, the
//! remote call is a fake that counts requests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use parley_config::{CacheConfig, SelectorsConfig, WatcherConfig};
use parley_core::{HostSelectors, MessageExtractor};
use parley_dom::{HostDocument, MemoryDocument, NodeSpec};
use parley_store::{MemoryKeyValueStore, StoreOptions, TranslationStore};
use parley_translate::{TranslateError, Translator};
use parley_watch::{Session, SwitchPhase};
use parley_workqueue::{DomAnnotator, QueueOptions, TranslationQueue};

// ============================================================================
// Test Helpers
// ============================================================================

/// Translator that uppercases and remembers every request.
#[derive(Default)]
struct CountingTranslator {
    calls: Mutex<Vec<String>>,
    fixed: HashMap<String, String>,
}

impl CountingTranslator {
    fn with(mut self, text: &str, translated: &str) -> Self {
        self.fixed.insert(text.to_string(), translated.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn count(&self, text: &str) -> usize {
        self.calls.lock().iter().filter(|t| t.as_str() == text).count()
    }
}

#[async_trait]
impl Translator for CountingTranslator {
    fn id(&self) -> &str {
        "counting"
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
        self.calls.lock().push(text.to_string());
        Ok(self
            .fixed
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_uppercase()))
    }
}

fn message(text: &str) -> NodeSpec {
    NodeSpec::element("div").class("message-in").child(
        NodeSpec::element("div")
            .class("copyable-text")
            .child(NodeSpec::element("span").attr("dir", "ltr").text(text)),
    )
}

fn message_list(texts: &[&str]) -> NodeSpec {
    let mut list = NodeSpec::element("div").class("message-list");
    list.children = texts.iter().map(|t| message(t)).collect();
    list
}

fn page(texts: &[&str]) -> NodeSpec {
    NodeSpec::element("body").child(
        NodeSpec::element("div")
            .attr("id", "app")
            .child(NodeSpec::element("div").attr("id", "main").child(message_list(texts))),
    )
}

struct Pipeline {
    session: Session,
    doc: Arc<MemoryDocument>,
    translator: Arc<CountingTranslator>,
    store: Arc<TranslationStore>,
}

async fn pipeline(texts: &[&str], translator: CountingTranslator) -> Pipeline {
    let doc = Arc::new(MemoryDocument::new(&page(texts)));
    let selectors = Arc::new(HostSelectors::from_config(&SelectorsConfig::default()).unwrap());
    let extractor = MessageExtractor::new(selectors);
    let display = Arc::new(DomAnnotator::new(doc.clone(), extractor.clone()));
    let store = Arc::new(
        TranslationStore::open(
            Arc::new(MemoryKeyValueStore::new()),
            StoreOptions::from_config(&CacheConfig::default()),
        )
        .await,
    );
    let translator = Arc::new(translator);
    let queue = TranslationQueue::new(store.clone(), translator.clone(), display, QueueOptions::default());
    let session = Session::new(doc.clone(), extractor, queue, WatcherConfig::default());
    Pipeline {
        session,
        doc,
        translator,
        store,
    }
}

fn annotations(doc: &MemoryDocument) -> Vec<String> {
    doc.select(".parley-translation-result")
        .unwrap()
        .into_iter()
        .filter_map(|node| doc.text_content(node))
        .collect()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

async fn settle(p: &Pipeline) {
    wait_until(|| {
        let status = p.session.status();
        status.queue_length == 0 && !status.is_processing && status.phase == SwitchPhase::Stable
    })
    .await;
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_translates_existing_messages() {
    let p = pipeline(&["hola", "adios"], CountingTranslator::default()).await;

    assert_eq!(p.session.start().unwrap(), 2);
    settle(&p).await;

    assert_eq!(annotations(&p.doc), vec!["🔄 HOLA", "🔄 ADIOS"]);
    assert_eq!(p.translator.calls(), vec!["hola", "adios"]);
    assert_eq!(p.session.status().cache_size, 2);
}

#[tokio::test(start_paused = true)]
async fn test_new_message_is_translated_once() {
    let p = pipeline(&["hola"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    let list = p.doc.select_first(".message-list").unwrap();
    p.doc.append_element(list, &message("gracias"));
    p.doc.flush();
    wait_until(|| annotations(&p.doc).len() == 2).await;

    p.doc.flush();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(p.translator.count("gracias"), 1);
    assert_eq!(annotations(&p.doc).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_switch_back_uses_history_not_remote() {
    let p = pipeline(&["hola"], CountingTranslator::default().with("hola", "你好")).await;
    p.session.start().unwrap();
    settle(&p).await;

    let main = p.doc.select_first("#main").unwrap();
    p.doc.replace_children(main, &[message_list(&["otro"])]);
    p.doc.flush();
    wait_until(|| p.session.status().phase == SwitchPhase::SwitchPending).await;
    settle(&p).await;

    p.doc.replace_children(main, &[message_list(&["hola", "nuevo"])]);
    p.doc.flush();
    wait_until(|| p.session.status().phase == SwitchPhase::SwitchPending).await;
    assert!(p.session.status().paused);
    settle(&p).await;

    assert_eq!(p.translator.count("hola"), 1);
    assert_eq!(p.translator.count("nuevo"), 1);
    assert_eq!(annotations(&p.doc), vec!["🔄 你好", "🔄 NUEVO"]);
    assert!(!p.session.status().paused);
}

#[tokio::test(start_paused = true)]
async fn test_disable_removes_annotations_and_enable_reapplies() {
    let p = pipeline(&["hola", "adios"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    p.session.set_translation_enabled(false);
    assert!(annotations(&p.doc).is_empty());
    assert!(!p.session.queue().is_running());
    assert!(!p.session.is_translation_enabled());

    let list = p.doc.select_first(".message-list").unwrap();
    p.doc.append_element(list, &message("tarde"));
    p.doc.flush();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(p.translator.count("tarde"), 0);

    assert!(p.session.toggle_translation());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(annotations(&p.doc).is_empty());
    wait_until(|| annotations(&p.doc).len() == 3).await;
    settle(&p).await;

    assert_eq!(annotations(&p.doc), vec!["🔄 HOLA", "🔄 ADIOS", "🔄 TARDE"]);
    assert_eq!(p.translator.count("hola"), 1);
    assert_eq!(p.translator.count("adios"), 1);
    assert_eq!(p.translator.count("tarde"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_message_seen_while_disabled_stays_unmarked() {
    let p = pipeline(&["hola"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    p.session.set_translation_enabled(false);
    let list = p.doc.select_first(".message-list").unwrap();
    let missed = p.doc.append_element(list, &message("perdido")).unwrap();
    p.doc.flush();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(p.doc.attribute(missed, "data-processed"), None);
    assert_eq!(p.session.rescan(), 0);

    p.session.set_translation_enabled(true);
    assert_eq!(p.session.rescan(), 1);
    settle(&p).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    settle(&p).await;

    assert_eq!(p.translator.count("perdido"), 1);
    assert_eq!(annotations(&p.doc), vec!["🔄 HOLA", "🔄 PERDIDO"]);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_rescan_is_debounced() {
    let p = pipeline(&["hola"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    // Older history loaded above the first message; the batch is never flushed.
    let list = p.doc.select_first(".message-list").unwrap();
    p.doc.append_element(list, &message("viejo"));

    for _ in 0..5 {
        p.session.on_scroll();
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
    assert_eq!(p.translator.count("viejo"), 0);

    wait_until(|| p.translator.count("viejo") == 1).await;
    settle(&p).await;
    assert_eq!(annotations(&p.doc).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_markers_reprocesses_from_history() {
    let p = pipeline(&["hola", "adios"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    assert_eq!(p.session.reset_markers(), 2);
    assert_eq!(p.session.rescan(), 2);
    settle(&p).await;

    assert_eq!(p.translator.calls().len(), 2);
    assert_eq!(annotations(&p.doc).len(), 2);
    assert!(p.store.history_size() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_annotations_and_ignores_new_messages() {
    let p = pipeline(&["hola"], CountingTranslator::default()).await;
    p.session.start().unwrap();
    settle(&p).await;

    p.session.stop();
    let status = p.session.status();
    assert!(!status.running);
    assert!(!status.watching);

    let list = p.doc.select_first(".message-list").unwrap();
    p.doc.append_element(list, &message("tarde"));
    p.doc.flush();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(p.translator.count("tarde"), 0);
    assert_eq!(annotations(&p.doc), vec!["🔄 HOLA"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_without_app_root() {
    let doc = Arc::new(MemoryDocument::new(&NodeSpec::element("html")));
    let selectors = Arc::new(HostSelectors::from_config(&SelectorsConfig::default()).unwrap());
    let extractor = MessageExtractor::new(selectors);
    let display = Arc::new(DomAnnotator::new(doc.clone(), extractor.clone()));
    let store = Arc::new(
        TranslationStore::open(
            Arc::new(MemoryKeyValueStore::new()),
            StoreOptions::from_config(&CacheConfig::default()),
        )
        .await,
    );
    let queue = TranslationQueue::new(
        store,
        Arc::new(CountingTranslator::default()),
        display,
        QueueOptions::default(),
    );
    let session = Session::new(doc, extractor, queue, WatcherConfig::default());

    assert!(session.start().is_err());
    assert!(!session.status().running);
    assert!(!session.queue().is_running());
}
