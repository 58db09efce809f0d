use super::*;
use crate::testing::{FakeTranslator, RecordingHints, wait_until};
use parley_config::SelectorsConfig;
use parley_dom::MemoryDocument;
use parley_store::{MemoryKeyValueStore, StoreOptions};
use std::time::Duration;

struct Harness {
    input: InputQueue,
    doc: Arc<MemoryDocument>,
    flags: Arc<MemoryKeyValueStore>,
    translator: Arc<FakeTranslator>,
    hints: Arc<RecordingHints>,
    compose: NodeId,
    paragraph: NodeId,
}

async fn harness(translator: FakeTranslator, text: &str) -> Harness {
    let doc = Arc::new(MemoryDocument::new(
        &NodeSpec::element("body").child(
            NodeSpec::element("footer").child(
                NodeSpec::element("div")
                    .attr("contenteditable", "true")
                    .attr("aria-label", "输入消息")
                    .child(
                        NodeSpec::element("p")
                            .class("selectable-text")
                            .child(NodeSpec::element("span").text(text)),
                    ),
            ),
        ),
    ));
    let compose = doc.select_first("[contenteditable=\"true\"]").unwrap();
    let paragraph = doc.select_first("p").unwrap();
    let flags = Arc::new(MemoryKeyValueStore::new());
    let store = Arc::new(
        TranslationStore::open(
            flags.clone(),
            StoreOptions::cache_only("input_translation_cache", Duration::from_secs(3600)),
        )
        .await,
    );
    let translator = Arc::new(translator);
    let hints = Arc::new(RecordingHints::default());
    let input = InputQueue::new(
        doc.clone(),
        Arc::new(HostSelectors::from_config(&SelectorsConfig::default()).unwrap()),
        store,
        flags.clone(),
        translator.clone(),
        hints.clone(),
        InputConfig::default(),
    );
    Harness {
        input,
        doc,
        flags,
        translator,
        hints,
        compose,
        paragraph,
    }
}

async fn enabled(translator: FakeTranslator, text: &str) -> Harness {
    let h = harness(translator, text).await;
    h.flags.set("input_translator_enabled", "true").await.unwrap();
    h.input.start().await;
    h
}

#[tokio::test]
async fn test_start_reads_persisted_flag() {
    let h = harness(FakeTranslator::new(), "").await;
    h.input.start().await;
    assert!(!h.input.is_enabled());

    h.flags.set("input_translator_enabled", "true").await.unwrap();
    h.input.start().await;
    assert!(h.input.is_enabled());
}

#[tokio::test]
async fn test_toggle_persists() {
    let h = harness(FakeTranslator::new(), "").await;
    h.input.start().await;

    assert!(h.input.toggle_enabled().await);
    assert_eq!(
        h.flags.get("input_translator_enabled").await.unwrap().as_deref(),
        Some("true")
    );
    assert!(!h.input.toggle_enabled().await);
    assert_eq!(
        h.flags.get("input_translator_enabled").await.unwrap().as_deref(),
        Some("false")
    );
}

#[tokio::test]
async fn test_disabled_passes_everything_through() {
    let h = harness(FakeTranslator::new(), "你好").await;
    h.input.start().await;

    assert_eq!(h.input.handle_key(h.paragraph, &KeyPress::enter()), KeyAction::PassThrough);
}

#[tokio::test(start_paused = true)]
async fn test_enter_on_han_text_is_translated_into_compose_box() {
    let h = enabled(FakeTranslator::new().with("你好", "Hello"), "你好").await;

    let action = h.input.handle_key(h.paragraph, &KeyPress::enter());
    assert_eq!(action, KeyAction::Intercept);

    wait_until(|| h.doc.text_content(h.compose).as_deref() == Some("Hello")).await;
    let span = h.doc.select_first("span[data-lexical-text=\"true\"]").unwrap();
    assert_eq!(h.doc.parent(span), Some(h.paragraph));
    assert_eq!(h.hints.shown(), vec![(HintKind::Translation, "Translation complete".to_string())]);
}

#[tokio::test]
async fn test_shift_enter_and_latin_text_pass_through() {
    let h = enabled(FakeTranslator::new(), "你好").await;
    assert_eq!(h.input.handle_key(h.paragraph, &KeyPress::shift_enter()), KeyAction::PassThrough);

    let h = enabled(FakeTranslator::new(), "hello").await;
    assert_eq!(h.input.handle_key(h.paragraph, &KeyPress::enter()), KeyAction::PassThrough);
}

#[tokio::test]
async fn test_shortcut_command_passes_through() {
    let h = enabled(FakeTranslator::new(), "/好的").await;
    assert_eq!(h.input.handle_key(h.paragraph, &KeyPress::enter()), KeyAction::PassThrough);
}

#[tokio::test]
async fn test_key_outside_compose_box_passes_through() {
    let h = enabled(FakeTranslator::new(), "你好").await;
    let footer = h.doc.select_first("footer").unwrap();
    assert_eq!(h.input.handle_key(footer, &KeyPress::enter()), KeyAction::PassThrough);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_original_and_shows_hint() {
    let h = enabled(FakeTranslator::new().failing("你好"), "你好").await;

    h.input.handle_key(h.paragraph, &KeyPress::enter());
    wait_until(|| !h.hints.shown().is_empty()).await;

    assert_eq!(h.hints.shown(), vec![(HintKind::Error, "Translation failed".to_string())]);
    assert_eq!(h.doc.text_content(h.compose).as_deref(), Some("你好"));
}

#[tokio::test(start_paused = true)]
async fn test_serial_queue_uses_cache() {
    let h = enabled(FakeTranslator::new().with("早", "Morning"), "早").await;

    h.input.submit(h.compose, "早".to_string());
    h.input.submit(h.compose, "早".to_string());
    assert_eq!(h.input.status().queue_length, 2);

    wait_until(|| !h.input.status().is_processing).await;
    assert_eq!(h.translator.call_count(), 1);
    assert_eq!(h.hints.shown().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_translation_is_not_written_back() {
    let h = enabled(FakeTranslator::new().with("好", "好"), "好").await;

    h.input.handle_key(h.paragraph, &KeyPress::enter());
    wait_until(|| !h.input.status().is_processing).await;

    assert!(h.hints.shown().is_empty());
    assert!(h.doc.select("span[data-lexical-text]").unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_compose_box_without_paragraph() {
    let h = enabled(FakeTranslator::new().with("谢谢", "Thanks"), "").await;
    h.doc.remove_node(h.paragraph);
    h.doc.set_text_content(h.compose, "谢谢");

    assert_eq!(h.input.handle_key(h.compose, &KeyPress::enter()), KeyAction::Intercept);
    wait_until(|| h.doc.text_content(h.compose).as_deref() == Some("Thanks")).await;
}

#[tokio::test]
async fn test_stop_disables() {
    let h = enabled(FakeTranslator::new(), "你好").await;
    h.input.stop();

    let status = h.input.status();
    assert!(!status.running);
    assert!(!status.enabled);
    assert_eq!(h.input.handle_key(h.paragraph, &KeyPress::enter()), KeyAction::PassThrough);
}
