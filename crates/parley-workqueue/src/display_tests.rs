use super::*;
use parley_config::SelectorsConfig;
use parley_core::HostSelectors;
use parley_dom::MemoryDocument;

fn message(text: &str) -> NodeSpec {
    NodeSpec::element("div").class("message-in").child(
        NodeSpec::element("div").class("bubble").child(
            NodeSpec::element("div")
                .class("copyable-text")
                .child(NodeSpec::element("span").attr("dir", "ltr").text(text)),
        ),
    )
}

fn setup(messages: Vec<NodeSpec>) -> (Arc<MemoryDocument>, DomAnnotator) {
    let mut list = NodeSpec::element("div").class("message-list");
    list.children = messages;
    let doc = Arc::new(MemoryDocument::new(
        &NodeSpec::element("body").child(NodeSpec::element("div").attr("id", "main").child(list)),
    ));
    let extractor = MessageExtractor::new(Arc::new(
        HostSelectors::from_config(&SelectorsConfig::default()).unwrap(),
    ));
    let annotator = DomAnnotator::new(doc.clone(), extractor);
    (doc, annotator)
}

#[test]
fn test_display_appends_after_copyable_text() {
    let (doc, annotator) = setup(vec![message("你好")]);
    let node = doc.select_first("div.message-in").unwrap();

    annotator.display(node, "Hello").unwrap();

    let annotation = doc.select_first(".parley-translation-result").unwrap();
    assert_eq!(doc.text_content(annotation).as_deref(), Some("🔄 Hello"));
    let bubble = doc.select_first("div.bubble").unwrap();
    assert_eq!(doc.parent(annotation), Some(bubble));
    assert_eq!(doc.attribute(node, "data-translated").as_deref(), Some("true"));
}

#[test]
fn test_display_replaces_existing_annotation() {
    let (doc, annotator) = setup(vec![message("你好")]);
    let node = doc.select_first("div.message-in").unwrap();

    annotator.display(node, "Hello").unwrap();
    annotator.display(node, "Hi").unwrap();

    let annotations = doc.select(".parley-translation-result").unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(doc.text_content(annotations[0]).as_deref(), Some("🔄 Hi"));
}

#[test]
fn test_display_without_copyable_wrapper_uses_text_parent() {
    let (doc, annotator) = setup(vec![NodeSpec::element("div").class("message-out").child(
        NodeSpec::element("p").child(NodeSpec::element("span").class("message-text").text("ciao")),
    )]);
    let node = doc.select_first("div.message-out").unwrap();

    annotator.display(node, "hello").unwrap();

    let annotation = doc.select_first(".parley-translation-result").unwrap();
    let paragraph = doc.select_first("p").unwrap();
    assert_eq!(doc.parent(annotation), Some(paragraph));
}

#[test]
fn test_display_on_detached_element_fails() {
    let (doc, annotator) = setup(vec![message("你好")]);
    let node = doc.select_first("div.message-in").unwrap();
    doc.remove_node(node);

    let err = annotator.display(node, "Hello").unwrap_err();
    assert!(matches!(err, QueueError::Detached(n) if n == node));
}

#[test]
fn test_display_without_text_has_no_insert_point() {
    let (doc, annotator) = setup(vec![NodeSpec::element("div")
        .class("message-in")
        .child(NodeSpec::element("img").attr("src", "x.png"))]);
    let node = doc.select_first("div.message-in").unwrap();

    let err = annotator.display(node, "Hello").unwrap_err();
    assert!(matches!(err, QueueError::NoInsertPoint(_)));
    assert!(doc.attribute(node, "data-translated").is_none());
}

#[test]
fn test_clear_all_removes_every_annotation() {
    let (doc, annotator) = setup(vec![message("一"), message("二")]);
    for node in doc.select("div.message-in").unwrap() {
        annotator.display(node, "x").unwrap();
    }

    assert_eq!(annotator.clear_all(), 2);
    assert!(doc.select(".parley-translation-result").unwrap().is_empty());
    assert_eq!(annotator.clear_all(), 0);
}

#[test]
fn test_pending_reapply_lists_translated_messages_without_annotation() {
    let (doc, annotator) = setup(vec![message("一"), message("二"), message("三")]);
    let nodes = doc.select("div.message-in").unwrap();
    annotator.display(nodes[0], "one").unwrap();
    annotator.display(nodes[1], "two").unwrap();

    let annotation = doc.select(".parley-translation-result").unwrap()[1];
    doc.remove_node(annotation);

    assert_eq!(annotator.pending_reapply(), vec![(nodes[1], "二".to_string())]);
}

#[test]
fn test_reapply_keeps_single_annotation() {
    let (doc, annotator) = setup(vec![message("一")]);
    let node = doc.select_first("div.message-in").unwrap();
    annotator.display(node, "one").unwrap();
    annotator.clear_all();

    for (pending, _) in annotator.pending_reapply() {
        annotator.display(pending, "one").unwrap();
    }
    annotator.display(node, "one").unwrap();

    assert_eq!(doc.select(".parley-translation-result").unwrap().len(), 1);
    assert!(annotator.pending_reapply().is_empty());
}
