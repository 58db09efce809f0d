//! Fixture replay for parley.
//!
//! A fixture is a page plus a script of host changes and user actions. The
//! replay builds the page in memory, runs a full session with the compose-box
//! queue next to it, applies the script and reports where things ended up.
//!
//! ```json
//! {
//!   "document": { "tag": "body", "children": [ ... ] },
//!   "translations": { "hola": "你好" },
//!   "steps": [
//!     { "action": "append", "parent": "div.message-list", "node": { ... } },
//!     { "action": "flush" },
//!     { "action": "wait", "ms": 1500 }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use parley_config::Config;
use parley_core::{HostSelectors, MessageExtractor};
use parley_dom::{HostDocument, MemoryDocument, NodeSpec};
use parley_translate::{TranslateError, Translator};
use parley_watch::{Session, SessionStatus, SwitchPhase};
use parley_workqueue::{
    DomAnnotator, DomHints, InputQueue, InputStatus, KeyAction, KeyPress, QueueOptions, TranslationQueue,
};

use crate::stores::Stores;

/// A recorded page and what happens to it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Fixture {
    pub document: NodeSpec,

    /// Answers used by `--offline`.
    #[serde(default)]
    pub translations: HashMap<String, String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One scripted change or action. Targets are selector text.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum Step {
    Append { parent: String, node: NodeSpec },
    ReplaceChildren { parent: String, nodes: Vec<NodeSpec> },
    Remove { target: String },
    SetText { target: String, text: String },
    /// Deliver pending mutation records.
    Flush,
    Scroll,
    /// Flush, then let time pass.
    Wait { ms: u64 },
    ToggleTranslation,
    ToggleInput,
    ResetMarkers,
    Key {
        target: String,
        #[serde(default)]
        shift: bool,
    },
}

/// Where a replay ended up.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReplayReport {
    pub annotations: Vec<String>,
    pub key_actions: Vec<String>,
    pub session: SessionStatus,
    pub input: InputStatus,
    #[serde(skip)]
    pub outline: String,
}

/// Translator answering from the fixture.
struct FixtureTranslator {
    translations: HashMap<String, String>,
}

#[async_trait]
impl Translator for FixtureTranslator {
    fn id(&self) -> &str {
        "fixture"
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
        self.translations
            .get(text)
            .cloned()
            .ok_or_else(|| TranslateError::Network(format!("no fixture translation for '{}'", text)))
    }
}

pub(crate) fn load_fixture(path: &Path) -> Result<Fixture, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Handle the replay subcommand.
pub(crate) async fn handle_replay(
    config: &Config,
    fixture_path: &Path,
    offline: bool,
    render: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = load_fixture(fixture_path)?;
    let translator: Arc<dyn Translator> = if offline {
        Arc::new(FixtureTranslator {
            translations: fixture.translations.clone(),
        })
    } else {
        parley_translate::build_translator(&config.translation)?
    };

    let stores = Stores::open(&config.storage).await?;
    let report = run(config, &stores, translator, &fixture).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if render {
        println!("{}", report.outline);
    }
    Ok(())
}

/// Replay `fixture` against fresh pipeline components.
pub(crate) async fn run(
    config: &Config,
    stores: &Stores,
    translator: Arc<dyn Translator>,
    fixture: &Fixture,
) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let doc = Arc::new(MemoryDocument::new(&fixture.document));
    let selectors = Arc::new(HostSelectors::from_config(&config.selectors)?);
    let extractor = MessageExtractor::new(selectors.clone());

    let display = Arc::new(DomAnnotator::new(doc.clone(), extractor.clone()));
    let queue = TranslationQueue::new(
        stores.message_store(config).await,
        translator.clone(),
        display,
        QueueOptions::from_config(&config.queue, &config.translation),
    );
    let session = Session::new(doc.clone(), extractor, queue, config.watcher.clone());

    let hints = Arc::new(DomHints::new(doc.clone(), config.input.hint_duration()));
    let input = InputQueue::new(
        doc.clone(),
        selectors,
        stores.input_store(config).await,
        stores.kv.clone(),
        translator,
        hints,
        config.input.clone(),
    );

    let queued = session.start()?;
    input.start().await;
    info!("Replay started, {} messages on the page", queued);

    let mut key_actions = Vec::new();
    for (index, step) in fixture.steps.iter().enumerate() {
        debug!("Replay step {}: {:?}", index, step);
        apply(&doc, &session, &input, step, &mut key_actions).await?;
    }

    doc.flush();
    wait_idle(&session, &input).await;

    let annotations = doc
        .select(".parley-translation-result")?
        .into_iter()
        .filter_map(|node| doc.text_content(node))
        .collect();
    let report = ReplayReport {
        annotations,
        key_actions,
        session: session.status(),
        input: input.status(),
        outline: doc.render(),
    };

    session.stop();
    input.stop();
    Ok(report)
}

async fn apply(
    doc: &MemoryDocument,
    session: &Session,
    input: &InputQueue,
    step: &Step,
    key_actions: &mut Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    match step {
        Step::Append { parent, node } => {
            doc.append_element(doc.select_first(parent)?, node);
        }
        Step::ReplaceChildren { parent, nodes } => {
            doc.replace_children(doc.select_first(parent)?, nodes);
        }
        Step::Remove { target } => {
            doc.remove_node(doc.select_first(target)?);
        }
        Step::SetText { target, text } => {
            doc.set_text_content(doc.select_first(target)?, text);
        }
        Step::Flush => {
            doc.flush();
        }
        Step::Scroll => session.on_scroll(),
        Step::Wait { ms } => {
            doc.flush();
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        Step::ToggleTranslation => {
            session.toggle_translation();
        }
        Step::ToggleInput => {
            input.toggle_enabled().await;
        }
        Step::ResetMarkers => {
            session.reset_markers();
        }
        Step::Key { target, shift } => {
            let press = if *shift { KeyPress::shift_enter() } else { KeyPress::enter() };
            let action = input.handle_key(doc.select_first(target)?, &press);
            key_actions.push(
                match action {
                    KeyAction::Intercept => "intercept",
                    KeyAction::PassThrough => "pass_through",
                }
                .to_string(),
            );
        }
    }
    Ok(())
}

/// Wait until neither queue has work left, giving up after a while.
async fn wait_idle(session: &Session, input: &InputQueue) {
    for _ in 0..600 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let status = session.status();
        let busy = status.queue_length > 0
            || status.is_processing
            || status.phase == SwitchPhase::SwitchPending
            || input.status().is_processing;
        if !busy {
            return;
        }
    }
    info!("Replay still busy, reporting current state");
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
