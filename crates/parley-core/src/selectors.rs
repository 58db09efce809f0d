//! Compiled host page selectors.

use parley_config::SelectorsConfig;
use parley_dom::SelectorSet;

use crate::error::CoreError;

/// Every selector list from [`SelectorsConfig`], parsed once.
#[derive(Debug, Clone)]
pub struct HostSelectors {
    pub app_root: SelectorSet,
    pub containers: SelectorSet,
    pub messages: SelectorSet,
    pub text: SelectorSet,
    pub conversation_roots: SelectorSet,
    pub compose_box: SelectorSet,
}

impl HostSelectors {
    pub fn from_config(config: &SelectorsConfig) -> Result<Self, CoreError> {
        Ok(Self {
            app_root: compile("app_root", &config.app_root)?,
            containers: compile("containers", &config.containers)?,
            messages: compile("messages", &config.messages)?,
            text: compile("text", &config.text)?,
            conversation_roots: compile("conversation_roots", &config.conversation_roots)?,
            compose_box: compile("compose_box", &config.compose_box)?,
        })
    }
}

fn compile(field: &'static str, sources: &[String]) -> Result<SelectorSet, CoreError> {
    SelectorSet::parse(sources).map_err(|source| CoreError::Selector { field, source })
}
