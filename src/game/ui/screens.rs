//! Custom UI screens declared alongside the scripts.
//!
//! A screen is a named list of text labels and buttons. Scripts show and hide
//! screens by name; pressing a button broadcasts its message.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiElement {
    Text {
        text: String,
    },
    Button {
        label: String,
        /// Message broadcast when pressed
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiScreenDef {
    pub name: String,
    pub elements: Vec<UiElement>,
}

/// Declared screens and which of them are visible.
#[derive(Debug, Default)]
pub struct UiScreens {
    defs: Vec<UiScreenDef>,
    visible: BTreeSet<String>,
}

impl UiScreens {
    pub fn new(defs: Vec<UiScreenDef>) -> Self {
        Self { defs, visible: BTreeSet::new() }
    }

    /// Show a declared screen. Unknown names are ignored.
    pub fn show(&mut self, name: &str) -> bool {
        if !self.defs.iter().any(|d| d.name == name) {
            tracing::trace!("showScreen: no screen named {:?}", name);
            return false;
        }
        self.visible.insert(name.to_string())
    }

    pub fn hide(&mut self, name: &str) -> bool {
        self.visible.remove(name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    /// Visible screens in name order.
    pub fn visible(&self) -> Vec<&UiScreenDef> {
        self.visible
            .iter()
            .filter_map(|name| self.defs.iter().find(|d| &d.name == name))
            .collect()
    }

    /// Press the `index`th button of a visible screen; returns its message.
    pub fn press_button(&self, screen: &str, index: usize) -> Option<String> {
        if !self.is_visible(screen) {
            return None;
        }
        self.defs
            .iter()
            .find(|d| d.name == screen)?
            .elements
            .iter()
            .filter_map(|e| match e {
                UiElement::Button { message, .. } => Some(message.clone()),
                UiElement::Text { .. } => None,
            })
            .nth(index)
            .filter(|m| !m.is_empty())
    }
}
