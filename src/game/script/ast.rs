//! Compiled Script AST
//!
//! The block editor's compiler emits scripts as JSON trees. These types are
//! the runtime's read-only view of that output; they are lowered into
//! [`super::ops::Op`] trees when a session starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::ui::screens::UiScreenDef;
use crate::world::ObjectId;

/// Named parameters of a command or trigger.
pub type ParamMap = BTreeMap<String, Value>;

/// One command node as emitted by the block compiler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommand {
    pub code: String,
    #[serde(default)]
    pub values: ParamMap,
    #[serde(default)]
    pub children: Vec<RawCommand>,
    #[serde(default)]
    pub else_children: Vec<RawCommand>,
}

impl RawCommand {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            ..Default::default()
        }
    }

    /// Builder: add a parameter.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Builder: set the child block.
    pub fn with_children(mut self, children: Vec<RawCommand>) -> Self {
        self.children = children;
        self
    }

    /// Builder: set the else block.
    pub fn with_else(mut self, children: Vec<RawCommand>) -> Self {
        self.else_children = children;
        self
    }
}

/// A compiled event script: a trigger plus the commands it runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScript {
    pub trigger: String,
    #[serde(default)]
    pub trigger_values: ParamMap,
    #[serde(default)]
    pub commands: Vec<RawCommand>,
}

impl CompiledScript {
    pub fn new(trigger: &str, commands: Vec<RawCommand>) -> Self {
        Self {
            trigger: trigger.to_string(),
            trigger_values: ParamMap::new(),
            commands,
        }
    }

    /// Builder: add a trigger parameter.
    pub fn with_trigger_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.trigger_values.insert(key.to_string(), value.into());
        self
    }
}

/// Where the runtime gets its scripts from.
pub trait ScriptSource {
    /// Scripts attached to scene objects.
    fn object_scripts(&self) -> Vec<(ObjectId, &[CompiledScript])>;

    /// Scripts not attached to any object.
    fn global_scripts(&self) -> &[CompiledScript];

    /// User-declared variable names, initialized to zero at start.
    fn custom_variables(&self) -> &[String];

    /// Custom UI screen declarations.
    fn ui_screens(&self) -> &[UiScreenDef];
}

/// Scripts attached to one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectScripts {
    pub object: ObjectId,
    #[serde(default)]
    pub scripts: Vec<CompiledScript>,
}

/// Plain serializable [`ScriptSource`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptBundle {
    pub objects: Vec<ObjectScripts>,
    pub global: Vec<CompiledScript>,
    pub variables: Vec<String>,
    pub screens: Vec<UiScreenDef>,
}

impl ScriptBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a script to an object.
    pub fn attach(&mut self, object: ObjectId, script: CompiledScript) -> &mut Self {
        match self.objects.iter_mut().find(|o| o.object == object) {
            Some(entry) => entry.scripts.push(script),
            None => self.objects.push(ObjectScripts {
                object,
                scripts: vec![script],
            }),
        }
        self
    }

    /// Add a global script.
    pub fn add_global(&mut self, script: CompiledScript) -> &mut Self {
        self.global.push(script);
        self
    }
}

impl ScriptSource for ScriptBundle {
    fn object_scripts(&self) -> Vec<(ObjectId, &[CompiledScript])> {
        self.objects
            .iter()
            .map(|o| (o.object, o.scripts.as_slice()))
            .collect()
    }

    fn global_scripts(&self) -> &[CompiledScript] {
        &self.global
    }

    fn custom_variables(&self) -> &[String] {
        &self.variables
    }

    fn ui_screens(&self) -> &[UiScreenDef] {
        &self.screens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compiled_script() {
        let json = r#"{
            "trigger": "onKeyPress",
            "triggerValues": {"key": "space"},
            "commands": [
                {"code": "repeat", "values": {"times": 3}, "children": [
                    {"code": "changeVar", "values": {"name": "score", "amount": 1}}
                ]}
            ]
        }"#;
        let script: CompiledScript = serde_json::from_str(json).expect("valid script");
        assert_eq!(script.trigger, "onKeyPress");
        assert_eq!(script.commands[0].children.len(), 1);
        assert!(script.commands[0].else_children.is_empty());
    }

    #[test]
    fn test_bundle_groups_by_object() {
        let mut bundle = ScriptBundle::new();
        bundle
            .attach(ObjectId(1), CompiledScript::new("onStart", vec![]))
            .attach(ObjectId(1), CompiledScript::new("onClick", vec![]));
        let scripts = bundle.object_scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].1.len(), 2);
    }
}
