//! Project Files
//!
//! A project bundles a scene, its compiled scripts and play settings in one
//! JSON document, plus an optional input playback track used by the headless
//! runner. Every section is optional and falls back to its default.
//!
//! ```json
//! {
//!   "objects": [{ "id": 0, "name": "coin", "kind": "coin", "transform": { "position": [0, 1, -4] } }],
//!   "scripts": { "objects": [{ "object": 0, "scripts": [{ "trigger": "onStart", "commands": [{ "code": "spin" }] }] }] },
//!   "settings": { "scheme": "third-person", "seed": 7 },
//!   "playback": [{ "frame": 30, "keyDown": "space" }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::config::PlaySettings;
use crate::game::error::ProjectError;
use crate::game::script::ast::ScriptBundle;
use crate::input::KeyCode;
use crate::world::{Camera, Heightmap, MemoryScene, SceneObject};

/// One scripted host input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackInput {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Normalized screen coordinates
    Click([f32; 2]),
    MouseMotion([f32; 2]),
    Fire,
    AcknowledgeDialog,
}

/// Input delivered before the given frame's update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub input: PlaybackInput,
}

/// Everything needed to enter play mode without the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub objects: Vec<SceneObject>,
    pub terrain: Option<Heightmap>,
    pub camera: Camera,
    pub scripts: ScriptBundle,
    pub settings: PlaySettings,
    pub playback: Vec<PlaybackEvent>,
}

impl ProjectFile {
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let mut project: ProjectFile = serde_json::from_str(text)?;
        project.playback.sort_by_key(|event| event.frame);
        Ok(project)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let project = Self::from_json(&text)?;
        tracing::debug!(
            "loaded project {}: {} object(s), {} playback event(s)",
            path.display(),
            project.objects.len(),
            project.playback.len()
        );
        Ok(project)
    }

    /// Split into an in-memory scene, scripts and settings.
    pub fn into_parts(self) -> (MemoryScene, ScriptBundle, PlaySettings, Vec<PlaybackEvent>) {
        let scene = MemoryScene::from_objects(self.objects, self.terrain, self.camera);
        (scene, self.scripts, self.settings, self.playback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ControlScheme;
    use crate::world::{ObjectId, ObjectKind, Scene};

    #[test]
    fn test_minimal_project() {
        let project = ProjectFile::from_json(
            r#"{
                "objects": [
                    { "id": 3, "name": "coin", "kind": "coin", "transform": { "position": [0, 1, -4] } }
                ],
                "settings": { "scheme": "third-person" },
                "playback": [
                    { "frame": 30, "keyUp": "space" },
                    { "frame": 10, "keyDown": "space" }
                ]
            }"#,
        )
        .expect("valid project");

        assert_eq!(project.settings.scheme, ControlScheme::ThirdPerson);
        assert_eq!(project.playback[0].frame, 10);
        assert_eq!(project.playback[0].input, PlaybackInput::KeyDown(KeyCode::Space));

        let (scene, _, _, _) = project.into_parts();
        let coin = scene.object(ObjectId(3)).expect("coin");
        assert_eq!(coin.kind, ObjectKind::Coin);
        assert!(coin.visible);
    }

    #[test]
    fn test_malformed_project_is_json_error() {
        assert!(matches!(ProjectFile::from_json("{ nope"), Err(ProjectError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ProjectFile::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ProjectError::Io { .. })));
    }
}
