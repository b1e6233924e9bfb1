//! Scene state saved on start and restored on stop.

use std::collections::{BTreeMap, HashMap};

use crate::world::{Camera, Material, ObjectId, Scene, Transform};

#[derive(Debug, Clone, PartialEq)]
struct SavedObject {
    transform: Transform,
    material: Material,
    visible: bool,
    collidable: bool,
    locals: HashMap<String, f64>,
}

/// Editable object state captured before play.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    objects: BTreeMap<ObjectId, SavedObject>,
    camera: Option<Camera>,
}

impl SceneSnapshot {
    pub fn capture(scene: &dyn Scene) -> Self {
        let objects = scene
            .object_ids()
            .into_iter()
            .filter_map(|id| {
                let o = scene.object(id)?;
                Some((
                    id,
                    SavedObject {
                        transform: o.transform,
                        material: o.material,
                        visible: o.visible,
                        collidable: o.collidable,
                        locals: o.locals.clone(),
                    },
                ))
            })
            .collect();
        Self {
            objects,
            camera: Some(*scene.camera()),
        }
    }

    /// Put every captured object and the camera back.
    pub fn restore(&self, scene: &mut dyn Scene) {
        for (&id, saved) in &self.objects {
            if let Some(object) = scene.object_mut(id) {
                object.transform = saved.transform;
                object.material = saved.material;
                object.visible = saved.visible;
                object.collidable = saved.collidable;
                object.locals = saved.locals.clone();
            }
        }
        if let Some(camera) = self.camera {
            *scene.camera_mut() = camera;
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
