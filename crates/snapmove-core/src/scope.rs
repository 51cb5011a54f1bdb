//! In-memory scene and target-scope resolution.
//!
//! Scope resolution decides which objects feed the spatial index and in what
//! order. Objects come back sorted nearest-first from the active object's
//! center so that, when the vertex budget runs out, the farthest geometry is
//! the first to degrade to bounding boxes.

use crate::geometry::{ObjectId, ReferenceGeometry, bounds_of, box_corners};
use crate::session::{ElementPositions, SceneHost};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Scene loading errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scene parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Collection '{collection}' references unknown object '{object}'")]
    UnknownMember { collection: String, object: String },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Which objects are eligible snap targets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScopeMode {
    /// Only the active object itself.
    #[serde(rename = "SELF")]
    SelfOnly,
    /// Selected objects other than the active one.
    #[serde(rename = "SELECTED")]
    Selected,
    /// Every visible object, the active one included.
    #[default]
    #[serde(rename = "VISIBLE")]
    Visible,
    /// Members of a named collection.
    #[serde(rename = "COLLECTION")]
    Collection(String),
}

/// A mesh object: local vertices placed at a world location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(default = "Uuid::new_v4")]
    pub id: ObjectId,
    pub name: String,
    pub location: DVec3,
    /// Vertex positions relative to `location`.
    #[serde(default)]
    pub vertices: Vec<DVec3>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl SceneObject {
    pub fn new(name: impl Into<String>, location: DVec3, vertices: Vec<DVec3>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            vertices,
            visible: true,
        }
    }

    /// A 2x2x2 cube (8 vertices) centered on `location`.
    pub fn cube(name: impl Into<String>, location: DVec3) -> Self {
        let vertices = box_corners(DVec3::splat(-1.0), DVec3::splat(1.0)).to_vec();
        Self::new(name, location, vertices)
    }

    /// A flat `x_count` by `y_count` vertex grid spanning `size` units.
    pub fn grid(name: impl Into<String>, location: DVec3, x_count: usize, y_count: usize, size: f64) -> Self {
        let step_x = if x_count > 1 { size / (x_count - 1) as f64 } else { 0.0 };
        let step_y = if y_count > 1 { size / (y_count - 1) as f64 } else { 0.0 };
        let half = size / 2.0;
        let mut vertices = Vec::with_capacity(x_count * y_count);
        for iy in 0..y_count {
            for ix in 0..x_count {
                vertices.push(DVec3::new(
                    ix as f64 * step_x - half,
                    iy as f64 * step_y - half,
                    0.0,
                ));
            }
        }
        Self::new(name, location, vertices)
    }
}

impl ReferenceGeometry for SceneObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn local_vertex(&self, index: usize) -> Option<DVec3> {
        self.vertices.get(index).copied()
    }

    fn translation(&self) -> DVec3 {
        self.location
    }

    fn bound_corners(&self) -> [DVec3; 8] {
        let (min, max) = bounds_of(self.vertices.iter().copied()).unwrap_or((DVec3::ZERO, DVec3::ZERO));
        box_corners(min, max).map(|c| self.to_world(c))
    }

    fn to_world(&self, local: DVec3) -> DVec3 {
        local + self.location
    }

    fn delta_to_local(&self, world_delta: DVec3) -> DVec3 {
        world_delta
    }
}

/// A flat scene: objects, a selection and named collections.
///
/// Selection and collection membership refer to objects by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub collections: HashMap<String, Vec<String>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene from JSON and check collection membership.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let scene: Scene = serde_json::from_str(json)?;
        for (collection, members) in &scene.collections {
            if let Some(missing) = members.iter().find(|m| scene.find_by_name(m).is_none()) {
                return Err(SceneError::UnknownMember {
                    collection: collection.clone(),
                    object: missing.clone(),
                });
            }
        }
        Ok(scene)
    }

    /// Load a scene from a JSON file.
    pub fn load(path: &Path) -> SceneResult<Self> {
        let json = fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        log::info!("Loaded scene with {} objects from {:?}", scene.objects.len(), path);
        Ok(scene)
    }

    /// Add an object and return its ID.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Add an object to the selection.
    pub fn select(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.selected.contains(&name) {
            self.selected.push(name);
        }
    }

    /// Put an object into a named collection, creating it if needed.
    pub fn link_to_collection(&mut self, collection: impl Into<String>, name: impl Into<String>) {
        let members = self.collections.entry(collection.into()).or_default();
        let name = name.into();
        if !members.contains(&name) {
            members.push(name);
        }
    }

    /// Objects matching `scope`, nearest to `active` first.
    ///
    /// Distance is measured between bounding-box centers. When the active
    /// object is unknown the first matching object serves as the origin.
    pub fn resolve_scope(&self, active: ObjectId, scope: &ScopeMode) -> Vec<&SceneObject> {
        let active_obj = self.object(active);
        let mut targets: Vec<&SceneObject> = match scope {
            ScopeMode::SelfOnly => active_obj.into_iter().collect(),
            ScopeMode::Selected => self
                .objects
                .iter()
                .filter(|o| o.id != active && self.selected.contains(&o.name))
                .collect(),
            ScopeMode::Visible => self.objects.iter().filter(|o| o.visible).collect(),
            ScopeMode::Collection(name) => match self.collections.get(name) {
                Some(members) => self
                    .objects
                    .iter()
                    .filter(|o| members.contains(&o.name))
                    .collect(),
                None => {
                    log::debug!("Unknown collection '{}', scope is empty", name);
                    Vec::new()
                }
            },
        };

        let origin = active_obj
            .or_else(|| targets.first().copied())
            .map(|o| o.center());
        if let Some(origin) = origin {
            targets.sort_by(|a, b| {
                a.center()
                    .distance_squared(origin)
                    .total_cmp(&b.center().distance_squared(origin))
            });
        }
        targets
    }
}

impl SceneHost for Scene {
    type Object = SceneObject;

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        Scene::object(self, id)
    }

    fn scope_objects(&self, active: ObjectId, scope: &ScopeMode) -> Vec<&SceneObject> {
        self.resolve_scope(active, scope)
    }

    fn apply_position(&mut self, object: ObjectId, positions: &ElementPositions) {
        let Some(obj) = self.object_mut(object) else {
            log::warn!("apply_position: unknown object {}", object);
            return;
        };
        match positions {
            ElementPositions::Object(location) => obj.location = *location,
            ElementPositions::Vertices(vertices) => {
                for &(index, local) in vertices {
                    if let Some(v) = obj.vertices.get_mut(index) {
                        *v = local;
                    }
                }
            }
        }
    }
}
