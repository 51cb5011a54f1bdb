//! Reference geometry as seen by the snapping core.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a scene object.
pub type ObjectId = Uuid;

/// A world coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All three axes in component order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Read this axis' component from a vector.
    pub fn component(self, v: DVec3) -> f64 {
        v[self.index()]
    }

    /// Copy `v` with this axis' component replaced by `value`.
    pub fn with_component(self, v: DVec3, value: f64) -> DVec3 {
        let mut out = v;
        out[self.index()] = value;
        out
    }

    /// Single-letter label for display.
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    /// Parse a single-letter axis name (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "X" | "x" => Some(Axis::X),
            "Y" | "y" => Some(Axis::Y),
            "Z" | "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// The geometry a move session drags around.
///
/// `vertices == None` moves the whole object; `Some(set)` moves only the
/// listed vertices of the object (edit mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingSelection {
    pub object: ObjectId,
    #[serde(default)]
    pub vertices: Option<BTreeSet<usize>>,
}

impl MovingSelection {
    /// Move the whole object.
    pub fn whole(object: ObjectId) -> Self {
        Self {
            object,
            vertices: None,
        }
    }

    /// Move only the given vertices of the object.
    pub fn vertices(object: ObjectId, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            object,
            vertices: Some(indices.into_iter().collect()),
        }
    }

    /// Whether only a subset of the object's vertices is moving.
    pub fn is_partial(&self) -> bool {
        self.vertices.is_some()
    }
}

/// Read access to one reference object.
///
/// Vertex positions are stored in object-local space; `to_world` and
/// `delta_to_local` convert between the two.
pub trait ReferenceGeometry {
    fn id(&self) -> ObjectId;

    fn name(&self) -> &str;

    fn vertex_count(&self) -> usize;

    fn local_vertex(&self, index: usize) -> Option<DVec3>;

    /// World-space origin of the object.
    fn translation(&self) -> DVec3;

    /// The 8 world-space corners of the object's bounding box.
    fn bound_corners(&self) -> [DVec3; 8];

    fn to_world(&self, local: DVec3) -> DVec3;

    /// Convert a world-space translation into the object's local frame.
    fn delta_to_local(&self, world_delta: DVec3) -> DVec3;

    fn world_vertex(&self, index: usize) -> Option<DVec3> {
        self.local_vertex(index).map(|v| self.to_world(v))
    }

    fn world_vertices(&self) -> impl Iterator<Item = DVec3> + '_ {
        (0..self.vertex_count()).filter_map(move |i| self.world_vertex(i))
    }

    /// World-space bounding-box center.
    fn center(&self) -> DVec3 {
        self.bound_corners().iter().copied().sum::<DVec3>() / 8.0
    }
}

/// The 8 corners of an axis-aligned box, in the order min..max per axis.
pub fn box_corners(min: DVec3, max: DVec3) -> [DVec3; 8] {
    [
        DVec3::new(min.x, min.y, min.z),
        DVec3::new(min.x, min.y, max.z),
        DVec3::new(min.x, max.y, max.z),
        DVec3::new(min.x, max.y, min.z),
        DVec3::new(max.x, min.y, min.z),
        DVec3::new(max.x, min.y, max.z),
        DVec3::new(max.x, max.y, max.z),
        DVec3::new(max.x, max.y, min.z),
    ]
}

/// Componentwise bounds of a point set, `None` when empty.
pub fn bounds_of(points: impl IntoIterator<Item = DVec3>) -> Option<(DVec3, DVec3)> {
    points.into_iter().fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })
}
