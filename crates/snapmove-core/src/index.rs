//! Static spatial index of snap reference points.
//!
//! Built once when a move session starts and read-only afterwards. Objects
//! are inserted at full vertex resolution while they fit the vertex budget;
//! an object that would overflow it contributes its 8 bounding-box corners
//! plus its origin instead.

use crate::geometry::{Axis, MovingSelection, ObjectId, ReferenceGeometry};
use glam::DVec3;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Points contributed by an object that overflowed the budget.
pub const BOUNDS_POINTS_PER_OBJECT: usize = 9;

/// Where a reference point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    /// A real mesh vertex.
    Vertex,
    /// A bounding-box corner or object origin (budget fallback).
    Bounds,
}

/// A reference point in the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialPoint {
    pub position: DVec3,
    pub object: ObjectId,
    pub kind: PointKind,
}

/// One entry of a coordinate-sorted axis array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisEntry {
    pub value: f64,
    /// Index into the point pool.
    pub point: usize,
}

/// What the build produced, for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub point_count: usize,
    /// Raw vertices inserted at full resolution.
    pub source_vertex_count: usize,
    pub limit_exceeded: bool,
    /// Objects that fell back to bounding-box points.
    pub bounds_objects: Vec<ObjectId>,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.limit_exceeded {
            write!(f, "Limit exceeded: Switched to Box Mode")
        } else {
            write!(f, "Vertices in tree: {}", self.source_vertex_count)
        }
    }
}

/// The point pool, its k-d tree, the sorted axis arrays and the exclusion set.
pub struct SpatialIndex {
    points: Vec<SpatialPoint>,
    names: HashMap<ObjectId, String>,
    tree: Option<ImmutableKdTree<f64, 3>>,
    axes: [Vec<AxisEntry>; 3],
    excluded: HashSet<usize>,
    summary: BuildSummary,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.points.len())
            .field("excluded", &self.excluded.len())
            .field("summary", &self.summary)
            .finish()
    }
}

impl SpatialIndex {
    /// An index with no points. Every query returns nothing.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            names: HashMap::new(),
            tree: None,
            axes: [Vec::new(), Vec::new(), Vec::new()],
            excluded: HashSet::new(),
            summary: BuildSummary::default(),
        }
    }

    /// Build the index from objects ordered nearest-first.
    ///
    /// Insertion is all-or-nothing per object: an object is inserted at full
    /// resolution only if all of its vertices fit in the remaining budget.
    /// Later, smaller objects may still fit after an earlier one overflowed.
    ///
    /// Points of `moving` are recorded in the exclusion set: every point of
    /// the object in whole-object mode, only the selected vertices otherwise.
    pub fn build<O: ReferenceGeometry>(
        objects: &[&O],
        vertex_budget: usize,
        moving: Option<&MovingSelection>,
    ) -> Self {
        let mut points: Vec<SpatialPoint> = Vec::new();
        let mut names = HashMap::new();
        let mut excluded = HashSet::new();
        let mut inserted = 0usize;
        let mut bounds_objects = Vec::new();

        for obj in objects {
            let id = obj.id();
            names.entry(id).or_insert_with(|| obj.name().to_string());
            let vertex_count = obj.vertex_count();
            let moving = moving.filter(|m| m.object == id);
            let start = points.len();

            if inserted + vertex_count <= vertex_budget {
                points.extend(obj.world_vertices().map(|position| SpatialPoint {
                    position,
                    object: id,
                    kind: PointKind::Vertex,
                }));
                if let Some(sel) = moving {
                    match &sel.vertices {
                        Some(indices) => excluded.extend(
                            indices
                                .iter()
                                .map(|i| start + i)
                                .filter(|&i| i < points.len()),
                        ),
                        None => excluded.extend(start..points.len()),
                    }
                }
                inserted += vertex_count;
            } else {
                log::debug!(
                    "'{}' ({} vertices) exceeds remaining budget {}, using bounds",
                    obj.name(),
                    vertex_count,
                    vertex_budget.saturating_sub(inserted)
                );
                bounds_objects.push(id);
                points.extend(
                    obj.bound_corners()
                        .into_iter()
                        .chain(std::iter::once(obj.translation()))
                        .map(|position| SpatialPoint {
                            position,
                            object: id,
                            kind: PointKind::Bounds,
                        }),
                );
                if moving.is_some_and(|sel| !sel.is_partial()) {
                    excluded.extend(start..points.len());
                }
            }
        }

        let summary = BuildSummary {
            point_count: points.len(),
            source_vertex_count: inserted,
            limit_exceeded: !bounds_objects.is_empty(),
            bounds_objects,
        };
        if summary.limit_exceeded {
            log::warn!(
                "Vertex budget {} exceeded, {} object(s) reduced to bounds",
                vertex_budget,
                summary.bounds_objects.len()
            );
        }

        if points.is_empty() {
            return Self {
                names,
                summary,
                ..Self::empty()
            };
        }

        let entries: Vec<[f64; 3]> = points.iter().map(|p| p.position.to_array()).collect();
        let tree = ImmutableKdTree::new_from_slice(&entries);
        let axes = Axis::ALL.map(|axis| sorted_axis(&points, axis));

        log::debug!(
            "Built spatial index: {} points, {} excluded",
            points.len(),
            excluded.len()
        );

        Self {
            points,
            names,
            tree: Some(tree),
            axes,
            excluded,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SpatialPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&SpatialPoint> {
        self.points.get(index)
    }

    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Display name of an object that contributed points.
    pub fn object_name(&self, id: ObjectId) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        self.excluded.contains(&index)
    }

    pub fn excluded(&self) -> &HashSet<usize> {
        &self.excluded
    }

    /// The full sorted array for one axis.
    pub fn axis_entries(&self, axis: Axis) -> &[AxisEntry] {
        &self.axes[axis.index()]
    }

    /// Entries of the axis array with `min <= value < max`.
    pub fn axis_range(&self, axis: Axis, min: f64, max: f64) -> &[AxisEntry] {
        let entries = self.axis_entries(axis);
        let lo = entries.partition_point(|e| e.value < min);
        let hi = entries.partition_point(|e| e.value < max);
        if lo >= hi { &[] } else { &entries[lo..hi] }
    }

    /// Pool indices within `radius` of `center`, with their world distance.
    /// Unordered.
    pub fn within_radius(&self, center: DVec3, radius: f64) -> Vec<(usize, f64)> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        tree.within_unsorted::<SquaredEuclidean>(&center.to_array(), radius * radius)
            .into_iter()
            .map(|n| (n.item as usize, n.distance.sqrt()))
            .collect()
    }
}

fn sorted_axis(points: &[SpatialPoint], axis: Axis) -> Vec<AxisEntry> {
    let mut entries: Vec<AxisEntry> = points
        .iter()
        .enumerate()
        .map(|(point, p)| AxisEntry {
            value: axis.component(p.position),
            point,
        })
        .collect();
    entries.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.point.cmp(&b.point)));
    entries
}
