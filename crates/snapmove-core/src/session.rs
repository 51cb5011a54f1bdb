//! Interactive snap-move session.
//!
//! A [`SnapSession`] is created when a move starts, fed one [`SnapEvent`] at a
//! time, and ends confirmed or cancelled. The spatial index is built once in
//! [`SnapSession::start`] and dropped when the session ends.

use crate::camera::Projector;
use crate::config::SnapConfig;
use crate::geometry::{Axis, MovingSelection, ObjectId, ReferenceGeometry};
use crate::index::{BuildSummary, SpatialIndex};
use crate::scope::ScopeMode;
use crate::snap::{
    AxisFlags, BlendParams, CandidateKind, SnapCandidate, blend_position, find_axis_candidates,
    find_candidates,
};
use glam::DVec3;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a session could not start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No moving geometry")]
    NoMovingGeometry,
    #[error("Unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("Select at least one vertex")]
    NoSelectedVertices,
    #[error("Could not resolve projection")]
    UnresolvedProjection,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Movement restriction to one axis or one plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    #[default]
    None,
    X,
    Y,
    Z,
    XY,
    XZ,
    YZ,
}

impl Constraint {
    /// Constraint to the given axis.
    pub fn axis(axis: Axis) -> Self {
        match axis {
            Axis::X => Constraint::X,
            Axis::Y => Constraint::Y,
            Axis::Z => Constraint::Z,
        }
    }

    /// Constraint to the plane orthogonal to the given axis.
    pub fn plane(axis: Axis) -> Self {
        match axis {
            Axis::X => Constraint::YZ,
            Axis::Y => Constraint::XZ,
            Axis::Z => Constraint::XY,
        }
    }

    /// Result of pressing an axis key: the same constraint again frees it.
    pub fn toggled(self, axis: Axis, plane: bool) -> Self {
        let target = if plane { Self::plane(axis) } else { Self::axis(axis) };
        if self == target { Constraint::None } else { target }
    }

    /// Zero the movement components the constraint blocks.
    pub fn apply(self, movement: DVec3) -> DVec3 {
        match self {
            Constraint::None => movement,
            Constraint::X => DVec3::new(movement.x, 0.0, 0.0),
            Constraint::Y => DVec3::new(0.0, movement.y, 0.0),
            Constraint::Z => DVec3::new(0.0, 0.0, movement.z),
            Constraint::XY => DVec3::new(movement.x, movement.y, 0.0),
            Constraint::XZ => DVec3::new(movement.x, 0.0, movement.z),
            Constraint::YZ => DVec3::new(0.0, movement.y, movement.z),
        }
    }

    pub fn is_none(self) -> bool {
        self == Constraint::None
    }

    fn name(self) -> &'static str {
        match self {
            Constraint::None => "",
            Constraint::X => "X",
            Constraint::Y => "Y",
            Constraint::Z => "Z",
            Constraint::XY => "XY",
            Constraint::XZ => "XZ",
            Constraint::YZ => "YZ",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::None => Ok(()),
            Constraint::X | Constraint::Y | Constraint::Z => write!(f, "Axis: {}", self.name()),
            Constraint::XY | Constraint::XZ | Constraint::YZ => write!(f, "Plane: {}", self.name()),
        }
    }
}

/// Input the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SnapEvent {
    /// Pointer moved to a screen position.
    PointerMoved(Point),
    /// Hard snap requested (button held) or released.
    HardSnap(bool),
    /// Axis key pressed; `plane` selects the orthogonal plane.
    ToggleConstraint { axis: Axis, plane: bool },
    /// Enable or disable alignment search on one axis.
    ToggleAlignAxis(Axis),
    Confirm,
    Cancel,
}

/// Lifecycle state of a started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Active,
    Confirmed,
    Cancelled,
}

impl SessionPhase {
    pub fn is_finished(self) -> bool {
        self != SessionPhase::Active
    }
}

/// Positions of the moving elements of one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementPositions {
    /// Object translation in world space.
    Object(DVec3),
    /// `(vertex index, object-local position)` pairs.
    Vertices(Vec<(usize, DVec3)>),
}

/// The scene a session reads targets from and writes positions to.
pub trait SceneHost {
    type Object: ReferenceGeometry;

    fn object(&self, id: ObjectId) -> Option<&Self::Object>;

    /// Reference objects for `scope`, nearest to `active` first.
    fn scope_objects(&self, active: ObjectId, scope: &ScopeMode) -> Vec<&Self::Object>;

    /// Write positions of moving elements back to the scene.
    fn apply_position(&mut self, object: ObjectId, positions: &ElementPositions);

    /// Put elements back where they were before the session.
    fn restore(&mut self, object: ObjectId, original: &ElementPositions) {
        self.apply_position(object, original);
    }
}

/// State of one snap-move interaction.
pub struct SnapSession<P: Projector> {
    projector: P,
    selection: MovingSelection,
    /// Snapshot taken at start, used by cancel.
    original: ElementPositions,
    /// World position that follows the pointer.
    anchor: DVec3,
    /// Pointer position at start, unprojected at anchor depth.
    start_pointer_world: DVec3,
    last_pointer: Point,
    index: Option<SpatialIndex>,
    summary: BuildSummary,
    threshold_px: f64,
    world_radius: f64,
    align_axes: AxisFlags,
    constraint: Constraint,
    hard_snap_requested: bool,
    hard_snap: bool,
    candidates: Vec<SnapCandidate>,
    free: DVec3,
    applied: DVec3,
    status: String,
    phase: SessionPhase,
}

impl<P: Projector> fmt::Debug for SnapSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapSession")
            .field("selection", &self.selection)
            .field("anchor", &self.anchor)
            .field("constraint", &self.constraint)
            .field("applied", &self.applied)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<P: Projector> SnapSession<P> {
    /// Validate preconditions, snapshot the moving geometry and build the index.
    pub fn start<H: SceneHost>(
        host: &H,
        moving: Option<MovingSelection>,
        pointer: Point,
        projector: P,
        config: &SnapConfig,
    ) -> SessionResult<Self> {
        Self::prepare(host, moving, &projector)
            .map(|(selection, original, anchor)| {
                let start_pointer_world = projector.screen_to_world(pointer, anchor);
                let targets = host.scope_objects(selection.object, &config.target_scope);
                let index = SpatialIndex::build(&targets, config.max_vertex_budget, Some(&selection));
                let summary = index.summary().clone();
                log::info!(
                    "Snap session started on {} ({} targets): {}",
                    selection.object,
                    targets.len(),
                    summary
                );

                let mut session = Self {
                    projector,
                    selection,
                    original,
                    anchor,
                    start_pointer_world,
                    last_pointer: pointer,
                    index: Some(index),
                    summary,
                    threshold_px: config.snap_distance_px as f64,
                    world_radius: config.world_search_radius(),
                    align_axes: config.align_axes,
                    constraint: Constraint::None,
                    hard_snap_requested: false,
                    hard_snap: false,
                    candidates: Vec::new(),
                    free: anchor,
                    applied: anchor,
                    status: String::new(),
                    phase: SessionPhase::Active,
                };
                session.update_status();
                session
            })
            .inspect_err(|e| log::warn!("Snap session not started: {}", e))
    }

    fn prepare<H: SceneHost>(
        host: &H,
        moving: Option<MovingSelection>,
        projector: &P,
    ) -> SessionResult<(MovingSelection, ElementPositions, DVec3)> {
        let selection = moving.ok_or(SessionError::NoMovingGeometry)?;
        let object = host
            .object(selection.object)
            .ok_or(SessionError::UnknownObject(selection.object))?;

        let (original, anchor) = match &selection.vertices {
            None => (ElementPositions::Object(object.translation()), object.translation()),
            Some(indices) => {
                let snapshot: Vec<(usize, DVec3)> = indices
                    .iter()
                    .filter_map(|&i| object.local_vertex(i).map(|v| (i, v)))
                    .collect();
                if snapshot.is_empty() {
                    return Err(SessionError::NoSelectedVertices);
                }
                let center = snapshot.iter().map(|&(_, v)| v).sum::<DVec3>() / snapshot.len() as f64;
                (ElementPositions::Vertices(snapshot), object.to_world(center))
            }
        };

        if !projector.is_resolved() {
            return Err(SessionError::UnresolvedProjection);
        }
        Ok((selection, original, anchor))
    }

    /// Feed one event. Events after the session ended are ignored.
    pub fn handle_event<H: SceneHost>(&mut self, event: SnapEvent, host: &mut H) -> SessionPhase {
        if self.phase.is_finished() {
            return self.phase;
        }

        match event {
            SnapEvent::PointerMoved(pointer) => {
                self.last_pointer = pointer;
                self.tick(host);
            }
            SnapEvent::HardSnap(requested) => {
                self.hard_snap_requested = requested;
                self.tick(host);
            }
            SnapEvent::ToggleConstraint { axis, plane } => {
                self.constraint = self.constraint.toggled(axis, plane);
                log::debug!("Constraint: {:?}", self.constraint);
                self.tick(host);
            }
            SnapEvent::ToggleAlignAxis(axis) => {
                self.align_axes.toggle(axis);
                log::debug!("Align axes: {:?}", self.align_axes);
                self.tick(host);
            }
            SnapEvent::Confirm => {
                self.phase = SessionPhase::Confirmed;
                self.index = None;
                log::info!("Snap session confirmed at {:?}", self.applied);
            }
            SnapEvent::Cancel => {
                host.restore(self.selection.object, &self.original);
                self.applied = self.anchor;
                self.free = self.anchor;
                self.candidates.clear();
                self.hard_snap = false;
                self.phase = SessionPhase::Cancelled;
                self.index = None;
                self.update_status();
                log::info!("Snap session cancelled");
            }
        }
        self.phase
    }

    /// Recompute candidates and the applied position from the last pointer.
    fn tick<H: SceneHost>(&mut self, host: &mut H) {
        let Some(index) = self.index.as_ref() else {
            return;
        };

        let pointer_world = self.projector.screen_to_world(self.last_pointer, self.anchor);
        let movement = self.constraint.apply(pointer_world - self.start_pointer_world);
        self.free = self.anchor + movement;

        let reference = self
            .projector
            .world_to_screen(self.free)
            .unwrap_or(self.last_pointer);

        self.candidates = if self.align_axes.is_empty() {
            find_candidates(
                index,
                self.free,
                &self.projector,
                reference,
                self.threshold_px,
                self.world_radius,
            )
        } else {
            find_axis_candidates(
                index,
                self.free,
                &self.projector,
                reference,
                self.align_axes,
                self.world_radius,
            )
        };

        let candidate = self.candidates.first();
        self.hard_snap = self.hard_snap_requested && candidate.is_some();
        self.applied = blend_position(
            self.free,
            candidate,
            self.hard_snap,
            BlendParams {
                world_radius: self.world_radius,
                threshold_px: self.threshold_px,
            },
        );
        log::debug!(
            "tick: free {:?} applied {:?} ({} candidates)",
            self.free,
            self.applied,
            self.candidates.len()
        );

        self.write_back(host);
        self.update_status();
    }

    fn write_back<H: SceneHost>(&self, host: &mut H) {
        let delta = self.applied - self.anchor;
        let positions = match &self.original {
            ElementPositions::Object(location) => ElementPositions::Object(*location + delta),
            ElementPositions::Vertices(vertices) => {
                let Some(object) = host.object(self.selection.object) else {
                    log::warn!("Moving object {} disappeared", self.selection.object);
                    return;
                };
                let local_delta = object.delta_to_local(delta);
                ElementPositions::Vertices(vertices.iter().map(|&(i, v)| (i, v + local_delta)).collect())
            }
        };
        host.apply_position(self.selection.object, &positions);
    }

    fn update_status(&mut self) {
        let mut parts = Vec::new();
        if !self.constraint.is_none() {
            parts.push(self.constraint.to_string());
        }

        match self.candidates.first() {
            None => parts.push("Target: None".to_string()),
            Some(c) => {
                let dist = c.location.distance(self.applied);
                match c.kind {
                    CandidateKind::Align(axis) => parts.push(format!(
                        "Align {}: {:.3} ({}) | Dist: {:.3}m",
                        axis.label(),
                        axis.component(c.location),
                        c.object_name,
                        dist
                    )),
                    CandidateKind::Point | CandidateKind::Bounds => {
                        let kind = if c.kind == CandidateKind::Bounds { "Bounds" } else { "Vertex" };
                        parts.push(format!("Target: {} ({}) | Dist: {:.3}m", c.object_name, kind, dist));
                    }
                }
            }
        }
        self.status = parts.join(" | ");
    }

    /// Best candidate of the last tick.
    pub fn candidate(&self) -> Option<&SnapCandidate> {
        self.candidates.first()
    }

    /// All candidates of the last tick, best first.
    pub fn candidates(&self) -> &[SnapCandidate] {
        &self.candidates
    }

    /// Unsnapped position following the pointer.
    pub fn free(&self) -> DVec3 {
        self.free
    }

    /// Position written to the moving geometry.
    pub fn applied(&self) -> DVec3 {
        self.applied
    }

    pub fn anchor(&self) -> DVec3 {
        self.anchor
    }

    /// Status line for display.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn align_axes(&self) -> AxisFlags {
        self.align_axes
    }

    /// Whether the last tick hard-snapped.
    pub fn hard_snap(&self) -> bool {
        self.hard_snap
    }

    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selection(&self) -> &MovingSelection {
        &self.selection
    }

    /// The spatial index, while the session is active.
    pub fn index(&self) -> Option<&SpatialIndex> {
        self.index.as_ref()
    }
}
