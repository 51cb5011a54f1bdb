//! SnapMove Core Library
//!
//! Proximity and axis-alignment snapping for interactive 3-D moves, with a
//! vertex budget that degrades far geometry to bounding boxes.

pub mod camera;
pub mod config;
pub mod geometry;
pub mod index;
pub mod input;
pub mod scope;
pub mod session;
pub mod snap;

pub use camera::{Camera, Projection, Projector};
pub use config::{ConfigError, SnapConfig};
pub use geometry::{Axis, MovingSelection, ObjectId, ReferenceGeometry};
pub use index::{BuildSummary, PointKind, SpatialIndex};
pub use input::{Dispatch, InputEvent, InputTranslator, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use scope::{Scene, SceneError, SceneObject, ScopeMode};
pub use session::{Constraint, ElementPositions, SceneHost, SessionError, SessionPhase, SnapEvent, SnapSession};
pub use snap::{AxisFlags, CandidateKind, SnapCandidate, blend_position, find_axis_candidates, find_candidates};
