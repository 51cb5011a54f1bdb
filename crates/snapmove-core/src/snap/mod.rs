//! Snap candidates, candidate searches and soft/hard snap blending.

mod align;
mod proximity;

pub use align::{AXIS_SCAN_LIMIT, find_axis_candidates};
pub use proximity::find_candidates;

use crate::geometry::{Axis, ObjectId};
use crate::index::PointKind;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Soft snap strength toward a proximity candidate.
pub const PROXIMITY_SOFT_FACTOR: f64 = 0.35;
/// Soft snap strength toward an alignment candidate.
pub const ALIGN_SOFT_FACTOR: f64 = 0.5;

/// Type of snap candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// A mesh vertex.
    Point,
    /// A bounding-box corner or origin.
    Bounds,
    /// A coordinate match on one axis.
    Align(Axis),
}

impl CandidateKind {
    /// The aligned axis, for alignment candidates.
    pub fn alignment_axis(self) -> Option<Axis> {
        match self {
            CandidateKind::Align(axis) => Some(axis),
            CandidateKind::Point | CandidateKind::Bounds => None,
        }
    }

    pub fn is_alignment(self) -> bool {
        self.alignment_axis().is_some()
    }
}

impl From<PointKind> for CandidateKind {
    fn from(kind: PointKind) -> Self {
        match kind {
            PointKind::Vertex => CandidateKind::Point,
            PointKind::Bounds => CandidateKind::Bounds,
        }
    }
}

/// A snap target found by one of the searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    pub kind: CandidateKind,
    /// Proposed world-space destination.
    pub location: DVec3,
    /// Point the candidate relates to, for guide lines.
    pub reference: DVec3,
    /// Distance from the pointer reference in pixels.
    pub screen_distance: f64,
    /// Lower is better.
    pub score: f64,
    pub object: ObjectId,
    pub object_name: String,
}

/// Which axes take part in alignment search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisFlags {
    pub const NONE: AxisFlags = AxisFlags {
        x: false,
        y: false,
        z: false,
    };

    /// Flags with exactly the given axes enabled.
    pub fn only(axes: &[Axis]) -> Self {
        let mut flags = Self::NONE;
        for &axis in axes {
            flags.set(axis, true);
        }
        flags
    }

    pub fn contains(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, enabled: bool) {
        match axis {
            Axis::X => self.x = enabled,
            Axis::Y => self.y = enabled,
            Axis::Z => self.z = enabled,
        }
    }

    pub fn toggle(&mut self, axis: Axis) {
        self.set(axis, !self.contains(axis));
    }

    pub fn is_empty(self) -> bool {
        !(self.x || self.y || self.z)
    }

    /// Enabled axes in X, Y, Z order.
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |&a| self.contains(a))
    }
}

/// Thresholds the blend rule needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendParams {
    pub world_radius: f64,
    pub threshold_px: f64,
}

/// Compute where the moving geometry goes this tick.
///
/// Hard snap lands exactly on the candidate. Otherwise the free position is
/// pulled part of the way toward the candidate, more strongly the closer it
/// is: by axis distance for alignment candidates, by screen distance for
/// proximity candidates.
pub fn blend_position(
    free: DVec3,
    candidate: Option<&SnapCandidate>,
    hard_snap: bool,
    params: BlendParams,
) -> DVec3 {
    let Some(candidate) = candidate else {
        return free;
    };
    if hard_snap {
        return candidate.location;
    }

    let factor = match candidate.kind.alignment_axis() {
        Some(axis) => {
            let axis_distance = (axis.component(free) - axis.component(candidate.location)).abs();
            let ratio = 1.0 - (axis_distance / (params.world_radius * 10.0).max(0.01)).min(1.0);
            ratio.clamp(0.0, 1.0) * ALIGN_SOFT_FACTOR
        }
        None => {
            let ratio = 1.0 - candidate.screen_distance / params.threshold_px.max(1.0);
            ratio.clamp(0.0, 1.0) * PROXIMITY_SOFT_FACTOR
        }
    };
    free.lerp(candidate.location, factor)
}

fn sort_by_score(candidates: &mut [SnapCandidate]) {
    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const PARAMS: BlendParams = BlendParams {
        world_radius: 7.5,
        threshold_px: 15.0,
    };

    fn candidate(kind: CandidateKind, location: DVec3, screen_distance: f64) -> SnapCandidate {
        SnapCandidate {
            kind,
            location,
            reference: location,
            screen_distance,
            score: 0.0,
            object: Uuid::new_v4(),
            object_name: "Ref".to_string(),
        }
    }

    #[test]
    fn test_no_candidate_keeps_free() {
        let free = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(blend_position(free, None, true, PARAMS), free);
    }

    #[test]
    fn test_hard_snap_is_exact() {
        let free = DVec3::new(0.1, 0.2, 0.3);
        let target = DVec3::new(1.0 / 3.0, 2.0 / 7.0, 0.9);
        let c = candidate(CandidateKind::Point, target, 14.0);
        assert_eq!(blend_position(free, Some(&c), true, PARAMS), target);
        let c = candidate(CandidateKind::Align(Axis::Y), target, 80.0);
        assert_eq!(blend_position(free, Some(&c), true, PARAMS), target);
    }

    #[test]
    fn test_proximity_soft_snap() {
        let free = DVec3::ZERO;
        let target = DVec3::new(1.0, 0.0, 0.0);
        // Coincident on screen: full soft factor.
        let c = candidate(CandidateKind::Point, target, 0.0);
        let out = blend_position(free, Some(&c), false, PARAMS);
        assert!((out.x - PROXIMITY_SOFT_FACTOR).abs() < 1e-12);
        // At the threshold: no pull.
        let c = candidate(CandidateKind::Bounds, target, 15.0);
        assert_eq!(blend_position(free, Some(&c), false, PARAMS), free);
        // Halfway.
        let c = candidate(CandidateKind::Point, target, 7.5);
        let out = blend_position(free, Some(&c), false, PARAMS);
        assert!((out.x - 0.175).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_soft_snap() {
        let free = DVec3::new(0.0, 0.0, 0.0);
        // Axis distance 15 against a 75 unit span: ratio 0.8.
        let c = candidate(CandidateKind::Align(Axis::Z), DVec3::new(0.0, 0.0, 15.0), 500.0);
        let out = blend_position(free, Some(&c), false, PARAMS);
        assert!((out.z - 15.0 * 0.8 * ALIGN_SOFT_FACTOR).abs() < 1e-9);
        assert_eq!(out.x, 0.0);
        // Beyond the span: no pull.
        let c = candidate(CandidateKind::Align(Axis::Z), DVec3::new(0.0, 0.0, 100.0), 0.0);
        assert_eq!(blend_position(free, Some(&c), false, PARAMS), free);
    }

    #[test]
    fn test_axis_flags() {
        let mut flags = AxisFlags::NONE;
        assert!(flags.is_empty());
        flags.toggle(Axis::Z);
        flags.toggle(Axis::X);
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![Axis::X, Axis::Z]);
        flags.toggle(Axis::X);
        assert_eq!(flags, AxisFlags::only(&[Axis::Z]));
    }

    #[test]
    fn test_candidate_kind_from_point_kind() {
        assert_eq!(CandidateKind::from(PointKind::Vertex), CandidateKind::Point);
        assert_eq!(CandidateKind::from(PointKind::Bounds), CandidateKind::Bounds);
        assert!(CandidateKind::Align(Axis::X).is_alignment());
        assert!(!CandidateKind::Point.is_alignment());
    }
}
