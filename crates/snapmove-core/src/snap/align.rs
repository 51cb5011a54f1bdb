//! Axis-alignment search over the coordinate-sorted axis arrays.

use super::{AxisFlags, CandidateKind, SnapCandidate, sort_by_score};
use crate::camera::Projector;
use crate::index::SpatialIndex;
use glam::DVec3;
use kurbo::Point;
use std::collections::BTreeMap;

/// Upper bound on axis entries scanned per axis and query.
pub const AXIS_SCAN_LIMIT: usize = 5000;

/// Minimum effective world threshold for alignment search.
const MIN_ALIGN_THRESHOLD: f64 = 10.0;

/// Multiplier applied to the world threshold for alignment search.
const ALIGN_THRESHOLD_SCALE: f64 = 20.0;

/// Find alignment candidates for the enabled axes, best first.
///
/// For each axis, reference points whose coordinate is close to the
/// target's produce a candidate at the target with that one coordinate
/// replaced. Candidates are only rejected when their location does not
/// project; no pixel threshold applies. Per axis, values equal after
/// rounding to 3 decimals collapse into their best-scoring candidate.
pub fn find_axis_candidates<P: Projector + ?Sized>(
    index: &SpatialIndex,
    target: DVec3,
    projector: &P,
    pointer: Point,
    axes: AxisFlags,
    world_threshold: f64,
) -> Vec<SnapCandidate> {
    if index.is_empty() || axes.is_empty() {
        return Vec::new();
    }

    let threshold = (world_threshold * ALIGN_THRESHOLD_SCALE).max(MIN_ALIGN_THRESHOLD);
    let mut result = Vec::new();

    for axis in axes.iter() {
        let target_value = axis.component(target);
        let entries = index.axis_range(axis, target_value - threshold, target_value + threshold);
        let mut best: BTreeMap<u64, SnapCandidate> = BTreeMap::new();

        for entry in entries.iter().take(AXIS_SCAN_LIMIT) {
            if index.is_excluded(entry.point) {
                continue;
            }
            let Some(point) = index.point(entry.point) else {
                continue;
            };
            let location = axis.with_component(target, entry.value);
            let Some(screen) = projector.world_to_screen(location) else {
                continue;
            };

            let score = (entry.value - target_value).abs() * 100.0;
            // Bit pattern of the rounded value; `+ 0.0` folds -0.0 into 0.0.
            let key = ((entry.value * 1000.0).round() + 0.0).to_bits();
            if best.get(&key).is_some_and(|prev| prev.score <= score) {
                continue;
            }
            best.insert(
                key,
                SnapCandidate {
                    kind: CandidateKind::Align(axis),
                    location,
                    reference: point.position,
                    screen_distance: screen.distance(pointer),
                    score,
                    object: point.object,
                    object_name: index.object_name(point.object).to_string(),
                },
            );
        }

        result.extend(best.into_values());
    }

    sort_by_score(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::geometry::{Axis, MovingSelection};
    use crate::scope::SceneObject;
    use kurbo::Size;

    fn camera() -> Camera {
        Camera::top_down(60.0, Size::new(800.0, 600.0))
    }

    fn point_object(name: &str, points: Vec<DVec3>) -> SceneObject {
        SceneObject::new(name, DVec3::ZERO, points)
    }

    /// Camera that fails to project anything above `max_z`.
    struct ClippedAbove {
        camera: Camera,
        max_z: f64,
    }

    impl Projector for ClippedAbove {
        fn world_to_screen(&self, world: DVec3) -> Option<Point> {
            if world.z > self.max_z {
                return None;
            }
            self.camera.world_to_screen(world)
        }

        fn screen_to_world(&self, screen: Point, depth_reference: DVec3) -> DVec3 {
            self.camera.screen_to_world(screen, depth_reference)
        }
    }

    #[test]
    fn test_no_axes_no_candidates() {
        let obj = point_object("P", vec![DVec3::new(1.0, 2.0, 3.0)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(&index, DVec3::ZERO, &camera(), Point::ZERO, AxisFlags::NONE, 7.5);
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_axis_candidate() {
        let obj = point_object("P", vec![DVec3::new(3.0, -2.0, 4.0)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let target = DVec3::new(0.5, 0.5, 0.0);
        let result = find_axis_candidates(
            &index,
            target,
            &camera(),
            Point::new(405.0, 295.0),
            AxisFlags::only(&[Axis::Z]),
            7.5,
        );
        assert_eq!(result.len(), 1);
        let c = &result[0];
        assert_eq!(c.kind, CandidateKind::Align(Axis::Z));
        assert_eq!(c.location, DVec3::new(0.5, 0.5, 4.0));
        assert_eq!(c.reference, DVec3::new(3.0, -2.0, 4.0));
        assert!((c.score - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_dedup_keeps_lowest_score() {
        // Values 2.0001 and 2.0004 round to the same 2.000 key.
        let obj = point_object(
            "P",
            vec![
                DVec3::new(0.0, 0.0, 2.0004),
                DVec3::new(5.0, 5.0, 2.0001),
                DVec3::new(1.0, 1.0, 3.0),
            ],
        );
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::Z]),
            1.0,
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].reference, DVec3::new(5.0, 5.0, 2.0001));
        assert_eq!(result[1].location.z, 3.0);
    }

    #[test]
    fn test_dedup_is_per_axis() {
        let obj = point_object("P", vec![DVec3::new(2.0, 2.0, 50.0)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::X, Axis::Y]),
            1.0,
        );
        let kinds: Vec<CandidateKind> = result.iter().map(|c| c.kind).collect();
        assert_eq!(result.len(), 2);
        assert!(kinds.contains(&CandidateKind::Align(Axis::X)));
        assert!(kinds.contains(&CandidateKind::Align(Axis::Y)));
    }

    #[test]
    fn test_threshold_window() {
        // Effective threshold is max(0.1 * 20, 10) = 10.
        let obj = point_object(
            "P",
            vec![DVec3::new(9.5, 0.0, 0.0), DVec3::new(10.5, 0.0, 0.0)],
        );
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::X]),
            0.1,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].location.x, 9.5);
    }

    #[test]
    fn test_excluded_and_sorted() {
        let moving = SceneObject::cube("Moving", DVec3::ZERO);
        let refs = point_object(
            "Refs",
            vec![
                DVec3::new(0.0, 0.0, 6.0),
                DVec3::new(0.0, 0.0, -2.5),
                DVec3::new(0.0, 0.0, 0.25),
            ],
        );
        let selection = MovingSelection::whole(moving.id);
        let index = SpatialIndex::build(&[&moving, &refs], 100, Some(&selection));
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::Z]),
            7.5,
        );
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|c| c.object == refs.id));
        let zs: Vec<f64> = result.iter().map(|c| c.location.z).collect();
        assert_eq!(zs, vec![0.25, -2.5, 6.0]);
    }

    #[test]
    fn test_scan_limit() {
        let points: Vec<DVec3> = (0..AXIS_SCAN_LIMIT + 500)
            .map(|i| DVec3::new(i as f64 * 0.001, 0.0, 0.0))
            .collect();
        let obj = point_object("Dense", points);
        let index = SpatialIndex::build(&[&obj], 100_000, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::X]),
            7.5,
        );
        assert_eq!(result.len(), AXIS_SCAN_LIMIT);
    }

    #[test]
    fn test_unprojectable_location_skipped() {
        let obj = point_object("P", vec![DVec3::new(1.0, 1.0, 4.0), DVec3::new(-1.0, 2.0, 9.0)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let projector = ClippedAbove {
            camera: camera(),
            max_z: 5.0,
        };
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &projector,
            Point::new(400.0, 300.0),
            AxisFlags::only(&[Axis::Z]),
            7.5,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].location, DVec3::new(0.0, 0.0, 4.0));
        // No pixel threshold: the kept candidate sits on the pointer here.
        assert!(result[0].screen_distance < 1e-9);
    }

    #[test]
    fn test_dedup_keeps_distinct_huge_values() {
        let obj = point_object("Far", vec![DVec3::new(1.0e16, 0.0, 0.0), DVec3::new(2.0e16, 0.0, 0.0)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::X]),
            1.0e17,
        );
        let xs: Vec<f64> = result.iter().map(|c| c.location.x).collect();
        assert_eq!(xs, vec![1.0e16, 2.0e16]);
    }

    #[test]
    fn test_dedup_merges_signed_zero() {
        let obj = point_object("P", vec![DVec3::new(0.0, 0.0, -0.0001), DVec3::new(3.0, 3.0, 0.0002)]);
        let index = SpatialIndex::build(&[&obj], 100, None);
        let result = find_axis_candidates(
            &index,
            DVec3::ZERO,
            &camera(),
            Point::ZERO,
            AxisFlags::only(&[Axis::Z]),
            1.0,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].reference, DVec3::new(0.0, 0.0, -0.0001));
    }
}
