//! Proximity search: nearby reference points filtered in world and screen space.

use super::{CandidateKind, SnapCandidate, sort_by_score};
use crate::camera::Projector;
use crate::index::SpatialIndex;
use glam::DVec3;
use kurbo::Point;

/// Find point/bounds candidates near `target`, best first.
///
/// A hit must lie within `world_radius` of `target` in world space and
/// within `threshold_px` of `pointer` on screen. Points of the moving
/// geometry and points that do not project are skipped.
/// Score is screen distance plus world distance.
pub fn find_candidates<P: Projector + ?Sized>(
    index: &SpatialIndex,
    target: DVec3,
    projector: &P,
    pointer: Point,
    threshold_px: f64,
    world_radius: f64,
) -> Vec<SnapCandidate> {
    let mut result: Vec<SnapCandidate> = index
        .within_radius(target, world_radius)
        .into_iter()
        .filter(|&(i, _)| !index.is_excluded(i))
        .filter_map(|(i, world_distance)| {
            let point = index.point(i)?;
            let screen = projector.world_to_screen(point.position)?;
            let screen_distance = screen.distance(pointer);
            if screen_distance > threshold_px {
                return None;
            }
            Some(SnapCandidate {
                kind: CandidateKind::from(point.kind),
                location: point.position,
                reference: target,
                screen_distance,
                score: screen_distance + world_distance,
                object: point.object,
                object_name: index.object_name(point.object).to_string(),
            })
        })
        .collect();

    sort_by_score(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::geometry::MovingSelection;
    use crate::scope::SceneObject;
    use kurbo::Size;

    /// 10 px per world unit, origin at (400, 300).
    fn camera() -> Camera {
        Camera::top_down(60.0, Size::new(800.0, 600.0))
    }

    struct Blind;

    impl Projector for Blind {
        fn world_to_screen(&self, _world: DVec3) -> Option<Point> {
            None
        }

        fn screen_to_world(&self, _screen: Point, depth_reference: DVec3) -> DVec3 {
            depth_reference
        }
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::empty();
        let result = find_candidates(&index, DVec3::ZERO, &camera(), Point::new(400.0, 300.0), 15.0, 7.5);
        assert!(result.is_empty());
    }

    #[test]
    fn test_finds_nearest_vertex_first() {
        let cube = SceneObject::cube("Cube", DVec3::new(2.0, 0.0, 0.0));
        let index = SpatialIndex::build(&[&cube], 100, None);
        let camera = camera();
        // Target right next to the (1, 1) column of the cube.
        let target = DVec3::new(0.8, 0.9, 1.0);
        let pointer = camera.world_to_screen(target).unwrap();
        let result = find_candidates(&index, target, &camera, pointer, 15.0, 7.5);

        assert!(!result.is_empty());
        let best = &result[0];
        assert_eq!(best.kind, CandidateKind::Point);
        assert_eq!(best.location, DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(best.reference, target);
        assert_eq!(best.object_name, "Cube");
        assert!(result.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_screen_threshold_filters() {
        let cube = SceneObject::cube("Cube", DVec3::new(2.0, 0.0, 0.0));
        let index = SpatialIndex::build(&[&cube], 100, None);
        let camera = camera();
        let target = DVec3::ZERO;
        let pointer = Point::new(400.0, 300.0);
        // Vertices at x = 1 are 10 px (+-10 px in y) away, x = 3 ones 30 px+.
        let result = find_candidates(&index, target, &camera, pointer, 15.0, 100.0);
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|c| c.screen_distance <= 15.0));
        assert!(result.iter().all(|c| c.location.x == 1.0));
    }

    #[test]
    fn test_world_radius_filters() {
        let cube = SceneObject::cube("Cube", DVec3::new(2.0, 0.0, 0.0));
        let index = SpatialIndex::build(&[&cube], 100, None);
        let result = find_candidates(&index, DVec3::ZERO, &camera(), Point::new(400.0, 300.0), 1000.0, 1.5);
        assert!(result.is_empty());
    }

    #[test]
    fn test_excluded_points_skipped() {
        let moving = SceneObject::cube("Moving", DVec3::ZERO);
        let other = SceneObject::cube("Other", DVec3::new(2.5, 0.0, 0.0));
        let selection = MovingSelection::whole(moving.id);
        let index = SpatialIndex::build(&[&moving, &other], 100, Some(&selection));
        let result = find_candidates(&index, DVec3::ZERO, &camera(), Point::new(400.0, 300.0), 1000.0, 100.0);
        assert_eq!(result.len(), 8);
        assert!(result.iter().all(|c| c.object == other.id));
    }

    #[test]
    fn test_bounds_kind_propagates() {
        let grid = SceneObject::grid("Grid", DVec3::new(1.0, 0.0, 0.0), 5, 5, 2.0);
        let index = SpatialIndex::build(&[&grid], 10, None);
        let result = find_candidates(&index, DVec3::new(1.0, 0.0, 0.0), &camera(), Point::new(410.0, 300.0), 1000.0, 100.0);
        assert_eq!(result.len(), 9);
        assert!(result.iter().all(|c| c.kind == CandidateKind::Bounds));
    }

    #[test]
    fn test_unprojectable_points_skipped() {
        let cube = SceneObject::cube("Cube", DVec3::ZERO);
        let index = SpatialIndex::build(&[&cube], 100, None);
        let result = find_candidates(&index, DVec3::ZERO, &Blind, Point::ZERO, 1000.0, 100.0);
        assert!(result.is_empty());
    }
}
