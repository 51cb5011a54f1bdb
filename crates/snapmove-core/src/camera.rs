//! Camera module for 3D world <-> screen projection.

use glam::{DMat4, DVec3};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Clip-space `w` below which a point counts as behind the eye.
const MIN_CLIP_W: f64 = 1e-6;

/// World/screen conversion used by the snap searches and the session.
///
/// Screen coordinates are pixels with the origin at the top-left corner.
pub trait Projector {
    /// Project a world point to screen space. `None` when the point is
    /// behind the viewing plane.
    fn world_to_screen(&self, world: DVec3) -> Option<Point>;

    /// Unproject a screen point onto the view-aligned plane passing
    /// through `depth_reference`.
    fn screen_to_world(&self, screen: Point, depth_reference: DVec3) -> DVec3;

    /// Whether the projection context is usable at all.
    fn is_resolved(&self) -> bool {
        true
    }
}

/// Lens model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f64 },
    /// Visible world height.
    Orthographic { height: f64 },
}

/// A look-at camera over a pixel viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    pub projection: Projection,
    /// Viewport size in pixels.
    pub viewport: Size,
    #[serde(default = "default_near")]
    pub near: f64,
    #[serde(default = "default_far")]
    pub far: f64,
}

fn default_near() -> f64 {
    0.1
}

fn default_far() -> f64 {
    1000.0
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: DVec3::new(7.0, -7.0, 5.0),
            target: DVec3::ZERO,
            up: DVec3::Z,
            projection: Projection::Perspective {
                fov_y: 50f64.to_radians(),
            },
            viewport: Size::new(1280.0, 720.0),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orthographic camera looking straight down -Z at the origin.
    pub fn top_down(height: f64, viewport: Size) -> Self {
        Self {
            eye: DVec3::new(0.0, 0.0, 50.0),
            target: DVec3::ZERO,
            up: DVec3::Y,
            projection: Projection::Orthographic { height },
            viewport,
            near: default_near(),
            far: default_far(),
        }
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> DVec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        let aspect = self.viewport.width / self.viewport.height.max(1.0);
        match self.projection {
            Projection::Perspective { fov_y } => {
                DMat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height / 2.0;
                let half_w = half_h * aspect;
                DMat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    /// Combined world -> clip transform.
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Convert a screen point to normalized device x/y.
    fn screen_to_ndc(&self, screen: Point) -> (f64, f64) {
        (
            screen.x / self.viewport.width * 2.0 - 1.0,
            1.0 - screen.y / self.viewport.height * 2.0,
        )
    }
}

impl Projector for Camera {
    fn world_to_screen(&self, world: DVec3) -> Option<Point> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= MIN_CLIP_W {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(Point::new(
            (ndc_x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc_y) * 0.5 * self.viewport.height,
        ))
    }

    fn screen_to_world(&self, screen: Point, depth_reference: DVec3) -> DVec3 {
        let inverse = self.view_projection().inverse();
        let (ndc_x, ndc_y) = self.screen_to_ndc(screen);
        let near = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 1.0));
        let direction = far - near;

        let forward = self.forward();
        let denom = direction.dot(forward);
        if denom.abs() < f64::EPSILON {
            return depth_reference;
        }
        let t = (depth_reference - near).dot(forward) / denom;
        near + direction * t
    }

    fn is_resolved(&self) -> bool {
        self.viewport.width > 0.0
            && self.viewport.height > 0.0
            && self.eye.distance_squared(self.target) > 0.0
    }
}
