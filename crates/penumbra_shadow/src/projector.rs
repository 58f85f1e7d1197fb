//! Projector
//!
//! Maps world-space points into the light's normalized depth-texture space.
//! The light matrix is expected to already include the clip-to-texture remap
//! (see [`LightProjector::from_view_projection`]).

use penumbra_math::{Mat4, Vec2, Vec3};

/// A point in the light's depth-texture space, each axis nominally in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedCoord {
    pub x: f32,
    pub y: f32,
    /// Unbiased depth as seen from the light
    pub depth: f32,
}

impl ProjectedCoord {
    #[inline]
    pub fn uv(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Whether the coordinate lands on the depth buffer
    #[inline]
    pub fn in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Receiver depth used by the occlusion tests.
    ///
    /// `bias` is a non-negative magnitude that pulls the receiver toward the
    /// light, so a surface never shadows its own depth-buffer texel.
    #[inline]
    pub fn current_depth(&self, bias: f32) -> f32 {
        self.depth - bias
    }
}

/// World to light-texture projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightProjector {
    matrix: Mat4,
}

impl LightProjector {
    /// Wrap a full world-to-texture matrix
    pub fn new(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Compose `texture_bias * projection * view` for a light camera
    pub fn from_view_projection(projection: Mat4, view: Mat4) -> Self {
        Self::new(Mat4::texture_bias() * projection * view)
    }

    /// Light camera at `position` looking at `target`
    pub fn spot(position: Vec3, target: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        let mut up = Vec3::Y;
        if (target - position).normalize_or_zero().cross(up).length_squared() < 1e-6 {
            up = Vec3::Z;
        }
        let view = Mat4::look_at(position, target, up);
        let projection = Mat4::perspective(fov_y, 1.0, near, far);
        Self::from_view_projection(projection, view)
    }

    #[inline]
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Project `world` and perspective-divide.
    ///
    /// Returns `None` when the homogeneous `w` is zero or the division is not
    /// finite; callers treat that like any other out-of-frustum point.
    #[inline]
    pub fn project(&self, world: Vec3) -> Option<ProjectedCoord> {
        let clip = self.matrix.project_point(world);
        let ndc = clip.perspective_divide()?;
        Some(ProjectedCoord { x: ndc.x, y: ndc.y, depth: ndc.z })
    }
}
