//! # penumbra_math - Light-Space Math Primitives
//!
//! The small set of vector and matrix types the shadow evaluator needs:
//! homogeneous points, column-major 4x4 transforms, and the projection
//! builders used to construct a light's view of the scene.

pub mod vector;
pub mod matrix;

pub use vector::*;
pub use matrix::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Clamp value between min and max.
///
/// NaN inputs collapse to `min`, so callers always get a value inside the range.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value > max { max }
    else if value >= min { value }
    else { min }
}

/// Clamp to the unit interval
#[inline]
pub fn saturate(value: f32) -> f32 {
    clamp(value, 0.0, 1.0)
}

pub mod prelude {
    pub use crate::vector::{Vec2, Vec3, Vec4};
    pub use crate::matrix::Mat4;
    pub use crate::{radians, clamp, saturate};
}
