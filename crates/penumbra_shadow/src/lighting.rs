//! Spotlight Lighting Composition
//!
//! The consumer of the visibility scalar: a cone-limited spotlight with
//! Lambert diffuse and Blinn-Phong specular, both scaled by shadow
//! visibility before the final color is assembled.

use penumbra_math::{Vec3, Vec4, saturate};
use serde::{Serialize, Deserialize};

use crate::blocker::BlockerSearch;
use crate::evaluator::SoftShadowEvaluator;
use crate::projector::LightProjector;

/// Cone-limited point light
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// World position
    pub position: Vec3,
    /// Normalized direction the cone points along
    pub direction: Vec3,
    /// Cosine of the full-intensity half angle
    pub inner_limit: f32,
    /// Cosine of the cutoff half angle
    pub outer_limit: f32,
    /// Specular exponent
    pub shininess: f32,
}

impl SpotLight {
    /// Spotlight at `position` aimed at `target`; angles are half angles in radians
    pub fn new(position: Vec3, target: Vec3, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            position,
            direction: (target - position).normalize_or_zero(),
            inner_limit: inner_angle.cos(),
            outer_limit: outer_angle.cos(),
            shininess: 150.0,
        }
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    /// Light-texture projector covering the outer cone
    pub fn projector(&self, near: f32, far: f32) -> LightProjector {
        let fov = 2.0 * self.outer_limit.clamp(-1.0, 1.0).acos();
        LightProjector::spot(self.position, self.position + self.direction, fov, near, far)
    }

    /// Cone attenuation for a normalized surface-to-light direction
    pub fn cone_factor(&self, surface_to_light: Vec3) -> f32 {
        let from_direction = surface_to_light.dot(-self.direction);
        let range = self.inner_limit - self.outer_limit;
        if range <= 0.0 {
            return if from_direction >= self.outer_limit { 1.0 } else { 0.0 };
        }
        saturate((from_direction - self.outer_limit) / range)
    }

    /// Unshadowed diffuse and specular weights at `surface`
    pub fn terms(&self, surface: &SurfacePoint) -> LightingTerms {
        let normal = surface.normal.normalize_or_zero();
        let to_light = (self.position - surface.position).normalize_or_zero();
        let to_view = (surface.view_position - surface.position).normalize_or_zero();
        let half = (to_light + to_view).normalize_or_zero();

        let in_light = self.cone_factor(to_light);
        let diffuse = in_light * normal.dot(to_light).max(0.0);
        let specular = if diffuse > 0.0 {
            in_light * normal.dot(half).max(0.0).powf(self.shininess)
        } else {
            0.0
        };
        LightingTerms { diffuse, specular }
    }
}

/// Surface being shaded
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    /// Camera position
    pub view_position: Vec3,
}

/// Diffuse and specular weights before shadowing
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightingTerms {
    pub diffuse: f32,
    pub specular: f32,
}

/// `albedo.rgb * diffuse * visibility + specular * visibility`, alpha kept
pub fn shade(albedo: Vec4, terms: LightingTerms, visibility: f32) -> Vec4 {
    let visibility = saturate(visibility);
    let rgb = albedo.truncate() * (terms.diffuse * visibility) + Vec3::splat(terms.specular * visibility);
    rgb.extend(albedo.w)
}

/// Shade `surface` under `light` with soft shadows from `evaluator`, scaled by
/// the evaluator's shadow strength
pub fn shade_with_shadow<S: BlockerSearch>(
    evaluator: &SoftShadowEvaluator<'_, S>,
    light: &SpotLight,
    surface: &SurfacePoint,
    albedo: Vec4,
) -> Vec4 {
    let terms = light.terms(surface);
    if terms.diffuse <= 0.0 && terms.specular <= 0.0 {
        return shade(albedo, terms, 1.0);
    }
    let visibility = evaluator.params().apply_strength(evaluator.visibility(surface.position));
    shade(albedo, terms, visibility)
}
