//! Shadow Parameters
//!
//! The immutable per-draw record every evaluation receives. It replaces the
//! loose shader uniforms (bias, light size, kernel limits) with one value that
//! is passed explicitly, so an evaluation depends on nothing but its inputs.

use penumbra_math::saturate;
use serde::{Serialize, Deserialize};

use crate::error::{Result, ShadowError};

/// Largest filter half-width evaluation accepts
pub const MAX_KERNEL_RADIUS_LIMIT: u32 = 16;

/// Largest blocker search half-width evaluation accepts
pub const MAX_BLOCKER_RADIUS_LIMIT: u32 = 8;

/// Which receiver depth feeds the similar-triangles penumbra estimate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenumbraModel {
    /// `(current_depth - blocker) * light_size / blocker`, with the biased
    /// receiver depth used for the occlusion test.
    #[default]
    AverageBlocker,
    /// Same ratio, but the bias is removed from the receiver first, so the
    /// true projected depth feeds the estimate and penumbrae grow slightly.
    UnbiasedReceiver,
}

impl PenumbraModel {
    /// Receiver depth plugged into the penumbra ratio
    #[inline]
    pub fn receiver_depth(self, current_depth: f32, bias: f32) -> f32 {
        match self {
            Self::AverageBlocker => current_depth,
            Self::UnbiasedReceiver => current_depth + bias,
        }
    }
}

/// Per-evaluation soft shadow settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    /// When false every point is fully lit and the depth buffer is never read
    pub enabled: bool,

    /// Depth offset pulling the receiver toward the light to avoid acne
    pub bias: f32,

    /// Apparent light size; scales penumbra growth
    pub light_size: f32,

    /// Upper bound on the filter half-width, in texels
    pub max_kernel_radius: u32,

    /// Depth buffer side length `S`
    pub texture_size: u32,

    /// Use bilinear comparison sampling per tap instead of a point test
    pub use_hardware_comparison: bool,

    /// Half-width of the blocker search window (4 => 9x9)
    pub blocker_search_radius: u32,

    /// Converts the penumbra ratio into texels before flooring
    pub penumbra_scale: f32,

    /// Cap on taps per kernel axis; the kernel is strided to stay at or under it
    pub max_taps_per_axis: Option<u32>,

    /// Receiver depth convention for the penumbra estimate
    pub penumbra_model: PenumbraModel,

    /// How dark full shadow gets when shading (0 = no shadow, 1 = full shadow)
    pub strength: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            enabled: true,
            bias: 0.005,
            light_size: 2.0,
            max_kernel_radius: 7,
            texture_size: 2048,
            use_hardware_comparison: false,
            blocker_search_radius: 4,
            penumbra_scale: 1.0,
            max_taps_per_axis: None,
            penumbra_model: PenumbraModel::AverageBlocker,
            strength: 1.0,
        }
    }
}

impl ShadowParams {
    /// Parameters for a depth buffer of side `texture_size`, defaults elsewhere
    pub fn for_texture_size(texture_size: u32) -> Self {
        Self {
            texture_size,
            ..Default::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_light_size(mut self, light_size: f32) -> Self {
        self.light_size = light_size;
        self
    }

    pub fn with_max_kernel_radius(mut self, radius: u32) -> Self {
        self.max_kernel_radius = radius;
        self
    }

    pub fn with_blocker_search_radius(mut self, radius: u32) -> Self {
        self.blocker_search_radius = radius;
        self
    }

    pub fn with_penumbra_scale(mut self, scale: f32) -> Self {
        self.penumbra_scale = scale;
        self
    }

    pub fn with_hardware_comparison(mut self, enabled: bool) -> Self {
        self.use_hardware_comparison = enabled;
        self
    }

    pub fn with_max_taps_per_axis(mut self, taps: Option<u32>) -> Self {
        self.max_taps_per_axis = taps;
        self
    }

    pub fn with_penumbra_model(mut self, model: PenumbraModel) -> Self {
        self.penumbra_model = model;
        self
    }

    /// One texel in normalized UV space
    #[inline]
    pub fn texel_size(&self) -> f32 {
        1.0 / self.texture_size as f32
    }

    /// Blend visibility toward fully lit by `1 - strength`
    #[inline]
    pub fn apply_strength(&self, visibility: f32) -> f32 {
        let strength = saturate(self.strength);
        1.0 - strength * (1.0 - saturate(visibility))
    }

    /// Check the invariants evaluation relies on
    pub fn validate(&self) -> Result<()> {
        if !self.bias.is_finite() || self.bias < 0.0 {
            return Err(ShadowError::invalid_param("bias", format!("must be finite and >= 0, got {}", self.bias)));
        }
        if !self.light_size.is_finite() || self.light_size <= 0.0 {
            return Err(ShadowError::invalid_param(
                "light_size",
                format!("must be finite and > 0, got {}", self.light_size),
            ));
        }
        if self.texture_size == 0 {
            return Err(ShadowError::invalid_param("texture_size", "must be > 0"));
        }
        if !self.penumbra_scale.is_finite() || self.penumbra_scale < 0.0 {
            return Err(ShadowError::invalid_param(
                "penumbra_scale",
                format!("must be finite and >= 0, got {}", self.penumbra_scale),
            ));
        }
        if self.max_kernel_radius > MAX_KERNEL_RADIUS_LIMIT {
            return Err(ShadowError::invalid_param(
                "max_kernel_radius",
                format!("must be <= {}, got {}", MAX_KERNEL_RADIUS_LIMIT, self.max_kernel_radius),
            ));
        }
        if self.blocker_search_radius > MAX_BLOCKER_RADIUS_LIMIT {
            return Err(ShadowError::invalid_param(
                "blocker_search_radius",
                format!("must be <= {}, got {}", MAX_BLOCKER_RADIUS_LIMIT, self.blocker_search_radius),
            ));
        }
        if self.max_taps_per_axis == Some(0) {
            return Err(ShadowError::invalid_param("max_taps_per_axis", "must be > 0 when set"));
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(ShadowError::invalid_param(
                "strength",
                format!("must be in [0, 1], got {}", self.strength),
            ));
        }
        Ok(())
    }
}
