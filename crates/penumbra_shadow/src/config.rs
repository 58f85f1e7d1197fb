//! Soft Shadow Configuration
//!
//! Global and per-light settings with serde support, quality presets, and
//! JSON loading. A config resolves into the [`ShadowParams`] record that
//! evaluation consumes.

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::params::{PenumbraModel, ShadowParams, MAX_BLOCKER_RADIUS_LIMIT, MAX_KERNEL_RADIUS_LIMIT};

/// Global soft shadow configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftShadowConfig {
    /// Enable shadows globally
    pub enabled: bool,

    /// Depth buffer resolution (power of 2)
    pub resolution: u32,

    /// Filter half-width clamp, in texels
    pub max_kernel_radius: u32,

    /// Blocker search half-width (4 => 9x9 window)
    pub blocker_search_radius: u32,

    /// Penumbra ratio to texels
    pub penumbra_scale: f32,

    /// Optional cap on taps per kernel axis
    pub max_taps_per_axis: Option<u32>,

    /// Per-tap bilinear comparison sampling
    pub use_hardware_comparison: bool,

    /// Receiver depth convention for the penumbra estimate
    pub penumbra_model: PenumbraModel,
}

impl Default for SoftShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            max_kernel_radius: 7,
            blocker_search_radius: 4,
            penumbra_scale: 1.0,
            max_taps_per_axis: None,
            use_hardware_comparison: false,
            penumbra_model: PenumbraModel::AverageBlocker,
        }
    }
}

impl SoftShadowConfig {
    /// Create a configuration with shadows disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Parse from a JSON string; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded soft shadow config from {}", path.display());
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Soft shadow config {} unusable ({}); falling back to defaults", path.display(), err);
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        let before = self.clone();

        self.resolution = self.resolution.clamp(256, 8192).next_power_of_two();
        self.max_kernel_radius = self.max_kernel_radius.min(MAX_KERNEL_RADIUS_LIMIT);
        self.blocker_search_radius = self.blocker_search_radius.min(MAX_BLOCKER_RADIUS_LIMIT);
        if !self.penumbra_scale.is_finite() || self.penumbra_scale < 0.0 {
            self.penumbra_scale = 1.0;
        }
        if self.max_taps_per_axis == Some(0) {
            self.max_taps_per_axis = None;
        }

        if *self != before {
            log::warn!("Soft shadow config adjusted during validation: {:?} -> {:?}", before, self);
        }
    }

    /// Resolve the evaluation record for one light
    pub fn to_params(&self, light: &LightShadowSettings) -> ShadowParams {
        ShadowParams {
            enabled: self.enabled,
            bias: light.depth_bias.max(0.0),
            light_size: if light.light_size > 0.0 { light.light_size } else { LightShadowSettings::default().light_size },
            max_kernel_radius: self.max_kernel_radius.min(MAX_KERNEL_RADIUS_LIMIT),
            texture_size: light.effective_resolution(self.resolution),
            use_hardware_comparison: self.use_hardware_comparison,
            blocker_search_radius: self.blocker_search_radius.min(MAX_BLOCKER_RADIUS_LIMIT),
            penumbra_scale: self.penumbra_scale,
            max_taps_per_axis: self.max_taps_per_axis,
            penumbra_model: self.penumbra_model,
            strength: light.strength.clamp(0.0, 1.0),
        }
    }
}

/// Per-light shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightShadowSettings {
    /// Resolution override (None = use global default)
    pub resolution: Option<u32>,

    /// Depth bias to prevent shadow acne
    pub depth_bias: f32,

    /// Apparent light size driving penumbra width
    pub light_size: f32,

    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub strength: f32,
}

impl Default for LightShadowSettings {
    fn default() -> Self {
        Self {
            resolution: None,
            depth_bias: 0.005,
            light_size: 2.0,
            strength: 1.0,
        }
    }
}

impl LightShadowSettings {
    /// Settings for a narrow, hard-edged spot
    pub fn spot() -> Self {
        Self {
            depth_bias: 0.005,
            light_size: 1.0,
            ..Default::default()
        }
    }

    /// Settings for a large, soft area-like spot
    pub fn area() -> Self {
        Self {
            depth_bias: 0.008,
            light_size: 4.0,
            ..Default::default()
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Get effective resolution (override or default)
    pub fn effective_resolution(&self, default: u32) -> u32 {
        self.resolution.unwrap_or(default)
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQuality {
    /// No shadows
    Off,
    /// Single-tap hard shadows
    Hard,
    /// Small kernel, strided
    Low,
    /// Balanced quality and performance
    Medium,
    /// Wide kernel, full sampling
    High,
    /// Maximum kernel with hardware comparison
    Ultra,
}

impl ShadowQuality {
    /// Convert to a SoftShadowConfig
    pub fn to_config(self) -> SoftShadowConfig {
        match self {
            Self::Off => SoftShadowConfig::disabled(),
            Self::Hard => SoftShadowConfig {
                max_kernel_radius: 0,
                ..Default::default()
            },
            Self::Low => SoftShadowConfig {
                resolution: 1024,
                max_kernel_radius: 4,
                blocker_search_radius: 2,
                penumbra_scale: 30.0,
                max_taps_per_axis: Some(5),
                ..Default::default()
            },
            Self::Medium => SoftShadowConfig {
                penumbra_scale: 30.0,
                max_taps_per_axis: Some(9),
                ..Default::default()
            },
            Self::High => SoftShadowConfig {
                resolution: 4096,
                max_kernel_radius: 12,
                penumbra_scale: 30.0,
                ..Default::default()
            },
            Self::Ultra => SoftShadowConfig {
                resolution: 4096,
                max_kernel_radius: MAX_KERNEL_RADIUS_LIMIT,
                blocker_search_radius: 6,
                penumbra_scale: 30.0,
                use_hardware_comparison: true,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_shadow_config_default() {
        let config = SoftShadowConfig::default();
        assert!(config.enabled);
        assert_eq!(config.resolution, 2048);
        assert_eq!(config.blocker_search_radius, 4);
    }

    #[test]
    fn test_soft_shadow_config_validate() {
        let mut config = SoftShadowConfig {
            resolution: 1000,         // Not power of 2
            max_kernel_radius: 100,   // Too high
            blocker_search_radius: 20,
            penumbra_scale: f32::NAN,
            max_taps_per_axis: Some(0),
            ..Default::default()
        };

        config.validate();

        assert_eq!(config.resolution, 1024);
        assert_eq!(config.max_kernel_radius, MAX_KERNEL_RADIUS_LIMIT);
        assert_eq!(config.blocker_search_radius, MAX_BLOCKER_RADIUS_LIMIT);
        assert_eq!(config.penumbra_scale, 1.0);
        assert_eq!(config.max_taps_per_axis, None);
    }

    #[test]
    fn test_soft_shadow_config_serialization() {
        let config = ShadowQuality::Ultra.to_config();
        let json = config.to_json_string().unwrap();
        let restored = SoftShadowConfig::from_json_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SoftShadowConfig::from_json_str(r#"{ "max_kernel_radius": 3 }"#).unwrap();
        assert_eq!(config.max_kernel_radius, 3);
        assert_eq!(config.resolution, 2048);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(SoftShadowConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_to_params() {
        let config = SoftShadowConfig::default();
        let light = LightShadowSettings::area().with_resolution(512);
        let params = config.to_params(&light);
        assert_eq!(params.texture_size, 512);
        assert_eq!(params.light_size, 4.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_disabled_config_switches_shadows_off() {
        let params = SoftShadowConfig::disabled().to_params(&LightShadowSettings::default());
        assert!(!params.enabled);
        assert_eq!(params.max_kernel_radius, SoftShadowConfig::default().max_kernel_radius);
        assert!(ShadowQuality::Hard.to_config().to_params(&LightShadowSettings::default()).enabled);
    }

    #[test]
    fn test_light_strength_reaches_params() {
        let params = SoftShadowConfig::default().to_params(&LightShadowSettings::default().with_strength(0.25));
        assert_eq!(params.strength, 0.25);
        assert_eq!(params.apply_strength(0.0), 0.75);

        // Out-of-range values from JSON are clamped on the way through
        let light = LightShadowSettings { strength: 3.0, ..Default::default() };
        assert_eq!(SoftShadowConfig::default().to_params(&light).strength, 1.0);
    }

    #[test]
    fn test_shadow_quality_presets() {
        let hard = ShadowQuality::Hard.to_config();
        assert_eq!(hard.max_kernel_radius, 0);

        let ultra = ShadowQuality::Ultra.to_config();
        assert!(ultra.use_hardware_comparison);

        let off = ShadowQuality::Off.to_config();
        assert!(!off.enabled);
    }
}
