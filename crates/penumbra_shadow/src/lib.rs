//! # penumbra_shadow - Percentage-Closer Soft Shadows
//!
//! CPU reference implementation of the per-fragment soft shadow visibility
//! term:
//!
//! 1. **Projection**: world point to light-texture coordinates and depth
//! 2. **Blocker search**: mean depth of nearby occluders
//! 3. **Penumbra estimate**: similar-triangles ratio from receiver and blocker
//! 4. **Adaptive filter**: percentage-closer filtering with a kernel sized by
//!    the penumbra
//!
//! ## Example
//!
//! ```ignore
//! use penumbra_shadow::prelude::*;
//!
//! let buffer = DepthBuffer::new(2048, depth_texels)?;
//! let light = SpotLight::new(light_pos, Vec3::ZERO, radians(20.0), radians(30.0));
//! let params = ShadowQuality::Medium
//!     .to_config()
//!     .to_params(&LightShadowSettings::default());
//!
//! let evaluator = SoftShadowEvaluator::checked(&buffer, light.projector(1.0, 100.0), params)?;
//! let visibility = evaluator.visibility(fragment_world_pos);
//! ```

pub mod error;
pub mod depth_buffer;
pub mod params;
pub mod projector;
pub mod blocker;
pub mod filter;
pub mod evaluator;
pub mod data;
pub mod lighting;
pub mod config;

pub use error::{Result, ShadowError};
pub use depth_buffer::DepthBuffer;
pub use params::{PenumbraModel, ShadowParams, MAX_BLOCKER_RADIUS_LIMIT, MAX_KERNEL_RADIUS_LIMIT};
pub use projector::{LightProjector, ProjectedCoord};
pub use blocker::{
    estimate_penumbra, AverageBlockerSearch, BlockerEstimate, BlockerSearch,
    CenterTexelBlockerSearch,
};
pub use filter::{filter_visibility, kernel_radius, tap_stride, FilterResult};
pub use evaluator::{
    evaluate_visibility, SoftShadowEvaluator, VisibilitySample, PARALLEL_BATCH_THRESHOLD,
};
pub use data::GpuSoftShadowParams;
pub use lighting::{shade, shade_with_shadow, LightingTerms, SpotLight, SurfacePoint};
pub use config::{LightShadowSettings, ShadowQuality, SoftShadowConfig};

/// Prelude
pub mod prelude {
    pub use crate::{
        evaluate_visibility, DepthBuffer, LightProjector, LightShadowSettings,
        PenumbraModel, ShadowParams, ShadowQuality, SoftShadowConfig, SoftShadowEvaluator,
        SpotLight, SurfacePoint,
    };
    pub use penumbra_math::prelude::*;
}
