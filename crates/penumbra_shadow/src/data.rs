//! GPU Shadow Data
//!
//! The uniform record a GPU rendition of the evaluator reads. Layout matches
//! the `SoftShadowParams` struct emitted by `penumbra_shader` (a `mat4x4<f32>`
//! followed by ten 4-byte scalars, padded to 112 bytes).

use penumbra_math::Mat4;
use serde::{Serialize, Deserialize};

use crate::params::{PenumbraModel, ShadowParams};

/// Uniform buffer contents for one shadowed light
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSoftShadowParams {
    /// World to light-texture matrix (column-major)
    pub light_matrix: [[f32; 4]; 4],

    pub bias: f32,

    pub light_size: f32,

    /// 1.0 / texture size
    pub texel_size: f32,

    pub penumbra_scale: f32,

    pub max_kernel_radius: i32,

    pub blocker_search_radius: i32,

    /// 0 when every kernel texel is sampled
    pub max_taps_per_axis: i32,

    /// 0 = average blocker, 1 = unbiased receiver
    pub penumbra_model: u32,

    /// 0 = shadows off, every fragment lit
    pub enabled: u32,

    pub strength: f32,

    #[serde(skip)]
    pub _padding: [u32; 2],
}

impl GpuSoftShadowParams {
    /// Size in bytes (16-byte multiple, as uniform buffers require)
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn new(light_matrix: &Mat4, params: &ShadowParams) -> Self {
        Self {
            light_matrix: light_matrix.to_cols_array_2d(),
            bias: params.bias,
            light_size: params.light_size,
            texel_size: params.texel_size(),
            penumbra_scale: params.penumbra_scale,
            max_kernel_radius: params.max_kernel_radius.min(i32::MAX as u32) as i32,
            blocker_search_radius: params.blocker_search_radius.min(i32::MAX as u32) as i32,
            max_taps_per_axis: params.max_taps_per_axis.unwrap_or(0).min(i32::MAX as u32) as i32,
            penumbra_model: match params.penumbra_model {
                PenumbraModel::AverageBlocker => 0,
                PenumbraModel::UnbiasedReceiver => 1,
            },
            enabled: u32::from(params.enabled),
            strength: params.strength,
            _padding: [0; 2],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
