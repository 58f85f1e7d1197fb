//! Adaptive Filter
//!
//! Percentage-closer filtering over a box kernel whose half-width follows the
//! estimated penumbra. Contact shadows get a small kernel and stay crisp;
//! shadows far from their occluder get a wide kernel and soften. A zero
//! radius is the single-tap hard shadow test.

use penumbra_math::{Vec2, saturate};

use crate::depth_buffer::DepthBuffer;
use crate::params::ShadowParams;
use crate::projector::ProjectedCoord;

/// Outcome of one filter pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterResult {
    /// Half-width actually used, in texels
    pub kernel_radius: u32,
    /// Number of depth comparisons performed
    pub taps: u32,
    /// Sum of per-tap lit contributions
    pub lit: f32,
    /// `lit / taps`, in [0, 1]
    pub visibility: f32,
}

/// `min(floor(penumbra * penumbra_scale), max_kernel_radius)`
#[inline]
pub fn kernel_radius(penumbra: f32, params: &ShadowParams) -> u32 {
    let texels = penumbra * params.penumbra_scale;
    if texels.is_nan() || texels <= 0.0 {
        0
    } else if texels >= params.max_kernel_radius as f32 {
        params.max_kernel_radius
    } else {
        texels.floor() as u32
    }
}

/// Step between taps along one axis of a kernel of half-width `radius`.
///
/// The smallest stride that keeps the taps per axis at or under
/// `max_taps_per_axis`.
#[inline]
pub fn tap_stride(radius: u32, params: &ShadowParams) -> u32 {
    let side = 2 * radius + 1;
    match params.max_taps_per_axis {
        Some(taps) if taps > 0 => side.div_ceil(taps).max(1),
        _ => 1,
    }
}

/// Filter the depth buffer around `coord` with a kernel sized from `penumbra`
pub fn filter_visibility(
    buffer: &DepthBuffer,
    coord: &ProjectedCoord,
    penumbra: f32,
    params: &ShadowParams,
) -> FilterResult {
    let radius = kernel_radius(penumbra, params);
    let stride = tap_stride(radius, params) as usize;
    let current_depth = coord.current_depth(params.bias);
    let texel_size = params.texel_size();
    let center = coord.uv();
    let r = radius as i64;

    let mut lit = 0.0f32;
    let mut taps = 0u32;
    for y in (-r..=r).step_by(stride) {
        for x in (-r..=r).step_by(stride) {
            let uv = center + Vec2::new(x as f32, y as f32) * texel_size;
            lit += if params.use_hardware_comparison {
                buffer.sample_compare(uv, current_depth)
            } else if current_depth < buffer.sample(uv) {
                1.0
            } else {
                0.0
            };
            taps += 1;
        }
    }

    FilterResult {
        kernel_radius: radius,
        taps,
        lit,
        visibility: saturate(lit / taps as f32),
    }
}
