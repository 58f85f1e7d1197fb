//! Blocker Estimator
//!
//! Estimates how far occluders sit in front of the receiver and turns that
//! into a penumbra width with the PCSS similar-triangles approximation:
//!
//! ```text
//! penumbra = (receiver - blocker) * light_size / blocker
//! ```
//!
//! The default search reads the same depth buffer the filter uses, averaging
//! every texel in a small window that is nearer to the light than the
//! receiver. A dedicated blocker-search pass can be substituted by
//! implementing [`BlockerSearch`].

use penumbra_math::Vec2;

use crate::depth_buffer::DepthBuffer;
use crate::params::ShadowParams;
use crate::projector::ProjectedCoord;

/// Result of a successful blocker search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockerEstimate {
    /// Mean depth of the occluding samples
    pub average_depth: f32,
    /// Number of occluding samples found
    pub blocker_count: u32,
    /// Penumbra ratio, clamped to `>= 0` (may be infinite for a blocker at depth 0)
    pub penumbra: f32,
}

/// Similar-triangles penumbra estimate, clamped to `>= 0`.
///
/// NaN (e.g. `0 / 0`) collapses to zero. A blocker at depth zero with a
/// receiver behind it yields `+inf`, which the filter clamps to its maximum
/// kernel.
#[inline]
pub fn estimate_penumbra(receiver_depth: f32, blocker_depth: f32, light_size: f32) -> f32 {
    let penumbra = (receiver_depth - blocker_depth) * light_size / blocker_depth;
    if penumbra.is_nan() || penumbra < 0.0 { 0.0 } else { penumbra }
}

/// Strategy for locating occluders around a projected coordinate
pub trait BlockerSearch: Send + Sync {
    /// Mean depth and count of samples nearer than `current_depth`.
    ///
    /// Returns `None` when nothing occludes the receiver.
    fn find_blockers(
        &self,
        buffer: &DepthBuffer,
        coord: &ProjectedCoord,
        current_depth: f32,
        params: &ShadowParams,
    ) -> Option<(f32, u32)>;

    /// Blocker depth plus the derived penumbra
    fn estimate(
        &self,
        buffer: &DepthBuffer,
        coord: &ProjectedCoord,
        params: &ShadowParams,
    ) -> Option<BlockerEstimate> {
        let current_depth = coord.current_depth(params.bias);
        let (average_depth, blocker_count) = self.find_blockers(buffer, coord, current_depth, params)?;
        let receiver = params.penumbra_model.receiver_depth(current_depth, params.bias);
        Some(BlockerEstimate {
            average_depth,
            blocker_count,
            penumbra: estimate_penumbra(receiver, average_depth, params.light_size),
        })
    }
}

/// Averages occluding depths over a `(2r+1)^2` window, `r = blocker_search_radius`
#[derive(Clone, Copy, Debug, Default)]
pub struct AverageBlockerSearch;

impl BlockerSearch for AverageBlockerSearch {
    fn find_blockers(
        &self,
        buffer: &DepthBuffer,
        coord: &ProjectedCoord,
        current_depth: f32,
        params: &ShadowParams,
    ) -> Option<(f32, u32)> {
        let radius = params.blocker_search_radius as i32;
        let texel_size = params.texel_size();
        let center = coord.uv();

        let mut sum = 0.0f32;
        let mut count = 0u32;
        for y in -radius..=radius {
            for x in -radius..=radius {
                let offset = Vec2::new(x as f32, y as f32) * texel_size;
                let depth = buffer.sample(center + offset);
                if depth < current_depth {
                    sum += depth;
                    count += 1;
                }
            }
        }

        if count == 0 {
            return None;
        }
        Some((sum / count as f32, count))
    }
}

/// Uses the single texel under the receiver as the blocker
#[derive(Clone, Copy, Debug, Default)]
pub struct CenterTexelBlockerSearch;

impl BlockerSearch for CenterTexelBlockerSearch {
    fn find_blockers(
        &self,
        buffer: &DepthBuffer,
        coord: &ProjectedCoord,
        current_depth: f32,
        _params: &ShadowParams,
    ) -> Option<(f32, u32)> {
        let depth = buffer.sample(coord.uv());
        (depth < current_depth).then_some((depth, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord_at(buffer: &DepthBuffer, x: u32, y: u32, depth: f32) -> ProjectedCoord {
        let texel = buffer.texel_size();
        ProjectedCoord { x: (x as f32 + 0.5) * texel, y: (y as f32 + 0.5) * texel, depth }
    }

    #[test]
    fn test_penumbra_formula() {
        let penumbra = estimate_penumbra(0.8, 0.4, 2.0);
        assert!((penumbra - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_penumbra_clamps_negative() {
        assert_eq!(estimate_penumbra(0.3, 0.4, 2.0), 0.0);
    }

    #[test]
    fn test_penumbra_zero_blocker_depth() {
        assert_eq!(estimate_penumbra(0.5, 0.0, 1.0), f32::INFINITY);
        assert_eq!(estimate_penumbra(0.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_no_blockers_reports_none() {
        let buffer = DepthBuffer::filled(32, 1.0).unwrap();
        let params = ShadowParams::for_texture_size(32).with_bias(0.0);
        let coord = coord_at(&buffer, 16, 16, 0.5);
        assert!(AverageBlockerSearch.estimate(&buffer, &coord, &params).is_none());
    }

    #[test]
    fn test_full_window_average() {
        let buffer = DepthBuffer::filled(32, 0.25).unwrap();
        let params = ShadowParams::for_texture_size(32).with_bias(0.0).with_light_size(1.0);
        let coord = coord_at(&buffer, 16, 16, 0.5);
        let estimate = AverageBlockerSearch.estimate(&buffer, &coord, &params).unwrap();
        assert_eq!(estimate.blocker_count, 81);
        assert!((estimate.average_depth - 0.25).abs() < 1e-6);
        assert!((estimate.penumbra - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_radius_is_configurable() {
        let buffer = DepthBuffer::filled(32, 0.25).unwrap();
        let params = ShadowParams::for_texture_size(32).with_bias(0.0).with_blocker_search_radius(1);
        let coord = coord_at(&buffer, 16, 16, 0.5);
        let (_, count) = AverageBlockerSearch.find_blockers(&buffer, &coord, 0.5, &params).unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn test_only_nearer_samples_count() {
        // Left half occludes at 0.2, right half sits behind the receiver
        let buffer = DepthBuffer::from_fn(32, |x, _| if x < 16 { 0.2 } else { 0.9 }).unwrap();
        let params = ShadowParams::for_texture_size(32).with_bias(0.0);
        let coord = coord_at(&buffer, 16, 16, 0.5);
        let (average, count) = AverageBlockerSearch.find_blockers(&buffer, &coord, 0.5, &params).unwrap();
        // Columns 12..=15 of the 9-wide window occlude
        assert_eq!(count, 4 * 9);
        assert!((average - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_center_texel_search() {
        let buffer = DepthBuffer::from_fn(8, |x, y| if x == 4 && y == 4 { 0.1 } else { 1.0 }).unwrap();
        let params = ShadowParams::for_texture_size(8).with_bias(0.0);
        let hit = coord_at(&buffer, 4, 4, 0.5);
        let miss = coord_at(&buffer, 3, 4, 0.5);
        assert_eq!(CenterTexelBlockerSearch.find_blockers(&buffer, &hit, 0.5, &params), Some((0.1, 1)));
        assert!(CenterTexelBlockerSearch.find_blockers(&buffer, &miss, 0.5, &params).is_none());
    }

    #[test]
    fn test_unbiased_receiver_grows_penumbra() {
        let buffer = DepthBuffer::filled(16, 0.4).unwrap();
        let base = ShadowParams::for_texture_size(16).with_bias(0.1).with_light_size(1.0);
        let coord = coord_at(&buffer, 8, 8, 0.7);
        let biased = AverageBlockerSearch.estimate(&buffer, &coord, &base).unwrap();
        let unbiased = AverageBlockerSearch
            .estimate(&buffer, &coord, &base.with_penumbra_model(crate::params::PenumbraModel::UnbiasedReceiver))
            .unwrap();
        // receiver 0.6 vs 0.7 against blockers at 0.4
        assert!((biased.penumbra - 0.5).abs() < 1e-5);
        assert!((unbiased.penumbra - 0.75).abs() < 1e-5);
    }
}
