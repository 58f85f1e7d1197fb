//! Visibility Evaluation
//!
//! Wires the projector, blocker estimator and adaptive filter together:
//!
//! ```text
//! world point ──► LightProjector ──► BlockerSearch ──► filter_visibility ──► visibility
//!                      │                   │
//!                      └─ out of frustum   └─ no blocker
//!                         => 1.0              => 1.0
//! ```
//!
//! An evaluator borrows the frame's depth buffer read-only. Batches are split
//! into contiguous chunks and evaluated on scoped worker threads; no state is
//! shared between invocations beyond that buffer.

use penumbra_math::{Mat4, Vec3};

use crate::blocker::{AverageBlockerSearch, BlockerEstimate, BlockerSearch};
use crate::depth_buffer::DepthBuffer;
use crate::error::Result;
use crate::filter::{filter_visibility, FilterResult};
use crate::params::ShadowParams;
use crate::projector::{LightProjector, ProjectedCoord};

/// Batches smaller than this are evaluated on the calling thread
pub const PARALLEL_BATCH_THRESHOLD: usize = 4096;

/// Visibility plus the intermediate values that produced it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilitySample {
    /// `None` when the perspective divide failed
    pub coord: Option<ProjectedCoord>,
    /// `None` when out of range or nothing occludes the receiver
    pub blocker: Option<BlockerEstimate>,
    /// `None` when the filter was skipped
    pub filter: Option<FilterResult>,
    /// Final value in [0, 1]
    pub visibility: f32,
}

impl VisibilitySample {
    fn lit(coord: Option<ProjectedCoord>) -> Self {
        Self { coord, blocker: None, filter: None, visibility: 1.0 }
    }
}

/// Soft shadow visibility for one world-space point, using the default
/// average-depth blocker search.
pub fn evaluate_visibility(
    point: Vec3,
    light_matrix: &Mat4,
    buffer: &DepthBuffer,
    params: &ShadowParams,
) -> f32 {
    SoftShadowEvaluator::new(buffer, LightProjector::new(*light_matrix), *params).visibility(point)
}

/// Per-frame soft shadow evaluator
pub struct SoftShadowEvaluator<'a, S: BlockerSearch = AverageBlockerSearch> {
    buffer: &'a DepthBuffer,
    projector: LightProjector,
    params: ShadowParams,
    search: S,
}

impl<'a> SoftShadowEvaluator<'a> {
    /// Evaluator over `buffer`; parameters are trusted as given
    pub fn new(buffer: &'a DepthBuffer, projector: LightProjector, params: ShadowParams) -> Self {
        debug_assert!(params.validate().is_ok(), "invalid shadow params: {:?}", params);
        Self {
            buffer,
            projector,
            params,
            search: AverageBlockerSearch,
        }
    }

    /// Evaluator that validates `params` first
    pub fn checked(buffer: &'a DepthBuffer, projector: LightProjector, params: ShadowParams) -> Result<Self> {
        params.validate()?;
        if params.texture_size != buffer.size() {
            log::warn!(
                "Shadow params texture_size {} differs from depth buffer size {}; kernel offsets will be rescaled",
                params.texture_size,
                buffer.size()
            );
        }
        Ok(Self::new(buffer, projector, params))
    }
}

impl<'a, S: BlockerSearch> SoftShadowEvaluator<'a, S> {
    /// Swap the blocker search strategy
    pub fn with_search<T: BlockerSearch>(self, search: T) -> SoftShadowEvaluator<'a, T> {
        SoftShadowEvaluator {
            buffer: self.buffer,
            projector: self.projector,
            params: self.params,
            search,
        }
    }

    #[inline]
    pub fn params(&self) -> &ShadowParams {
        &self.params
    }

    #[inline]
    pub fn projector(&self) -> &LightProjector {
        &self.projector
    }

    #[inline]
    pub fn buffer(&self) -> &DepthBuffer {
        self.buffer
    }

    /// Full evaluation for an already projected coordinate
    pub fn sample_coord(&self, coord: ProjectedCoord) -> VisibilitySample {
        if !self.params.enabled || !coord.in_range() {
            return VisibilitySample::lit(Some(coord));
        }
        let Some(blocker) = self.search.estimate(self.buffer, &coord, &self.params) else {
            return VisibilitySample::lit(Some(coord));
        };
        let filter = filter_visibility(self.buffer, &coord, blocker.penumbra, &self.params);
        VisibilitySample {
            coord: Some(coord),
            blocker: Some(blocker),
            filter: Some(filter),
            visibility: filter.visibility,
        }
    }

    /// Full evaluation for a world-space point
    pub fn sample(&self, point: Vec3) -> VisibilitySample {
        if !self.params.enabled {
            return VisibilitySample::lit(None);
        }
        match self.projector.project(point) {
            Some(coord) => self.sample_coord(coord),
            None => VisibilitySample::lit(None),
        }
    }

    /// Visibility in [0, 1] for a world-space point
    #[inline]
    pub fn visibility(&self, point: Vec3) -> f32 {
        self.sample(point).visibility
    }

    /// Visibility for every point, in order
    pub fn visibility_batch(&self, points: &[Vec3]) -> Vec<f32> {
        let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        if points.len() < PARALLEL_BATCH_THRESHOLD {
            return self.visibility_sequential(points);
        }
        self.visibility_batch_with_workers(points, workers)
    }

    /// Visibility for every point using up to `workers` threads
    pub fn visibility_batch_with_workers(&self, points: &[Vec3], workers: usize) -> Vec<f32> {
        let workers = workers.max(1);
        if workers == 1 || points.len() < 2 {
            return self.visibility_sequential(points);
        }

        let chunk_len = points.len().div_ceil(workers);
        let mut out = vec![1.0f32; points.len()];
        log::trace!(
            "Evaluating {} shadow samples on {} workers ({} per chunk)",
            points.len(),
            workers,
            chunk_len
        );

        let result = crossbeam_utils::thread::scope(|scope| {
            for (src, dst) in points.chunks(chunk_len).zip(out.chunks_mut(chunk_len)) {
                scope.spawn(move |_| {
                    for (point, slot) in src.iter().zip(dst.iter_mut()) {
                        *slot = self.visibility(*point);
                    }
                });
            }
        });

        if result.is_err() {
            log::error!("Shadow worker panicked; re-evaluating batch on the calling thread");
            return self.visibility_sequential(points);
        }
        out
    }

    fn visibility_sequential(&self, points: &[Vec3]) -> Vec<f32> {
        points.iter().map(|p| self.visibility(*p)).collect()
    }
}
