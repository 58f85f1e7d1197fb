//! Light-Space Depth Buffer
//!
//! CPU-side view of the depth image rendered from the light's point of view.
//! The buffer is square with a power-of-two side, stores normalized depth in
//! row-major order, and is only ever read during evaluation. Sampling mirrors
//! a GPU texture bound with nearest filtering and clamp-to-edge addressing.

use penumbra_math::Vec2;

use crate::error::{Result, ShadowError};

/// Square, read-only depth image captured from the light
#[derive(Clone, Debug, PartialEq)]
pub struct DepthBuffer {
    size: u32,
    texels: Vec<f32>,
}

impl DepthBuffer {
    /// Wrap `texels` (row-major, `size * size` entries)
    pub fn new(size: u32, texels: Vec<f32>) -> Result<Self> {
        if size == 0 {
            return Err(ShadowError::InvalidDepthBuffer("size must be non-zero".into()));
        }
        if !size.is_power_of_two() {
            return Err(ShadowError::InvalidDepthBuffer(format!(
                "size {} is not a power of two",
                size
            )));
        }
        let expected = size as usize * size as usize;
        if texels.len() != expected {
            return Err(ShadowError::InvalidDepthBuffer(format!(
                "expected {} texels for a {}x{} buffer, got {}",
                expected,
                size,
                size,
                texels.len()
            )));
        }
        Ok(Self { size, texels })
    }

    /// Buffer with every texel set to `depth`
    pub fn filled(size: u32, depth: f32) -> Result<Self> {
        Self::new(size, vec![depth; size as usize * size as usize])
    }

    /// Buffer whose texel `(x, y)` is `f(x, y)`
    pub fn from_fn(size: u32, mut f: impl FnMut(u32, u32) -> f32) -> Result<Self> {
        let mut texels = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            for x in 0..size {
                texels.push(f(x, y));
            }
        }
        Self::new(size, texels)
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Width of one texel in UV space
    #[inline]
    pub fn texel_size(&self) -> f32 {
        1.0 / self.size as f32
    }

    #[inline]
    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    /// Raw bytes for uploading to an `R32Float`/`Depth32Float` texture
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Texel lookup with clamp-to-edge addressing
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> f32 {
        let max = self.size as i64 - 1;
        let x = x.clamp(0, max) as usize;
        let y = y.clamp(0, max) as usize;
        self.texels[y * self.size as usize + x]
    }

    /// Texel containing `uv`
    #[inline]
    pub fn texel_coord(&self, uv: Vec2) -> (i64, i64) {
        let scaled = uv * self.size as f32;
        (scaled.x.floor() as i64, scaled.y.floor() as i64)
    }

    /// Nearest-texel depth at `uv`
    #[inline]
    pub fn sample(&self, uv: Vec2) -> f32 {
        let (x, y) = self.texel_coord(uv);
        self.texel(x, y)
    }

    /// Bilinear-weighted depth comparison at `uv`.
    ///
    /// Each of the four texels around `uv` contributes 1.0 when
    /// `reference < depth`, weighted by its bilinear footprint, matching
    /// a comparison sampler with `CompareFunction::Less` and linear filtering.
    pub fn sample_compare(&self, uv: Vec2, reference: f32) -> f32 {
        let tex = uv * self.size as f32 - Vec2::splat(0.5);
        let base = tex.floor();
        let f = tex - base;
        let (x0, y0) = (base.x as i64, base.y as i64);

        let pass = |x: i64, y: i64| if reference < self.texel(x, y) { 1.0 } else { 0.0 };

        let top = pass(x0, y0) * (1.0 - f.x) + pass(x0 + 1, y0) * f.x;
        let bottom = pass(x0, y0 + 1) * (1.0 - f.x) + pass(x0 + 1, y0 + 1) * f.x;
        top * (1.0 - f.y) + bottom * f.y
    }
}
