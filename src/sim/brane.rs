//! The brane: aggregate field of all live wavelets
//!
//! Owns the wavelets, a square sample grid recentered on the viewer, and the
//! intensity sampled on that grid. The grid is recomputed from scratch once
//! per step; force queries evaluate the wavelets directly at arbitrary points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::context::SimContext;
use super::wavelet::{Wavelet, WaveletId};
use crate::error::{Result, SimError};

/// Sample grid covering the visible region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Cells per side
    pub resolution: usize,
    /// Side length in world units
    pub extent: f32,
    /// World-space center of the grid
    pub center: Vec2,
}

impl GridSpec {
    pub fn new(resolution: usize, extent: f32, center: Vec2) -> Result<Self> {
        if resolution == 0 {
            return Err(SimError::grid("resolution must be at least 1"));
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(SimError::grid(format!("extent must be positive, got {extent}")));
        }
        Ok(Self {
            resolution,
            extent,
            center,
        })
    }

    /// World units between neighbouring samples
    #[inline]
    pub fn spacing(&self) -> f32 {
        self.extent / self.resolution as f32
    }

    /// Cell-center sample points, row-major (y outer, x inner)
    pub fn points(&self) -> Vec<Vec2> {
        let step = self.spacing();
        let origin = self.center - Vec2::splat(0.5 * self.extent) + Vec2::splat(0.5 * step);
        let n = self.resolution;
        (0..n * n)
            .map(|i| origin + Vec2::new((i % n) as f32, (i / n) as f32) * step)
            .collect()
    }
}

/// Scalar wavelet field over the world
#[derive(Debug, Clone)]
pub struct Brane {
    wavelets: Vec<(WaveletId, Wavelet)>,
    grid: GridSpec,
    /// Sample points, wrapped into the primary cell under PBC
    coords: Vec<Vec2>,
    intensity: Vec<f32>,
    next_id: u32,
}

impl Brane {
    pub fn new(grid: GridSpec, ctx: &SimContext) -> Self {
        let mut brane = Self {
            wavelets: Vec::new(),
            grid,
            coords: Vec::new(),
            intensity: Vec::new(),
            next_id: 1,
        };
        brane.rebuild_grid(ctx);
        brane
    }

    #[inline]
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Sample points of the intensity buffer
    #[inline]
    pub fn coords(&self) -> &[Vec2] {
        &self.coords
    }

    /// Intensity on the grid as of the last step (row-major)
    #[inline]
    pub fn intensity(&self) -> &[f32] {
        &self.intensity
    }

    pub fn wavelet_count(&self) -> usize {
        self.wavelets.len()
    }

    pub fn wavelets(&self) -> impl Iterator<Item = (WaveletId, &Wavelet)> {
        self.wavelets.iter().map(|(id, w)| (*id, w))
    }

    pub fn wavelet(&self, id: WaveletId) -> Option<&Wavelet> {
        self.wavelets.iter().find(|(wid, _)| *wid == id).map(|(_, w)| w)
    }

    /// Take ownership of a wavelet; it contributes from the next evaluation on.
    /// The source is wrapped into the primary cell.
    pub fn register_wavelet(&mut self, mut wavelet: Wavelet, ctx: &SimContext) -> WaveletId {
        wavelet.wrap_source(ctx);
        let id = WaveletId(self.next_id);
        self.next_id += 1;
        self.wavelets.push((id, wavelet));
        id
    }

    /// Detach a wavelet, handing it back so it can be registered elsewhere
    pub fn remove_wavelet(&mut self, id: WaveletId) -> Option<Wavelet> {
        let idx = self.wavelets.iter().position(|(wid, _)| *wid == id)?;
        Some(self.wavelets.swap_remove(idx).1)
    }

    /// Move the grid to a new center (e.g. following the player) and
    /// resample it without aging anything
    pub fn recenter(&mut self, center: Vec2, ctx: &SimContext) {
        self.grid.center = ctx.wrap(center);
        self.rebuild_grid(ctx);
        self.resample(ctx);
    }

    fn rebuild_grid(&mut self, ctx: &SimContext) {
        self.coords = self.grid.points().into_iter().map(|p| ctx.wrap(p)).collect();
        self.intensity = vec![0.0; self.coords.len()];
    }

    /// Advance one logical step: prune wavelets that expired last step, age
    /// the rest once, and resample the grid.
    ///
    /// Must be called exactly once per step or wavelets age twice.
    pub fn step(&mut self, dt: f32, ctx: &SimContext) {
        self.advance(dt);
        self.resample(ctx);
    }

    /// Prune and age like `step` but leave the grid samples stale, for
    /// callers that recenter (and so resample) later in the same step
    pub fn advance(&mut self, dt: f32) {
        let before = self.wavelets.len();
        self.wavelets.retain(|(_, w)| !w.is_expired());
        let pruned = before - self.wavelets.len();
        if pruned > 0 {
            log::debug!("Pruned {} expired wavelets, {} live", pruned, self.wavelets.len());
        }

        for (_, w) in &mut self.wavelets {
            w.age(dt);
        }
    }

    /// Recompute the grid intensity from the live wavelets
    pub fn resample(&mut self, ctx: &SimContext) {
        self.intensity.fill(0.0);
        for (_, w) in &self.wavelets {
            w.accumulate_intensity(&self.coords, ctx, &mut self.intensity);
        }
    }

    /// Total intensity at arbitrary points
    pub fn intensity_at(&self, points: &[Vec2], ctx: &SimContext) -> Vec<f32> {
        let wrapped: Vec<Vec2> = points.iter().map(|p| ctx.wrap(*p)).collect();
        let mut out = vec![0.0; wrapped.len()];
        for (_, w) in &self.wavelets {
            w.accumulate_intensity(&wrapped, ctx, &mut out);
        }
        out
    }

    pub fn total_intensity_at(&self, p: Vec2, ctx: &SimContext) -> f32 {
        let p = ctx.wrap(p);
        self.wavelets.iter().map(|(_, w)| w.intensity_at(p, ctx)).sum()
    }

    /// Force (negative total gradient) at arbitrary points
    pub fn force_at(&self, points: &[Vec2], ctx: &SimContext) -> Vec<Vec2> {
        let wrapped: Vec<Vec2> = points.iter().map(|p| ctx.wrap(*p)).collect();
        let mut out = vec![Vec2::ZERO; wrapped.len()];
        for (_, w) in &self.wavelets {
            w.accumulate_force(&wrapped, ctx, &mut out);
        }
        out
    }

    /// Single-point force query used by the integrator
    pub fn force_at_point(&self, p: Vec2, ctx: &SimContext) -> Vec2 {
        let p = ctx.wrap(p);
        self.wavelets
            .iter()
            .fold(Vec2::ZERO, |f, (_, w)| f - w.gradient_at(p, ctx))
    }
}
