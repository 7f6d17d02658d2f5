//! Traveling pulses that make up the brane field
//!
//! A wavelet is a compactly supported ring that expands from its source at
//! speed `v`. Two shapes exist: a symmetric sinusoidal pulse and a
//! forward-facing beam lobe (see `tractor`). Both are evaluated through
//! [`FieldSource`], which works on the displacement from the source so the
//! periodic wrapping happens once, in [`Wavelet`].

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::context::SimContext;
use super::tractor::{BeamParams, BeamShape};
use crate::error::{Result, SimError};

/// Distances and lifetimes below this are treated as zero
pub const EPSILON: f32 = 1e-6;

/// Stable handle of a wavelet inside its brane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveletId(pub u32);

/// Intensity and gradient of a wavelet shape
///
/// `rel` is the displacement from the source (already wrapped to the nearest
/// image), `lifetime` the time since emission.
pub trait FieldSource {
    fn intensity(&self, lifetime: f32, rel: Vec2) -> f32;
    fn gradient(&self, lifetime: f32, rel: Vec2) -> Vec2;
    /// Distance the front has traveled after `lifetime`
    fn front_radius(&self, lifetime: f32) -> f32;
}

/// Shape parameters of a symmetric pulse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseParams {
    /// Propagation speed (world units per ms)
    pub speed: f32,
    /// Ring width, one full wavelength
    pub wavelength: f32,
    pub amplitude: f32,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            speed: 32.0 / 1000.0,
            wavelength: 16.0,
            amplitude: 1.0,
        }
    }
}

impl PulseParams {
    pub fn validate(&self) -> Result<()> {
        SimError::require_positive("speed", self.speed)?;
        SimError::require_positive("wavelength", self.wavelength)?;
        if !self.amplitude.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "amplitude",
                value: self.amplitude,
            });
        }
        Ok(())
    }
}

/// Sinusoidal ring one wavelength wide, trailing the front at `v·t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseShape {
    v: f32,
    l: f32,
    a: f32,
    k: f32,
    omega: f32,
}

impl PulseShape {
    pub fn new(params: PulseParams) -> Result<Self> {
        params.validate()?;
        let k = TAU / params.wavelength;
        Ok(Self {
            v: params.speed,
            l: params.wavelength,
            a: params.amplitude,
            k,
            omega: params.speed * k,
        })
    }

    #[inline]
    pub fn wavelength(&self) -> f32 {
        self.l
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.v
    }

    /// Inside the active ring `[max(0, vt - L), vt]`?
    #[inline]
    fn active(&self, front: f32, d: f32) -> bool {
        d <= front && d >= (front - self.l).max(0.0)
    }
}

impl FieldSource for PulseShape {
    fn intensity(&self, lifetime: f32, rel: Vec2) -> f32 {
        let front = self.front_radius(lifetime);
        if front <= EPSILON {
            return 0.0;
        }
        let d = rel.length();
        if !self.active(front, d) {
            return 0.0;
        }
        // 1/(vt) keeps the ring's integrated intensity constant as it grows
        self.a * (self.k * d - self.omega * lifetime).sin() / front
    }

    fn gradient(&self, lifetime: f32, rel: Vec2) -> Vec2 {
        let front = self.front_radius(lifetime);
        if front <= EPSILON {
            return Vec2::ZERO;
        }
        let d = rel.length();
        if d <= EPSILON || !self.active(front, d) {
            return Vec2::ZERO;
        }
        let radial = self.a * self.k * (self.k * d - self.omega * lifetime).cos() / front;
        rel * (radial / d)
    }

    #[inline]
    fn front_radius(&self, lifetime: f32) -> f32 {
        self.v * lifetime
    }
}

/// The two wavelet kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveShape {
    Pulse(PulseShape),
    Beam(BeamShape),
}

impl FieldSource for WaveShape {
    #[inline]
    fn intensity(&self, lifetime: f32, rel: Vec2) -> f32 {
        match self {
            WaveShape::Pulse(s) => s.intensity(lifetime, rel),
            WaveShape::Beam(s) => s.intensity(lifetime, rel),
        }
    }

    #[inline]
    fn gradient(&self, lifetime: f32, rel: Vec2) -> Vec2 {
        match self {
            WaveShape::Pulse(s) => s.gradient(lifetime, rel),
            WaveShape::Beam(s) => s.gradient(lifetime, rel),
        }
    }

    #[inline]
    fn front_radius(&self, lifetime: f32) -> f32 {
        match self {
            WaveShape::Pulse(s) => s.front_radius(lifetime),
            WaveShape::Beam(s) => s.front_radius(lifetime),
        }
    }
}

/// A live pulse: shape + source + age
#[derive(Debug, Clone, PartialEq)]
pub struct Wavelet {
    source: Vec2,
    shape: WaveShape,
    lifetime: f32,
    max_lifetime: f32,
}

impl Wavelet {
    /// Symmetric pulse that dies once its trailing edge has crossed `reach`
    pub fn pulse(source: Vec2, params: PulseParams, reach: f32) -> Result<Self> {
        let shape = PulseShape::new(params)?;
        SimError::require_positive("reach", reach)?;
        Ok(Self {
            source,
            shape: WaveShape::Pulse(shape),
            lifetime: 0.0,
            max_lifetime: (reach + shape.wavelength()) / shape.speed(),
        })
    }

    /// Directional beam lobe facing `direction`
    pub fn beam(source: Vec2, direction: Vec2, params: BeamParams) -> Result<Self> {
        let shape = BeamShape::new(direction, params)?;
        Ok(Self {
            source,
            shape: WaveShape::Beam(shape),
            lifetime: 0.0,
            max_lifetime: shape.max_lifetime(),
        })
    }

    /// Start partway through the lifetime (used to phase-align emitters)
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime.max(0.0);
        self
    }

    /// Move the source into the primary cell; evaluation only shifts
    /// displacements by one world size
    pub(crate) fn wrap_source(&mut self, ctx: &SimContext) {
        self.source = ctx.wrap(self.source);
    }

    #[inline]
    pub fn source(&self) -> Vec2 {
        self.source
    }

    #[inline]
    pub fn shape(&self) -> &WaveShape {
        &self.shape
    }

    #[inline]
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    #[inline]
    pub fn max_lifetime(&self) -> f32 {
        self.max_lifetime
    }

    /// Current wavefront radius
    #[inline]
    pub fn front_radius(&self) -> f32 {
        self.shape.front_radius(self.lifetime)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifetime > self.max_lifetime
    }

    /// Advance the wavelet's age by one step
    pub fn age(&mut self, dt: f32) {
        self.lifetime += dt;
    }

    /// Intensity at a world point
    #[inline]
    pub fn intensity_at(&self, p: Vec2, ctx: &SimContext) -> f32 {
        let rel = ctx.displacement(self.source, p);
        self.shape.intensity(self.lifetime, rel)
    }

    /// Spatial gradient of the intensity at a world point
    #[inline]
    pub fn gradient_at(&self, p: Vec2, ctx: &SimContext) -> Vec2 {
        let rel = ctx.displacement(self.source, p);
        self.shape.gradient(self.lifetime, rel)
    }

    /// Add this wavelet's intensity at every point into `out`
    pub fn accumulate_intensity(&self, points: &[Vec2], ctx: &SimContext, out: &mut [f32]) {
        for (p, acc) in points.iter().zip(out.iter_mut()) {
            *acc += self.intensity_at(*p, ctx);
        }
    }

    /// Subtract this wavelet's gradient at every point from `out`
    pub fn accumulate_force(&self, points: &[Vec2], ctx: &SimContext, out: &mut [Vec2]) {
        for (p, acc) in points.iter().zip(out.iter_mut()) {
            *acc -= self.gradient_at(*p, ctx);
        }
    }
}
