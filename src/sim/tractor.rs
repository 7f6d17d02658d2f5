//! Directional beam wavelets (tractor / repulsor)
//!
//! Intensity is the product of three clamped factors:
//! - a triangular window `W = 1 - 2|d - vt|/L` around the front
//! - a radial falloff `Id = A(√Rmax - √d)`, zero beyond `Rmax`
//! - an angular lobe `Ia = cosθ - cosθ0`, zero outside the half-angle `θ0`
//!
//! The gradient is the product rule over all three, and each factor's
//! gradient is zeroed wherever the factor itself is clamped to zero.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use super::wavelet::{EPSILON, FieldSource};
use crate::error::{Result, SimError};

/// Shape parameters of a beam wavelet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamParams {
    pub speed: f32,
    pub wavelength: f32,
    /// Positive for a tractor pulse, negative for a repulsor
    pub amplitude: f32,
    /// Intensity is zero past this distance
    pub r_max: f32,
    /// Half-angle of the lobe (radians)
    pub theta0: f32,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            speed: 12.8e-2,
            wavelength: 32.0,
            amplitude: 0.1,
            r_max: 180.0,
            theta0: PI / 6.0,
        }
    }
}

impl BeamParams {
    pub fn validate(&self) -> Result<()> {
        SimError::require_positive("speed", self.speed)?;
        SimError::require_positive("wavelength", self.wavelength)?;
        SimError::require_positive("r_max", self.r_max)?;
        SimError::require_positive("theta0", self.theta0)?;
        if self.theta0 > PI {
            return Err(SimError::InvalidParameter {
                name: "theta0",
                value: self.theta0,
            });
        }
        if !self.amplitude.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "amplitude",
                value: self.amplitude,
            });
        }
        Ok(())
    }

    /// Same shape with the amplitude replaced
    pub fn with_amplitude(self, amplitude: f32) -> Self {
        Self { amplitude, ..self }
    }
}

/// Forward-facing lobe with inverse-square-root radial falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamShape {
    dir: Vec2,
    v: f32,
    l: f32,
    a: f32,
    r_max: f32,
    sqrt_r_max: f32,
    cos_theta0: f32,
}

impl BeamShape {
    pub fn new(direction: Vec2, params: BeamParams) -> Result<Self> {
        params.validate()?;
        let len = direction.length();
        if !(len.is_finite() && len > EPSILON) {
            return Err(SimError::ZeroDirection);
        }
        Ok(Self {
            dir: direction / len,
            v: params.speed,
            l: params.wavelength,
            a: params.amplitude,
            r_max: params.r_max,
            sqrt_r_max: params.r_max.sqrt(),
            cos_theta0: params.theta0.cos(),
        })
    }

    /// Unit facing direction
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.dir
    }

    /// Time for the trailing edge to clear `Rmax`
    pub fn max_lifetime(&self) -> f32 {
        (self.r_max + self.l) / self.v
    }

    /// Window value (may be negative outside the pulse)
    #[inline]
    fn window(&self, front: f32, d: f32) -> f32 {
        1.0 - 2.0 * (d - front).abs() / self.l
    }

    #[inline]
    fn radial(&self, d: f32) -> f32 {
        if d < self.r_max {
            self.a * (self.sqrt_r_max - d.sqrt())
        } else {
            0.0
        }
    }
}

impl FieldSource for BeamShape {
    fn intensity(&self, lifetime: f32, rel: Vec2) -> f32 {
        if lifetime <= 0.0 {
            return 0.0;
        }
        let d = rel.length();
        if d <= EPSILON {
            return 0.0;
        }
        let w = self.window(self.front_radius(lifetime), d);
        if w <= 0.0 {
            return 0.0;
        }
        let cos_theta = rel.dot(self.dir) / d;
        let ia = (cos_theta - self.cos_theta0).max(0.0);
        w * self.radial(d) * ia
    }

    fn gradient(&self, lifetime: f32, rel: Vec2) -> Vec2 {
        if lifetime <= 0.0 {
            return Vec2::ZERO;
        }
        let d = rel.length();
        if d <= EPSILON {
            return Vec2::ZERO;
        }
        let front = self.front_radius(lifetime);
        let w = self.window(front, d);
        if w <= 0.0 {
            return Vec2::ZERO;
        }
        let u = rel / d;

        let id = self.radial(d);
        let grad_id = if d < self.r_max {
            u * (-0.5 * self.a / d.sqrt())
        } else {
            Vec2::ZERO
        };

        let cos_theta = rel.dot(self.dir) / d;
        let (ia, grad_ia) = if cos_theta > self.cos_theta0 {
            (cos_theta - self.cos_theta0, (self.dir - u * cos_theta) / d)
        } else {
            (0.0, Vec2::ZERO)
        };

        // slope of the triangle, zero exactly at its peak
        let offset = d - front;
        let grad_w = if offset > 0.0 {
            u * (-2.0 / self.l)
        } else if offset < 0.0 {
            u * (2.0 / self.l)
        } else {
            Vec2::ZERO
        };

        grad_w * (id * ia) + grad_id * (w * ia) + grad_ia * (w * id)
    }

    #[inline]
    fn front_radius(&self, lifetime: f32) -> f32 {
        self.v * lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beam() -> BeamShape {
        let params = BeamParams {
            speed: 0.1,
            wavelength: 20.0,
            amplitude: 0.5,
            r_max: 100.0,
            theta0: PI / 4.0,
        };
        BeamShape::new(Vec2::new(0.0, -2.0), params).unwrap()
    }

    #[test]
    fn test_direction_normalized() {
        let b = beam();
        assert!((b.direction() - Vec2::new(0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(matches!(
            BeamShape::new(Vec2::ZERO, BeamParams::default()),
            Err(SimError::ZeroDirection)
        ));
    }

    #[test]
    fn test_lobe_faces_forward() {
        let b = beam();
        // front at 30
        let ahead = b.intensity(300.0, Vec2::new(0.0, -30.0));
        let behind = b.intensity(300.0, Vec2::new(0.0, 30.0));
        let side = b.intensity(300.0, Vec2::new(30.0, 0.0));
        assert!(ahead > 0.0);
        assert_eq!(behind, 0.0);
        assert_eq!(side, 0.0);
        assert_eq!(b.gradient(300.0, Vec2::new(0.0, 30.0)), Vec2::ZERO);
    }

    #[test]
    fn test_silent_at_birth_and_past_cutoff() {
        let b = beam();
        assert_eq!(b.intensity(0.0, Vec2::new(0.0, -5.0)), 0.0);
        // front at 105, beyond r_max = 100
        assert_eq!(b.intensity(1050.0, Vec2::new(0.0, -104.0)), 0.0);
        assert_eq!(b.gradient(1050.0, Vec2::new(0.0, -104.0)), Vec2::ZERO);
    }

    #[test]
    fn test_window_is_triangular() {
        let b = beam();
        let peak = b.intensity(300.0, Vec2::new(0.0, -30.0));
        let edge = b.intensity(300.0, Vec2::new(0.0, -39.9));
        let out = b.intensity(300.0, Vec2::new(0.0, -40.1));
        assert!(peak > edge);
        assert!(edge > 0.0);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let b = beam();
        let t = 300.0;
        let h = 1e-2;
        // off-peak, inside the lobe, off-axis so every factor varies
        for rel in [Vec2::new(5.0, -25.0), Vec2::new(-8.0, -34.0), Vec2::new(3.0, -22.5)] {
            let g = b.gradient(t, rel);
            let fx = (b.intensity(t, rel + Vec2::X * h) - b.intensity(t, rel - Vec2::X * h)) / (2.0 * h);
            let fy = (b.intensity(t, rel + Vec2::Y * h) - b.intensity(t, rel - Vec2::Y * h)) / (2.0 * h);
            assert!((g.x - fx).abs() < 1e-3, "{rel:?}: {g:?} vs ({fx}, {fy})");
            assert!((g.y - fy).abs() < 1e-3, "{rel:?}: {g:?} vs ({fx}, {fy})");
        }
    }

    #[test]
    fn test_max_lifetime() {
        let b = BeamShape::new(Vec2::Y, BeamParams::default()).unwrap();
        assert!((b.max_lifetime() - (180.0 + 32.0) / 12.8e-2).abs() < 1e-2);
    }
}
