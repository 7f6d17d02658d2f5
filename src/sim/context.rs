//! Simulation-wide rules shared by every field, body and collision operation
//!
//! Passed explicitly by reference so several worlds with different boundary
//! rules can coexist.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{PERIODIC_SHIFTS, min_image_displacement, wrap_position};
use crate::error::{Result, SimError};

/// Boundary conditions of the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pbc {
    /// Open plane, no wrapping
    None,
    /// All sides wrap onto a square torus of the given side length
    Toroidal { size: f32 },
}

/// Immutable per-world simulation rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimContext {
    pbc: Pbc,
    /// Per-step displacement cap as a fraction of the world size (PBC only)
    max_step_fraction: Option<f32>,
}

impl SimContext {
    /// Open-plane context
    pub fn open() -> Self {
        Self {
            pbc: Pbc::None,
            max_step_fraction: None,
        }
    }

    /// Toroidal context with side length `size`
    pub fn toroidal(size: f32) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(SimError::InvalidWorldSize(size));
        }
        Ok(Self {
            pbc: Pbc::Toroidal { size },
            max_step_fraction: None,
        })
    }

    /// Validate an arbitrary boundary setting
    pub fn new(pbc: Pbc) -> Result<Self> {
        match pbc {
            Pbc::None => Ok(Self::open()),
            Pbc::Toroidal { size } => Self::toroidal(size),
        }
    }

    /// Clamp each step's displacement to `fraction` of the world size
    pub fn with_max_step_fraction(mut self, fraction: f32) -> Result<Self> {
        SimError::require_positive("max_step_fraction", fraction)?;
        if fraction > 0.5 {
            return Err(SimError::InvalidParameter {
                name: "max_step_fraction",
                value: fraction,
            });
        }
        self.max_step_fraction = Some(fraction);
        Ok(self)
    }

    #[inline]
    pub fn pbc(&self) -> Pbc {
        self.pbc
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        matches!(self.pbc, Pbc::Toroidal { .. })
    }

    /// Side length of the torus, if any
    #[inline]
    pub fn world_size(&self) -> Option<f32> {
        match self.pbc {
            Pbc::None => None,
            Pbc::Toroidal { size } => Some(size),
        }
    }

    /// Largest displacement a body may take in one step, if clamped
    pub fn max_step(&self) -> Option<f32> {
        match (self.world_size(), self.max_step_fraction) {
            (Some(size), Some(fraction)) => Some(size * fraction),
            _ => None,
        }
    }

    /// Wrap a position into the primary cell (identity without PBC)
    #[inline]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        match self.pbc {
            Pbc::None => p,
            Pbc::Toroidal { size } => wrap_position(p, size),
        }
    }

    /// Displacement `to - from` using the nearest periodic image
    #[inline]
    pub fn displacement(&self, from: Vec2, to: Vec2) -> Vec2 {
        let d = to - from;
        match self.pbc {
            Pbc::None => d,
            Pbc::Toroidal { size } => min_image_displacement(d, size),
        }
    }

    /// Candidate images of `p`: zero shift first, then the 8 neighbours.
    ///
    /// Only the zero shift is returned without PBC. Checking against these
    /// images is exact only while relevant displacements stay under half the
    /// world size per step.
    pub fn images(&self, p: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let (size, count) = match self.pbc {
            Pbc::None => (0.0, 1),
            Pbc::Toroidal { size } => (size, PERIODIC_SHIFTS.len()),
        };
        PERIODIC_SHIFTS
            .iter()
            .take(count)
            .map(move |shift| p + *shift * size)
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toroidal_rejects_bad_size() {
        assert!(matches!(
            SimContext::toroidal(0.0),
            Err(SimError::InvalidWorldSize(_))
        ));
        assert!(SimContext::toroidal(-5.0).is_err());
        assert!(SimContext::toroidal(f32::INFINITY).is_err());
    }

    #[test]
    fn test_images_count() {
        let open = SimContext::open();
        assert_eq!(open.images(Vec2::ONE).count(), 1);

        let torus = SimContext::toroidal(100.0).unwrap();
        let images: Vec<_> = torus.images(Vec2::new(10.0, 20.0)).collect();
        assert_eq!(images.len(), 9);
        assert_eq!(images[0], Vec2::new(10.0, 20.0));
        assert!(images.contains(&Vec2::new(110.0, 120.0)));
        assert!(images.contains(&Vec2::new(-90.0, 20.0)));
    }

    #[test]
    fn test_images_reach_one_world_size() {
        let torus = SimContext::toroidal(100.0).unwrap();
        let nearest = |p: Vec2, target: Vec2| {
            torus
                .images(p)
                .map(|img| img.distance(target))
                .fold(f32::INFINITY, f32::min)
        };
        // a target within the neighbouring cells finds its true nearest image
        assert_eq!(nearest(Vec2::new(10.0, 20.0), Vec2::new(95.0, 20.0)), 15.0);
        // Precondition: only one shift per axis. A target 1.6 sizes away
        // reports 60 although the image at x = 210 is 40 away.
        assert_eq!(nearest(Vec2::new(10.0, 20.0), Vec2::new(170.0, 20.0)), 60.0);
    }

    #[test]
    fn test_displacement_uses_nearest_image() {
        let torus = SimContext::toroidal(100.0).unwrap();
        let d = torus.displacement(Vec2::new(95.0, 50.0), Vec2::new(5.0, 50.0));
        assert!((d - Vec2::new(10.0, 0.0)).length() < 1e-4);

        let open = SimContext::open();
        let d = open.displacement(Vec2::new(95.0, 50.0), Vec2::new(5.0, 50.0));
        assert_eq!(d, Vec2::new(-90.0, 0.0));
    }

    #[test]
    fn test_max_step() {
        let torus = SimContext::toroidal(200.0)
            .unwrap()
            .with_max_step_fraction(0.25)
            .unwrap();
        assert_eq!(torus.max_step(), Some(50.0));
        assert!(SimContext::toroidal(200.0).unwrap().with_max_step_fraction(0.9).is_err());
        assert_eq!(SimContext::open().max_step(), None);
    }
}
