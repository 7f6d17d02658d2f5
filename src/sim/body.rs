//! Point-body kinematics driven by the brane's force field
//!
//! Bodies advance with velocity Verlet: the displacement uses the previous
//! step's acceleration, the velocity uses the mean of previous and next.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::brane::Brane;
use super::context::SimContext;
use crate::error::{Result, SimError};
use crate::{abs_mul, normalize_angle};

/// A moving body with mass and quadratic drag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Position, kept inside the primary cell under PBC
    pub pos: Vec2,
    pub vel: Vec2,
    /// Acceleration from the previous step
    pub acc: Vec2,
    /// Displacement taken during the last step
    pub dr: Vec2,
    mass: f32,
    pub drag: f32,
    /// Facing angle from north (radians)
    pub heading: f32,
    /// Heading change per ms
    pub angular_vel: f32,
    /// Self-generated force added to the field force
    pub thrust: Vec2,
}

impl Body {
    pub fn new(mass: f32, drag: f32) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::InvalidMass(mass));
        }
        if !(drag.is_finite() && drag >= 0.0) {
            return Err(SimError::InvalidParameter {
                name: "drag",
                value: drag,
            });
        }
        Ok(Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            dr: Vec2::ZERO,
            mass,
            drag,
            heading: 0.0,
            angular_vel: 0.0,
            thrust: Vec2::ZERO,
        })
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_heading(mut self, heading: f32, angular_vel: f32) -> Self {
        self.heading = heading;
        self.angular_vel = angular_vel;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Heading at the start of the last step
    #[inline]
    pub fn prev_heading(&self, dt: f32) -> f32 {
        self.heading - self.angular_vel * dt
    }

    /// Position at the start of the last step (unwrapped)
    #[inline]
    pub fn prev_pos(&self) -> Vec2 {
        self.pos - self.dr
    }

    /// Advance one step using the brane's force at the current position
    pub fn step(&mut self, dt: f32, brane: &Brane, ctx: &SimContext) {
        let force = brane.force_at_point(self.pos, ctx);
        self.integrate(dt, force, ctx);
    }

    /// Velocity Verlet with an externally supplied field force
    pub fn integrate(&mut self, dt: f32, field_force: Vec2, ctx: &SimContext) {
        let force = field_force + self.thrust;
        let acc_next = force / self.mass - self.drag * abs_mul(self.vel);

        let mut dr = self.vel * dt + 0.5 * self.acc;
        if let Some(max_step) = ctx.max_step() {
            dr = dr.clamp_length_max(max_step);
        }

        self.vel += 0.5 * dt * (self.acc + acc_next);
        self.pos = ctx.wrap(self.pos + dr);
        self.dr = dr;
        self.acc = acc_next;

        self.heading = normalize_angle(self.heading + self.angular_vel * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_mass() {
        assert!(matches!(Body::new(0.0, 0.0), Err(SimError::InvalidMass(_))));
        assert!(Body::new(-3.0, 0.0).is_err());
        assert!(Body::new(1.0, -0.1).is_err());
        assert!(Body::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn test_free_flight_is_linear() {
        let ctx = SimContext::open();
        let v0 = Vec2::new(0.3, -0.2);
        let mut body = Body::new(2.0, 0.0).unwrap().with_velocity(v0);
        let dt = 16.0;
        for _ in 0..50 {
            body.integrate(dt, Vec2::ZERO, &ctx);
        }
        let expected = v0 * 50.0 * dt;
        assert!((body.pos - expected).length() < 1e-2);
        assert_eq!(body.vel, v0);
        assert_eq!(body.dr, v0 * dt);
    }

    #[test]
    fn test_drag_opposes_motion_per_component() {
        let ctx = SimContext::open();
        let mut body = Body::new(1.0, 0.5).unwrap().with_velocity(Vec2::new(2.0, -1.0));
        body.integrate(1.0, Vec2::ZERO, &ctx);
        // -drag * |v| * v
        assert_eq!(body.acc, Vec2::new(-2.0, 0.5));
        assert!(body.vel.x < 2.0);
        assert!(body.vel.y > -1.0);
    }

    #[test]
    fn test_acceleration_lags_one_step() {
        let ctx = SimContext::open();
        let mut body = Body::new(2.0, 0.0).unwrap();
        body.integrate(1.0, Vec2::new(4.0, 0.0), &ctx);
        // displacement still uses the old (zero) acceleration
        assert_eq!(body.dr, Vec2::ZERO);
        assert_eq!(body.acc, Vec2::new(2.0, 0.0));
        assert_eq!(body.vel, Vec2::new(1.0, 0.0));

        body.integrate(1.0, Vec2::new(4.0, 0.0), &ctx);
        assert_eq!(body.dr, Vec2::new(1.0 + 1.0, 0.0));
        assert_eq!(body.vel, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_wraps_and_clamps_under_pbc() {
        let ctx = SimContext::toroidal(100.0)
            .unwrap()
            .with_max_step_fraction(0.1)
            .unwrap();
        let mut body = Body::new(1.0, 0.0)
            .unwrap()
            .with_position(Vec2::new(95.0, 50.0))
            .with_velocity(Vec2::new(1.0, 0.0));
        body.integrate(8.0, Vec2::ZERO, &ctx);
        assert!((body.pos - Vec2::new(3.0, 50.0)).length() < 1e-4);

        body.integrate(50.0, Vec2::ZERO, &ctx);
        assert!((body.dr.length() - 10.0).abs() < 1e-4);
        assert!((body.pos - Vec2::new(13.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn test_heading_advances() {
        let ctx = SimContext::open();
        let mut body = Body::new(1.0, 0.0).unwrap().with_heading(0.0, 0.01);
        body.integrate(10.0, Vec2::ZERO, &ctx);
        assert!((body.heading - 0.1).abs() < 1e-6);
        assert!(body.prev_heading(10.0).abs() < 1e-6);
    }
}
