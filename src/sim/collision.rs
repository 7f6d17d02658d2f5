//! Continuous (swept) collision detection between circular bodies
//!
//! Each test works in the frame of one body: its circle is held fixed and the
//! other body's relative displacement over the step becomes a segment. The
//! segment hits if either endpoint lies inside the combined radius or the
//! closest point of the segment to the center does.
//!
//! Under PBC the fixed circle is tried at each of its 9 periodic images,
//! zero shift first. That is exact only while the relative displacement per
//! step stays below half the world size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::context::SimContext;
use super::geometry::rot_mat;
use super::wavelet::EPSILON;

/// One circle of a compound silhouette, in the body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CirclePart {
    pub offset: Vec2,
    pub radius: f32,
}

/// Collision shape: a bounding circle, optionally refined by sub-circles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Bounding radius, used alone when `parts` is empty
    pub radius: f32,
    pub parts: Vec<CirclePart>,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            radius,
            parts: Vec::new(),
        }
    }

    pub fn compound(radius: f32, parts: Vec<CirclePart>) -> Self {
        Self { radius, parts }
    }

    #[inline]
    pub fn is_compound(&self) -> bool {
        !self.parts.is_empty()
    }

    /// World-space circles at the end of the last step with their per-step
    /// displacement: `(position, displacement, radius)`
    pub fn swept_parts(&self, body: &Body, dt: f32) -> Vec<(Vec2, Vec2, f32)> {
        if self.parts.is_empty() {
            return vec![(body.pos, body.dr, self.radius)];
        }
        let now = rot_mat(body.heading);
        let before = rot_mat(body.prev_heading(dt));
        let prev_pos = body.prev_pos();
        self.parts
            .iter()
            .map(|part| {
                let cur = body.pos + now * part.offset;
                let prev = prev_pos + before * part.offset;
                (cur, cur - prev, part.radius)
            })
            .collect()
    }
}

/// Does the segment `start → end` come within `radius` of `center`?
pub fn segment_hits_circle(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> bool {
    let r_sq = radius * radius;
    let cx = center - start;
    if cx.length_squared() <= r_sq {
        return true;
    }
    if (center - end).length_squared() <= r_sq {
        return true;
    }

    let seg = end - start;
    let seg_sq = seg.length_squared();
    if seg_sq <= EPSILON * EPSILON {
        // degenerate segment, both endpoints already missed
        return false;
    }
    let u = (cx.dot(seg) / seg_sq).clamp(0.0, 1.0);
    let closest = start + seg * u;
    (center - closest).length_squared() <= r_sq
}

/// Swept test of two circles over their last step
///
/// `pos_*` are end-of-step positions and `dr_*` the displacements taken.
pub fn swept_circles_collide(
    pos_a: Vec2,
    dr_a: Vec2,
    pos_b: Vec2,
    dr_b: Vec2,
    radius: f32,
    ctx: &SimContext,
) -> bool {
    // B held fixed, A moves by the relative displacement
    let rel = dr_a - dr_b;
    let start = pos_a - rel;
    ctx.images(pos_b)
        .any(|center| segment_hits_circle(start, pos_a, center, radius))
}

/// Full two-phase test: bounding circles first, then sub-circles
pub fn check_collision(
    a: &Body,
    shape_a: &Collider,
    b: &Body,
    shape_b: &Collider,
    dt: f32,
    ctx: &SimContext,
) -> bool {
    if !swept_circles_collide(a.pos, a.dr, b.pos, b.dr, shape_a.radius + shape_b.radius, ctx) {
        return false;
    }
    if !shape_a.is_compound() && !shape_b.is_compound() {
        return true;
    }

    let parts_a = shape_a.swept_parts(a, dt);
    let parts_b = shape_b.swept_parts(b, dt);
    parts_a.iter().any(|&(pa, da, ra)| {
        parts_b
            .iter()
            .any(|&(pb, db, rb)| swept_circles_collide(pa, da, pb, db, ra + rb, ctx))
    })
}
