//! Planar geometry helpers: rotations and periodic images
//!
//! Headings are measured from north (screen up) with screen y pointing down,
//! so heading 0 faces `(0, -1)`.

use glam::{Mat2, Vec2};

/// Periodic image shifts in units of the world size.
///
/// Ordered by how likely each cell is to hold a hit: everything is wrapped
/// into the primary cell, so the zero shift comes first.
pub const PERIODIC_SHIFTS: [Vec2; 9] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, -1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
];

/// Rotation taking body-local offsets into world orientation
#[inline]
pub fn rot_mat(theta: f32) -> Mat2 {
    Mat2::from_angle(theta)
}

/// Unit facing vector for a heading
#[inline]
pub fn heading_vector(theta: f32) -> Vec2 {
    Vec2::new(theta.sin(), -theta.cos())
}

/// All 9 periodic images of `r` for a torus of side `size`
pub fn expand_periodic_images(r: Vec2, size: f32) -> [Vec2; 9] {
    PERIODIC_SHIFTS.map(|shift| r + shift * size)
}

/// Wrap a single coordinate into `[0, size)`
#[inline]
pub fn wrap_coord(x: f32, size: f32) -> f32 {
    let w = x.rem_euclid(size);
    // rem_euclid can round up to exactly `size` for tiny negative inputs
    if w >= size { 0.0 } else { w }
}

/// Wrap a position into the primary cell `[0, size)²`
#[inline]
pub fn wrap_position(p: Vec2, size: f32) -> Vec2 {
    Vec2::new(wrap_coord(p.x, size), wrap_coord(p.y, size))
}

/// Replace a raw displacement with the one to the nearest periodic image.
///
/// Per component: add `size` if that shortens it, else subtract `size` if
/// that shortens it. Both cannot hold at once.
#[inline]
pub fn min_image_displacement(d: Vec2, size: f32) -> Vec2 {
    Vec2::new(min_image_coord(d.x, size), min_image_coord(d.y, size))
}

#[inline]
fn min_image_coord(d: f32, size: f32) -> f32 {
    let ab = d.abs();
    if ab > (d + size).abs() {
        d + size
    } else if ab > (d - size).abs() {
        d - size
    } else {
        d
    }
}

/// Whether an object of `size` at `pos` overlaps a view box.
///
/// `half_extent` is half the view box side. With a torus, the image of `pos`
/// nearest the view center is tested.
pub fn in_view(pos: Vec2, object_size: f32, center: Vec2, half_extent: f32, world: Option<f32>) -> bool {
    let nearest = match world {
        Some(size) => expand_periodic_images(pos, size)
            .into_iter()
            .min_by(|a, b| {
                a.distance_squared(center)
                    .partial_cmp(&b.distance_squared(center))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(pos),
        None => pos,
    };
    let dif = (nearest - center).abs();
    let reach = half_extent + object_size * std::f32::consts::SQRT_2;
    dif.x < reach && dif.y < reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_heading_vector_north_is_up() {
        let h = heading_vector(0.0);
        assert!((h - Vec2::new(0.0, -1.0)).length() < 1e-6);
        let east = heading_vector(FRAC_PI_2);
        assert!((east - Vec2::new(1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_rot_mat_quarter_turn() {
        let r = rot_mat(FRAC_PI_2) * Vec2::new(1.0, 0.0);
        assert!((r - Vec2::new(0.0, 1.0)).length() < 1e-6);
        // zero rotation is identity
        assert_eq!(rot_mat(0.0) * Vec2::new(3.0, -4.0), Vec2::new(3.0, -4.0));
    }

    #[test]
    fn test_expand_zero_shift_first() {
        let imgs = expand_periodic_images(Vec2::new(1.0, 2.0), 10.0);
        assert_eq!(imgs[0], Vec2::new(1.0, 2.0));
        assert_eq!(imgs[8], Vec2::new(11.0, 12.0));
    }

    #[test]
    fn test_wrap_coord() {
        assert_eq!(wrap_coord(5.0, 10.0), 5.0);
        assert_eq!(wrap_coord(15.0, 10.0), 5.0);
        assert_eq!(wrap_coord(-2.0, 10.0), 8.0);
        assert_eq!(wrap_coord(-1e-9, 10.0), 0.0);
    }

    #[test]
    fn test_min_image_displacement() {
        let d = min_image_displacement(Vec2::new(90.0, -80.0), 100.0);
        assert!((d - Vec2::new(-10.0, 20.0)).length() < 1e-4);
        let d = min_image_displacement(Vec2::new(10.0, -20.0), 100.0);
        assert_eq!(d, Vec2::new(10.0, -20.0));
    }

    #[test]
    fn test_min_image_needs_half_world_displacement() {
        let size = 600.0;
        // within one world size the result is the nearest image, |d| <= S/2
        assert_eq!(min_image_coord(250.0, size), 250.0);
        assert_eq!(min_image_coord(300.0, size), 300.0);
        assert_eq!(min_image_coord(-400.0, size), 200.0);
        assert_eq!(min_image_coord(450.0, size), -150.0);
        for d in [-599.0f32, -301.0, -1.0, 0.0, 299.0, 599.0] {
            assert!(min_image_coord(d, size).abs() <= 0.5 * size, "{d}");
        }

        // Precondition: positions are wrapped and each step moves less than
        // half the world size, so raw displacements stay within one world
        // size. Only one shift is applied: 960 lands on 360, not -240.
        assert_eq!(min_image_coord(960.0, size), 360.0);
        assert_eq!(
            min_image_displacement(Vec2::new(960.0, -960.0), size),
            Vec2::new(360.0, -360.0)
        );
    }

    #[test]
    fn test_in_view_across_seam() {
        // Object just across the seam from a view centered near the edge
        assert!(in_view(Vec2::new(2.0, 50.0), 4.0, Vec2::new(95.0, 50.0), 20.0, Some(100.0)));
        assert!(!in_view(Vec2::new(2.0, 50.0), 4.0, Vec2::new(95.0, 50.0), 20.0, None));
        assert!(!in_view(Vec2::new(50.0, 50.0), 4.0, Vec2::new(95.0, 50.0), 20.0, Some(100.0)));
    }
}
