//! Circle overlap and world-bounds clamping
//!
//! Pure helpers shared by movement, AI and the collision resolver.
//! Inputs must be finite; NaN in, NaN out.

use glam::Vec2;

/// Result of clamping a circle into the world rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped {
    pub pos: Vec2,
    /// True if any axis had to be clamped
    pub hit_wall: bool,
}

/// Whether two circles overlap. Touching circles do not.
#[inline]
pub fn overlaps(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    a_pos.distance(b_pos) < a_radius + b_radius
}

/// Clamp each axis of `pos` to `[radius, dimension - radius]`
pub fn clamp_to_world_bounds(pos: Vec2, radius: f32, world_width: f32, world_height: f32) -> Clamped {
    let x = clamp_axis(pos.x, radius, world_width);
    let y = clamp_axis(pos.y, radius, world_height);
    let clamped = Vec2::new(x, y);
    Clamped {
        pos: clamped,
        hit_wall: clamped != pos,
    }
}

/// Clamp a single coordinate. A radius wider than half the world pins to the centre.
#[inline]
fn clamp_axis(value: f32, radius: f32, dimension: f32) -> f32 {
    let lo = radius;
    let hi = dimension - radius;
    if lo > hi {
        return dimension / 2.0;
    }
    value.clamp(lo, hi)
}

/// Unit vector from `from` toward `to`, zero if they coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
