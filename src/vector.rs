use cgmath::prelude::*;
use cgmath::Vector2;

/// Distances at or below this are treated as "already at the target".
pub const MIN_DISTANCE: f32 = f32::EPSILON;

pub fn distance(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    (b - a).magnitude()
}

/// Unit direction from `from` towards `to` together with the distance
/// between them, or `None` when the two points coincide.
pub fn direction_to(from: Vector2<f32>, to: Vector2<f32>) -> Option<(Vector2<f32>, f32)> {
    let delta = to - from;
    let distance = delta.magnitude();

    if distance <= MIN_DISTANCE || !distance.is_finite() {
        return None;
    }

    Some((delta / distance, distance))
}

#[inline]
pub fn is_finite(v: Vector2<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
