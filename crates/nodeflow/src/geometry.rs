// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector curve geometry and hit-testing.
//!
//! Links are drawn as cubic Bezier curves from an output socket to an input
//! socket. [`connector_curve`] picks the control points for drawing, and
//! [`hit_test_curve`] answers whether a screen point is close enough to a
//! link to pick it.

use egui::{vec2, Pos2};

/// Minimum rightward reach of control points for looping connections
pub const MIN_RIGHTWARD: f32 = 80.0;

/// Control point reach as a fraction of the endpoint distance
const REACH_FACTOR: f32 = 0.45;

/// Vertical distance under which endpoints count as side by side
const SIDE_BY_SIDE_MAX_VERTICAL: f32 = 60.0;
const SIDE_ARC_FACTOR: f32 = 0.15;
const SIDE_ARC_MIN: f32 = 10.0;
const SIDE_REACH_FACTOR: f32 = 0.3;

const LOOP_ARC_FACTOR: f32 = 0.35;
const LOOP_ARC_MIN: f32 = 30.0;
const LOOP_REACH_FACTOR: f32 = 0.4;

/// Leftward offset past which the hit-test approximation flips its source tangent
const HIT_FLIP_DISTANCE: f32 = 50.0;
const HIT_LEFTWARD_FACTOR: f32 = 0.2;

/// Segments used to approximate a curve when measuring distance
const HIT_SEGMENTS: usize = 32;

/// Compute the two inner control points of the connector between `p1` (source)
/// and `p2` (destination).
///
/// Three regimes:
/// - side by side (destination ahead horizontally by more than the vertical
///   gap, and the vertical gap is small): both control points sag the same way
///   so the curve reads as a gentle arc;
/// - destination to the right: a plain forward S-curve;
/// - destination behind the source: both control points reach out to the
///   right and arc vertically towards the destination, so the curve loops
///   around instead of kinking.
pub fn connector_curve(p1: Pos2, p2: Pos2) -> (Pos2, Pos2) {
    let distance = p1.distance(p2);
    let delta = distance * REACH_FACTOR;
    let horizontal = p2.x - p1.x;
    let vertical = (p2.y - p1.y).abs();

    if horizontal > vertical && vertical < SIDE_BY_SIDE_MAX_VERTICAL {
        let arc = SIDE_ARC_FACTOR * distance + SIDE_ARC_MIN;
        let rightward = (delta * SIDE_REACH_FACTOR).max(MIN_RIGHTWARD);
        (p1 + vec2(rightward, arc), p2 + vec2(-rightward, arc))
    } else if p2.x >= p1.x {
        (p1 + vec2(delta, 0.0), p2 - vec2(delta, 0.0))
    } else {
        let arc = LOOP_ARC_FACTOR * distance + LOOP_ARC_MIN;
        let rightward = (delta * LOOP_REACH_FACTOR).max(MIN_RIGHTWARD);
        let vert = if p2.y >= p1.y { arc } else { -arc };
        (p1 + vec2(rightward, vert), p2 + vec2(rightward, -vert))
    }
}

/// The full four-point curve for a connector
pub fn connector_points(p1: Pos2, p2: Pos2) -> [Pos2; 4] {
    let (c1, c2) = connector_curve(p1, p2);
    [p1, c1, c2, p2]
}

/// Whether `point` lies within `radius` of the connector between `p1` and `p2`.
///
/// Uses a cheaper horizontal-tangent approximation of the drawn curve. It only
/// needs to agree with the rendered link closely enough that clicking near a
/// visible link picks it.
pub fn hit_test_curve(point: Pos2, p1: Pos2, p2: Pos2, radius: f32) -> bool {
    let distance = p1.distance(p2);
    let mut delta = distance * REACH_FACTOR;
    if p2.x < p1.x {
        delta += HIT_LEFTWARD_FACTOR * (p1.x - p2.x);
    }
    let c2 = p2 - vec2(delta, 0.0);
    if p2.x < p1.x - HIT_FLIP_DISTANCE {
        delta = -delta;
    }
    let c1 = p1 + vec2(delta, 0.0);

    distance_to_cubic(point, [p1, c1, c2, p2]) < radius
}

/// Evaluate a cubic Bezier curve at `t` in `[0, 1]`
pub fn cubic_point(points: [Pos2; 4], t: f32) -> Pos2 {
    let [p0, p1, p2, p3] = points;
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;

    let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
    let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;
    Pos2::new(x, y)
}

/// Approximate distance from `point` to the nearest point on a cubic curve
pub fn distance_to_cubic(point: Pos2, points: [Pos2; 4]) -> f32 {
    let mut min_sq = f32::MAX;
    let mut prev = points[0];
    for i in 1..=HIT_SEGMENTS {
        let t = i as f32 / HIT_SEGMENTS as f32;
        let curr = cubic_point(points, t);
        min_sq = min_sq.min(distance_to_segment_sq(point, prev, curr));
        prev = curr;
    }
    min_sq.sqrt()
}

fn distance_to_segment_sq(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return point.distance_sq(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance_sq(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_straight_midpoint() {
        let p1 = Pos2::new(0.0, 0.0);
        let p2 = Pos2::new(200.0, 0.0);
        assert!(hit_test_curve(Pos2::new(100.0, 0.0), p1, p2, 5.0));
    }

    #[test]
    fn test_hit_far_point_misses() {
        let p1 = Pos2::new(0.0, 0.0);
        let p2 = Pos2::new(200.0, 0.0);
        assert!(!hit_test_curve(Pos2::new(100.0, 500.0), p1, p2, 5.0));
    }

    #[test]
    fn test_hit_near_endpoints() {
        let p1 = Pos2::new(10.0, 20.0);
        let p2 = Pos2::new(260.0, 140.0);
        assert!(hit_test_curve(Pos2::new(11.0, 21.0), p1, p2, 4.0));
        assert!(hit_test_curve(Pos2::new(259.0, 139.0), p1, p2, 4.0));
    }

    #[test]
    fn test_hit_leftward_curve() {
        let p1 = Pos2::new(300.0, 0.0);
        let p2 = Pos2::new(0.0, 120.0);
        let points = {
            let distance = p1.distance(p2);
            let delta = distance * REACH_FACTOR + HIT_LEFTWARD_FACTOR * 300.0;
            [p1, p1 - vec2(delta, 0.0), p2 - vec2(delta, 0.0), p2]
        };
        let on_curve = cubic_point(points, 0.5);
        assert!(hit_test_curve(on_curve, p1, p2, 2.0));
    }

    #[test]
    fn test_side_by_side_regime_same_vertical_sign() {
        let p1 = Pos2::new(0.0, 0.0);
        let p2 = Pos2::new(300.0, 10.0);
        let (c1, c2) = connector_curve(p1, p2);
        let off1 = c1.y - p1.y;
        let off2 = c2.y - p2.y;
        assert!(off1 != 0.0);
        assert_eq!(off1.signum(), off2.signum());
    }

    #[test]
    fn test_forward_regime_horizontal_tangents() {
        let p1 = Pos2::new(0.0, 0.0);
        let p2 = Pos2::new(200.0, 150.0);
        let (c1, c2) = connector_curve(p1, p2);
        assert_eq!(c1.y, p1.y);
        assert_eq!(c2.y, p2.y);
        assert!(c1.x > p1.x);
        assert!(c2.x < p2.x);
    }

    #[test]
    fn test_leftward_regime_reaches_right() {
        let p1 = Pos2::new(300.0, 0.0);
        let p2 = Pos2::new(0.0, 0.0);
        let (c1, c2) = connector_curve(p1, p2);
        for c in [c1, c2] {
            assert!(c.x >= p2.x, "{c:?} left of destination");
            assert!(c.x <= p1.x + MIN_RIGHTWARD, "{c:?} too far right");
        }
        assert!(c1.x > p1.x);
        assert!(c2.x > p2.x);
    }

    #[test]
    fn test_leftward_regime_arcs_towards_destination() {
        let (c1, _) = connector_curve(Pos2::new(300.0, 0.0), Pos2::new(0.0, 200.0));
        assert!(c1.y > 0.0);
        let (c1, _) = connector_curve(Pos2::new(300.0, 200.0), Pos2::new(0.0, 0.0));
        assert!(c1.y < 200.0);
    }

    #[test]
    fn test_cubic_point_endpoints() {
        let points = connector_points(Pos2::new(5.0, 5.0), Pos2::new(120.0, 40.0));
        assert_eq!(cubic_point(points, 0.0), points[0]);
        let end = cubic_point(points, 1.0);
        assert!((end - points[3]).length() < 1e-3);
    }
}
