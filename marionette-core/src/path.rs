//! Lift a scalar progress curve into a curved 2-D path.
//!
//! Real reaches bow away from the chord, with the largest deviation near
//! mid-movement. The lift adds a perpendicular parabolic bulge on top of the
//! straight interpolation; the bowing side is chosen per leg.

use crate::types::Point;

/// Legs shorter than this get no curvature at all.
pub const MIN_CURVED_LEG_PX: f64 = 1.0;

/// Map progress samples `s` onto the segment `p0 -> p1` with a perpendicular
/// bulge of `curvature * leg length` at mid-progress, on the side picked by
/// `sign`. The first and last points are exactly `p0` and `p1`.
pub fn lift(p0: Point, p1: Point, s: &[f64], curvature: f64, sign: f64) -> Vec<Point> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let len = (dx * dx + dy * dy).sqrt();

    let mut points: Vec<Point> = if len < MIN_CURVED_LEG_PX {
        s.iter()
            .map(|&si| Point::new(p0.x + si * dx, p0.y + si * dy))
            .collect()
    } else {
        // unit normal of the chord
        let nx = -dy / len;
        let ny = dx / len;
        let amplitude = curvature * len * sign;
        s.iter()
            .map(|&si| {
                let bulge = amplitude * 4.0 * si * (1.0 - si);
                Point::new(p0.x + si * dx + bulge * nx, p0.y + si * dy + bulge * ny)
            })
            .collect()
    };

    if let Some(first) = points.first_mut() {
        *first = p0;
    }
    if let Some(last) = points.last_mut() {
        *last = p1;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MotionProfile;

    fn progress() -> Vec<f64> {
        MotionProfile::generate(0.5, 60.0, 0.42).s
    }

    #[test]
    fn endpoints_are_exact() {
        let p0 = Point::new(100.0, 100.0);
        let p1 = Point::new(523.7, 291.1);
        let pts = lift(p0, p1, &progress(), 0.15, 1.0);
        assert_eq!(pts[0], p0);
        assert_eq!(*pts.last().unwrap(), p1);
    }

    #[test]
    fn deviation_peaks_near_mid_progress() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(400.0, 0.0);
        let s = progress();
        let pts = lift(p0, p1, &s, 0.2, 1.0);
        // chord is the x axis, so deviation is |y|
        let max_dev = pts.iter().map(|p| p.y.abs()).fold(0.0f64, f64::max);
        assert!((max_dev - 0.2 * 400.0).abs() < 1.0);
        let at_mid = s
            .iter()
            .enumerate()
            .min_by(|a, b| {
                (a.1 - 0.5).abs().partial_cmp(&(b.1 - 0.5).abs()).unwrap()
            })
            .map(|(i, _)| i)
            .unwrap();
        assert!(pts[at_mid].y.abs() > 0.95 * max_dev);
    }

    #[test]
    fn sign_flips_the_bowing_side() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(100.0, 0.0);
        let s = progress();
        let left = lift(p0, p1, &s, 0.15, 1.0);
        let right = lift(p0, p1, &s, 0.15, -1.0);
        let mid = s.len() / 2;
        assert!(left[mid].y * right[mid].y < 0.0);
    }

    #[test]
    fn zero_length_legs_hold_position() {
        let p = Point::new(42.0, 17.0);
        let pts = lift(p, p, &progress(), 0.3, 1.0);
        assert!(pts.iter().all(|q| q.distance_to(&p) < 1e-9));
    }
}
