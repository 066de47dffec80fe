//! Core data model: points, targets, timestamped cursor samples, traces.

use serde::{Deserialize, Serialize};

/// Point in 2D screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A click target: center plus an axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Target {
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

impl Target {
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    pub fn square(center: Point, size: f64) -> Self {
        Self::new(center, size, size)
    }

    /// Width used by the difficulty model: the tighter of the two extents.
    pub fn effective_width(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn contains(&self, p: &Point) -> bool {
        (p.x - self.center.x).abs() <= self.width / 2.0
            && (p.y - self.center.y).abs() <= self.height / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// One cursor sample. `t` is seconds since the start of its trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(t: f64, x: f64, y: f64) -> Self {
        Self { t, x, y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A finished cursor trajectory. Timestamps start at zero and increase
/// strictly; the composer never hands out a trace that violates this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub samples: Vec<Sample>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => b.t - a.t,
            _ => 0.0,
        }
    }

    /// Total arc length of the sampled path.
    pub fn path_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| w[0].point().distance_to(&w[1].point()))
            .sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

/// Pointer button, as understood by the driver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    Left,
    Right,
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_width_is_the_tighter_extent() {
        let t = Target::new(Point::new(0.0, 0.0), 120.0, 40.0);
        assert_eq!(t.effective_width(), 40.0);
    }

    #[test]
    fn contains_is_inclusive_of_the_box_edge() {
        let t = Target::square(Point::new(100.0, 100.0), 50.0);
        assert!(t.contains(&Point::new(125.0, 100.0)));
        assert!(t.contains(&Point::new(100.0, 75.0)));
        assert!(!t.contains(&Point::new(125.1, 100.0)));
    }

    #[test]
    fn trace_duration_and_arc_length() {
        let trace = Trace {
            samples: vec![
                Sample::new(0.0, 0.0, 0.0),
                Sample::new(0.1, 3.0, 4.0),
                Sample::new(0.2, 3.0, 10.0),
            ],
        };
        assert!((trace.duration() - 0.2).abs() < 1e-12);
        assert!((trace.path_length() - 11.0).abs() < 1e-12);
    }
}
