//! Submovement planner.
//!
//! A reach is not one smooth stroke: it is a ballistic primary pulse that
//! covers most of the distance, followed by a short chain of visually-guided
//! corrections that close on the target. Occasionally a human stops short
//! and misses outright; the planner reproduces that too.

use tracing::debug;

use crate::config::SubmovementParams;
use crate::rng::MotorRng;
use crate::types::{Point, Target};

/// One planned leg: where it ends and what share of the total movement time
/// it gets.
#[derive(Debug, Clone)]
pub struct PlannedLeg {
    pub endpoint: Point,
    pub fraction: f64,
}

/// Ordered legs of a macro-movement. Fractions sum to 1.
#[derive(Debug, Clone)]
pub struct SubmovementPlan {
    pub legs: Vec<PlannedLeg>,
    /// True when the miss branch fired; the final endpoint is then outside
    /// the target box by construction.
    pub missed: bool,
}

impl SubmovementPlan {
    pub fn final_endpoint(&self) -> Point {
        self.legs[self.legs.len() - 1].endpoint
    }
}

/// Decompose `p0 -> target` into a primary leg plus corrections.
pub fn plan(
    rng: &mut MotorRng,
    p0: Point,
    target: &Target,
    params: &SubmovementParams,
    nominal_error_rate: f64,
) -> SubmovementPlan {
    let center = target.center;
    let distance = p0.distance_to(&center);

    // Primary ballistic leg: covers most of the vector, lands with an error
    // proportional to how far the hand travelled.
    let sigma = params.primary_error_std * distance;
    let (ex, ey) = rng.bivariate_normal(sigma, sigma);
    let mut endpoint = Point::new(
        p0.x + params.primary_coverage * (center.x - p0.x) + ex,
        p0.y + params.primary_coverage * (center.y - p0.y) + ey,
    );
    let mut legs = vec![PlannedLeg {
        endpoint,
        fraction: rng.uniform_range(0.70, 0.85),
    }];

    let missed = rng.chance(nominal_error_rate);
    if missed {
        // Abandon the approach outside the box. If the ballistic error
        // happened to land inside, push the endpoint just past the nearest
        // edge so a miss is a miss.
        if target.contains(&endpoint) {
            endpoint = nudge_outside(rng, target, endpoint);
            legs[0].endpoint = endpoint;
        }
    } else {
        let mut correction = 0u32;
        while !target.contains(&endpoint) && correction < params.max_corrections {
            correction += 1;
            endpoint = if correction == params.max_corrections {
                // Final closed-loop acquisition: land inside for sure.
                acquire(rng, target)
            } else {
                let remaining = endpoint.distance_to(&center);
                let sigma_k =
                    params.primary_error_std / 2f64.powi(correction as i32) * remaining;
                let (nx, ny) = rng.bivariate_normal(sigma_k, sigma_k);
                Point::new(
                    endpoint.x + 0.7 * (center.x - endpoint.x) + nx,
                    endpoint.y + 0.7 * (center.y - endpoint.y) + ny,
                )
            };
            legs.push(PlannedLeg {
                endpoint,
                fraction: rng.uniform_range(0.08, 0.15),
            });
        }
    }

    normalize_fractions(&mut legs);
    debug!(
        "planned {} submovement legs over {:.1}px (missed={})",
        legs.len(),
        distance,
        missed
    );
    SubmovementPlan { legs, missed }
}

/// Endpoint drawn inside the box, biased toward the center.
fn acquire(rng: &mut MotorRng, target: &Target) -> Point {
    let half_w = target.width / 2.0;
    let half_h = target.height / 2.0;
    let sigma = half_w.min(half_h) * 0.25;
    let (dx, dy) = rng.bivariate_normal(sigma, sigma);
    Point::new(
        target.center.x + dx.clamp(-0.9 * half_w, 0.9 * half_w),
        target.center.y + dy.clamp(-0.9 * half_h, 0.9 * half_h),
    )
}

/// Project a point that fell inside the box to just past the nearest edge
/// along its bearing from the center.
fn nudge_outside(rng: &mut MotorRng, target: &Target, inside: Point) -> Point {
    let mut ux = inside.x - target.center.x;
    let mut uy = inside.y - target.center.y;
    let norm = (ux * ux + uy * uy).sqrt();
    if norm < 1e-9 {
        let angle = rng.uniform_range(0.0, 2.0 * std::f64::consts::PI);
        ux = angle.cos();
        uy = angle.sin();
    } else {
        ux /= norm;
        uy /= norm;
    }
    // distance from the center to the box edge along (ux, uy)
    let tx = if ux.abs() > 1e-9 {
        target.width / 2.0 / ux.abs()
    } else {
        f64::INFINITY
    };
    let ty = if uy.abs() > 1e-9 {
        target.height / 2.0 / uy.abs()
    } else {
        f64::INFINITY
    };
    let edge = tx.min(ty);
    let reach = edge * rng.uniform_range(1.05, 1.5);
    Point::new(target.center.x + ux * reach, target.center.y + uy * reach)
}

fn normalize_fractions(legs: &mut [PlannedLeg]) {
    let total: f64 = legs.iter().map(|l| l.fraction).sum();
    for leg in legs.iter_mut() {
        leg.fraction /= total;
    }
    // fold the float dust into the last leg so the sum is exactly 1
    let n = legs.len();
    let head: f64 = legs[..n - 1].iter().map(|l| l.fraction).sum();
    legs[n - 1].fraction = 1.0 - head;
}
