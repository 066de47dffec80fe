//! Fitts' Law movement-duration sampler.
//!
//! Durations come from `T = a + b * ID` with per-invocation coefficients, and
//! are then lower-bounded so the implied throughput never beats the human
//! ceiling. Humans cap out near 10-12 bits/s; a trace that beats that is an
//! instant tell.

use crate::config::FittsParams;
use crate::error::{MarionetteError, Result};
use crate::rng::MotorRng;

/// Clamp on any sampled movement duration, seconds.
pub const DURATION_BOUNDS_S: (f64, f64) = (0.05, 4.0);

/// Shannon-form index of difficulty in bits. The `+ 1` keeps it non-negative
/// when the distance is shorter than half the target width.
pub fn index_of_difficulty(distance: f64, effective_width: f64) -> f64 {
    (2.0 * distance / effective_width + 1.0).log2()
}

impl FittsParams {
    /// Sample a movement duration for a reach of `distance` pixels at a
    /// target of `effective_width` pixels.
    pub fn sample_duration(
        &self,
        rng: &mut MotorRng,
        distance: f64,
        effective_width: f64,
    ) -> Result<f64> {
        if !distance.is_finite() || !effective_width.is_finite() {
            return Err(MarionetteError::InvalidGeometry(format!(
                "non-finite movement geometry: distance={distance}, width={effective_width}"
            )));
        }
        if distance < 0.0 {
            return Err(MarionetteError::InvalidGeometry(format!(
                "negative movement distance: {distance}"
            )));
        }
        if effective_width <= 0.0 {
            return Err(MarionetteError::InvalidGeometry(format!(
                "target width must be positive, got {effective_width}"
            )));
        }

        let id = index_of_difficulty(distance, effective_width);
        let a = rng
            .gaussian(self.a_mean, self.a_std)
            .max(0.1 * self.a_mean);
        let b = rng
            .gaussian(self.b_mean, self.b_std)
            .max(0.1 * self.b_mean);

        let mut duration = a + b * id;
        // Hard human ceiling: stretch the movement rather than exceed it.
        if id > 0.0 && id / duration > self.max_throughput {
            duration = id / self.max_throughput;
        }
        Ok(duration.clamp(DURATION_BOUNDS_S.0, DURATION_BOUNDS_S.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_matches_the_shannon_form() {
        let id = index_of_difficulty(1000.0, 5.0);
        assert!((id - (401.0f64).log2()).abs() < 1e-12);
        assert_eq!(index_of_difficulty(0.0, 10.0), 0.0);
    }

    #[test]
    fn throughput_never_beats_the_ceiling() {
        let params = FittsParams::default();
        let mut rng = MotorRng::seeded(42);
        for i in 0..512 {
            let d = 10.0 + (i as f64) * 7.3;
            let w = 2.0 + (i as f64 % 40.0);
            let id = index_of_difficulty(d, w);
            let t = params.sample_duration(&mut rng, d, w).unwrap();
            assert!(id / t <= params.max_throughput + 1e-9, "d={d} w={w}");
        }
    }

    #[test]
    fn tiny_and_huge_reaches_stay_clamped() {
        let params = FittsParams::default();
        let mut rng = MotorRng::seeded(1);
        for _ in 0..64 {
            let t = params.sample_duration(&mut rng, 0.0, 50.0).unwrap();
            assert!((DURATION_BOUNDS_S.0..=DURATION_BOUNDS_S.1).contains(&t));
            let t = params.sample_duration(&mut rng, 1e6, 1.0).unwrap();
            assert!(t <= DURATION_BOUNDS_S.1);
        }
    }

    #[test]
    fn bad_geometry_is_rejected() {
        let params = FittsParams::default();
        let mut rng = MotorRng::seeded(1);
        assert!(matches!(
            params.sample_duration(&mut rng, -1.0, 10.0),
            Err(MarionetteError::InvalidGeometry(_))
        ));
        assert!(matches!(
            params.sample_duration(&mut rng, 100.0, 0.0),
            Err(MarionetteError::InvalidGeometry(_))
        ));
        assert!(matches!(
            params.sample_duration(&mut rng, f64::NAN, 10.0),
            Err(MarionetteError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn small_targets_at_distance_take_most_of_a_second() {
        // S2 geometry: 1000 px reach onto a 5 px target, ID ~ 8.65 bits.
        let params = FittsParams::default();
        let mut rng = MotorRng::seeded(42);
        let id = index_of_difficulty(1000.0, 5.0);
        for _ in 0..128 {
            let t = params.sample_duration(&mut rng, 1000.0, 5.0).unwrap();
            assert!(t >= id / params.max_throughput - 1e-9);
        }
    }
}
