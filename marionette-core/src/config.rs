//! Session configuration.
//!
//! Every tunable of the kinematics core lives in one validated value object.
//! Ranges are enforced at session construction; a parameter outside its
//! admissible range is a hard `InvalidConfig` error, never a silent clamp.

use serde::{Deserialize, Serialize};

use crate::error::{MarionetteError, Result};

/// Hard bounds on the button-press duration, seconds.
pub const CLICK_DURATION_BOUNDS_S: (f64, f64) = (0.050, 0.350);

/// Hard bounds on the pre-click verification dwell, seconds.
pub const CLICK_DWELL_BOUNDS_S: (f64, f64) = (0.100, 0.600);

/// Fitts' Law coefficients and the session-wide human performance ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittsParams {
    /// Intercept mean, seconds.
    pub a_mean: f64,
    pub a_std: f64,
    /// Slope mean, seconds per bit.
    pub b_mean: f64,
    pub b_std: f64,
    /// Ceiling on instantaneous throughput, bits per second.
    pub max_throughput: f64,
    /// Probability that a movement deliberately stops short of the target.
    pub nominal_error_rate: f64,
}

impl Default for FittsParams {
    fn default() -> Self {
        Self {
            a_mean: 0.10,
            a_std: 0.02,
            b_mean: 0.08,
            b_std: 0.015,
            max_throughput: 12.0,
            nominal_error_rate: 0.04,
        }
    }
}

/// Signal-dependent noise and physiological tremor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Fraction of the per-sample displacement used as the noise std:
    /// sigma_i = k_signal * |v_i| * dt.
    pub k_signal: f64,
    /// Tremor center frequency, Hz.
    pub tremor_freq_hz: f64,
    /// Tremor RMS amplitude after band-pass filtering, pixels.
    pub tremor_amp_px: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            k_signal: 0.03,
            tremor_freq_hz: 10.0,
            tremor_amp_px: 0.3,
        }
    }
}

/// Curved-path geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathParams {
    /// Midpoint perpendicular offset as a fraction of leg length.
    pub curvature: f64,
    /// Std of the per-leg curvature draw.
    pub deviation: f64,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            curvature: 0.15,
            deviation: 0.02,
        }
    }
}

/// Decomposition of a macro-movement into ballistic submovements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmovementParams {
    /// Fraction of the remaining vector covered by the primary leg.
    pub primary_coverage: f64,
    /// Endpoint error std of the primary leg, as a fraction of distance.
    pub primary_error_std: f64,
    /// Upper bound on corrective submovements after the primary leg.
    pub max_corrections: u32,
}

impl Default for SubmovementParams {
    fn default() -> Self {
        Self {
            primary_coverage: 0.95,
            primary_error_std: 0.08,
            max_corrections: 3,
        }
    }
}

/// Click timing in log-space seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickTiming {
    pub duration_mu: f64,
    pub duration_sigma: f64,
    pub dwell_mu: f64,
    pub dwell_sigma: f64,
}

impl Default for ClickTiming {
    fn default() -> Self {
        Self {
            // median press ~85 ms, median verification dwell ~240 ms
            duration_mu: -2.465,
            duration_sigma: 0.25,
            dwell_mu: -1.427,
            dwell_sigma: 0.30,
        }
    }
}

/// Full configuration of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub fitts: FittsParams,
    /// Peak-velocity time fraction alpha of the minimum-jerk profile.
    pub velocity_asymmetry: f64,
    pub noise: NoiseParams,
    pub path: PathParams,
    pub submovement: SubmovementParams,
    pub click: ClickTiming,
    /// Dispatch cadence, Hz.
    pub sample_rate: f64,
    /// Optional PRNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fitts: FittsParams::default(),
            velocity_asymmetry: 0.42,
            noise: NoiseParams::default(),
            path: PathParams::default(),
            submovement: SubmovementParams::default(),
            click: ClickTiming::default(),
            sample_rate: 60.0,
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let f = &self.fitts;
        check(f.a_mean > 0.0, "fitts.a_mean must be positive")?;
        check(f.b_mean > 0.0, "fitts.b_mean must be positive")?;
        check(f.a_std > 0.0 && f.a_std < f.a_mean, "fitts.a_std must be in (0, a_mean)")?;
        check(f.b_std > 0.0 && f.b_std < f.b_mean, "fitts.b_std must be in (0, b_mean)")?;
        check(
            f.max_throughput > 0.0 && f.max_throughput <= 20.0,
            "fitts.max_throughput must be in (0, 20] bits/s",
        )?;
        check(
            (0.0..=1.0).contains(&f.nominal_error_rate),
            "fitts.nominal_error_rate must be in [0, 1]",
        )?;

        check(
            (0.30..=0.50).contains(&self.velocity_asymmetry),
            "velocity_asymmetry must be in [0.30, 0.50]",
        )?;

        let n = &self.noise;
        check(
            n.k_signal > 0.0 && n.k_signal <= 0.2,
            "noise.k_signal must be in (0, 0.2]",
        )?;
        check(
            (8.0..=12.0).contains(&n.tremor_freq_hz),
            "noise.tremor_freq_hz must be in [8, 12] Hz",
        )?;
        check(
            n.tremor_amp_px > 0.0 && n.tremor_amp_px <= 3.0,
            "noise.tremor_amp_px must be in (0, 3] px",
        )?;

        let p = &self.path;
        check(
            (0.0..=0.3).contains(&p.curvature),
            "path.curvature must be in [0, 0.3]",
        )?;
        check(
            (0.0..=0.1).contains(&p.deviation),
            "path.deviation must be in [0, 0.1]",
        )?;

        let s = &self.submovement;
        check(
            s.primary_coverage > 0.5 && s.primary_coverage <= 1.0,
            "submovement.primary_coverage must be in (0.5, 1.0]",
        )?;
        check(
            s.primary_error_std > 0.0 && s.primary_error_std <= 0.3,
            "submovement.primary_error_std must be in (0, 0.3]",
        )?;
        check(
            s.max_corrections <= 5,
            "submovement.max_corrections must be at most 5",
        )?;

        let c = &self.click;
        check(
            c.duration_sigma > 0.0 && c.dwell_sigma > 0.0,
            "click sigmas must be positive",
        )?;
        check(
            c.duration_mu.is_finite() && c.dwell_mu.is_finite(),
            "click mus must be finite",
        )?;

        // Nyquist margin: the tremor band must be well below half the rate.
        check(
            self.sample_rate >= 4.0 * n.tremor_freq_hz && self.sample_rate <= 1000.0,
            "sample_rate must be in [4 * tremor_freq_hz, 1000] Hz",
        )?;
        Ok(())
    }
}

fn check(ok: bool, msg: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(MarionetteError::InvalidConfig(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn asymmetry_out_of_band_is_rejected() {
        let mut cfg = Config::default();
        cfg.velocity_asymmetry = 0.55;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("velocity_asymmetry"));
    }

    #[test]
    fn nyquist_margin_is_enforced() {
        let mut cfg = Config::default();
        cfg.sample_rate = 30.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fitts_stds_must_stay_below_means() {
        let mut cfg = Config::default();
        cfg.fitts.a_std = cfg.fitts.a_mean;
        assert!(cfg.validate().is_err());
    }
}
