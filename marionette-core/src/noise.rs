//! Signal-dependent noise and physiological tremor.
//!
//! Motor noise grows with speed: fast strokes are sloppy, slow strokes are
//! precise. On top of that sits an 8-12 Hz tremor that never goes away, even
//! at rest. Both are injected after path generation, and the leg endpoints
//! are snapped back afterwards so the submovement contract survives.

use std::f64::consts::PI;

use crate::config::NoiseParams;
use crate::rng::MotorRng;
use crate::types::{Point, Sample};

/// Tremor band half-width around the center frequency, Hz.
const TREMOR_HALF_BAND_HZ: f64 = 1.0;

/// Second-order IIR section, Direct Form I, normalized so a0 = 1.
#[derive(Debug, Clone)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Constant-peak-gain band-pass centered at `center_hz` with the given
    /// bandwidth (RBJ cookbook coefficients).
    fn band_pass(sample_rate: f64, center_hz: f64, bandwidth_hz: f64) -> Self {
        let q = center_hz / bandwidth_hz;
        let w0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * w0.cos() / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Forward-backward band-pass: filter, reverse, filter again, reverse.
/// Doubles the rolloff and cancels the phase shift, so the tremor stays
/// aligned with the samples it perturbs.
fn band_pass_zero_phase(filter: &mut Biquad, data: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = data.iter().map(|&x| filter.process(x)).collect();
    out.reverse();
    filter.reset();
    let mut back: Vec<f64> = out.iter().map(|&x| filter.process(x)).collect();
    filter.reset();
    back.reverse();
    back
}

fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
}

/// Per-leg noise pass. Stateless apart from the PRNG handed in.
#[derive(Debug, Clone)]
pub struct NoiseInjector {
    k_signal: f64,
    tremor_freq_hz: f64,
    tremor_amp_px: f64,
    sample_rate: f64,
}

impl NoiseInjector {
    pub fn new(params: &NoiseParams, sample_rate: f64) -> Self {
        Self {
            k_signal: params.k_signal,
            tremor_freq_hz: params.tremor_freq_hz,
            tremor_amp_px: params.tremor_amp_px,
            sample_rate,
        }
    }

    /// Perturb a moving leg in place. Length and timestamps are untouched;
    /// the first and last samples are snapped back to `start` / `end`.
    pub fn apply(&self, rng: &mut MotorRng, samples: &mut [Sample], start: Point, end: Point) {
        if samples.len() < 3 {
            return;
        }

        // Signal-dependent component: sigma scales with the per-sample
        // displacement, computed from the clean path before perturbation.
        let displacements: Vec<f64> = samples
            .windows(2)
            .map(|w| w[0].point().distance_to(&w[1].point()))
            .collect();
        for (i, step) in displacements.iter().enumerate() {
            let sigma = self.k_signal * step;
            let (nx, ny) = rng.bivariate_normal(sigma, sigma);
            samples[i + 1].x += nx;
            samples[i + 1].y += ny;
        }

        self.add_tremor(rng, samples);
        snap(samples, start, end);
    }

    /// Perturb a stationary segment (reaction pause, verification dwell).
    /// Only tremor applies; there is no voluntary motion to be noisy about.
    pub fn apply_stationary(&self, rng: &mut MotorRng, samples: &mut [Sample], anchor: Point) {
        if samples.len() < 3 {
            return;
        }
        self.add_tremor(rng, samples);
        snap(samples, anchor, anchor);
    }

    /// Band-passed white noise, rescaled to the configured RMS after
    /// filtering, added independently per axis.
    fn add_tremor(&self, rng: &mut MotorRng, samples: &mut [Sample]) {
        let n = samples.len();
        if n < 4 {
            return;
        }
        let mut filter = Biquad::band_pass(
            self.sample_rate,
            self.tremor_freq_hz,
            2.0 * TREMOR_HALF_BAND_HZ,
        );
        for axis in 0..2 {
            let white: Vec<f64> = (0..n).map(|_| rng.gaussian(0.0, 1.0)).collect();
            let filtered = band_pass_zero_phase(&mut filter, &white);
            let scale = rms(&filtered);
            if scale < 1e-12 {
                continue;
            }
            let gain = self.tremor_amp_px / scale;
            for (sample, w) in samples.iter_mut().zip(filtered.iter()) {
                if axis == 0 {
                    sample.x += w * gain;
                } else {
                    sample.y += w * gain;
                }
            }
        }
    }
}

fn snap(samples: &mut [Sample], start: Point, end: Point) {
    if let Some(first) = samples.first_mut() {
        first.x = start.x;
        first.y = start.y;
    }
    if let Some(last) = samples.last_mut() {
        last.x = end.x;
        last.y = end.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseParams;

    fn straight_leg(n: usize, dt: f64, from: Point, to: Point) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let u = i as f64 / (n - 1) as f64;
                Sample::new(
                    i as f64 * dt,
                    from.x + u * (to.x - from.x),
                    from.y + u * (to.y - from.y),
                )
            })
            .collect()
    }

    fn stationary(n: usize, dt: f64, at: Point) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as f64 * dt, at.x, at.y)).collect()
    }

    #[test]
    fn length_and_timestamps_survive() {
        let injector = NoiseInjector::new(&NoiseParams::default(), 60.0);
        let mut rng = MotorRng::seeded(5);
        let from = Point::new(0.0, 0.0);
        let to = Point::new(300.0, 120.0);
        let mut leg = straight_leg(30, 1.0 / 60.0, from, to);
        let stamps: Vec<f64> = leg.iter().map(|s| s.t).collect();
        injector.apply(&mut rng, &mut leg, from, to);
        assert_eq!(leg.len(), 30);
        assert!(leg.iter().map(|s| s.t).eq(stamps.into_iter()));
    }

    #[test]
    fn endpoints_are_snapped_back() {
        let injector = NoiseInjector::new(&NoiseParams::default(), 60.0);
        let mut rng = MotorRng::seeded(6);
        let from = Point::new(10.0, 20.0);
        let to = Point::new(410.0, 250.0);
        let mut leg = straight_leg(25, 1.0 / 60.0, from, to);
        injector.apply(&mut rng, &mut leg, from, to);
        assert_eq!(leg[0].point(), from);
        assert_eq!(leg.last().unwrap().point(), to);
    }

    #[test]
    fn interior_samples_actually_move() {
        let injector = NoiseInjector::new(&NoiseParams::default(), 60.0);
        let mut rng = MotorRng::seeded(7);
        let from = Point::new(0.0, 0.0);
        let to = Point::new(500.0, 0.0);
        let clean = straight_leg(40, 1.0 / 60.0, from, to);
        let mut noisy = clean.clone();
        injector.apply(&mut rng, &mut noisy, from, to);
        let moved = clean
            .iter()
            .zip(noisy.iter())
            .filter(|(c, n)| c.point().distance_to(&n.point()) > 1e-6)
            .count();
        assert!(moved > 20);
    }

    #[test]
    fn stationary_tremor_has_roughly_the_configured_rms() {
        let params = NoiseParams::default();
        let injector = NoiseInjector::new(&params, 60.0);
        let mut rng = MotorRng::seeded(8);
        let at = Point::new(200.0, 200.0);
        // long segment so the post-filter RMS estimate is stable
        let mut seg = stationary(600, 1.0 / 60.0, at);
        injector.apply_stationary(&mut rng, &mut seg, at);
        let dx: Vec<f64> = seg.iter().map(|s| s.x - at.x).collect();
        let observed = rms(&dx);
        assert!(
            (observed - params.tremor_amp_px).abs() < 0.5 * params.tremor_amp_px,
            "rms {observed} vs target {}",
            params.tremor_amp_px
        );
    }

    #[test]
    fn tremor_is_deterministic_under_a_seed() {
        let injector = NoiseInjector::new(&NoiseParams::default(), 60.0);
        let at = Point::new(0.0, 0.0);
        let mut a = stationary(50, 1.0 / 60.0, at);
        let mut b = stationary(50, 1.0 / 60.0, at);
        injector.apply_stationary(&mut MotorRng::seeded(11), &mut a, at);
        injector.apply_stationary(&mut MotorRng::seeded(11), &mut b, at);
        assert_eq!(a, b);
    }
}
