//! Trace analyzer: would this trajectory read as human?
//!
//! Consumes a finished `(t, x, y)` trace and scores it against published
//! motor-control signatures: Fitts throughput, straightness, peak-velocity
//! timing, perpendicular RMSE, and the 8-12 Hz tremor band. The trace is
//! segmented by a speed threshold first: timing and RMSE are movement-portion
//! quantities, the tremor spectrum comes from the stationary tail, and
//! throughput and straightness cover the whole trace.
//!
//! Diagnosis is pure: it never mutates the trace and two calls on the same
//! trace produce identical reports.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::fitts;
use crate::types::{Sample, Trace};

/// Speed threshold for movement segmentation: this fraction of the peak
/// smoothed speed, but never below `SPEED_FLOOR_PX_S`.
const ONSET_PEAK_FRACTION: f64 = 0.05;
const SPEED_FLOOR_PX_S: f64 = 20.0;

/// Half-width of the velocity smoothing window, samples. Smoothing the
/// velocity vectors (not magnitudes) averages the tremor out of the
/// segmentation signal.
const SMOOTHING_RADIUS: usize = 2;

/// Width of the comparison bands on each side of the tremor band, Hz.
const ADJACENT_BAND_HZ: f64 = 4.0;

/// Required tremor prominence over the adjacent bands, dB.
const TREMOR_MARGIN_DB: f64 = 3.0;

/// Pass bands for the individual metrics.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub tremor_band_hz: (f64, f64),
    pub max_throughput_bps: f64,
    pub straightness_band: (f64, f64),
    pub peak_timing_band: (f64, f64),
    pub rmse_band_px: (f64, f64),
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            tremor_band_hz: (8.0, 12.0),
            max_throughput_bps: 12.0,
            straightness_band: (0.80, 0.95),
            peak_timing_band: (0.38, 0.45),
            rmse_band_px: (10.0, 25.0),
        }
    }
}

/// Per-metric values and verdicts for one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub throughput_bps: f64,
    pub straightness: f64,
    pub peak_velocity_fraction: f64,
    pub path_rmse_px: f64,
    pub tremor_peak_hz: f64,
    pub tremor_margin_db: f64,
    pub throughput_ok: bool,
    pub straightness_ok: bool,
    pub peak_timing_ok: bool,
    pub rmse_ok: bool,
    pub tremor_ok: bool,
    pub overall_valid: bool,
}

impl DiagnosticsReport {
    fn degenerate() -> Self {
        Self {
            throughput_bps: 0.0,
            straightness: 0.0,
            peak_velocity_fraction: 0.0,
            path_rmse_px: 0.0,
            tremor_peak_hz: 0.0,
            tremor_margin_db: 0.0,
            throughput_ok: false,
            straightness_ok: false,
            peak_timing_ok: false,
            rmse_ok: false,
            tremor_ok: false,
            overall_valid: false,
        }
    }
}

/// Analyze with the default pass bands.
pub fn diagnose(trace: &Trace, target_width: f64) -> DiagnosticsReport {
    Diagnostics::default().diagnose(trace, target_width)
}

impl Diagnostics {
    pub fn for_tremor_band(lo_hz: f64, hi_hz: f64) -> Self {
        Self {
            tremor_band_hz: (lo_hz, hi_hz),
            ..Self::default()
        }
    }

    pub fn diagnose(&self, trace: &Trace, target_width: f64) -> DiagnosticsReport {
        let samples = &trace.samples;
        if samples.len() < 8 || target_width <= 0.0 || trace.duration() <= 0.0 {
            return DiagnosticsReport::degenerate();
        }

        let speeds = smoothed_speeds(samples);
        let peak_speed = speeds.iter().cloned().fold(0.0f64, f64::max);
        let threshold = (ONSET_PEAK_FRACTION * peak_speed).max(SPEED_FLOOR_PX_S);

        let onset = speeds.iter().position(|&v| v > threshold);
        let offset = speeds.iter().rposition(|&v| v > threshold);
        let (onset, offset) = match (onset, offset) {
            (Some(a), Some(b)) if b > a + 2 => (a, b),
            _ => return DiagnosticsReport::degenerate(),
        };
        let movement = &samples[onset..=offset];

        // Throughput and straightness cover the whole trace, per their
        // published definitions; timing and RMSE are movement-portion
        // quantities.
        let first = samples[0];
        let last = samples[samples.len() - 1];
        let distance = first.point().distance_to(&last.point());
        let id = fitts::index_of_difficulty(distance, target_width);
        let throughput_bps = id / trace.duration();

        let straightness = straightness_index(samples);

        let peak_idx = onset
            + speeds[onset..=offset]
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
        let span = samples[offset].t - samples[onset].t;
        let peak_velocity_fraction = if span > 0.0 {
            (samples[peak_idx].t - samples[onset].t) / span
        } else {
            0.0
        };

        let path_rmse_px = chord_rmse(movement);

        let tail = if samples.len() - offset >= 8 {
            &samples[offset..]
        } else {
            &samples[samples.len() - samples.len() / 4..]
        };
        let (tremor_peak_hz, tremor_margin_db) = self.tremor_spectrum(tail);

        let throughput_ok = throughput_bps <= self.max_throughput_bps;
        let straightness_ok = straightness >= self.straightness_band.0
            && straightness <= self.straightness_band.1;
        let peak_timing_ok = peak_velocity_fraction >= self.peak_timing_band.0
            && peak_velocity_fraction <= self.peak_timing_band.1;
        let rmse_ok =
            path_rmse_px >= self.rmse_band_px.0 && path_rmse_px <= self.rmse_band_px.1;
        let tremor_ok = tremor_peak_hz >= self.tremor_band_hz.0 - 2.0
            && tremor_peak_hz <= self.tremor_band_hz.1 + 2.0
            && tremor_margin_db >= TREMOR_MARGIN_DB;

        DiagnosticsReport {
            throughput_bps,
            straightness,
            peak_velocity_fraction,
            path_rmse_px,
            tremor_peak_hz,
            tremor_margin_db,
            throughput_ok,
            straightness_ok,
            peak_timing_ok,
            rmse_ok,
            tremor_ok,
            overall_valid: throughput_ok
                && straightness_ok
                && peak_timing_ok
                && rmse_ok
                && tremor_ok,
        }
    }

    /// Windowed power spectrum of the stationary tail, x and y pooled.
    /// Returns the peak frequency and the band-over-adjacent margin in dB.
    fn tremor_spectrum(&self, tail: &[Sample]) -> (f64, f64) {
        let n = tail.len();
        if n < 8 {
            return (0.0, 0.0);
        }
        let span = tail[n - 1].t - tail[0].t;
        if span <= 0.0 {
            return (0.0, 0.0);
        }
        let fs = (n - 1) as f64 / span;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let mut power = vec![0.0f64; n];
        for axis in 0..2 {
            let series: Vec<f64> = tail
                .iter()
                .map(|s| if axis == 0 { s.x } else { s.y })
                .collect();
            let mean = series.iter().sum::<f64>() / n as f64;
            let mut buffer: Vec<Complex<f64>> = series
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    // Hann window on the detrended series
                    let w = 0.5
                        - 0.5
                            * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
                    Complex::new((v - mean) * w, 0.0)
                })
                .collect();
            fft.process(&mut buffer);
            for (p, c) in power.iter_mut().zip(buffer.iter()) {
                *p += c.norm_sqr();
            }
        }

        let half = n / 2;
        let bin_hz = fs / n as f64;
        let (lo, hi) = self.tremor_band_hz;

        // The peak is searched inside the band and its comparison bands
        // only; residual sub-4 Hz drift from the deceleration tail is not
        // part of the tremor question.
        let mut peak_hz = 0.0;
        let mut peak_power = 0.0;
        let mut band = BandPower::default();
        let mut adjacent = BandPower::default();
        for k in 1..=half {
            let freq = k as f64 * bin_hz;
            let p = power[k];
            if freq >= lo - ADJACENT_BAND_HZ && freq <= hi + ADJACENT_BAND_HZ {
                if p > peak_power {
                    peak_power = p;
                    peak_hz = freq;
                }
                if freq >= lo && freq <= hi {
                    band.add(p);
                } else {
                    adjacent.add(p);
                }
            }
        }

        match (band.mean(), adjacent.mean()) {
            (Some(b), Some(a)) if a > 0.0 => (peak_hz, 10.0 * (b / a).log10()),
            (Some(_), _) => (peak_hz, 0.0),
            _ => (peak_hz, 0.0),
        }
    }
}

#[derive(Default)]
struct BandPower {
    sum: f64,
    count: usize,
}

impl BandPower {
    fn add(&mut self, p: f64) {
        self.sum += p;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-sample speed from velocity vectors averaged over a short window.
fn smoothed_speeds(samples: &[Sample]) -> Vec<f64> {
    let n = samples.len();
    let mut speeds = vec![0.0; n];
    for i in 0..n {
        let a = i.saturating_sub(SMOOTHING_RADIUS);
        let b = (i + SMOOTHING_RADIUS).min(n - 1);
        let dt = samples[b].t - samples[a].t;
        if dt > 0.0 {
            let dx = samples[b].x - samples[a].x;
            let dy = samples[b].y - samples[a].y;
            speeds[i] = (dx * dx + dy * dy).sqrt() / dt;
        }
    }
    speeds
}

fn straightness_index(samples: &[Sample]) -> f64 {
    let chord = samples[0]
        .point()
        .distance_to(&samples[samples.len() - 1].point());
    let arc: f64 = samples
        .windows(2)
        .map(|w| w[0].point().distance_to(&w[1].point()))
        .sum();
    if arc <= 0.0 {
        1.0
    } else {
        chord / arc
    }
}

/// RMS perpendicular distance from the movement chord.
fn chord_rmse(movement: &[Sample]) -> f64 {
    let a = movement[0].point();
    let b = movement[movement.len() - 1].point();
    let chord = a.distance_to(&b);
    if chord <= 0.0 {
        return 0.0;
    }
    let ux = (b.x - a.x) / chord;
    let uy = (b.y - a.y) / chord;
    let mean_sq = movement
        .iter()
        .map(|s| {
            let dx = s.x - a.x;
            let dy = s.y - a.y;
            let perp = dx * uy - dy * ux;
            perp * perp
        })
        .sum::<f64>()
        / movement.len() as f64;
    mean_sq.sqrt()
}
