//! Asymmetric minimum-jerk velocity profile.
//!
//! The symmetric minimum-jerk reach follows the quintic
//! `s(tau) = 10tau^3 - 15tau^4 + 6tau^5`, whose velocity is the bell
//! `30 tau^2 (1 - tau)^2` peaking at mid-movement. Human reaches peak
//! earlier and spend the back half decelerating onto the target, so the
//! velocity bell is generalized to the beta-shaped pulse
//! `v(u) ~ u^(4a) (1 - u)^(4(1 - a))`, which keeps the quintic exactly at
//! `a = 0.5` and places the peak at time fraction `a` for any admissible
//! asymmetry. Position comes from integrating the pulse over the sample
//! grid and normalizing, so the endpoints are exact by construction.

/// Normalized position/velocity samples over one movement.
#[derive(Debug, Clone)]
pub struct MotionProfile {
    /// Seconds, from 0 to the leg duration inclusive.
    pub t: Vec<f64>,
    /// Normalized progress in [0, 1].
    pub s: Vec<f64>,
    /// Progress per second, non-negative.
    pub v: Vec<f64>,
}

/// Minimum-jerk position polynomial on [0, 1]; the `asymmetry = 0.5`
/// profile integrates to exactly this curve.
pub fn minimum_jerk(tau: f64) -> f64 {
    tau * tau * tau * (10.0 - 15.0 * tau + 6.0 * tau * tau)
}

impl MotionProfile {
    /// Sample the profile at `sample_rate` Hz over `[0, duration]` with the
    /// velocity peak at `asymmetry * duration`. Both endpoints are included
    /// and pinned to exactly 0 and 1.
    pub fn generate(duration: f64, sample_rate: f64, asymmetry: f64) -> Self {
        let steps = ((duration * sample_rate).round() as usize).max(2);
        let p = 4.0 * asymmetry;
        let q = 4.0 * (1.0 - asymmetry);

        // velocity pulse on the uniform grid
        let pulse: Vec<f64> = (0..=steps)
            .map(|i| {
                let u = i as f64 / steps as f64;
                if u <= 0.0 || u >= 1.0 {
                    0.0
                } else {
                    u.powf(p) * (1.0 - u).powf(q)
                }
            })
            .collect();

        // cumulative trapezoid gives monotone progress
        let mut cumulative = vec![0.0; steps + 1];
        for i in 1..=steps {
            cumulative[i] = cumulative[i - 1] + 0.5 * (pulse[i] + pulse[i - 1]);
        }
        let total = cumulative[steps];

        let dt = duration / steps as f64;
        let mut t = Vec::with_capacity(steps + 1);
        let mut s = Vec::with_capacity(steps + 1);
        let mut v = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            t.push(i as f64 * dt);
            s.push(cumulative[i] / total);
            // ds/du = pulse / (total * du), converted to per-second
            v.push(pulse[i] * steps as f64 / (total * duration));
        }

        // Pin the endpoints so float dust cannot leak into the leg's
        // endpoint contract.
        s[0] = 0.0;
        s[steps] = 1.0;
        t[steps] = duration;

        Self { t, s, v }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}
