//! Seedable random source threaded through every sampler in the core.
//!
//! A session owns exactly one `MotorRng`. Two sessions built from the same
//! seed that issue the same call sequence draw identical streams, which is
//! what makes trace generation reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal, Normal};

/// Rejection attempts before a truncated draw falls back to clamping.
const TRUNCATION_ATTEMPTS: usize = 32;

#[derive(Debug)]
pub struct MotorRng {
    inner: StdRng,
}

impl MotorRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Uniform draw in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    pub fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// Gaussian draw. A degenerate std (zero, negative, non-finite) yields
    /// the mean.
    pub fn gaussian(&mut self, mean: f64, std: f64) -> f64 {
        if !(std > 0.0) || !std.is_finite() {
            return mean;
        }
        Normal::new(mean, std)
            .map(|d| d.sample(&mut self.inner))
            .unwrap_or(mean)
    }

    /// Log-normal draw; `mu`/`sigma` are in log space.
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        if !(sigma > 0.0) || !sigma.is_finite() {
            return mu.exp();
        }
        LogNormal::new(mu, sigma)
            .map(|d| d.sample(&mut self.inner))
            .unwrap_or_else(|_| mu.exp())
    }

    /// Ex-gaussian draw: gaussian plus an independent exponential tail.
    pub fn exgaussian(&mut self, mu: f64, sigma: f64, tau: f64) -> f64 {
        let g = self.gaussian(mu, sigma);
        if !(tau > 0.0) || !tau.is_finite() {
            return g;
        }
        let tail = Exp::new(1.0 / tau)
            .map(|d| d.sample(&mut self.inner))
            .unwrap_or(0.0);
        g + tail
    }

    /// Zero-mean bivariate normal with a diagonal covariance. Submovement
    /// error covariances are isotropic, so two independent draws suffice.
    pub fn bivariate_normal(&mut self, std_x: f64, std_y: f64) -> (f64, f64) {
        (self.gaussian(0.0, std_x), self.gaussian(0.0, std_y))
    }

    /// Gaussian restricted to [lo, hi] by rejection; clamps after
    /// `TRUNCATION_ATTEMPTS` failed draws.
    pub fn truncated_gaussian(&mut self, mean: f64, std: f64, lo: f64, hi: f64) -> f64 {
        for _ in 0..TRUNCATION_ATTEMPTS {
            let x = self.gaussian(mean, std);
            if (lo..=hi).contains(&x) {
                return x;
            }
        }
        self.gaussian(mean, std).clamp(lo, hi)
    }

    /// ±1 with equal probability.
    pub fn sign(&mut self) -> f64 {
        if self.inner.gen_bool(0.5) {
            1.0
        } else {
            -1.0
        }
    }

    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.inner.gen_bool(p)
    }
}
