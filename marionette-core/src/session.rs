//! Trajectory composer and session front-end.
//!
//! A session owns the PRNG, the driver, and the cursor, all behind one async
//! mutex: concurrent calls against the same session queue up rather than
//! interleave pointer control. Every trace is synthesized in full before the
//! first driver call, so emission is a thin paced loop that sleeps until each
//! sample's wall time and yields to the runtime in between.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, CLICK_DURATION_BOUNDS_S, CLICK_DWELL_BOUNDS_S};
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::driver::PointerDriver;
use crate::error::{MarionetteError, Result};
use crate::noise::NoiseInjector;
use crate::path;
use crate::profile::MotionProfile;
use crate::rng::MotorRng;
use crate::submovement;
use crate::types::{Button, Point, Sample, Target, Trace};

/// Reaction latency before movement onset: ex-gaussian parameters and
/// clamp, seconds.
const REACTION_EXG: (f64, f64, f64) = (0.065, 0.012, 0.018);
const REACTION_BOUNDS_S: (f64, f64) = (0.05, 0.13);

/// Settle dwell after a non-clicking move, seconds. Long enough that the
/// stationary tail carries a resolvable tremor spectrum.
const SETTLE_MEAN_S: f64 = 0.19;
const SETTLE_STD_S: f64 = 0.03;
const SETTLE_BOUNDS_S: (f64, f64) = (0.14, 0.26);

/// Gap between the two presses of a double click, seconds.
const DOUBLE_GAP_EXG: (f64, f64, f64) = (0.09, 0.02, 0.03);
const DOUBLE_GAP_BOUNDS_S: (f64, f64) = (0.06, 0.25);

/// Legs shorter than this get proportionally attenuated curvature.
const CURVATURE_ATTENUATION_LEG_PX: f64 = 40.0;

/// Effective width handed to the duration model for scroll gestures.
const SCROLL_EFFECTIVE_WIDTH_PX: f64 = 100.0;

/// Floor on the emission watchdog budget.
const MIN_WATCHDOG_BUDGET: Duration = Duration::from_millis(500);

/// Cooperative cancellation flag, observed at every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Re-arm the session after a cancellation.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct SessionState<D> {
    rng: MotorRng,
    cursor: Point,
    driver: D,
}

/// A fully synthesized move, ready for paced emission.
struct MovePlan {
    trace: Trace,
    hold_s: Option<f64>,
    missed: bool,
}

pub struct Session<D: PointerDriver> {
    config: Config,
    noise: NoiseInjector,
    diagnostics: Diagnostics,
    cancel: CancelHandle,
    state: Mutex<SessionState<D>>,
}

impl<D: PointerDriver> Session<D> {
    pub fn new(config: Config, driver: D) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => MotorRng::seeded(seed),
            None => MotorRng::from_entropy(),
        };
        let noise = NoiseInjector::new(&config.noise, config.sample_rate);
        let diagnostics = Diagnostics::for_tremor_band(
            config.noise.tremor_freq_hz - 2.0,
            config.noise.tremor_freq_hz + 2.0,
        );
        info!(
            "session ready: {} Hz dispatch, seeded={}",
            config.sample_rate,
            config.seed.is_some()
        );
        Ok(Self {
            config,
            noise,
            diagnostics,
            cancel: CancelHandle::default(),
            state: Mutex::new(SessionState {
                rng,
                cursor: Point::new(960.0, 540.0),
                driver,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current cursor position as tracked by the session.
    pub async fn cursor(&self) -> Point {
        self.state.lock().await.cursor
    }

    /// Build a move trace without driving the pointer. Consumes PRNG state
    /// exactly like `move_to` would.
    pub async fn synthesize_move(&self, start: Point, target: &Target) -> Result<Trace> {
        let mut state = self.state.lock().await;
        let plan = self.build_move(&mut state.rng, start, target, false)?;
        Ok(plan.trace)
    }

    /// Move the pointer from `start` onto `target`, optionally finishing
    /// with a click. Returns the emitted trace.
    pub async fn move_to(
        &self,
        start: Point,
        target: &Target,
        click: Option<Button>,
    ) -> Result<Trace> {
        let mut state = self.state.lock().await;
        let plan = self.build_move(&mut state.rng, start, target, click.is_some())?;
        debug!(
            "trajectory ready: {} samples over {:.0} ms (missed={})",
            plan.trace.len(),
            plan.trace.duration() * 1000.0,
            plan.missed
        );
        self.emit_plan(&mut state, &plan, click).await?;
        if let Some(last) = plan.trace.last() {
            state.cursor = last.point();
        }
        Ok(plan.trace)
    }

    /// Click in place: verification dwell, press, release. `at` defaults to
    /// the session cursor. The pointer never travels beyond tremor.
    pub async fn click(&self, at: Option<Point>, button: Button, double: bool) -> Result<Trace> {
        let mut state = self.state.lock().await;
        let anchor = at.unwrap_or(state.cursor);
        if !anchor.is_finite() {
            return Err(MarionetteError::InvalidGeometry(format!(
                "non-finite click position: ({}, {})",
                anchor.x, anchor.y
            )));
        }

        let click_cfg = &self.config.click;
        let dwell_s = state
            .rng
            .lognormal(click_cfg.dwell_mu, click_cfg.dwell_sigma)
            .clamp(CLICK_DWELL_BOUNDS_S.0, CLICK_DWELL_BOUNDS_S.1);
        let samples = self.stationary_samples(&mut state.rng, anchor, dwell_s, 0.0);
        let trace = Trace { samples };
        let first_hold = self.sample_hold(&mut state.rng);
        let second = double.then(|| {
            let gap = state
                .rng
                .exgaussian(DOUBLE_GAP_EXG.0, DOUBLE_GAP_EXG.1, DOUBLE_GAP_EXG.2)
                .clamp(DOUBLE_GAP_BOUNDS_S.0, DOUBLE_GAP_BOUNDS_S.1);
            (gap, self.sample_hold(&mut state.rng))
        });

        let scheduled = trace.duration()
            + first_hold
            + second.map(|(gap, hold)| gap + hold).unwrap_or(0.0);
        let budget = watchdog_budget(scheduled);
        let started = Instant::now();

        self.emit_trace(&mut state, &trace, started, budget).await?;
        self.emit_click(&mut state, button, first_hold, started, budget)
            .await?;
        if let Some((gap, hold)) = second {
            sleep(Duration::from_secs_f64(gap)).await;
            if self.cancel.is_cancelled() {
                return Err(MarionetteError::Cancelled);
            }
            self.emit_click(&mut state, button, hold, started, budget)
                .await?;
        }
        state.cursor = anchor;
        Ok(trace)
    }

    /// Scroll by `(dx, dy)` with the magnitude spread over time by the same
    /// velocity envelope a reach uses.
    pub async fn scroll(&self, dx: f64, dy: f64) -> Result<()> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(MarionetteError::InvalidGeometry(format!(
                "non-finite scroll delta: ({dx}, {dy})"
            )));
        }
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude < f64::EPSILON {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        let duration = self.config.fitts.sample_duration(
            &mut state.rng,
            magnitude,
            SCROLL_EFFECTIVE_WIDTH_PX,
        )?;
        let profile = MotionProfile::generate(
            duration,
            self.config.sample_rate,
            self.config.velocity_asymmetry,
        );
        let budget = watchdog_budget(duration);
        let started = Instant::now();
        let mut progress = 0.0;
        for i in 1..profile.len() {
            if self.cancel.is_cancelled() {
                return Err(MarionetteError::Cancelled);
            }
            sleep_until(started + Duration::from_secs_f64(profile.t[i])).await;
            if self.cancel.is_cancelled() {
                return Err(MarionetteError::Cancelled);
            }
            let step = profile.s[i] - progress;
            progress = profile.s[i];
            if step <= 0.0 {
                continue;
            }
            self.with_watchdog(state.driver.scroll(dx * step, dy * step), started, budget)
                .await?;
        }
        Ok(())
    }

    /// Analyze a finished trace against this session's tremor band.
    pub fn diagnose(&self, trace: &Trace, target_width: f64) -> DiagnosticsReport {
        self.diagnostics.diagnose(trace, target_width)
    }

    // ---- synthesis ----

    fn build_move(
        &self,
        rng: &mut MotorRng,
        start: Point,
        target: &Target,
        clicking: bool,
    ) -> Result<MovePlan> {
        if !start.is_finite() || !target.is_finite() {
            return Err(MarionetteError::InvalidGeometry(
                "non-finite move geometry".to_string(),
            ));
        }
        if target.width <= 0.0 || target.height <= 0.0 {
            return Err(MarionetteError::InvalidGeometry(format!(
                "target box must have positive extent, got {} x {}",
                target.width, target.height
            )));
        }

        let cfg = &self.config;
        let distance = start.distance_to(&target.center);
        let duration = cfg
            .fitts
            .sample_duration(rng, distance, target.effective_width())?;
        let plan = submovement::plan(
            rng,
            start,
            target,
            &cfg.submovement,
            cfg.fitts.nominal_error_rate,
        );

        let mut samples: Vec<Sample> = Vec::new();

        // Reaction latency: the hand rests at the start before the first
        // force pulse.
        let reaction_s = rng
            .exgaussian(REACTION_EXG.0, REACTION_EXG.1, REACTION_EXG.2)
            .clamp(REACTION_BOUNDS_S.0, REACTION_BOUNDS_S.1);
        append_segment(
            &mut samples,
            self.stationary_samples(rng, start, reaction_s, 0.0),
        );

        let mut clock = reaction_s;
        let mut prev = start;
        // Peak speed of the primary leg; corrections are visually guided and
        // must stay below it, or the trace's velocity peak migrates into the
        // correction chain.
        let mut primary_peak: Option<f64> = None;
        for leg in &plan.legs {
            let leg_len_px = prev.distance_to(&leg.endpoint);
            let mut leg_duration = (leg.fraction * duration).max(2.0 / cfg.sample_rate);
            match primary_peak {
                None => {
                    if leg_duration > 0.0 {
                        // the minimum-jerk pulse peaks near 1.9x average speed
                        primary_peak = Some(1.875 * leg_len_px / leg_duration);
                    }
                }
                Some(peak) if peak > 0.0 && leg_len_px > 0.0 => {
                    let floor = 1.875 * leg_len_px / (0.9 * peak);
                    leg_duration = leg_duration.max(floor);
                }
                Some(_) => {}
            }
            let profile =
                MotionProfile::generate(leg_duration, cfg.sample_rate, cfg.velocity_asymmetry);

            let mut curvature =
                rng.truncated_gaussian(cfg.path.curvature, cfg.path.deviation, 0.0, 0.3);
            if leg_len_px < CURVATURE_ATTENUATION_LEG_PX {
                curvature *= leg_len_px / CURVATURE_ATTENUATION_LEG_PX;
            }
            let side = rng.sign();

            let points = path::lift(prev, leg.endpoint, &profile.s, curvature, side);
            let mut leg_samples: Vec<Sample> = profile
                .t
                .iter()
                .zip(points.iter())
                .map(|(&t, p)| Sample::new(clock + t, p.x, p.y))
                .collect();
            self.noise.apply(rng, &mut leg_samples, prev, leg.endpoint);
            append_segment(&mut samples, leg_samples);

            clock += leg_duration;
            prev = leg.endpoint;
        }

        // Tail at the endpoint: verification dwell when a click follows,
        // otherwise a short settle.
        let tail_s = if clicking {
            rng.lognormal(cfg.click.dwell_mu, cfg.click.dwell_sigma)
                .clamp(CLICK_DWELL_BOUNDS_S.0, CLICK_DWELL_BOUNDS_S.1)
        } else {
            rng.truncated_gaussian(SETTLE_MEAN_S, SETTLE_STD_S, SETTLE_BOUNDS_S.0, SETTLE_BOUNDS_S.1)
        };
        append_segment(&mut samples, self.stationary_samples(rng, prev, tail_s, clock));

        let hold_s = clicking.then(|| self.sample_hold(rng));

        Ok(MovePlan {
            trace: Trace { samples },
            hold_s,
            missed: plan.missed,
        })
    }

    fn sample_hold(&self, rng: &mut MotorRng) -> f64 {
        rng.lognormal(self.config.click.duration_mu, self.config.click.duration_sigma)
            .clamp(CLICK_DURATION_BOUNDS_S.0, CLICK_DURATION_BOUNDS_S.1)
    }

    /// Tremor-only samples pinned to `anchor`, covering `[t0, t0 + duration]`.
    fn stationary_samples(
        &self,
        rng: &mut MotorRng,
        anchor: Point,
        duration: f64,
        t0: f64,
    ) -> Vec<Sample> {
        let steps = ((duration * self.config.sample_rate).round() as usize).max(2);
        let dt = duration / steps as f64;
        let mut out: Vec<Sample> = (0..=steps)
            .map(|i| Sample::new(t0 + i as f64 * dt, anchor.x, anchor.y))
            .collect();
        out[steps].t = t0 + duration;
        self.noise.apply_stationary(rng, &mut out, anchor);
        out
    }

    // ---- emission ----

    async fn emit_plan(
        &self,
        state: &mut SessionState<D>,
        plan: &MovePlan,
        click: Option<Button>,
    ) -> Result<()> {
        let scheduled = plan.trace.duration() + plan.hold_s.unwrap_or(0.0);
        let budget = watchdog_budget(scheduled);
        let started = Instant::now();
        self.emit_trace(state, &plan.trace, started, budget).await?;
        if let Some(button) = click {
            let hold = plan.hold_s.unwrap_or(CLICK_DURATION_BOUNDS_S.0);
            self.emit_click(state, button, hold, started, budget).await?;
        }
        Ok(())
    }

    async fn emit_trace(
        &self,
        state: &mut SessionState<D>,
        trace: &Trace,
        started: Instant,
        budget: Duration,
    ) -> Result<()> {
        for sample in trace.iter() {
            if self.cancel.is_cancelled() {
                return Err(MarionetteError::Cancelled);
            }
            sleep_until(started + Duration::from_secs_f64(sample.t)).await;
            if self.cancel.is_cancelled() {
                return Err(MarionetteError::Cancelled);
            }
            self.with_watchdog(state.driver.move_to(sample.x, sample.y), started, budget)
                .await?;
        }
        Ok(())
    }

    /// Press + hold + release. Once the press is out, the release goes out
    /// no matter what the cancellation flag says.
    async fn emit_click(
        &self,
        state: &mut SessionState<D>,
        button: Button,
        hold_s: f64,
        started: Instant,
        budget: Duration,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MarionetteError::Cancelled);
        }
        self.with_watchdog(state.driver.button_down(button), started, budget)
            .await?;
        sleep(Duration::from_secs_f64(hold_s)).await;
        let released = state.driver.button_up(button).await;
        if self.cancel.is_cancelled() {
            if let Err(err) = released {
                warn!("button release failed during cancellation: {err}");
            }
            return Err(MarionetteError::Cancelled);
        }
        released.map_err(MarionetteError::Driver)
    }

    /// One driver call under the watchdog. A call that does not come back
    /// within the remaining budget is a stall.
    async fn with_watchdog<Fut>(&self, fut: Fut, started: Instant, budget: Duration) -> Result<()>
    where
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        let elapsed = started.elapsed();
        let Some(remaining) = budget.checked_sub(elapsed) else {
            warn!(
                "emission watchdog expired: {} ms elapsed against {} ms",
                elapsed.as_millis(),
                budget.as_millis()
            );
            return Err(MarionetteError::DriverStalled {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: budget.as_millis() as u64,
            });
        };
        match timeout(remaining, fut).await {
            Ok(result) => result.map_err(MarionetteError::Driver),
            Err(_) => {
                let elapsed = started.elapsed();
                warn!(
                    "driver call timed out after {} ms (budget {} ms)",
                    elapsed.as_millis(),
                    budget.as_millis()
                );
                Err(MarionetteError::DriverStalled {
                    elapsed_ms: elapsed.as_millis() as u64,
                    budget_ms: budget.as_millis() as u64,
                })
            }
        }
    }
}

fn watchdog_budget(scheduled_s: f64) -> Duration {
    Duration::from_secs_f64(2.0 * scheduled_s).max(MIN_WATCHDOG_BUDGET)
}

/// Splice a segment onto a growing trace, dropping the duplicated junction
/// sample of every segment after the first.
fn append_segment(samples: &mut Vec<Sample>, mut segment: Vec<Sample>) {
    if samples.is_empty() {
        *samples = segment;
    } else {
        samples.extend(segment.drain(1..));
    }
}
