//! End-to-end scenarios against the public session API.
//!
//! All tests run under a paused tokio clock, so paced emission completes
//! instantly while wall-time arithmetic stays exact.

use marionette_core::config::SubmovementParams;
use marionette_core::rng::MotorRng;
use marionette_core::{
    diagnose, fitts, submovement, Button, Config, NullDriver, Point, PointerEvent,
    RecordingDriver, Session, Target,
};
use tokio::time::Instant;

mod common;

fn config_with_seed(seed: u64) -> Config {
    let mut cfg = Config::default();
    cfg.seed = Some(seed);
    cfg
}

#[tokio::test(start_paused = true)]
async fn medium_reach_lands_in_the_box() {
    common::init_tracing();
    let mut cfg = config_with_seed(42);
    cfg.fitts.nominal_error_rate = 0.0;
    let session = Session::new(cfg, NullDriver).unwrap();
    let start = Point::new(100.0, 100.0);
    let target = Target::square(Point::new(500.0, 300.0), 100.0);

    let trace = session.move_to(start, &target, None).await.unwrap();

    assert!(trace.len() >= 12, "only {} samples", trace.len());
    let duration = trace.duration();
    assert!(
        (0.25..=0.90).contains(&duration),
        "duration {duration} out of range"
    );

    let end = trace.last().unwrap().point();
    assert!((450.0..=550.0).contains(&end.x));
    assert!((250.0..=350.0).contains(&end.y));

    let id = fitts::index_of_difficulty(start.distance_to(&target.center), 100.0);
    assert!(id / duration <= 12.0 + 1e-9);
}

#[tokio::test(start_paused = true)]
async fn small_distant_target_is_slow_and_corrected() {
    common::init_tracing();
    let mut cfg = config_with_seed(42);
    cfg.fitts.nominal_error_rate = 0.0;
    let session = Session::new(cfg, NullDriver).unwrap();
    let start = Point::new(0.0, 0.0);
    let target = Target::square(Point::new(1000.0, 0.0), 5.0);

    let id = fitts::index_of_difficulty(1000.0, 5.0);
    assert!((id - 8.65).abs() < 0.01);

    let trace = session.move_to(start, &target, None).await.unwrap();
    assert!(trace.duration() >= id / 12.0, "duration {}", trace.duration());
    assert!(target.contains(&trace.last().unwrap().point()));

    // the primary leg undershoots by ~50 px against a 5 px box, so the plan
    // always carries at least one correction
    let mut rng = MotorRng::seeded(42);
    let plan = submovement::plan(&mut rng, start, &target, &SubmovementParams::default(), 0.0);
    assert!(plan.legs.len() >= 2);
}

#[tokio::test(start_paused = true)]
async fn pure_click_dwells_then_presses_in_place() {
    common::init_tracing();
    let recorder = RecordingDriver::new();
    let session = Session::new(config_with_seed(42), recorder.clone()).unwrap();
    let at = Point::new(200.0, 200.0);

    let t0 = Instant::now();
    let trace = session.click(Some(at), Button::Left, false).await.unwrap();
    let elapsed = t0.elapsed().as_secs_f64();

    // verification dwell
    let dwell = trace.duration();
    assert!((0.100..=0.600).contains(&dwell), "dwell {dwell}");

    // press-to-release spacing is whatever remains of the wall time
    let hold = elapsed - dwell;
    assert!((0.049..=0.351).contains(&hold), "hold {hold}");

    assert_eq!(recorder.count_downs(), 1);
    assert_eq!(recorder.count_ups(), 1);

    // no pointer travel beyond tremor
    for event in recorder.events() {
        if let PointerEvent::Move { x, y } = event {
            assert!((x - at.x).abs() < 3.0 && (y - at.y).abs() < 3.0);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn seeded_sessions_reproduce_traces_pairwise() {
    common::init_tracing();
    let make = || Session::new(config_with_seed(1337), NullDriver).unwrap();
    let a = make();
    let b = make();
    let start = Point::new(30.0, 40.0);
    let target = Target::square(Point::new(700.0, 360.0), 80.0);

    let a1 = a.move_to(start, &target, None).await.unwrap();
    let a2 = a.move_to(start, &target, None).await.unwrap();
    let b1 = b.move_to(start, &target, None).await.unwrap();
    let b2 = b.move_to(start, &target, None).await.unwrap();

    assert_eq!(a1, b1);
    assert_eq!(a2, b2);
    // consecutive calls on one session keep drawing fresh randomness
    assert_ne!(a1, a2);
}

#[tokio::test(start_paused = true)]
async fn certain_miss_always_lands_outside() {
    common::init_tracing();
    let mut cfg = config_with_seed(42);
    cfg.fitts.nominal_error_rate = 1.0;
    let session = Session::new(cfg, NullDriver).unwrap();
    let start = Point::new(0.0, 0.0);
    let target = Target::square(Point::new(400.0, 0.0), 10.0);

    for run in 0..100 {
        let trace = session.move_to(start, &target, None).await.unwrap();
        let end = trace.last().unwrap().point();
        assert!(!target.contains(&end), "run {run} landed inside at {end:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn default_traces_pass_their_own_diagnostics() {
    common::init_tracing();
    let session = Session::new(config_with_seed(42), NullDriver).unwrap();
    let start = Point::new(220.0, 180.0);
    let target = Target::square(Point::new(400.0, 260.0), 120.0);

    let mut passed = 0;
    let trials = 200;
    for _ in 0..trials {
        let trace = session.synthesize_move(start, &target).await.unwrap();
        let report = diagnose(&trace, target.effective_width());
        if report.overall_valid {
            passed += 1;
        }
    }
    assert!(passed * 100 >= trials * 95, "{passed}/{trials} passed");
}
