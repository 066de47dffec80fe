//! Neuromotor kinematics core: synthesizes pointer trajectories and input
//! event schedules whose statistical signatures match human motor-control
//! data, and analyzes finished traces against those same signatures.

pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod fitts;
pub mod noise;
pub mod path;
pub mod profile;
pub mod rng;
pub mod session;
pub mod submovement;
pub mod types;

pub use config::Config;
pub use diagnostics::{diagnose, Diagnostics, DiagnosticsReport};
pub use driver::{NullDriver, PointerDriver, PointerEvent, RecordingDriver};
pub use error::{MarionetteError, Result};
pub use session::{CancelHandle, Session};
pub use types::{Button, Point, Sample, Target, Trace};
