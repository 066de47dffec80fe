//! Pointer-driver seam.
//!
//! The core never talks to an OS directly; it emits through this trait and
//! backends (CDP, uinput, win32 SendInput, ...) live in other crates. The
//! driver must not reorder, coalesce, or drop events.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::types::Button;

#[async_trait]
pub trait PointerDriver: Send {
    /// Move the pointer to absolute screen coordinates. Non-blocking.
    async fn move_to(&mut self, x: f64, y: f64) -> anyhow::Result<()>;

    async fn button_down(&mut self, button: Button) -> anyhow::Result<()>;

    async fn button_up(&mut self, button: Button) -> anyhow::Result<()>;

    async fn scroll(&mut self, dx: f64, dy: f64) -> anyhow::Result<()>;
}

/// Driver that discards everything. Dry-runs, benchmarks, trace synthesis
/// without a live backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriver;

#[async_trait]
impl PointerDriver for NullDriver {
    async fn move_to(&mut self, _x: f64, _y: f64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn button_down(&mut self, _button: Button) -> anyhow::Result<()> {
        Ok(())
    }

    async fn button_up(&mut self, _button: Button) -> anyhow::Result<()> {
        Ok(())
    }

    async fn scroll(&mut self, _dx: f64, _dy: f64) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One emitted pointer event, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Move { x: f64, y: f64 },
    ButtonDown(Button),
    ButtonUp(Button),
    Scroll { dx: f64, dy: f64 },
}

/// Driver that records every event. Clone the handle before handing it to a
/// session and inspect the log afterwards.
#[derive(Debug, Default, Clone)]
pub struct RecordingDriver {
    events: Arc<Mutex<Vec<PointerEvent>>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PointerEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }

    pub fn count_moves(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PointerEvent::Move { .. }))
            .count()
    }

    pub fn count_downs(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PointerEvent::ButtonDown(_)))
            .count()
    }

    pub fn count_ups(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PointerEvent::ButtonUp(_)))
            .count()
    }

    fn push(&self, event: PointerEvent) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

#[async_trait]
impl PointerDriver for RecordingDriver {
    async fn move_to(&mut self, x: f64, y: f64) -> anyhow::Result<()> {
        self.push(PointerEvent::Move { x, y });
        Ok(())
    }

    async fn button_down(&mut self, button: Button) -> anyhow::Result<()> {
        self.push(PointerEvent::ButtonDown(button));
        Ok(())
    }

    async fn button_up(&mut self, button: Button) -> anyhow::Result<()> {
        self.push(PointerEvent::ButtonUp(button));
        Ok(())
    }

    async fn scroll(&mut self, dx: f64, dy: f64) -> anyhow::Result<()> {
        self.push(PointerEvent::Scroll { dx, dy });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_driver_keeps_emission_order() {
        let recorder = RecordingDriver::new();
        let mut driver = recorder.clone();
        driver.move_to(1.0, 2.0).await.unwrap();
        driver.button_down(Button::Left).await.unwrap();
        driver.button_up(Button::Left).await.unwrap();
        driver.scroll(0.0, -3.0).await.unwrap();
        let events = recorder.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], PointerEvent::Move { x: 1.0, y: 2.0 });
        assert_eq!(events[1], PointerEvent::ButtonDown(Button::Left));
        assert_eq!(events[2], PointerEvent::ButtonUp(Button::Left));
        assert_eq!(events[3], PointerEvent::Scroll { dx: 0.0, dy: -3.0 });
    }
}
