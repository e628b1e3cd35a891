//! Input events as the handlers see them, plus the time and request-id sources.

use std::cell::Cell;
use kurbo::Point;
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(from = "u8", into = "u8")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
    Other(u8),
}

impl From<u8> for MouseButton {
    fn from(button: u8) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            other => MouseButton::Other(other),
        }
    }
}

impl From<MouseButton> for u8 {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Other(other) => other,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// DOM-shaped pointer event in client coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PointerEvent {
    pub button: MouseButton,
    pub client_x: f64,
    pub client_y: f64,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub alt_key: bool,
}

impl PointerEvent {
    pub fn new(button: MouseButton, x: f64, y: f64) -> Self {
        PointerEvent { button, client_x: x, client_y: y, ..Default::default() }
    }

    pub fn left(x: f64, y: f64) -> Self {
        PointerEvent::new(MouseButton::Left, x, y)
    }

    pub fn right(x: f64, y: f64) -> Self {
        PointerEvent::new(MouseButton::Right, x, y)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.shift_key = modifiers.shift;
        self.ctrl_key = modifiers.ctrl;
        self.alt_key = modifiers.alt;
        self
    }

    pub fn client(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers { shift: self.shift_key, ctrl: self.ctrl_key, alt: self.alt_key }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyEvent {
    pub key: String,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub alt_key: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        KeyEvent { key: key.to_string(), ..Default::default() }
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers { shift: self.shift_key, ctrl: self.ctrl_key, alt: self.alt_key }
    }
}

/// Monotonic milliseconds, used for gesture durations.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[cfg(not(target_arch = "wasm32"))]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: std::time::Instant::now() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Issues increasing ids for asynchronous round trips through the host and accepts
/// only the completion of the latest one.
#[derive(Debug, Default)]
pub struct RequestTracker {
    last: u64,
    pending: Option<u64>,
}

impl RequestTracker {
    pub fn issue(&mut self) -> u64 {
        self.last += 1;
        self.pending = Some(self.last);
        self.last
    }

    /// True when `id` is the outstanding request; it is then no longer pending.
    pub fn complete(&mut self, id: u64) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            log::debug!("dropping stale completion {}", id);
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
