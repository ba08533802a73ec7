// gSENSOR - Button Input Manager
//
// Debounced push-button handler. A level change is only honoured once
// BUTTON_DEBOUNCE_MS have passed since the previous accepted change; the
// press edge is reported to the caller. Polled every loop iteration.

use crate::board::Button;
use crate::config::BUTTON_DEBOUNCE_MS;

pub struct InputManager {
    button: Box<dyn Button>,

    // Debounce state
    pressed: bool,
    last_change_ms: u32,
}

impl InputManager {
    pub fn new(button: Box<dyn Button>) -> Self {
        Self {
            button,
            pressed: false,
            last_change_ms: 0,
        }
    }

    /// Returns `true` exactly once per accepted press.
    pub fn update(&mut self, now_ms: u32) -> bool {
        let current = self.button.is_pressed();
        if current == self.pressed {
            return false;
        }

        if now_ms.wrapping_sub(self.last_change_ms) < BUTTON_DEBOUNCE_MS {
            // Still bouncing - the next poll sees the level again.
            return false;
        }

        self.pressed = current;
        self.last_change_ms = now_ms;
        current
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}
