// gSENSOR - System Events & Data Types

use crate::config::*;

// ---------------------------------------------------------------------------
// Sensor Data (3-axis reading in g)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub const ZERO: Sample = Sample { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Touch
// ---------------------------------------------------------------------------

/// One raw reading from the touch controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub x: i16,
    pub y: i16,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureKind {
    #[default]
    None,
    Tap,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub x: i16,
    pub y: i16,
    pub timestamp_ms: u32,
}

// ---------------------------------------------------------------------------
// Runtime rates
// ---------------------------------------------------------------------------

/// Accelerometer output data rates the trigger timer can be driven at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRate {
    #[default]
    Hz100,
    Hz200,
    Hz400,
    Hz800,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            Self::Hz100 => 100,
            Self::Hz200 => 200,
            Self::Hz400 => 400,
            Self::Hz800 => 800,
        }
    }

    pub fn interval_us(self) -> u64 {
        1_000_000 / self.hz() as u64
    }
}

/// Wireless notification rate, always within
/// [`NOTIFY_RATE_MIN_HZ`, `NOTIFY_RATE_MAX_HZ`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyRate(u8);

impl NotifyRate {
    pub fn new(hz: u8) -> Self {
        Self(hz.clamp(NOTIFY_RATE_MIN_HZ, NOTIFY_RATE_MAX_HZ))
    }

    pub fn hz(self) -> u8 {
        self.0
    }

    pub fn interval_ms(self) -> u32 {
        1000 / self.0 as u32
    }
}

impl Default for NotifyRate {
    fn default() -> Self {
        Self(NOTIFY_RATE_DEFAULT_HZ)
    }
}

// ---------------------------------------------------------------------------
// Out-of-band commands (serial console)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ResetPeak,
    ResetFilters,
    SetSampleRate(SampleRate),
    SetNotifyRate(u8),
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_rate_clamps_both_ends() {
        let slow = NotifyRate::new(0);
        assert_eq!(slow.hz(), NOTIFY_RATE_MIN_HZ);
        assert_eq!(slow.interval_ms(), 200);

        let fast = NotifyRate::new(255);
        assert_eq!(fast.hz(), NOTIFY_RATE_MAX_HZ);
        assert_eq!(fast.interval_ms(), 20);

        assert_eq!(NotifyRate::new(25).hz(), 25);
        assert_eq!(NotifyRate::default().interval_ms(), 50);
    }
}
