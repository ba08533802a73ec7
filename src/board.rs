// gSENSOR - Collaborator contracts
//
// The coordination core only talks to hardware through these traits. The
// firmware binary implements them on top of esp-idf-hal; tests implement them
// with in-memory fakes.

use crate::events::{Command, Contact, Sample, SampleRate};
use crate::ui::Settings;

/// Accelerometer. `read_sample` must return within one sample interval.
pub trait Sensor {
    fn read_sample(&mut self) -> anyhow::Result<Sample>;
    fn set_data_rate(&mut self, rate: SampleRate) -> anyhow::Result<()>;
}

/// Touch controller. `None` means the read failed; the caller retries on the
/// next poll.
pub trait TouchPanel {
    fn poll_contact(&mut self) -> Option<Contact>;
}

/// Physical push button, raw (undebounced) level.
pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

/// Fixed-rate source of the sample trigger.
pub trait SampleTimer {
    fn set_rate(&mut self, rate: SampleRate) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeReadout {
    pub filtered: Sample,
    pub magnitude: f32,
    pub peak: f32,
    pub sensor_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsReadout {
    pub settings: Settings,
    pub peer_connected: bool,
}

/// What the active screen should show on this refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Gauge(GaugeReadout),
    Settings(SettingsReadout),
}

/// Round LCD. Calls are synchronous and bounded well below the refresh
/// interval.
pub trait Display {
    /// Clear the whole surface before the first frame of a new screen.
    fn prepare_full_redraw(&mut self) -> anyhow::Result<()>;
    fn render(&mut self, frame: &Frame) -> anyhow::Result<()>;
    /// Drop any auto-ranged gauge scale back to its default.
    fn reset_scale(&mut self);
}

/// Short-range wireless link. Sends must not block.
pub trait WirelessLink {
    fn is_peer_connected(&self) -> bool;
    fn send_update(&mut self, payload: &[u8]);
    fn send_peak(&mut self, payload: &[u8]);
    fn set_enabled(&mut self, enabled: bool);
    /// Store a notification rate and return the clamped value in effect.
    fn set_rate_hz(&mut self, hz: u8) -> u8;
}

/// Line-oriented debug output. Must not block the caller.
pub trait DebugStream {
    fn write_line(&mut self, line: &str);

    /// Lines lost because the output could not keep up.
    fn dropped_lines(&self) -> u32 {
        0
    }
}

/// Out-of-band commands received between loop iterations.
pub trait CommandSource {
    fn poll_command(&mut self) -> Option<Command>;
}

/// Every collaborator the scheduler drives. Absent devices are `None`.
pub struct Devices {
    pub sensor: Option<Box<dyn Sensor>>,
    pub touch: Option<Box<dyn TouchPanel>>,
    pub button: Box<dyn Button>,
    pub timer: Box<dyn SampleTimer>,
    pub display: Box<dyn Display>,
    pub link: Box<dyn WirelessLink>,
    pub debug: Box<dyn DebugStream>,
    pub commands: Box<dyn CommandSource>,
}
