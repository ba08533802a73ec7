// gSENSOR - Output Scheduler
//
// Single cooperative loop. Each `run_once` walks a fixed priority ladder:
//
//   1. sample ingestion (timer-triggered, highest priority)
//   2. button + touch input, dispatched to the UI state machine
//   3. wireless enable/disable when the setting changed
//   4. peak reset requested by the UI
//   5. display refresh (fixed interval)
//   6. wireless notifications (configurable interval + coarse peak interval)
//   7. out-of-band commands
//
// Nothing here waits on I/O: output collaborators are non-blocking or queue
// internally, so a stalled link never delays the next sample trigger.

use crate::board::{
    CommandSource, DebugStream, Devices, Display, Frame, GaugeReadout, SampleTimer, Sensor,
    SettingsReadout, WirelessLink,
};
use crate::config::*;
use crate::events::{Command, NotifyRate, SampleRate};
use crate::filter::SignalProcessor;
use crate::flags::IrqFlag;
use crate::gesture::GestureRecognizer;
use crate::input::InputManager;
use crate::telemetry;
use crate::ui::{Screen, Settings, UiAction, UiState};

/// Counters surfaced by the `?` status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub samples: u32,
    pub read_failures: u32,
    pub frames: u32,
    pub updates_sent: u32,
    pub peaks_sent: u32,
}

/// Interval gate over the wrapping millisecond clock.
#[derive(Debug, Clone, Copy)]
struct Interval {
    last_ms: u32,
}

impl Interval {
    fn starting_at(now_ms: u32) -> Self {
        Self { last_ms: now_ms }
    }

    fn due(&mut self, now_ms: u32, period_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) < period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}

pub struct Scheduler {
    // Collaborators
    sensor: Option<Box<dyn Sensor>>,
    timer: Box<dyn SampleTimer>,
    display: Box<dyn Display>,
    link: Box<dyn WirelessLink>,
    debug: Box<dyn DebugStream>,
    commands: Box<dyn CommandSource>,

    // Core state
    sample_trigger: IrqFlag,
    processor: SignalProcessor,
    input: InputManager,
    gestures: GestureRecognizer,
    ui: UiState,
    settings: Settings,
    sample_rate: SampleRate,
    notify_rate: NotifyRate,
    applied_wireless: Option<bool>,

    // Rate gates
    display_gate: Interval,
    notify_gate: Interval,
    peak_gate: Interval,

    stats: LoopStats,
}

impl Scheduler {
    /// `sample_trigger` is raised by the sampling timer, `touch_irq` by the
    /// touch controller's interrupt line (if wired).
    pub fn new(devices: Devices, sample_trigger: IrqFlag, touch_irq: IrqFlag, now_ms: u32) -> Self {
        let Devices {
            sensor,
            touch,
            button,
            timer,
            display,
            link,
            debug,
            commands,
        } = devices;

        if sensor.is_none() {
            log::error!("Accelerometer missing - gauge will show zeros");
        }

        Self {
            sensor,
            timer,
            display,
            link,
            debug,
            commands,
            sample_trigger,
            processor: SignalProcessor::new(),
            input: InputManager::new(button),
            gestures: GestureRecognizer::new(touch, touch_irq),
            ui: UiState::new(),
            settings: Settings::default(),
            sample_rate: SampleRate::default(),
            notify_rate: NotifyRate::default(),
            applied_wireless: None,
            display_gate: Interval::starting_at(now_ms),
            notify_gate: Interval::starting_at(now_ms),
            peak_gate: Interval::starting_at(now_ms),
            stats: LoopStats::default(),
        }
    }

    pub fn sensor_ok(&self) -> bool {
        self.sensor.is_some()
    }

    pub fn processor(&self) -> &SignalProcessor {
        &self.processor
    }

    pub fn screen(&self) -> Screen {
        self.ui.screen()
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn notify_rate(&self) -> NotifyRate {
        self.notify_rate
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// One pass over the ladder.
    pub fn run_once(&mut self, now_ms: u32) {
        self.ingest_sample(now_ms);
        self.handle_input(now_ms);
        self.sync_wireless();
        self.apply_peak_reset();
        self.refresh_display(now_ms);
        self.notify_wireless(now_ms);
        self.drain_commands();
    }

    // ---- 1. Sample ingestion ------------------------------------------------

    fn ingest_sample(&mut self, now_ms: u32) {
        if !self.sample_trigger.take() {
            return;
        }
        let Some(sensor) = self.sensor.as_mut() else {
            return;
        };

        let raw = match sensor.read_sample() {
            Ok(raw) => raw,
            Err(e) => {
                // Transient: the next trigger simply tries again.
                self.stats.read_failures = self.stats.read_failures.wrapping_add(1);
                log::debug!("sensor read failed: {:#}", e);
                return;
            }
        };

        let filtered = self.processor.process(raw);
        self.stats.samples = self.stats.samples.wrapping_add(1);

        if self.settings.debug_stream_enabled {
            let line = telemetry::csv_line(
                now_ms,
                filtered,
                self.processor.filtered_magnitude(),
                self.processor.peak_magnitude(),
            );
            self.debug.write_line(&line);
        }
    }

    // ---- 2. Input -----------------------------------------------------------

    fn handle_input(&mut self, now_ms: u32) {
        if self.input.update(now_ms) {
            self.ui.handle_button();
        }

        self.gestures.update(now_ms);
        if let Some(gesture) = self.gestures.take_event() {
            let action = self.ui.handle_gesture(&gesture, &mut self.settings);
            if let UiAction::DebugStreamToggled(on) = action {
                log::info!("Debug stream {}", if on { "enabled" } else { "disabled" });
            }
        }
    }

    // ---- 3. Wireless enable ---------------------------------------------------

    fn sync_wireless(&mut self) {
        let wanted = self.settings.wireless_enabled;
        if self.applied_wireless == Some(wanted) {
            return;
        }
        log::info!("Wireless {}", if wanted { "enabled" } else { "disabled" });
        self.link.set_enabled(wanted);
        self.applied_wireless = Some(wanted);
    }

    // ---- 4. Peak reset ----------------------------------------------------------

    fn apply_peak_reset(&mut self) {
        if self.ui.take_peak_reset() {
            self.reset_peak("touch");
        }
    }

    fn reset_peak(&mut self, source: &str) {
        self.processor.reset_peak();
        self.display.reset_scale();
        log::info!("Peak reset ({})", source);
        self.debug_line("Peak reset");
    }

    // ---- 5. Display ---------------------------------------------------------------

    fn refresh_display(&mut self, now_ms: u32) {
        if !self.display_gate.due(now_ms, DISPLAY_UPDATE_INTERVAL_MS) {
            return;
        }

        if self.ui.take_screen_changed() {
            if let Err(e) = self.display.prepare_full_redraw() {
                log::warn!("display clear failed: {:#}", e);
            }
        }

        let frame = match self.ui.screen() {
            Screen::MainGauge => Frame::Gauge(self.gauge_readout()),
            Screen::Settings => Frame::Settings(SettingsReadout {
                settings: self.settings,
                peer_connected: self.link.is_peer_connected(),
            }),
        };

        match self.display.render(&frame) {
            Ok(()) => self.stats.frames = self.stats.frames.wrapping_add(1),
            Err(e) => log::warn!("display render failed: {:#}", e),
        }
    }

    fn gauge_readout(&self) -> GaugeReadout {
        if !self.sensor_ok() {
            return GaugeReadout {
                filtered: Default::default(),
                magnitude: 0.0,
                peak: 0.0,
                sensor_ok: false,
            };
        }
        GaugeReadout {
            filtered: self.processor.last_filtered(),
            magnitude: self.processor.filtered_magnitude(),
            peak: self.processor.peak_magnitude(),
            sensor_ok: true,
        }
    }

    // ---- 6. Wireless notifications ----------------------------------------------

    fn notify_wireless(&mut self, now_ms: u32) {
        if !(self.settings.wireless_enabled && self.link.is_peer_connected() && self.sensor_ok()) {
            return;
        }

        if self.notify_gate.due(now_ms, self.notify_rate.interval_ms()) {
            let payload = telemetry::pack_update(
                now_ms,
                self.processor.last_filtered(),
                self.processor.filtered_magnitude(),
            );
            self.link.send_update(&payload);
            self.stats.updates_sent = self.stats.updates_sent.wrapping_add(1);
        }

        if self.peak_gate.due(now_ms, PEAK_NOTIFY_INTERVAL_MS) {
            let payload = telemetry::pack_peak(now_ms, self.processor.peak_magnitude());
            self.link.send_peak(&payload);
            self.stats.peaks_sent = self.stats.peaks_sent.wrapping_add(1);
        }
    }

    // ---- 7. Commands ------------------------------------------------------------------

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.poll_command() {
            self.apply_command(command);
        }
    }

    /// Apply one out-of-band command. Every command is idempotent.
    pub fn apply_command(&mut self, command: Command) {
        log::debug!("command {:?}", command);
        match command {
            Command::ResetPeak => self.reset_peak("command"),
            Command::ResetFilters => {
                self.processor.reset();
                log::info!("Filters reset");
                self.debug_line("Filters reset");
            }
            Command::SetSampleRate(rate) => self.set_sample_rate(rate),
            Command::SetNotifyRate(hz) => {
                let applied = self.link.set_rate_hz(hz);
                self.notify_rate = NotifyRate::new(applied);
                log::info!("Notification rate {} Hz (requested {})", self.notify_rate.hz(), hz);
                self.reply(&format!("Notify rate: {} Hz", self.notify_rate.hz()));
            }
            Command::Status => {
                let status = self.status_line();
                log::info!("{}", status);
                self.reply(&status);
            }
        }
    }

    fn set_sample_rate(&mut self, rate: SampleRate) {
        if let Some(sensor) = self.sensor.as_mut() {
            if let Err(e) = sensor.set_data_rate(rate) {
                log::warn!("sensor rejected {} Hz: {:#}", rate.hz(), e);
                return;
            }
        }
        if let Err(e) = self.timer.set_rate(rate) {
            log::warn!("sample timer rejected {} Hz: {:#}", rate.hz(), e);
            return;
        }
        self.sample_rate = rate;
        log::info!("Sample rate: {} Hz", rate.hz());
        self.reply(&format!("Sample rate: {} Hz", rate.hz()));
    }

    fn status_line(&self) -> String {
        let stats = &self.stats;
        format!(
            "Rate: {} Hz | Notify: {} Hz | Samples: {} | Read errors: {} | Frames: {} | Updates: {} | Peaks: {} | Dropped lines: {} | Commands: r=reset peak, c=calibrate, s1-s4=rate, n<Hz>=notify rate, ?=status",
            self.sample_rate.hz(),
            self.notify_rate.hz(),
            stats.samples,
            stats.read_failures,
            stats.frames,
            stats.updates_sent,
            stats.peaks_sent,
            self.debug.dropped_lines(),
        )
    }

    /// Gated by the debug-stream setting.
    fn debug_line(&mut self, line: &str) {
        if self.settings.debug_stream_enabled {
            self.reply(line);
        }
    }

    /// Direct answers to a console query, written whatever the setting.
    fn reply(&mut self, line: &str) {
        self.debug.write_line(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_fires_on_period_and_rearms() {
        let mut gate = Interval::starting_at(1_000);
        assert!(!gate.due(1_049, 50));
        assert!(gate.due(1_050, 50));
        assert!(!gate.due(1_060, 50));
        assert!(gate.due(1_100, 50));
    }

    #[test]
    fn interval_survives_clock_wrap() {
        let mut gate = Interval::starting_at(u32::MAX - 10);
        assert!(!gate.due(20, 50));
        assert!(gate.due(39, 50));
    }
}
