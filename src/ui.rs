// gSENSOR - UI State Machine
//
// Two screens. Gestures and button presses drive transitions; the settings
// screen hit-tests taps against named rectangles. Screen changes and peak
// reset requests are exposed as consume-once flags for the scheduler.

use crate::events::{Gesture, GestureKind};
use crate::flags::EdgeFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    MainGauge,
    Settings,
}

/// Runtime settings. Not persisted; every boot starts from the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub wireless_enabled: bool,
    pub debug_stream_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wireless_enabled: true,
            debug_stream_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    ToggleWireless,
    ToggleDebugStream,
    Back,
}

/// Inclusive rectangle on the 240x240 panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchRegion {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
    pub action: SettingsAction,
}

impl TouchRegion {
    pub fn contains(&self, x: i16, y: i16) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// Settings screen layout, checked in order.
pub const SETTINGS_REGIONS: [TouchRegion; 3] = [
    TouchRegion { x1: 30, y1: 60, x2: 210, y2: 100, action: SettingsAction::ToggleWireless },
    TouchRegion { x1: 30, y1: 110, x2: 210, y2: 150, action: SettingsAction::ToggleDebugStream },
    TouchRegion { x1: 70, y1: 195, x2: 170, y2: 230, action: SettingsAction::Back },
];

/// First region containing the point, if any.
pub fn hit_test(x: i16, y: i16) -> Option<SettingsAction> {
    SETTINGS_REGIONS
        .iter()
        .find(|r| r.contains(x, y))
        .map(|r| r.action)
}

/// What a dispatched input ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    None,
    OpenSettings,
    BackToGauge,
    PeakResetRequested,
    WirelessToggled(bool),
    DebugStreamToggled(bool),
}

#[derive(Debug, Clone)]
pub struct UiState {
    screen: Screen,
    screen_changed: EdgeFlag,
    peak_reset: EdgeFlag,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    /// Starts on the gauge with a pending change so the first refresh is a
    /// full redraw.
    pub fn new() -> Self {
        Self {
            screen: Screen::MainGauge,
            screen_changed: EdgeFlag::raised(),
            peak_reset: EdgeFlag::default(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.screen_changed.raise();
        }
    }

    /// True once after each transition.
    pub fn take_screen_changed(&mut self) -> bool {
        self.screen_changed.take()
    }

    /// True once after each long-press on the gauge.
    pub fn take_peak_reset(&mut self) -> bool {
        self.peak_reset.take()
    }

    pub fn handle_gesture(&mut self, gesture: &Gesture, settings: &mut Settings) -> UiAction {
        let action = match (self.screen, gesture.kind) {
            (_, GestureKind::None) => UiAction::None,
            (Screen::MainGauge, GestureKind::Tap) => {
                self.set_screen(Screen::Settings);
                UiAction::OpenSettings
            }
            (Screen::MainGauge, GestureKind::LongPress) => {
                self.peak_reset.raise();
                UiAction::PeakResetRequested
            }
            (Screen::Settings, GestureKind::Tap) => {
                // Empty space behaves like the back button.
                let hit = hit_test(gesture.x, gesture.y).unwrap_or(SettingsAction::Back);
                self.apply_settings_action(hit, settings)
            }
            (Screen::Settings, GestureKind::LongPress) => UiAction::None,
        };

        if action != UiAction::None {
            log::info!("[UI] {:?}", action);
        }
        action
    }

    /// The physical button toggles between the two screens, ignoring any
    /// touch layout.
    pub fn handle_button(&mut self) -> UiAction {
        let action = match self.screen {
            Screen::MainGauge => {
                self.set_screen(Screen::Settings);
                UiAction::OpenSettings
            }
            Screen::Settings => {
                self.set_screen(Screen::MainGauge);
                UiAction::BackToGauge
            }
        };
        log::info!("[Button] {:?}", action);
        action
    }

    fn apply_settings_action(&mut self, action: SettingsAction, settings: &mut Settings) -> UiAction {
        match action {
            SettingsAction::ToggleWireless => {
                settings.wireless_enabled = !settings.wireless_enabled;
                UiAction::WirelessToggled(settings.wireless_enabled)
            }
            SettingsAction::ToggleDebugStream => {
                settings.debug_stream_enabled = !settings.debug_stream_enabled;
                UiAction::DebugStreamToggled(settings.debug_stream_enabled)
            }
            SettingsAction::Back => {
                self.set_screen(Screen::MainGauge);
                UiAction::BackToGauge
            }
        }
    }
}
