// gSENSOR - Touch Gesture Recognizer
//
// Turns the raw contact timeline from the touch controller into Tap /
// LongPress gestures. Polled once per loop iteration; reads the panel when
// the touch interrupt fired, while a finger is down (to see the release), or
// every TOUCH_POLL_INTERVAL_MS because some CST816 parts never raise the IRQ.

use crate::board::TouchPanel;
use crate::config::*;
use crate::events::{Contact, Gesture, GestureKind};
use crate::flags::{EventSlot, IrqFlag};

/// Classify a completed touch by how long the finger stayed down.
///
/// Touches between the tap and long-press thresholds fall in a dead zone and
/// produce no gesture.
pub fn classify(duration_ms: u32) -> GestureKind {
    if duration_ms >= TOUCH_LONG_PRESS_MS {
        GestureKind::LongPress
    } else if (TOUCH_MIN_DURATION_MS..TOUCH_TAP_THRESHOLD_MS).contains(&duration_ms) {
        GestureKind::Tap
    } else {
        GestureKind::None
    }
}

/// Idle / Touching state over successive contact readings.
#[derive(Debug, Clone, Copy, Default)]
struct ContactTracker {
    touching: bool,
    x: i16,
    y: i16,
    start_ms: u32,
}

impl ContactTracker {
    /// Apply one reading. Returns the touch duration when this reading ended
    /// an active touch.
    fn apply(&mut self, contact: Contact, now_ms: u32) -> Option<u32> {
        match (contact.active, self.touching) {
            (true, false) => {
                self.touching = true;
                self.x = contact.x;
                self.y = contact.y;
                self.start_ms = now_ms;
                log::debug!("touch start at ({}, {})", contact.x, contact.y);
                None
            }
            (true, true) => {
                self.x = contact.x;
                self.y = contact.y;
                None
            }
            (false, true) => {
                self.touching = false;
                Some(now_ms.wrapping_sub(self.start_ms))
            }
            (false, false) => None,
        }
    }
}

pub struct GestureRecognizer {
    panel: Option<Box<dyn TouchPanel>>,
    irq: IrqFlag,
    tracker: ContactTracker,
    last_poll_ms: u32,
    pending: EventSlot<Gesture>,
}

impl GestureRecognizer {
    /// `panel` is `None` when the controller was not detected at startup; the
    /// recognizer then stays inert and navigation relies on the button.
    pub fn new(panel: Option<Box<dyn TouchPanel>>, irq: IrqFlag) -> Self {
        if panel.is_none() {
            log::warn!("Touch controller not found - touch input disabled");
        }
        Self {
            panel,
            irq,
            tracker: ContactTracker::default(),
            last_poll_ms: 0,
            pending: EventSlot::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.panel.is_some()
    }

    pub fn is_touching(&self) -> bool {
        self.tracker.touching
    }

    /// Call every loop iteration.
    pub fn update(&mut self, now_ms: u32) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };

        let interrupted = self.irq.take();
        let poll_due = now_ms.wrapping_sub(self.last_poll_ms) >= TOUCH_POLL_INTERVAL_MS;
        if !(interrupted || self.tracker.touching || poll_due) {
            return;
        }
        self.last_poll_ms = now_ms;

        let Some(contact) = panel.poll_contact() else {
            return;
        };

        if let Some(duration) = self.tracker.apply(contact, now_ms) {
            self.finish_touch(duration, now_ms);
        }
    }

    /// Read-and-clear the pending gesture.
    pub fn take_event(&mut self) -> Option<Gesture> {
        self.pending.take()
    }

    fn finish_touch(&mut self, duration_ms: u32, now_ms: u32) {
        let kind = classify(duration_ms);
        if kind == GestureKind::None {
            log::debug!("touch ignored, duration={} ms", duration_ms);
            return;
        }

        let gesture = Gesture {
            kind,
            x: self.tracker.x,
            y: self.tracker.y,
            timestamp_ms: now_ms,
        };
        log::debug!("{:?} at ({}, {}), duration={} ms", kind, gesture.x, gesture.y, duration_ms);
        if !self.pending.offer(gesture) {
            log::debug!("gesture dropped, previous one not consumed yet");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ScriptedPanel {
        readings: Rc<RefCell<VecDeque<Option<Contact>>>>,
        polls: Rc<RefCell<u32>>,
    }

    impl ScriptedPanel {
        fn push(&self, reading: Option<Contact>) {
            self.readings.borrow_mut().push_back(reading);
        }
    }

    impl TouchPanel for ScriptedPanel {
        fn poll_contact(&mut self) -> Option<Contact> {
            *self.polls.borrow_mut() += 1;
            self.readings.borrow_mut().pop_front().unwrap_or(Some(Contact {
                x: 0,
                y: 0,
                active: false,
            }))
        }
    }

    fn down(x: i16, y: i16) -> Option<Contact> {
        Some(Contact { x, y, active: true })
    }

    fn up() -> Option<Contact> {
        Some(Contact { x: 0, y: 0, active: false })
    }

    fn touch_for(duration_ms: u32) -> Option<Gesture> {
        let panel = ScriptedPanel::default();
        let irq = IrqFlag::new();
        let mut rec = GestureRecognizer::new(Some(Box::new(panel.clone())), irq.clone());
        panel.push(down(120, 80));
        panel.push(up());
        irq.raise();
        rec.update(1_000);
        rec.update(1_000 + duration_ms);
        rec.take_event()
    }

    #[test]
    fn classification_by_duration() {
        assert_eq!(classify(10), GestureKind::None);
        assert_eq!(classify(150), GestureKind::Tap);
        assert_eq!(classify(400), GestureKind::None);
        assert_eq!(classify(600), GestureKind::LongPress);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(49), GestureKind::None);
        assert_eq!(classify(50), GestureKind::Tap);
        assert_eq!(classify(299), GestureKind::Tap);
        assert_eq!(classify(300), GestureKind::None);
        assert_eq!(classify(499), GestureKind::None);
        assert_eq!(classify(500), GestureKind::LongPress);
    }

    #[test]
    fn tap_reports_last_coordinates() {
        let panel = ScriptedPanel::default();
        let irq = IrqFlag::new();
        let mut rec = GestureRecognizer::new(Some(Box::new(panel.clone())), irq.clone());
        panel.push(down(10, 10));
        panel.push(down(14, 12));
        panel.push(up());

        irq.raise();
        rec.update(0);
        assert!(rec.is_touching());
        rec.update(40);
        rec.update(120);

        let gesture = rec.take_event().expect("tap");
        assert_eq!(gesture.kind, GestureKind::Tap);
        assert_eq!((gesture.x, gesture.y), (14, 12));
        assert_eq!(gesture.timestamp_ms, 120);
        assert!(rec.take_event().is_none());
    }

    #[test]
    fn long_press_and_noise() {
        assert_eq!(touch_for(600).map(|g| g.kind), Some(GestureKind::LongPress));
        assert_eq!(touch_for(10), None);
        assert_eq!(touch_for(400), None);
    }

    #[test]
    fn polls_periodically_without_interrupt() {
        let panel = ScriptedPanel::default();
        let mut rec = GestureRecognizer::new(Some(Box::new(panel.clone())), IrqFlag::new());

        rec.update(50);
        assert_eq!(*panel.polls.borrow(), 0);
        rec.update(100);
        assert_eq!(*panel.polls.borrow(), 1);
        rec.update(150);
        assert_eq!(*panel.polls.borrow(), 1);
        rec.update(200);
        assert_eq!(*panel.polls.borrow(), 2);
    }

    #[test]
    fn failed_read_is_retried() {
        let panel = ScriptedPanel::default();
        let irq = IrqFlag::new();
        let mut rec = GestureRecognizer::new(Some(Box::new(panel.clone())), irq.clone());
        panel.push(down(5, 5));
        panel.push(None);
        panel.push(up());

        irq.raise();
        rec.update(0);
        rec.update(60);
        assert!(rec.is_touching());
        rec.update(100);
        assert_eq!(rec.take_event().map(|g| g.kind), Some(GestureKind::Tap));
    }

    #[test]
    fn pending_gesture_is_not_overwritten() {
        let panel = ScriptedPanel::default();
        let irq = IrqFlag::new();
        let mut rec = GestureRecognizer::new(Some(Box::new(panel.clone())), irq.clone());
        for (x, at) in [(1, 0u32), (2, 1_000)] {
            panel.push(down(x, x));
            panel.push(up());
            irq.raise();
            rec.update(at);
            rec.update(at + 100);
        }
        assert_eq!(rec.take_event().map(|g| g.x), Some(1));
        assert!(rec.take_event().is_none());
    }

    #[test]
    fn missing_panel_is_a_no_op() {
        let irq = IrqFlag::new();
        let mut rec = GestureRecognizer::new(None, irq.clone());
        irq.raise();
        rec.update(1_000);
        assert!(!rec.is_initialized());
        assert!(rec.take_event().is_none());
    }
}
