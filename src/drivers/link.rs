// gSENSOR - Wireless link placeholder
//
// No radio stack is brought up in this firmware, so the link never reports a
// peer and notifications are never produced. It still records the enable
// state and clamps rate requests so the settings screen and the config
// command behave the same as with a live transport.

use gsensor::board::WirelessLink;
use gsensor::events::NotifyRate;

#[derive(Debug, Default)]
pub struct OfflineLink {
    enabled: bool,
    rate: NotifyRate,
}

impl WirelessLink for OfflineLink {
    fn is_peer_connected(&self) -> bool {
        false
    }

    fn send_update(&mut self, _payload: &[u8]) {}

    fn send_peak(&mut self, _payload: &[u8]) {}

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        log::info!("Wireless link {} (no radio)", if enabled { "enabled" } else { "disabled" });
    }

    fn set_rate_hz(&mut self, hz: u8) -> u8 {
        self.rate = NotifyRate::new(hz);
        self.rate.hz()
    }
}
