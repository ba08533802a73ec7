// gSENSOR - Sample trigger timer
//
// Periodic esp_timer whose callback only raises the sample trigger; the read
// itself happens on the main loop.

use std::time::Duration;

use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use gsensor::board::SampleTimer;
use gsensor::events::SampleRate;
use gsensor::flags::IrqFlag;

pub struct TriggerTimer {
    timer: EspTimer<'static>,
}

impl TriggerTimer {
    pub fn start(service: &EspTaskTimerService, trigger: IrqFlag, rate: SampleRate) -> anyhow::Result<Self> {
        let timer = service.timer(move || trigger.raise())?;
        timer.every(Duration::from_micros(rate.interval_us()))?;
        log::info!("Sample timer running at {} Hz (s1-s4 to change)", rate.hz());
        Ok(Self { timer })
    }
}

impl SampleTimer for TriggerTimer {
    fn set_rate(&mut self, rate: SampleRate) -> anyhow::Result<()> {
        self.timer.cancel()?;
        self.timer.every(Duration::from_micros(rate.interval_us()))?;
        Ok(())
    }
}
