// gSENSOR - CST816D Touch Controller Driver
//
// Reached through the same I2C controller as the accelerometer, routed to
// the on-board touch pins. The INT line pulses low on
// touch activity; the edge only raises a flag; the register read happens on
// the main loop.

use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, InterruptType, Output, PinDriver};

use gsensor::board::TouchPanel;
use gsensor::config::*;
use gsensor::events::Contact;
use gsensor::flags::IrqFlag;

use super::{lock_bus, SharedBus, TOUCH_PINS};

const REG_FINGER_NUM: u8 = 0x02; // followed by XH, XL, YH, YL
const REG_DIS_AUTO_SLEEP: u8 = 0xFE;

pub struct Cst816 {
    bus: SharedBus,
    int: PinDriver<'static, AnyIOPin, Input>,
    // Held high for as long as the controller should stay out of reset.
    _rst: PinDriver<'static, AnyOutputPin, Output>,
}

impl Cst816 {
    /// Reset the controller, confirm it answers, disable its auto-sleep and
    /// route the INT falling edge to `irq`.
    pub fn init(
        bus: SharedBus,
        mut rst: PinDriver<'static, AnyOutputPin, Output>,
        mut int: PinDriver<'static, AnyIOPin, Input>,
        irq: IrqFlag,
    ) -> anyhow::Result<Self> {
        rst.set_low()?;
        thread::sleep(Duration::from_millis(TOUCH_RESET_LOW_MS));
        rst.set_high()?;
        thread::sleep(Duration::from_millis(TOUCH_RESET_SETTLE_MS));

        {
            let mut guard = lock_bus(bus)?;
            let i2c = guard.select(TOUCH_PINS)?;
            let mut probe = [0u8; 1];
            i2c.write_read(I2C_ADDR_TOUCH, &[REG_FINGER_NUM], &mut probe, I2C_TIMEOUT_TICKS)
                .map_err(|e| anyhow!("CST816D not found at 0x{:02X}: {}", I2C_ADDR_TOUCH, e))?;
            // Without this the controller naps and misses short taps.
            i2c.write(I2C_ADDR_TOUCH, &[REG_DIS_AUTO_SLEEP, 0xFF], I2C_TIMEOUT_TICKS)?;
        }

        int.set_interrupt_type(InterruptType::NegEdge)?;
        // SAFETY: the callback only stores to an atomic, which is ISR-safe.
        unsafe {
            int.subscribe(move || irq.raise())?;
        }
        int.enable_interrupt()?;

        log::info!("CST816D initialised (0x{:02X}, INT GPIO{})", I2C_ADDR_TOUCH, PIN_TOUCH_INT);
        Ok(Self { bus, int, _rst: rst })
    }
}

impl TouchPanel for Cst816 {
    fn poll_contact(&mut self) -> Option<Contact> {
        // The driver disarms the interrupt after each edge.
        if let Err(e) = self.int.enable_interrupt() {
            log::debug!("touch INT re-arm failed: {}", e);
        }

        let mut raw = [0u8; 5];
        let read = lock_bus(self.bus).and_then(|mut bus| {
            bus.select(TOUCH_PINS)?
                .write_read(I2C_ADDR_TOUCH, &[REG_FINGER_NUM], &mut raw, I2C_TIMEOUT_TICKS)?;
            Ok(())
        });
        if let Err(e) = read {
            log::debug!("touch read failed: {:#}", e);
            return None;
        }

        // Upper nibble of the high bytes carries event bits.
        let x = (((raw[1] & 0x0F) as i16) << 8) | raw[2] as i16;
        let y = (((raw[3] & 0x0F) as i16) << 8) | raw[4] as i16;
        Some(Contact {
            x,
            y,
            active: raw[0] > 0,
        })
    }
}
