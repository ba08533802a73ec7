// gSENSOR - ESP32-C3 implementations of the `board` collaborators

pub mod adxl375;
pub mod button;
pub mod cst816;
pub mod gc9a01;
pub mod link;
pub mod timer;

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use esp_idf_hal::i2c::I2cDriver;
use esp_idf_sys::esp;

use gsensor::config::*;

/// SDA/SCL pair the I2C controller can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusPins {
    pub sda: i32,
    pub scl: i32,
}

/// JST connector carrying the ADXL375.
pub const SENSOR_PINS: BusPins = BusPins { sda: PIN_ADXL_SDA, scl: PIN_ADXL_SCL };
/// On-board lines to the CST816D.
pub const TOUCH_PINS: BusPins = BusPins { sda: PIN_TOUCH_SDA, scl: PIN_TOUCH_SCL };

const I2C_PORT: esp_idf_sys::i2c_port_t = 0;

/// The C3's single I2C controller, switched through the GPIO matrix between
/// the two physical buses.
pub struct I2cBus {
    driver: I2cDriver<'static>,
    routed: BusPins,
}

impl I2cBus {
    /// `driver` must have been created on `routed`.
    pub fn new(driver: I2cDriver<'static>, routed: BusPins) -> Self {
        Self { driver, routed }
    }

    /// Route the controller to `pins` (a no-op when already there) and hand
    /// out the driver for one transaction.
    pub fn select(&mut self, pins: BusPins) -> anyhow::Result<&mut I2cDriver<'static>> {
        if self.routed != pins {
            // Detach the old pair first so it stops mirroring the new bus.
            unsafe {
                esp!(esp_idf_sys::gpio_reset_pin(self.routed.sda))?;
                esp!(esp_idf_sys::gpio_reset_pin(self.routed.scl))?;
                esp!(esp_idf_sys::i2c_set_pin(
                    I2C_PORT,
                    pins.sda,
                    pins.scl,
                    true,
                    true,
                    esp_idf_sys::i2c_mode_t_I2C_MODE_MASTER,
                ))?;
            }
            self.routed = pins;
        }
        Ok(&mut self.driver)
    }
}

/// Thread-safe handle to the I2C controller.
pub type SharedBus = &'static Mutex<I2cBus>;

pub fn lock_bus(bus: SharedBus) -> anyhow::Result<MutexGuard<'static, I2cBus>> {
    bus.lock().map_err(|_| anyhow!("I2C bus poisoned"))
}
