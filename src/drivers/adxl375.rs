// gSENSOR - ADXL375 Accelerometer Driver
//
// Register-level driver on the JST I2C pins. Fixed ±200 g range, 13-bit
// full resolution, little-endian axis registers.

use anyhow::bail;

use gsensor::board::Sensor;
use gsensor::config::*;
use gsensor::events::{Sample, SampleRate};

use super::{lock_bus, SharedBus, SENSOR_PINS};

// ADXL375 register addresses
const REG_DEVID: u8 = 0x00;
const REG_BW_RATE: u8 = 0x2C;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32; // Start of 6-byte axis burst

const POWER_CTL_MEASURE: u8 = 0x08;
const DATA_FORMAT_FULL_RES: u8 = 0x0B; // FULL_RES | range bits (fixed on the 375)

fn bw_rate_code(rate: SampleRate) -> u8 {
    match rate {
        SampleRate::Hz100 => 0x0A,
        SampleRate::Hz200 => 0x0B,
        SampleRate::Hz400 => 0x0C,
        SampleRate::Hz800 => 0x0D,
    }
}

pub struct Adxl375 {
    bus: SharedBus,
}

impl Adxl375 {
    /// Probe the device ID and start measuring. Fails if nothing answers at
    /// the ADXL375 address.
    pub fn init(bus: SharedBus, rate: SampleRate) -> anyhow::Result<Self> {
        let mut sensor = Self { bus };

        let id = sensor.read_register(REG_DEVID)?;
        if id != ADXL375_DEVICE_ID {
            bail!("unexpected ADXL375 device id 0x{:02X}", id);
        }

        sensor.write_register(REG_DATA_FORMAT, DATA_FORMAT_FULL_RES)?;
        sensor.write_register(REG_BW_RATE, bw_rate_code(rate))?;
        sensor.write_register(REG_POWER_CTL, POWER_CTL_MEASURE)?;

        log::info!(
            "ADXL375 initialised (0x{:02X}, SDA GPIO{} / SCL GPIO{}, {} Hz)",
            I2C_ADDR_ADXL375,
            PIN_ADXL_SDA,
            PIN_ADXL_SCL,
            rate.hz()
        );
        Ok(sensor)
    }

    fn read_register(&mut self, reg: u8) -> anyhow::Result<u8> {
        let mut bus = lock_bus(self.bus)?;
        let mut buf = [0u8; 1];
        bus.select(SENSOR_PINS)?.write_read(I2C_ADDR_ADXL375, &[reg], &mut buf, I2C_TIMEOUT_TICKS)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> anyhow::Result<()> {
        let mut bus = lock_bus(self.bus)?;
        bus.select(SENSOR_PINS)?.write(I2C_ADDR_ADXL375, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

impl Sensor for Adxl375 {
    /// Burst-read all three axes, scale to g and remove the mounting bias.
    fn read_sample(&mut self) -> anyhow::Result<Sample> {
        let mut raw = [0u8; 6];
        {
            let mut bus = lock_bus(self.bus)?;
            bus.select(SENSOR_PINS)?.write_read(I2C_ADDR_ADXL375, &[REG_DATAX0], &mut raw, I2C_TIMEOUT_TICKS)?;
        }

        let axis = |lo: usize| i16::from_le_bytes([raw[lo], raw[lo + 1]]) as f32 * ADXL375_SCALE_G_PER_LSB;
        Ok(Sample::new(
            axis(0) - OFFSET_X,
            axis(2) - OFFSET_Y,
            axis(4) - OFFSET_Z,
        ))
    }

    fn set_data_rate(&mut self, rate: SampleRate) -> anyhow::Result<()> {
        self.write_register(REG_BW_RATE, bw_rate_code(rate))
    }
}
