// gSENSOR - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the round LCD and show the splash for 1.5 s.
//   2. Probe the ADXL375. On failure show "ADXL375 NOT FOUND" and continue
//      degraded (the gauge reads zero, nothing is streamed).
//   3. Probe the CST816D touch controller. On failure navigation falls back
//      to the BOOT button.
//   4. Start the sample trigger timer and the serial console threads.
//   5. Hand every collaborator to the scheduler and run its loop forever.
//
// A display that fails to initialise or draw its boot screens halts boot:
// there is nothing useful the device can do without it.

#[cfg(target_os = "espidf")]
mod drivers;

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{AnyOutputPin, IOPin, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::spi::config::{Config as SpiConfig, DriverConfig};
    use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SPI2};
    use esp_idf_svc::timer::EspTaskTimerService;

    use gsensor::board::{Devices, Sensor, TouchPanel};
    use gsensor::config::*;
    use gsensor::console;
    use gsensor::events::SampleRate;
    use gsensor::flags::IrqFlag;
    use gsensor::scheduler::Scheduler;

    use crate::drivers::adxl375::Adxl375;
    use crate::drivers::button::GpioButton;
    use crate::drivers::cst816::Cst816;
    use crate::drivers::gc9a01::{Gc9a01, PanelDisplay};
    use crate::drivers::link::OfflineLink;
    use crate::drivers::timer::TriggerTimer;
    use crate::drivers::{I2cBus, SharedBus, SENSOR_PINS};

    // -----------------------------------------------------------------------
    // Utility: milliseconds since boot (wraps at ~49 days, callers use
    // wrapping arithmetic)
    // -----------------------------------------------------------------------
    pub fn now_ms() -> u32 {
        unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
    }

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("gSENSOR - High-G Accelerometer starting");

        // ---- Peripherals ----------------------------------------------------
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // ---- Display ----------------------------------------------------------
        let mut display = match bring_up_display(
            peripherals.spi2,
            pins.gpio6.downgrade_output(),
            pins.gpio7.downgrade_output(),
            pins.gpio10.downgrade_output(),
            pins.gpio2.downgrade_output(),
            pins.gpio3.downgrade_output(),
        ) {
            Ok(display) => display,
            Err(e) => halt("Display initialization failed", e),
        };

        if let Err(e) = display.show_splash() {
            halt("Splash screen failed", e);
        }
        thread::sleep(Duration::from_millis(SPLASH_DISPLAY_MS));

        // ---- I2C (starts on the JST pins, touch is reached by re-routing) -----
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUD_HZ.Hz());
        let i2c = I2cDriver::new(peripherals.i2c0, pins.gpio21, pins.gpio20, &i2c_config)?;
        // Lives for the whole programme; firmware never exits.
        let i2c_bus: SharedBus = Box::leak(Box::new(Mutex::new(I2cBus::new(i2c, SENSOR_PINS))));
        log::info!(
            "I2C: ADXL375 on SDA GPIO{} / SCL GPIO{}, touch on SDA GPIO{} / SCL GPIO{}",
            PIN_ADXL_SDA,
            PIN_ADXL_SCL,
            PIN_TOUCH_SDA,
            PIN_TOUCH_SCL
        );

        // ---- Accelerometer ----------------------------------------------------
        let sensor: Option<Box<dyn Sensor>> = match Adxl375::init(i2c_bus, SampleRate::default()) {
            Ok(adxl) => Some(Box::new(adxl)),
            Err(e) => {
                log::error!("Accelerometer initialization failed: {:#}", e);
                if let Err(e) = display.show_error("ADXL375 NOT FOUND") {
                    halt("Error screen failed", e);
                }
                thread::sleep(Duration::from_millis(SPLASH_DISPLAY_MS));
                None
            }
        };

        // ---- Touch ------------------------------------------------------------
        let touch_irq = IrqFlag::new();
        let touch: Option<Box<dyn TouchPanel>> = match Cst816::init(
            i2c_bus,
            PinDriver::output(pins.gpio1.downgrade_output())?,
            PinDriver::input(pins.gpio0.downgrade())?,
            touch_irq.clone(),
        ) {
            Ok(panel) => Some(Box::new(panel)),
            Err(e) => {
                log::warn!("Touch controller not found: {:#}", e);
                None
            }
        };

        // ---- Button -----------------------------------------------------------
        let button = GpioButton::new(PinDriver::input(pins.gpio9.downgrade())?)?;
        log::info!("Button on GPIO{}", PIN_BUTTON);

        // ---- Sample trigger ---------------------------------------------------
        let sample_trigger = IrqFlag::new();
        let timer_service = EspTaskTimerService::new()?;
        let timer = TriggerTimer::start(&timer_service, sample_trigger.clone(), SampleRate::default())?;

        // ---- Serial console ---------------------------------------------------
        let (debug, _writer) = console::spawn_writer(std::io::stdout())?;
        let (commands, _reader) = console::spawn_reader(std::io::stdin())?;

        // ---- Main loop --------------------------------------------------------
        let devices = Devices {
            sensor,
            touch,
            button: Box::new(button),
            timer: Box::new(timer),
            display: Box::new(display),
            link: Box::new(OfflineLink::default()),
            debug: Box::new(debug),
            commands: Box::new(commands),
        };
        let mut scheduler = Scheduler::new(devices, sample_trigger, touch_irq, now_ms());
        log::info!("Setup complete - entering main loop");

        loop {
            scheduler.run_once(now_ms());
            thread::sleep(Duration::from_millis(LOOP_IDLE_MS));
        }
    }

    /// Log and park forever: the device is useless without its display.
    fn halt(what: &str, e: anyhow::Error) -> ! {
        log::error!("{}: {:#}", what, e);
        loop {
            thread::sleep(Duration::from_millis(500));
        }
    }

    fn bring_up_display(
        spi: SPI2,
        sclk: AnyOutputPin,
        mosi: AnyOutputPin,
        cs: AnyOutputPin,
        dc: AnyOutputPin,
        backlight: AnyOutputPin,
    ) -> anyhow::Result<PanelDisplay> {
        let driver = SpiDriver::new(spi, sclk, mosi, Option::<esp_idf_hal::gpio::AnyIOPin>::None, &DriverConfig::new())?;
        let device = SpiDeviceDriver::new(driver, Some(cs), &SpiConfig::new().baudrate(DISPLAY_SPI_HZ.Hz()))?;
        let lcd = Gc9a01::init(device, PinDriver::output(dc)?)?;
        log::info!(
            "Display on SPI2 (SCLK GPIO{}, MOSI GPIO{}, CS GPIO{}, DC GPIO{}, BL GPIO{})",
            PIN_TFT_SCLK,
            PIN_TFT_MOSI,
            PIN_TFT_CS,
            PIN_TFT_DC,
            PIN_TFT_BL
        );
        PanelDisplay::new(lcd, PinDriver::output(backlight)?)
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("the gsensor firmware only runs on the ESP32-C3; use `cargo test` for the host-side core")
}
