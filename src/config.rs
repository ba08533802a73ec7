// gSENSOR - Hardware & System Configuration
// Target: ESP32-2424S012 (ESP32-C3, GC9A01 240x240 round LCD, CST816D touch)
// Sensor: ADXL375 high-g accelerometer on the JST connector

use embedded_graphics::pixelcolor::Rgb565;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 9;      // BOOT button (INPUT_PULLUP, active LOW)
pub const PIN_TFT_BL: i32 = 3;      // Display backlight
pub const PIN_TOUCH_INT: i32 = 0;   // CST816D interrupt (falling edge)
pub const PIN_TOUCH_RST: i32 = 1;   // CST816D reset
pub const PIN_TOUCH_SDA: i32 = 4;
pub const PIN_TOUCH_SCL: i32 = 5;
pub const PIN_ADXL_SDA: i32 = 21;   // JST connector
pub const PIN_ADXL_SCL: i32 = 20;   // JST connector
pub const PIN_TFT_SCLK: i32 = 6;
pub const PIN_TFT_MOSI: i32 = 7;
pub const PIN_TFT_DC: i32 = 2;
pub const PIN_TFT_CS: i32 = 10;

// ---------------------------------------------------------------------------
// I2C (one controller on the C3, routed between the JST and touch pins)
// ---------------------------------------------------------------------------
pub const I2C_ADDR_ADXL375: u8 = 0x53;
pub const I2C_ADDR_TOUCH: u8 = 0x15;
pub const I2C_BAUD_HZ: u32 = 400_000;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (GC9A01 round LCD)
// ---------------------------------------------------------------------------
pub const DISPLAY_WIDTH: u32 = 240;
pub const DISPLAY_HEIGHT: u32 = 240;
pub const DISPLAY_SPI_HZ: u32 = 80_000_000;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SERIAL_WRITER: usize = 4096;
pub const STACK_SERIAL_READER: usize = 4096;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const DISPLAY_UPDATE_INTERVAL_MS: u32 = 50;     // 20 Hz refresh
pub const PEAK_NOTIFY_INTERVAL_MS: u32 = 500;       // supplementary peak notify
pub const BUTTON_DEBOUNCE_MS: u32 = 200;
pub const TOUCH_POLL_INTERVAL_MS: u32 = 100;        // fallback when no IRQ fires
pub const TOUCH_MIN_DURATION_MS: u32 = 50;          // shorter = contact bounce
pub const TOUCH_TAP_THRESHOLD_MS: u32 = 300;
pub const TOUCH_LONG_PRESS_MS: u32 = 500;
pub const SPLASH_DISPLAY_MS: u64 = 1500;
pub const LOOP_IDLE_MS: u64 = 1;
pub const TOUCH_RESET_LOW_MS: u64 = 10;
pub const TOUCH_RESET_SETTLE_MS: u64 = 300;       // CST816D boot time after reset

// ---------------------------------------------------------------------------
// Signal Processing
// ---------------------------------------------------------------------------
// At 100 Hz, 10 samples = 100 ms averaging window.
pub const MOVING_AVG_WINDOW: usize = 10;

// ---------------------------------------------------------------------------
// ADXL375 Sensor
// ---------------------------------------------------------------------------
pub const ADXL375_SCALE_G_PER_LSB: f32 = 0.049; // 49 mg/LSB, fixed ±200 g
pub const ADXL375_DEVICE_ID: u8 = 0xE5;

// Calibration offsets (sensor flat, screen up), subtracted from readings.
pub const OFFSET_X: f32 = 0.35;
pub const OFFSET_Y: f32 = -0.60;
pub const OFFSET_Z: f32 = 0.70;

// ---------------------------------------------------------------------------
// Wireless notifications
// ---------------------------------------------------------------------------
pub const NOTIFY_RATE_DEFAULT_HZ: u8 = 20;
pub const NOTIFY_RATE_MIN_HZ: u8 = 5;
pub const NOTIFY_RATE_MAX_HZ: u8 = 50;

// ---------------------------------------------------------------------------
// Debug stream
// ---------------------------------------------------------------------------
pub const SERIAL_QUEUE_DEPTH: usize = 32;
pub const SERIAL_CHUNK_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// Gauge UI
// ---------------------------------------------------------------------------
pub const GAUGE_START_ANGLE: f32 = 135.0;   // bottom-left
pub const GAUGE_SWEEP_ANGLE: f32 = 270.0;
pub const GAUGE_DIAMETER: u32 = 210;
pub const GAUGE_STROKE: u32 = 18;
pub const GAUGE_SEGMENTS: u32 = 20;
pub const GAUGE_SEGMENT_GAP: f32 = 3.0;     // degrees between segments
pub const GAUGE_DEFAULT_MAX_G: f32 = 10.0;
pub const GAUGE_RANGES_G: [f32; 5] = [10.0, 20.0, 50.0, 100.0, 200.0];

pub const G_THRESHOLD_LOW: f32 = 10.0;
pub const G_THRESHOLD_MED: f32 = 50.0;
pub const G_THRESHOLD_HIGH: f32 = 100.0;

pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(0, 0, 0);
pub const COLOR_PANEL: Rgb565 = Rgb565::new(3, 6, 4);
pub const COLOR_TEXT: Rgb565 = Rgb565::new(31, 63, 31);
pub const COLOR_MUTED: Rgb565 = Rgb565::new(12, 24, 12);
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(0, 40, 31);
pub const COLOR_LOW_G: Rgb565 = Rgb565::new(0, 63, 0);       // green  (< 10 g)
pub const COLOR_MED_G: Rgb565 = Rgb565::new(31, 63, 0);      // yellow (10-50 g)
pub const COLOR_HIGH_G: Rgb565 = Rgb565::new(31, 41, 0);     // orange (50-100 g)
pub const COLOR_EXTREME_G: Rgb565 = Rgb565::new(31, 0, 0);   // red    (> 100 g)
