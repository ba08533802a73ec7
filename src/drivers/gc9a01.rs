// gSENSOR - GC9A01 Round LCD Driver
//
// 240x240 RGB565 panel on SPI2. Rendering happens into an in-RAM
// `FrameBuffer`; `PanelDisplay` pushes only the rows that changed since the
// previous flush, so a gauge update costs a band of the screen rather than
// the whole 115 KB frame.

use std::thread;
use std::time::Duration;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};

use gsensor::board::{Display, Frame};
use gsensor::config::*;
use gsensor::render::{FrameBuffer, GaugeView};

const CMD_SLPOUT: u8 = 0x11;
const CMD_INVON: u8 = 0x21;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_RASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_TEON: u8 = 0x35;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;

/// Vendor power-up sequence. The undocumented registers come from the panel
/// maker's reference init.
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0xFE, &[]),
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0x84, &[0x40]),
    (0x85, &[0xFF]),
    (0x86, &[0xFF]),
    (0x87, &[0xFF]),
    (0x88, &[0x0A]),
    (0x89, &[0x21]),
    (0x8A, &[0x00]),
    (0x8B, &[0x80]),
    (0x8C, &[0x01]),
    (0x8D, &[0x01]),
    (0x8E, &[0xFF]),
    (0x8F, &[0xFF]),
    (0xB6, &[0x00, 0x20]),
    (CMD_MADCTL, &[0x08]), // BGR
    (CMD_COLMOD, &[0x05]), // 16 bpp
    (0x90, &[0x08, 0x08, 0x08, 0x08]),
    (0xBD, &[0x06]),
    (0xBC, &[0x00]),
    (0xFF, &[0x60, 0x01, 0x04]),
    (0xC3, &[0x13]),
    (0xC4, &[0x13]),
    (0xC9, &[0x22]),
    (0xBE, &[0x11]),
    (0xE1, &[0x10, 0x0E]),
    (0xDF, &[0x21, 0x0C, 0x02]),
    (0xF0, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF1, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xF2, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF3, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xED, &[0x1B, 0x0B]),
    (0xAE, &[0x77]),
    (0xCD, &[0x63]),
    (0x70, &[0x07, 0x07, 0x04, 0x0E, 0x0F, 0x09, 0x07, 0x08, 0x03]),
    (0xE8, &[0x34]),
    (0x62, &[0x18, 0x0D, 0x71, 0xED, 0x70, 0x70, 0x18, 0x0F, 0x71, 0xEF, 0x70, 0x70]),
    (0x63, &[0x18, 0x11, 0x71, 0xF1, 0x70, 0x70, 0x18, 0x13, 0x71, 0xF3, 0x70, 0x70]),
    (0x64, &[0x28, 0x29, 0xF1, 0x01, 0xF1, 0x00, 0x07]),
    (0x66, &[0x3C, 0x00, 0xCD, 0x67, 0x45, 0x45, 0x10, 0x00, 0x00, 0x00]),
    (0x67, &[0x00, 0x3C, 0x00, 0x00, 0x00, 0x01, 0x54, 0x10, 0x32, 0x98]),
    (0x74, &[0x10, 0x85, 0x80, 0x00, 0x00, 0x4E, 0x00]),
    (0x98, &[0x3E, 0x07]),
    (CMD_TEON, &[]),
    (CMD_INVON, &[]),
];

/// Pixels per SPI transaction when streaming the frame buffer.
const PIXEL_CHUNK: usize = 1024;

pub struct Gc9a01 {
    spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
    dc: PinDriver<'static, AnyOutputPin, Output>,
}

impl Gc9a01 {
    pub fn init(
        spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
        dc: PinDriver<'static, AnyOutputPin, Output>,
    ) -> anyhow::Result<Self> {
        let mut lcd = Self { spi, dc };

        for (cmd, data) in INIT_SEQUENCE {
            lcd.command(*cmd, data)?;
        }
        lcd.command(CMD_SLPOUT, &[])?;
        thread::sleep(Duration::from_millis(120));
        lcd.command(CMD_DISPON, &[])?;
        thread::sleep(Duration::from_millis(20));

        log::info!("GC9A01 initialised ({}x{})", DISPLAY_WIDTH, DISPLAY_HEIGHT);
        Ok(lcd)
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> anyhow::Result<()> {
        self.dc.set_low()?;
        self.spi.write(&[cmd])?;
        if !data.is_empty() {
            self.dc.set_high()?;
            self.spi.write(data)?;
        }
        Ok(())
    }

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> anyhow::Result<()> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(CMD_CASET, &[x0h, x0l, x1h, x1l])?;
        self.command(CMD_RASET, &[y0h, y0l, y1h, y1l])
    }

    /// Stream full-width rows `first..=last`.
    pub fn write_rows(&mut self, first: u32, last: u32, pixels: &[Rgb565]) -> anyhow::Result<()> {
        self.set_window(0, first as u16, (DISPLAY_WIDTH - 1) as u16, last as u16)?;
        self.command(CMD_RAMWR, &[])?;
        self.dc.set_high()?;

        let mut bytes = Vec::with_capacity(PIXEL_CHUNK * 2);
        for chunk in pixels.chunks(PIXEL_CHUNK) {
            bytes.clear();
            for &px in chunk {
                bytes.extend_from_slice(&RawU16::from(px).into_inner().to_be_bytes());
            }
            self.spi.write(&bytes)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Display collaborator: framebuffer renderer + dirty-row flush
// ---------------------------------------------------------------------------

pub struct PanelDisplay {
    lcd: Gc9a01,
    view: GaugeView<FrameBuffer>,
    _backlight: PinDriver<'static, AnyOutputPin, Output>,
}

impl PanelDisplay {
    pub fn new(lcd: Gc9a01, mut backlight: PinDriver<'static, AnyOutputPin, Output>) -> anyhow::Result<Self> {
        backlight.set_high()?;
        Ok(Self {
            lcd,
            view: GaugeView::new(FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)),
            _backlight: backlight,
        })
    }

    pub fn show_splash(&mut self) -> anyhow::Result<()> {
        self.view.show_splash()?;
        self.flush()
    }

    pub fn show_error(&mut self, message: &str) -> anyhow::Result<()> {
        self.view.show_error(message)?;
        self.flush()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        let Some((first, last)) = self.view.target_mut().take_dirty_rows() else {
            return Ok(());
        };
        self.lcd.write_rows(first, last, self.view.target().rows(first, last))
    }
}

impl Display for PanelDisplay {
    fn prepare_full_redraw(&mut self) -> anyhow::Result<()> {
        self.view.prepare_full_redraw()?;
        self.flush()
    }

    fn render(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.view.render(frame)?;
        self.flush()
    }

    fn reset_scale(&mut self) {
        self.view.reset_scale();
    }
}
