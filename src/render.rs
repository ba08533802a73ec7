// gSENSOR - Gauge rendering
//
// Implements the `Display` collaborator on top of any embedded-graphics draw
// target. The gauge is a segmented 270 degree arc whose full-scale value
// auto-ranges upward (10 / 20 / 50 / 100 / 200 g) until reset.

use std::fmt::Debug;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_9X15_BOLD},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Arc, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder},
};

use crate::board::{Display, Frame, GaugeReadout, SettingsReadout};
use crate::config::*;
use crate::ui::{SettingsAction, SETTINGS_REGIONS};

/// Colour band for a g value.
pub fn color_for(g: f32) -> Rgb565 {
    if g < G_THRESHOLD_LOW {
        COLOR_LOW_G
    } else if g < G_THRESHOLD_MED {
        COLOR_MED_G
    } else if g < G_THRESHOLD_HIGH {
        COLOR_HIGH_G
    } else {
        COLOR_EXTREME_G
    }
}

/// Full-scale value of the gauge arc. Only grows, one range step at a time
/// large enough to hold the observed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeScale {
    max_g: f32,
}

impl Default for GaugeScale {
    fn default() -> Self {
        Self { max_g: GAUGE_DEFAULT_MAX_G }
    }
}

impl GaugeScale {
    pub fn max_g(&self) -> f32 {
        self.max_g
    }

    pub fn observe(&mut self, magnitude: f32) {
        if magnitude <= self.max_g {
            return;
        }
        self.max_g = GAUGE_RANGES_G
            .iter()
            .copied()
            .find(|&range| magnitude <= range)
            .unwrap_or(GAUGE_RANGES_G[GAUGE_RANGES_G.len() - 1]);
    }

    /// Number of lit arc segments for `value`.
    pub fn filled_segments(&self, value: f32) -> u32 {
        let fraction = (value / self.max_g).clamp(0.0, 1.0);
        (fraction * GAUGE_SEGMENTS as f32) as u32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn draw_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("display draw failed: {:?}", e)
}

fn centered() -> TextStyle {
    TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build()
}

/// RAM framebuffer used as the draw target; tracks which rows changed since
/// the last flush so the panel driver only pushes that band.
pub struct FrameBuffer {
    size: Size,
    pixels: Vec<Rgb565>,
    dirty: Option<(u32, u32)>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: vec![COLOR_BACKGROUND; (width * height) as usize],
            dirty: None,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb565 {
        self.pixels[(y * self.size.width + x) as usize]
    }

    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// First and last changed row (inclusive), clearing the dirty state.
    pub fn take_dirty_rows(&mut self) -> Option<(u32, u32)> {
        self.dirty.take()
    }

    /// Pixels of rows `first..=last`, row-major.
    pub fn rows(&self, first: u32, last: u32) -> &[Rgb565] {
        let w = self.size.width as usize;
        &self.pixels[first as usize * w..(last as usize + 1) * w]
    }

    fn mark(&mut self, y: u32) {
        self.dirty = Some(match self.dirty {
            Some((lo, hi)) => (lo.min(y), hi.max(y)),
            None => (y, y),
        });
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x < 0 || p.y < 0 || p.x as u32 >= self.size.width || p.y as u32 >= self.size.height {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            self.pixels[(y * self.size.width + x) as usize] = color;
            self.mark(y);
        }
        Ok(())
    }
}

pub struct GaugeView<D> {
    target: D,
    scale: GaugeScale,
}

impl<D> GaugeView<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
    D::Error: Debug,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            scale: GaugeScale::default(),
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn scale(&self) -> GaugeScale {
        self.scale
    }

    fn center(&self) -> Point {
        self.target.bounding_box().center()
    }

    pub fn show_splash(&mut self) -> anyhow::Result<()> {
        self.target.clear(COLOR_BACKGROUND).map_err(draw_err)?;
        let c = self.center();
        self.text("gSENSOR", c - Point::new(0, 12), MonoTextStyle::new(&FONT_10X20, COLOR_ACCENT))?;
        self.text("HIGH-G ACCELEROMETER", c + Point::new(0, 14), MonoTextStyle::new(&FONT_6X10, COLOR_MUTED))?;
        Ok(())
    }

    pub fn show_error(&mut self, message: &str) -> anyhow::Result<()> {
        self.target.clear(COLOR_BACKGROUND).map_err(draw_err)?;
        let c = self.center();
        self.text("ERROR", c - Point::new(0, 14), MonoTextStyle::new(&FONT_10X20, COLOR_EXTREME_G))?;
        self.text(message, c + Point::new(0, 12), MonoTextStyle::new(&FONT_6X10, COLOR_TEXT))?;
        Ok(())
    }

    fn text(&mut self, s: &str, at: Point, style: MonoTextStyle<'_, Rgb565>) -> anyhow::Result<()> {
        Text::with_text_style(s, at, style, centered())
            .draw(&mut self.target)
            .map_err(draw_err)?;
        Ok(())
    }

    /// Blank a text slot before redrawing it so shorter strings leave no
    /// residue.
    fn blank(&mut self, area: Rectangle) -> anyhow::Result<()> {
        area.into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(&mut self.target)
            .map_err(draw_err)
    }

    fn draw_arc(&mut self, magnitude: f32) -> anyhow::Result<()> {
        let lit = self.scale.filled_segments(magnitude);
        let color = color_for(magnitude);
        let step = GAUGE_SWEEP_ANGLE / GAUGE_SEGMENTS as f32;
        let center = self.center();

        for i in 0..GAUGE_SEGMENTS {
            let start = GAUGE_START_ANGLE + step * i as f32;
            let segment_color = if i < lit { color } else { COLOR_PANEL };
            Arc::with_center(
                center,
                GAUGE_DIAMETER,
                Angle::from_degrees(start),
                Angle::from_degrees(step - GAUGE_SEGMENT_GAP),
            )
            .into_styled(PrimitiveStyle::with_stroke(segment_color, GAUGE_STROKE))
            .draw(&mut self.target)
            .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw_gauge(&mut self, readout: &GaugeReadout) -> anyhow::Result<()> {
        self.scale.observe(readout.magnitude);
        self.draw_arc(readout.magnitude)?;

        let c = self.center();

        self.blank(Rectangle::with_center(c - Point::new(0, 12), Size::new(100, 24)))?;
        let magnitude = format!("{:.1}", readout.magnitude);
        self.text(&magnitude, c - Point::new(0, 12), MonoTextStyle::new(&FONT_10X20, COLOR_TEXT))?;
        let unit = format!("g / {:.0}g", self.scale.max_g());
        self.blank(Rectangle::with_center(c + Point::new(0, 8), Size::new(100, 12)))?;
        self.text(&unit, c + Point::new(0, 8), MonoTextStyle::new(&FONT_6X10, COLOR_MUTED))?;

        let peak_box = Rectangle::with_center(c + Point::new(0, 40), Size::new(110, 28));
        RoundedRectangle::with_equal_corners(peak_box, Size::new(6, 6))
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(COLOR_BACKGROUND)
                    .stroke_color(COLOR_MUTED)
                    .stroke_width(1)
                    .build(),
            )
            .draw(&mut self.target)
            .map_err(draw_err)?;
        let peak = format!("PEAK {:.1}g", readout.peak);
        self.text(&peak, c + Point::new(0, 40), MonoTextStyle::new(&FONT_9X15_BOLD, COLOR_TEXT))?;

        let axes_at = c + Point::new(0, 80);
        self.blank(Rectangle::with_center(axes_at, Size::new(170, 12)))?;
        if readout.sensor_ok {
            let f = readout.filtered;
            let axes = format!("X{:+.1} Y{:+.1} Z{:+.1}", f.x, f.y, f.z);
            self.text(&axes, axes_at, MonoTextStyle::new(&FONT_6X10, COLOR_MUTED))?;
        } else {
            self.text("SENSOR NOT FOUND", axes_at, MonoTextStyle::new(&FONT_6X10, COLOR_EXTREME_G))?;
        }
        Ok(())
    }

    fn draw_settings(&mut self, readout: &SettingsReadout) -> anyhow::Result<()> {
        let c = self.center();
        self.text("SETTINGS", Point::new(c.x, 35), MonoTextStyle::new(&FONT_9X15_BOLD, COLOR_TEXT))?;

        for region in SETTINGS_REGIONS {
            let rect = Rectangle::with_corners(
                Point::new(region.x1 as i32, region.y1 as i32),
                Point::new(region.x2 as i32, region.y2 as i32),
            );
            let (label, active) = match region.action {
                SettingsAction::ToggleWireless => {
                    (on_off("BLE", readout.settings.wireless_enabled), readout.settings.wireless_enabled)
                }
                SettingsAction::ToggleDebugStream => (
                    on_off("SERIAL", readout.settings.debug_stream_enabled),
                    readout.settings.debug_stream_enabled,
                ),
                SettingsAction::Back => ("BACK".to_string(), false),
            };
            let fill = if active { COLOR_PANEL } else { COLOR_BACKGROUND };
            let outline = if active || region.action == SettingsAction::Back {
                COLOR_ACCENT
            } else {
                COLOR_MUTED
            };
            RoundedRectangle::with_equal_corners(rect, Size::new(6, 6))
                .into_styled(
                    PrimitiveStyleBuilder::new()
                        .fill_color(fill)
                        .stroke_color(outline)
                        .stroke_width(2)
                        .build(),
                )
                .draw(&mut self.target)
                .map_err(draw_err)?;
            self.text(&label, rect.center(), MonoTextStyle::new(&FONT_9X15_BOLD, COLOR_TEXT))?;
        }

        let status_at = Point::new(c.x, 172);
        self.blank(Rectangle::with_center(status_at, Size::new(150, 12)))?;
        let (status, color) = match (readout.settings.wireless_enabled, readout.peer_connected) {
            (false, _) => ("LINK OFF", COLOR_MUTED),
            (true, true) => ("LINK CONNECTED", COLOR_LOW_G),
            (true, false) => ("LINK ADVERTISING", COLOR_MED_G),
        };
        self.text(status, status_at, MonoTextStyle::new(&FONT_6X10, color))
    }
}

fn on_off(label: &str, on: bool) -> String {
    format!("{} {}", label, if on { "ON" } else { "OFF" })
}

impl<D> Display for GaugeView<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
    D::Error: Debug,
{
    fn prepare_full_redraw(&mut self) -> anyhow::Result<()> {
        self.target.clear(COLOR_BACKGROUND).map_err(draw_err)
    }

    fn render(&mut self, frame: &Frame) -> anyhow::Result<()> {
        match frame {
            Frame::Gauge(readout) => self.draw_gauge(readout),
            Frame::Settings(readout) => self.draw_settings(readout),
        }
    }

    fn reset_scale(&mut self) {
        self.scale.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Sample;
    use crate::ui::Settings;

    fn panel() -> FrameBuffer {
        FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }

    fn gauge(magnitude: f32, sensor_ok: bool) -> Frame {
        Frame::Gauge(GaugeReadout {
            filtered: Sample::new(0.0, 0.0, magnitude),
            magnitude,
            peak: magnitude,
            sensor_ok,
        })
    }

    #[test]
    fn colour_bands() {
        assert_eq!(color_for(0.0), COLOR_LOW_G);
        assert_eq!(color_for(10.0), COLOR_MED_G);
        assert_eq!(color_for(75.0), COLOR_HIGH_G);
        assert_eq!(color_for(150.0), COLOR_EXTREME_G);
    }

    #[test]
    fn scale_auto_ranges_and_resets() {
        let mut scale = GaugeScale::default();
        scale.observe(5.0);
        assert_eq!(scale.max_g(), 10.0);
        scale.observe(15.0);
        assert_eq!(scale.max_g(), 20.0);
        scale.observe(60.0);
        assert_eq!(scale.max_g(), 100.0);
        scale.observe(30.0);
        assert_eq!(scale.max_g(), 100.0);
        scale.observe(500.0);
        assert_eq!(scale.max_g(), 200.0);
        scale.reset();
        assert_eq!(scale.max_g(), GAUGE_DEFAULT_MAX_G);
    }

    #[test]
    fn segments_follow_scale() {
        let scale = GaugeScale::default();
        assert_eq!(scale.filled_segments(0.0), 0);
        assert_eq!(scale.filled_segments(5.0), 10);
        assert_eq!(scale.filled_segments(-3.0), 0);
        assert_eq!(scale.filled_segments(10.0), GAUGE_SEGMENTS);
    }

    #[test]
    fn full_redraw_clears_to_background() {
        let mut view = GaugeView::new(panel());
        view.prepare_full_redraw().unwrap();
        assert_eq!(
            view.target().count(COLOR_BACKGROUND),
            (DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize
        );
    }

    #[test]
    fn gauge_lights_segments_in_band_colour() {
        let mut view = GaugeView::new(panel());
        view.prepare_full_redraw().unwrap();
        view.render(&gauge(0.0, true)).unwrap();
        assert_eq!(view.target().count(COLOR_LOW_G), 0);

        view.render(&gauge(5.0, true)).unwrap();
        assert!(view.target().count(COLOR_LOW_G) > 0);
    }

    #[test]
    fn gauge_render_grows_scale_until_reset() {
        let mut view = GaugeView::new(panel());
        view.render(&gauge(42.0, true)).unwrap();
        assert_eq!(view.scale().max_g(), 50.0);
        view.reset_scale();
        assert_eq!(view.scale().max_g(), GAUGE_DEFAULT_MAX_G);
    }

    #[test]
    fn missing_sensor_is_flagged_on_gauge() {
        let mut view = GaugeView::new(panel());
        view.prepare_full_redraw().unwrap();
        view.render(&gauge(0.0, false)).unwrap();
        assert!(view.target().count(COLOR_EXTREME_G) > 0);
    }

    #[test]
    fn framebuffer_tracks_dirty_rows() {
        let mut fb = panel();
        assert_eq!(fb.take_dirty_rows(), None);
        Rectangle::new(Point::new(10, 20), Size::new(5, 3))
            .into_styled(PrimitiveStyle::with_fill(COLOR_ACCENT))
            .draw(&mut fb)
            .unwrap();
        Pixel(Point::new(-1, 300), COLOR_ACCENT).draw(&mut fb).unwrap();
        assert_eq!(fb.take_dirty_rows(), Some((20, 22)));
        assert_eq!(fb.take_dirty_rows(), None);
        assert_eq!(fb.pixel(12, 21), COLOR_ACCENT);
        assert_eq!(fb.rows(20, 22).len(), 3 * DISPLAY_WIDTH as usize);
    }

    /// Panel whose bus has gone away.
    struct DeadPanel;

    impl OriginDimensions for DeadPanel {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        }
    }

    impl DrawTarget for DeadPanel {
        type Color = Rgb565;
        type Error = &'static str;

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Err("spi timeout")
        }
    }

    #[test]
    fn boot_screens_draw_and_report_panel_failures() {
        let mut view = GaugeView::new(panel());
        view.show_splash().unwrap();
        assert!(view.target().count(COLOR_ACCENT) > 0);
        view.show_error("ADXL375 NOT FOUND").unwrap();
        assert!(view.target().count(COLOR_EXTREME_G) > 0);

        let mut dead = GaugeView::new(DeadPanel);
        assert!(dead.show_splash().is_err());
        assert!(dead.show_error("ADXL375 NOT FOUND").is_err());
    }

    #[test]
    fn settings_screen_reflects_link_state() {
        let mut view = GaugeView::new(panel());
        view.prepare_full_redraw().unwrap();
        view.render(&Frame::Settings(SettingsReadout {
            settings: Settings::default(),
            peer_connected: true,
        }))
        .unwrap();
        assert!(view.target().count(COLOR_LOW_G) > 0);
        assert!(view.target().count(COLOR_ACCENT) > 0);
    }
}
