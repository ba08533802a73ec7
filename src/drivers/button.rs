// gSENSOR - BOOT button (GPIO9, active LOW with internal pull-up)

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};

use gsensor::board::Button;

pub struct GpioButton {
    pin: PinDriver<'static, AnyIOPin, Input>,
}

impl GpioButton {
    pub fn new(mut pin: PinDriver<'static, AnyIOPin, Input>) -> anyhow::Result<Self> {
        pin.set_pull(Pull::Up)?;
        Ok(Self { pin })
    }
}

impl Button for GpioButton {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}
