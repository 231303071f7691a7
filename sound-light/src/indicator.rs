//! Four-LED binary status display.
//!
//! A [`StatusCode`] (0..=15) is shown MSB-first: bit 3 on LED 1, bit 0 on
//! LED 4. The fault codes are shown at boot and never during normal
//! operation.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// A 4-bit status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusCode(u8);

impl StatusCode {
    /// System asleep.
    pub const ASLEEP: StatusCode = StatusCode(1);
    /// Awake, nothing playing.
    pub const AWAKE_IDLE: StatusCode = StatusCode(2);
    /// SD card not readable (fatal).
    pub const SD_FAULT: StatusCode = StatusCode(3);
    /// Role straps or configuration invalid (fatal).
    pub const CONFIG_FAULT: StatusCode = StatusCode(5);
    /// Awake and playing.
    pub const PLAYING: StatusCode = StatusCode(8);
    /// Audio codec not responding (fatal).
    pub const CODEC_FAULT: StatusCode = StatusCode(13);
    /// Shown on the wake transition.
    pub const ACTIVE: StatusCode = StatusCode(15);

    /// Returns `None` for values above 15.
    pub const fn new(code: u8) -> Option<StatusCode> {
        if code <= 15 {
            Some(StatusCode(code))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// LED states, MSB first.
    pub const fn pattern(self) -> [bool; 4] {
        [
            self.0 & 0b1000 != 0,
            self.0 & 0b0100 != 0,
            self.0 & 0b0010 != 0,
            self.0 & 0b0001 != 0,
        ]
    }

    /// Code with the bit shown on LED `led` (1..=4) flipped.
    pub const fn toggled(self, led: u8) -> StatusCode {
        match led {
            1..=4 => StatusCode(self.0 ^ (1 << (4 - led))),
            _ => self,
        }
    }

    /// Code derived from the control state.
    pub const fn for_state(awake: bool, playing: bool) -> StatusCode {
        match (awake, playing) {
            (false, _) => StatusCode::ASLEEP,
            (true, false) => StatusCode::AWAKE_IDLE,
            (true, true) => StatusCode::PLAYING,
        }
    }
}

/// The four indicator LEDs.
pub struct StatusLeds<LED> {
    leds: [LED; 4],
    shown: Option<StatusCode>,
}

impl<LED: OutputPin> StatusLeds<LED> {
    pub fn new(leds: [LED; 4]) -> Self {
        Self { leds, shown: None }
    }

    /// Code currently on the LEDs, `None` before the first `show`.
    pub fn shown(&self) -> Option<StatusCode> {
        self.shown
    }

    /// Display `code`.
    pub fn show(&mut self, code: StatusCode) {
        for (led, on) in self.leds.iter_mut().zip(code.pattern()) {
            if led.set_state(on.into()).is_err() {
                error!("status LED write failed");
            }
        }
        self.shown = Some(code);
    }

    /// Flip a single LED (1..=4) and return the resulting code.
    pub fn toggle(&mut self, led: u8) -> StatusCode {
        let code = self.shown.unwrap_or(StatusCode(0)).toggled(led);
        self.show(code);
        code
    }

    /// Switch all LEDs off without forgetting the shown code.
    fn blank(&mut self) {
        for led in self.leds.iter_mut() {
            let _ = led.set_low();
        }
    }

    /// Blink a fault code `cycles` times (500 ms on, 500 ms off).
    pub fn blink<D: DelayNs>(&mut self, code: StatusCode, delay: &mut D, cycles: u32) {
        for _ in 0..cycles {
            self.show(code);
            delay.delay_ms(500);
            self.blank();
            delay.delay_ms(500);
        }
    }
}
