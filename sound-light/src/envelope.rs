//! Envelope-to-PWM driver for the LED strip.
//!
//! Samples the audio engine's envelope at most once per refresh period and
//! maps it to a PWM duty (0..=255) through the MOSFET driving the strip.
//! The driver knows nothing about sleep state; the control loop calls
//! [`PwmDriver::off`] when the unit is asleep or silent.

use embedded_hal::pwm::SetDutyCycle;

use crate::audio::{AudioEngine, EnvelopeMode};
use crate::Millis;

/// Full-scale PWM value.
pub const PWM_MAX: u8 = 255;

/// Map an envelope level (0.0..=1.0) to a PWM value scaled by `range`.
///
/// Out-of-range and non-finite levels are clamped; the fractional part is
/// truncated.
pub fn level_to_pwm(level: f32, range: u8) -> u8 {
    if !level.is_finite() {
        return 0;
    }
    let scaled = level.clamp(0.0, 1.0) * range as f32;
    scaled.clamp(0.0, PWM_MAX as f32) as u8
}

/// Rate-limited envelope follower driving one PWM output.
pub struct PwmDriver<P> {
    pin: P,
    mode: EnvelopeMode,
    /// Time of the last envelope-driven write.
    last_update: Option<Millis>,
    /// Last value written to the pin.
    output: Option<u8>,
}

impl<P: SetDutyCycle> PwmDriver<P> {
    pub fn new(pin: P, mode: EnvelopeMode) -> Self {
        Self {
            pin,
            mode,
            last_update: None,
            output: None,
        }
    }

    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        self.mode = mode;
    }

    /// Last value written, `None` before the first write.
    pub fn output(&self) -> Option<u8> {
        self.output
    }

    /// Sample the envelope if `period_ms` has elapsed since the previous
    /// update and the engine has a new value.
    ///
    /// Returns the value written, if any. The period restarts only when a
    /// value is written, so a missing sample is picked up on the next call.
    pub fn update<A: AudioEngine>(
        &mut self,
        now: Millis,
        audio: &mut A,
        range: u8,
        period_ms: u32,
    ) -> Option<u8> {
        if let Some(last) = self.last_update {
            if now.wrapping_sub(last) < period_ms {
                return None;
            }
        }

        let level = audio.read_level(self.mode)?;
        self.last_update = Some(now);
        let value = level_to_pwm(level, range);
        self.write(value);
        Some(value)
    }

    /// Drive the output to zero unless it already is.
    pub fn off(&mut self) {
        if self.output != Some(0) {
            self.write(0);
        }
    }

    /// Write a raw value, bypassing the envelope.
    pub fn write(&mut self, value: u8) {
        match self.pin.set_duty_cycle_fraction(value as u16, PWM_MAX as u16) {
            Ok(()) => self.output = Some(value),
            Err(_) => error!("PWM write failed"),
        }
    }
}
