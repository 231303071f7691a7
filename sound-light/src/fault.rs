//! Fatal start-up faults.
//!
//! A unit that cannot identify itself, has an invalid configuration, or has
//! no working SD card or codec never enters the control loop. It parks the
//! outputs in a safe state and blinks the fault code until it is reset.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::{Error as _, SetDutyCycle};

use crate::audio::AudioFault;
use crate::board::{Hardware, Platform};
use crate::config::ConfigError;
use crate::indicator::{StatusCode, StatusLeds};
use crate::relay::open_relays;
use crate::role::RoleError;

/// Why [`Unit::boot`](crate::unit::Unit::boot) gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError {
    Role(RoleError),
    Config(ConfigError),
    Audio(AudioFault),
}

impl BootError {
    /// Code blinked on the status LEDs for this fault.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            BootError::Role(_) | BootError::Config(_) => StatusCode::CONFIG_FAULT,
            BootError::Audio(AudioFault::Storage) => StatusCode::SD_FAULT,
            BootError::Audio(AudioFault::Codec) => StatusCode::CODEC_FAULT,
        }
    }
}

impl From<RoleError> for BootError {
    fn from(e: RoleError) -> Self {
        BootError::Role(e)
    }
}

impl From<ConfigError> for BootError {
    fn from(e: ConfigError) -> Self {
        BootError::Config(e)
    }
}

impl From<AudioFault> for BootError {
    fn from(e: AudioFault) -> Self {
        BootError::Audio(e)
    }
}

/// A failed boot, returning the peripherals so the fault can be shown.
pub struct BootFailure<P: Platform> {
    pub error: BootError,
    pub hardware: Hardware<P>,
}

impl<P: Platform> BootFailure<P> {
    /// Open both relays, darken the strip and blink the fault code forever.
    pub fn halt(self) -> ! {
        let code = self.error.status_code();
        let Hardware {
            mut amp,
            mut speaker,
            mut pwm,
            leds,
            mut delay,
            ..
        } = self.hardware;

        if open_relays(&mut amp, &mut speaker).is_err() {
            error!("could not open relays before halting");
        }
        if let Err(e) = pwm.set_duty_cycle_fully_off() {
            error!("could not darken strip: {:?}", e.kind());
        }

        let mut leds = StatusLeds::new(leds);
        halt(code, &mut leds, &mut delay)
    }
}

/// Blink `code` until reset.
pub fn halt<LED, D>(code: StatusCode, leds: &mut StatusLeds<LED>, delay: &mut D) -> !
where
    LED: OutputPin,
    D: DelayNs,
{
    error!("fatal fault, blinking code {}", code.value());
    loop {
        leds.blink(code, delay, 1);
    }
}
