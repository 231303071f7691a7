//! Board seam: the peripheral types a unit runs on.
//!
//! A board crate implements [`Platform`] once, naming its concrete pin, PWM,
//! serial and audio types, and hands the initialized peripherals to
//! [`Unit::boot`](crate::unit::Unit::boot) as a [`Hardware`] bundle.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_nb::serial;

use crate::audio::AudioEngine;
use crate::clock::{Clock, Thermometer};

/// Concrete peripheral types of one board.
pub trait Platform {
    type Audio: AudioEngine;
    type Clock: Clock;
    type Thermometer: Thermometer;
    /// Inter-unit serial link.
    type Link: serial::Read<u8> + serial::Write<u8>;
    /// USB serial console.
    type Console: serial::Read<u8> + serial::Write<u8>;
    type AmpRelay: OutputPin;
    type SpeakerRelay: OutputPin;
    /// One of the four status LEDs.
    type Led: OutputPin;
    /// MOSFET gate of the LED strip.
    type Pwm: SetDutyCycle;
    type Delay: DelayNs;
}

/// Initialized peripherals, moved into the unit at boot.
pub struct Hardware<P: Platform> {
    pub audio: P::Audio,
    /// Real-time clock; required on the leader, ignored on followers.
    pub clock: Option<P::Clock>,
    pub thermometer: P::Thermometer,
    pub link: P::Link,
    pub console: P::Console,
    pub amp: P::AmpRelay,
    pub speaker: P::SpeakerRelay,
    /// Status LEDs, LED 1 (MSB) first.
    pub leds: [P::Led; 4],
    pub pwm: P::Pwm,
    pub delay: P::Delay,
}
