//! # sound-light
//!
//! A `no_std` control core for a multi-unit sound-to-light installation: each
//! Teensy plays a WAV file, drives an LED strip from the audio envelope and
//! sequences the amplifier and speaker relays. One unit (LONG, the leader)
//! owns a real-time clock and a daily schedule and commands the followers
//! (SMALL, SEASHELL) over a shared serial link.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Seams | [`board`] / [`audio`] / [`clock`] | Peripheral types and collaborator traits |
//! | Identity | [`role`] / [`config`] | Strap-pin role, deployment parameters |
//! | Outputs | [`relay`] / [`envelope`] / [`indicator`] | Relay ordering, envelope PWM, status LEDs |
//! | Protocol | [`protocol`] | Command bytes, framed messages, status replies |
//! | Control | [`unit`] / [`schedule`] / [`state`] | Boot, control loop, leader and follower roles |
//! | Text | [`report`] / [`fault`] | Console report and help, fatal boot faults |
//!
//! ## Usage
//!
//! ```ignore
//! use sound_light::{Hardware, Unit, UnitConfig};
//!
//! let hardware = Hardware::<Board> { /* board peripherals */ };
//! let mut unit = match Unit::boot(UnitConfig::default(), &mut straps, hardware) {
//!     Ok(unit) => unit,
//!     Err(failure) => failure.halt(),
//! };
//!
//! loop {
//!     unit.tick(millis());
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `log` | yes | Log through the `log` facade |
//! | `defmt` | no | Log through `defmt`; build with `default-features = false` to drop `log` |

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

/// Milliseconds from a free-running, wrapping counter.
pub type Millis = u32;

pub mod audio;
pub mod board;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod fault;
pub mod indicator;
pub mod protocol;
pub mod relay;
pub mod report;
pub mod role;
pub mod schedule;
pub mod state;
pub mod unit;

#[cfg(test)]
mod mock;

pub use audio::{AudioEngine, AudioFault, EnvelopeMode};
pub use board::{Hardware, Platform};
pub use config::{ConfigError, UnitConfig};
pub use fault::{BootError, BootFailure};
pub use indicator::StatusCode;
pub use protocol::{Command, Message, StatusReport};
pub use role::{Role, RoleError, StrapPins};
pub use state::SystemState;
pub use unit::Unit;
