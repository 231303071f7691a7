//! Per-unit control state.
//!
//! Owned by the control loop and handed by reference to the relay sequencer
//! and the dispatcher. On a follower it only changes in response to received
//! commands.

use crate::config::UnitConfig;

/// Step applied by VOL_UP / VOL_DOWN.
pub const VOLUME_STEP: f32 = 0.1;

/// Step applied by PWM_UP / PWM_DOWN.
pub const PWM_STEP: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemState {
    /// Amplifier and speaker powered; gates playback and PWM.
    pub awake: bool,
    /// Playback started and not yet observed stopped.
    pub playing: bool,
    /// Output volume, 0.0..=1.0.
    pub volume: f32,
    /// PWM value for a full-scale envelope.
    pub pwm_range: u8,
    /// Minimum time between PWM updates.
    pub pwm_period_ms: u32,
    /// Playback starts since the last wake transition.
    pub track_iteration: u32,
}

impl SystemState {
    /// Asleep and idle, with output settings from `config`.
    pub fn new(config: &UnitConfig) -> Self {
        Self {
            awake: false,
            playing: false,
            volume: config.volume,
            pwm_range: config.pwm_range,
            pwm_period_ms: config.pwm_period_ms,
            track_iteration: 0,
        }
    }

    /// Set the volume, rejecting values outside 0.0..=1.0.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        if (0.0..=1.0).contains(&volume) {
            self.volume = volume;
            true
        } else {
            false
        }
    }

    /// Raise the volume by one step, saturating at 1.0.
    pub fn volume_up(&mut self) -> f32 {
        self.volume = quantize(self.volume + VOLUME_STEP);
        self.volume
    }

    /// Lower the volume by one step, saturating at 0.0.
    pub fn volume_down(&mut self) -> f32 {
        self.volume = quantize(self.volume - VOLUME_STEP);
        self.volume
    }

    pub fn pwm_up(&mut self) -> u8 {
        self.pwm_range = self.pwm_range.saturating_add(PWM_STEP);
        self.pwm_range
    }

    pub fn pwm_down(&mut self) -> u8 {
        self.pwm_range = self.pwm_range.saturating_sub(PWM_STEP);
        self.pwm_range
    }
}

/// Clamp to 0.0..=1.0 and snap to two decimals so repeated steps do not drift.
fn quantize(volume: f32) -> f32 {
    libm::roundf(volume.clamp(0.0, 1.0) * 100.0) / 100.0
}
