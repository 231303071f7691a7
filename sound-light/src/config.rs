//! Per-deployment configuration.
//!
//! Every unit runs the same firmware; [`UnitConfig`] holds the handful of
//! values that differ between installations (active hours, timings, output
//! scaling). The role itself is not configured here, it comes from the strap
//! pins (see [`crate::role`]).

use crate::audio::EnvelopeMode;
use crate::Millis;

/// Default first active hour (inclusive).
pub const DEFAULT_START_HOUR: u8 = 6;

/// Default last active hour (exclusive).
pub const DEFAULT_END_HOUR: u8 = 23;

/// Delay between consecutive relay switching steps.
pub const DEFAULT_RELAY_SETTLE_MS: u32 = 500;

/// Upper bound for the relay settle delay: a transition has two settle
/// waits and must finish within one second.
pub const MAX_RELAY_SETTLE_MS: u32 = 500;

/// Envelope sampling period for the LED strip (≈ 40 Hz).
pub const DEFAULT_PWM_PERIOD_MS: u32 = 25;

/// Inter-character silence that closes a partially received framed message.
pub const DEFAULT_FRAME_TIMEOUT_MS: Millis = 250;

/// Serial speed of the inter-unit link.
pub const DEFAULT_LINK_BAUD: u32 = 9_600;

/// Leader configuration and timing for one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConfig {
    /// First hour of the active window (0..=23).
    pub start_hour: u8,
    /// End of the active window, exclusive (0..=24). May be smaller than
    /// `start_hour` for a window that wraps past midnight.
    pub end_hour: u8,
    /// How often the leader reads the wall clock.
    pub schedule_poll_ms: Millis,
    /// Wait after each relay switch.
    pub relay_settle_ms: u32,
    /// Minimum time between two PWM updates.
    pub pwm_period_ms: u32,
    /// Full-scale PWM value for an envelope of 1.0.
    pub pwm_range: u8,
    /// Initial output volume (0.0..=1.0).
    pub volume: f32,
    /// Which envelope the LED strip follows.
    pub envelope_mode: EnvelopeMode,
    /// Leader: delay between two PLAY attempts while awake and silent.
    pub play_retry_ms: Millis,
    /// Inter-byte timeout for framed messages.
    pub frame_timeout_ms: Millis,
    /// Leader: interval between follower status queries, 0 disables polling.
    pub status_poll_ms: Millis,
    /// Follower: how long link traffic is ignored after a query addressed
    /// to the other follower.
    pub query_quiet_ms: Millis,
    /// Leader: interval for re-broadcasting the current WAKEUP/SLEEP state,
    /// 0 disables it.
    pub reassert_ms: Millis,
    /// Inter-unit link speed, for the board setup code.
    pub link_baud: u32,
}

/// Reasons a [`UnitConfig`] is rejected at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `start_hour` above 23 or `end_hour` above 24.
    HourOutOfRange,
    /// `start_hour == end_hour` leaves the window undefined.
    EmptyWindow,
    /// Initial volume outside 0.0..=1.0.
    VolumeOutOfRange,
    /// `pwm_period_ms` is zero.
    ZeroPwmPeriod,
    /// Relay settle delay longer than [`MAX_RELAY_SETTLE_MS`].
    SettleTooLong,
    /// `frame_timeout_ms` is zero.
    ZeroFrameTimeout,
    /// The leader needs a wall clock and none was provided.
    MissingClock,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            schedule_poll_ms: 60_000,
            relay_settle_ms: DEFAULT_RELAY_SETTLE_MS,
            pwm_period_ms: DEFAULT_PWM_PERIOD_MS,
            pwm_range: 255,
            volume: 0.5,
            envelope_mode: EnvelopeMode::Rms,
            play_retry_ms: 5_000,
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
            status_poll_ms: 30_000,
            query_quiet_ms: 1_000,
            reassert_ms: 300_000,
            link_baud: DEFAULT_LINK_BAUD,
        }
    }
}

impl UnitConfig {
    /// Set the active window `[start, end)` in wall-clock hours.
    pub fn with_window(mut self, start_hour: u8, end_hour: u8) -> Self {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self
    }

    /// Set the relay settle delay.
    pub fn with_relay_settle_ms(mut self, ms: u32) -> Self {
        self.relay_settle_ms = ms;
        self
    }

    /// Set the envelope sampling period.
    pub fn with_pwm_period_ms(mut self, ms: u32) -> Self {
        self.pwm_period_ms = ms;
        self
    }

    /// Select peak or RMS envelope.
    pub fn with_envelope_mode(mut self, mode: EnvelopeMode) -> Self {
        self.envelope_mode = mode;
        self
    }

    /// Set the leader's PLAY retry interval.
    pub fn with_play_retry_ms(mut self, ms: Millis) -> Self {
        self.play_retry_ms = ms;
        self
    }

    /// Set the wall-clock polling interval.
    pub fn with_schedule_poll_ms(mut self, ms: Millis) -> Self {
        self.schedule_poll_ms = ms;
        self
    }

    /// Set the follower status polling interval (0 disables).
    pub fn with_status_poll_ms(mut self, ms: Millis) -> Self {
        self.status_poll_ms = ms;
        self
    }

    /// Set the state re-assertion interval (0 disables).
    pub fn with_reassert_ms(mut self, ms: Millis) -> Self {
        self.reassert_ms = ms;
        self
    }

    /// Check the values a deployment can get wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_hour > 23 || self.end_hour > 24 {
            return Err(ConfigError::HourOutOfRange);
        }
        if self.start_hour == self.end_hour {
            return Err(ConfigError::EmptyWindow);
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::VolumeOutOfRange);
        }
        if self.pwm_period_ms == 0 {
            return Err(ConfigError::ZeroPwmPeriod);
        }
        if self.relay_settle_ms > MAX_RELAY_SETTLE_MS {
            return Err(ConfigError::SettleTooLong);
        }
        if self.frame_timeout_ms == 0 {
            return Err(ConfigError::ZeroFrameTimeout);
        }
        Ok(())
    }
}
