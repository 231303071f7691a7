//! Wall clock and temperature collaborators.

/// Day names indexed by [`WallTime::weekday`] (Sunday = 0).
pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A reading of the real-time clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// Day of week, Sunday = 0.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallTime {
    /// Time of day on an unspecified date, for tests and simulations.
    pub const fn at(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            weekday: 6,
            hour,
            minute,
            second,
        }
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAYS.get(self.weekday as usize).copied().unwrap_or("?")
    }
}

impl core::fmt::Display for WallTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}/{:02}/{:02} ({}) {:02}:{:02}:{:02}",
            self.year,
            self.month,
            self.day,
            self.weekday_name(),
            self.hour,
            self.minute,
            self.second
        )
    }
}

/// Real-time clock, present on the leader only.
pub trait Clock {
    type Error: core::fmt::Debug;

    fn now(&mut self) -> Result<WallTime, Self::Error>;
}

/// Board temperature, reported in follower status replies.
pub trait Thermometer {
    fn celsius(&mut self) -> f32;
}
