//! Daily wake window for the leader.
//!
//! The wall clock is read on a coarse interval and compared with the
//! configured active hours. Only edges are reported: a [`Transition`] is
//! returned when the window state differs from the last confirmed one, so the
//! relay sequencer runs once per edge instead of once per poll. An edge is
//! reported again at every poll until the caller
//! [`confirm`](WakeSchedule::confirm)s it.

use crate::clock::Clock;
use crate::Millis;

/// Edge of the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Entered the active window.
    Wake,
    /// Left the active window.
    Sleep,
}

pub struct WakeSchedule {
    start_hour: u8,
    end_hour: u8,
    poll_ms: Millis,
    last_poll: Option<Millis>,
    /// Last confirmed window state; starts inactive.
    active: bool,
}

impl WakeSchedule {
    pub fn new(start_hour: u8, end_hour: u8, poll_ms: Millis) -> Self {
        Self {
            start_hour,
            end_hour,
            poll_ms,
            last_poll: None,
            active: false,
        }
    }

    /// Whether `hour` falls in `[start, end)`. A window with `start > end`
    /// wraps past midnight.
    pub fn in_window(&self, hour: u8) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Last confirmed window state.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Compare `hour` with the last confirmed state and report an edge.
    pub fn evaluate(&self, hour: u8) -> Option<Transition> {
        let active = self.in_window(hour);
        if active == self.active {
            return None;
        }
        info!(
            "activity state changed from {} to {}",
            if self.active { "ACTIVE" } else { "INACTIVE" },
            if active { "ACTIVE" } else { "INACTIVE" }
        );
        Some(if active {
            Transition::Wake
        } else {
            Transition::Sleep
        })
    }

    /// Record that `transition` has been carried out.
    pub fn confirm(&mut self, transition: Transition) {
        self.active = transition == Transition::Wake;
    }

    /// Read the clock if the poll interval has elapsed (immediately on the
    /// first call) and evaluate it.
    ///
    /// A failed clock read is logged and retried at the next interval.
    pub fn poll<C: Clock>(&mut self, now: Millis, clock: &mut C) -> Option<Transition> {
        if let Some(last) = self.last_poll {
            if now.wrapping_sub(last) < self.poll_ms {
                return None;
            }
        }
        self.last_poll = Some(now);

        match clock.now() {
            Ok(time) => {
                debug!(
                    "RTC time check: {}:{}:{} - in range: {}",
                    time.hour,
                    time.minute,
                    time.second,
                    self.in_window(time.hour)
                );
                self.evaluate(time.hour)
            }
            Err(_) => {
                error!("RTC read failed");
                None
            }
        }
    }
}
