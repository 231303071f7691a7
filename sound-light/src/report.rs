//! Console text: system report and command help.

use core::fmt;

use crate::audio::EnvelopeMode;
use crate::clock::WallTime;
use crate::config::UnitConfig;
use crate::indicator::StatusCode;
use crate::protocol::{Command, StatusReport};
use crate::role::Role;
use crate::state::SystemState;

/// Track position shown as `m:ss:mmm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub u32);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        write!(
            f,
            "{}:{:02}:{:03}",
            ms / 60_000,
            (ms / 1_000) % 60,
            ms % 1_000
        )
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

/// Snapshot written for the REPORT command.
pub struct SystemReport<'a> {
    pub role: Role,
    pub state: &'a SystemState,
    pub config: &'a UnitConfig,
    pub envelope: EnvelopeMode,
    pub position_ms: u32,
    pub length_ms: u32,
    pub indicator: Option<StatusCode>,
    /// Wall-clock time; `None` on the leader means the read failed.
    pub time: Option<WallTime>,
    /// Last reply from each follower (leader only, empty on followers).
    pub followers: &'a [(Role, Option<StatusReport>)],
}

impl fmt::Display for SystemReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "----- SYSTEM REPORT -----")?;
        if self.role.is_leader() {
            match self.time {
                Some(time) => writeln!(f, "RTC time: {}", time)?,
                None => writeln!(f, "RTC time: unavailable")?,
            }
        }
        writeln!(f, "Player ID: {} ({})", self.role.id(), self.role.name())?;
        writeln!(f, "Current file: {}", self.role.file_name())?;
        if self.state.playing {
            writeln!(
                f,
                "Track position {} / {}",
                Position(self.position_ms),
                Position(self.length_ms)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "-- SYSTEM SETTINGS --")?;
        writeln!(f, "Audio Volume: {:.2}", self.state.volume)?;
        writeln!(f, "PWM Range: {}", self.state.pwm_range)?;
        writeln!(f, "PWM Period: {} ms", self.state.pwm_period_ms)?;
        match self.indicator {
            Some(code) => writeln!(f, "Current Code: {}", code.value())?,
            None => writeln!(f, "Current Code: -")?,
        }
        writeln!(f, "Relay Settle: {} ms", self.config.relay_settle_ms)?;
        writeln!(f, "Track Iteration: {}", self.state.track_iteration)?;
        writeln!(f, "Start Hour: {}", self.config.start_hour)?;
        writeln!(f, "End Hour: {}", self.config.end_hour)?;

        writeln!(f)?;
        writeln!(f, "-- SYSTEM STATES --")?;
        writeln!(f, "System Awake: {}", yes_no(self.state.awake))?;
        writeln!(
            f,
            "Playback Status: {}",
            if self.state.playing { "PLAYING" } else { "STOPPED" }
        )?;
        writeln!(
            f,
            "Peak Mode: {}",
            if self.envelope == EnvelopeMode::Peak {
                "ENABLED"
            } else {
                "DISABLED"
            }
        )?;

        if !self.followers.is_empty() {
            writeln!(f)?;
            writeln!(f, "-- FOLLOWERS --")?;
            for (role, status) in self.followers {
                match status {
                    Some(s) => writeln!(
                        f,
                        "{}: awake {}, playing {}, {} / {}, {:.1} C",
                        role.name(),
                        yes_no(s.awake),
                        yes_no(s.playing),
                        Position(s.position_ms),
                        Position(s.length_ms),
                        s.temp_c
                    )?,
                    None => writeln!(f, "{}: no reply", role.name())?,
                }
            }
        }

        writeln!(f, "----- END REPORT -----")
    }
}

/// Command table written for the HELP command.
pub struct Help;

impl fmt::Display for Help {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available commands:")?;
        for command in Command::ALL {
            writeln!(
                f,
                "  {}  {:<8} {}",
                command.code() as char,
                command.verb(),
                command.description()
            )?;
        }
        writeln!(f, "Messages (':' + body + ';' or newline):")?;
        writeln!(f, "  :vol<0..1>      Set volume")?;
        writeln!(f, "  :pwm<0..1>      Set PWM range")?;
        writeln!(f, "  :freq<1..100>   Set PWM refresh rate in Hz")?;
        writeln!(f, "  :led<0..15>     Show a status code")?;
        writeln!(f, "  :small          Query SMALL status")?;
        writeln!(f, "  :seashell       Query SEASHELL status")
    }
}
