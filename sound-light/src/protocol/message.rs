//! Framed string messages (`:body` + terminator).
//!
//! A body is one of:
//! - a command verb (`play`, `wakeup`, ...) or a bare command byte (`p`);
//! - a follower query (`small`, `seashell`);
//! - a status reply (`STATUS|...`);
//! - a parameterized setting: `vol0.8`, `pwm0.5`, `freq25`, `led7`.
//!
//! Verbs are matched case-insensitively.

use core::fmt;

use super::command::Command;
use super::status::{StatusError, StatusReport, STATUS_TAG};
use crate::indicator::StatusCode;
use crate::role::Role;

/// Highest accepted envelope refresh rate.
pub const MAX_REFRESH_HZ: u8 = 100;

/// A decoded framed message.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Same effect as the command byte.
    Command(Command),
    /// Leader asks one follower for a status reply.
    Query(Role),
    /// Follower status reply.
    Status(StatusReport),
    /// Absolute volume, 0.0..=1.0.
    SetVolume(f32),
    /// Absolute PWM range, 0..=255.
    SetPwmRange(u8),
    /// Envelope refresh rate in Hz, 1..=100.
    SetRefreshHz(u8),
    /// Show a status code on the LEDs.
    ShowCode(StatusCode),
}

/// Why a message body was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Nothing between `:` and the terminator.
    Empty,
    /// Body is not valid UTF-8.
    NotUtf8,
    /// No verb matches.
    Unknown,
    /// Known prefix with a missing or out-of-range value.
    BadValue,
    /// Malformed status reply.
    BadStatus(StatusError),
}

impl Message {
    /// Decode a raw frame body.
    pub fn parse_bytes(body: &[u8]) -> Result<Message, ParseError> {
        let text = core::str::from_utf8(body).map_err(|_| ParseError::NotUtf8)?;
        Message::parse(text)
    }

    /// Decode a message body (without the leading `:`).
    pub fn parse(body: &str) -> Result<Message, ParseError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ParseError::Empty);
        }

        if has_prefix(body, STATUS_TAG) {
            return StatusReport::parse(body)
                .map(Message::Status)
                .map_err(ParseError::BadStatus);
        }

        if let [byte] = body.as_bytes() {
            return Command::try_from(*byte)
                .map(Message::Command)
                .map_err(|_| ParseError::Unknown);
        }

        if let Some(command) = Command::from_verb(body) {
            return Ok(Message::Command(command));
        }

        for role in [Role::SmallFollower, Role::SeashellFollower] {
            if body.eq_ignore_ascii_case(role.name()) {
                return Ok(Message::Query(role));
            }
        }

        if let Some(value) = strip_prefix(body, "vol") {
            return parse_fraction(value)
                .map(Message::SetVolume)
                .ok_or(ParseError::BadValue);
        }
        if let Some(value) = strip_prefix(body, "pwm") {
            return parse_fraction(value)
                .map(|f| Message::SetPwmRange((f * 255.0) as u8))
                .ok_or(ParseError::BadValue);
        }
        if let Some(value) = strip_prefix(body, "freq") {
            return value
                .parse::<u8>()
                .ok()
                .filter(|hz| (1..=MAX_REFRESH_HZ).contains(hz))
                .map(Message::SetRefreshHz)
                .ok_or(ParseError::BadValue);
        }
        if let Some(value) = strip_prefix(body, "led") {
            return value
                .parse::<u8>()
                .ok()
                .and_then(StatusCode::new)
                .map(Message::ShowCode)
                .ok_or(ParseError::BadValue);
        }

        Err(ParseError::Unknown)
    }

    /// Whether this message is a follower reply, which is never relayed.
    pub fn is_status(&self) -> bool {
        matches!(self, Message::Status(_))
    }
}

fn has_prefix(body: &str, prefix: &str) -> bool {
    body.get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

fn strip_prefix<'a>(body: &'a str, prefix: &str) -> Option<&'a str> {
    if has_prefix(body, prefix) {
        body.get(prefix.len()..).map(str::trim)
    } else {
        None
    }
}

fn parse_fraction(value: &str) -> Option<f32> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| (0.0..=1.0).contains(v))
}

impl fmt::Display for Message {
    /// Canonical body, parseable by [`Message::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Command(c) => f.write_str(c.verb()),
            Message::Query(role) => f.write_str(role.name()),
            Message::Status(s) => write!(f, "{}", s),
            Message::SetVolume(v) => write!(f, "vol{}", v),
            Message::SetPwmRange(r) => write!(f, "pwm{}", *r as f32 / 255.0),
            Message::SetRefreshHz(hz) => write!(f, "freq{}", hz),
            Message::ShowCode(code) => write!(f, "led{}", code.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::string::ToString;

    #[test]
    fn verbs_and_bytes_decode_to_commands() {
        assert_eq!(Message::parse("play"), Ok(Message::Command(Command::Play)));
        assert_eq!(Message::parse("PLAY"), Ok(Message::Command(Command::Play)));
        assert_eq!(Message::parse("p"), Ok(Message::Command(Command::Play)));
        assert_eq!(Message::parse("wakeup"), Ok(Message::Command(Command::Wakeup)));
        assert_eq!(Message::parse("help"), Ok(Message::Command(Command::Help)));
        assert_eq!(Message::parse("h"), Ok(Message::Command(Command::Help)));
        assert_eq!(Message::parse(" report "), Ok(Message::Command(Command::Report)));
    }

    #[test]
    fn queries() {
        assert_eq!(Message::parse("small"), Ok(Message::Query(Role::SmallFollower)));
        assert_eq!(
            Message::parse("Seashell"),
            Ok(Message::Query(Role::SeashellFollower))
        );
        assert_eq!(Message::parse("long"), Err(ParseError::Unknown));
    }

    #[test]
    fn parameterized_settings() {
        assert_eq!(Message::parse("vol0.8"), Ok(Message::SetVolume(0.8)));
        assert_eq!(Message::parse("vol1"), Ok(Message::SetVolume(1.0)));
        assert_eq!(Message::parse("vol1.2"), Err(ParseError::BadValue));
        assert_eq!(Message::parse("vol"), Err(ParseError::BadValue));
        assert_eq!(Message::parse("pwm0.5"), Ok(Message::SetPwmRange(127)));
        assert_eq!(Message::parse("pwm1.0"), Ok(Message::SetPwmRange(255)));
        assert_eq!(Message::parse("freq25"), Ok(Message::SetRefreshHz(25)));
        assert_eq!(Message::parse("freq0"), Err(ParseError::BadValue));
        assert_eq!(Message::parse("freq101"), Err(ParseError::BadValue));
        assert_eq!(
            Message::parse("led13"),
            Ok(Message::ShowCode(StatusCode::CODEC_FAULT))
        );
        assert_eq!(Message::parse("led16"), Err(ParseError::BadValue));
    }

    #[test]
    fn step_verbs_are_not_mistaken_for_settings() {
        assert_eq!(Message::parse("volup"), Ok(Message::Command(Command::VolUp)));
        assert_eq!(Message::parse("pwmdown"), Ok(Message::Command(Command::PwmDown)));
    }

    #[test]
    fn status_reply() {
        let m = Message::parse("STATUS|2|23.5|1|0|0|0").unwrap();
        assert!(m.is_status());
        match m {
            Message::Status(s) => {
                assert_eq!(s.id, 2);
                assert_eq!(s.temp_c, 23.5);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            Message::parse("STATUS|2|23.5"),
            Err(ParseError::BadStatus(StatusError::FieldCount))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(Message::parse(""), Err(ParseError::Empty));
        assert_eq!(Message::parse("   "), Err(ParseError::Empty));
        assert_eq!(Message::parse("x"), Err(ParseError::Unknown));
        assert_eq!(Message::parse("dance"), Err(ParseError::Unknown));
        assert_eq!(Message::parse_bytes(&[0xff, 0xfe]), Err(ParseError::NotUtf8));
        // Multi-byte UTF-8 must not split inside a character.
        assert_eq!(Message::parse("vøl"), Err(ParseError::Unknown));
    }

    #[test]
    fn canonical_bodies() {
        assert_eq!(Message::Command(Command::Sleep).to_string(), "sleep");
        assert_eq!(Message::Query(Role::SmallFollower).to_string(), "small");
        assert_eq!(Message::SetRefreshHz(40).to_string(), "freq40");
        assert_eq!(Message::ShowCode(StatusCode::PLAYING).to_string(), "led8");
    }
}
