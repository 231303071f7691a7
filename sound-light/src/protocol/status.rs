//! Follower status replies: `STATUS|id|temp|awake|playing|posMs|lenMs`.

use core::fmt;

use crate::role::Role;

/// Leading field of a status reply.
pub const STATUS_TAG: &str = "STATUS";

/// Field separator inside a status reply.
pub const STATUS_DELIMITER: char = '|';

const FIELD_COUNT: usize = 7;

/// Snapshot a follower sends in response to a query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// Player id of the sender (see [`Role::id`]).
    pub id: u8,
    /// Board temperature in °C.
    pub temp_c: f32,
    pub awake: bool,
    pub playing: bool,
    pub position_ms: u32,
    pub length_ms: u32,
}

/// Why a status reply was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Does not start with `STATUS`.
    NotStatus,
    /// Wrong number of fields.
    FieldCount,
    /// A field failed to parse; index counts from 1 after the tag.
    BadField(u8),
}

impl StatusReport {
    /// Role of the sender, `None` for an unknown id.
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.id)
    }

    /// Parse a status reply body (without the leading `:`).
    pub fn parse(body: &str) -> Result<StatusReport, StatusError> {
        let mut fields = body.trim().split(STATUS_DELIMITER);

        let tag = fields.next().unwrap_or("");
        if !tag.eq_ignore_ascii_case(STATUS_TAG) {
            return Err(StatusError::NotStatus);
        }

        let mut values = ["", "", "", "", "", ""];
        let mut count = 1;
        for field in fields {
            if count >= FIELD_COUNT {
                return Err(StatusError::FieldCount);
            }
            values[count - 1] = field.trim();
            count += 1;
        }
        if count != FIELD_COUNT {
            return Err(StatusError::FieldCount);
        }

        Ok(StatusReport {
            id: values[0].parse().map_err(|_| StatusError::BadField(1))?,
            temp_c: parse_temp(values[1]).ok_or(StatusError::BadField(2))?,
            awake: parse_flag(values[2]).ok_or(StatusError::BadField(3))?,
            playing: parse_flag(values[3]).ok_or(StatusError::BadField(4))?,
            position_ms: values[4].parse().map_err(|_| StatusError::BadField(5))?,
            length_ms: values[5].parse().map_err(|_| StatusError::BadField(6))?,
        })
    }
}

fn parse_temp(field: &str) -> Option<f32> {
    field.parse::<f32>().ok().filter(|t| t.is_finite())
}

fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{tag}|{}|{:.1}|{}|{}|{}|{}",
            self.id,
            self.temp_c,
            self.awake as u8,
            self.playing as u8,
            self.position_ms,
            self.length_ms,
            tag = STATUS_TAG,
        )
    }
}
