//! Unit identity from hardware strap pins.
//!
//! Each board has three strap inputs (LONG, SMALL, SEASHELL) and exactly one
//! of them is tied high. The role is read once at boot and never changes.

use embedded_hal::digital::InputPin;

/// Role of a unit in the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// LONG unit: owns the wall clock and the daily schedule.
    Leader,
    /// SMALL unit.
    SmallFollower,
    /// SEASHELL unit.
    SeashellFollower,
}

impl Role {
    /// Numeric player id used on the wire (`STATUS|id|...`).
    pub const fn id(self) -> u8 {
        match self {
            Role::Leader => 0,
            Role::SmallFollower => 1,
            Role::SeashellFollower => 2,
        }
    }

    /// Inverse of [`Role::id`].
    pub const fn from_id(id: u8) -> Option<Role> {
        match id {
            0 => Some(Role::Leader),
            1 => Some(Role::SmallFollower),
            2 => Some(Role::SeashellFollower),
            _ => None,
        }
    }

    /// Audio file bound to the role on the SD card.
    pub const fn file_name(self) -> &'static str {
        match self {
            Role::Leader => "LONG.WAV",
            Role::SmallFollower => "SMALL.WAV",
            Role::SeashellFollower => "SEASHELL.WAV",
        }
    }

    /// Short name, also the query verb addressing a follower.
    pub const fn name(self) -> &'static str {
        match self {
            Role::Leader => "long",
            Role::SmallFollower => "small",
            Role::SeashellFollower => "seashell",
        }
    }

    pub const fn is_leader(self) -> bool {
        matches!(self, Role::Leader)
    }
}

/// Why the strap pins did not identify a single role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoleError {
    /// No strap pin reads high.
    NoStrap,
    /// More than one strap pin reads high.
    Ambiguous { count: u8 },
    /// A strap pin could not be read.
    PinRead,
}

/// The three strap inputs of a board.
pub struct StrapPins<L, S, H> {
    pub long: L,
    pub small: S,
    pub seashell: H,
}

impl<L, S, H> StrapPins<L, S, H>
where
    L: InputPin,
    S: InputPin,
    H: InputPin,
{
    pub fn new(long: L, small: S, seashell: H) -> Self {
        Self { long, small, seashell }
    }

    /// Read all three straps and return the single role tied high.
    ///
    /// Zero or several high straps is a wiring fault and is reported rather
    /// than resolved by pin priority.
    pub fn resolve(&mut self) -> Result<Role, RoleError> {
        let long = self.long.is_high().map_err(|_| RoleError::PinRead)?;
        let small = self.small.is_high().map_err(|_| RoleError::PinRead)?;
        let seashell = self.seashell.is_high().map_err(|_| RoleError::PinRead)?;

        let readings = [
            (long, Role::Leader),
            (small, Role::SmallFollower),
            (seashell, Role::SeashellFollower),
        ];
        let count = readings.iter().filter(|(high, _)| *high).count() as u8;

        match count {
            0 => Err(RoleError::NoStrap),
            1 => readings
                .iter()
                .find(|(high, _)| *high)
                .map(|(_, role)| *role)
                .ok_or(RoleError::NoStrap),
            _ => Err(RoleError::Ambiguous { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BrokenPin, StrapPin};

    fn straps(long: bool, small: bool, seashell: bool) -> StrapPins<StrapPin, StrapPin, StrapPin> {
        StrapPins::new(StrapPin(long), StrapPin(small), StrapPin(seashell))
    }

    #[test]
    fn single_strap_selects_role() {
        assert_eq!(straps(true, false, false).resolve(), Ok(Role::Leader));
        assert_eq!(straps(false, true, false).resolve(), Ok(Role::SmallFollower));
        assert_eq!(straps(false, false, true).resolve(), Ok(Role::SeashellFollower));
    }

    #[test]
    fn no_strap_is_fatal() {
        assert_eq!(straps(false, false, false).resolve(), Err(RoleError::NoStrap));
    }

    #[test]
    fn multiple_straps_are_fatal() {
        assert_eq!(
            straps(true, true, false).resolve(),
            Err(RoleError::Ambiguous { count: 2 })
        );
        assert_eq!(
            straps(true, true, true).resolve(),
            Err(RoleError::Ambiguous { count: 3 })
        );
    }

    #[test]
    fn unreadable_pin() {
        let mut pins = StrapPins::new(StrapPin(true), BrokenPin, StrapPin(false));
        assert_eq!(pins.resolve(), Err(RoleError::PinRead));
    }

    #[test]
    fn file_names_and_ids() {
        assert_eq!(Role::Leader.file_name(), "LONG.WAV");
        assert_eq!(Role::SmallFollower.file_name(), "SMALL.WAV");
        assert_eq!(Role::SeashellFollower.file_name(), "SEASHELL.WAV");
        for role in [Role::Leader, Role::SmallFollower, Role::SeashellFollower] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(3), None);
    }
}
