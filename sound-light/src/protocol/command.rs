//! Single-byte commands.

use core::fmt;

/// A command carried as one byte on the link or console, or by name inside
/// a framed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Wakeup,
    Sleep,
    Play,
    Stop,
    Replay,
    Mute,
    Led1,
    Led2,
    Led3,
    Led4,
    VolUp,
    VolDown,
    PwmUp,
    PwmDown,
    Report,
    Help,
}

/// Byte that does not map to any [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownCommand(pub u8);

impl Command {
    pub const ALL: [Command; 16] = [
        Command::Wakeup,
        Command::Sleep,
        Command::Play,
        Command::Stop,
        Command::Replay,
        Command::Mute,
        Command::Led1,
        Command::Led2,
        Command::Led3,
        Command::Led4,
        Command::VolUp,
        Command::VolDown,
        Command::PwmUp,
        Command::PwmDown,
        Command::Report,
        Command::Help,
    ];

    /// Wire byte.
    pub const fn code(self) -> u8 {
        match self {
            Command::Wakeup => b'w',
            Command::Sleep => b's',
            Command::Play => b'p',
            Command::Stop => b'!',
            Command::Replay => b'z',
            Command::Mute => b'm',
            Command::Led1 => b'1',
            Command::Led2 => b'2',
            Command::Led3 => b'3',
            Command::Led4 => b'4',
            Command::VolUp => b'+',
            Command::VolDown => b'-',
            Command::PwmUp => b'>',
            Command::PwmDown => b'<',
            Command::Report => b'r',
            Command::Help => b'h',
        }
    }

    /// Verb used for the command inside a framed message.
    pub const fn verb(self) -> &'static str {
        match self {
            Command::Wakeup => "wakeup",
            Command::Sleep => "sleep",
            Command::Play => "play",
            Command::Stop => "stop",
            Command::Replay => "replay",
            Command::Mute => "mute",
            Command::Led1 => "toggle1",
            Command::Led2 => "toggle2",
            Command::Led3 => "toggle3",
            Command::Led4 => "toggle4",
            Command::VolUp => "volup",
            Command::VolDown => "voldown",
            Command::PwmUp => "pwmup",
            Command::PwmDown => "pwmdown",
            Command::Report => "report",
            Command::Help => "help",
        }
    }

    /// One-line description for the help screen.
    pub const fn description(self) -> &'static str {
        match self {
            Command::Wakeup => "Wake up system",
            Command::Sleep => "Put system to sleep",
            Command::Play => "Play audio",
            Command::Stop => "Stop audio",
            Command::Replay => "Reset and replay audio",
            Command::Mute => "Mute audio",
            Command::Led1 => "Toggle LED 1",
            Command::Led2 => "Toggle LED 2",
            Command::Led3 => "Toggle LED 3",
            Command::Led4 => "Toggle LED 4",
            Command::VolUp => "Increase volume",
            Command::VolDown => "Decrease volume",
            Command::PwmUp => "Increase PWM range",
            Command::PwmDown => "Decrease PWM range",
            Command::Report => "Generate system report",
            Command::Help => "Display this help message",
        }
    }

    /// Look up a message verb, ignoring ASCII case.
    pub fn from_verb(verb: &str) -> Option<Command> {
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.verb().eq_ignore_ascii_case(verb))
    }

    /// LED index (1..=4) for the LED toggles.
    pub const fn led(self) -> Option<u8> {
        match self {
            Command::Led1 => Some(1),
            Command::Led2 => Some(2),
            Command::Led3 => Some(3),
            Command::Led4 => Some(4),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    /// Decode a wire byte. Letters are accepted in either case.
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let lower = byte.to_ascii_lowercase();
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.code() == lower)
            .ok_or(UnknownCommand(byte))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
