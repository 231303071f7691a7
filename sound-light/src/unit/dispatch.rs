//! Command and message dispatch, shared by both roles.
//!
//! The console accepts the same input as the link. On the leader, console
//! input is also repeated to the followers: command bytes verbatim, framed
//! messages re-framed with a newline. Status replies are never repeated.

use core::fmt::Write as _;

use crate::audio::AudioEngine;
use crate::board::Platform;
use crate::protocol::{
    send_frame, Command, Inbound, Message, SerialWriter, StatusReport, UnknownCommand,
    MESSAGE_BUFFER_SIZE,
};
use crate::report::{Help, SystemReport};
use crate::role::Role;
use crate::Millis;

use super::{RoleState, Unit};

/// Port an inbound item arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Source {
    Console,
    Link,
}

impl Source {
    fn name(self) -> &'static str {
        match self {
            Source::Console => "console",
            Source::Link => "link",
        }
    }
}

impl<P: Platform> Unit<P> {
    /// Handle at most one console item.
    pub(super) fn service_console(&mut self, now: Millis) {
        if let Some(item) = self.console_rx.poll(&mut self.console, now) {
            self.handle_inbound(item, Source::Console, now);
        }
    }

    pub(super) fn handle_inbound(
        &mut self,
        item: Inbound<MESSAGE_BUFFER_SIZE>,
        source: Source,
        now: Millis,
    ) {
        let repeat = source == Source::Console && self.role.is_leader();

        match item {
            Inbound::Command(byte) => match Command::try_from(byte) {
                Ok(command) => {
                    info!("{} command '{}'", source.name(), command.verb());
                    self.execute(command);
                    if repeat {
                        let mut link = SerialWriter::new(&mut self.link);
                        if link.write_bytes(&[byte]).is_err() {
                            error!("link write failed");
                        }
                    }
                }
                Err(UnknownCommand(byte)) => {
                    warn!("unknown {} command byte {}", source.name(), byte)
                }
            },
            Inbound::Message(frame) => match Message::parse_bytes(frame.as_bytes()) {
                Ok(message) => {
                    info!("{} message {:?}", source.name(), message);
                    self.apply(message, now);
                    if repeat
                        && !message.is_status()
                        && send_frame(&mut self.link, frame.as_bytes()).is_err()
                    {
                        error!("link write failed");
                    }
                }
                Err(e) => warn!("ignoring {} message: {:?}", source.name(), e),
            },
        }
    }

    /// Apply a decoded framed message.
    pub(super) fn apply(&mut self, message: Message, now: Millis) {
        match message {
            Message::Command(command) => self.execute(command),
            Message::Query(role) => self.answer_query(role, now),
            Message::Status(report) => {
                if self.role.is_leader() {
                    self.record_status(report);
                } else {
                    trace!("ignoring status from player {}", report.id);
                }
            }
            Message::SetVolume(volume) => {
                if self.state.set_volume(volume) {
                    self.audio.set_volume(volume);
                    info!("volume set to {}", volume);
                }
            }
            Message::SetPwmRange(range) => {
                self.state.pwm_range = range;
                info!("PWM range set to {}", range);
            }
            Message::SetRefreshHz(hz) => {
                self.state.pwm_period_ms = 1_000 / u32::from(hz.max(1));
                info!("PWM refresh {} Hz", hz);
            }
            Message::ShowCode(code) => self.leds.show(code),
        }
    }

    /// Execute one command locally.
    pub(super) fn execute(&mut self, command: Command) {
        match command {
            Command::Wakeup => self.wake(),
            Command::Sleep => self.sleep(),
            Command::Play => {
                if self.state.awake {
                    self.start_playback();
                } else {
                    warn!("PLAY refused while asleep");
                }
            }
            Command::Stop => {
                self.audio.stop();
                self.state.playing = false;
                info!("playback stopped");
            }
            Command::Replay => {
                if self.state.awake {
                    self.audio.stop();
                    self.state.playing = false;
                    self.start_playback();
                } else {
                    warn!("REPLAY refused while asleep");
                }
            }
            Command::Mute => {
                self.state.volume = 0.0;
                self.audio.set_volume(0.0);
                info!("muted");
            }
            Command::Led1 | Command::Led2 | Command::Led3 | Command::Led4 => {
                if let Some(led) = command.led() {
                    let code = self.leds.toggle(led);
                    debug!("LED {} toggled, code {}", led, code.value());
                }
            }
            Command::VolUp => {
                let volume = self.state.volume_up();
                self.audio.set_volume(volume);
                info!("volume {}", volume);
            }
            Command::VolDown => {
                let volume = self.state.volume_down();
                self.audio.set_volume(volume);
                info!("volume {}", volume);
            }
            Command::PwmUp => {
                let range = self.state.pwm_up();
                info!("PWM range {}", range);
            }
            Command::PwmDown => {
                let range = self.state.pwm_down();
                info!("PWM range {}", range);
            }
            Command::Report => self.write_report(),
            Command::Help => self.write_help(),
        }
    }

    /// Start (or restart) the role's file.
    pub(super) fn start_playback(&mut self) {
        let file = self.role.file_name();
        match self.audio.play(file) {
            Ok(()) => {
                self.state.playing = true;
                self.state.track_iteration = self.state.track_iteration.wrapping_add(1);
                info!(
                    "start playing {}, iteration {}",
                    file, self.state.track_iteration
                );
            }
            Err(_) => error!("could not play {}", file),
        }
    }

    fn write_report(&mut self) {
        let time = self.wall_time();
        let position_ms = self.audio.position_ms();
        let length_ms = self.audio.length_ms();
        let statuses = match &self.role_state {
            RoleState::Leader(lead) => Some(lead.statuses()),
            RoleState::Follower(_) => None,
        };
        let followers: &[(Role, Option<StatusReport>)] = match &statuses {
            Some(list) => list,
            None => &[],
        };

        let report = SystemReport {
            role: self.role,
            state: &self.state,
            config: &self.config,
            envelope: self.pwm.mode(),
            position_ms,
            length_ms,
            indicator: self.leds.shown(),
            time,
            followers,
        };
        let mut out = SerialWriter::new(&mut self.console);
        if write!(out, "{}", report).is_err() {
            error!("console write failed");
        }
    }

    fn write_help(&mut self) {
        let mut out = SerialWriter::new(&mut self.console);
        if write!(out, "{}", Help).is_err() {
            error!("console write failed");
        }
    }
}
