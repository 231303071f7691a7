//! Follower role: one link item per tick, status replies on request.

use crate::audio::AudioEngine;
use crate::board::Platform;
use crate::clock::Thermometer;
use crate::protocol::{send_message, Message, StatusReport};
use crate::role::Role;
use crate::Millis;

use super::dispatch::Source;
use super::{RoleState, Unit};

#[derive(Debug, Default)]
pub(super) struct FollowerState {
    /// Start of the window in which link traffic is discarded because the
    /// leader is talking to the other follower.
    quiet_since: Option<Millis>,
}

impl<P: Platform> Unit<P> {
    pub(super) fn follow(&mut self, now: Millis) {
        let RoleState::Follower(follower) = &mut self.role_state else {
            return;
        };

        if let Some(since) = follower.quiet_since {
            if now.wrapping_sub(since) < self.config.query_quiet_ms {
                let dropped = self.link_rx.discard(&mut self.link);
                if dropped > 0 {
                    trace!("quiet window: dropped {} bytes", dropped);
                }
                return;
            }
            follower.quiet_since = None;
        }

        if let Some(item) = self.link_rx.poll(&mut self.link, now) {
            self.handle_inbound(item, Source::Link, now);
        }
    }

    /// React to a status query broadcast by the leader.
    pub(super) fn answer_query(&mut self, addressed: Role, now: Millis) {
        let RoleState::Follower(follower) = &mut self.role_state else {
            return;
        };

        if addressed == self.role {
            let report = StatusReport {
                id: self.role.id(),
                temp_c: self.thermometer.celsius(),
                awake: self.state.awake,
                playing: self.state.playing,
                position_ms: self.audio.position_ms(),
                length_ms: self.audio.length_ms(),
            };
            info!("answering status query");
            if send_message(&mut self.link, &Message::Status(report)).is_err() {
                error!("link write failed");
            }
        } else {
            debug!("query for {}, going quiet", addressed.name());
            follower.quiet_since = Some(now);
            self.link_rx.reset();
        }
    }
}
