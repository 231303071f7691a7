//! Leader role: schedule, broadcasts and follower supervision.
//!
//! Broadcasts are fire-and-forget. Lost commands are repaired by the leader
//! itself: PLAY is retried while the system is awake and silent, and the
//! current WAKEUP/SLEEP state is re-sent periodically.

use crate::board::Platform;
use crate::config::UnitConfig;
use crate::protocol::{send_message, Command, Inbound, Message, StatusReport};
use crate::role::Role;
use crate::schedule::Transition;
use crate::Millis;

use super::{RoleState, Unit};

/// Upper bound on link items handled per tick.
pub(super) const DRAIN_LIMIT: usize = 4;

const FOLLOWERS: [Role; 2] = [Role::SmallFollower, Role::SeashellFollower];

/// Self-resetting interval timer; a zero period never fires.
#[derive(Debug, Clone, Copy)]
struct Interval {
    period: Millis,
    last: Option<Millis>,
    /// Fire on the first check instead of arming.
    eager: bool,
}

impl Interval {
    fn eager(period: Millis) -> Self {
        Self {
            period,
            last: None,
            eager: true,
        }
    }

    fn lazy(period: Millis) -> Self {
        Self {
            period,
            last: None,
            eager: false,
        }
    }

    fn due(&mut self, now: Millis) -> bool {
        if self.period == 0 {
            return false;
        }
        match self.last {
            None => {
                self.last = Some(now);
                self.eager
            }
            Some(last) if now.wrapping_sub(last) >= self.period => {
                self.last = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

pub(super) struct LeaderState {
    play_retry: Interval,
    status_poll: Interval,
    reassert: Interval,
    /// Follower addressed by the next status query.
    next_query: usize,
    followers: [Option<StatusReport>; 2],
}

impl LeaderState {
    pub(super) fn new(config: &UnitConfig) -> Self {
        Self {
            play_retry: Interval::eager(config.play_retry_ms),
            status_poll: Interval::lazy(config.status_poll_ms),
            reassert: Interval::lazy(config.reassert_ms),
            next_query: 0,
            followers: [None; 2],
        }
    }

    pub(super) fn status(&self, follower: Role) -> Option<StatusReport> {
        slot(follower).and_then(|i| self.followers[i])
    }

    pub(super) fn statuses(&self) -> [(Role, Option<StatusReport>); 2] {
        [
            (FOLLOWERS[0], self.followers[0]),
            (FOLLOWERS[1], self.followers[1]),
        ]
    }
}

fn slot(follower: Role) -> Option<usize> {
    FOLLOWERS.iter().position(|&r| r == follower)
}

impl<P: Platform> Unit<P> {
    /// Act on a wall-clock transition of the active window.
    pub(super) fn run_schedule(&mut self, now: Millis) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        let Some(transition) = self.schedule.poll(now, clock) else {
            return;
        };

        // An edge is only confirmed once the relays followed it; a failed
        // sequence is retried at the next schedule poll.
        match transition {
            Transition::Wake => {
                self.wake();
                if !self.state.awake {
                    warn!("wake failed, retrying at next schedule poll");
                    return;
                }
                self.broadcast(&Message::Command(Command::Wakeup));
                if let RoleState::Leader(lead) = &mut self.role_state {
                    // First PLAY goes out right away.
                    lead.play_retry.reset();
                }
            }
            Transition::Sleep => {
                self.sleep();
                if self.state.awake {
                    warn!("sleep failed, retrying at next schedule poll");
                    return;
                }
                self.broadcast(&Message::Command(Command::Sleep));
            }
        }
        self.schedule.confirm(transition);
    }

    /// Handle follower replies waiting on the link.
    pub(super) fn drain_followers(&mut self, now: Millis) {
        for _ in 0..DRAIN_LIMIT {
            let Some(item) = self.link_rx.poll(&mut self.link, now) else {
                break;
            };
            match item {
                Inbound::Message(frame) => match Message::parse_bytes(frame.as_bytes()) {
                    Ok(Message::Status(report)) => self.record_status(report),
                    Ok(_) => debug!("ignoring non-status link message"),
                    Err(e) => warn!("malformed link message: {:?}", e),
                },
                Inbound::Command(byte) => debug!("ignoring link byte {}", byte),
            }
        }
    }

    /// PLAY retry, status polling and state re-assertion.
    pub(super) fn lead(&mut self, now: Millis) {
        let RoleState::Leader(lead) = &mut self.role_state else {
            return;
        };

        let retry_play = self.state.awake && !self.state.playing && lead.play_retry.due(now);
        let query = if lead.status_poll.due(now) {
            let follower = FOLLOWERS[lead.next_query];
            lead.next_query = (lead.next_query + 1) % FOLLOWERS.len();
            Some(follower)
        } else {
            None
        };
        let reassert = lead.reassert.due(now);

        if retry_play {
            info!("no local playback, sending PLAY");
            self.broadcast(&Message::Command(Command::Play));
            self.start_playback();
        }
        if let Some(follower) = query {
            debug!("querying {}", follower.name());
            self.broadcast(&Message::Query(follower));
        }
        if reassert {
            let command = if self.state.awake {
                Command::Wakeup
            } else {
                Command::Sleep
            };
            debug!("re-asserting {}", command.verb());
            self.broadcast(&Message::Command(command));
        }
    }

    /// Send a framed message to every follower.
    pub(super) fn broadcast(&mut self, message: &Message) {
        if send_message(&mut self.link, message).is_err() {
            error!("link write failed");
        }
    }

    pub(super) fn record_status(&mut self, report: StatusReport) {
        let RoleState::Leader(lead) = &mut self.role_state else {
            return;
        };
        let Some(i) = report.role().and_then(slot) else {
            warn!("status from unknown player {}", report.id);
            return;
        };
        info!(
            "status from {}: awake {} playing {} at {} of {} ms",
            FOLLOWERS[i].name(),
            report.awake,
            report.playing,
            report.position_ms,
            report.length_ms
        );
        lead.followers[i] = Some(report);
    }
}
