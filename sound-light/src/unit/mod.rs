//! The per-unit control loop.
//!
//! [`Unit::boot`] resolves the role, checks the configuration and brings the
//! outputs to a known state. [`Unit::tick`] is then called from the main
//! loop as often as possible; it never blocks except for the relay settle
//! delays of a power transition.
//!
//! One tick runs, in order:
//!
//! ```text
//!   playback bookkeeping   playing flag follows the engine
//!   schedule               leader only: wall clock -> WAKEUP / SLEEP
//!   inbound                console, then link (bounded per tick)
//!   role action            leader: PLAY retry, status polling, re-assertion
//!   outputs                status LEDs, envelope PWM
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::audio::AudioEngine;
use crate::board::{Hardware, Platform};
use crate::clock::{Clock, WallTime};
use crate::config::{ConfigError, UnitConfig};
use crate::envelope::PwmDriver;
use crate::fault::{BootError, BootFailure};
use crate::indicator::{StatusCode, StatusLeds};
use crate::protocol::{LinkReceiver, StatusReport};
use crate::relay::RelaySequencer;
use crate::role::{Role, StrapPins};
use crate::schedule::WakeSchedule;
use crate::state::SystemState;
use crate::Millis;

mod dispatch;
mod follower;
mod leader;


use follower::FollowerState;
use leader::LeaderState;

/// Number of strip flashes at boot.
const BOOT_FLASHES: u32 = 4;

/// Half period of a boot flash.
const BOOT_FLASH_MS: u32 = 50;

enum RoleState {
    Leader(LeaderState),
    Follower(FollowerState),
}

/// One installed unit: its peripherals, state and role.
pub struct Unit<P: Platform> {
    role: Role,
    config: UnitConfig,
    state: SystemState,
    audio: P::Audio,
    clock: Option<P::Clock>,
    thermometer: P::Thermometer,
    link: P::Link,
    console: P::Console,
    relays: RelaySequencer<P::AmpRelay, P::SpeakerRelay>,
    leds: StatusLeds<P::Led>,
    pwm: PwmDriver<P::Pwm>,
    delay: P::Delay,
    link_rx: LinkReceiver,
    console_rx: LinkReceiver,
    schedule: WakeSchedule,
    role_state: RoleState,
    /// Code last derived from awake/playing. The LEDs are rewritten only when
    /// it changes, so a code set by hand stays up until the state moves.
    derived: Option<StatusCode>,
}

impl<P: Platform> Unit<P> {
    /// Identify the unit and bring it up asleep.
    ///
    /// On failure the peripherals are handed back inside [`BootFailure`] so
    /// the caller can [`halt`](BootFailure::halt) with the fault code.
    pub fn boot<L, S, H>(
        config: UnitConfig,
        straps: &mut StrapPins<L, S, H>,
        mut hardware: Hardware<P>,
    ) -> Result<Self, BootFailure<P>>
    where
        L: InputPin,
        S: InputPin,
        H: InputPin,
    {
        let role = match preflight(&config, straps, &mut hardware) {
            Ok(role) => role,
            Err(error) => {
                error!("boot failed: {:?}", error);
                return Err(BootFailure { error, hardware });
            }
        };
        info!("booting as {} ({})", role.name(), role.file_name());

        let Hardware {
            mut audio,
            clock,
            thermometer,
            link,
            console,
            amp,
            speaker,
            leds,
            pwm,
            delay,
        } = hardware;

        let mut relays = RelaySequencer::new(amp, speaker, config.relay_settle_ms);
        if relays.release().is_err() {
            error!("could not open relays at boot");
        }

        let state = SystemState::new(&config);
        audio.set_volume(state.volume);

        let mut unit = Self {
            role,
            state,
            audio,
            clock: if role.is_leader() { clock } else { None },
            thermometer,
            link,
            console,
            relays,
            leds: StatusLeds::new(leds),
            pwm: PwmDriver::new(pwm, config.envelope_mode),
            delay,
            link_rx: LinkReceiver::new(config.frame_timeout_ms),
            console_rx: LinkReceiver::new(config.frame_timeout_ms),
            schedule: WakeSchedule::new(
                config.start_hour,
                config.end_hour,
                config.schedule_poll_ms,
            ),
            role_state: if role.is_leader() {
                RoleState::Leader(LeaderState::new(&config))
            } else {
                RoleState::Follower(FollowerState::default())
            },
            derived: None,
            config,
        };

        unit.flash_strip();
        unit.show_derived();
        Ok(unit)
    }

    /// Run one control-loop iteration.
    pub fn tick(&mut self, now: Millis) {
        self.track_playback();
        if self.role.is_leader() {
            self.run_schedule(now);
        }
        self.service_console(now);
        match self.role_state {
            RoleState::Leader(_) => {
                self.drain_followers(now);
                self.lead(now);
            }
            RoleState::Follower(_) => self.follow(now),
        }
        self.update_outputs(now);
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Code on the status LEDs.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.leds.shown()
    }

    /// Last value written to the LED strip.
    pub fn pwm_output(&self) -> Option<u8> {
        self.pwm.output()
    }

    /// Last status reply from `follower` (leader only).
    pub fn follower_status(&self, follower: Role) -> Option<StatusReport> {
        match &self.role_state {
            RoleState::Leader(lead) => lead.status(follower),
            RoleState::Follower(_) => None,
        }
    }

    // ── Outputs ───────────────────────────────────────────────────────

    /// Pulse the strip so an installer can see the MOSFET stage works.
    fn flash_strip(&mut self) {
        for _ in 0..BOOT_FLASHES {
            self.pwm.write(1);
            self.delay.delay_ms(BOOT_FLASH_MS);
            self.pwm.write(0);
            self.delay.delay_ms(BOOT_FLASH_MS);
        }
    }

    fn show_derived(&mut self) {
        let code = StatusCode::for_state(self.state.awake, self.state.playing);
        if self.derived != Some(code) {
            self.derived = Some(code);
            self.leds.show(code);
        }
    }

    fn update_outputs(&mut self, now: Millis) {
        self.show_derived();
        if self.state.awake && self.state.playing {
            self.pwm.update(
                now,
                &mut self.audio,
                self.state.pwm_range,
                self.state.pwm_period_ms,
            );
        } else {
            self.pwm.off();
        }
    }

    /// Clear `playing` once the engine has reached the end of the file.
    fn track_playback(&mut self) {
        if self.state.playing && !self.audio.is_playing() {
            info!("playback of {} finished", self.role.file_name());
            self.state.playing = false;
        }
    }

    // ── Power ─────────────────────────────────────────────────────────

    fn wake(&mut self) {
        match self.relays.power_up(&mut self.state, &mut self.delay) {
            Ok(true) => {
                self.state.track_iteration = 0;
                self.leds.show(StatusCode::ACTIVE);
                // ACTIVE stays up until playback starts.
                self.derived = Some(StatusCode::AWAKE_IDLE);
                info!("system awake");
            }
            Ok(false) => {}
            Err(e) => error!("wake sequence failed: {:?}", e),
        }
    }

    fn sleep(&mut self) {
        match self.relays.power_down(
            &mut self.state,
            &mut self.audio,
            &mut self.pwm,
            &mut self.delay,
        ) {
            Ok(true) => info!("system asleep"),
            Ok(false) => {}
            Err(e) => error!("sleep sequence failed: {:?}", e),
        }
    }

    fn wall_time(&mut self) -> Option<WallTime> {
        self.clock.as_mut().and_then(|clock| clock.now().ok())
    }
}

fn preflight<P, L, S, H>(
    config: &UnitConfig,
    straps: &mut StrapPins<L, S, H>,
    hardware: &mut Hardware<P>,
) -> Result<Role, BootError>
where
    P: Platform,
    L: InputPin,
    S: InputPin,
    H: InputPin,
{
    let role = straps.resolve()?;
    config.validate()?;
    if role.is_leader() && hardware.clock.is_none() {
        return Err(ConfigError::MissingClock.into());
    }
    hardware.audio.init()?;
    Ok(role)
}
