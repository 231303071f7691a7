//! Amplifier / speaker relay sequencing.
//!
//! Power-up closes the amplifier relay first and the speaker relay second;
//! power-down opens them in the reverse order, with a settle delay after
//! every switch. The speaker relay is never closed while the amplifier relay
//! is open, including when a pin write fails half way.
//!
//! ```text
//!   power_up:   AMP on ─ settle ─ SPK on ─ settle ─ awake
//!   power_down: stop audio, PWM 0 ─ SPK off ─ settle ─ AMP off ─ settle ─ asleep
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::audio::AudioEngine;
use crate::envelope::PwmDriver;
use crate::state::SystemState;

/// Relay step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError {
    /// The amplifier relay pin could not be driven.
    Amplifier,
    /// The speaker relay pin could not be driven.
    Speaker,
}

/// Owns the two relay outputs.
pub struct RelaySequencer<AMP, SPK> {
    amp: AMP,
    speaker: SPK,
    settle_ms: u32,
}

impl<AMP, SPK> RelaySequencer<AMP, SPK>
where
    AMP: OutputPin,
    SPK: OutputPin,
{
    pub fn new(amp: AMP, speaker: SPK, settle_ms: u32) -> Self {
        Self {
            amp,
            speaker,
            settle_ms,
        }
    }

    /// Open both relays without delays, speaker first. Boot only.
    pub fn release(&mut self) -> Result<(), RelayError> {
        open_relays(&mut self.amp, &mut self.speaker)
    }

    /// Switch amplifier then speaker on.
    ///
    /// Returns `Ok(false)` without touching the pins when already awake.
    /// On a failed step the relays that were closed are opened again and
    /// the unit stays asleep. If the speaker relay cannot be opened again the
    /// amplifier is left on.
    pub fn power_up<D: DelayNs>(
        &mut self,
        state: &mut SystemState,
        delay: &mut D,
    ) -> Result<bool, RelayError> {
        if state.awake {
            debug!("power up skipped: already awake");
            return Ok(false);
        }

        if let Err(e) = self.amp.set_high() {
            error!("amp relay on failed: {:?}", e.kind());
            if let Err(e) = self.amp.set_low() {
                error!("amp relay roll-back failed: {:?}", e.kind());
            }
            return Err(RelayError::Amplifier);
        }
        info!("amp is ON");
        delay.delay_ms(self.settle_ms);

        if let Err(e) = self.speaker.set_high() {
            error!("speaker relay on failed: {:?}", e.kind());
            if let Err(e) = self.speaker.set_low() {
                // Speaker state unknown: leave the amplifier powered.
                error!("speaker relay roll-back failed: {:?}", e.kind());
                return Err(RelayError::Speaker);
            }
            delay.delay_ms(self.settle_ms);
            if let Err(e) = self.amp.set_low() {
                error!("amp relay roll-back failed: {:?}", e.kind());
            }
            return Err(RelayError::Speaker);
        }
        info!("speaker is ON");
        delay.delay_ms(self.settle_ms);

        state.awake = true;
        Ok(true)
    }

    /// Stop playback, blank the LED strip, then switch speaker and amplifier
    /// off.
    ///
    /// Returns `Ok(false)` when already asleep. If the speaker relay cannot be
    /// opened the amplifier is left powered and the unit stays awake, so a
    /// later SLEEP retries the whole sequence.
    pub fn power_down<D, A, P>(
        &mut self,
        state: &mut SystemState,
        audio: &mut A,
        pwm: &mut PwmDriver<P>,
        delay: &mut D,
    ) -> Result<bool, RelayError>
    where
        D: DelayNs,
        A: AudioEngine,
        P: SetDutyCycle,
    {
        if !state.awake {
            debug!("power down skipped: already asleep");
            return Ok(false);
        }

        audio.stop();
        state.playing = false;
        pwm.off();

        if let Err(e) = self.speaker.set_low() {
            error!("speaker relay off failed: {:?}", e.kind());
            return Err(RelayError::Speaker);
        }
        info!("speaker is OFF");
        delay.delay_ms(self.settle_ms);

        if let Err(e) = self.amp.set_low() {
            // Speaker is already open, so a stuck amplifier is not a hazard.
            error!("amp relay off failed: {:?}", e.kind());
        } else {
            info!("amp is OFF");
        }
        delay.delay_ms(self.settle_ms);

        state.awake = false;
        Ok(true)
    }
}

/// Open the speaker relay, then the amplifier relay, without settle delays.
///
/// The amplifier is left alone when the speaker relay cannot be opened.
pub fn open_relays<AMP, SPK>(amp: &mut AMP, speaker: &mut SPK) -> Result<(), RelayError>
where
    AMP: OutputPin,
    SPK: OutputPin,
{
    if let Err(e) = speaker.set_low() {
        error!("speaker relay off failed: {:?}", e.kind());
        return Err(RelayError::Speaker);
    }
    if let Err(e) = amp.set_low() {
        error!("amp relay off failed: {:?}", e.kind());
        return Err(RelayError::Amplifier);
    }
    Ok(())
}
