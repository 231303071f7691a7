/// Which envelope of the playing signal drives the LED strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnvelopeMode {
    /// Peak absolute sample since the last read.
    Peak,
    /// Root-mean-square level since the last read.
    Rms,
}

/// Fatal audio start-up failures, each with its own indicator code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioFault {
    /// SD card not readable.
    Storage,
    /// Audio codec did not respond.
    Codec,
}

/// WAV playback engine with envelope analyzers.
///
/// Implemented by the board on top of its SD card reader, I2S output and
/// peak/RMS analyzer nodes. Levels are normalized to 0.0..=1.0 and follow the
/// analyzer contract: `None` until a new block has been analyzed since the
/// previous read.
pub trait AudioEngine {
    /// Error type for playback operations.
    type Error: core::fmt::Debug;

    /// Bring up storage and codec. Called once at boot.
    fn init(&mut self) -> Result<(), AudioFault>;

    /// Start (or restart) playback of `file`.
    fn play(&mut self, file: &str) -> Result<(), Self::Error>;

    /// Stop playback immediately.
    fn stop(&mut self);

    /// Whether a file is currently playing.
    fn is_playing(&mut self) -> bool;

    /// Set the output volume (0.0 = silent, 1.0 = full scale).
    fn set_volume(&mut self, level: f32);

    /// Read the peak level if a new value is available.
    fn read_peak(&mut self) -> Option<f32>;

    /// Read the RMS level if a new value is available.
    fn read_rms(&mut self) -> Option<f32>;

    /// Playback position in milliseconds, 0 when stopped.
    fn position_ms(&mut self) -> u32;

    /// Length of the current file in milliseconds, 0 when stopped.
    fn length_ms(&mut self) -> u32;

    /// Read the envelope selected by `mode`.
    fn read_level(&mut self, mode: EnvelopeMode) -> Option<f32> {
        match mode {
            EnvelopeMode::Peak => self.read_peak(),
            EnvelopeMode::Rms => self.read_rms(),
        }
    }
}
