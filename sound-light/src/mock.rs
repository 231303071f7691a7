//! Software doubles for the board peripherals.
//!
//! Every output double appends to a shared [`Trace`], so a test can assert on
//! the exact interleaving of relay switches, delays, LED writes and audio
//! calls across peripherals.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use std::collections::VecDeque;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use embedded_hal_nb::serial;

use crate::audio::{AudioEngine, AudioFault};
use crate::board::{Hardware, Platform};
use crate::clock::{Clock, Thermometer, WallTime};
use crate::role::{Role, StrapPins};

// ── Event trace ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayId {
    Amp,
    Speaker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Relay(RelayId, bool),
    Led(u8, bool),
    Pwm(u8),
    DelayMs(u32),
    DelayNs(u32),
    Play,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn relay_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Relay(..)))
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.0.borrow().iter().filter(|e| *e == event).count()
    }
}

/// Panic if the speaker relay is ever closed while the amplifier relay is
/// open, or the amplifier opened while the speaker is closed.
pub fn assert_relay_ordering(events: &[Event]) {
    let mut amp = false;
    let mut speaker = false;
    for (i, event) in events.iter().enumerate() {
        match *event {
            Event::Relay(RelayId::Amp, on) => {
                assert!(on || !speaker, "amp opened with speaker live at event {}", i);
                amp = on;
            }
            Event::Relay(RelayId::Speaker, on) => {
                assert!(!on || amp, "speaker closed without amp at event {}", i);
                speaker = on;
            }
            _ => {}
        }
    }
}

// ── Pins ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

pub struct MockRelay {
    id: RelayId,
    trace: Trace,
}

impl MockRelay {
    pub fn new(id: RelayId, trace: &Trace) -> Self {
        Self {
            id,
            trace: trace.clone(),
        }
    }
}

impl ErrorType for MockRelay {
    type Error = Infallible;
}

impl OutputPin for MockRelay {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Relay(self.id, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Relay(self.id, true));
        Ok(())
    }
}

/// Fault switches shared between a test and a [`FlakyRelay`] that has moved
/// into a unit.
#[derive(Debug, Clone, Default)]
pub struct RelayFaults {
    high: Rc<Cell<bool>>,
    low: Rc<Cell<bool>>,
}

impl RelayFaults {
    pub fn fail_high(&self, fail: bool) {
        self.high.set(fail);
    }

    pub fn fail_low(&self, fail: bool) {
        self.low.set(fail);
    }
}

/// Relay whose driver can be made to fail. Failed writes leave no event.
pub struct FlakyRelay {
    id: RelayId,
    trace: Trace,
    faults: RelayFaults,
}

impl FlakyRelay {
    pub fn new(id: RelayId, trace: &Trace, faults: &RelayFaults) -> Self {
        Self {
            id,
            trace: trace.clone(),
            faults: faults.clone(),
        }
    }

    pub fn failing_high(id: RelayId, trace: &Trace) -> Self {
        let faults = RelayFaults::default();
        faults.fail_high(true);
        Self::new(id, trace, &faults)
    }

    pub fn failing_low(id: RelayId, trace: &Trace) -> Self {
        let faults = RelayFaults::default();
        faults.fail_low(true);
        Self::new(id, trace, &faults)
    }
}

impl ErrorType for FlakyRelay {
    type Error = MockPinError;
}

impl OutputPin for FlakyRelay {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        if self.faults.low.get() {
            return Err(MockPinError);
        }
        self.trace.push(Event::Relay(self.id, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        if self.faults.high.get() {
            return Err(MockPinError);
        }
        self.trace.push(Event::Relay(self.id, true));
        Ok(())
    }
}

pub struct MockLed {
    index: u8,
    trace: Trace,
}

impl MockLed {
    pub fn new(index: u8, trace: &Trace) -> Self {
        Self {
            index,
            trace: trace.clone(),
        }
    }
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Led(self.index, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.trace.push(Event::Led(self.index, true));
        Ok(())
    }
}

/// Strap input fixed at build time.
pub struct StrapPin(pub bool);

impl ErrorType for StrapPin {
    type Error = Infallible;
}

impl InputPin for StrapPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0)
    }
}

/// Input that cannot be read.
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = MockPinError;
}

impl InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, MockPinError> {
        Err(MockPinError)
    }

    fn is_low(&mut self) -> Result<bool, MockPinError> {
        Err(MockPinError)
    }
}

pub fn straps(role: Role) -> StrapPins<StrapPin, StrapPin, StrapPin> {
    StrapPins::new(
        StrapPin(role == Role::Leader),
        StrapPin(role == Role::SmallFollower),
        StrapPin(role == Role::SeashellFollower),
    )
}

// ── PWM / delay ───────────────────────────────────────────────────────

/// 8-bit PWM channel.
pub struct MockPwm {
    trace: Trace,
}

impl MockPwm {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.trace.push(Event::Pwm(duty as u8));
        Ok(())
    }
}

pub struct MockDelay {
    trace: Trace,
}

impl MockDelay {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.push(Event::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.push(Event::DelayMs(ms));
    }
}

// ── Audio engine ──────────────────────────────────────────────────────

struct AudioInner {
    init: Result<(), AudioFault>,
    fail_play: bool,
    playing: bool,
    file: Option<String>,
    volume: f32,
    peak: Option<f32>,
    rms: Option<f32>,
    position_ms: u32,
    length_ms: u32,
}

/// Audio engine double. Clones share state, so a test can keep a handle to
/// an engine it moved into a unit.
#[derive(Clone)]
pub struct MockAudio {
    trace: Trace,
    inner: Rc<RefCell<AudioInner>>,
}

impl MockAudio {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            inner: Rc::new(RefCell::new(AudioInner {
                init: Ok(()),
                fail_play: false,
                playing: false,
                file: None,
                volume: 0.0,
                peak: None,
                rms: None,
                position_ms: 0,
                length_ms: 0,
            })),
        }
    }

    pub fn failing_init(self, fault: AudioFault) -> Self {
        self.inner.borrow_mut().init = Err(fault);
        self
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.inner.borrow_mut().fail_play = fail;
    }

    pub fn push_peak(&self, level: f32) {
        self.inner.borrow_mut().peak = Some(level);
    }

    pub fn push_rms(&self, level: f32) {
        self.inner.borrow_mut().rms = Some(level);
    }

    /// Simulate the end of the file.
    pub fn finish(&self) {
        self.inner.borrow_mut().playing = false;
    }

    pub fn set_track(&self, position_ms: u32, length_ms: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.position_ms = position_ms;
        inner.length_ms = length_ms;
    }

    pub fn playing(&self) -> bool {
        self.inner.borrow().playing
    }

    pub fn file(&self) -> Option<String> {
        self.inner.borrow().file.clone()
    }

    pub fn volume(&self) -> f32 {
        self.inner.borrow().volume
    }
}

impl AudioEngine for MockAudio {
    type Error = ();

    fn init(&mut self) -> Result<(), AudioFault> {
        self.inner.borrow().init
    }

    fn play(&mut self, file: &str) -> Result<(), ()> {
        self.trace.push(Event::Play);
        let mut inner = self.inner.borrow_mut();
        if inner.fail_play {
            return Err(());
        }
        inner.playing = true;
        inner.file = Some(String::from(file));
        Ok(())
    }

    fn stop(&mut self) {
        self.trace.push(Event::Stop);
        self.inner.borrow_mut().playing = false;
    }

    fn is_playing(&mut self) -> bool {
        self.inner.borrow().playing
    }

    fn set_volume(&mut self, level: f32) {
        self.inner.borrow_mut().volume = level;
    }

    fn read_peak(&mut self) -> Option<f32> {
        self.inner.borrow_mut().peak.take()
    }

    fn read_rms(&mut self) -> Option<f32> {
        self.inner.borrow_mut().rms.take()
    }

    fn position_ms(&mut self) -> u32 {
        let inner = self.inner.borrow();
        if inner.playing {
            inner.position_ms
        } else {
            0
        }
    }

    fn length_ms(&mut self) -> u32 {
        let inner = self.inner.borrow();
        if inner.playing {
            inner.length_ms
        } else {
            0
        }
    }
}

// ── Clock / thermometer ───────────────────────────────────────────────

#[derive(Clone)]
pub struct MockClock(Rc<Cell<Option<WallTime>>>);

impl MockClock {
    pub fn new(time: WallTime) -> Self {
        Self(Rc::new(Cell::new(Some(time))))
    }

    /// Clock whose reads fail until [`MockClock::set`] is called.
    pub fn failing() -> Self {
        Self(Rc::new(Cell::new(None)))
    }

    pub fn set(&self, time: WallTime) {
        self.0.set(Some(time));
    }
}

impl Clock for MockClock {
    type Error = ();

    fn now(&mut self) -> Result<WallTime, ()> {
        self.0.get().ok_or(())
    }
}

pub struct MockThermo(pub f32);

impl Thermometer for MockThermo {
    fn celsius(&mut self) -> f32 {
        self.0
    }
}

// ── Serial ────────────────────────────────────────────────────────────

type ByteQueue = Rc<RefCell<VecDeque<u8>>>;

/// Serial port double. Written bytes are logged and copied into the receive
/// queue of every connected peer.
#[derive(Clone, Default)]
pub struct MockSerial {
    rx: ByteQueue,
    tx: Rc<RefCell<Vec<u8>>>,
    peers: Rc<RefCell<Vec<ByteQueue>>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for reading.
    pub fn inject(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes.iter().copied());
    }

    /// Bytes waiting to be read.
    pub fn pending(&self) -> usize {
        self.rx.borrow().len()
    }

    /// Everything written so far.
    pub fn sent(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }

    /// Everything written since the last call.
    pub fn take_sent(&self) -> Vec<u8> {
        core::mem::take(&mut *self.tx.borrow_mut())
    }

    /// Deliver everything written to `self` to `other` as well.
    pub fn connect_to(&self, other: &MockSerial) {
        self.peers.borrow_mut().push(other.rx.clone());
    }
}

impl serial::ErrorType for MockSerial {
    type Error = Infallible;
}

impl serial::Read<u8> for MockSerial {
    fn read(&mut self) -> nb::Result<u8, Infallible> {
        self.rx.borrow_mut().pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl serial::Write<u8> for MockSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        self.tx.borrow_mut().push(word);
        for peer in self.peers.borrow().iter() {
            peer.borrow_mut().push_back(word);
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

// ── Platform ──────────────────────────────────────────────────────────

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Audio = MockAudio;
    type Clock = MockClock;
    type Thermometer = MockThermo;
    type Link = MockSerial;
    type Console = MockSerial;
    type AmpRelay = FlakyRelay;
    type SpeakerRelay = FlakyRelay;
    type Led = MockLed;
    type Pwm = MockPwm;
    type Delay = MockDelay;
}

/// Handles kept by a test after the hardware moved into a unit.
pub struct Rig {
    pub trace: Trace,
    pub audio: MockAudio,
    pub clock: MockClock,
    pub link: MockSerial,
    pub console: MockSerial,
    pub amp_faults: RelayFaults,
    pub speaker_faults: RelayFaults,
}

impl Rig {
    /// Clock reads `hour:00:00`.
    pub fn new(hour: u8) -> Self {
        let trace = Trace::default();
        Self {
            audio: MockAudio::new(&trace),
            clock: MockClock::new(WallTime::at(hour, 0, 0)),
            link: MockSerial::new(),
            console: MockSerial::new(),
            amp_faults: RelayFaults::default(),
            speaker_faults: RelayFaults::default(),
            trace,
        }
    }

    pub fn hardware(&self, with_clock: bool) -> Hardware<MockPlatform> {
        Hardware {
            audio: self.audio.clone(),
            clock: with_clock.then(|| self.clock.clone()),
            thermometer: MockThermo(23.5),
            link: self.link.clone(),
            console: self.console.clone(),
            amp: FlakyRelay::new(RelayId::Amp, &self.trace, &self.amp_faults),
            speaker: FlakyRelay::new(RelayId::Speaker, &self.trace, &self.speaker_faults),
            leds: core::array::from_fn(|i| MockLed::new(i as u8, &self.trace)),
            pwm: MockPwm::new(&self.trace),
            delay: MockDelay::new(&self.trace),
        }
    }
}
