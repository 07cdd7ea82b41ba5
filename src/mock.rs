//! Recording stand-ins for the board hardware, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource};
use embedded_hal::spi::{self, Operation, SpiDevice};

use crate::camera::{Camera, CameraConfig};
use crate::config::CLASS_COUNT;
use crate::error::{CameraError, InferenceError};
use crate::frame::{PixelFormat, RawFrame};
use crate::inference::{Classifier, InputTensor, OutputVector};
use crate::timer::Monotonic;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Output pin driven to a level (true = high)
    Pin(&'static str, bool),
    DelayMs(u32),
    Capture,
    CaptureFailed,
    Release,
    Predict,
}

/// Ordered record of everything the mocks saw.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub fn leak_frame(width: usize, height: usize, format: PixelFormat, samples: Vec<u16>) -> RawFrame {
    RawFrame {
        width,
        height,
        format,
        buf: Box::leak(samples.into_boxed_slice()),
    }
}

pub struct MockOutput {
    name: &'static str,
    log: EventLog,
    fail_high: Rc<Cell<bool>>,
    fail_low: Rc<Cell<bool>>,
}

impl MockOutput {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        MockOutput {
            name,
            log: log.clone(),
            fail_high: Rc::new(Cell::new(false)),
            fail_low: Rc::new(Cell::new(false)),
        }
    }

    /// The next `set_high` errors out without touching the level
    pub fn fail_next_high(&self) {
        self.fail_high.set(true);
    }

    /// The next `set_low` errors out without touching the level
    pub fn fail_next_low(&self) {
        self.fail_low.set(true);
    }
}

impl digital::ErrorType for MockOutput {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail_low.replace(false) {
            return Err(digital::ErrorKind::Other);
        }
        self.log.push(Event::Pin(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail_high.replace(false) {
            return Err(digital::ErrorKind::Other);
        }
        self.log.push(Event::Pin(self.name, true));
        Ok(())
    }
}

/// Input that plays back a fixed list of levels; the last one repeats.
pub struct MockInput {
    levels: Vec<bool>,
    next: usize,
}

impl MockInput {
    pub fn new(levels: &[bool]) -> Self {
        MockInput {
            levels: levels.to_vec(),
            next: 0,
        }
    }

    fn read(&mut self) -> bool {
        let at = self.next.min(self.levels.len() - 1);
        self.next += 1;
        self.levels[at]
    }
}

impl digital::ErrorType for MockInput {
    type Error = digital::ErrorKind;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read())
    }
}

pub struct MockDelay {
    log: EventLog,
    total_ms: u32,
}

impl MockDelay {
    pub fn new(log: &EventLog) -> Self {
        MockDelay {
            log: log.clone(),
            total_ms: 0,
        }
    }

    pub fn total_ms(&self) -> u32 {
        self.total_ms
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
        self.log.push(Event::DelayMs(ms));
    }
}

pub struct FakeClock {
    now_us: Cell<u64>,
}

impl FakeClock {
    pub fn new(start_us: u64) -> Self {
        FakeClock {
            now_us: Cell::new(start_us),
        }
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl Monotonic for FakeClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

/// Camera that hands out scripted frames; an empty script means capture failure.
pub struct MockCamera {
    log: EventLog,
    script: VecDeque<Option<(usize, usize, PixelFormat, u16)>>,
    lent: usize,
}

impl MockCamera {
    pub fn new(log: &EventLog) -> Self {
        MockCamera {
            log: log.clone(),
            script: VecDeque::new(),
            lent: 0,
        }
    }

    pub fn push_frame(&mut self, width: usize, height: usize, format: PixelFormat) {
        self.script.push_back(Some((width, height, format, 0x1234)));
    }

    pub fn push_frame_filled(&mut self, width: usize, height: usize, fill: u16) {
        self.script
            .push_back(Some((width, height, PixelFormat::Rgb565, fill)));
    }

    pub fn push_failure(&mut self) {
        self.script.push_back(None);
    }

    /// Frames currently out of the driver's hands
    pub fn lent(&self) -> usize {
        self.lent
    }
}

impl Camera for MockCamera {
    fn init(&mut self, _config: &CameraConfig) -> Result<(), CameraError> {
        Ok(())
    }

    fn capture_frame(&mut self) -> Option<RawFrame> {
        assert_eq!(self.lent, 0, "capture while a frame is still lent out");
        match self.script.pop_front().flatten() {
            Some((width, height, format, fill)) => {
                self.log.push(Event::Capture);
                self.lent += 1;
                Some(leak_frame(width, height, format, vec![fill; width * height]))
            }
            None => {
                self.log.push(Event::CaptureFailed);
                None
            }
        }
    }

    fn release_frame(&mut self, _frame: RawFrame) {
        self.log.push(Event::Release);
        self.lent -= 1;
    }
}

/// Classifier that returns scripted scores; an empty script means `NoOutput`.
pub struct MockClassifier {
    log: EventLog,
    input: Box<InputTensor>,
    output: OutputVector,
    script: VecDeque<Result<OutputVector, InferenceError>>,
    seen: Vec<[f32; 3]>,
}

impl MockClassifier {
    pub fn new(log: &EventLog) -> Self {
        MockClassifier {
            log: log.clone(),
            input: Box::new(InputTensor::new()),
            output: [0.0; CLASS_COUNT],
            script: VecDeque::new(),
            seen: Vec::new(),
        }
    }

    pub fn push_scores(&mut self, scores: OutputVector) {
        self.script.push_back(Ok(scores));
    }

    pub fn push_failure(&mut self, error: InferenceError) {
        self.script.push_back(Err(error));
    }

    /// First input pixel at every `predict` call
    pub fn seen_first_pixels(&self) -> Vec<[f32; 3]> {
        self.seen.clone()
    }
}

impl Classifier for MockClassifier {
    type Input = InputTensor;

    fn input(&mut self) -> &mut InputTensor {
        &mut self.input
    }

    fn predict(&mut self) -> Result<(), InferenceError> {
        self.log.push(Event::Predict);
        let data = self.input.as_slice();
        self.seen.push([data[0], data[1], data[2]]);
        self.output = self.script.pop_front().unwrap_or(Err(InferenceError::NoOutput))?;
        Ok(())
    }

    fn output(&self) -> &OutputVector {
        &self.output
    }
}

/// ArduChip register file with a FIFO preloaded with one frame's bytes.
pub struct MockSpiCam {
    fifo: Vec<u8>,
    pos: usize,
    test: u8,
    done: bool,
    link_broken: bool,
    never_done: bool,
}

impl MockSpiCam {
    pub fn new(fifo: Vec<u8>) -> Self {
        MockSpiCam {
            fifo,
            pos: 0,
            test: 0,
            done: false,
            link_broken: false,
            never_done: false,
        }
    }

    /// Test register reads back zero
    pub fn break_link(&mut self) {
        self.link_broken = true;
    }

    /// Capture-done flag never rises
    pub fn never_finish(&mut self) {
        self.never_done = true;
    }

    fn write_reg(&mut self, addr: u8, value: u8) {
        match addr {
            0x00 => self.test = if self.link_broken { 0 } else { value },
            0x04 => {
                if value & 0x01 != 0 {
                    self.done = false;
                }
                if value & 0x02 != 0 {
                    self.done = !self.never_done;
                    self.pos = 0;
                }
            }
            _ => {}
        }
    }

    fn read_reg(&self, addr: u8) -> u8 {
        let len = self.fifo.len();
        match addr {
            0x00 => self.test,
            0x41 => {
                if self.done {
                    0x08
                } else {
                    0x00
                }
            }
            0x42 => (len & 0xFF) as u8,
            0x43 => ((len >> 8) & 0xFF) as u8,
            0x44 => ((len >> 16) & 0x7F) as u8,
            _ => 0,
        }
    }
}

impl spi::ErrorType for MockSpiCam {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpiCam {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut command = None;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let addr = bytes[0];
                    if addr & 0x80 != 0 {
                        self.write_reg(addr & 0x7F, bytes[1]);
                        command = None;
                    } else {
                        command = Some(addr);
                    }
                }
                Operation::Read(buf) => match command {
                    Some(0x3C) => {
                        for b in buf.iter_mut() {
                            *b = self.fifo.get(self.pos).copied().unwrap_or(0);
                            self.pos += 1;
                        }
                    }
                    Some(addr) => buf[0] = self.read_reg(addr),
                    None => {}
                },
                _ => {}
            }
        }
        Ok(())
    }
}

/// OV2640 stand-in answering its id registers and recording every write.
pub struct MockSensor {
    pid: u8,
    ver: u8,
    pointer: u8,
    writes: Vec<(u8, u8)>,
}

impl MockSensor {
    pub fn new(pid: u8, ver: u8) -> Self {
        MockSensor {
            pid,
            ver,
            pointer: 0,
            writes: Vec::new(),
        }
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.writes.clone()
    }
}

impl i2c::ErrorType for MockSensor {
    type Error = i2c::ErrorKind;
}

impl I2c for MockSensor {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != 0x30 {
            return Err(i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations.iter_mut() {
            match op {
                i2c::Operation::Write(bytes) => {
                    self.pointer = bytes[0];
                    if bytes.len() >= 2 {
                        self.writes.push((bytes[0], bytes[1]));
                    }
                }
                i2c::Operation::Read(buf) => {
                    buf[0] = match self.pointer {
                        0x0A => self.pid,
                        0x0B => self.ver,
                        _ => 0,
                    };
                }
            }
        }
        Ok(())
    }
}
