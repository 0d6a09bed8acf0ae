//! A recording SPI bus with DC/RST/BUSY pins for driver tests
//!
//! Bytes sent with DC low become [`Wire::Command`], bytes sent with DC high are
//! merged into one [`Wire::Data`] per command. Driving RST low records [`Wire::Reset`].
#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, Operation};
use embedded_hal_async::spi::SpiDevice;

/// Poll interval handed to the drivers, in us
pub const POLL_US: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wire {
    Command(u8),
    Data(Vec<u8>),
    Reset,
}

#[derive(Debug, Default)]
pub struct Bus {
    pub wire: Vec<Wire>,
    dc_high: bool,
    /// BUSY reads high for this many polls
    pub busy_polls: u32,
    /// BUSY reads high forever
    pub stuck: bool,
    /// BUSY gets stuck once this many MasterActivation (0x20) commands went out
    pub stuck_after_activations: Option<usize>,
    activations: usize,
    pub polls: u32,
    pub delays: u32,
}

impl Bus {
    fn record(&mut self, bytes: &[u8]) {
        if self.dc_high {
            match self.wire.last_mut() {
                Some(Wire::Data(data)) => data.extend_from_slice(bytes),
                _ => self.wire.push(Wire::Data(bytes.to_vec())),
            }
        } else {
            for byte in bytes {
                self.wire.push(Wire::Command(*byte));
                if *byte == 0x20 {
                    self.activations += 1;
                    if self.stuck_after_activations == Some(self.activations) {
                        self.stuck = true;
                    }
                }
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct Shared(pub Rc<RefCell<Bus>>);

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, clearing the record
    pub fn take(&self) -> Vec<Wire> {
        std::mem::take(&mut self.0.borrow_mut().wire)
    }

    pub fn wire(&self) -> Vec<Wire> {
        self.0.borrow().wire.clone()
    }

    /// Command bytes in order
    pub fn commands(&self) -> Vec<u8> {
        self.0
            .borrow()
            .wire
            .iter()
            .filter_map(|w| match w {
                Wire::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, command: u8) -> usize {
        self.commands().iter().filter(|c| **c == command).count()
    }

    pub fn resets(&self) -> usize {
        self.0
            .borrow()
            .wire
            .iter()
            .filter(|w| matches!(w, Wire::Reset))
            .count()
    }

    /// Data sent after every occurrence of `command`
    pub fn data_of(&self, command: u8) -> Vec<Vec<u8>> {
        let bus = self.0.borrow();
        let mut out = Vec::new();
        for (i, w) in bus.wire.iter().enumerate() {
            if *w == Wire::Command(command) {
                match bus.wire.get(i + 1) {
                    Some(Wire::Data(data)) => out.push(data.clone()),
                    _ => out.push(Vec::new()),
                }
            }
        }
        out
    }

    pub fn set_stuck(&self, stuck: bool) {
        self.0.borrow_mut().stuck = stuck;
    }

    pub fn stuck_after_activations(&self, n: usize) {
        let mut bus = self.0.borrow_mut();
        bus.activations = 0;
        bus.stuck_after_activations = Some(n);
    }

    pub fn set_busy_polls(&self, polls: u32) {
        self.0.borrow_mut().busy_polls = polls;
    }

    pub fn polls(&self) -> u32 {
        self.0.borrow().polls
    }

    pub fn spi(&self) -> FakeSpi {
        FakeSpi(self.clone())
    }

    pub fn pins(&self) -> (BusyPin, DcPin, RstPin) {
        (
            BusyPin(self.clone()),
            DcPin(self.clone()),
            RstPin(self.clone()),
        )
    }
}

pub struct FakeSpi(Shared);

impl spi::ErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice for FakeSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Infallible> {
        let mut bus = self.0 .0.borrow_mut();
        for op in operations.iter() {
            match op {
                Operation::Write(data) => bus.record(data),
                Operation::DelayNs(_) => bus.delays += 1,
                _ => {}
            }
        }
        Ok(())
    }
}

pub struct DcPin(Shared);

impl digital::ErrorType for DcPin {
    type Error = Infallible;
}

impl OutputPin for DcPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().dc_high = true;
        Ok(())
    }
}

pub struct RstPin(Shared);

impl digital::ErrorType for RstPin {
    type Error = Infallible;
}

impl OutputPin for RstPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().wire.push(Wire::Reset);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

pub struct BusyPin(Shared);

impl digital::ErrorType for BusyPin {
    type Error = Infallible;
}

impl InputPin for BusyPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let mut bus = self.0 .0.borrow_mut();
        bus.polls += 1;
        if bus.stuck {
            return Ok(true);
        }
        if bus.busy_polls > 0 {
            bus.busy_polls -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}
