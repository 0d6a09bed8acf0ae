//! Protocol pieces shared by the SSD16xx/IL38xx panels: RAM windows and RAM writes
use core::fmt::{Debug, Display};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::spi::SpiDevice;

use crate::error::{ErrorKind, Misuse};
use crate::geometry::RefreshWindow;
use crate::interface::DisplayInterface;
use crate::traits::RamPlane;

pub(crate) mod command;

use self::command::Command;

/// The waveform currently held in the LUT register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lut {
    Full,
    Partial,
}

/// Remembers which RAM window is addressed and which one got written
///
/// The controller couples the address counters to the next data burst,
/// so an addressed window is used up by exactly one write.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WindowTracker {
    addressed: Option<RefreshWindow>,
    written: Option<RefreshWindow>,
}

impl WindowTracker {
    pub(crate) fn address(&mut self, window: RefreshWindow) {
        self.addressed = Some(window);
    }

    pub(crate) fn addressed(&self) -> Result<RefreshWindow, Misuse> {
        self.addressed.ok_or(Misuse::NoWindow)
    }

    pub(crate) fn mark_written(&mut self) {
        self.written = self.addressed.take();
    }

    pub(crate) fn check_written(&self, window: &RefreshWindow) -> Result<(), Misuse> {
        match self.written {
            Some(written) if written.contains(window) => Ok(()),
            _ => Err(Misuse::WindowNotWritten),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = WindowTracker::default();
    }
}

/// RAM planes that still hold whatever the controller powered up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UndefinedRam {
    current: bool,
    previous: bool,
}

impl Default for UndefinedRam {
    fn default() -> Self {
        UndefinedRam {
            current: true,
            previous: true,
        }
    }
}

impl UndefinedRam {
    pub(crate) fn any(&self) -> bool {
        self.current || self.previous
    }

    #[cfg_attr(not(feature = "epd4in2"), allow(dead_code))]
    pub(crate) fn contains(&self, plane: RamPlane) -> bool {
        match plane {
            RamPlane::Current => self.current,
            RamPlane::Previous => self.previous,
        }
    }

    #[cfg_attr(not(feature = "epd4in2"), allow(dead_code))]
    pub(crate) fn define(&mut self, plane: RamPlane) {
        match plane {
            RamPlane::Current => self.current = false,
            RamPlane::Previous => self.previous = false,
        }
    }

    pub(crate) fn define_all(&mut self) {
        self.current = false;
        self.previous = false;
    }
}

/// A window has to be byte aligned, non empty and inside the `width` x `height` panel
pub(crate) fn check_window(window: &RefreshWindow, width: u32, height: u32) -> Result<(), Misuse> {
    if RefreshWindow::full(width, height).contains(window)
        && !window.is_empty()
        && window.x % 8 == 0
        && window.w % 8 == 0
    {
        Ok(())
    } else {
        Err(Misuse::InvalidWindow)
    }
}

/// Sets data entry mode, RAM window and address counters for `window`
pub(crate) async fn set_ram_area<SPI, BUSY, DC, RST>(
    interface: &mut DisplayInterface<SPI, BUSY, DC, RST>,
    spi: &mut SPI,
    window: RefreshWindow,
) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>>
where
    SPI: SpiDevice,
    SPI::Error: Copy + Debug + Display,
    BUSY: InputPin,
    BUSY::Error: Copy + Debug + Display,
    DC: OutputPin,
    DC::Error: Copy + Debug + Display,
    RST: OutputPin,
    RST::Error: Copy + Debug + Display,
{
    let (start_x, end_x) = window.byte_columns();
    let start_y = window.y;
    let end_y = window.y + window.h - 1;

    // x increment, y increment, address counter is updated in x direction
    interface
        .cmd_with_data(spi, Command::DataEntryModeSetting, &[0x03])
        .await?;

    interface
        .cmd_with_data(
            spi,
            Command::SetRamXAddressStartEndPosition,
            &[start_x as u8, end_x as u8],
        )
        .await?;

    // 2 Databytes: A[7:0] & 0..A[8] for each - start and end
    interface
        .cmd_with_data(
            spi,
            Command::SetRamYAddressStartEndPosition,
            &[
                start_y as u8,
                (start_y >> 8) as u8,
                end_y as u8,
                (end_y >> 8) as u8,
            ],
        )
        .await?;

    interface
        .cmd_with_data(spi, Command::SetRamXAddressCounter, &[start_x as u8])
        .await?;

    // 2 Databytes: A[7:0] & 0..A[8]
    interface
        .cmd_with_data(
            spi,
            Command::SetRamYAddressCounter,
            &[start_y as u8, (start_y >> 8) as u8],
        )
        .await
}

/// Writes a window sized `buffer` to the addressed window
pub(crate) async fn write_window<SPI, BUSY, DC, RST>(
    interface: &mut DisplayInterface<SPI, BUSY, DC, RST>,
    spi: &mut SPI,
    tracker: &mut WindowTracker,
    ram: Command,
    buffer: &[u8],
) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>>
where
    SPI: SpiDevice,
    SPI::Error: Copy + Debug + Display,
    BUSY: InputPin,
    BUSY::Error: Copy + Debug + Display,
    DC: OutputPin,
    DC::Error: Copy + Debug + Display,
    RST: OutputPin,
    RST::Error: Copy + Debug + Display,
{
    let window = tracker.addressed().map_err(ErrorKind::ProtocolMisuse)?;
    if buffer.len() != window.byte_len() {
        return Err(ErrorKind::BufferSize {
            expected: window.byte_len(),
            actual: buffer.len(),
        });
    }

    interface.cmd_with_data(spi, ram, buffer).await?;
    tracker.mark_written();
    Ok(())
}

/// Writes the addressed window out of a full frame of `frame_width` pixels per row
pub(crate) async fn write_frame_window<SPI, BUSY, DC, RST>(
    interface: &mut DisplayInterface<SPI, BUSY, DC, RST>,
    spi: &mut SPI,
    tracker: &mut WindowTracker,
    ram: Command,
    frame: &[u8],
    frame_width: u32,
    frame_height: u32,
) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>>
where
    SPI: SpiDevice,
    SPI::Error: Copy + Debug + Display,
    BUSY: InputPin,
    BUSY::Error: Copy + Debug + Display,
    DC: OutputPin,
    DC::Error: Copy + Debug + Display,
    RST: OutputPin,
    RST::Error: Copy + Debug + Display,
{
    let window = tracker.addressed().map_err(ErrorKind::ProtocolMisuse)?;
    let stride = (frame_width / 8) as usize;
    let expected = stride * frame_height as usize;
    if frame.len() != expected {
        return Err(ErrorKind::BufferSize {
            expected,
            actual: frame.len(),
        });
    }

    let first = (window.x / 8) as usize;
    let row_bytes = (window.w / 8) as usize;
    interface.cmd(spi, ram).await?;
    for row in window.y..window.y + window.h {
        let start = row as usize * stride + first;
        interface.data(spi, &frame[start..start + row_bytes]).await?;
    }
    tracker.mark_written();
    Ok(())
}

/// Fills the addressed window with `value`
pub(crate) async fn fill_window<SPI, BUSY, DC, RST>(
    interface: &mut DisplayInterface<SPI, BUSY, DC, RST>,
    spi: &mut SPI,
    tracker: &mut WindowTracker,
    ram: Command,
    value: u8,
) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>>
where
    SPI: SpiDevice,
    SPI::Error: Copy + Debug + Display,
    BUSY: InputPin,
    BUSY::Error: Copy + Debug + Display,
    DC: OutputPin,
    DC::Error: Copy + Debug + Display,
    RST: OutputPin,
    RST::Error: Copy + Debug + Display,
{
    let window = tracker.addressed().map_err(ErrorKind::ProtocolMisuse)?;
    interface.cmd(spi, ram).await?;
    interface
        .data_x_times(spi, value, window.byte_len() as u32)
        .await?;
    tracker.mark_written();
    Ok(())
}
