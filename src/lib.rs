//! A refresh driver for monochrome SSD16xx ePaper panels via SPI
//!
//! This driver was built using [`embedded-hal`] and [`embedded-hal-async`] traits.
//! It sits between a UI renderer that hands out dirty rectangles of a packed
//! 1bpp framebuffer and the panel controller, and decides per flush whether a
//! cheap partial refresh is good enough or a full refresh is needed to clear ghosting.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/1
//! [`embedded-hal-async`]: https://docs.rs/embedded-hal-async/1
//!
//! # Requirements
//!
//! ### SPI
//!
//! - MISO is not connected/available
//! - SPI_MODE_0 is used (CPHL = 0, CPOL = 0)
//! - 8 bits per word, MSB first
//! - Chip select is handled by the [`SpiDevice`](embedded_hal_async::spi::SpiDevice)
//!
//! ### Other....
//!
//! - Buffersize: the shadow frame handed to the [`FlushBridge`](bridge::FlushBridge)
//!   needs to be of the size `width / 8 * height` of the native (unrotated) panel,
//!   see [`buffer_len`]
//! - Renderer buffers use `1 = ink`, the panel uses `1 = white`. The bridge inverts while copying.
//!
//! # Examples
//!
//!```rust, no_run
//!# use core::convert::Infallible;
//!# use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
//!# use embedded_hal_mock::eh1::spi;
//!# struct Pin;
//!# impl ErrorType for Pin {
//!#     type Error = Infallible;
//!# }
//!# impl InputPin for Pin {
//!#     fn is_high(&mut self) -> Result<bool, Infallible> { Ok(false) }
//!#     fn is_low(&mut self) -> Result<bool, Infallible> { Ok(true) }
//!# }
//!# impl OutputPin for Pin {
//!#     fn set_low(&mut self) -> Result<(), Infallible> { Ok(()) }
//!#     fn set_high(&mut self) -> Result<(), Infallible> { Ok(()) }
//!# }
//!# type PanelError = epd_refresh::error::ErrorKind<spi::Mock<u8>, Pin, Pin, Pin>;
//!# async fn run() -> Result<(), epd_refresh::bridge::FlushError<PanelError>> {
//!use epd_refresh::{epd2in9::{self, Epd2in9}, prelude::*};
//!#
//!# let expectations = [];
//!# let mut spi: spi::Mock<u8> = spi::Mock::new(&expectations);
//!# let (busy, dc, rst) = (Pin, Pin, Pin);
//!
//!let mut epd = Epd2in9::new(busy, dc, rst, None);
//!let geometry = PanelGeometry::new(epd2in9::WIDTH, epd2in9::HEIGHT, DisplayRotation::Rotate270);
//!let scheduler = RefreshScheduler::new(epd2in9::PROFILE.full_refresh_interval);
//!let mut shadow = [0u8; buffer_len(epd2in9::WIDTH as usize, epd2in9::HEIGHT as usize)];
//!
//!let mut bridge = FlushBridge::new(&mut epd, geometry, scheduler, &mut shadow)
//!    .expect("the shadow frame fits the panel");
//!
//!// renderer drew a 40x16 label at (10, 20)
//!let pixels = [0u8; 5 * 16];
//!bridge
//!    .flush(&mut spi, Area::new(10, 20, 40, 16), &pixels, 5, |_| {})
//!    .await?;
//!
//!bridge.hibernate(&mut spi).await.map_err(FlushError::Panel)?;
//!# Ok(())
//!# }
//!# fn main() {}
//!```
#![no_std]
#![allow(async_fn_in_trait)]

#[cfg(feature = "graphics")]
pub mod graphics;

pub mod bridge;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod scheduler;
pub mod traits;

/// Interface for the physical connection between display and the controlling device
mod interface;

#[cfg(feature = "epd4in2")]
pub mod epd4in2;

#[cfg(feature = "epd2in9")]
pub mod epd2in9;

#[cfg(any(feature = "epd4in2", feature = "epd2in9"))]
pub(crate) mod type_a;

pub mod prelude {
    pub use crate::bridge::{FlushBridge, FlushError, FlushOutcome};
    pub use crate::color::Color;
    pub use crate::config::{BusyOp, BusyTimeouts, PanelProfile};
    pub use crate::error::ErrorKind;
    pub use crate::geometry::{align_window, Area, DisplayRotation, PanelGeometry, RefreshWindow};
    pub use crate::scheduler::RefreshScheduler;
    pub use crate::traits::{EpdPanel, PanelState, RamPlane};
    pub use crate::{buffer_len, SPI_MODE};

    #[cfg(feature = "graphics")]
    pub use crate::graphics::FrameCanvas;
}

use embedded_hal::spi::{Mode, Phase, Polarity};

/// SPI mode -
/// For more infos see [Requirements: SPI](index.html#spi)
pub const SPI_MODE: Mode = Mode {
    phase: Phase::CaptureOnFirstTransition,
    polarity: Polarity::IdleLow,
};

/// Computes the needed buffer length for a packed 1bpp buffer. Takes care of rounding up in case width
/// is not divisible by 8.
///
/// ```
/// use epd_refresh::buffer_len;
///
/// assert_eq!(buffer_len(296, 128), 37 * 128);
/// assert_eq!(buffer_len(5, 2), 2);
/// ```
#[must_use]
pub const fn buffer_len(width: usize, height: usize) -> usize {
    (width + 7) / 8 * height
}
