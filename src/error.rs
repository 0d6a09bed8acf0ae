use core::fmt::{Debug, Display, Formatter};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::spi::SpiDevice;

use crate::config::BusyOp;

/// Ways the panel protocol can be driven in the wrong order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Misuse {
    /// A RAM write without a window addressed right before it
    NoWindow,
    /// A partial refresh for a window whose RAM content was never written
    WindowNotWritten,
    /// A window that is not byte aligned or not inside the panel
    InvalidWindow,
}

impl Display for Misuse {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Misuse::NoWindow => f.write_str("RAM write without an addressed window"),
            Misuse::WindowNotWritten => {
                f.write_str("partial refresh of a window that was not written")
            }
            Misuse::InvalidWindow => f.write_str("window is unaligned or outside the panel"),
        }
    }
}

/// Epd error type
#[derive(Eq, PartialEq, Hash)]
pub enum ErrorKind<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    SPI::Error: Copy,
    BUSY: InputPin,
    BUSY::Error: Copy,
    DC: OutputPin,
    DC::Error: Copy,
    RST: OutputPin,
    RST::Error: Copy,
{
    /// Encountered an SPI error
    SpiError(SPI::Error),

    /// Encountered an error on Busy GPIO
    BusyError(BUSY::Error),

    /// Encountered an error on DC GPIO
    DcError(DC::Error),

    /// Encountered an error on RST GPIO
    RstError(RST::Error),

    /// BUSY stayed asserted past the budget of the operation.
    /// The panel should be considered faulty until it went through `hibernate` and `init`.
    BusyTimeout(BusyOp),

    /// The driver was called out of order
    ProtocolMisuse(Misuse),

    /// A buffer does not match the addressed window
    BufferSize { expected: usize, actual: usize },
}

impl<SPI, BUSY, DC, RST> Clone for ErrorKind<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    SPI::Error: Copy,
    BUSY: InputPin,
    BUSY::Error: Copy,
    DC: OutputPin,
    DC::Error: Copy,
    RST: OutputPin,
    RST::Error: Copy,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<SPI, BUSY, DC, RST> Copy for ErrorKind<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    SPI::Error: Copy,
    BUSY: InputPin,
    BUSY::Error: Copy,
    DC: OutputPin,
    DC::Error: Copy,
    RST: OutputPin,
    RST::Error: Copy,
{
}

impl<SPI, BUSY, DC, RST> Display for ErrorKind<SPI, BUSY, DC, RST>
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
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SpiError(err) => Display::fmt(&err, f),
            Self::BusyError(err) => Display::fmt(&err, f),
            Self::DcError(err) => Display::fmt(&err, f),
            Self::RstError(err) => Display::fmt(&err, f),
            Self::BusyTimeout(op) => write!(f, "busy timeout during {}", op),
            Self::ProtocolMisuse(misuse) => Display::fmt(misuse, f),
            Self::BufferSize { expected, actual } => write!(
                f,
                "buffer has {} bytes, the addressed window needs {}",
                actual, expected
            ),
        }
    }
}

impl<SPI, BUSY, DC, RST> Debug for ErrorKind<SPI, BUSY, DC, RST>
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
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SpiError(err) => Debug::fmt(&err, f),
            Self::BusyError(err) => Debug::fmt(&err, f),
            Self::DcError(err) => Debug::fmt(&err, f),
            Self::RstError(err) => Debug::fmt(&err, f),
            Self::BusyTimeout(op) => f.debug_tuple("BusyTimeout").field(op).finish(),
            Self::ProtocolMisuse(misuse) => f.debug_tuple("ProtocolMisuse").field(misuse).finish(),
            Self::BufferSize { expected, actual } => f
                .debug_struct("BufferSize")
                .field("expected", expected)
                .field("actual", actual)
                .finish(),
        }
    }
}
