//! A Driver for the HINK-E042A13-A0 4.2" E-Ink Display (SSD1619 controller) via SPI
//!
//! The SSD1619 has two image RAMs: `0x24` holds the image to show next and `0x26`
//! the image currently on the glass. The partial waveform drives only the pixels
//! that differ between the two, so after a partial refresh both planes have to be
//! written again with the new content.
//!
//! Full refreshes use the waveform stored in the controller OTP. The fast variant
//! tricks the controller into the waveform for a higher temperature by writing
//! the temperature register.
//!
//! # Example
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
//!# async fn run() -> Result<(), PanelError> {
//!use epd_refresh::{epd4in2::*, prelude::*};
//!#
//!# let expectations = [];
//!# let mut spi: spi::Mock<u8> = spi::Mock::new(&expectations);
//!# let (busy, dc, rst) = (Pin, Pin, Pin);
//!
//!let mut epd = Epd4in2::new(busy, dc, rst, None);
//!
//!// everything white, and the controller knows what is on the glass
//!epd.clear_screen(&mut spi, Color::White).await?;
//!
//!// a 16x8 black block at (40, 100)
//!let window = RefreshWindow { x: 40, y: 100, w: 16, h: 8 };
//!epd.set_window(&mut spi, window).await?;
//!epd.write_buffer(&mut spi, RamPlane::Current, &[0x00; 16]).await?;
//!epd.update_partial(&mut spi, window).await?;
//!
//!epd.hibernate(&mut spi).await?;
//!# Ok(())
//!# }
//!# fn main() {}
//!```
use core::fmt::{Debug, Display};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::spi::SpiDevice;

use crate::color::Color;
use crate::config::{BusyOp, BusyTimeouts, PanelProfile};
use crate::error::ErrorKind;
use crate::geometry::RefreshWindow;
use crate::interface::DisplayInterface;
use crate::traits::{EpdPanel, PanelState, RamPlane};
use crate::type_a::{self, command::Command, UndefinedRam, WindowTracker};

/// Width of the display
pub const WIDTH: u32 = 400;
/// Height of the display
pub const HEIGHT: u32 = 300;
/// Default Background Color
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::White;
const IS_BUSY_LOW: bool = false;

/// Refresh policy and busy budgets of the 4.2" glass
pub const PROFILE: PanelProfile = PanelProfile {
    full_refresh_interval: 16,
    fast_full_update: true,
    busy_timeouts: BusyTimeouts {
        init_ms: 1_000,
        power_on_ms: 1_000,
        power_off_ms: 1_000,
        full_refresh_ms: 10_000,
        partial_refresh_ms: 3_000,
    },
};

/// Partial refresh waveform: 7 groups of phase voltages, 7 groups of phase timings
#[rustfmt::skip]
pub(crate) const LUT_PARTIAL: [u8; 70] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x82, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x50, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x0c, 0x0c, 0x00, 0x0c, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

// Display Update Control 2 sequences
const SEQ_POWER_ON: u8 = 0xE0;
const SEQ_POWER_OFF: u8 = 0x83;
const SEQ_FULL: u8 = 0xF7;
const SEQ_FULL_FAST: u8 = 0xD7;
const SEQ_PARTIAL: u8 = 0xC7;
/// Temperature loaded for the fast full waveform
const FAST_FULL_TEMPERATURE: u8 = 0x6E;

/// Epd4in2 driver
pub struct Epd4in2<SPI, BUSY, DC, RST> {
    /// Connection Interface
    interface: DisplayInterface<SPI, BUSY, DC, RST>,
    state: PanelState,
    profile: PanelProfile,
    tracker: WindowTracker,
    undefined: UndefinedRam,
}

impl<SPI, BUSY, DC, RST> Epd4in2<SPI, BUSY, DC, RST>
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
    /// Creates the driver without touching the panel, `init` runs on first use.
    ///
    /// `delay_us` is the BUSY poll interval, `None` means 10ms.
    pub fn new(busy: BUSY, dc: DC, rst: RST, delay_us: Option<u32>) -> Self {
        Self::with_profile(busy, dc, rst, delay_us, PROFILE)
    }

    pub fn with_profile(
        busy: BUSY,
        dc: DC,
        rst: RST,
        delay_us: Option<u32>,
        profile: PanelProfile,
    ) -> Self {
        Epd4in2 {
            interface: DisplayInterface::new(busy, dc, rst, delay_us),
            state: PanelState::default(),
            profile,
            tracker: WindowTracker::default(),
            undefined: UndefinedRam::default(),
        }
    }

    async fn wait_until_idle(
        &mut self,
        spi: &mut SPI,
        op: BusyOp,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        let timeout = self.profile.busy_timeouts.for_op(op);
        self.interface
            .wait_until_idle(spi, IS_BUSY_LOW, timeout, op)
            .await
    }

    async fn address(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        type_a::set_ram_area(&mut self.interface, spi, window).await?;
        self.tracker.address(window);
        Ok(())
    }

    async fn power_on(&mut self, spi: &mut SPI) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        if self.state.power_on {
            return Ok(());
        }
        self.interface
            .cmd_with_data(spi, Command::DisplayUpdateControl2, &[SEQ_POWER_ON])
            .await?;
        self.interface.cmd(spi, Command::MasterActivation).await?;
        self.state.power_on = true;
        self.wait_until_idle(spi, BusyOp::PowerOn).await
    }

    fn ram(plane: RamPlane) -> Command {
        match plane {
            RamPlane::Current => Command::WriteRam,
            RamPlane::Previous => Command::WriteRam2,
        }
    }

    fn check_window(&self, window: &RefreshWindow) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        type_a::check_window(window, WIDTH, HEIGHT).map_err(ErrorKind::ProtocolMisuse)
    }

    /// Before the first full refresh, a write that leaves part of the RAM undefined
    /// fills the undefined planes with the background and addresses the window again.
    async fn prepare_initial_write(
        &mut self,
        spi: &mut SPI,
        plane: RamPlane,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        if !self.state.initial_refresh || !self.undefined.any() {
            return Ok(());
        }
        let window = self
            .tracker
            .addressed()
            .map_err(ErrorKind::ProtocolMisuse)?;
        let full = RefreshWindow::full(WIDTH, HEIGHT);
        if window == full {
            self.undefined.define(plane);
            return Ok(());
        }

        log::debug!("epd4in2: filling undefined RAM before the first write");
        let value = DEFAULT_BACKGROUND_COLOR.get_byte_value();
        for undefined in [RamPlane::Previous, RamPlane::Current] {
            if self.undefined.contains(undefined) {
                self.address(spi, full).await?;
                type_a::fill_window(
                    &mut self.interface,
                    spi,
                    &mut self.tracker,
                    Self::ram(undefined),
                    value,
                )
                .await?;
            }
        }
        self.undefined.define_all();
        self.address(spi, window).await
    }
}

impl<SPI, BUSY, DC, RST> EpdPanel<SPI> for Epd4in2<SPI, BUSY, DC, RST>
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
    type Error = ErrorKind<SPI, BUSY, DC, RST>;

    fn width(&self) -> u32 {
        WIDTH
    }

    fn height(&self) -> u32 {
        HEIGHT
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn profile(&self) -> &PanelProfile {
        &self.profile
    }

    async fn init(&mut self, spi: &mut SPI) -> Result<(), Self::Error> {
        if self.state.init_done {
            return Ok(());
        }
        if self.state.hibernating {
            log::debug!("epd4in2: reset out of deep sleep");
            self.interface.reset(spi, 10_000, 10_000).await?;
            self.state.hibernating = false;
        }

        self.interface.cmd(spi, Command::SwReset).await?;
        self.wait_until_idle(spi, BusyOp::Init).await?;

        // 299 gate lines, scan from G0
        self.interface
            .cmd_with_data(spi, Command::DriverOutputControl, &[0x2B, 0x01, 0x00])
            .await?;
        // border follows LUT1
        self.interface
            .cmd_with_data(spi, Command::BorderWaveformControl, &[0x01])
            .await?;
        // internal temperature sensor
        self.interface
            .cmd_with_data(spi, Command::TemperatureSensorControl, &[0x80])
            .await?;

        self.address(spi, RefreshWindow::full(WIDTH, HEIGHT)).await?;
        self.state.init_done = true;
        log::debug!("epd4in2: init done");
        Ok(())
    }

    async fn set_window(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), Self::Error> {
        self.check_window(&window)?;
        self.init(spi).await?;
        log::debug!(
            "epd4in2: window x={} y={} w={} h={}",
            window.x,
            window.y,
            window.w,
            window.h
        );
        self.address(spi, window).await
    }

    async fn write_buffer(
        &mut self,
        spi: &mut SPI,
        plane: RamPlane,
        buffer: &[u8],
    ) -> Result<(), Self::Error> {
        self.init(spi).await?;
        self.prepare_initial_write(spi, plane).await?;
        type_a::write_window(
            &mut self.interface,
            spi,
            &mut self.tracker,
            Self::ram(plane),
            buffer,
        )
        .await
    }

    async fn write_frame_window(
        &mut self,
        spi: &mut SPI,
        plane: RamPlane,
        frame: &[u8],
    ) -> Result<(), Self::Error> {
        self.init(spi).await?;
        self.prepare_initial_write(spi, plane).await?;
        type_a::write_frame_window(
            &mut self.interface,
            spi,
            &mut self.tracker,
            Self::ram(plane),
            frame,
            WIDTH,
            HEIGHT,
        )
        .await
    }

    async fn update_full(&mut self, spi: &mut SPI, use_fast: bool) -> Result<(), Self::Error> {
        self.init(spi).await?;
        self.power_on(spi).await?;

        let fast = use_fast && self.profile.fast_full_update;
        // bypass the RED RAM as 0, show the BW RAM as is
        self.interface
            .cmd_with_data(spi, Command::DisplayUpdateControl1, &[0x40, 0x00])
            .await?;
        if fast {
            self.interface
                .cmd_with_data(
                    spi,
                    Command::WriteTemperatureRegister,
                    &[FAST_FULL_TEMPERATURE],
                )
                .await?;
            self.interface
                .cmd_with_data(spi, Command::DisplayUpdateControl2, &[SEQ_FULL_FAST])
                .await?;
        } else {
            self.interface
                .cmd_with_data(spi, Command::DisplayUpdateControl2, &[SEQ_FULL])
                .await?;
        }
        self.interface.cmd(spi, Command::MasterActivation).await?;
        self.wait_until_idle(spi, BusyOp::FullRefresh).await?;

        // the full sequence ends with analog and clock off
        self.state.power_on = false;
        self.state.partial_lut_loaded = false;
        self.state.using_partial_mode = false;
        self.state.initial_refresh = false;
        self.state.using_fast_full_update = fast;
        Ok(())
    }

    async fn update_partial(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), Self::Error> {
        self.check_window(&window)?;
        self.init(spi).await?;
        self.tracker
            .check_written(&window)
            .map_err(ErrorKind::ProtocolMisuse)?;

        if self.state.initial_refresh {
            log::warn!("epd4in2: partial refresh before any full refresh, refreshing full");
            let fast = self.profile.fast_full_update;
            return self.update_full(spi, fast).await;
        }

        self.address(spi, window).await?;
        if !self.state.partial_lut_loaded {
            log::debug!("epd4in2: uploading partial LUT");
            self.interface
                .cmd_with_data(spi, Command::DisplayUpdateControl1, &[0x00])
                .await?;
            self.interface
                .cmd_with_data(spi, Command::WriteLutRegister, &LUT_PARTIAL)
                .await?;
            self.state.partial_lut_loaded = true;
        }
        self.interface
            .cmd_with_data(spi, Command::DisplayUpdateControl2, &[SEQ_PARTIAL])
            .await?;
        self.interface.cmd(spi, Command::MasterActivation).await?;
        self.state.power_on = true;
        self.wait_until_idle(spi, BusyOp::PartialRefresh).await?;

        self.state.using_partial_mode = true;
        Ok(())
    }

    async fn power_off(&mut self, spi: &mut SPI) -> Result<(), Self::Error> {
        if self.state.power_on {
            self.interface
                .cmd_with_data(spi, Command::DisplayUpdateControl2, &[SEQ_POWER_OFF])
                .await?;
            self.interface.cmd(spi, Command::MasterActivation).await?;
            self.wait_until_idle(spi, BusyOp::PowerOff).await?;
        }
        self.state.power_on = false;
        self.state.partial_lut_loaded = false;
        self.state.using_partial_mode = false;
        Ok(())
    }

    async fn hibernate(&mut self, spi: &mut SPI) -> Result<(), Self::Error> {
        if self.state.hibernating {
            return Ok(());
        }
        // a controller stuck in BUSY still goes to sleep, the wake-up reset clears it
        let powered_off = self.power_off(spi).await;
        if let Err(err) = &powered_off {
            if !matches!(err, ErrorKind::BusyTimeout(_)) {
                return powered_off;
            }
            log::warn!("epd4in2: power off timed out, entering deep sleep anyway");
            self.state.power_on = false;
            self.state.partial_lut_loaded = false;
            self.state.using_partial_mode = false;
        }
        // deep sleep mode 1, RAM is not retained across the wake-up reset
        self.interface
            .cmd_with_data(spi, Command::DeepSleepMode, &[0x01])
            .await?;
        self.state.hibernating = true;
        self.state.init_done = false;
        self.tracker.reset();
        log::debug!("epd4in2: hibernating");
        powered_off
    }

    async fn clear_screen(&mut self, spi: &mut SPI, color: Color) -> Result<(), Self::Error> {
        let full = RefreshWindow::full(WIDTH, HEIGHT);
        let value = color.get_byte_value();
        for plane in [RamPlane::Previous, RamPlane::Current] {
            self.set_window(spi, full).await?;
            type_a::fill_window(
                &mut self.interface,
                spi,
                &mut self.tracker,
                Self::ram(plane),
                value,
            )
            .await?;
        }
        self.undefined.define_all();
        let fast = self.profile.fast_full_update;
        self.update_full(spi, fast).await
    }
}
