//! A Driver for the HINK-E029A01-A1 2.9" E-Ink Display (IL3820 controller) via SPI
//!
//! The glass is 128x296 natively and is usually mounted in landscape,
//! use [`DisplayRotation::Rotate270`](crate::geometry::DisplayRotation) for that.
//!
//! The IL3820 has no waveform in OTP, both the full and the partial LUT get uploaded
//! by the driver. There is only one image RAM (`0x24`); the controller toggles between
//! two internal banks on every refresh, which is why a partial refresh has to be
//! followed by writing the same window again. [`RamPlane::Previous`] maps to `0x24` too.
pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 296;
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::White;
const IS_BUSY_LOW: bool = false;

use core::fmt::{Debug, Display};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::spi::SpiDevice;

use crate::color::Color;
use crate::config::{BusyOp, BusyTimeouts, PanelProfile};
use crate::error::ErrorKind;
use crate::geometry::RefreshWindow;
use crate::interface::DisplayInterface;
use crate::traits::{EpdPanel, PanelState, RamPlane};
use crate::type_a::{self, command::Command, Lut, UndefinedRam, WindowTracker};

/// Refresh policy and busy budgets of the 2.9" glass. The IL3820 has no fast full waveform.
pub const PROFILE: PanelProfile = PanelProfile {
    full_refresh_interval: 32,
    fast_full_update: false,
    busy_timeouts: BusyTimeouts {
        init_ms: 1_000,
        power_on_ms: 1_000,
        power_off_ms: 1_000,
        full_refresh_ms: 8_000,
        partial_refresh_ms: 2_000,
    },
};

#[rustfmt::skip]
pub(crate) const LUT_FULL_UPDATE: [u8; 30] = [
    0x02, 0x02, 0x01, 0x11, 0x12, 0x12, 0x22, 0x22,
    0x66, 0x69, 0x69, 0x59, 0x58, 0x99, 0x99, 0x88,
    0x00, 0x00, 0x00, 0x00, 0xF8, 0xB4, 0x13, 0x51,
    0x35, 0x51, 0x51, 0x19, 0x01, 0x00,
];

#[rustfmt::skip]
pub(crate) const LUT_PARTIAL_UPDATE: [u8; 30] = [
    0x10, 0x18, 0x18, 0x08, 0x18, 0x18, 0x08, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x13, 0x14, 0x44, 0x12,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// enable clock signal, enable cp
const SEQ_POWER_ON: u8 = 0xC0;
// disable cp, disable clock signal
const SEQ_POWER_OFF: u8 = 0xC3;
// power on, display pattern, power off
const SEQ_FULL: u8 = 0xC7;
// display pattern only, the panel stays powered
const SEQ_PARTIAL: u8 = 0x04;

/// Epd2in9 driver
pub struct Epd2in9<SPI, BUSY, DC, RST> {
    /// Connection Interface
    interface: DisplayInterface<SPI, BUSY, DC, RST>,
    state: PanelState,
    profile: PanelProfile,
    tracker: WindowTracker,
    undefined: UndefinedRam,
    /// Waveform in the LUT register, lost on reset
    lut: Option<Lut>,
}

impl<SPI, BUSY, DC, RST> Epd2in9<SPI, BUSY, DC, RST>
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
        Epd2in9 {
            interface: DisplayInterface::new(busy, dc, rst, delay_us),
            state: PanelState::default(),
            profile,
            tracker: WindowTracker::default(),
            undefined: UndefinedRam::default(),
            lut: None,
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

    async fn set_lut(
        &mut self,
        spi: &mut SPI,
        lut: Lut,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        if self.lut == Some(lut) {
            return Ok(());
        }
        let table: &[u8] = match lut {
            Lut::Full => &LUT_FULL_UPDATE,
            Lut::Partial => &LUT_PARTIAL_UPDATE,
        };
        log::debug!("epd2in9: uploading {:?} LUT", lut);
        self.interface
            .cmd_with_data(spi, Command::WriteLutRegister, table)
            .await?;
        self.lut = Some(lut);
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

    /// Starts the update sequence loaded into Display Update Control 2
    async fn activate(
        &mut self,
        spi: &mut SPI,
        sequence: u8,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        self.interface
            .cmd_with_data(spi, Command::DisplayUpdateControl2, &[sequence])
            .await?;
        self.interface.cmd(spi, Command::MasterActivation).await?;
        // MASTER Activation should not be interupted to avoid currption of panel images
        // therefore a terminate command is send
        self.interface.cmd(spi, Command::Nop).await
    }

    fn check_window(&self, window: &RefreshWindow) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        type_a::check_window(window, WIDTH, HEIGHT).map_err(ErrorKind::ProtocolMisuse)
    }

    /// Before the first full refresh, a write to less than the whole RAM
    /// fills it with the background first and addresses the window again.
    async fn prepare_initial_write(
        &mut self,
        spi: &mut SPI,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        if !self.state.initial_refresh || !self.undefined.any() {
            return Ok(());
        }
        let window = self
            .tracker
            .addressed()
            .map_err(ErrorKind::ProtocolMisuse)?;
        let full = RefreshWindow::full(WIDTH, HEIGHT);
        if window != full {
            log::debug!("epd2in9: filling RAM before the first write");
            self.address(spi, full).await?;
            type_a::fill_window(
                &mut self.interface,
                spi,
                &mut self.tracker,
                Command::WriteRam,
                DEFAULT_BACKGROUND_COLOR.get_byte_value(),
            )
            .await?;
            self.address(spi, window).await?;
        }
        // one RAM behind both planes
        self.undefined.define_all();
        Ok(())
    }
}

impl<SPI, BUSY, DC, RST> EpdPanel<SPI> for Epd2in9<SPI, BUSY, DC, RST>
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
            log::debug!("epd2in9: reset out of deep sleep");
            self.interface.reset(spi, 10_000, 10_000).await?;
            self.state.hibernating = false;
            self.lut = None;
        }
        self.wait_until_idle(spi, BusyOp::Init).await?;

        // 3 Databytes:
        // A[7:0]
        // 0.. A[8]
        // 0.. B[2:0]
        // Default Values: A = Height of Screen (0x127), B = 0x00 (GD, SM and TB=0?)
        self.interface
            .cmd_with_data(
                spi,
                Command::DriverOutputControl,
                &[(HEIGHT - 1) as u8, ((HEIGHT - 1) >> 8) as u8, 0x00],
            )
            .await?;

        // 3 Databytes: (and default values from datasheet and arduino)
        // 1 .. A[6:0]  = 0xCF | 0xD7
        // 1 .. B[6:0]  = 0xCE | 0xD6
        // 1 .. C[6:0]  = 0x8D | 0x9D
        self.interface
            .cmd_with_data(spi, Command::BoosterSoftStartControl, &[0xD7, 0xD6, 0x9D])
            .await?;

        // One Databyte with value 0xA8 for 7V VCOM
        self.interface
            .cmd_with_data(spi, Command::WriteVcomRegister, &[0xA8])
            .await?;

        // One Databyte with default value 0x1A for 4 dummy lines per gate
        self.interface
            .cmd_with_data(spi, Command::SetDummyLinePeriod, &[0x1A])
            .await?;

        // One Databyte with default value 0x08 for 2us per line
        self.interface
            .cmd_with_data(spi, Command::SetGateLineWidth, &[0x08])
            .await?;

        self.address(spi, RefreshWindow::full(WIDTH, HEIGHT)).await?;
        self.state.init_done = true;
        log::debug!("epd2in9: init done");
        Ok(())
    }

    async fn set_window(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), Self::Error> {
        self.check_window(&window)?;
        self.init(spi).await?;
        self.address(spi, window).await
    }

    async fn write_buffer(
        &mut self,
        spi: &mut SPI,
        _plane: RamPlane,
        buffer: &[u8],
    ) -> Result<(), Self::Error> {
        self.init(spi).await?;
        self.prepare_initial_write(spi).await?;
        type_a::write_window(
            &mut self.interface,
            spi,
            &mut self.tracker,
            Command::WriteRam,
            buffer,
        )
        .await
    }

    async fn write_frame_window(
        &mut self,
        spi: &mut SPI,
        _plane: RamPlane,
        frame: &[u8],
    ) -> Result<(), Self::Error> {
        self.init(spi).await?;
        self.prepare_initial_write(spi).await?;
        type_a::write_frame_window(
            &mut self.interface,
            spi,
            &mut self.tracker,
            Command::WriteRam,
            frame,
            WIDTH,
            HEIGHT,
        )
        .await
    }

    async fn update_full(&mut self, spi: &mut SPI, use_fast: bool) -> Result<(), Self::Error> {
        if use_fast {
            log::debug!("epd2in9: no fast full waveform, using the normal one");
        }
        self.init(spi).await?;
        self.power_on(spi).await?;
        self.set_lut(spi, Lut::Full).await?;
        self.activate(spi, SEQ_FULL).await?;
        self.wait_until_idle(spi, BusyOp::FullRefresh).await?;

        self.state.power_on = false;
        self.state.partial_lut_loaded = false;
        self.state.using_partial_mode = false;
        self.state.initial_refresh = false;
        self.state.using_fast_full_update = false;
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
            log::warn!("epd2in9: partial refresh before any full refresh, refreshing full");
            return self.update_full(spi, false).await;
        }

        self.address(spi, window).await?;
        if !self.state.partial_lut_loaded {
            // once per power cycle, even if the register still holds it
            self.lut = None;
            self.set_lut(spi, Lut::Partial).await?;
            self.state.partial_lut_loaded = true;
        }
        self.power_on(spi).await?;
        self.activate(spi, SEQ_PARTIAL).await?;
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
        let powered_off = self.power_off(spi).await;
        if let Err(err) = &powered_off {
            if !matches!(err, ErrorKind::BusyTimeout(_)) {
                return powered_off;
            }
            // the reset on wake-up is the only way out of a stuck BUSY
            log::warn!("epd2in9: power off timed out, entering deep sleep anyway");
            self.state.power_on = false;
            self.state.partial_lut_loaded = false;
            self.state.using_partial_mode = false;
        }
        // 0x00 for Normal mode (Power on Reset), 0x01 for Deep Sleep Mode
        self.interface
            .cmd_with_data(spi, Command::DeepSleepMode, &[0x01])
            .await?;
        self.state.hibernating = true;
        self.state.init_done = false;
        self.tracker.reset();
        log::debug!("epd2in9: hibernating");
        powered_off
    }

    async fn clear_screen(&mut self, spi: &mut SPI, color: Color) -> Result<(), Self::Error> {
        let full = RefreshWindow::full(WIDTH, HEIGHT);
        let value = color.get_byte_value();
        // both banks of the single RAM
        for _ in 0..2 {
            self.set_window(spi, full).await?;
            type_a::fill_window(
                &mut self.interface,
                spi,
                &mut self.tracker,
                Command::WriteRam,
                value,
            )
            .await?;
        }
        self.undefined.define_all();
        self.update_full(spi, false).await
    }
}
