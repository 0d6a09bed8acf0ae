use crate::color::Color;
use crate::config::PanelProfile;
use crate::geometry::RefreshWindow;

/// All commands need to have this trait which gives the address of the command
/// which needs to be send via SPI with activated CommandsPin (Data/Command Pin in CommandMode)
pub(crate) trait Command: Copy {
    fn address(self) -> u8;
}

/// The two image planes of the controller RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RamPlane {
    /// The image to show next
    #[default]
    Current,
    /// The image currently on the glass, used by the partial waveform to compute transitions
    Previous,
}

/// Volatile panel state, rebuilt by `init` after every reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub power_on: bool,
    /// Register init ran since the last reset/hibernate
    pub init_done: bool,
    /// The partial waveform is uploaded since the last full refresh or power off
    pub partial_lut_loaded: bool,
    pub hibernating: bool,
    pub using_fast_full_update: bool,
    pub using_partial_mode: bool,
    /// No full refresh happened yet, the content of the glass is unknown
    pub initial_refresh: bool,
}

impl Default for PanelState {
    /// State of a driver that never talked to its panel
    fn default() -> Self {
        PanelState {
            power_on: false,
            init_done: false,
            partial_lut_loaded: false,
            hibernating: true,
            using_fast_full_update: false,
            using_partial_mode: false,
            initial_refresh: true,
        }
    }
}

/// The command protocol of one panel family
///
/// The bus is handed in on every call so it can be shared with other devices.
/// Every operation takes `&mut self`: there is never more than one refresh in flight.
///
/// Order of calls for one update:
///
/// 1. [`set_window`](EpdPanel::set_window) directly followed by one write
///    ([`write_buffer`](EpdPanel::write_buffer) or [`write_frame_window`](EpdPanel::write_frame_window))
/// 2. [`update_full`](EpdPanel::update_full) or [`update_partial`](EpdPanel::update_partial)
///    for the written window (or a part of it)
///
/// Out of order calls fail with a protocol misuse error instead of corrupting the image.
pub trait EpdPanel<SPI> {
    type Error;

    /// Native width in pixels, a multiple of 8
    fn width(&self) -> u32;

    /// Native height in pixels
    fn height(&self) -> u32;

    fn state(&self) -> PanelState;

    fn profile(&self) -> &PanelProfile;

    /// Runs the register init once. Resets the controller first when it was hibernating.
    ///
    /// The write and update operations call this on their own.
    async fn init(&mut self, spi: &mut SPI) -> Result<(), Self::Error>;

    /// Addresses `window` in controller RAM for the next write
    async fn set_window(&mut self, spi: &mut SPI, window: RefreshWindow)
        -> Result<(), Self::Error>;

    /// Streams `buffer` into the addressed window. `buffer` holds exactly `w / 8 * h` bytes.
    ///
    /// Until the first full refresh, a write smaller than the panel fills the RAM with white first.
    async fn write_buffer(
        &mut self,
        spi: &mut SPI,
        plane: RamPlane,
        buffer: &[u8],
    ) -> Result<(), Self::Error>;

    /// Streams the addressed window out of a full native frame of `width / 8 * height` bytes
    async fn write_frame_window(
        &mut self,
        spi: &mut SPI,
        plane: RamPlane,
        frame: &[u8],
    ) -> Result<(), Self::Error>;

    /// Refreshes the whole glass with the full waveform and waits for it.
    ///
    /// `use_fast` picks the faster waveform where the controller has one.
    async fn update_full(&mut self, spi: &mut SPI, use_fast: bool) -> Result<(), Self::Error>;

    /// Refreshes `window` with the partial waveform and waits for it
    async fn update_partial(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), Self::Error>;

    async fn power_off(&mut self, spi: &mut SPI) -> Result<(), Self::Error>;

    /// Powers off and puts the controller into deep sleep. The next `init` resets it.
    ///
    /// A busy timeout while powering off is returned, but only after deep sleep was entered.
    async fn hibernate(&mut self, spi: &mut SPI) -> Result<(), Self::Error>;

    /// Fills both RAM planes with `color` and runs a full refresh
    async fn clear_screen(&mut self, spi: &mut SPI, color: Color) -> Result<(), Self::Error>;
}
