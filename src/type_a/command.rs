//! SPI Commands of the SSD16xx/IL38xx controllers (4.2" SSD1619 and 2.9" IL3820)

use crate::traits;

/// SSD1619 and IL3820 commands
///
/// Should rarely (never?) be needed directly.
///
/// For more infos about the addresses and what they are doing look into the pdfs
#[allow(dead_code)]
#[derive(Copy, Clone)]
pub(crate) enum Command {
    /// Driver Output control
    ///     3 Databytes:
    ///     A[7:0]
    ///     0.. A[8]
    ///     0.. B[2:0]
    ///     Default: Set A[8:0] = 0x127 and B[2:0] = 0x0
    DriverOutputControl = 0x01,
    /// Booster Soft start control
    ///     3 Databytes:
    ///     1.. A[6:0]
    ///     1.. B[6:0]
    ///     1.. C[6:0]
    ///     Default: A[7:0] = 0xCF, B[7:0] = 0xCE, C[7:0] = 0x8D
    BoosterSoftStartControl = 0x0C,
    /// Deep Sleep Mode Control
    ///     1 Databyte:
    ///     0.. A[0]
    ///     Values:
    ///         A[0] = 0: Normal Mode (POR)
    ///         A[0] = 1: Enter Deep Sleep Mode
    DeepSleepMode = 0x10,
    /// Data Entry mode setting, 0x03 = X and Y increment, X first
    DataEntryModeSetting = 0x11,

    SwReset = 0x12,

    /// 0x80 selects the internal sensor (SSD1619)
    TemperatureSensorControl = 0x18,

    /// Overrides the measured temperature, used to pick the fast full waveform (SSD1619)
    WriteTemperatureRegister = 0x1A,

    MasterActivation = 0x20,

    /// RAM content options and source output mode
    DisplayUpdateControl1 = 0x21,

    /// Update sequence: clock/analog on, LUT load, display, power off
    DisplayUpdateControl2 = 0x22,

    /// The black/white RAM, the image to display next
    WriteRam = 0x24,

    /// The second RAM, the previous image for differential waveforms (SSD1619)
    WriteRam2 = 0x26,

    WriteVcomRegister = 0x2C,

    WriteLutRegister = 0x32,

    SetDummyLinePeriod = 0x3A,

    SetGateLineWidth = 0x3B,

    BorderWaveformControl = 0x3C,

    SetRamXAddressStartEndPosition = 0x44,

    SetRamYAddressStartEndPosition = 0x45,

    SetRamXAddressCounter = 0x4E,

    SetRamYAddressCounter = 0x4F,

    Nop = 0xFF,
}

impl traits::Command for Command {
    /// Returns the address of the command
    fn address(self) -> u8 {
        self as u8
    }
}
