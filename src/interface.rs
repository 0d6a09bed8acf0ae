use crate::{config::BusyOp, error::ErrorKind, traits::Command};
use core::fmt::{Debug, Display};
use core::marker::PhantomData;
use embedded_hal::{
    digital::{InputPin, OutputPin},
    spi::Operation,
};
use embedded_hal_async::spi::SpiDevice;

/// Largest single transfer; Linux spidev rejects anything above 4096 bytes
const MAX_TRANSFER: usize = 4096;

/// The Connection Interface of the SSD16xx style panels
pub(crate) struct DisplayInterface<SPI, BUSY, DC, RST> {
    /// SPI
    _spi: PhantomData<SPI>,
    /// Busy line, its active level depends on the panel
    busy: BUSY,
    /// Data/Command Control Pin (High for data, Low for command)
    dc: DC,
    /// Pin for Resetting
    rst: RST,
    /// number of us the idle loop should sleep on
    delay_us: u32,
}

impl<SPI, BUSY, DC, RST> DisplayInterface<SPI, BUSY, DC, RST>
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
    /// Creates a new `DisplayInterface` struct
    ///
    /// If no delay is given, a default delay of 10ms is used.
    pub fn new(busy: BUSY, dc: DC, rst: RST, delay_us: Option<u32>) -> Self {
        // default delay of 10ms
        let delay_us = delay_us.unwrap_or(10_000);
        DisplayInterface {
            _spi: PhantomData,
            busy,
            dc,
            rst,
            delay_us,
        }
    }

    /// Basic function for sending [Commands](Command).
    ///
    /// Enables direct interaction with the device with the help of [data()](DisplayInterface::data())
    pub(crate) async fn cmd<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // low for commands
        self.dc.set_low().map_err(ErrorKind::DcError)?;

        // Transfer the command over spi
        self.write(spi, &[command.address()]).await
    }

    /// Basic function for sending an array of u8-values of data over spi
    pub(crate) async fn data(
        &mut self,
        spi: &mut SPI,
        data: &[u8],
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // high for data
        self.dc.set_high().map_err(ErrorKind::DcError)?;
        self.write(spi, data).await
    }

    /// Basic function for sending [Commands](Command) and the data belonging to it.
    pub(crate) async fn cmd_with_data<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
        data: &[u8],
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        self.cmd(spi, command).await?;
        self.data(spi, data).await
    }

    /// Sends the same byte `repetitions` times, in blocks instead of one transfer per byte
    pub(crate) async fn data_x_times(
        &mut self,
        spi: &mut SPI,
        val: u8,
        repetitions: u32,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        const BLOCK: usize = 64;
        let block = [val; BLOCK];

        // high for data
        self.dc.set_high().map_err(ErrorKind::DcError)?;
        let mut remaining = repetitions as usize;
        while remaining > 0 {
            let n = remaining.min(BLOCK);
            self.write(spi, &block[..n]).await?;
            remaining -= n;
        }
        Ok(())
    }

    // spi write helper/abstraction function
    async fn write(
        &mut self,
        spi: &mut SPI,
        data: &[u8],
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        for data_chunk in data.chunks(MAX_TRANSFER) {
            spi.write(data_chunk).await.map_err(ErrorKind::SpiError)?;
        }
        Ok(())
    }

    /// Polls BUSY until the panel is idle, sleeping `delay_us` between polls.
    ///
    /// Fails with [`ErrorKind::BusyTimeout`] once `timeout_ms` has been spent waiting.
    /// Nothing about the panel state is rolled back in that case.
    ///
    /// is_busy_low
    ///
    ///  - TRUE when the controller pulls BUSY low while working
    ///  - FALSE for the SSD16xx/IL38xx controllers (BUSY high while working)
    pub(crate) async fn wait_until_idle(
        &mut self,
        spi: &mut SPI,
        is_busy_low: bool,
        timeout_ms: u32,
        op: BusyOp,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        let step_us = self.delay_us.max(1);
        let budget_us = timeout_ms.saturating_mul(1000);
        let mut waited_us: u32 = 0;

        while self.is_busy(is_busy_low)? {
            if waited_us >= budget_us {
                log::error!("busy timeout after {} ms during {}", timeout_ms, op);
                return Err(ErrorKind::BusyTimeout(op));
            }
            self.delay(spi, step_us).await?;
            waited_us = waited_us.saturating_add(step_us);
        }
        Ok(())
    }

    pub(crate) async fn delay(
        &mut self,
        spi: &mut SPI,
        duration: u32,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        spi.transaction(&mut [Operation::DelayNs(duration.saturating_mul(1000))])
            .await
            .map_err(ErrorKind::SpiError)
    }

    /// Checks if device is still busy
    pub(crate) fn is_busy(&mut self, is_busy_low: bool) -> Result<bool, ErrorKind<SPI, BUSY, DC, RST>> {
        if is_busy_low {
            self.busy.is_low().map_err(ErrorKind::BusyError)
        } else {
            self.busy.is_high().map_err(ErrorKind::BusyError)
        }
    }

    /// Resets the device.
    ///
    /// Used to wake the controller from deep sleep, see `hibernate` of the panel drivers.
    pub(crate) async fn reset(
        &mut self,
        spi: &mut SPI,
        initial_delay: u32,
        duration: u32,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        self.rst.set_high().map_err(ErrorKind::RstError)?;
        self.delay(spi, initial_delay).await?;

        self.rst.set_low().map_err(ErrorKind::RstError)?;
        self.delay(spi, duration).await?;
        self.rst.set_high().map_err(ErrorKind::RstError)?;
        self.delay(spi, 10_000).await
    }
}
