//! Glue between a UI renderer and a panel driver
//!
//! The renderer calls [`FlushBridge::flush`] once per dirty rectangle with its packed
//! 1bpp pixels (`1` = ink). The bridge keeps a native frame of the whole panel in
//! panel polarity (`1` = white), copies each rectangle into it and lets the
//! [`RefreshScheduler`] decide between a partial refresh of the touched bytes and
//! a full refresh of the whole frame.
use bit_field::BitField;
use log::{debug, info};

use crate::color::Color;
use crate::geometry::{align_window, Area, DisplayRotation, PanelGeometry, RefreshWindow};
use crate::scheduler::RefreshScheduler;
use crate::traits::{EpdPanel, RamPlane};

/// Converts a renderer byte (`1` = ink) into a panel RAM byte (`1` = white) and back
///
/// ```
/// use epd_refresh::bridge::remap_polarity;
///
/// assert_eq!(remap_polarity(0b1000_0001), 0b0111_1110);
/// assert_eq!(remap_polarity(remap_polarity(0x5A)), 0x5A);
/// ```
#[inline]
pub fn remap_polarity(byte: u8) -> u8 {
    !byte
}

/// What a flush ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The area was empty after clipping, nothing was sent
    Skipped,
    /// Partial refresh of the aligned native window
    Partial(RefreshWindow),
    Full,
}

/// Errors of a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushError<E> {
    /// The panel driver failed, e.g. with a busy timeout
    Panel(E),
    /// The pixel buffer is too short for the area and stride
    BufferMismatch { expected: usize, actual: usize },
    /// The row stride cannot hold a row of the area
    StrideTooShort { min: usize, actual: usize },
}

/// Errors while building a [`FlushBridge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The shadow frame cannot hold the native panel frame
    ShadowTooSmall { expected: usize, actual: usize },
    /// Native panel width is not a multiple of 8
    UnalignedWidth(u32),
}

/// Routes renderer flushes to a panel, owning the shadow frame and the refresh policy
///
/// Borrowing the panel mutably for its whole life, the bridge is the only caller of
/// the driver. A refresh in progress is never interleaved with another one.
pub struct FlushBridge<'a, P> {
    panel: &'a mut P,
    geometry: PanelGeometry,
    scheduler: RefreshScheduler,
    shadow: &'a mut [u8],
    fast_full_update: bool,
}

impl<'a, P> FlushBridge<'a, P> {
    /// The shadow frame needs at least [`PanelGeometry::buffer_len`] bytes and gets cleared to white.
    ///
    /// The content of the glass is unknown at this point, so the first flush is always full.
    pub fn new(
        panel: &'a mut P,
        geometry: PanelGeometry,
        mut scheduler: RefreshScheduler,
        shadow: &'a mut [u8],
    ) -> Result<Self, BridgeError> {
        if geometry.width % 8 != 0 {
            return Err(BridgeError::UnalignedWidth(geometry.width));
        }
        let expected = geometry.buffer_len();
        if shadow.len() < expected {
            return Err(BridgeError::ShadowTooSmall {
                expected,
                actual: shadow.len(),
            });
        }
        let shadow = &mut shadow[..expected];
        shadow.fill(Color::White.get_byte_value());
        scheduler.request_full_refresh();

        Ok(FlushBridge {
            panel,
            geometry,
            scheduler,
            shadow,
            fast_full_update: true,
        })
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn panel(&self) -> &P {
        &*self.panel
    }

    /// The native frame as it will be (or was) sent to the panel
    pub fn shadow(&self) -> &[u8] {
        &*self.shadow
    }

    /// Marks the next flush as full when `force_full` is set
    pub fn request_refresh(&mut self, force_full: bool) {
        if force_full {
            debug!("full refresh requested");
            self.scheduler.request_full_refresh();
        }
    }

    /// Use the faster, less clean full waveform where the panel has one
    pub fn select_fast_full_update(&mut self, fast: bool) {
        self.fast_full_update = fast;
    }

    /// Sends one renderer rectangle to the panel.
    ///
    /// `pixels` holds the rectangle `area` row by row, `row_stride` bytes apart, MSB
    /// first, `1` = ink. Parts of `area` outside the screen are ignored.
    /// `on_complete` is called exactly once with the result, whatever it is.
    pub async fn flush<SPI, F>(
        &mut self,
        spi: &mut SPI,
        area: Area,
        pixels: &[u8],
        row_stride: usize,
        on_complete: F,
    ) -> Result<FlushOutcome, FlushError<P::Error>>
    where
        P: EpdPanel<SPI>,
        F: FnOnce(&Result<FlushOutcome, FlushError<P::Error>>),
    {
        let result = self.flush_area(spi, area, pixels, row_stride).await;
        on_complete(&result);
        result
    }

    async fn flush_area<SPI>(
        &mut self,
        spi: &mut SPI,
        area: Area,
        pixels: &[u8],
        row_stride: usize,
    ) -> Result<FlushOutcome, FlushError<P::Error>>
    where
        P: EpdPanel<SPI>,
    {
        let visible = self.geometry.clip(area);
        if visible.is_empty() {
            debug!(
                "flush area x={} y={} w={} h={} is off screen",
                area.x, area.y, area.w, area.h
            );
            return Ok(FlushOutcome::Skipped);
        }
        let native = self.geometry.to_panel_area(visible);
        let Some(window) = align_window(
            native.x,
            native.y,
            native.w,
            native.h,
            self.geometry.width,
            self.geometry.height,
        ) else {
            return Ok(FlushOutcome::Skipped);
        };

        check_pixels(area, pixels, row_stride)?;
        self.blit(area, visible, pixels, row_stride);

        let full = self.scheduler.should_force_full();
        info!(
            "Flush area x={} y={} w={} h={} {}",
            area.x,
            area.y,
            area.w,
            area.h,
            if full { "full" } else { "partial" }
        );
        if full {
            self.refresh_full(spi).await.map_err(FlushError::Panel)?;
            self.scheduler.record_full();
            Ok(FlushOutcome::Full)
        } else {
            self.refresh_partial(spi, window)
                .await
                .map_err(FlushError::Panel)?;
            self.scheduler.record_partial();
            Ok(FlushOutcome::Partial(window))
        }
    }

    /// Copies the visible part of `area` into the shadow frame, inverting polarity
    fn blit(&mut self, area: Area, visible: Area, pixels: &[u8], row_stride: usize) {
        let frame_stride = (self.geometry.width / 8) as usize;
        // offset of the visible part inside the renderer buffer
        let src_x = (visible.x - area.x) as usize;
        let src_y = (visible.y - area.y) as usize;

        if self.geometry.rotation == DisplayRotation::Rotate0
            && src_x % 8 == 0
            && visible.x % 8 == 0
            && visible.w % 8 == 0
        {
            let bytes = visible.w as usize / 8;
            for row in 0..visible.h as usize {
                let src = (src_y + row) * row_stride + src_x / 8;
                let dst = (visible.y as usize + row) * frame_stride + visible.x as usize / 8;
                for (d, s) in self.shadow[dst..dst + bytes]
                    .iter_mut()
                    .zip(&pixels[src..src + bytes])
                {
                    *d = remap_polarity(*s);
                }
            }
            return;
        }

        for dy in 0..visible.h as usize {
            let row = &pixels[(src_y + dy) * row_stride..];
            for dx in 0..visible.w as usize {
                let sx = src_x + dx;
                let ink = row[sx / 8].get_bit(7 - sx % 8);
                let (px, py) = self
                    .geometry
                    .to_panel(visible.x as u32 + dx as u32, visible.y as u32 + dy as u32);
                let index = py as usize * frame_stride + px as usize / 8;
                self.shadow[index].set_bit(7 - px as usize % 8, !ink);
            }
        }
    }

    async fn refresh_full<SPI>(&mut self, spi: &mut SPI) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        let full = self.geometry.full_window();
        // old image first, so the controller does not see a transition that never happened
        self.panel.set_window(spi, full).await?;
        self.panel
            .write_frame_window(spi, RamPlane::Previous, &*self.shadow)
            .await?;
        self.panel.set_window(spi, full).await?;
        self.panel
            .write_frame_window(spi, RamPlane::Current, &*self.shadow)
            .await?;
        self.panel.update_full(spi, self.fast_full_update).await
    }

    async fn refresh_partial<SPI>(
        &mut self,
        spi: &mut SPI,
        window: RefreshWindow,
    ) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        self.panel.set_window(spi, window).await?;
        self.panel
            .write_frame_window(spi, RamPlane::Current, &*self.shadow)
            .await?;
        self.panel.update_partial(spi, window).await?;

        // both planes hold what is on the glass now
        for plane in [RamPlane::Previous, RamPlane::Current] {
            self.panel.set_window(spi, window).await?;
            self.panel
                .write_frame_window(spi, plane, &*self.shadow)
                .await?;
        }
        Ok(())
    }

    /// Sends the whole shadow frame with a full refresh
    pub async fn redraw<SPI>(&mut self, spi: &mut SPI) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        self.refresh_full(spi).await?;
        self.scheduler.record_full();
        Ok(())
    }

    /// Fills panel and shadow frame with `color`
    pub async fn clear<SPI>(&mut self, spi: &mut SPI, color: Color) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        self.shadow.fill(color.get_byte_value());
        self.panel.clear_screen(spi, color).await?;
        self.scheduler.record_full();
        Ok(())
    }

    pub async fn power_off<SPI>(&mut self, spi: &mut SPI) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        self.panel.power_off(spi).await
    }

    /// Puts the panel into deep sleep. The next flush wakes it up again.
    pub async fn hibernate<SPI>(&mut self, spi: &mut SPI) -> Result<(), P::Error>
    where
        P: EpdPanel<SPI>,
    {
        self.panel.hibernate(spi).await
    }
}

/// Checks that `pixels` covers `area` with `row_stride`
fn check_pixels<E>(area: Area, pixels: &[u8], row_stride: usize) -> Result<(), FlushError<E>> {
    let min = (area.w as usize + 7) / 8;
    if row_stride < min {
        return Err(FlushError::StrideTooShort {
            min,
            actual: row_stride,
        });
    }
    let expected = row_stride
        .checked_mul(area.h as usize - 1)
        .and_then(|rows| rows.checked_add(min))
        .ok_or(FlushError::BufferMismatch {
            expected: usize::MAX,
            actual: pixels.len(),
        })?;
    if pixels.len() < expected {
        return Err(FlushError::BufferMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
