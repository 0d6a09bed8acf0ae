//! Rectangles in renderer and panel space, and the byte alignment between them
//!
//! The renderer works in *logical* coordinates (rotation applied), the controller RAM in
//! *native* coordinates. Columns of the controller are addressed in bytes of 8 pixels,
//! so every window handed to a panel starts and ends on a byte boundary.
use core::cmp;

/// Display rotation, only 90° increments supported
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate by 90 degrees clockwise
    Rotate90,
    /// Rotate by 180 degrees clockwise
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

/// A rectangle as the renderer reports it: logical coordinates, possibly partly off screen
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Area {
    /// Origin X, may be negative
    pub x: i32,
    /// Origin Y, may be negative
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Area {
    /// Construct a new area
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Area {
        Area { x, y, w, h }
    }

    /// Compute intersection with another area, empty areas have `w == 0` or `h == 0`
    pub fn intersect(&self, other: Area) -> Area {
        let x = cmp::max(self.x, other.x);
        let y = cmp::max(self.y, other.y);
        let right = cmp::min(
            self.x.saturating_add(self.w),
            other.x.saturating_add(other.w),
        );
        let bottom = cmp::min(
            self.y.saturating_add(self.h),
            other.y.saturating_add(other.h),
        );
        Area {
            x,
            y,
            w: right.saturating_sub(x).max(0),
            h: bottom.saturating_sub(y).max(0),
        }
    }

    /// Test whether the area is empty.
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// A byte aligned window in native panel coordinates
///
/// `x` and `w` are multiples of 8 and the window lies inside the panel.
/// Build it with [`align_window`] or [`RefreshWindow::full`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RefreshWindow {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl RefreshWindow {
    /// The whole panel
    pub const fn full(width: u32, height: u32) -> RefreshWindow {
        RefreshWindow {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }

    /// Bytes of controller RAM covered by the window
    pub const fn byte_len(&self) -> usize {
        (self.w / 8) as usize * self.h as usize
    }

    /// First and last RAM column (in bytes) of the window
    pub const fn byte_columns(&self) -> (u32, u32) {
        (self.x / 8, (self.x + self.w - 1) / 8)
    }

    /// Test whether `other` lies completely inside this window
    pub fn contains(&self, other: &RefreshWindow) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Rounds an arbitrary rectangle outward to whole RAM bytes and clips it to the panel.
///
/// Returns `None` when nothing of the rectangle is left on the panel.
/// A rounded window never wraps past the right edge, it is clamped to the panel width.
///
/// ```
/// use epd_refresh::geometry::{align_window, RefreshWindow};
///
/// assert_eq!(
///     align_window(1, 0, 5, 1, 296, 128),
///     Some(RefreshWindow { x: 0, y: 0, w: 8, h: 1 })
/// );
/// assert_eq!(align_window(-10, 4, 8, 8, 296, 128), None);
/// ```
pub fn align_window(
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    panel_w: u32,
    panel_h: u32,
) -> Option<RefreshWindow> {
    let (mut x, mut y, mut w, mut h) = (i64::from(x), i64::from(y), i64::from(w), i64::from(h));
    // only whole bytes of the panel are addressable
    let panel_w = i64::from(panel_w) / 8 * 8;
    let panel_h = i64::from(panel_h);

    if x < 0 {
        w += x;
        x = 0;
    }
    if y < 0 {
        h += y;
        y = 0;
    }
    if x + w > panel_w {
        w = panel_w - x;
    }
    if y + h > panel_h {
        h = panel_h - y;
    }
    if w <= 0 || h <= 0 {
        return None;
    }

    let skew = x % 8;
    w += skew;
    x -= skew;
    w = (w + 7) / 8 * 8;
    if x + w > panel_w {
        w = panel_w - x;
    }

    Some(RefreshWindow {
        x: x as u32,
        y: y as u32,
        w: w as u32,
        h: h as u32,
    })
}

/// Size and mounting of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Native width in pixels
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
    pub rotation: DisplayRotation,
}

impl PanelGeometry {
    pub const fn new(width: u32, height: u32, rotation: DisplayRotation) -> Self {
        PanelGeometry {
            width,
            height,
            rotation,
        }
    }

    /// Size the renderer draws on, `(width, height)`
    pub fn logical_size(&self) -> (u32, u32) {
        match self.rotation {
            DisplayRotation::Rotate0 | DisplayRotation::Rotate180 => (self.width, self.height),
            DisplayRotation::Rotate90 | DisplayRotation::Rotate270 => (self.height, self.width),
        }
    }

    /// Bytes of a native 1bpp frame
    pub fn buffer_len(&self) -> usize {
        crate::buffer_len(self.width as usize, self.height as usize)
    }

    pub fn full_window(&self) -> RefreshWindow {
        RefreshWindow::full(self.width / 8 * 8, self.height)
    }

    /// Clips a renderer area to the logical screen
    pub fn clip(&self, area: Area) -> Area {
        let (w, h) = self.logical_size();
        area.intersect(Area::new(0, 0, w as i32, h as i32))
    }

    /// Maps a logical pixel to the native pixel. The point has to be on screen.
    pub fn to_panel(&self, x: u32, y: u32) -> (u32, u32) {
        let (w, h) = (self.width, self.height);
        match self.rotation {
            DisplayRotation::Rotate0 => (x, y),
            DisplayRotation::Rotate90 => (w - 1 - y, x),
            DisplayRotation::Rotate180 => (w - 1 - x, h - 1 - y),
            DisplayRotation::Rotate270 => (y, h - 1 - x),
        }
    }

    /// Maps a clipped, non empty logical area to the native rectangle it covers
    pub fn to_panel_area(&self, area: Area) -> Area {
        let (w, h) = (self.width as i32, self.height as i32);
        match self.rotation {
            DisplayRotation::Rotate0 => area,
            DisplayRotation::Rotate90 => Area::new(w - area.y - area.h, area.x, area.h, area.w),
            DisplayRotation::Rotate180 => {
                Area::new(w - area.x - area.w, h - area.y - area.h, area.w, area.h)
            }
            DisplayRotation::Rotate270 => Area::new(area.y, h - area.x - area.w, area.h, area.w),
        }
    }
}
