//! B/W Color for the panel RAM
//!
//! The controllers store `1` for a white pixel and `0` for a black one.
//! Renderers usually do the opposite (`1` = ink), see [`crate::bridge::remap_polarity`].

/// Only for the B/W Displays
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    Black,
    #[default]
    White,
}

impl Color {
    /// Gets a full byte of black or white pixels
    pub fn get_byte_value(&self) -> u8 {
        match self {
            Color::White => 0xff,
            Color::Black => 0x00,
        }
    }
}
