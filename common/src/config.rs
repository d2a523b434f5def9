//! Layout and timing configuration.
//!
//! Compile-time constants describe the physical clock (six 80x162 LCD panels
//! behind one SPI bus). [`ClockConfig`] carries the values a host may tune at
//! runtime; its defaults are the device values.

use embedded_graphics::prelude::Size;

use crate::error::{Error, Result};

// =============================================================================
// Panel Layout
// =============================================================================

/// Number of display cells: `H H : M M` plus the AM/PM cell.
pub const CELL_COUNT: usize = 6;

/// Index of the AM/PM cell.
pub const MERIDIEM_CELL: usize = 5;

/// Index of the hour/minute divider cell.
pub const COLON_CELL: usize = 2;

/// Cell width in pixels.
pub const CELL_WIDTH: u32 = 80;

/// Cell height in pixels.
pub const CELL_HEIGHT: u32 = 162;

/// Y coordinate of the flap hinge line.
pub const DIVIDER_Y: i32 = 75;

// =============================================================================
// Pixel Transfer
// =============================================================================

/// Largest single SPI transfer accepted by the display driver.
pub const MAX_TRANSFER_BYTES: usize = 4092;

/// Bytes per Rgb565 pixel on the wire.
pub const BYTES_PER_PIXEL: usize = 2;

/// Rows of a full-width strip that fit in one transfer (25).
pub const STRIP_ROWS: u32 = (MAX_TRANSFER_BYTES / CELL_WIDTH as usize / BYTES_PER_PIXEL) as u32;

// =============================================================================
// Animation Timing
// =============================================================================

/// Duration of one flip.
pub const FLIP_DURATION_MS: u32 = 1000;

/// Delay between the starts of consecutive changed cells.
pub const FLIP_SPACING_MS: u32 = 700;

/// Distance of the rotation axis above the vertical center.
pub const AXIS_MARGIN: i32 = 4;

/// Height of the crease drawn at the fold line.
pub const CREASE_ROWS: i32 = 3;

/// Refresh period when the clock is aligned to the minute.
pub const MINUTE_MS: u32 = 60_000;

/// Default seed of the shuffle filler generator.
pub const DEFAULT_SHUFFLE_SEED: u32 = 0x2545_F491;

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Tunable clock parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    pub cell_size: Size,
    pub flip_duration_ms: u32,
    pub flip_spacing_ms: u32,
    pub strip_rows: u32,
    pub shuffle_seed: u32,
}

impl ClockConfig {
    pub const fn new() -> Self {
        Self {
            cell_size: Size::new(CELL_WIDTH, CELL_HEIGHT),
            flip_duration_ms: FLIP_DURATION_MS,
            flip_spacing_ms: FLIP_SPACING_MS,
            strip_rows: STRIP_ROWS,
            shuffle_seed: DEFAULT_SHUFFLE_SEED,
        }
    }

    #[must_use]
    pub const fn with_cell_size(
        mut self,
        cell_size: Size,
    ) -> Self {
        self.cell_size = cell_size;
        self
    }

    #[must_use]
    pub const fn with_flip_duration_ms(
        mut self,
        flip_duration_ms: u32,
    ) -> Self {
        self.flip_duration_ms = flip_duration_ms;
        self
    }

    #[must_use]
    pub const fn with_flip_spacing_ms(
        mut self,
        flip_spacing_ms: u32,
    ) -> Self {
        self.flip_spacing_ms = flip_spacing_ms;
        self
    }

    #[must_use]
    pub const fn with_strip_rows(
        mut self,
        strip_rows: u32,
    ) -> Self {
        self.strip_rows = strip_rows;
        self
    }

    #[must_use]
    pub const fn with_shuffle_seed(
        mut self,
        shuffle_seed: u32,
    ) -> Self {
        self.shuffle_seed = shuffle_seed;
        self
    }

    /// Check the configuration can drive a flip.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.cell_size.width == 0 {
            return Err(Error::InvalidConfig("cell width must be non-zero"));
        }
        // The axis sits AXIS_MARGIN above center and needs room for the crease.
        if self.cell_size.height < 2 * (AXIS_MARGIN + CREASE_ROWS) as u32 {
            return Err(Error::InvalidConfig("cell height too small for the fold axis"));
        }
        if self.strip_rows == 0 {
            return Err(Error::InvalidConfig("strip rows must be non-zero"));
        }
        if self.flip_duration_ms == 0 {
            return Err(Error::InvalidConfig("flip duration must be non-zero"));
        }
        if self.shuffle_seed == 0 {
            return Err(Error::InvalidConfig("shuffle seed must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self { Self::new() }
}
