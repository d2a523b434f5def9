//! Time-of-day text.
//!
//! The clock shows 12-hour time as `HH:MMxM`. The text is kept as seven
//! glyphs, formatted like `strftime("%I:%M%p")`; the six cells slice it
//! one glyph each, with the trailing "M" drawn as the meridiem cell's fixed
//! sub-label rather than a cell of its own.

use core::fmt;

use crate::config::CELL_COUNT;
use crate::glyph::Glyph;

/// Number of glyphs in formatted clock text.
pub const CLOCK_TEXT_LEN: usize = 7;

/// Source of the current wall-clock time.
pub trait TimeSource {
    fn now(&self) -> time::Time;
}

/// Formatted `%I:%M%p` text, e.g. `09:05AM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockText([Glyph; CLOCK_TEXT_LEN]);

impl ClockText {
    pub fn from_time(time: time::Time) -> Self {
        let hour = match time.hour() % 12 {
            0 => 12,
            hour => hour,
        };
        let minute = time.minute();
        let meridiem = if time.hour() < 12 { 'A' } else { 'P' };

        let digit = |value: u8| Glyph::digit(u32::from(value)).unwrap_or(Glyph::BLANK);
        Self([
            digit(hour / 10),
            digit(hour % 10),
            Glyph::COLON,
            digit(minute / 10),
            digit(minute % 10),
            Glyph::from_char(meridiem),
            Glyph::M,
        ])
    }

    /// Glyph at `index`, blank past the end.
    pub fn glyph(
        &self,
        index: usize,
    ) -> Glyph {
        self.0.get(index).copied().unwrap_or(Glyph::BLANK)
    }

    /// Glyph shown by display cell `cell`.
    pub fn cell_glyph(
        &self,
        cell: usize,
    ) -> Glyph {
        if cell < CELL_COUNT { self.glyph(cell) } else { Glyph::BLANK }
    }

    #[inline]
    pub const fn glyphs(&self) -> &[Glyph; CLOCK_TEXT_LEN] { &self.0 }
}

impl fmt::Display for ClockText {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.iter().try_for_each(|glyph| write!(f, "{glyph}"))
    }
}
