//! Displayable glyphs.
//!
//! A glyph is the single symbol a cell shows: a digit, the colon, one of the
//! meridiem letters, or nothing at all. The blank glyph is a real value (it is
//! part of the digit loop), not an absence of state.

use core::fmt;

use crate::error::Error;

/// One displayable symbol. `Glyph::BLANK` shows an empty flap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Glyph(Option<char>);

impl Glyph {
    /// The empty flap.
    pub const BLANK: Self = Self(None);

    /// The hour/minute divider.
    pub const COLON: Self = Self(Some(':'));

    /// Fixed second letter of the meridiem cell.
    pub const M: Self = Self(Some('M'));

    /// Glyph showing a single character.
    #[inline]
    pub const fn from_char(c: char) -> Self { Self(Some(c)) }

    /// Glyph for a decimal digit, or `None` if `value > 9`.
    pub fn digit(value: u32) -> Option<Self> { char::from_digit(value, 10).map(Self::from_char) }

    /// The character shown, `None` for blank.
    #[inline]
    pub const fn as_char(self) -> Option<char> { self.0 }

    #[inline]
    pub const fn is_blank(self) -> bool { self.0.is_none() }

    /// Encode the glyph as text into `buf`.
    pub fn encode(
        self,
        buf: &mut [u8; 4],
    ) -> &str {
        match self.0 {
            Some(c) => c.encode_utf8(buf),
            None => "",
        }
    }
}

impl From<char> for Glyph {
    fn from(c: char) -> Self { Self::from_char(c) }
}

impl TryFrom<&str> for Glyph {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Self::BLANK),
            (Some(c), None) => Ok(Self::from_char(c)),
            (Some(_), Some(_)) => Err(Error::InvalidGlyph),
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.0 {
            Some(c) => write!(f, "{c}"),
            None => Ok(()),
        }
    }
}
