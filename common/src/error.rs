//! Crate error type.

use derive_more::derive::{Display, Error};

use crate::glyph::Glyph;
use crate::snapshot::PixelFormat;

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for the flap engine.
///
/// Apart from [`Error::OutOfMemory`], every variant is a programming error
/// upstream (corrupted cell text, mismatched buffers, bad configuration) and
/// is propagated to the process rather than recovered in place.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
pub enum Error {
    #[display("glyph \"{_0}\" is not part of the selected character loop")]
    GlyphNotInLoop(#[error(not(source))] Glyph),

    #[display("text is not a single glyph")]
    InvalidGlyph,

    #[display("snapshot allocation of {bytes} bytes failed")]
    OutOfMemory { bytes: usize },

    #[display("snapshot pixel format {_0:?} cannot be composited")]
    PixelFormatMismatch(#[error(not(source))] PixelFormat),

    #[display("region copy exceeds buffer bounds")]
    RegionOutOfBounds,

    #[display("flip started without before/after snapshots")]
    MissingSnapshot,

    #[display("invalid configuration: {_0}")]
    InvalidConfig(#[error(not(source))] &'static str),

    #[display("pixel push to cell {cell} failed")]
    PixelPush { cell: usize },
}
