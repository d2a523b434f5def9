//! Color constants for the clock panels.
//!
//! All values are `Rgb565` (5 bits red, 6 bits green, 5 bits blue), the
//! native format of the panel LCDs.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

// =============================================================================
// Panel Colors
// =============================================================================

/// Panel background outside the flap card.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Warm off-white glyph color (#FCF9D9).
pub const TEXT: Rgb565 = Rgb565::new(31, 62, 27);

/// Flap card face. RGB565: (3, 6, 3), a very dark gray.
pub const FLAP: Rgb565 = Rgb565::new(3, 6, 3);

/// Gap between the upper and lower flap halves.
pub const HINGE: Rgb565 = Rgb565::BLACK;

// =============================================================================
// Crease
// =============================================================================

/// Rows drawn at the fold line, top to bottom: #999, #333, #555.
pub const CREASE: [Rgb565; 3] = [
    Rgb565::new(19, 38, 19),
    Rgb565::new(6, 12, 6),
    Rgb565::new(10, 21, 10),
];
