//! Character loops and glyph path resolution.
//!
//! A physical split-flap cell can only rotate forward through its fixed ring
//! of cards. To change from one glyph to another it must show every card in
//! between, so the animation for a change is the forward walk around the
//! ring from the current glyph to the target glyph.
//!
//! Two rings exist:
//!
//! | Loop | Cards |
//! |------|-------|
//! | [`DIGIT_LOOP`] | blank, `:`, `0`..`9` |
//! | [`DIVIDER_LOOP`] | blank, `:` |
//!
//! The divider loop is used only when the target glyph is `:`.
//!
//! # Example
//!
//! ```
//! use flapclock_common::character_loop::resolve;
//! use flapclock_common::Glyph;
//!
//! let path = resolve(Glyph::from_char('3'), Glyph::from_char('7')).unwrap();
//! assert_eq!(path.len(), 4); // 4, 5, 6, 7
//! ```

use crate::error::{Error, Result};
use crate::glyph::Glyph;

/// Largest supported loop. Bounds every resolved path.
pub const MAX_LOOP_LEN: usize = 12;

/// Ordered glyphs to show, one per flip.
pub type GlyphPath = heapless::Vec<Glyph, MAX_LOOP_LEN>;

/// A cyclic, ordered ring of unique glyphs.
#[derive(Debug)]
pub struct CharacterLoop {
    glyphs: &'static [Glyph],
}

static DIGIT_GLYPHS: [Glyph; 12] = [
    Glyph::BLANK,
    Glyph::COLON,
    Glyph::from_char('0'),
    Glyph::from_char('1'),
    Glyph::from_char('2'),
    Glyph::from_char('3'),
    Glyph::from_char('4'),
    Glyph::from_char('5'),
    Glyph::from_char('6'),
    Glyph::from_char('7'),
    Glyph::from_char('8'),
    Glyph::from_char('9'),
];

static DIVIDER_GLYPHS: [Glyph; 2] = [Glyph::BLANK, Glyph::COLON];

/// Blank, colon, then the ten digits.
pub static DIGIT_LOOP: CharacterLoop = CharacterLoop::new(&DIGIT_GLYPHS);

/// Blank and colon only.
pub static DIVIDER_LOOP: CharacterLoop = CharacterLoop::new(&DIVIDER_GLYPHS);

impl CharacterLoop {
    /// Build a loop. Panics at compile time for empty or oversized loops.
    pub const fn new(glyphs: &'static [Glyph]) -> Self {
        assert!(!glyphs.is_empty() && glyphs.len() <= MAX_LOOP_LEN);
        Self { glyphs }
    }

    /// Loop used to reach `target`: the divider loop for `:`, the digit loop otherwise.
    pub fn for_target(target: Glyph) -> &'static Self {
        if matches!(target.as_char(), Some(':')) {
            &DIVIDER_LOOP
        } else {
            &DIGIT_LOOP
        }
    }

    #[inline]
    pub const fn len(&self) -> usize { self.glyphs.len() }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.glyphs.is_empty() }

    #[inline]
    pub const fn glyphs(&self) -> &'static [Glyph] { self.glyphs }

    /// Position of `glyph` in the loop.
    pub fn position(
        &self,
        glyph: Glyph,
    ) -> Option<usize> {
        self.glyphs.iter().position(|candidate| *candidate == glyph)
    }

    /// Forward path from `current` to `target`, excluding `current` and
    /// ending with `target`.
    ///
    /// When `current == target` the walk makes one full revolution, so the
    /// path is never empty.
    ///
    /// # Errors
    ///
    /// [`Error::GlyphNotInLoop`] if either glyph is missing from this loop.
    pub fn path(
        &self,
        current: Glyph,
        target: Glyph,
    ) -> Result<GlyphPath> {
        let start = self.position(current).ok_or(Error::GlyphNotInLoop(current))?;
        let end = self.position(target).ok_or(Error::GlyphNotInLoop(target))?;
        let len = self.glyphs.len();

        let distance = match (end + len - start) % len {
            0 => len,
            steps => steps,
        };

        Ok((1..=distance)
            .filter_map(|step| self.glyphs.get((start + step) % len).copied())
            .collect())
    }
}

/// Resolve the flip path for a cell change, choosing the loop from `target`.
///
/// # Errors
///
/// [`Error::GlyphNotInLoop`] if either glyph is missing from the chosen loop.
pub fn resolve(
    current: Glyph,
    target: Glyph,
) -> Result<GlyphPath> {
    CharacterLoop::for_target(target).path(current, target)
}

// =============================================================================
// Tests
// =============================================================================
