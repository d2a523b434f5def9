//! Multi-flip sequences.
//!
//! A [`FlapSequence`] walks one cell through a glyph path, one flip per
//! glyph. It never runs on its own: the owner calls
//! [`FlapSequence::next_step`] once to begin and again each time the
//! flapper delivers the completion message the previous step registered.
//!
//! The sequence does not hold its flapper or cell. Both are lent to each
//! step by the owner, which keeps them alive at least as long as the
//! sequence.

use crate::cell::{CellText, Surface};
use crate::character_loop::GlyphPath;
use crate::error::Result;
use crate::flapper::Flapper;
use crate::glyph::Glyph;

/// Distinguishes sequences so completions of replaced ones can be ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SequenceId(u32);

impl SequenceId {
    pub const fn new(id: u32) -> Self { Self(id) }

    #[must_use]
    pub const fn next(self) -> Self { Self(self.0.wrapping_add(1)) }
}

/// Outcome of [`FlapSequence::next_step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStep {
    /// A flip to `glyph` started.
    Flipping { glyph: Glyph, is_last: bool },
    /// Every glyph has been shown. Nothing was started.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    Playing,
    Finished,
}

/// Ordered flips of one cell.
#[derive(Debug)]
pub struct FlapSequence<C> {
    id: SequenceId,
    values: GlyphPath,
    next_index: usize,
    finished: bool,
    update: fn(&mut C, Glyph),
}

impl<C: Surface + CellText> FlapSequence<C> {
    /// Sequence that shows each glyph through [`CellText::set_text`].
    pub fn new(
        id: SequenceId,
        values: GlyphPath,
    ) -> Self {
        Self::with_update(id, values, C::set_text)
    }

    /// Sequence with a custom text update.
    pub const fn with_update(
        id: SequenceId,
        values: GlyphPath,
        update: fn(&mut C, Glyph),
    ) -> Self {
        Self {
            id,
            values,
            next_index: 0,
            finished: false,
            update,
        }
    }

    #[inline]
    pub const fn id(&self) -> SequenceId { self.id }

    /// Flips not yet started.
    pub fn remaining(&self) -> usize { self.values.len().saturating_sub(self.next_index) }

    pub const fn state(&self) -> SequenceState {
        if self.finished {
            SequenceState::Finished
        } else if self.next_index == 0 {
            SequenceState::Idle
        } else {
            SequenceState::Playing
        }
    }

    /// Start the flip to the next glyph, or report that none is left.
    ///
    /// Snapshots the cell, applies the glyph, snapshots again and starts the
    /// flapper with `on_finished` as its completion message. The final flip
    /// is started with `is_last`.
    ///
    /// # Errors
    ///
    /// Capture or start errors from the flapper. If the post-change capture
    /// fails the cell's previous glyph is restored.
    pub fn next_step<M>(
        &mut self,
        now_ms: u64,
        flapper: &mut Flapper<M>,
        cell: &mut C,
        on_finished: M,
    ) -> Result<SequenceStep> {
        let Some(&glyph) = self.values.get(self.next_index) else {
            self.finished = true;
            return Ok(SequenceStep::Finished);
        };
        self.next_index += 1;

        flapper.before(cell)?;
        let previous = cell.text();
        (self.update)(cell, glyph);
        if let Err(err) = flapper.after(cell) {
            (self.update)(cell, previous);
            flapper.stop();
            return Err(err);
        }

        let is_last = self.next_index == self.values.len();
        flapper.set_finished_callback(on_finished);
        flapper.start(now_ms, is_last)?;
        Ok(SequenceStep::Flipping { glyph, is_last })
    }
}
