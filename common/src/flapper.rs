//! Single-cell flip engine.
//!
//! A [`Flapper`] is bound to one cell for its whole life. One flip is:
//!
//! 1. [`Flapper::before`]: snapshot the cell as it looks now
//! 2. the owner changes the cell's glyph
//! 3. [`Flapper::after`]: snapshot the new look
//! 4. [`Flapper::start`]: animate the fold line from 0 to the cell height,
//!    compositing the two snapshots over the cell every frame
//!
//! When the animation ends the snapshots are released, the overlay is torn
//! down and the registered completion message is deferred exactly once.
//! Capturing again, or [`Flapper::stop`], tears the overlay down without
//! delivering anything.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::animation::Animation;
use crate::cell::Surface;
use crate::compositor::{axis_for, band, compose};
use crate::config::CREASE_ROWS;
use crate::easing::AnimationPath;
use crate::error::{Error, Result};
use crate::render::{DirtyArea, DrawBuffer};
use crate::snapshot::Snapshot;
use crate::timers::Defer;

/// Observable lifecycle of a flapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlapperState {
    Idle,
    BeforeCaptured,
    Ready,
    Animating,
}

/// A running flip. Dropping it is the teardown.
#[derive(Clone, Copy, Debug)]
struct Overlay {
    animation: Animation,
    fold: i32,
}

/// Flip engine for one cell. `M` is the completion message.
#[derive(Debug)]
pub struct Flapper<M> {
    size: Size,
    duration_ms: u32,
    before: Option<Snapshot>,
    after: Option<Snapshot>,
    overlay: Option<Overlay>,
    finished: Option<M>,
    dirty: DirtyArea,
}

impl<M> Flapper<M> {
    pub const fn new(
        size: Size,
        duration_ms: u32,
    ) -> Self {
        Self {
            size,
            duration_ms,
            before: None,
            after: None,
            overlay: None,
            finished: None,
            dirty: DirtyArea::new(),
        }
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Cancel any flip and capture the pre-change look of `surface`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the snapshot cannot be allocated.
    pub fn before<S: Surface>(
        &mut self,
        surface: &S,
    ) -> Result<()> {
        self.cancel();
        self.before = None;
        self.before = Some(Snapshot::capture(surface)?);
        Ok(())
    }

    /// Cancel any flip and capture the post-change look of `surface`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the snapshot cannot be allocated.
    pub fn after<S: Surface>(
        &mut self,
        surface: &S,
    ) -> Result<()> {
        self.cancel();
        self.after = None;
        self.after = Some(Snapshot::capture(surface)?);
        Ok(())
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Start a flip at `now_ms`. The last flip of a sequence bounces.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSnapshot`] unless both snapshots were captured.
    pub fn start(
        &mut self,
        now_ms: u64,
        is_last: bool,
    ) -> Result<()> {
        self.cancel();
        if self.before.is_none() || self.after.is_none() {
            return Err(Error::MissingSnapshot);
        }

        let path = if is_last {
            AnimationPath::Bounce
        } else {
            AnimationPath::EaseInOut
        };
        self.overlay = Some(Overlay {
            animation: Animation::new(now_ms, self.duration_ms, 0, self.size.height as i32, path),
            fold: 0,
        });
        self.mark_dirty();
        Ok(())
    }

    /// Cancel the flip and release the snapshots. Nothing is delivered.
    pub fn stop(&mut self) {
        self.cancel();
        self.before = None;
        self.after = None;
    }

    /// Message deferred when the next flip completes.
    pub fn set_finished_callback(
        &mut self,
        message: M,
    ) {
        self.finished = Some(message);
    }

    /// Unregister the completion message, returning it.
    pub const fn clear_finished_callback(&mut self) -> Option<M> { self.finished.take() }

    /// Advance the flip to `now_ms`.
    ///
    /// Invalidates the rows the fold moved across. On completion releases
    /// both snapshots and defers the completion message through `events`.
    pub fn tick<D: Defer<M>>(
        &mut self,
        now_ms: u64,
        events: &mut D,
    ) {
        let axis = self.axis();
        let width = self.size.width;
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };

        let fold = overlay.animation.value_at(now_ms);
        if fold != overlay.fold {
            let top = overlay.fold.min(fold).min(axis);
            let bottom = (overlay.fold.max(fold) + CREASE_ROWS - 1).max(axis);
            self.dirty.add(band(width, top, bottom));
            overlay.fold = fold;
        }

        if overlay.animation.is_finished(now_ms) {
            self.stop();
            if let Some(message) = self.finished.take() {
                events.defer(message);
            }
        }
    }

    fn cancel(&mut self) {
        if self.overlay.take().is_some() {
            self.mark_dirty();
        }
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Composite the running flip over `dest`, limited to `clip`. No-op when
    /// idle.
    ///
    /// # Errors
    ///
    /// Compositing errors, see [`compose`].
    pub fn draw_overlay(
        &self,
        dest: &mut DrawBuffer<'_>,
        clip: Rectangle,
    ) -> Result<()> {
        match (&self.overlay, &self.before, &self.after) {
            (Some(overlay), Some(before), Some(after)) => compose(before, after, overlay.fold, self.axis(), dest, clip),
            _ => Ok(()),
        }
    }

    pub fn mark_dirty(&mut self) { self.dirty.add(Rectangle::new(Point::zero(), self.size)); }

    pub const fn take_dirty(&mut self) -> Option<Rectangle> { self.dirty.take() }

    // =========================================================================
    // Queries
    // =========================================================================

    pub const fn state(&self) -> FlapperState {
        match (&self.overlay, &self.before, &self.after) {
            (Some(_), ..) => FlapperState::Animating,
            (None, Some(_), Some(_)) => FlapperState::Ready,
            (None, Some(_), None) => FlapperState::BeforeCaptured,
            _ => FlapperState::Idle,
        }
    }

    #[inline]
    pub const fn is_animating(&self) -> bool { self.overlay.is_some() }

    #[inline]
    pub const fn has_finished_callback(&self) -> bool { self.finished.is_some() }

    #[inline]
    pub const fn axis(&self) -> i32 { axis_for(self.size.height) }

    /// Current fold line while animating.
    pub fn fold(&self) -> Option<i32> { self.overlay.map(|overlay| overlay.fold) }

    /// Path of the running flip.
    pub fn path(&self) -> Option<AnimationPath> { self.overlay.map(|overlay| overlay.animation.path()) }
}
