//! Dirty tracking and strip-wise pixel pushes.
//!
//! Cells are never pushed whole. Every change marks a rectangle dirty; once
//! per frame the renderer redraws each dirty rectangle in horizontal strips
//! small enough for one bus transfer, composing the cell view and any flap
//! overlay into a reusable scratch buffer before pushing it.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt::Debug;
use core::ops::Range;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::cell::Surface;
use crate::error::{Error, Result};
use crate::flapper::Flapper;
use crate::snapshot::allocate_pixels;

// =============================================================================
// Dirty Area
// =============================================================================

/// Bounding box of everything invalidated since the last render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyArea(Option<Rectangle>);

impl DirtyArea {
    pub const fn new() -> Self { Self(None) }

    /// Grow the dirty area to include `rect`. Empty rectangles are ignored.
    pub fn add(
        &mut self,
        rect: Rectangle,
    ) {
        let Some(bottom_right) = rect.bottom_right() else {
            return;
        };
        self.0 = Some(match self.0.and_then(|current| Some((current.top_left, current.bottom_right()?))) {
            Some((top_left, current_bottom_right)) => Rectangle::with_corners(
                top_left.component_min(rect.top_left),
                current_bottom_right.component_max(bottom_right),
            ),
            None => rect,
        });
    }

    /// Take the dirty rectangle, leaving the area clean.
    pub const fn take(&mut self) -> Option<Rectangle> { self.0.take() }

    #[inline]
    pub const fn is_clean(&self) -> bool { self.0.is_none() }
}

// =============================================================================
// Draw Buffer
// =============================================================================

/// A window of pixels placed at `area` in cell coordinates.
///
/// Drawing outside `area` is silently clipped, so a whole cell can be drawn
/// into a strip and only the strip's rows land.
pub struct DrawBuffer<'a> {
    pixels: &'a mut [Rgb565],
    area: Rectangle,
}

impl<'a> DrawBuffer<'a> {
    /// # Errors
    ///
    /// [`Error::RegionOutOfBounds`] if `pixels` is shorter than `area`.
    pub fn new(
        pixels: &'a mut [Rgb565],
        area: Rectangle,
    ) -> Result<Self> {
        let len = (area.size.width as usize)
            .checked_mul(area.size.height as usize)
            .ok_or(Error::RegionOutOfBounds)?;
        let pixels = pixels.get_mut(..len).ok_or(Error::RegionOutOfBounds)?;
        Ok(Self { pixels, area })
    }

    #[inline]
    pub const fn area(&self) -> Rectangle { self.area }

    #[inline]
    pub fn pixels(&self) -> &[Rgb565] { &*self.pixels }

    /// Columns `x` of row `y`, both in cell coordinates.
    ///
    /// # Errors
    ///
    /// [`Error::RegionOutOfBounds`] if the span leaves the buffer's area.
    pub fn row_mut(
        &mut self,
        y: i32,
        x: Range<i32>,
    ) -> Result<&mut [Rgb565]> {
        let left = self.area.top_left.x;
        let top = self.area.top_left.y;
        let width = self.area.size.width as i32;
        let height = self.area.size.height as i32;

        if y < top || y >= top + height || x.start < left || x.end > left + width || x.start > x.end {
            return Err(Error::RegionOutOfBounds);
        }
        let row_start = ((y - top) * width) as usize;
        let start = row_start + (x.start - left) as usize;
        let end = row_start + (x.end - left) as usize;
        self.pixels.get_mut(start..end).ok_or(Error::RegionOutOfBounds)
    }

    fn index(
        &self,
        point: Point,
    ) -> Option<usize> {
        self.area.contains(point).then(|| {
            let offset = point - self.area.top_left;
            offset.y as usize * self.area.size.width as usize + offset.x as usize
        })
    }
}

impl Dimensions for DrawBuffer<'_> {
    fn bounding_box(&self) -> Rectangle { self.area }
}

impl DrawTarget for DrawBuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(slot) = self.index(point).and_then(|index| self.pixels.get_mut(index)) {
                *slot = color;
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let area = area.intersection(&self.area);
        let x = area.top_left.x..area.top_left.x + area.size.width as i32;
        for y in area.rows() {
            if let Ok(row) = self.row_mut(y, x.clone()) {
                row.fill(color);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Pixel Sink
// =============================================================================

/// Destination of rendered strips: one physical display per cell.
pub trait PixelSink {
    type Error: Debug;

    /// Blit `pixels` (row-major, `area.size` entries) to `area` of `cell`.
    fn push_pixels(
        &mut self,
        cell: usize,
        area: Rectangle,
        pixels: &[Rgb565],
    ) -> Result<(), Self::Error>;
}

// =============================================================================
// Cell Renderer
// =============================================================================

/// Redraws dirty cell areas strip by strip through a shared scratch buffer.
#[derive(Debug)]
pub struct CellRenderer {
    strip_rows: u32,
    scratch: Vec<Rgb565>,
}

impl CellRenderer {
    /// Scratch sized for `strip_rows` rows of `width` pixels.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the scratch buffer cannot be reserved.
    pub fn new(
        width: u32,
        strip_rows: u32,
    ) -> Result<Self> {
        let scratch = allocate_pixels(width, strip_rows)?;
        Ok(Self { strip_rows, scratch })
    }

    #[inline]
    pub const fn strip_rows(&self) -> u32 { self.strip_rows }

    /// Redraw `area` of cell `cell`: view first, flap overlay on top, one
    /// push per strip. Returns the number of pushes.
    ///
    /// # Errors
    ///
    /// [`Error::PixelPush`] if the sink rejects a strip, or a compositing
    /// error from the overlay.
    pub fn render<S, M, P>(
        &mut self,
        cell: usize,
        view: &S,
        flapper: &Flapper<M>,
        area: Rectangle,
        sink: &mut P,
    ) -> Result<usize>
    where
        S: Surface,
        P: PixelSink,
    {
        let area = area.intersection(&Rectangle::new(Point::zero(), view.size()));
        if area.is_zero_sized() {
            return Ok(0);
        }

        let mut pushes = 0;
        let bottom = area.top_left.y + area.size.height as i32;
        let mut y = area.top_left.y;
        while y < bottom {
            let rows = self.strip_rows.min((bottom - y) as u32);
            let strip = Rectangle::new(Point::new(area.top_left.x, y), Size::new(area.size.width, rows));

            let mut buffer = DrawBuffer::new(&mut self.scratch, strip)?;
            let Ok(()) = view.draw(&mut buffer);
            flapper.draw_overlay(&mut buffer, strip)?;

            sink.push_pixels(cell, strip, buffer.pixels()).map_err(|err| {
                log::error!("push to cell {cell} at {strip:?} failed: {err:?}");
                Error::PixelPush { cell }
            })?;

            pushes += 1;
            y += rows as i32;
        }
        Ok(pushes)
    }
}

// =============================================================================
// Tests
// =============================================================================
