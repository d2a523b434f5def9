//! Cell surfaces.
//!
//! A cell is one LCD panel. Its look is fully determined by its kind and the
//! glyph it shows, so it can be redrawn at any time into any
//! [`DrawTarget`]: the panel itself (in strips), or a [`Snapshot`] when the
//! flapper captures it.
//!
//! [`Snapshot`]: crate::snapshot::Snapshot

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder};
use profont::{PROFONT_18_POINT, PROFONT_24_POINT};

use crate::colors::{BLACK, FLAP, HINGE, TEXT};
use crate::config::DIVIDER_Y;
use crate::glyph::Glyph;
use crate::render::DirtyArea;

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Something that can be rendered into a true-color target.
pub trait Surface {
    fn size(&self) -> Size;

    /// Draw the whole surface at the target's origin.
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        target: &mut D,
    ) -> Result<(), D::Error>;
}

/// Read and write the glyph a cell displays.
pub trait CellText {
    fn text(&self) -> Glyph;

    fn set_text(
        &mut self,
        glyph: Glyph,
    );
}

// =============================================================================
// Styles
// =============================================================================

const CENTERED: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Middle)
    .build();

const DIGIT_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_24_POINT, TEXT);

const MERIDIEM_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_18_POINT, TEXT);

/// Label offsets from the cell center.
const DIGIT_OFFSET: i32 = -7;
const MERIDIEM_LABEL_OFFSET: i32 = -44;
const MERIDIEM_SUBLABEL_OFFSET: i32 = 33;

/// The hinge line starts this far in from the left edge.
const HINGE_INSET: i32 = 8;
const HINGE_HEIGHT: u32 = 2;

const CARD_INSET: u32 = 2;
const CARD_RADIUS: u32 = 6;

// =============================================================================
// Cell View
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// One large centered glyph.
    Digit,
    /// "A"/"P" above a fixed "M".
    Meridiem,
}

/// Visual state of one panel.
#[derive(Clone, Debug)]
pub struct CellView {
    kind: CellKind,
    size: Size,
    label: Glyph,
    sublabel: Glyph,
    dirty: DirtyArea,
}

impl CellView {
    pub fn new_digit(size: Size) -> Self { Self::new(CellKind::Digit, size) }

    pub fn new_meridiem(size: Size) -> Self { Self::new(CellKind::Meridiem, size) }

    fn new(
        kind: CellKind,
        size: Size,
    ) -> Self {
        let mut view = Self {
            kind,
            size,
            label: Glyph::BLANK,
            sublabel: Glyph::BLANK,
            dirty: DirtyArea::new(),
        };
        view.mark_dirty();
        view
    }

    #[inline]
    pub const fn kind(&self) -> CellKind { self.kind }

    #[inline]
    pub const fn sublabel(&self) -> Glyph { self.sublabel }

    /// Set the secondary label directly. Only drawn by meridiem cells.
    pub fn set_sublabel(
        &mut self,
        glyph: Glyph,
    ) {
        if self.sublabel != glyph {
            self.sublabel = glyph;
            self.mark_dirty();
        }
    }

    /// Invalidate the whole cell.
    pub fn mark_dirty(&mut self) { self.dirty.add(Rectangle::new(Point::zero(), self.size)); }

    pub const fn take_dirty(&mut self) -> Option<Rectangle> { self.dirty.take() }

    fn center(&self) -> Point { Point::new(self.size.width as i32 / 2, self.size.height as i32 / 2) }

    fn draw_card<D: DrawTarget<Color = Rgb565>>(
        &self,
        target: &mut D,
    ) -> Result<(), D::Error> {
        target.fill_solid(&Rectangle::new(Point::zero(), self.size), BLACK)?;

        if self.size.width > 2 * CARD_INSET && self.size.height > 2 * CARD_INSET {
            let card = Rectangle::new(
                Point::new(CARD_INSET as i32, CARD_INSET as i32),
                self.size - Size::new(2 * CARD_INSET, 2 * CARD_INSET),
            );
            RoundedRectangle::with_equal_corners(card, Size::new(CARD_RADIUS, CARD_RADIUS))
                .into_styled(PrimitiveStyle::with_fill(FLAP))
                .draw(target)?;
        }

        let hinge_width = (self.size.width as i32 - 2 * HINGE_INSET).max(0) as u32;
        target.fill_solid(
            &Rectangle::new(Point::new(HINGE_INSET, DIVIDER_Y), Size::new(hinge_width, HINGE_HEIGHT)),
            HINGE,
        )
    }

    fn draw_glyph<D: DrawTarget<Color = Rgb565>>(
        target: &mut D,
        glyph: Glyph,
        position: Point,
        style: MonoTextStyle<'static, Rgb565>,
    ) -> Result<(), D::Error> {
        let mut buf = [0u8; 4];
        let text = glyph.encode(&mut buf);
        if text.is_empty() {
            return Ok(());
        }
        Text::with_text_style(text, position, style, CENTERED).draw(target)?;
        Ok(())
    }
}

impl Surface for CellView {
    fn size(&self) -> Size { self.size }

    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        target: &mut D,
    ) -> Result<(), D::Error> {
        self.draw_card(target)?;

        let center = self.center();
        match self.kind {
            CellKind::Digit => Self::draw_glyph(target, self.label, center + Point::new(0, DIGIT_OFFSET), DIGIT_STYLE),
            CellKind::Meridiem => {
                Self::draw_glyph(
                    target,
                    self.label,
                    center + Point::new(0, MERIDIEM_LABEL_OFFSET),
                    MERIDIEM_STYLE,
                )?;
                Self::draw_glyph(
                    target,
                    self.sublabel,
                    center + Point::new(0, MERIDIEM_SUBLABEL_OFFSET),
                    MERIDIEM_STYLE,
                )
            }
        }
    }
}

impl CellText for CellView {
    fn text(&self) -> Glyph { self.label }

    /// Meridiem cells show "M" under any non-blank letter.
    fn set_text(
        &mut self,
        glyph: Glyph,
    ) {
        if self.label != glyph {
            self.label = glyph;
            self.mark_dirty();
        }
        if self.kind == CellKind::Meridiem {
            self.set_sublabel(if glyph.is_blank() { Glyph::BLANK } else { Glyph::M });
        }
    }
}
