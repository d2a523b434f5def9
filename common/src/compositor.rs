//! Perspective compositing of a flip.
//!
//! A flip is drawn from two snapshots and one scalar, the fold line, which
//! travels from the top of the cell (0) to the bottom (height). The flap
//! rotates around a horizontal axis a few pixels above center:
//!
//! ```text
//!   0 ┌──────────┐
//!     │  after   │  flat: the new top half, already uncovered
//! fold├──────────┤  crease (3 rows)
//!     │ before ↓ │  perspective: old top half folding down onto the axis
//! axis├──────────┤
//!     │  before  │  flat: old bottom half, not yet covered
//!   H └──────────┘
//! ```
//!
//! Once the fold passes the axis the new bottom half unfolds from the axis
//! down to the fold, again under perspective, and only the part below the
//! fold still shows "before".
//!
//! Foreshortening is done per row, not per pixel: every pixel of a row is at
//! the same depth, so each destination row copies exactly one source row.
//! The source row is picked with 1/z-weighted interpolation in I16F16 fixed
//! point, which keeps the copy cheap enough for a frame on the device.

use core::ops::Range;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use fixed::types::I16F16;
use micromath::F32;

use crate::colors::CREASE;
use crate::config::AXIS_MARGIN;
use crate::error::{Error, Result};
use crate::render::DrawBuffer;
use crate::snapshot::{PixelFormat, Snapshot};

/// Row the flap rotates around for a cell of `height` pixels.
pub const fn axis_for(height: u32) -> i32 { height as i32 / 2 - AXIS_MARGIN }

// =============================================================================
// Foreshortening
// =============================================================================

/// Maps destination rows of a band onto source rows `first_row..=last_row`
/// as seen on a card tilted away from the viewer.
///
/// The tilt is derived from how much the band is squashed: the source band
/// is treated as the radius of a circle and the destination height as the
/// projected chord, so `depth = 1 - sqrt(r² - y²) / r`. The last source row
/// is the far edge (depth `1 + depth`), the first is at the screen plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Foreshortening {
    first_row: i32,
    last_row: i32,
    depth: I16F16,
}

impl Foreshortening {
    pub fn new(
        first_row: i32,
        last_row: i32,
        dest_height: i32,
    ) -> Self {
        let r = last_row - first_row;
        let depth = if r <= 0 {
            0.0
        } else {
            let y_pos = (r + 1) - dest_height;
            let chord_sq = (r * r - y_pos * y_pos).max(0) as f32;
            (1.0 - F32(chord_sq).sqrt().0 / r as f32).clamp(0.0, 1.0)
        };

        Self {
            first_row,
            last_row,
            depth: I16F16::from_num(depth),
        }
    }

    /// Extra depth of the far edge, 0 (flat) to 1.
    #[inline]
    pub const fn depth(&self) -> I16F16 { self.depth }

    /// Source row for `alpha` (0 = first destination row, 1 = past the last),
    /// truncated toward the first row.
    pub fn source_row(
        &self,
        alpha: I16F16,
    ) -> i32 {
        let alpha = alpha.clamp(I16F16::ZERO, I16F16::ONE);
        let rest = I16F16::ONE - alpha;
        let inv_min = I16F16::ONE;
        let inv_max = I16F16::ONE / (I16F16::ONE + self.depth);

        let y1 = I16F16::from_num(self.first_row);
        let y2 = I16F16::from_num(self.last_row);
        let numerator = rest * y1 * inv_min + alpha * y2 * inv_max;
        let denominator = rest * inv_min + alpha * inv_max;

        (numerator / denominator).to_num::<i32>().clamp(self.first_row, self.last_row)
    }
}

// =============================================================================
// Compose
// =============================================================================

/// Full-width rows `y1..=y2`, or an empty rectangle when `y2 < y1`.
pub fn band(
    width: u32,
    y1: i32,
    y2: i32,
) -> Rectangle {
    if y2 < y1 {
        return Rectangle::zero();
    }
    Rectangle::new(Point::new(0, y1), Size::new(width, (y2 - y1 + 1) as u32))
}

/// Draw one frame of a flip into `dest`, limited to `clip`.
///
/// `before` and `after` must be true-color snapshots of the same size; all
/// coordinates are cell coordinates.
///
/// # Errors
///
/// - [`Error::PixelFormatMismatch`] for a snapshot that is not plain true color
/// - [`Error::RegionOutOfBounds`] if the snapshots differ in size or a copy
///   would leave a buffer
pub fn compose(
    before: &Snapshot,
    after: &Snapshot,
    fold: i32,
    axis: i32,
    dest: &mut DrawBuffer<'_>,
    clip: Rectangle,
) -> Result<()> {
    for snapshot in [before, after] {
        if snapshot.format() != PixelFormat::TrueColor {
            return Err(Error::PixelFormatMismatch(snapshot.format()));
        }
    }
    if before.size() != after.size() {
        return Err(Error::RegionOutOfBounds);
    }

    let width = before.width();
    let height = before.height() as i32;
    let clip = clip
        .intersection(&dest.area())
        .intersection(&Rectangle::new(Point::zero(), before.size()));
    if clip.is_zero_sized() {
        return Ok(());
    }

    // Uncovered top of the new glyph
    copy_flat(after, band(width, 0, (fold - 1).min(axis)), dest, &clip)?;

    // Old top half folding down
    if fold < axis {
        copy_perspective(before, band(width, fold, axis - 3), 0..axis, dest, &clip)?;
    }

    for (offset, color) in (0..).zip(CREASE) {
        let row = band(width, fold + offset, fold + offset).intersection(&clip);
        if !row.is_zero_sized() {
            dest.row_mut(row.top_left.y, row.columns())?.fill(color);
        }
    }

    // New bottom half unfolding
    if fold > axis {
        copy_perspective(after, band(width, axis, fold), axis..height, dest, &clip)?;
    }

    // Still uncovered bottom of the old glyph
    copy_flat(before, band(width, axis.max(fold + 3), height - 1), dest, &clip)
}

fn copy_flat(
    src: &Snapshot,
    region: Rectangle,
    dest: &mut DrawBuffer<'_>,
    clip: &Rectangle,
) -> Result<()> {
    let region = region.intersection(clip);
    if region.is_zero_sized() {
        return Ok(());
    }
    for y in region.rows() {
        copy_row(src, y, y, region.columns(), dest)?;
    }
    Ok(())
}

/// Fill `region` (unclipped) with `source_rows` of `src` under perspective.
fn copy_perspective(
    src: &Snapshot,
    region: Rectangle,
    source_rows: Range<i32>,
    dest: &mut DrawBuffer<'_>,
    clip: &Rectangle,
) -> Result<()> {
    let top = region.top_left.y;
    let dest_height = region.size.height as i32;
    if dest_height == 0 || source_rows.is_empty() {
        return Ok(());
    }

    let lens = Foreshortening::new(source_rows.start, source_rows.end - 1, dest_height);
    let visible = region.intersection(clip);
    if visible.is_zero_sized() {
        return Ok(());
    }

    let height = I16F16::from_num(dest_height);
    for y in visible.rows() {
        let alpha = I16F16::from_num(y - top) / height;
        copy_row(src, lens.source_row(alpha), y, visible.columns(), dest)?;
    }
    Ok(())
}

fn copy_row(
    src: &Snapshot,
    src_y: i32,
    dest_y: i32,
    columns: Range<i32>,
    dest: &mut DrawBuffer<'_>,
) -> Result<()> {
    let start = usize::try_from(columns.start).map_err(|_| Error::RegionOutOfBounds)?;
    let end = usize::try_from(columns.end).map_err(|_| Error::RegionOutOfBounds)?;
    let source = src
        .row(src_y)
        .and_then(|row| row.get(start..end))
        .ok_or(Error::RegionOutOfBounds)?;
    dest.row_mut(dest_y, columns)?.copy_from_slice(source);
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use embedded_graphics::pixelcolor::Rgb565;

    use super::*;

    const W: u32 = 4;

    fn solid(
        height: u32,
        color: Rgb565,
    ) -> Snapshot {
        Snapshot::from_pixels(W, height, PixelFormat::TrueColor, vec![color; (W * height) as usize]).unwrap()
    }

    /// Every row a distinct color that is never pure red.
    fn gradient(height: u32) -> Snapshot {
        let pixels = (0..height)
            .flat_map(|y| [Rgb565::new((y / 64) as u8, (y % 64) as u8, 31); W as usize])
            .collect();
        Snapshot::from_pixels(W, height, PixelFormat::TrueColor, pixels).unwrap()
    }

    fn gradient_row(y: i32) -> Rgb565 { Rgb565::new((y / 64) as u8, (y % 64) as u8, 31) }

    /// Compose a whole cell and return its rows' first pixels.
    fn compose_full(
        before: &Snapshot,
        after: &Snapshot,
        fold: i32,
    ) -> Vec<Rgb565> {
        let height = before.height();
        let area = Rectangle::new(Point::zero(), before.size());
        let mut pixels = vec![Rgb565::BLACK; (W * height) as usize];
        let mut dest = DrawBuffer::new(&mut pixels, area).unwrap();
        compose(before, after, fold, axis_for(height), &mut dest, area).unwrap();
        pixels.chunks(W as usize).map(|row| row[0]).collect()
    }

    #[test]
    fn test_axis() {
        assert_eq!(axis_for(160), 76);
        assert_eq!(axis_for(162), 77);
    }

    #[test]
    fn test_fold_at_axis_is_two_flat_bands() {
        let before = solid(160, Rgb565::RED);
        let after = gradient(160);
        let rows = compose_full(&before, &after, 76);

        for y in 0..=75 {
            assert_eq!(rows[y as usize], gradient_row(y), "row {y}");
        }
        assert_eq!(&rows[76..79], &CREASE);
        assert!(rows[79..].iter().all(|p| *p == Rgb565::RED));
    }

    #[test]
    fn test_fold_at_bottom_shows_only_after() {
        let before = solid(162, Rgb565::RED);
        let after = solid(162, Rgb565::BLUE);
        let rows = compose_full(&before, &after, 162);
        assert!(rows.iter().all(|p| *p == Rgb565::BLUE));
    }

    #[test]
    fn test_fold_at_top_shows_before_below_crease() {
        let before = solid(162, Rgb565::RED);
        let after = solid(162, Rgb565::BLUE);
        let rows = compose_full(&before, &after, 0);

        assert_eq!(&rows[0..3], &CREASE);
        assert!(rows[3..=74].iter().all(|p| *p == Rgb565::RED));
        assert!(rows[77..].iter().all(|p| *p == Rgb565::RED));
        assert!(!rows.contains(&Rgb565::BLUE));
    }

    #[test]
    fn test_folding_band_samples_before_top_half() {
        let before = gradient(162);
        let after = solid(162, Rgb565::RED);
        let rows = compose_full(&before, &after, 30);

        // Flat "after" above the fold, then the squeezed top half of "before".
        assert!(rows[..30].iter().all(|p| *p == Rgb565::RED));
        assert_eq!(rows[33], gradient_row(Foreshortening::new(0, 76, 45).source_row(I16F16::from_num(3) / I16F16::from_num(45))));
        assert_eq!(rows[74], gradient_row(Foreshortening::new(0, 76, 45).source_row(I16F16::from_num(44) / I16F16::from_num(45))));
        assert_eq!(rows[100], gradient_row(100));
    }

    #[test]
    fn test_strips_match_full_compose() {
        let before = gradient(162);
        let after = solid(162, Rgb565::GREEN);

        for fold in [0, 40, 77, 120, 161, 162] {
            let full = compose_full(&before, &after, fold);

            for top in (0..162).step_by(25) {
                let rows = 25.min(162 - top) as u32;
                let area = Rectangle::new(Point::new(0, top), Size::new(W, rows));
                let mut pixels = vec![Rgb565::BLACK; (W * rows) as usize];
                let mut dest = DrawBuffer::new(&mut pixels, area).unwrap();
                compose(&before, &after, fold, 77, &mut dest, area).unwrap();

                for (offset, row) in pixels.chunks(W as usize).enumerate() {
                    assert_eq!(row[0], full[top as usize + offset], "fold {fold} row {}", top as usize + offset);
                }
            }
        }
    }

    #[test]
    fn test_source_row_endpoints_and_order() {
        let lens = Foreshortening::new(77, 161, 40);
        assert!(lens.depth() > I16F16::ZERO);
        assert_eq!(lens.source_row(I16F16::ZERO), 77);
        assert_eq!(lens.source_row(I16F16::ONE), 161);

        let mut previous = 77;
        for step in 0..=64 {
            let row = lens.source_row(I16F16::from_num(step) / I16F16::from_num(64));
            assert!(row >= previous && row <= 161);
            previous = row;
        }
    }

    #[test]
    fn test_source_row_truncates() {
        let lens = Foreshortening::new(0, 76, 45);
        let alpha = I16F16::from_num(1) / I16F16::from_num(45);
        let rest = I16F16::ONE - alpha;
        let inv_max = I16F16::ONE / (I16F16::ONE + lens.depth());
        let exact = (alpha * I16F16::from_num(76) * inv_max) / (rest + alpha * inv_max);

        assert!(exact.frac() > I16F16::ZERO);
        assert_eq!(lens.source_row(alpha), exact.floor().to_num::<i32>());
    }

    #[test]
    fn test_degenerate_band_has_no_depth() {
        let lens = Foreshortening::new(10, 10, 1);
        assert_eq!(lens.depth(), I16F16::ZERO);
        assert_eq!(lens.source_row(I16F16::from_num(0.5)), 10);
    }

    #[test]
    fn test_rejects_chroma_keyed_snapshot() {
        let before = solid(20, Rgb565::RED);
        let after = Snapshot::from_pixels(W, 20, PixelFormat::TrueColorChromaKeyed, vec![Rgb565::RED; 80]).unwrap();
        let area = Rectangle::new(Point::zero(), Size::new(W, 20));
        let mut pixels = vec![Rgb565::BLACK; 80];
        let mut dest = DrawBuffer::new(&mut pixels, area).unwrap();

        assert_eq!(
            compose(&before, &after, 5, axis_for(20), &mut dest, area),
            Err(Error::PixelFormatMismatch(PixelFormat::TrueColorChromaKeyed))
        );
    }
}
