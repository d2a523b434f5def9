//! Captured cell images.
//!
//! A [`Snapshot`] is a heap-allocated true-color copy of a cell at one
//! instant. The flapper keeps two alive per flip ("before" and "after") and
//! composites between them every frame.

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::cell::Surface;
use crate::colors::BLACK;
use crate::config::BYTES_PER_PIXEL;
use crate::error::{Error, Result};

/// Pixel layout of a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// Plain Rgb565.
    #[default]
    TrueColor,
    /// Rgb565 where one color is treated as transparent. Not composable.
    TrueColorChromaKeyed,
}

/// An immutable-after-capture pixel image of a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<Rgb565>,
}

impl Snapshot {
    /// Allocate a black true-color image of `size`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the pixel buffer cannot be reserved.
    pub fn allocate(size: Size) -> Result<Self> {
        let pixels = allocate_pixels(size.width, size.height)?;

        Ok(Self {
            width: size.width,
            height: size.height,
            format: PixelFormat::TrueColor,
            pixels,
        })
    }

    /// Render `surface` into a freshly allocated snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the pixel buffer cannot be reserved.
    pub fn capture<S: Surface>(surface: &S) -> Result<Self> {
        let mut snapshot = Self::allocate(surface.size())?;
        let Ok(()) = surface.draw(&mut snapshot);
        Ok(snapshot)
    }

    /// Wrap existing pixels.
    ///
    /// # Errors
    ///
    /// [`Error::RegionOutOfBounds`] if `pixels` does not hold exactly
    /// `width * height` entries.
    pub fn from_pixels(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<Rgb565>,
    ) -> Result<Self> {
        if Some(pixels.len()) != (width as usize).checked_mul(height as usize) {
            return Err(Error::RegionOutOfBounds);
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    #[inline]
    pub const fn width(&self) -> u32 { self.width }

    #[inline]
    pub const fn height(&self) -> u32 { self.height }

    #[inline]
    pub const fn format(&self) -> PixelFormat { self.format }

    #[inline]
    pub fn pixels(&self) -> &[Rgb565] { &self.pixels }

    /// One full row, or `None` outside the image.
    pub fn row(
        &self,
        y: i32,
    ) -> Option<&[Rgb565]> {
        let y = usize::try_from(y).ok()?;
        let width = self.width as usize;
        self.pixels.get(y * width..(y + 1) * width)
    }

    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb565> {
        self.index(point).and_then(|index| self.pixels.get(index).copied())
    }

    fn index(
        &self,
        point: Point,
    ) -> Option<usize> {
        let x = u32::try_from(point.x).ok()?;
        let y = u32::try_from(point.y).ok()?;
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

/// Black pixel buffer of `width * height`, allocated fallibly.
///
/// # Errors
///
/// [`Error::OutOfMemory`] if the buffer cannot be reserved or its byte size
/// does not fit in `usize`.
pub(crate) fn allocate_pixels(
    width: u32,
    height: u32,
) -> Result<Vec<Rgb565>> {
    let (len, bytes) = (width as usize)
        .checked_mul(height as usize)
        .and_then(|len| Some((len, len.checked_mul(BYTES_PER_PIXEL)?)))
        .ok_or(Error::OutOfMemory { bytes: usize::MAX })?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|_| Error::OutOfMemory { bytes })?;
    pixels.resize(len, BLACK);
    Ok(pixels)
}

impl OriginDimensions for Snapshot {
    fn size(&self) -> Size { Size::new(self.width, self.height) }
}

impl DrawTarget for Snapshot {
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
}

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    use super::*;

    struct Striped;

    impl Surface for Striped {
        fn size(&self) -> Size { Size::new(4, 3) }

        fn draw<D: DrawTarget<Color = Rgb565>>(
            &self,
            target: &mut D,
        ) -> Result<(), D::Error> {
            Rectangle::new(Point::new(0, 1), Size::new(4, 1))
                .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
                .draw(target)
        }
    }

    #[test]
    fn test_allocate_is_black() {
        let snapshot = Snapshot::allocate(Size::new(3, 2)).unwrap();
        assert_eq!(snapshot.pixels().len(), 6);
        assert!(snapshot.pixels().iter().all(|p| *p == BLACK));
        assert_eq!(snapshot.format(), PixelFormat::TrueColor);
    }

    #[test]
    fn test_capture_draws_surface() {
        let snapshot = Snapshot::capture(&Striped).unwrap();
        assert_eq!(snapshot.size(), Size::new(4, 3));
        assert_eq!(snapshot.row(0), Some(&[BLACK; 4][..]));
        assert_eq!(snapshot.row(1), Some(&[Rgb565::RED; 4][..]));
        assert_eq!(snapshot.row(3), None);
        assert_eq!(snapshot.row(-1), None);
    }

    #[test]
    fn test_out_of_bounds_draws_are_dropped() {
        let mut snapshot = Snapshot::allocate(Size::new(2, 2)).unwrap();
        let Ok(()) = snapshot.draw_iter([
            Pixel(Point::new(5, 0), Rgb565::RED),
            Pixel(Point::new(-1, 1), Rgb565::RED),
            Pixel(Point::new(1, 1), Rgb565::GREEN),
        ]);
        assert_eq!(snapshot.pixel(Point::new(1, 1)), Some(Rgb565::GREEN));
        assert_eq!(snapshot.pixels().iter().filter(|p| **p == Rgb565::RED).count(), 0);
    }

    #[test]
    fn test_oversized_allocation_fails_cleanly() {
        assert_eq!(
            Snapshot::allocate(Size::new(u32::MAX, u32::MAX)),
            Err(Error::OutOfMemory { bytes: usize::MAX })
        );
        assert!(matches!(
            Snapshot::allocate(Size::new(1 << 20, u32::MAX)),
            Err(Error::OutOfMemory { .. })
        ));
    }

    #[test]
    fn test_from_pixels_checks_length() {
        assert_eq!(
            Snapshot::from_pixels(2, 2, PixelFormat::TrueColor, alloc::vec![BLACK; 3]),
            Err(Error::RegionOutOfBounds)
        );
        assert!(Snapshot::from_pixels(2, 2, PixelFormat::TrueColor, alloc::vec![BLACK; 4]).is_ok());
    }
}
