//! The six panels, side by side in one simulator window.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::SimulatorDisplay;
use flapclock_common::config::CELL_COUNT;
use flapclock_common::render::PixelSink;

/// Horizontal gap between neighbouring panels.
pub const PANEL_GAP: u32 = 30;

/// Pixel scale of the simulator window.
pub const WINDOW_SCALE: u32 = 2;

/// Size of a display holding `CELL_COUNT` panels of `cell_size`.
pub const fn display_size(cell_size: Size) -> Size {
    let count = CELL_COUNT as u32;
    Size::new(count * cell_size.width + (count - 1) * PANEL_GAP, cell_size.height)
}

/// Routes each cell's strips to its panel's place in the window.
pub struct PanelSink<'a> {
    display: &'a mut SimulatorDisplay<Rgb565>,
    pitch: i32,
}

impl<'a> PanelSink<'a> {
    pub fn new(
        display: &'a mut SimulatorDisplay<Rgb565>,
        cell_size: Size,
    ) -> Self {
        Self {
            display,
            pitch: (cell_size.width + PANEL_GAP) as i32,
        }
    }
}

impl PixelSink for PanelSink<'_> {
    type Error = Infallible;

    fn push_pixels(
        &mut self,
        cell: usize,
        area: Rectangle,
        pixels: &[Rgb565],
    ) -> Result<(), Self::Error> {
        let origin = Point::new(cell as i32 * self.pitch, 0);
        self.display.fill_contiguous(&area.translate(origin), pixels.iter().copied())
    }
}
