//! Double-buffered monochrome framebuffer

use core::cell::Cell;

/// Widest supported panel; one row is one `u64`
pub const MAX_PANEL_WIDTH: usize = 64;

/// Something pixels can be drawn on
pub trait Surface {
    /// Width and height in pixels
    fn size(&self) -> (usize, usize);

    /// Set one pixel in the drawing buffer; out-of-range pixels are ignored
    fn write_pixel(&mut self, x: usize, y: usize, on: bool);

    /// Make everything drawn so far visible
    fn flush(&mut self);

    /// Switch every pixel in the drawing buffer off
    fn clear(&mut self) {
        let (width, height) = self.size();
        for y in 0..height {
            for x in 0..width {
                self.write_pixel(x, y, false);
            }
        }
    }
}

/// Panel framebuffer with a back buffer for drawing and a front buffer
/// for display
///
/// Each row is a bitmask, column `x` in bit `x`. Rows sit behind `Cell`s
/// so the surface can be drawn through a shared reference while a
/// [`PanelRefresh`](super::PanelRefresh) task reads the front buffer.
pub struct PanelSurface<const W: usize, const H: usize> {
    back: [Cell<u64>; H],
    front: [Cell<u64>; H],
}

impl<const W: usize, const H: usize> PanelSurface<W, H> {
    const VALID: () = assert!(W > 0 && W <= MAX_PANEL_WIDTH && H > 0);

    /// Mask of the bits used by one row
    pub const ROW_MASK: u64 = if W >= 64 { u64::MAX } else { (1 << W) - 1 };

    /// Blank surface
    pub const fn new() -> Self {
        let () = Self::VALID;
        Self {
            back: [const { Cell::new(0) }; H],
            front: [const { Cell::new(0) }; H],
        }
    }

    /// Width and height in pixels
    pub const fn size(&self) -> (usize, usize) {
        (W, H)
    }

    /// Set one pixel in the back buffer; out-of-range pixels are ignored
    pub fn write_pixel(&self, x: usize, y: usize, on: bool) {
        if x >= W {
            return;
        }
        if let Some(row) = self.back.get(y) {
            let bit = 1u64 << x;
            row.set(if on { row.get() | bit } else { row.get() & !bit });
        }
    }

    /// Switch every pixel in the back buffer off
    pub fn clear(&self) {
        for row in &self.back {
            row.set(0);
        }
    }

    /// Copy the back buffer to the front buffer
    pub fn flush(&self) {
        for (front, back) in self.front.iter().zip(&self.back) {
            front.set(back.get());
        }
    }

    /// Displayed state of one pixel
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < W && self.row(y) & (1 << x) != 0
    }

    /// Displayed row as a bitmask; rows out of range are blank
    pub fn row(&self, y: usize) -> u64 {
        self.front.get(y).map_or(0, Cell::get)
    }
}

impl<const W: usize, const H: usize> Default for PanelSurface<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> Surface for PanelSurface<W, H> {
    fn size(&self) -> (usize, usize) {
        (W, H)
    }

    fn write_pixel(&mut self, x: usize, y: usize, on: bool) {
        let surface: &PanelSurface<W, H> = self;
        surface.write_pixel(x, y, on);
    }

    fn flush(&mut self) {
        let surface: &PanelSurface<W, H> = self;
        surface.flush();
    }

    fn clear(&mut self) {
        let surface: &PanelSurface<W, H> = self;
        surface.clear();
    }
}

impl<const W: usize, const H: usize> Surface for &PanelSurface<W, H> {
    fn size(&self) -> (usize, usize) {
        (W, H)
    }

    fn write_pixel(&mut self, x: usize, y: usize, on: bool) {
        let surface: &PanelSurface<W, H> = self;
        surface.write_pixel(x, y, on);
    }

    fn flush(&mut self) {
        let surface: &PanelSurface<W, H> = self;
        surface.flush();
    }

    fn clear(&mut self) {
        let surface: &PanelSurface<W, H> = self;
        surface.clear();
    }
}
