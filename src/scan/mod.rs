//! Scan converters: turning edges into rows of antialiased coverage.
//!
//! A scan converter is created for a rectangle of pixels, fed some edges,
//! and then asked (once) to [`generate`](ScanConverter::generate) its
//! output, which it hands to a [`SpanRenderer`] one pixel row (or one run of
//! identical pixel rows) at a time.
//!
//! There is a single generic converter, [`ScanConverter`], parametrized by
//! a [`Grid`] that decides how finely each pixel is sampled:
//!
//! - [`Mono`] samples once per pixel, at its center, and produces coverage
//!   that is either `0` or `255`.
//! - [`Tor`] samples 15 rows per pixel at full horizontal precision, and
//!   computes whole pixel rows analytically whenever no edge starts, stops or
//!   crosses another edge inside the row.
//! - [`Tor22`] samples a coarse 4x4 grid per pixel.
//!
//! [`RectangularConverter`] is a separate, much simpler converter for
//! axis-aligned boxes.
//!
//! Input coordinates are always 24.8 fixed point; each converter maps them
//! onto its own grid.

mod active;
mod cell;
mod converter;
mod mask;
mod rectangular;

pub use converter::ScanConverter;
pub use mask::{CoverageMask, Inverted};
pub use rectangular::RectangularConverter;

use crate::Error;

/// A run of pixels with constant coverage.
///
/// Spans come in lists: each one covers the half-open range from its own
/// `x` to the `x` of the next span in the list. The last span of a list
/// always has zero coverage, and only marks where the previous one ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Span {
    /// The first pixel of the span.
    pub x: i32,
    /// The coverage, from `0` (nothing) to `255` (everything).
    pub coverage: u8,
    /// Was the coverage inverted (see [`Inverted`])?
    pub inverse: bool,
}

impl Span {
    /// A non-inverted span.
    pub fn new(x: i32, coverage: u8) -> Self {
        Span {
            x,
            coverage,
            inverse: false,
        }
    }
}

/// Receives the output of a scan converter.
pub trait SpanRenderer {
    /// Renders `height` consecutive pixel rows, starting at row `y`, that all
    /// have the coverage described by `spans`.
    ///
    /// The spans have strictly increasing `x`. An empty list means that the
    /// rows have no coverage at all.
    fn render_rows(&mut self, y: i32, height: i32, spans: &[Span]) -> Result<(), Error>;
}

impl<F> SpanRenderer for F
where
    F: FnMut(i32, i32, &[Span]) -> Result<(), Error>,
{
    fn render_rows(&mut self, y: i32, height: i32, spans: &[Span]) -> Result<(), Error> {
        self(y, height, spans)
    }
}

/// A rectangle of whole pixels: `x0 <= x < x1` and `y0 <= y < y1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PixelBox {
    /// The first column.
    pub x0: i32,
    /// The first row.
    pub y0: i32,
    /// One past the last column.
    pub x1: i32,
    /// One past the last row.
    pub y1: i32,
}

impl PixelBox {
    /// Creates a pixel rectangle.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        PixelBox { x0, y0, x1, y1 }
    }

    /// The number of columns.
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    /// The number of rows.
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    /// Does this rectangle have no pixels?
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// The pixels belonging to both rectangles.
    pub fn intersect(&self, other: &PixelBox) -> PixelBox {
        PixelBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
}

impl From<(i32, i32, i32, i32)> for PixelBox {
    fn from((x0, y0, x1, y1): (i32, i32, i32, i32)) -> Self {
        PixelBox { x0, y0, x1, y1 }
    }
}

/// The sampling grid of a [`ScanConverter`].
pub trait Grid {
    /// A name, for logging.
    const NAME: &'static str;

    /// The number of sample rows per pixel.
    const ROWS: i32;

    /// The horizontal resolution, in grid units per pixel. This must divide
    /// 256.
    const COLS: i32;

    /// Should pixel rows be computed in one go, when that's possible?
    const FULL_ROW_STEP: bool;

    /// The area of a fully covered pixel, in the units used by the cell list.
    const AREA: i32 = 2 * Self::ROWS * Self::COLS;

    /// Converts an area (between `0` and [`Grid::AREA`]) to a coverage value.
    fn area_to_alpha(area: i32) -> u8;
}

/// One sample per pixel, at the pixel's center.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mono;

impl Grid for Mono {
    const NAME: &'static str = "mono";
    const ROWS: i32 = 1;
    const COLS: i32 = 1;
    const FULL_ROW_STEP: bool = false;

    fn area_to_alpha(area: i32) -> u8 {
        if 2 * area >= Self::AREA {
            255
        } else {
            0
        }
    }
}

/// 15 sample rows per pixel, with full fixed-point precision horizontally.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tor;

impl Grid for Tor {
    const NAME: &'static str = "tor";
    const ROWS: i32 = 15;
    const COLS: i32 = 256;
    const FULL_ROW_STEP: bool = true;

    fn area_to_alpha(area: i32) -> u8 {
        let area = area.clamp(0, Self::AREA);
        ((area * 255 + Self::AREA / 2) / Self::AREA) as u8
    }
}

/// A 4x4 sample grid per pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tor22;

impl Grid for Tor22 {
    const NAME: &'static str = "tor22";
    const ROWS: i32 = 4;
    const COLS: i32 = 4;
    const FULL_ROW_STEP: bool = false;

    // The full area is 32, and 255/32 = 8 - 1/32.
    fn area_to_alpha(area: i32) -> u8 {
        let area = area.clamp(0, Self::AREA);
        ((area << 3) - (area >> 5)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_mappings() {
        for area in 0..=Tor22::AREA {
            let exact = area as f64 * 255.0 / Tor22::AREA as f64;
            assert!((Tor22::area_to_alpha(area) as f64 - exact).abs() <= 1.0);
        }
        assert_eq!(Tor22::area_to_alpha(Tor22::AREA), 255);
        assert_eq!(Tor22::area_to_alpha(-3), 0);

        assert_eq!(Tor::area_to_alpha(0), 0);
        assert_eq!(Tor::area_to_alpha(Tor::AREA), 255);
        assert_eq!(Tor::area_to_alpha(Tor::AREA / 2), 128);
        assert_eq!(Tor::area_to_alpha(Tor::AREA + 100), 255);

        assert_eq!(Mono::area_to_alpha(0), 0);
        assert_eq!(Mono::area_to_alpha(1), 255);
        assert_eq!(Mono::area_to_alpha(2), 255);
    }

    #[test]
    fn pixel_boxes() {
        let a = PixelBox::new(0, 0, 10, 5);
        let b = PixelBox::from((5, -2, 20, 3));
        assert_eq!(a.intersect(&b), PixelBox::new(5, 0, 10, 3));
        assert!(a.intersect(&PixelBox::new(10, 0, 12, 5)).is_empty());
        assert_eq!(PixelBox::new(3, 3, 1, 1).width(), 0);
    }
}
