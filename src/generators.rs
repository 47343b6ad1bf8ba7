//! Synthetic inputs for benchmarks and tests.
//!
//! Layouts are given in whole pixels. The `phase` arguments shift a layout by
//! a fraction of a pixel, so the same picture can be rendered both aligned to
//! the pixel grid and not.

use crate::{
    geom::{fixed_from_int, Fixed},
    Boxes, Error, Point, Polygon, Rect,
};

const SIZE: i32 = 30;
const PITCH: i32 = 40;
const INSET: i32 = 20;

/// The top-left corners of an `n` by `n` grid of squares `PITCH` pixels
/// apart, starting at `(origin, origin)`.
fn corners(n: usize, origin: Fixed) -> impl Iterator<Item = (Fixed, Fixed)> {
    let pitch = fixed_from_int(PITCH);
    (0..n as i32).flat_map(move |i| (0..n as i32).map(move |j| (origin + i * pitch, origin + j * pitch)))
}

/// Two layers of squares, where every square of the inner layer overlaps
/// four squares of the outer one. For `n = 3`:
///
/// ```text
/// ┌────┐ ┌────┐ ┌────┐
/// │    │ │    │ │    │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │    │ │    │ │    │
/// └────┘ └────┘ └────┘
/// ```
///
/// The outer layer has `n * n` squares of 30 pixels and the inner one
/// `(n - 1) * (n - 1)`. Everything is shifted by `phase` in both directions.
pub fn overlapping_squares(n: usize, phase: Fixed) -> Result<Boxes, Error> {
    let size = fixed_from_int(SIZE);
    let outer = corners(n, phase);
    let inner = corners(n.saturating_sub(1), phase + fixed_from_int(INSET));
    Boxes::from_rects(outer.chain(inner).map(|(x, y)| Rect::new(x, y, x + size, y + size)))
}

/// [`overlapping_squares`] on the pixel grid, as a polygon.
pub fn checkerboard(n: usize) -> Result<Polygon, Error> {
    Polygon::from_boxes(&overlapping_squares(n, 0)?)
}

/// Like [`checkerboard`], but the right side of every square is a pixel
/// lower than the left, so that there are no horizontal edges.
///
/// Horizontal edges never reach the sweep, so this is the same amount of
/// work without that shortcut.
pub fn slanted_checkerboard(n: usize) -> Result<Polygon, Error> {
    let size = fixed_from_int(SIZE);
    let slant = fixed_from_int(1);
    let mut poly = Polygon::new();
    for (x, y) in corners(n, 0).chain(corners(n.saturating_sub(1), fixed_from_int(INSET))) {
        poly.add_contour(&[
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size + slant),
            Point::new(x + size, y + slant),
        ])?;
    }
    Ok(poly)
}

/// `n` long, thin parallelograms leaning right and `n` leaning left, where
/// every one of them crosses every one leaning the other way.
///
/// The number of intersections is quadratic in `n`.
pub fn slanties(n: usize) -> Result<Polygon, Error> {
    let h = fixed_from_int(20 * n as i32);
    let w = fixed_from_int(10);
    let mut poly = Polygon::new();
    for i in 0..n as i32 {
        let x = fixed_from_int(20 * i);
        poly.add_contour(&[
            Point::new(x, 0),
            Point::new(x + h, h),
            Point::new(x + h + w, h),
            Point::new(x + w, 0),
        ])?;
        poly.add_contour(&[
            Point::new(x + h, 0),
            Point::new(x, h),
            Point::new(x + w, h),
            Point::new(x + h + w, 0),
        ])?;
    }
    Ok(poly)
}

/// A star with `n` points (`n` odd), drawn as a single self-intersecting
/// contour.
///
/// With the even-odd rule the middle is a hole; with the non-zero rule it
/// isn't.
pub fn star(n: usize, center: Point, radius: Fixed) -> Result<Polygon, Error> {
    let step = (n / 2).max(1);
    let points: Vec<_> = (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * ((i * step) % n) as f64 / n as f64;
            let (sin, cos) = angle.sin_cos();
            Point::new(
                center.x + (radius as f64 * sin).round() as Fixed,
                center.y - (radius as f64 * cos).round() as Fixed,
            )
        })
        .collect();
    let mut poly = Polygon::new();
    poly.add_contour(&points)?;
    Ok(poly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sweep::tessellate_polygon, FillRule, Traps};

    fn area(poly: &Polygon, fill_rule: FillRule) -> f64 {
        let mut traps = Traps::new();
        tessellate_polygon(&mut traps, poly, fill_rule).unwrap();
        traps.area()
    }

    #[test]
    fn checkerboard_areas() {
        let boxes = overlapping_squares(3, 0).unwrap();
        assert_eq!(boxes.len(), 13);
        assert!(boxes.is_pixel_aligned());

        // Each inner square overlaps four outer ones by 10x10.
        let overlap = 4.0 * 4.0 * 100.0;
        let poly = checkerboard(3).unwrap();
        assert_eq!(area(&poly, FillRule::NonZero), 13.0 * 900.0 - overlap);
        assert_eq!(area(&poly, FillRule::EvenOdd), 13.0 * 900.0 - 2.0 * overlap);

        // Slanting keeps the areas.
        let slanted = slanted_checkerboard(3).unwrap();
        assert_eq!(slanted.num_edges(), 13 * 4);
        assert_eq!(area(&slanted, FillRule::NonZero), 13.0 * 900.0 - overlap);
    }

    #[test]
    fn shifted_squares() {
        let boxes = overlapping_squares(2, fixed_from_int(1) / 2).unwrap();
        assert!(!boxes.is_pixel_aligned());
        assert_eq!(boxes.area(), 5.0 * 900.0);
        assert_eq!(boxes.as_slice()[0], Rect::new(128, 128, 128 + 30 * 256, 128 + 30 * 256));
    }

    #[test]
    fn slanties_cross() {
        let poly = slanties(4).unwrap();
        assert_eq!(poly.num_edges(), 2 * 4 * 2);
        // Every parallelogram has area 10 * 80, and they overlap.
        let nonzero = area(&poly, FillRule::NonZero);
        assert!(nonzero < 8.0 * 800.0);
        assert!(area(&poly, FillRule::EvenOdd) < nonzero);
    }

    #[test]
    fn star_has_a_hole() {
        let star = star(5, Point::new(fixed_from_int(50), fixed_from_int(50)), fixed_from_int(40))
            .unwrap();
        let nonzero = area(&star, FillRule::NonZero);
        let evenodd = area(&star, FillRule::EvenOdd);
        assert!(evenodd < nonzero);
        assert!(evenodd > 0.0);
    }
}
