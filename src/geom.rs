//! Geometric primitives, like points, lines and trapezoids.
//!
//! All coordinates are in 24.8 fixed point: an integer number of 1/256ths of
//! a pixel, on both axes. Larger `y` is further down.

use crate::wide::{floored_divrem_128, mul64, round_div};

/// A 24.8 fixed-point coordinate.
pub type Fixed = i32;

/// The number of fractional bits in a [`Fixed`].
pub const FIXED_FRAC_BITS: u32 = 8;

/// The fixed-point representation of one pixel.
pub const FIXED_ONE: Fixed = 1 << FIXED_FRAC_BITS;

/// A mask for the fractional part of a [`Fixed`].
pub const FIXED_FRAC_MASK: Fixed = FIXED_ONE - 1;

/// Converts a whole number of pixels to fixed point.
#[inline]
pub fn fixed_from_int(i: i32) -> Fixed {
    i << FIXED_FRAC_BITS
}

/// Converts a float number of pixels to fixed point, rounding to the nearest
/// representable value (and saturating at the ends of the range).
#[inline]
pub fn fixed_from_f64(f: f64) -> Fixed {
    (f * FIXED_ONE as f64).round() as Fixed
}

/// Converts a fixed-point value to a float number of pixels.
#[inline]
pub fn fixed_to_f64(f: Fixed) -> f64 {
    f as f64 / FIXED_ONE as f64
}

/// The pixel containing a fixed-point coordinate.
#[inline]
pub fn fixed_floor(f: Fixed) -> i32 {
    f >> FIXED_FRAC_BITS
}

/// The first pixel boundary at or after a fixed-point coordinate.
#[inline]
pub fn fixed_ceil(f: Fixed) -> i32 {
    ((f as i64 + FIXED_FRAC_MASK as i64) >> FIXED_FRAC_BITS) as i32
}

/// Clamps a wide intermediate result to the `Fixed` range.
fn saturate(v: i128) -> Fixed {
    v.clamp(Fixed::MIN as i128, Fixed::MAX as i128) as Fixed
}

/// The fractional part of a fixed-point coordinate, in `0..FIXED_ONE`.
#[inline]
pub fn fixed_frac(f: Fixed) -> Fixed {
    f & FIXED_FRAC_MASK
}

/// A two-dimensional point.
///
/// Points are sorted by `y` and then by `x`, for the convenience of our sweep-line
/// algorithm (which moves in increasing `y`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Point {
    /// Vertical coordinate.
    pub y: Fixed,
    /// Horizontal coordinate.
    pub x: Fixed,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", fixed_to_f64(self.x), fixed_to_f64(self.y))
    }
}

impl Point {
    /// Create a new point.
    ///
    /// Note that the `x` coordinate comes first, even though points are
    /// sorted by `y` first.
    pub fn new(x: Fixed, y: Fixed) -> Self {
        Point { x, y }
    }

    /// Creates a point from float pixel coordinates.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Point::new(fixed_from_f64(x), fixed_from_f64(y))
    }

    /// Converts to a kurbo point, in pixels.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(fixed_to_f64(self.x), fixed_to_f64(self.y))
    }

    /// Translates this point.
    pub fn translate(self, dx: Fixed, dy: Fixed) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<(Fixed, Fixed)> for Point {
    fn from((x, y): (Fixed, Fixed)) -> Self {
        Point::new(x, y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Point::from_f64(p.x, p.y)
    }
}

/// An infinite line through two points.
///
/// Edges store a line together with a vertical range; the line's points
/// don't need to coincide with the ends of that range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Line {
    /// The first point.
    pub p1: Point,
    /// The second point.
    pub p2: Point,
}

impl std::fmt::Debug for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -- {:?}", self.p1, self.p2)
    }
}

impl Line {
    /// A line through `p1` and `p2`.
    pub fn new(p1: Point, p2: Point) -> Self {
        Line { p1, p2 }
    }

    /// A vertical line at `x`, running from `top` to `bottom`.
    pub fn vertical(x: Fixed, top: Fixed, bottom: Fixed) -> Self {
        Line::new(Point::new(x, top), Point::new(x, bottom))
    }

    /// The horizontal extent of the line's defining points.
    ///
    /// Two coordinates can be further apart than a `Fixed` can hold, so
    /// this is 64-bit.
    pub fn dx(&self) -> i64 {
        self.p2.x as i64 - self.p1.x as i64
    }

    /// The vertical extent of the line's defining points.
    pub fn dy(&self) -> i64 {
        self.p2.y as i64 - self.p1.y as i64
    }

    /// Is this line horizontal (or degenerate)?
    pub fn is_horizontal(&self) -> bool {
        self.p1.y == self.p2.y
    }

    /// Returns this line with its points ordered top to bottom, together with
    /// `true` if they had to be swapped.
    pub fn oriented(self) -> (Self, bool) {
        if self.p2.y < self.p1.y {
            (Line::new(self.p2, self.p1), true)
        } else {
            (self, false)
        }
    }

    /// The `x` coordinate at height `y`, rounded down and saturated to the
    /// `Fixed` range.
    ///
    /// The line must not be horizontal.
    pub fn x_for_y(&self, y: Fixed) -> Fixed {
        if y == self.p1.y {
            return self.p1.x;
        }
        if y == self.p2.y {
            return self.p2.x;
        }
        let dx = self.dx();
        if dx == 0 {
            return self.p1.x;
        }
        let dy = self.dy();
        debug_assert_ne!(dy, 0);
        let q = floored_divrem_128(mul64(y as i64 - self.p1.y as i64, dx), dy).quo;
        saturate(self.p1.x as i128 + q)
    }

    /// The `y` coordinate at horizontal position `x`, rounded to the nearest
    /// representable value.
    ///
    /// The line must not be vertical.
    pub fn y_for_x(&self, x: Fixed) -> Fixed {
        if x == self.p1.x {
            return self.p1.y;
        }
        if x == self.p2.x {
            return self.p2.y;
        }
        let (q, _) = round_div(
            mul64(x as i64 - self.p1.x as i64, self.dy()),
            self.dx() as i128,
        );
        saturate(self.p1.y as i128 + q)
    }

    /// The exact `x` coordinate at (fixed-point) height `y`, as a float.
    pub fn x_at(&self, y: f64) -> f64 {
        let dy = self.dy();
        if dy == 0 {
            return self.p1.x as f64;
        }
        self.p1.x as f64 + (y - self.p1.y as f64) * self.dx() as f64 / dy as f64
    }

    /// Translates this line.
    pub fn translate(self, dx: Fixed, dy: Fixed) -> Self {
        Line::new(self.p1.translate(dx, dy), self.p2.translate(dx, dy))
    }
}

/// A polygon edge: a line, restricted to a vertical range.
///
/// Edges always satisfy `top < bottom`, and the line always runs from top to
/// bottom. The `dir` is the edge's contribution to the winding number: `1` if
/// the original path went downwards and `-1` if it went upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Edge {
    /// The line that this edge lies on.
    pub line: Line,
    /// The top of the edge.
    pub top: Fixed,
    /// The bottom of the edge.
    pub bottom: Fixed,
    /// The winding direction.
    pub dir: i32,
}

impl Edge {
    /// The `x` coordinate at the top of the edge.
    pub fn top_x(&self) -> Fixed {
        self.line.x_for_y(self.top)
    }

    /// The `x` coordinate at the bottom of the edge.
    pub fn bottom_x(&self) -> Fixed {
        self.line.x_for_y(self.bottom)
    }

    /// The point at the top of the edge.
    pub fn top_point(&self) -> Point {
        Point::new(self.top_x(), self.top)
    }

    /// The point at the bottom of the edge.
    pub fn bottom_point(&self) -> Point {
        Point::new(self.bottom_x(), self.bottom)
    }
}

/// An axis-aligned rectangle.
///
/// `p1` is the top-left corner and `p2` the bottom-right one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rect {
    /// The top-left corner.
    pub p1: Point,
    /// The bottom-right corner.
    pub p2: Point,
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?} - {:?}]", self.p1, self.p2)
    }
}

impl Rect {
    /// A rectangle spanning two corners, in any order.
    pub fn new(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Self {
        Rect {
            p1: Point::new(x1.min(x2), y1.min(y2)),
            p2: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    /// A rectangle spanning whole pixels.
    pub fn from_pixels(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Rect::new(
            fixed_from_int(x1),
            fixed_from_int(y1),
            fixed_from_int(x2),
            fixed_from_int(y2),
        )
    }

    /// The width.
    pub fn width(&self) -> i64 {
        self.p2.x as i64 - self.p1.x as i64
    }

    /// The height.
    pub fn height(&self) -> i64 {
        self.p2.y as i64 - self.p1.y as i64
    }

    /// Does this rectangle have zero area?
    pub fn is_empty(&self) -> bool {
        self.p1.x >= self.p2.x || self.p1.y >= self.p2.y
    }

    /// The smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            p1: Point::new(self.p1.x.min(other.p1.x), self.p1.y.min(other.p1.y)),
            p2: Point::new(self.p2.x.max(other.p2.x), self.p2.y.max(other.p2.y)),
        }
    }

    /// The overlap of two rectangles, if it has positive area.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let ret = Rect {
            p1: Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
            p2: Point::new(self.p2.x.min(other.p2.x), self.p2.y.min(other.p2.y)),
        };
        (!ret.is_empty()).then_some(ret)
    }

    /// Does this rectangle contain the point `(x, y)`, given in pixels?
    ///
    /// The top and left sides are included, the bottom and right are not.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x, y) = (x * FIXED_ONE as f64, y * FIXED_ONE as f64);
        self.p1.x as f64 <= x
            && x < self.p2.x as f64
            && self.p1.y as f64 <= y
            && y < self.p2.y as f64
    }

    /// Are all the sides on pixel boundaries?
    pub fn is_pixel_aligned(&self) -> bool {
        [self.p1.x, self.p1.y, self.p2.x, self.p2.y]
            .into_iter()
            .all(|c| fixed_frac(c) == 0)
    }

    /// The area, in square pixels.
    pub fn area(&self) -> f64 {
        let one = FIXED_ONE as f64;
        self.width() as f64 * self.height() as f64 / (one * one)
    }

    /// The smallest range of whole pixels covering this rectangle, as
    /// `(x1, y1, x2, y2)`.
    pub fn pixel_extents(&self) -> (i32, i32, i32, i32) {
        (
            fixed_floor(self.p1.x),
            fixed_floor(self.p1.y),
            fixed_ceil(self.p2.x),
            fixed_ceil(self.p2.y),
        )
    }

    /// Converts to a kurbo rectangle, in pixels.
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::from_points(self.p1.to_kurbo(), self.p2.to_kurbo())
    }
}

impl From<kurbo::Rect> for Rect {
    fn from(r: kurbo::Rect) -> Self {
        Rect::new(
            fixed_from_f64(r.x0),
            fixed_from_f64(r.y0),
            fixed_from_f64(r.x1),
            fixed_from_f64(r.y1),
        )
    }
}

/// A trapezoid with horizontal top and bottom sides.
///
/// The left and right sides lie on (possibly slanted) lines; the trapezoid is
/// the part of the strip `top <= y < bottom` between them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Trapezoid {
    /// The top of the trapezoid.
    pub top: Fixed,
    /// The bottom of the trapezoid.
    pub bottom: Fixed,
    /// The line containing the left side.
    pub left: Line,
    /// The line containing the right side.
    pub right: Line,
}

impl std::fmt::Debug for Trapezoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}..{:?}: {:?} | {:?}",
            fixed_to_f64(self.top),
            fixed_to_f64(self.bottom),
            self.left,
            self.right
        )
    }
}

impl Trapezoid {
    /// The area of this trapezoid, in square pixels.
    ///
    /// If the sides cross (which can happen for very thin slivers near a
    /// rounded intersection point), the result may be slightly negative.
    pub fn area(&self) -> f64 {
        let (top, bottom) = (self.top as f64, self.bottom as f64);
        let top_width = self.right.x_at(top) - self.left.x_at(top);
        let bottom_width = self.right.x_at(bottom) - self.left.x_at(bottom);
        let one = FIXED_ONE as f64;
        (bottom - top) * (top_width + bottom_width) / 2.0 / (one * one)
    }

    /// Does this trapezoid contain the point `(x, y)`, given in pixels?
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x, y) = (x * FIXED_ONE as f64, y * FIXED_ONE as f64);
        self.top as f64 <= y
            && y < self.bottom as f64
            && self.left.x_at(y) <= x
            && x < self.right.x_at(y)
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left.x_for_y(self.top), self.top),
            Point::new(self.right.x_for_y(self.top), self.top),
            Point::new(self.right.x_for_y(self.bottom), self.bottom),
            Point::new(self.left.x_for_y(self.bottom), self.bottom),
        ]
    }

    /// Translates this trapezoid.
    pub fn translate(self, dx: Fixed, dy: Fixed) -> Self {
        Trapezoid {
            top: self.top + dy,
            bottom: self.bottom + dy,
            left: self.left.translate(dx, dy),
            right: self.right.translate(dx, dy),
        }
    }
}
