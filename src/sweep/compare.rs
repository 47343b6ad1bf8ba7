//! Exact geometric predicates on edges.
//!
//! Nothing in here divides (except for computing rounded intersection
//! points), so every comparison is exact.

use std::cmp::Ordering;

use crate::{
    geom::{Edge, Fixed, Line, Point},
    wide::{det64, mul64, round_div, Exactness},
};

/// Compares the slopes (`dx/dy`) of two edges.
///
/// `Less` means that `a` leans further to the left, going down.
pub fn slope_compare(a: &Edge, b: &Edge) -> Ordering {
    let adx = a.line.dx();
    let bdx = b.line.dx();

    // Fast paths for vertical edges, and for edges leaning opposite ways.
    if adx == 0 {
        return 0.cmp(&bdx);
    }
    if bdx == 0 {
        return adx.cmp(&0);
    }
    if (adx ^ bdx) < 0 {
        return adx.cmp(&0);
    }

    let ady = a.line.dy();
    let bdy = b.line.dy();
    mul64(adx, bdy).cmp(&mul64(bdx, ady))
}

/// The numerator of the `x` coordinate of `line` at height `y`, over a
/// denominator of `line.dy()`.
///
/// Both terms are below 2^65 in magnitude, so the numerator times another
/// line's `dy` still fits in 128 bits.
fn x_numerator(line: &Line, y: Fixed) -> i128 {
    mul64(line.p1.x as i64, line.dy()) + mul64(y as i64 - line.p1.y as i64, line.dx())
}

/// Compares the `x` coordinates of two edges at height `y`.
pub fn edges_compare_x_for_y(a: &Edge, b: &Edge, y: Fixed) -> Ordering {
    let (adx, bdx) = (a.line.dx(), b.line.dx());
    if adx == 0 && bdx == 0 {
        return a.line.p1.x.cmp(&b.line.p1.x);
    }
    let (ady, bdy) = (a.line.dy() as i128, b.line.dy() as i128);
    (x_numerator(&a.line, y) * bdy).cmp(&(x_numerator(&b.line, y) * ady))
}

/// Compares the `x` coordinate of an edge at height `y` with `x`.
pub fn edge_compare_for_y_against_x(a: &Edge, y: Fixed, x: Fixed) -> Ordering {
    if a.line.dx() == 0 {
        return a.line.p1.x.cmp(&x);
    }
    x_numerator(&a.line, y).cmp(&mul64(x as i64, a.line.dy()))
}

/// Do two edges lie on the same infinite line?
pub fn edges_collinear(a: &Edge, b: &Edge) -> bool {
    if a.line == b.line {
        return true;
    }
    if slope_compare(a, b) != Ordering::Equal {
        return false;
    }
    // Parallel, so they're collinear if one of b's points is on a's line.
    let p = b.line.p1;
    edge_compare_for_y_against_x(a, p.y, p.x) == Ordering::Equal
}

/// A rounded coordinate of an intersection point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ordinate {
    pub value: Fixed,
    pub exactness: Exactness,
}

impl Ordinate {
    /// Compares against an exact coordinate, accounting for rounding.
    pub fn compare(&self, other: Fixed) -> Ordering {
        self.exactness.compare(self.value as i64, other as i64)
    }
}

/// The intersection point of two lines, rounded to the nearest grid point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntersectPoint {
    pub x: Ordinate,
    pub y: Ordinate,
}

impl IntersectPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x.value, self.y.value)
    }
}

fn ordinate(num: i128, den: i128) -> Option<Ordinate> {
    let (value, exactness) = round_div(num, den);
    let value = Fixed::try_from(value).ok()?;
    Some(Ordinate { value, exactness })
}

/// Computes where two (infinite) lines meet, by Cramer's rule.
///
/// Returns `None` if the lines are parallel, or if they meet outside the
/// representable range.
pub fn intersect_lines(a: &Line, b: &Line) -> Option<IntersectPoint> {
    let (dx1, dy1) = (-a.dx(), -a.dy());
    let (dx2, dy2) = (-b.dx(), -b.dy());

    // Up to 2^66 in magnitude.
    let den_det = det64(dx1, dy1, dx2, dy2);
    if den_det == 0 {
        return None;
    }

    // Up to 2^63 in magnitude, which doesn't quite fit in an i64.
    let a_det = det64(a.p1.x as i64, a.p1.y as i64, a.p2.x as i64, a.p2.y as i64);
    let b_det = det64(b.p1.x as i64, b.p1.y as i64, b.p2.x as i64, b.p2.y as i64);

    // Up to 2^97 in magnitude.
    let x_det = a_det * dx1 as i128 - b_det * dx2 as i128;
    let y_det = a_det * dy1 as i128 - b_det * dy2 as i128;

    Some(IntersectPoint {
        x: ordinate(x_det, den_det)?,
        y: ordinate(y_det, den_det)?,
    })
}

/// Does the intersection point lie on `edge`?
///
/// An intersection exactly at the top or bottom of an edge only counts if it
/// is strictly inside when the edge is shortened infinitesimally at both
/// ends, which means comparing the `x` coordinates with the rounding taken
/// into account.
pub fn edge_contains_intersect_point(edge: &Edge, p: &IntersectPoint) -> bool {
    let cmp_top = p.y.compare(edge.top);
    let cmp_bottom = p.y.compare(edge.bottom);

    if cmp_top == Ordering::Less || cmp_bottom == Ordering::Greater {
        return false;
    }
    if cmp_top == Ordering::Greater && cmp_bottom == Ordering::Less {
        return true;
    }

    if cmp_top == Ordering::Equal {
        p.x.compare(edge.top_x()) == Ordering::Greater
    } else {
        p.x.compare(edge.bottom_x()) == Ordering::Less
    }
}

/// Finds the intersection of two edges, if it lies on both of them.
pub fn intersect_edges(a: &Edge, b: &Edge) -> Option<IntersectPoint> {
    let p = intersect_lines(&a.line, &b.line)?;
    (edge_contains_intersect_point(a, &p) && edge_contains_intersect_point(b, &p)).then_some(p)
}
