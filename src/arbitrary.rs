//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::{
    geom::{Fixed, Point, Rect},
    Boxes, Polygon,
};

/// The largest coordinate we generate. Differences between coordinates
/// can be larger than `Fixed::MAX`.
pub const MAX_COORD: Fixed = 1 << 30;

/// Generate an arbitrary fixed-point coordinate in some range.
pub fn fixed_in_range(
    start: Fixed,
    end: Fixed,
    u: &mut Unstructured<'_>,
) -> Result<Fixed, arbitrary::Error> {
    u.int_in_range(start..=end)
}

fn fixed(u: &mut Unstructured<'_>) -> Result<Fixed, arbitrary::Error> {
    fixed_in_range(-MAX_COORD, MAX_COORD, u)
}

/// Generate a coordinate, but give it a good chance to be close to (or the
/// same as) another one.
fn another_fixed(orig: Fixed, u: &mut Unstructured<'_>) -> Result<Fixed, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let delta: i32 = u.int_in_range(-4..=4)?;
        Ok((orig + delta).clamp(-MAX_COORD, MAX_COORD))
    } else {
        fixed(u)
    }
}

/// Generate an arbitrary point.
pub fn point(u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(fixed(u)?, fixed(u)?))
}

/// Generate an arbitrary point, with a chance of being close to `other`
/// in one or both coordinates.
pub fn another_point(other: Point, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        another_fixed(other.x, u)?,
        another_fixed(other.y, u)?,
    ))
}

/// Generate a closed contour.
///
/// Consecutive points tend to be close to each other or to share a
/// coordinate, which produces lots of horizontal, vertical, and nearly
/// parallel edges.
pub fn contour(u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let len = u.int_in_range(3..=16)?;
    let mut points = vec![point(u)?];
    for _ in 1..len {
        let prev = points[points.len() - 1];
        points.push(another_point(prev, u)?);
    }
    Ok(points)
}

/// Generate a polygon made of a few contours.
pub fn polygon(u: &mut Unstructured<'_>) -> Result<Polygon, arbitrary::Error> {
    let mut poly = Polygon::new();
    let count = u.int_in_range(1..=4)?;
    for _ in 0..count {
        // Out of memory can't happen with an unlimited budget.
        poly.add_contour(&contour(u)?)
            .map_err(|_| arbitrary::Error::IncorrectFormat)?;
    }
    Ok(poly)
}

/// Generate a collection of (possibly overlapping) boxes.
pub fn boxes(u: &mut Unstructured<'_>) -> Result<Boxes, arbitrary::Error> {
    let mut ret = Boxes::new();
    let count = u.int_in_range(1..=16)?;
    for _ in 0..count {
        let p = point(u)?;
        let q = another_point(p, u)?;
        ret.add(Rect::new(p.x.min(q.x), p.y.min(q.y), p.x.max(q.x), p.y.max(q.y)))
            .map_err(|_| arbitrary::Error::IncorrectFormat)?;
    }
    Ok(ret)
}
