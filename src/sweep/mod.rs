//! Bentley-Ottmann sweeps that turn polygons into trapezoids.
//!
//! The general sweep ([`tessellate_polygon`], [`polygon_reduce`] and
//! [`polygon_intersect`]) handles arbitrary, self-intersecting polygons:
//! it moves a horizontal line down the plane, keeping track of the edges
//! that cross it (sorted by `x`), and schedules an event wherever two
//! neighboring edges are about to swap. Between events, the order of the
//! edges doesn't change, so the filled region between two consecutive event
//! heights is a union of trapezoids.
//!
//! All the geometric predicates are exact. Intersection points are the only
//! thing that get rounded, and when they are, we remember which way the
//! rounding went.
//!
//! [`tessellate_boxes`] is a simpler sweep for axis-aligned rectangles,
//! where no edges ever cross.

mod compare;
mod event;
mod rectangular;
mod sweep_line;
mod tessellate;

pub use rectangular::{tessellate_boxes, tessellate_rectangles};
pub use tessellate::{polygon_intersect, polygon_reduce, tessellate_polygon};

/// An index of an edge taking part in a sweep.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EdgeId(pub usize);

/// The edges taking part in a sweep, indexed by [`EdgeId`].
pub(crate) struct EdgeVec<T> {
    inner: crate::pool::TryVec<T>,
}

impl_typed_vec!(EdgeVec, EdgeId, "e");
