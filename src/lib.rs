#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod boxes;
pub mod compositor;
pub mod geom;
mod polygon;
pub mod pool;
pub mod scan;
pub mod sweep;
mod traps;
pub mod wide;

#[cfg(any(test, feature = "generators"))]
pub mod generators;

pub use boxes::Boxes;
pub use geom::{Edge, Fixed, Line, Point, Rect, Trapezoid, FIXED_ONE};
pub use polygon::Polygon;
pub use pool::Budget;
pub use traps::Traps;

/// A fill rule tells us how to decide whether a point is "inside" a polygon.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

/// The ways in which an operation can fail to produce its output.
///
/// Only [`Error::NoMemory`] is a real failure. The other two are "soft":
/// they ask the caller to do something else instead (see
/// [`Error::is_soft`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// An allocation failed, or the memory budget ran out.
    NoMemory,
    /// This code path can't handle the input; try a more general one.
    Unsupported,
    /// The operation would have no visible effect.
    NothingToDo,
}

impl Error {
    /// Is this a request to fall back or skip, rather than a failure?
    pub fn is_soft(self) -> bool {
        !matches!(self, Error::NoMemory)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoMemory => write!(f, "out of memory"),
            Error::Unsupported => write!(f, "unsupported operation"),
            Error::NothingToDo => write!(f, "nothing to do"),
        }
    }
}

impl std::error::Error for Error {}
