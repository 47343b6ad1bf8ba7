//! Growable collections of trapezoids.

use crate::{
    geom::{fixed_frac, Fixed, Line, Rect, Trapezoid},
    polygon::Polygon,
    pool::{Budget, Growable},
    Error,
};

const EMBEDDED_TRAPS: usize = 16;

/// A collection of trapezoids, usually the output of a tessellation.
///
/// The first few trapezoids live inline; after that the storage moves to the
/// heap and grows by a factor of four each time it fills up.
#[derive(Clone, Debug)]
pub struct Traps {
    traps: Growable<Trapezoid, EMBEDDED_TRAPS>,
    budget: Budget,
}

impl Default for Traps {
    fn default() -> Self {
        Self::with_budget(Budget::unlimited())
    }
}

impl Traps {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection whose storage is charged to `budget`.
    pub fn with_budget(budget: Budget) -> Self {
        Traps {
            traps: Growable::new(4),
            budget,
        }
    }

    /// The budget charged for this collection's storage.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Adds a trapezoid, unless it has no height.
    pub fn add_trap(
        &mut self,
        top: Fixed,
        bottom: Fixed,
        left: &Line,
        right: &Line,
    ) -> Result<(), Error> {
        if top >= bottom {
            return Ok(());
        }
        self.traps.try_push(
            Trapezoid {
                top,
                bottom,
                left: *left,
                right: *right,
            },
            &self.budget,
        )
    }

    /// Adds a rectangle, as a trapezoid with vertical sides.
    pub fn add_box(&mut self, rect: &Rect) -> Result<(), Error> {
        if rect.is_empty() {
            return Ok(());
        }
        let (top, bottom) = (rect.p1.y, rect.p2.y);
        self.add_trap(
            top,
            bottom,
            &Line::vertical(rect.p1.x, top, bottom),
            &Line::vertical(rect.p2.x, top, bottom),
        )
    }

    /// The number of trapezoids.
    pub fn len(&self) -> usize {
        self.traps.len()
    }

    /// Are there no trapezoids?
    pub fn is_empty(&self) -> bool {
        self.traps.is_empty()
    }

    /// The trapezoids, as a slice.
    pub fn as_slice(&self) -> &[Trapezoid] {
        &self.traps
    }

    /// Iterates over the trapezoids.
    pub fn iter(&self) -> std::slice::Iter<'_, Trapezoid> {
        self.traps.iter()
    }

    /// Removes all the trapezoids.
    pub fn clear(&mut self) {
        self.traps.clear();
    }

    /// Translates every trapezoid.
    pub fn translate(&mut self, dx: Fixed, dy: Fixed) {
        for t in self.traps.iter_mut() {
            *t = t.translate(dx, dy);
        }
    }

    /// The total area, in square pixels.
    ///
    /// Tessellator output never overlaps, so this is also the area of the
    /// covered region.
    pub fn area(&self) -> f64 {
        self.traps.iter().map(Trapezoid::area).sum()
    }

    /// Does any of the trapezoids contain the point `(x, y)`, in pixels?
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.traps.iter().any(|t| t.contains(x, y))
    }

    /// The bounding box of all the trapezoids' corners.
    pub fn extents(&self) -> Option<Rect> {
        self.traps
            .iter()
            .flat_map(|t| t.corners())
            .fold(None, |acc: Option<Rect>, p| {
                let r = Rect { p1: p, p2: p };
                Some(acc.map_or(r, |acc| acc.union(&r)))
            })
    }

    /// Is every trapezoid a rectangle with its sides on pixel boundaries?
    pub fn is_pixel_aligned(&self) -> bool {
        self.traps.iter().all(|t| {
            t.left.dx() == 0
                && t.right.dx() == 0
                && [t.top, t.bottom, t.left.p1.x, t.right.p1.x]
                    .into_iter()
                    .all(|c| fixed_frac(c) == 0)
        })
    }

    /// Converts to a polygon with the same (nonzero) filled region.
    ///
    /// Each trapezoid turns into its two sides, with opposite directions.
    pub fn to_polygon(&self) -> Result<Polygon, Error> {
        let mut ret = Polygon::with_budget(self.budget.clone());
        for t in self.traps.iter() {
            ret.add_line(&t.left, t.top, t.bottom, 1)?;
            ret.add_line(&t.right, t.top, t.bottom, -1)?;
        }
        Ok(ret)
    }

    /// Dumps the trapezoids as an SVG document, for debugging.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Path};

        let mut doc = svg::Document::new();
        if let Some(ext) = self.extents() {
            let r = ext.to_kurbo();
            doc = doc.set("viewBox", (r.x0, r.y0, r.width(), r.height()));
        }
        for t in self.traps.iter() {
            let [a, b, c, d] = t.corners().map(|p| p.to_kurbo());
            let data = Data::new()
                .move_to((a.x, a.y))
                .line_to((b.x, b.y))
                .line_to((c.x, c.y))
                .line_to((d.x, d.y))
                .close();
            doc = doc.add(
                Path::new()
                    .set("d", data)
                    .set("fill", "grey")
                    .set("fill-opacity", 0.5)
                    .set("stroke", "black")
                    .set("stroke-width", 0.02),
            );
        }
        doc
    }
}

impl<'a> IntoIterator for &'a Traps {
    type Item = &'a Trapezoid;
    type IntoIter = std::slice::Iter<'a, Trapezoid>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Polygon {
    /// Builds a polygon covering a collection of trapezoids.
    pub fn from_traps(traps: &Traps) -> Result<Self, Error> {
        traps.to_polygon()
    }
}
