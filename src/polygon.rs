//! Polygons, as unordered collections of edges.

use arrayvec::ArrayVec;
use kurbo::{BezPath, PathEl};

use crate::{
    boxes::Boxes,
    geom::{Edge, Fixed, Line, Point, Rect},
    pool::{Budget, Growable},
    Error,
};

const EMBEDDED_EDGES: usize = 32;

fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    pairs(xs).chain(xs.last().zip(xs.first()))
}

fn pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2).map(|pair| (&pair[0], &pair[1]))
}

/// A polygon: an unordered bag of edges, each with its own winding direction.
///
/// Edges always satisfy `top < bottom`; horizontal and zero-height edges are
/// dropped when they are added, since they don't affect winding numbers.
///
/// A polygon may have a list of limiting boxes. Edges added through
/// [`Polygon::add_line_clipped`] (and everything built on it, like
/// [`Polygon::add_contour`]) are clipped to those boxes in a way that
/// preserves winding numbers inside them.
#[derive(Clone, Debug)]
pub struct Polygon {
    edges: Growable<Edge, EMBEDDED_EDGES>,
    extents: Option<Rect>,
    limits: Vec<Rect>,
    budget: Budget,
}

impl Default for Polygon {
    fn default() -> Self {
        Self::with_budget(Budget::unlimited())
    }
}

impl Polygon {
    /// Creates an empty polygon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty polygon whose storage, and the working storage of any
    /// operation on it, is charged to `budget`.
    pub fn with_budget(budget: Budget) -> Self {
        Polygon {
            edges: Growable::new(2),
            extents: None,
            limits: Vec::new(),
            budget,
        }
    }

    /// Creates an empty polygon that clips clipped additions to `limits`.
    pub fn with_limits(limits: &[Rect]) -> Self {
        let mut ret = Self::new();
        ret.set_limits(limits);
        ret
    }

    /// Replaces the limiting boxes. Empty boxes are ignored.
    ///
    /// This only affects edges added from now on.
    pub fn set_limits(&mut self, limits: &[Rect]) {
        self.limits = limits.iter().filter(|r| !r.is_empty()).copied().collect();
    }

    /// The limiting boxes.
    pub fn limits(&self) -> &[Rect] {
        &self.limits
    }

    /// The budget charged for this polygon's storage.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// All the edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Does this polygon have no edges?
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The bounding box of all the edges, or `None` if there aren't any.
    pub fn extents(&self) -> Option<Rect> {
        self.extents
    }

    /// Removes all edges, keeping the limits and the budget.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.extents = None;
    }

    /// Translates every edge (and the limits).
    pub fn translate(&mut self, dx: Fixed, dy: Fixed) {
        for e in self.edges.iter_mut() {
            e.line = e.line.translate(dx, dy);
            e.top += dy;
            e.bottom += dy;
        }
        for r in &mut self.limits {
            r.p1 = r.p1.translate(dx, dy);
            r.p2 = r.p2.translate(dx, dy);
        }
        self.extents = self.extents.map(|r| Rect {
            p1: r.p1.translate(dx, dy),
            p2: r.p2.translate(dx, dy),
        });
    }

    fn push_edge(&mut self, edge: Edge) -> Result<(), Error> {
        self.edges.try_push(edge, &self.budget)?;
        let (x0, x1) = (edge.top_x(), edge.bottom_x());
        let bbox = Rect::new(x0.min(x1), edge.top, x0.max(x1), edge.bottom);
        self.extents = Some(match self.extents {
            Some(e) => e.union(&bbox),
            None => bbox,
        });
        Ok(())
    }

    /// Appends an edge lying on the line through `p1` and `p2`, spanning
    /// `top..bottom`, with winding direction `dir`.
    ///
    /// The edge is dropped if it has no height or if the line is horizontal.
    /// Limits are ignored.
    pub fn add_edge(
        &mut self,
        p1: Point,
        p2: Point,
        top: Fixed,
        bottom: Fixed,
        dir: i32,
    ) -> Result<(), Error> {
        if top >= bottom {
            return Ok(());
        }
        let (line, _) = Line::new(p1, p2).oriented();
        if line.is_horizontal() {
            return Ok(());
        }
        self.push_edge(Edge {
            line,
            top,
            bottom,
            dir,
        })
    }

    /// Appends an edge on `line`. Limits are ignored.
    pub fn add_line(
        &mut self,
        line: &Line,
        top: Fixed,
        bottom: Fixed,
        dir: i32,
    ) -> Result<(), Error> {
        self.add_edge(line.p1, line.p2, top, bottom, dir)
    }

    /// Appends an edge on `line`, clipped to the limits.
    ///
    /// Inside each limiting box the edge is kept as it is. The parts of it
    /// that fall to the left (or right) of a box are replaced by vertical
    /// edges along the box's left (or right) side, so that winding numbers
    /// inside the box don't change. A single edge can turn into up to three
    /// edges per box.
    pub fn add_line_clipped(
        &mut self,
        line: &Line,
        top: Fixed,
        bottom: Fixed,
        dir: i32,
    ) -> Result<(), Error> {
        if self.limits.is_empty() {
            return self.add_line(line, top, bottom, dir);
        }
        let (line, _) = line.oriented();
        if line.is_horizontal() {
            return Ok(());
        }

        for i in 0..self.limits.len() {
            let limit = self.limits[i];
            let top = top.max(limit.p1.y);
            let bottom = bottom.min(limit.p2.y);
            if top >= bottom {
                continue;
            }

            let (left, right) = (limit.p1.x, limit.p2.x);
            let top_x = line.x_for_y(top);
            let bottom_x = line.x_for_y(bottom);
            let (xmin, xmax) = (top_x.min(bottom_x), top_x.max(bottom_x));

            if left <= xmin && xmax <= right {
                self.add_line(&line, top, bottom, dir)?;
            } else if xmax <= left {
                self.add_line(&Line::vertical(left, top, bottom), top, bottom, dir)?;
            } else if right <= xmin {
                self.add_line(&Line::vertical(right, top, bottom), top, bottom, dir)?;
            } else {
                log::trace!("splitting {line:?} against {limit:?}");
                self.add_split_line(&line, top, bottom, dir, left, right)?;
            }
        }
        Ok(())
    }

    /// Adds the pieces of a line that crosses the sides of a limiting box.
    fn add_split_line(
        &mut self,
        line: &Line,
        top: Fixed,
        bottom: Fixed,
        dir: i32,
        left: Fixed,
        right: Fixed,
    ) -> Result<(), Error> {
        let mut cuts = ArrayVec::<Fixed, 4>::new();
        cuts.push(top);
        cuts.push(bottom);
        for x in [left, right] {
            let y = line.y_for_x(x);
            if top < y && y < bottom {
                cuts.push(y);
            }
        }
        cuts.sort_unstable();

        for w in cuts.windows(2) {
            let (y0, y1) = (w[0], w[1]);
            if y0 >= y1 {
                continue;
            }
            let mid_x = line.x_for_y(((y0 as i64 + y1 as i64) / 2) as Fixed);
            let piece = if mid_x < left {
                Line::vertical(left, y0, y1)
            } else if mid_x > right {
                Line::vertical(right, y0, y1)
            } else {
                *line
            };
            self.add_line(&piece, y0, y1, dir)?;
        }
        Ok(())
    }

    /// Adds the edge from `p1` to `p2`, with its winding direction determined
    /// by whether it goes down (`1`) or up (`-1`). The edge is clipped to the
    /// limits.
    pub fn add_external_edge(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
        match p1.y.cmp(&p2.y) {
            std::cmp::Ordering::Less => self.add_line_clipped(&Line::new(p1, p2), p1.y, p2.y, 1),
            std::cmp::Ordering::Greater => {
                self.add_line_clipped(&Line::new(p2, p1), p2.y, p1.y, -1)
            }
            std::cmp::Ordering::Equal => Ok(()),
        }
    }

    /// Adds a closed contour, connecting each point to the next and the last
    /// point back to the first.
    pub fn add_contour(&mut self, points: &[Point]) -> Result<(), Error> {
        for (p, q) in cyclic_pairs(points) {
            self.add_external_edge(*p, *q)?;
        }
        Ok(())
    }

    /// Adds a collection of closed contours.
    pub fn add_contours<P: AsRef<[Point]>>(
        &mut self,
        contours: impl IntoIterator<Item = P>,
    ) -> Result<(), Error> {
        for c in contours {
            self.add_contour(c.as_ref())?;
        }
        Ok(())
    }

    /// Adds a rectangle as a clockwise contour (in y-down coordinates), with
    /// `dir` as the winding direction of its right side.
    ///
    /// The rectangle is not clipped.
    pub fn add_box(&mut self, rect: &Rect, dir: i32) -> Result<(), Error> {
        let (top, bottom) = (rect.p1.y, rect.p2.y);
        self.add_line(&Line::vertical(rect.p1.x, top, bottom), top, bottom, -dir)?;
        self.add_line(&Line::vertical(rect.p2.x, top, bottom), top, bottom, dir)
    }

    /// Flattens a Bézier path (in pixels) to within `tolerance` and adds each
    /// of its subpaths as a closed contour.
    ///
    /// Returns [`Error::Unsupported`] if the path has non-finite coordinates.
    pub fn add_bez_path(&mut self, path: &BezPath, tolerance: f64) -> Result<(), Error> {
        let finite = |p: &kurbo::Point| p.x.is_finite() && p.y.is_finite();
        if !path.elements().iter().all(|el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => finite(p),
            PathEl::QuadTo(p, q) => finite(p) && finite(q),
            PathEl::CurveTo(p, q, r) => finite(p) && finite(q) && finite(r),
            PathEl::ClosePath => true,
        }) {
            return Err(Error::Unsupported);
        }

        let mut contours: Vec<Vec<Point>> = Vec::new();
        kurbo::flatten(path.iter(), tolerance, |el| match el {
            PathEl::MoveTo(p) => contours.push(vec![p.into()]),
            PathEl::LineTo(p) => match contours.last_mut() {
                Some(c) => c.push(p.into()),
                None => contours.push(vec![p.into()]),
            },
            _ => {}
        });
        self.add_contours(contours)
    }

    /// Builds a polygon from a Bézier path.
    pub fn from_bez_path(path: &BezPath, tolerance: f64) -> Result<Self, Error> {
        let mut ret = Self::new();
        ret.add_bez_path(path, tolerance)?;
        Ok(ret)
    }

    /// Builds a polygon covering a collection of boxes, using the boxes'
    /// budget.
    pub fn from_boxes(boxes: &Boxes) -> Result<Self, Error> {
        let mut ret = Self::with_budget(boxes.budget().clone());
        for b in boxes.iter() {
            ret.add_box(b, 1)?;
        }
        Ok(ret)
    }

    /// Dumps the edges as an SVG document, for debugging.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Path};

        let mut doc = svg::Document::new();
        if let Some(ext) = self.extents {
            let r = ext.to_kurbo();
            doc = doc.set("viewBox", (r.x0, r.y0, r.width(), r.height()));
        }
        for e in self.edges.iter() {
            let (p0, p1) = (e.top_point().to_kurbo(), e.bottom_point().to_kurbo());
            let data = Data::new().move_to((p0.x, p0.y)).line_to((p1.x, p1.y));
            let color = if e.dir > 0 { "red" } else { "blue" };
            doc = doc.add(
                Path::new()
                    .set("d", data)
                    .set("stroke", color)
                    .set("fill", "none")
                    .set("stroke-width", 0.05),
            );
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::geom::fixed_from_int;

    fn pt(x: f64, y: f64) -> Point {
        Point::from_f64(x, y)
    }

    #[test]
    fn degenerate_edges_are_dropped() {
        let mut poly = Polygon::new();
        poly.add_edge(pt(0.0, 0.0), pt(1.0, 1.0), 5, 5, 1).unwrap();
        poly.add_edge(pt(0.0, 1.0), pt(1.0, 1.0), 0, 256, 1).unwrap();
        poly.add_edge(pt(1.0, 1.0), pt(1.0, 1.0), 0, 256, 1).unwrap();
        poly.add_external_edge(pt(0.0, 3.0), pt(5.0, 3.0)).unwrap();
        poly.add_external_edge(pt(2.0, 2.0), pt(2.0, 2.0)).unwrap();
        assert_eq!(poly.num_edges(), 0);
        assert_eq!(poly.extents(), None);
    }

    #[test]
    fn external_edges_get_direction() {
        let mut poly = Polygon::new();
        poly.add_external_edge(pt(0.0, 0.0), pt(1.0, 2.0)).unwrap();
        poly.add_external_edge(pt(1.0, 2.0), pt(0.0, 0.0)).unwrap();
        let edges = poly.edges();
        assert_eq!(edges[0].dir, 1);
        assert_eq!(edges[1].dir, -1);
        assert_eq!(edges[0].line, edges[1].line);
        assert_eq!(edges[1].top, 0);
        assert_eq!(edges[1].bottom, fixed_from_int(2));
    }

    #[test]
    fn contour_extents() {
        let mut poly = Polygon::new();
        poly.add_contour(&[pt(1.0, 1.0), pt(5.0, 2.0), pt(3.0, 7.0)])
            .unwrap();
        assert_eq!(poly.num_edges(), 3);
        assert_eq!(
            poly.extents(),
            Some(Rect::new(
                fixed_from_int(1),
                fixed_from_int(1),
                fixed_from_int(5),
                fixed_from_int(7)
            ))
        );
    }

    #[test]
    fn clipped_edge_decomposes() {
        let limit = Rect::from_pixels(0, 0, 10, 10);
        let mut poly = Polygon::with_limits(&[limit]);
        poly.add_external_edge(pt(-5.0, 0.0), pt(15.0, 10.0)).unwrap();

        let line = Line::new(pt(-5.0, 0.0), pt(15.0, 10.0));
        let expected = [
            Edge {
                line: Line::vertical(0, 0, fixed_from_int(10)).oriented().0,
                top: 0,
                bottom: 640,
                dir: 1,
            },
            Edge {
                line,
                top: 640,
                bottom: 1920,
                dir: 1,
            },
            Edge {
                line: Line::vertical(fixed_from_int(10), 0, fixed_from_int(10)),
                top: 1920,
                bottom: fixed_from_int(10),
                dir: 1,
            },
        ];
        assert_eq!(poly.num_edges(), 3);
        for (got, want) in poly.edges().iter().zip(&expected) {
            assert_eq!(got.top, want.top);
            assert_eq!(got.bottom, want.bottom);
            assert_eq!(got.dir, want.dir);
            assert_eq!(got.top_x(), want.top_x());
            assert_eq!(got.bottom_x(), want.bottom_x());
        }
    }

    #[test]
    fn clipping_outside_edges() {
        let limit = Rect::from_pixels(0, 0, 10, 10);
        let mut poly = Polygon::with_limits(&[limit]);
        // Entirely to the left: becomes a vertical edge on the left side.
        poly.add_external_edge(pt(-5.0, -5.0), pt(-3.0, 5.0)).unwrap();
        // Entirely below: dropped.
        poly.add_external_edge(pt(5.0, 11.0), pt(6.0, 20.0)).unwrap();
        // Inside: kept.
        poly.add_external_edge(pt(2.0, 2.0), pt(3.0, 3.0)).unwrap();

        assert_eq!(poly.num_edges(), 2);
        let e = poly.edges()[0];
        assert_eq!((e.top_x(), e.bottom_x()), (0, 0));
        assert_eq!((e.top, e.bottom), (0, fixed_from_int(5)));
        let e = poly.edges()[1];
        assert_eq!(e.line, Line::new(pt(2.0, 2.0), pt(3.0, 3.0)));
    }

    #[test]
    fn boxes_and_paths() {
        let mut poly = Polygon::new();
        poly.add_box(&Rect::from_pixels(0, 0, 2, 3), 1).unwrap();
        assert_eq!(poly.num_edges(), 2);
        assert_eq!(poly.edges()[0].dir, -1);
        assert_eq!(poly.edges()[1].dir, 1);

        let path = BezPath::from_svg("M0,0 L4,0 L4,4 Z M10,10 L12,10 L10,12").unwrap();
        let poly = Polygon::from_bez_path(&path, 0.1).unwrap();
        // Each triangle has one horizontal side.
        assert_eq!(poly.num_edges(), 4);

        let mut bad = BezPath::new();
        bad.move_to((0.0, 0.0));
        bad.line_to((f64::NAN, 1.0));
        assert_matches!(Polygon::from_bez_path(&bad, 0.1), Err(Error::Unsupported));
    }

    #[test]
    fn budget_limits_growth() {
        let mut poly = Polygon::with_budget(Budget::new(0));
        for i in 0..EMBEDDED_EDGES as i32 {
            poly.add_external_edge(Point::new(i, 0), Point::new(i, 10))
                .unwrap();
        }
        assert_matches!(
            poly.add_external_edge(Point::new(0, 0), Point::new(0, 10)),
            Err(Error::NoMemory)
        );
        assert_eq!(poly.num_edges(), EMBEDDED_EDGES);
    }
}
