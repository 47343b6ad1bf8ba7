use std::marker::PhantomData;

use crate::{
    geom::Edge,
    polygon::Polygon,
    pool::{Budget, TryVec},
    Error, FillRule,
};

use super::{
    active::{EdgeTable, ScanEdge},
    cell::CellList,
    Grid, PixelBox, Span, SpanRenderer,
};

/// Turns edges into antialiased coverage, on the sampling grid `G`.
///
/// Create one with the rectangle of pixels you're interested in, add some
/// edges and then call [`ScanConverter::generate`]. Edges may extend beyond
/// the rectangle; the parts outside it still count for the winding number
/// but are never drawn.
///
/// ```
/// use polysweep::{scan::{ScanConverter, Span, Tor}, FillRule, Polygon, Rect};
///
/// let mut poly = Polygon::new();
/// poly.add_box(&Rect::from_pixels(1, 1, 3, 2), 1).unwrap();
///
/// let mut conv = ScanConverter::<Tor>::new((0, 0, 4, 4).into(), FillRule::NonZero).unwrap();
/// conv.add_polygon(&poly).unwrap();
///
/// let mut rows = Vec::new();
/// conv.generate(&mut |y, height, spans: &[Span]| {
///     rows.push((y, height, spans.iter().map(|s| (s.x, s.coverage)).collect::<Vec<_>>()));
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(
///     rows,
///     vec![(0, 1, vec![]), (1, 1, vec![(1, 255), (3, 0)]), (2, 2, vec![])]
/// );
/// ```
#[derive(Debug)]
pub struct ScanConverter<G: Grid> {
    extents: PixelBox,
    mask: i32,
    edges: EdgeTable,
    cells: CellList,
    budget: Budget,
    _grid: PhantomData<G>,
}

impl<G: Grid> ScanConverter<G> {
    /// Creates a scan converter for the pixels in `extents`.
    pub fn new(extents: PixelBox, fill_rule: FillRule) -> Result<Self, Error> {
        Self::with_budget(extents, fill_rule, Budget::unlimited())
    }

    /// Creates a scan converter whose working memory is charged to `budget`.
    pub fn with_budget(extents: PixelBox, fill_rule: FillRule, budget: Budget) -> Result<Self, Error> {
        let edges = EdgeTable::new(extents.height() as usize, budget.clone())?;
        Ok(ScanConverter {
            extents,
            mask: match fill_rule {
                FillRule::NonZero => !0,
                FillRule::EvenOdd => 1,
            },
            edges,
            cells: CellList::new(budget.clone()),
            budget,
            _grid: PhantomData,
        })
    }

    /// The pixels this converter covers.
    pub fn extents(&self) -> PixelBox {
        self.extents
    }

    /// Adds an edge.
    ///
    /// Edges that don't cross the center of any sample row inside the
    /// extents are ignored.
    pub fn add_edge(&mut self, edge: &Edge) -> Result<(), Error> {
        if edge.top >= edge.bottom || self.extents.is_empty() {
            return Ok(());
        }
        let rows = G::ROWS as i64;
        let first = self.extents.y0 as i64 * rows;
        let last = self.extents.y1 as i64 * rows;
        let Some(scan) = ScanEdge::new::<G>(edge, first, last)? else {
            return Ok(());
        };
        let row = (scan.top.div_euclid(rows) - self.extents.y0 as i64) as usize;
        self.edges.insert(scan, row)
    }

    /// Adds all the edges of a polygon.
    pub fn add_polygon(&mut self, polygon: &Polygon) -> Result<(), Error> {
        for edge in polygon.edges() {
            self.add_edge(edge)?;
        }
        Ok(())
    }

    /// Produces the coverage of every pixel row in the extents, in order.
    ///
    /// Runs of rows with identical coverage are reported together. If this
    /// fails (because it ran out of memory, or because the renderer
    /// returned an error), the renderer will already have seen some of the
    /// rows.
    pub fn generate(mut self, renderer: &mut impl SpanRenderer) -> Result<(), Error> {
        log::debug!(
            "scan converting {} edges over {:?} on the {} grid",
            self.edges.num_edges(),
            self.extents,
            G::NAME
        );
        let rows = G::ROWS as i64;
        let num_rows = self.extents.height() as usize;
        let mut spans = TryVec::new(self.budget.clone());

        let mut r = 0;
        while r < num_rows {
            let y = self.extents.y0 + r as i32;
            if self.edges.active().is_empty() && self.edges.bucket_is_empty(r) {
                let next = self.edges.next_bucket(r + 1, num_rows);
                log::trace!("blank rows {y}..{}", self.extents.y0 + next as i32);
                renderer.render_rows(y, (next - r) as i32, &[])?;
                r = next;
                continue;
            }

            let row_top = y as i64 * rows;
            self.edges.open_row(r)?;
            self.edges.sort();
            self.edges.activate(row_top)?;

            let whole_row = !self.edges.has_pending()
                && !self.edges.active().is_empty()
                && self.edges.min_remaining() >= rows;
            let mut height = 1;
            if whole_row && self.edges.all_vertical() {
                height = self.uniform_rows(r, num_rows)?;
            } else if whole_row && G::FULL_ROW_STEP && self.edges.stays_sorted() {
                log::trace!("row {y}: full step");
                self.full_row()?;
            } else {
                log::trace!("row {y}: sampled");
                self.sampled_row(row_top)?;
            }

            self.cells.to_spans(
                G::COLS,
                |a| G::area_to_alpha(a.clamp(0, G::AREA as i64) as i32),
                &mut spans,
            )?;
            renderer.render_rows(y, height as i32, &spans)?;
            self.cells.reset();
            r += height;
        }
        self.edges.clear();
        Ok(())
    }

    fn clamp(&self, x: i64) -> i64 {
        let cols = G::COLS as i64;
        x.clamp(self.extents.x0 as i64 * cols, self.extents.x1 as i64 * cols)
    }

    fn inside(&self, winding: i32) -> bool {
        winding & self.mask != 0
    }

    /// Adds the coverage of one sample row.
    fn sample(&mut self, height: i64) -> Result<(), Error> {
        let mut winding = 0;
        let mut left = 0;
        for &e in self.edges.active() {
            let edge = self.edges.edge(e);
            let was_inside = self.inside(winding);
            winding += edge.dir;
            let now_inside = self.inside(winding);
            if !was_inside && now_inside {
                left = edge.x();
            } else if was_inside && !now_inside {
                let (l, r) = (self.clamp(left), self.clamp(edge.x()));
                self.cells.add_subspan(l, r, G::COLS, height)?;
            }
        }
        self.cells.rewind();
        Ok(())
    }

    fn sampled_row(&mut self, row_top: i64) -> Result<(), Error> {
        for sy in row_top..row_top + G::ROWS as i64 {
            if sy > row_top {
                self.edges.sort();
                self.edges.activate(sy)?;
            }
            self.sample(1)?;
            self.edges.step(|e| e.advance());
        }
        debug_assert!(!self.edges.has_pending());
        Ok(())
    }

    /// Adds the coverage of a whole pixel row, given that no edge starts or
    /// stops in it, and that the edges don't change order.
    fn full_row(&mut self) -> Result<(), Error> {
        let rows = G::ROWS as i64;
        let cols = G::COLS as i64;
        let mut winding = 0;
        for &e in self.edges.active() {
            let edge = *self.edges.edge(e);
            let was_inside = self.inside(winding);
            winding += edge.dir;
            let sign = match (was_inside, self.inside(winding)) {
                (false, true) => 1,
                (true, false) => -1,
                _ => continue,
            };

            // The area of a single cell comes from the endpoints, which is
            // only right if neither of them was clamped.
            let (first, last) = (edge.x(), edge.x_last());
            let ix = first.div_euclid(cols);
            let single_cell = ix == last.div_euclid(cols)
                && self.clamp(first) == first
                && self.clamp(last) == last;
            if single_cell {
                let uncovered = sign * rows * (first + last - 2 * ix * cols);
                self.cells.add_cell(ix, sign * rows, uncovered)?;
            } else {
                let mut edge = edge;
                for _ in 0..rows {
                    let x = self.clamp(edge.x());
                    self.cells.add_edge(x, G::COLS, sign)?;
                    edge.advance();
                }
            }
        }
        self.edges.step(|e| e.advance_row(rows));
        Ok(())
    }

    /// Adds the coverage of a row whose edges are all vertical, and returns
    /// how many rows in a row have the same coverage.
    fn uniform_rows(&mut self, r: usize, num_rows: usize) -> Result<usize, Error> {
        let rows = G::ROWS as i64;
        self.sample(rows)?;

        let min_rows = (self.edges.min_remaining() / rows) as usize;
        let next = self.edges.next_bucket(r + 1, num_rows);
        let height = min_rows.min(next - r);
        log::trace!(
            "row {}: {height} uniform rows",
            self.extents.y0 + r as i32
        );
        self.edges.step(|e| e.skip_rows(height as i64, rows));
        Ok(height)
    }
}
