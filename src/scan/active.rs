//! Edges on the sample grid, and the list of edges crossing the current
//! sample row.
//!
//! The sample rows of pixel row `y` are `y * ROWS .. (y + 1) * ROWS`, and
//! sample row `sy` sits at the vertical center of its slice of the pixel.
//! An edge covers the sample rows whose centers are in `[top, bottom)`.
//!
//! Horizontally, an edge's position at a sample row is rounded to the
//! nearest grid column. We keep it as a quotient and remainder so that
//! stepping down a row is exact: after any number of steps, the position is
//! the same as if it had been computed from scratch.

use crate::{
    geom::{Edge, Fixed, FIXED_ONE},
    pool::{Budget, Pool, PoolIdx, TryVec},
    wide::{floored_divrem, floored_divrem_128, QuoRem},
    Error,
};

use super::Grid;

const EMBEDDED_EDGES: usize = 64;

/// The first sample row whose center is at or below `y`.
fn first_sample_row(y: Fixed, rows: i64) -> i64 {
    // The center of sample row `sy` is at `(2 * sy + 1) * 256 / (2 * rows)`.
    let num = 2 * rows * y as i64 - FIXED_ONE as i64;
    let den = 2 * FIXED_ONE as i64;
    -(-num).div_euclid(den)
}

#[derive(Clone, Copy, Debug)]
pub struct ScanEdge {
    /// The position at the current sample row, in grid columns. The
    /// remainder is in `[0, den)`.
    x: QuoRem<i64>,
    step: QuoRem<i64>,
    step_full: QuoRem<i64>,
    step_tail: QuoRem<i64>,
    den: i64,
    /// The first sample row.
    pub top: i64,
    /// The number of sample rows left, including the current one.
    pub remaining: i64,
    pub dir: i32,
    pub vertical: bool,
}

impl ScanEdge {
    /// Puts `edge` on the grid of `G`, restricted to the sample rows
    /// `first..last`.
    ///
    /// Returns `None` if the edge doesn't cross any of those sample rows.
    pub fn new<G: Grid>(edge: &Edge, first: i64, last: i64) -> Result<Option<ScanEdge>, Error> {
        let rows = G::ROWS as i64;
        let top = first_sample_row(edge.top, rows).max(first);
        let bottom = first_sample_row(edge.bottom, rows).min(last);
        if top >= bottom {
            return Ok(None);
        }

        let line = edge.line;
        let dx = line.dx();
        let dy = line.dy();
        debug_assert!(dy > 0);

        let num_scale = dy * 2 * rows;
        let den = num_scale * (FIXED_ONE / G::COLS) as i64;
        let offset = (2 * top + 1) * FIXED_ONE as i64 - 2 * rows * line.p1.y as i64;
        let num = line.p1.x as i128 * num_scale as i128 + offset as i128 * dx as i128
            + (den / 2) as i128;
        let QuoRem { quo, rem } = floored_divrem_128(num, den);
        let Ok(quo) = i64::try_from(quo) else {
            return Err(Error::Unsupported);
        };

        let per_row = 2 * FIXED_ONE as i64 * dx;
        Ok(Some(ScanEdge {
            x: QuoRem {
                quo,
                rem: rem as i64,
            },
            step: floored_divrem(per_row, den),
            step_full: floored_divrem(per_row * rows, den),
            step_tail: floored_divrem(per_row * (rows - 1), den),
            den,
            top,
            remaining: bottom - top,
            dir: edge.dir,
            vertical: dx == 0,
        }))
    }

    /// The position at the current sample row, in grid columns.
    pub fn x(&self) -> i64 {
        self.x.quo
    }

    fn stepped(&self, step: QuoRem<i64>) -> QuoRem<i64> {
        let mut quo = self.x.quo + step.quo;
        let mut rem = self.x.rem + step.rem;
        if rem >= self.den {
            quo += 1;
            rem -= self.den;
        }
        QuoRem { quo, rem }
    }

    /// Moves down one sample row.
    pub fn advance(&mut self) {
        self.x = self.stepped(self.step);
        self.remaining -= 1;
    }

    /// Moves down a whole pixel row.
    pub fn advance_row(&mut self, rows: i64) {
        self.x = self.stepped(self.step_full);
        self.remaining -= rows;
    }

    /// Moves down `n` pixel rows. Only for vertical edges.
    pub fn skip_rows(&mut self, n: i64, rows: i64) {
        debug_assert!(self.vertical);
        self.remaining -= n * rows;
    }

    /// The position at the last sample row of the current pixel row, if the
    /// current sample row is the first one.
    pub fn x_last(&self) -> i64 {
        self.stepped(self.step_tail).quo
    }
}

/// Every edge of a scan conversion, bucketed by the pixel row they start
/// in, and the active list of edges that cross the current sample row.
#[derive(Debug)]
pub struct EdgeTable {
    pool: Pool<ScanEdge, EMBEDDED_EDGES>,
    buckets: TryVec<TryVec<PoolIdx>>,
    occupied: usize,
    /// Edges starting in the current pixel row that aren't active yet,
    /// sorted by first sample row and then by position.
    pending: TryVec<PoolIdx>,
    active: TryVec<PoolIdx>,
    scratch: TryVec<PoolIdx>,
    budget: Budget,
}

impl EdgeTable {
    pub fn new(num_rows: usize, budget: Budget) -> Result<Self, Error> {
        let mut buckets = TryVec::with_capacity(num_rows, budget.clone())?;
        for _ in 0..num_rows {
            buckets.try_push(TryVec::new(budget.clone()))?;
        }
        Ok(EdgeTable {
            pool: Pool::new(budget.clone()),
            buckets,
            occupied: 0,
            pending: TryVec::new(budget.clone()),
            active: TryVec::new(budget.clone()),
            scratch: TryVec::new(budget.clone()),
            budget,
        })
    }

    pub fn num_edges(&self) -> usize {
        self.pool.len()
    }

    pub fn insert(&mut self, edge: ScanEdge, row: usize) -> Result<(), Error> {
        let idx = self.pool.alloc(edge)?;
        let bucket = &mut self.buckets[row];
        if bucket.is_empty() {
            self.occupied += 1;
        }
        bucket.try_push(idx)
    }

    pub fn edge(&self, idx: PoolIdx) -> &ScanEdge {
        &self.pool[idx]
    }

    /// The active edges, in order.
    pub fn active(&self) -> &[PoolIdx] {
        &self.active
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn bucket_is_empty(&self, row: usize) -> bool {
        self.buckets[row].is_empty()
    }

    /// The first non-empty bucket at or after `row`, or `end` if there isn't
    /// one.
    pub fn next_bucket(&self, row: usize, end: usize) -> usize {
        if self.occupied == 0 {
            return end;
        }
        (row..end)
            .find(|&r| !self.buckets[r].is_empty())
            .unwrap_or(end)
    }

    /// Moves the edges starting in pixel row `row` into the pending list.
    pub fn open_row(&mut self, row: usize) -> Result<(), Error> {
        debug_assert!(self.pending.is_empty());
        if self.buckets[row].is_empty() {
            return Ok(());
        }
        let bucket = std::mem::replace(&mut self.buckets[row], TryVec::new(self.budget.clone()));
        self.occupied -= 1;
        self.pending.try_extend_from_slice(&bucket)?;
        let pool = &self.pool;
        self.pending
            .sort_by_key(|&e| (std::cmp::Reverse(pool[e].top), std::cmp::Reverse(pool[e].x())));
        Ok(())
    }

    /// Activates the pending edges that start at sample row `sy`.
    ///
    /// The active list must be sorted.
    pub fn activate(&mut self, sy: i64) -> Result<(), Error> {
        // The pending list is sorted backwards, so the edges that start
        // first are at the end.
        let pool = &self.pool;
        let count = self
            .pending
            .iter()
            .rev()
            .take_while(|&&e| pool[e].top == sy)
            .count();
        if count == 0 {
            return Ok(());
        }

        let start = self.pending.len() - count;
        self.scratch.clear();
        self.scratch.try_reserve(self.active.len() + count)?;
        let mut incoming = self.pending[start..].iter().rev().copied().peekable();
        let mut active = self.active.iter().copied().peekable();
        loop {
            let next = match (active.peek(), incoming.peek()) {
                (Some(&a), Some(&b)) => {
                    if pool[b].x() < pool[a].x() {
                        incoming.next()
                    } else {
                        active.next()
                    }
                }
                (Some(_), None) => active.next(),
                (None, Some(_)) => incoming.next(),
                (None, None) => break,
            };
            if let Some(e) = next {
                self.scratch.try_push(e)?;
            }
        }
        self.pending.truncate(start);
        std::mem::swap(&mut self.active, &mut self.scratch);
        self.check_invariants();
        Ok(())
    }

    /// Restores the order of the active list after its edges have moved.
    ///
    /// Edges rarely overtake each other, and when they do they rarely go far,
    /// so this is an insertion sort.
    pub fn sort(&mut self) {
        let pool = &self.pool;
        let active = &mut self.active;
        for i in 1..active.len() {
            let e = active[i];
            let x = pool[e].x();
            let mut j = i;
            while j > 0 && pool[active[j - 1]].x() > x {
                active[j] = active[j - 1];
                j -= 1;
            }
            active[j] = e;
        }
        self.check_invariants();
    }

    /// The smallest number of sample rows left on any active edge.
    pub fn min_remaining(&self) -> i64 {
        self.active
            .iter()
            .map(|&e| self.pool[e].remaining)
            .min()
            .unwrap_or(i64::MAX)
    }

    pub fn all_vertical(&self) -> bool {
        self.active.iter().all(|&e| self.pool[e].vertical)
    }

    /// Do the active edges keep their order until the end of the pixel row?
    pub fn stays_sorted(&self) -> bool {
        let mut prev = i64::MIN;
        for &e in &self.active {
            let x = self.pool[e].x_last();
            if x < prev {
                return false;
            }
            prev = x;
        }
        true
    }

    /// Applies `f` to every active edge, dropping the ones that are finished.
    pub fn step(&mut self, mut f: impl FnMut(&mut ScanEdge)) {
        let pool = &mut self.pool;
        self.active.retain(|&e| {
            f(&mut pool[e]);
            pool[e].remaining > 0
        });
    }

    /// Forgets all the edges.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
        self.pool.reset();
    }

    #[cfg(feature = "slow-asserts")]
    fn check_invariants(&self) {
        for pair in self.active.windows(2) {
            assert!(self.pool[pair[0]].x() <= self.pool[pair[1]].x());
        }
        for &e in &self.active {
            assert!(self.pool[e].remaining > 0);
        }
    }

    #[cfg(not(feature = "slow-asserts"))]
    fn check_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::{fixed_from_int, Line, Point},
        scan::{Mono, Tor, Tor22},
    };

    fn edge(x1: i32, y1: i32, x2: i32, y2: i32) -> Edge {
        let line = Line::new(Point::new(x1, y1), Point::new(x2, y2));
        Edge {
            line,
            top: y1,
            bottom: y2,
            dir: 1,
        }
    }

    fn positions<G: Grid>(e: &Edge) -> Vec<i64> {
        let mut edge = ScanEdge::new::<G>(e, i64::MIN / 4, i64::MAX / 4)
            .unwrap()
            .unwrap();
        let mut xs = Vec::new();
        while edge.remaining > 0 {
            xs.push(edge.x());
            edge.advance();
        }
        xs
    }

    #[test]
    fn sample_rows() {
        assert_eq!(first_sample_row(0, 1), 0);
        assert_eq!(first_sample_row(128, 1), 0);
        assert_eq!(first_sample_row(129, 1), 1);
        assert_eq!(first_sample_row(-128, 1), -1);
        assert_eq!(first_sample_row(fixed_from_int(2), 15), 30);
        assert_eq!(first_sample_row(fixed_from_int(2) + 8, 15), 30);
        assert_eq!(first_sample_row(fixed_from_int(2) + 9, 15), 31);
    }

    #[test]
    fn vertical_edge() {
        let e = edge(fixed_from_int(3), 0, fixed_from_int(3), fixed_from_int(2));
        assert_eq!(positions::<Tor>(&e), vec![768; 30]);
        assert_eq!(positions::<Tor22>(&e), vec![12; 8]);
        assert_eq!(positions::<Mono>(&e), vec![3; 2]);
    }

    #[test]
    fn diagonal_edge() {
        // x = y, sampled at y = 0.5 and 1.5 and rounded to whole pixels.
        let e = edge(0, 0, fixed_from_int(2), fixed_from_int(2));
        assert_eq!(positions::<Mono>(&e), vec![1, 2]);

        // On the 4x4 grid, the sample rows are at y = 1/8, 3/8, ...
        let xs = positions::<Tor22>(&e);
        assert_eq!(xs, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn stepping_is_exact() {
        let e = edge(-700, -33, 5001, 7777);
        let first = ScanEdge::new::<Tor>(&e, i64::MIN / 4, i64::MAX / 4)
            .unwrap()
            .unwrap();
        let mut stepped = first;
        let mut sy = first.top;
        while stepped.remaining > 1 {
            stepped.advance();
            sy += 1;
            let direct = ScanEdge::new::<Tor>(&e, sy, i64::MAX / 4)
                .unwrap()
                .unwrap();
            assert_eq!(stepped.x, direct.x);
        }

        let mut row = first;
        let tail = row.x_last();
        let mut by_sample = first;
        for _ in 0..14 {
            by_sample.advance();
        }
        assert_eq!(tail, by_sample.x());
        by_sample.advance();
        row.advance_row(15);
        assert_eq!(row.x, by_sample.x);
        assert_eq!(row.remaining, by_sample.remaining);
    }

    #[test]
    fn clipping() {
        let e = edge(0, 0, 0, fixed_from_int(10));
        let clipped = ScanEdge::new::<Tor22>(&e, 8, 12).unwrap().unwrap();
        assert_eq!(clipped.top, 8);
        assert_eq!(clipped.remaining, 4);
        assert!(ScanEdge::new::<Tor22>(&e, 40, 48).unwrap().is_none());

        // Too short to cross a sample row.
        let short = edge(0, 10, 0, 20);
        assert!(ScanEdge::new::<Mono>(&short, 0, 10).unwrap().is_none());
    }

    #[test]
    fn activation_merges() {
        let mut table = EdgeTable::new(2, Budget::unlimited()).unwrap();
        let xs = [5, 1, 3];
        for (i, x) in xs.into_iter().enumerate() {
            let x = fixed_from_int(x);
            let top = if i == 2 { 64 } else { 0 };
            let e = edge(x, top, x, fixed_from_int(1));
            let scan = ScanEdge::new::<Tor22>(&e, 0, 8).unwrap().unwrap();
            table.insert(scan, 0).unwrap();
        }
        assert!(!table.bucket_is_empty(0));
        assert_eq!(table.next_bucket(0, 2), 0);
        table.open_row(0).unwrap();
        assert_eq!(table.next_bucket(0, 2), 2);

        table.activate(0).unwrap();
        let xs: Vec<_> = table.active().iter().map(|&e| table.edge(e).x()).collect();
        assert_eq!(xs, vec![4, 20]);
        assert!(table.has_pending());

        table.activate(1).unwrap();
        let xs: Vec<_> = table.active().iter().map(|&e| table.edge(e).x()).collect();
        assert_eq!(xs, vec![4, 12, 20]);
        assert!(!table.has_pending());
        assert!(table.all_vertical());
        assert_eq!(table.min_remaining(), 3);
    }
}
