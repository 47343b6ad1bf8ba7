//! The per-row coverage accumulator.
//!
//! Each cell describes one pixel of the current row. Coverage is stored
//! as a difference: `covered_height` says how much more of a sample height
//! is covered from this pixel onwards (it applies to every pixel to the
//! right as well), and `uncovered_area` is how much of that this pixel in
//! particular is missing, because the coverage starts part way through it.
//!
//! Cells are kept in a list sorted by `x`, with a cursor at the last cell
//! touched. Within one sample row samples arrive left to right, so finding
//! the next cell is usually a step or two from the cursor.

use crate::{
    pool::{Budget, Pool, PoolIdx, TryVec},
    Error,
};

use super::Span;

const EMBEDDED_CELLS: usize = 64;

#[derive(Clone, Copy, Debug)]
struct Cell {
    x: i32,
    covered_height: i64,
    uncovered_area: i64,
    next: Option<PoolIdx>,
}

#[derive(Debug)]
pub struct CellList {
    pool: Pool<Cell, EMBEDDED_CELLS>,
    head: Option<PoolIdx>,
    cursor: Option<PoolIdx>,
}

impl CellList {
    pub fn new(budget: Budget) -> Self {
        CellList {
            pool: Pool::new(budget),
            head: None,
            cursor: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Forgets all the cells.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.head = None;
        self.cursor = None;
    }

    /// Moves the cursor back to the start, for a new sample row.
    pub fn rewind(&mut self) {
        self.cursor = None;
    }

    fn find(&mut self, x: i32) -> Result<PoolIdx, Error> {
        let mut prev = match self.cursor {
            Some(c) if self.pool[c].x <= x => Some(c),
            _ => None,
        };
        if let Some(p) = prev {
            if self.pool[p].x == x {
                return Ok(p);
            }
        }

        let mut next = match prev {
            Some(p) => self.pool[p].next,
            None => self.head,
        };
        while let Some(n) = next {
            let nx = self.pool[n].x;
            if nx == x {
                self.cursor = Some(n);
                return Ok(n);
            }
            if nx > x {
                break;
            }
            prev = Some(n);
            next = self.pool[n].next;
        }

        let idx = self.pool.alloc(Cell {
            x,
            covered_height: 0,
            uncovered_area: 0,
            next,
        })?;
        match prev {
            Some(p) => self.pool[p].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.cursor = Some(idx);
        Ok(idx)
    }

    /// Records that coverage starts (for positive `height`) or stops (for
    /// negative `height`) at grid position `x`.
    ///
    /// `cols` is the number of grid units per pixel, and `height` the
    /// (signed) height of the sample, in whatever vertical units the caller
    /// uses.
    pub fn add_edge(&mut self, x: i64, cols: i32, height: i64) -> Result<(), Error> {
        let ix = x.div_euclid(cols as i64);
        let fx = x.rem_euclid(cols as i64);
        self.add_cell(ix, height, 2 * fx * height)
    }

    /// Adds to a single cell.
    pub fn add_cell(&mut self, ix: i64, height: i64, uncovered: i64) -> Result<(), Error> {
        let Ok(ix) = i32::try_from(ix) else {
            return Err(Error::Unsupported);
        };
        let c = self.find(ix)?;
        let cell = &mut self.pool[c];
        cell.covered_height += height;
        cell.uncovered_area += uncovered;
        Ok(())
    }

    /// Adds a covered span from `x1` to `x2` (in grid units) with the given
    /// sample height.
    pub fn add_subspan(&mut self, x1: i64, x2: i64, cols: i32, height: i64) -> Result<(), Error> {
        if x1 >= x2 {
            return Ok(());
        }
        self.add_edge(x1, cols, height)?;
        self.add_edge(x2, cols, -height)
    }

    /// Converts the cells to a run-length encoded span list.
    ///
    /// A fully covered pixel has an area of `2 * cols` times the full sample
    /// height, and `alpha` maps areas to coverage.
    pub fn to_spans(
        &self,
        cols: i32,
        alpha: impl Fn(i64) -> u8,
        spans: &mut TryVec<Span>,
    ) -> Result<(), Error> {
        spans.clear();
        let push = |spans: &mut TryVec<Span>, x: i32, coverage: u8| -> Result<(), Error> {
            let last = spans.last().map_or(0, |s: &Span| s.coverage);
            if last != coverage {
                spans.try_push(Span::new(x, coverage))?;
            }
            Ok(())
        };

        let mut cover = 0i64;
        let mut pos = self.head;
        while let Some(c) = pos {
            let cell = self.pool[c];
            cover += cell.covered_height * 2 * cols as i64;
            push(spans, cell.x, alpha(cover - cell.uncovered_area))?;

            let gap = match cell.next {
                Some(n) => self.pool[n].x > cell.x + 1,
                None => true,
            };
            if gap {
                push(spans, cell.x + 1, alpha(cover))?;
            }
            pos = cell.next;
        }
        debug_assert!(spans.last().map_or(true, |s| s.coverage == 0));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(cells: &CellList, cols: i32, full: i64) -> Vec<(i32, u8)> {
        let mut out = TryVec::new(Budget::unlimited());
        cells
            .to_spans(
                cols,
                |a| ((a.clamp(0, full) * 255 + full / 2) / full) as u8,
                &mut out,
            )
            .unwrap();
        out.iter().map(|s| (s.x, s.coverage)).collect()
    }

    #[test]
    fn one_subspan() {
        let mut cells = CellList::new(Budget::unlimited());
        // From x = 1.5 to x = 4.25, on a grid of 4 units per pixel, with the
        // full height of 1.
        cells.add_subspan(6, 17, 4, 1).unwrap();
        assert_eq!(
            spans(&cells, 4, 8),
            vec![(1, 128), (2, 255), (4, 64), (5, 0)]
        );
    }

    #[test]
    fn within_one_pixel() {
        let mut cells = CellList::new(Budget::unlimited());
        cells.add_subspan(9, 11, 4, 1).unwrap();
        assert_eq!(spans(&cells, 4, 8), vec![(2, 128), (3, 0)]);
    }

    #[test]
    fn rows_accumulate() {
        let mut cells = CellList::new(Budget::unlimited());
        // Two sample rows out of two: the first covers pixels 0 and 1, the
        // second covers pixel 1 only.
        cells.add_subspan(0, 8, 4, 1).unwrap();
        cells.rewind();
        cells.add_subspan(4, 8, 4, 1).unwrap();
        assert_eq!(spans(&cells, 4, 16), vec![(0, 128), (1, 255), (2, 0)]);

        cells.reset();
        assert!(cells.is_empty());
        assert_eq!(spans(&cells, 4, 16), vec![]);
    }

    #[test]
    fn out_of_order_cells() {
        let mut cells = CellList::new(Budget::unlimited());
        cells.add_subspan(40, 48, 4, 1).unwrap();
        cells.rewind();
        cells.add_subspan(0, 4, 4, 1).unwrap();
        cells.add_subspan(20, 24, 4, 1).unwrap();
        assert_eq!(
            spans(&cells, 4, 8),
            vec![(0, 255), (1, 0), (5, 255), (6, 0), (10, 255), (12, 0)]
        );
    }

    #[test]
    fn no_memory() {
        let mut cells = CellList::new(Budget::new(0));
        let mut result = Ok(());
        for i in 0..100 {
            result = result.and_then(|_| cells.add_subspan(8 * i, 8 * i + 2, 4, 1));
        }
        assert_eq!(result, Err(Error::NoMemory));
    }
}
