//! Span renderers: an 8-bit coverage mask, and an adaptor that inverts
//! coverage.

use crate::{
    pool::{Budget, TryVec},
    Error,
};

use super::{PixelBox, Span, SpanRenderer};

/// An 8-bit coverage buffer, covering a rectangle of pixels.
///
/// Rows are stored top to bottom, with no padding between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageMask {
    extents: PixelBox,
    data: TryVec<u8>,
}

impl CoverageMask {
    /// A mask with zero coverage everywhere.
    pub fn new(extents: PixelBox) -> Result<Self, Error> {
        Self::with_budget(extents, Budget::unlimited())
    }

    /// A mask with zero coverage everywhere, whose memory is charged to
    /// `budget`.
    pub fn with_budget(extents: PixelBox, budget: Budget) -> Result<Self, Error> {
        let len = extents.width() as usize * extents.height() as usize;
        let mut data = TryVec::new(budget);
        data.try_resize(len, 0)?;
        Ok(CoverageMask { extents, data })
    }

    /// The pixels covered by this mask.
    pub fn extents(&self) -> PixelBox {
        self.extents
    }

    /// The number of columns.
    pub fn width(&self) -> i32 {
        self.extents.width()
    }

    /// The number of rows.
    pub fn height(&self) -> i32 {
        self.extents.height()
    }

    /// The coverage values, row by row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let e = &self.extents;
        (y - e.y0) as usize * e.width() as usize + (x - e.x0) as usize
    }

    /// The coverage of a pixel, or zero if it's outside the mask.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        let e = &self.extents;
        if x < e.x0 || x >= e.x1 || y < e.y0 || y >= e.y1 {
            return 0;
        }
        self.data[self.index(x, y)]
    }

    /// The sum of all the coverage, in pixels.
    pub fn total_coverage(&self) -> f64 {
        self.data.iter().map(|&c| c as u64).sum::<u64>() as f64 / 255.0
    }
}

impl SpanRenderer for CoverageMask {
    fn render_rows(&mut self, y: i32, height: i32, spans: &[Span]) -> Result<(), Error> {
        let e = self.extents;
        for row in y.max(e.y0)..(y + height).min(e.y1) {
            for pair in spans.windows(2) {
                let (x0, x1) = (pair[0].x.max(e.x0), pair[1].x.min(e.x1));
                if x0 >= x1 {
                    continue;
                }
                let (start, end) = (self.index(x0, row), self.index(x1 - 1, row) + 1);
                self.data[start..end].fill(pair[0].coverage);
            }
        }
        Ok(())
    }
}

/// Passes the complement of the coverage on to another renderer.
///
/// Everything in `extents` that was covered becomes uncovered and vice
/// versa, so that rows with no spans come out fully covered. The resulting
/// spans have their `inverse` flag set.
#[derive(Debug)]
pub struct Inverted<R> {
    inner: R,
    x0: i32,
    x1: i32,
    scratch: TryVec<Span>,
}

impl<R: SpanRenderer> Inverted<R> {
    /// Inverts coverage between columns `extents.x0` and `extents.x1`.
    pub fn new(inner: R, extents: PixelBox) -> Self {
        Inverted {
            inner,
            x0: extents.x0,
            x1: extents.x1,
            scratch: TryVec::new(Budget::unlimited()),
        }
    }

    /// Returns the wrapped renderer.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn push_inverse(out: &mut TryVec<Span>, x: i32, coverage: u8) -> Result<(), Error> {
    let n = out.len();
    if let Some(last) = out.last_mut() {
        if last.x == x {
            last.coverage = coverage;
            let merged = match n {
                1 => coverage == 0,
                _ => out[n - 2].coverage == coverage,
            };
            if merged {
                out.pop();
            }
            return Ok(());
        }
        if last.coverage == coverage {
            return Ok(());
        }
    } else if coverage == 0 {
        return Ok(());
    }
    out.try_push(Span {
        x,
        coverage,
        inverse: true,
    })
}

impl<R: SpanRenderer> SpanRenderer for Inverted<R> {
    fn render_rows(&mut self, y: i32, height: i32, spans: &[Span]) -> Result<(), Error> {
        let out = &mut self.scratch;
        out.clear();
        out.try_reserve(spans.len() + 2)?;
        if self.x0 < self.x1 {
            push_inverse(out, self.x0, 255)?;
            for s in spans.iter().take_while(|s| s.x < self.x1) {
                push_inverse(out, s.x.max(self.x0), 255 - s.coverage)?;
            }
            push_inverse(out, self.x1, 0)?;
        }
        self.inner.render_rows(y, height, out)
    }
}
