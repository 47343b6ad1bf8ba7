//! Scan conversion of axis-aligned boxes.
//!
//! Boxes never cross each other, so there's no need for winding numbers or
//! sample rows: the coverage of a pixel row is just, for each box, its
//! horizontal extent times the height of its overlap with the row.
//!
//! The boxes must not overlap, unless they are all pixel-aligned. Overlapping
//! coverage is added up and then saturates, which is only right for whole
//! pixels.

use crate::{
    boxes::Boxes,
    geom::{fixed_floor, Fixed, Rect, FIXED_ONE},
    pool::{Budget, TryVec},
    Error, FillRule,
};

use super::{cell::CellList, PixelBox, SpanRenderer};

/// A fully covered pixel, in the units of the cell list.
const FULL_AREA: i64 = 2 * FIXED_ONE as i64 * FIXED_ONE as i64;

fn area_to_alpha(area: i64) -> u8 {
    let area = area.clamp(0, FULL_AREA);
    ((area * 255 + FULL_AREA / 2) / FULL_AREA) as u8
}

/// Turns boxes into antialiased coverage.
///
/// The boxes must not overlap each other, unless they all have their sides
/// on pixel boundaries: coverage is summed per pixel, so two half-covered
/// overlapping boxes would fully cover a pixel. Only the non-zero fill rule
/// is supported. Resolve overlaps first with
/// [`tessellate_boxes`](crate::sweep::tessellate_boxes), which handles
/// either fill rule.
#[derive(Debug)]
pub struct RectangularConverter {
    extents: PixelBox,
    boxes: TryVec<Rect>,
    cells: CellList,
    budget: Budget,
}

impl RectangularConverter {
    /// Creates a converter for the pixels in `extents`.
    ///
    /// Returns [`Error::Unsupported`] for the even-odd fill rule.
    pub fn new(extents: PixelBox, fill_rule: FillRule) -> Result<Self, Error> {
        Self::with_budget(extents, fill_rule, Budget::unlimited())
    }

    /// Creates a converter whose working memory is charged to `budget`.
    pub fn with_budget(extents: PixelBox, fill_rule: FillRule, budget: Budget) -> Result<Self, Error> {
        if fill_rule != FillRule::NonZero {
            return Err(Error::Unsupported);
        }
        Ok(RectangularConverter {
            extents,
            boxes: TryVec::new(budget.clone()),
            cells: CellList::new(budget.clone()),
            budget,
        })
    }

    /// Adds a box, ignoring the parts of it outside the extents.
    pub fn add_box(&mut self, rect: &Rect) -> Result<(), Error> {
        let (x0, y0, x1, y1) = (
            self.extents.x0 as i64 * FIXED_ONE as i64,
            self.extents.y0 as i64 * FIXED_ONE as i64,
            self.extents.x1 as i64 * FIXED_ONE as i64,
            self.extents.y1 as i64 * FIXED_ONE as i64,
        );
        let clip = |v: Fixed, lo: i64, hi: i64| (v as i64).clamp(lo, hi) as Fixed;
        let clipped = Rect::new(
            clip(rect.p1.x, x0, x1),
            clip(rect.p1.y, y0, y1),
            clip(rect.p2.x, x0, x1),
            clip(rect.p2.y, y0, y1),
        );
        if clipped.is_empty() {
            return Ok(());
        }
        self.boxes.try_push(clipped)
    }

    /// Adds every box in `boxes`.
    pub fn add_boxes(&mut self, boxes: &Boxes) -> Result<(), Error> {
        for rect in boxes {
            self.add_box(rect)?;
        }
        Ok(())
    }

    /// Produces the coverage of every pixel row in the extents, in order.
    ///
    /// Runs of rows with identical coverage are reported together.
    pub fn generate(mut self, renderer: &mut impl SpanRenderer) -> Result<(), Error> {
        log::debug!(
            "scan converting {} boxes over {:?}",
            self.boxes.len(),
            self.extents
        );
        self.boxes.sort_unstable_by_key(|r| r.p1.y);
        let boxes = std::mem::replace(&mut self.boxes, TryVec::new(self.budget.clone()));
        let mut incoming = boxes.iter().copied().peekable();
        let mut active: TryVec<Rect> = TryVec::new(self.budget.clone());
        let mut spans = TryVec::new(self.budget.clone());

        let mut y = self.extents.y0;
        while y < self.extents.y1 {
            let row_top = y * FIXED_ONE;
            let row_bottom = row_top + FIXED_ONE;
            active.retain(|r| r.p2.y > row_top);
            while let Some(r) = incoming.next_if(|r| r.p1.y < row_bottom) {
                active.try_push(r)?;
            }
            let next_start = incoming
                .peek()
                .map_or(self.extents.y1, |r| fixed_floor(r.p1.y));

            if active.is_empty() {
                log::trace!("blank rows {y}..{next_start}");
                renderer.render_rows(y, next_start - y, &[])?;
                y = next_start;
                continue;
            }

            let mut uniform = true;
            let mut height = next_start - y;
            for r in active.iter() {
                let top = r.p1.y.max(row_top);
                let bottom = r.p2.y.min(row_bottom);
                self.cells
                    .add_subspan(r.p1.x as i64, r.p2.x as i64, FIXED_ONE, (bottom - top) as i64)?;
                self.cells.rewind();
                uniform &= r.p1.y <= row_top && r.p2.y >= row_bottom;
                height = height.min(fixed_floor(r.p2.y) - y);
            }
            if !uniform {
                height = 1;
            }

            self.cells.to_spans(FIXED_ONE, area_to_alpha, &mut spans)?;
            renderer.render_rows(y, height, &spans)?;
            self.cells.reset();
            y += height;
        }
        Ok(())
    }
}
