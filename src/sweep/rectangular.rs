//! A sweep for axis-aligned rectangles.
//!
//! Every edge is vertical, so no two edges ever cross and there are no
//! intersection events. All the events are known up front: the tops and the
//! bottoms of the rectangles, each sorted once.

use crate::{
    boxes::Boxes,
    geom::{Edge, Fixed, Line, Rect},
    pool::TryVec,
    traps::Traps,
    Error, FillRule,
};

use super::{
    sweep_line::{Rule, Sink, SweepEdge, SweepLine},
    EdgeVec,
};

impl Sink for Boxes {
    fn add_band(
        &mut self,
        top: Fixed,
        bottom: Fixed,
        left: &Edge,
        right: &Edge,
    ) -> Result<(), Error> {
        self.add(Rect::new(left.line.p1.x, top, right.line.p1.x, bottom))
    }
}

fn sweep_rectangles(boxes: &Boxes, rule: Rule, sink: &mut impl Sink) -> Result<(), Error> {
    let budget = boxes.budget();
    let count = 2 * boxes.len();
    let mut edges = EdgeVec::try_with_capacity(count, budget)?;
    let mut starts = TryVec::with_capacity(count, budget.clone())?;
    let mut stops = TryVec::with_capacity(count, budget.clone())?;

    for r in boxes {
        let (top, bottom) = (r.p1.y, r.p2.y);
        for (x, dir) in [(r.p1.x, 1), (r.p2.x, -1)] {
            let edge = Edge {
                line: Line::vertical(x, top, bottom),
                top,
                bottom,
                dir,
            };
            let id = edges.try_push(SweepEdge::new(edge, 0))?;
            starts.try_push((top, x, id))?;
            stops.try_push((bottom, x, id))?;
        }
    }
    starts.sort_unstable();
    stops.sort_unstable();

    let mut line = SweepLine::new(edges, budget.clone());
    let (mut starts, mut stops) = (starts.iter().copied().peekable(), stops.iter().copied().peekable());
    loop {
        let y = match (starts.peek(), stops.peek()) {
            (Some(s), Some(t)) => s.0.min(t.0),
            (Some(s), None) => s.0,
            (None, Some(t)) => t.0,
            (None, None) => break,
        };
        line.flush_stopped(sink)?;
        line.walk(line.current_y, rule, sink)?;
        line.current_y = y;

        while let Some((_, _, e)) = stops.next_if(|t| t.0 == y) {
            line.stop(e)?;
        }
        while let Some((_, _, e)) = starts.next_if(|s| s.0 == y) {
            line.insert(e);
            line.adopt_stopped(e);
        }
        line.check_invariants();
    }
    line.flush_stopped(sink)
}

/// Resolves overlapping rectangles into non-overlapping ones covering the
/// points that are inside according to `fill_rule`.
///
/// Every rectangle in `boxes` winds once around its interior. The results
/// are appended to `out`; touching rectangles with matching sides get merged.
pub fn tessellate_boxes(out: &mut Boxes, boxes: &Boxes, fill_rule: FillRule) -> Result<(), Error> {
    log::debug!("tessellating {} boxes with {fill_rule:?}", boxes.len());
    if boxes.is_empty() {
        return Ok(());
    }
    let before = out.len();
    sweep_rectangles(boxes, fill_rule.into(), out)?;
    log::debug!("produced {} boxes", out.len() - before);
    Ok(())
}

/// Like [`tessellate_boxes`], but produces trapezoids.
pub fn tessellate_rectangles(
    traps: &mut Traps,
    boxes: &Boxes,
    fill_rule: FillRule,
) -> Result<(), Error> {
    log::debug!("tessellating {} rectangles with {fill_rule:?}", boxes.len());
    if boxes.is_empty() {
        return Ok(());
    }
    sweep_rectangles(boxes, fill_rule.into(), traps)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{pool::Budget, polygon::Polygon, sweep::tessellate_polygon};

    fn boxes(rects: &[(i32, i32, i32, i32)]) -> Boxes {
        Boxes::from_rects(
            rects
                .iter()
                .map(|&(x0, y0, x1, y1)| Rect::from_pixels(x0, y0, x1, y1)),
        )
        .unwrap()
    }

    fn tessellated(input: &Boxes, fill_rule: FillRule) -> Boxes {
        let mut out = Boxes::new();
        tessellate_boxes(&mut out, input, fill_rule).unwrap();
        out
    }

    #[test]
    fn single_box() {
        let input = boxes(&[(1, 2, 5, 7)]);
        let out = tessellated(&input, FillRule::NonZero);
        assert_eq!(out.as_slice(), input.as_slice());
    }

    #[test]
    fn neighbors_merge() {
        let side_by_side = boxes(&[(0, 0, 2, 2), (2, 0, 4, 2)]);
        let out = tessellated(&side_by_side, FillRule::NonZero);
        assert_eq!(out.as_slice(), &[Rect::from_pixels(0, 0, 4, 2)]);

        let stacked = boxes(&[(0, 2, 2, 4), (0, 0, 2, 2)]);
        let out = tessellated(&stacked, FillRule::NonZero);
        assert_eq!(out.as_slice(), &[Rect::from_pixels(0, 0, 2, 4)]);
    }

    #[test]
    fn overlaps() {
        let input = boxes(&[(0, 0, 4, 4), (2, 2, 6, 6)]);
        let nonzero = tessellated(&input, FillRule::NonZero);
        assert_eq!(nonzero.area(), 28.0);
        let evenodd = tessellated(&input, FillRule::EvenOdd);
        assert_eq!(evenodd.area(), 24.0);
        assert!(nonzero.contains(3.0, 3.0));
        assert!(!evenodd.contains(3.0, 3.0));

        // The output doesn't overlap.
        for out in [&nonzero, &evenodd] {
            for (i, a) in out.iter().enumerate() {
                for b in out.iter().skip(i + 1) {
                    assert_eq!(a.intersect(b), None, "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn nested() {
        let input = boxes(&[(0, 0, 10, 10), (2, 2, 8, 8), (4, 4, 6, 6)]);
        assert_eq!(tessellated(&input, FillRule::NonZero).area(), 100.0);
        assert_eq!(tessellated(&input, FillRule::EvenOdd).area(), 100.0 - 36.0 + 4.0);
    }

    #[test]
    fn matches_general_sweep() {
        let input = boxes(&[(0, 0, 3, 3), (1, 1, 5, 2), (2, 0, 4, 6), (7, 1, 8, 2)]);
        for fill_rule in [FillRule::NonZero, FillRule::EvenOdd] {
            let mut rect_traps = Traps::new();
            tessellate_rectangles(&mut rect_traps, &input, fill_rule).unwrap();

            let mut general = Traps::new();
            let poly = Polygon::from_boxes(&input).unwrap();
            tessellate_polygon(&mut general, &poly, fill_rule).unwrap();

            assert_eq!(rect_traps.area(), general.area());
            for i in 0..40 {
                for j in 0..30 {
                    let (x, y) = (i as f64 * 0.25 + 0.1, j as f64 * 0.25 + 0.1);
                    assert_eq!(rect_traps.contains(x, y), general.contains(x, y));
                }
            }
        }
    }

    #[test]
    fn empty_input() {
        let mut out = Boxes::with_budget(Budget::new(0));
        tessellate_boxes(&mut out, &Boxes::new(), FillRule::NonZero).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn out_of_memory() {
        let mut input = Boxes::with_budget(Budget::new(0));
        // The embedded storage doesn't need the budget, but the sweep does.
        input.add(Rect::from_pixels(0, 0, 1, 1)).unwrap();
        let mut out = Boxes::new();
        assert_matches!(
            tessellate_boxes(&mut out, &input, FillRule::NonZero),
            Err(Error::NoMemory)
        );
    }
}
