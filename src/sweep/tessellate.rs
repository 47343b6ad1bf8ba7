//! The general Bentley-Ottmann sweep, and the entry points built on it.

use std::{borrow::Cow, cmp::Ordering};

use crate::{
    geom::{Edge, Fixed},
    polygon::Polygon,
    pool::{Budget, TryVec},
    traps::Traps,
    Error, FillRule,
};

use super::{
    compare::{intersect_edges, slope_compare},
    event::{Event, EventKind, EventQueue},
    sweep_line::{Rule, Sink, SweepEdge, SweepLine},
    EdgeId, EdgeVec,
};

impl Sink for Traps {
    fn add_band(
        &mut self,
        top: Fixed,
        bottom: Fixed,
        left: &Edge,
        right: &Edge,
    ) -> Result<(), Error> {
        self.add_trap(top, bottom, &left.line, &right.line)
    }
}

impl Sink for Polygon {
    fn add_band(
        &mut self,
        top: Fixed,
        bottom: Fixed,
        left: &Edge,
        right: &Edge,
    ) -> Result<(), Error> {
        self.add_line(&left.line, top, bottom, 1)?;
        self.add_line(&right.line, top, bottom, -1)
    }
}

struct Sweep {
    line: SweepLine,
    queue: EventQueue,
    rule: Rule,
}

impl Sweep {
    fn new<'a>(
        edges: impl IntoIterator<Item = (&'a Edge, usize)>,
        count: usize,
        rule: Rule,
        budget: &Budget,
    ) -> Result<Self, Error> {
        let mut sweep_edges = EdgeVec::try_with_capacity(count, budget)?;
        let mut starts = TryVec::with_capacity(count, budget.clone())?;
        for (edge, owner) in edges {
            let id = sweep_edges.try_push(SweepEdge::new(*edge, owner))?;
            starts.try_push(Event::start(edge.top_point(), id))?;
        }

        Ok(Sweep {
            line: SweepLine::new(sweep_edges, budget.clone()),
            queue: EventQueue::new(starts, budget.clone()),
            rule,
        })
    }

    /// Schedules an intersection event if `left` and `right` (which are
    /// neighbors, in that order) are going to cross.
    fn insert_if_intersect(&mut self, left: EdgeId, right: EdgeId) -> Result<(), Error> {
        let (l, r) = (self.line.edge(left), self.line.edge(right));
        // They can only cross below us if the left one leans further right.
        if slope_compare(l, r) != Ordering::Greater {
            return Ok(());
        }
        let Some(p) = intersect_edges(l, r) else {
            return Ok(());
        };
        let mut point = p.point();
        // Rounding can put the crossing slightly above the sweep line, but the
        // sweep never goes back up.
        point.y = point.y.max(self.line.current_y);
        self.queue.push(Event::intersection(point, left, right))
    }

    fn run(&mut self, sink: &mut impl Sink) -> Result<(), Error> {
        while let Some(ev) = self.queue.pop() {
            if ev.point.y != self.line.current_y {
                self.line.flush_stopped(sink)?;
                self.line.walk(self.line.current_y, self.rule, sink)?;
                self.line.current_y = ev.point.y;
            }

            match ev.kind {
                EventKind::Start => {
                    let e = ev.e1;
                    self.line.insert(e);
                    let stop = Event::stop(self.line.edge(e).bottom_point(), e);
                    self.queue.push(stop)?;

                    if let Some(prev) = self.line.prev(e) {
                        self.insert_if_intersect(prev, e)?;
                    }
                    if let Some(next) = self.line.next(e) {
                        self.insert_if_intersect(e, next)?;
                    }
                    self.line.adopt_stopped(e);
                }
                EventKind::Stop => {
                    let e = ev.e1;
                    let (prev, next) = (self.line.prev(e), self.line.next(e));
                    self.line.stop(e)?;
                    if let (Some(prev), Some(next)) = (prev, next) {
                        self.insert_if_intersect(prev, next)?;
                    }
                }
                EventKind::Intersection => {
                    let (left, right) = (ev.e1, ev.e2);
                    if self.line.next(left) != Some(right) {
                        log::trace!("skipping stale intersection of {left:?} and {right:?}");
                        continue;
                    }
                    self.line.swap(left, right);
                    if let Some(prev) = self.line.prev(right) {
                        self.insert_if_intersect(prev, right)?;
                    }
                    if let Some(next) = self.line.next(left) {
                        self.insert_if_intersect(left, next)?;
                    }
                }
            }
            self.line.check_invariants();
        }
        self.line.flush_stopped(sink)
    }
}

fn sweep<'a>(
    edges: impl IntoIterator<Item = (&'a Edge, usize)>,
    count: usize,
    rule: Rule,
    budget: &Budget,
    sink: &mut impl Sink,
) -> Result<(), Error> {
    Sweep::new(edges, count, rule, budget)?.run(sink)
}

/// Tessellates a polygon into non-overlapping trapezoids covering the points
/// that are inside it according to `fill_rule`.
///
/// The trapezoids are appended to `traps`. If this fails, `traps` is left
/// with a prefix of the output.
pub fn tessellate_polygon(
    traps: &mut Traps,
    polygon: &Polygon,
    fill_rule: FillRule,
) -> Result<(), Error> {
    log::debug!(
        "tessellating {} edges with {fill_rule:?}",
        polygon.num_edges()
    );
    if polygon.is_empty() {
        return Ok(());
    }

    let before = traps.len();
    sweep(
        polygon.edges().iter().map(|e| (e, 0)),
        polygon.num_edges(),
        fill_rule.into(),
        polygon.budget(),
        traps,
    )?;
    log::debug!("produced {} trapezoids", traps.len() - before);
    Ok(())
}

/// Rewrites a polygon so that its edges don't cross and its filled region
/// (under the non-zero rule) is what it was under `fill_rule`.
///
/// On failure, the polygon is left unchanged.
pub fn polygon_reduce(polygon: &mut Polygon, fill_rule: FillRule) -> Result<(), Error> {
    log::debug!("reducing {} edges with {fill_rule:?}", polygon.num_edges());
    if polygon.is_empty() {
        return Ok(());
    }

    let mut out = Polygon::with_budget(polygon.budget().clone());
    out.set_limits(polygon.limits());
    sweep(
        polygon.edges().iter().map(|e| (e, 0)),
        polygon.num_edges(),
        fill_rule.into(),
        polygon.budget(),
        &mut out,
    )?;
    log::debug!("reduced to {} edges", out.num_edges());
    *polygon = out;
    Ok(())
}

/// Replaces `a` by the intersection of the regions filled by `a` (under
/// `winding_a`) and `b` (under `winding_b`).
///
/// The result is a reduced polygon, filled under the non-zero rule.
pub fn polygon_intersect(
    a: &mut Polygon,
    winding_a: FillRule,
    b: &Polygon,
    winding_b: FillRule,
) -> Result<(), Error> {
    log::debug!(
        "intersecting {} edges ({winding_a:?}) with {} edges ({winding_b:?})",
        a.num_edges(),
        b.num_edges()
    );
    let overlap = match (a.extents(), b.extents()) {
        (Some(ea), Some(eb)) => ea.intersect(&eb).is_some(),
        _ => false,
    };
    if !overlap {
        a.clear();
        return Ok(());
    }

    if winding_a != FillRule::NonZero {
        polygon_reduce(a, winding_a)?;
    }
    let b = if winding_b != FillRule::NonZero {
        let mut reduced = b.clone();
        polygon_reduce(&mut reduced, winding_b)?;
        Cow::Owned(reduced)
    } else {
        Cow::Borrowed(b)
    };

    let mut out = Polygon::with_budget(a.budget().clone());
    out.set_limits(a.limits());
    let edges = a
        .edges()
        .iter()
        .map(|e| (e, 0))
        .chain(b.edges().iter().map(|e| (e, 1)));
    sweep(
        edges,
        a.num_edges() + b.num_edges(),
        Rule::Both,
        a.budget(),
        &mut out,
    )?;
    log::debug!("intersection has {} edges", out.num_edges());
    *a = out;
    Ok(())
}
