//! The sweep line: the edges crossing the current `y`, sorted by `x`.

use std::cmp::Ordering;

use crate::{
    geom::{Edge, Fixed},
    pool::{Budget, TryVec},
    Error, FillRule,
};

use super::{
    compare::{edges_collinear, edges_compare_x_for_y, slope_compare},
    EdgeId, EdgeVec,
};

/// The last collinearity test an edge took part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collinear {
    Unknown,
    Collinear(EdgeId),
    NotCollinear(EdgeId),
}

/// A trapezoid whose bottom isn't known yet, hanging off its left edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deferred {
    pub right: Option<EdgeId>,
    pub top: Fixed,
}

#[derive(Clone, Debug)]
pub struct SweepEdge {
    pub edge: Edge,
    /// Which input this edge came from (`0` unless we're intersecting).
    pub owner: usize,
    pub prev: Option<EdgeId>,
    pub next: Option<EdgeId>,
    pub deferred: Deferred,
    collinear: Collinear,
}

impl SweepEdge {
    pub fn new(edge: Edge, owner: usize) -> Self {
        debug_assert!(owner < 2);
        SweepEdge {
            edge,
            owner,
            prev: None,
            next: None,
            deferred: Deferred {
                right: None,
                top: edge.top,
            },
            collinear: Collinear::Unknown,
        }
    }
}

/// Decides which winding numbers count as "inside".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Inside if the winding number of the first input, masked, is non-zero.
    Single { mask: i32 },
    /// Inside if both inputs have non-zero winding numbers.
    Both,
}

impl Rule {
    pub fn inside(self, winding: [i32; 2]) -> bool {
        match self {
            Rule::Single { mask } => winding[0] & mask != 0,
            Rule::Both => winding[0] != 0 && winding[1] != 0,
        }
    }
}

impl From<FillRule> for Rule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => Rule::Single { mask: !0 },
            FillRule::EvenOdd => Rule::Single { mask: 1 },
        }
    }
}

/// Receives the output of a sweep, one horizontal band at a time.
pub trait Sink {
    /// Called when the region between `left` and `right` has been inside
    /// from `top` to `bottom`.
    fn add_band(&mut self, top: Fixed, bottom: Fixed, left: &Edge, right: &Edge)
        -> Result<(), Error>;
}

#[derive(Debug)]
pub struct SweepLine {
    pub edges: EdgeVec<SweepEdge>,
    pub current_y: Fixed,
    head: Option<EdgeId>,
    /// Where the last insertion happened. New edges tend to be inserted
    /// close to each other, so we start searching here.
    cursor: Option<EdgeId>,
    /// Edges that stopped at `current_y` with an open trapezoid. They hang
    /// around until the sweep moves on, in case an edge starting at the same
    /// point wants to pick up the trapezoid.
    stopped: TryVec<EdgeId>,
}

impl SweepLine {
    pub fn new(edges: EdgeVec<SweepEdge>, budget: Budget) -> Self {
        SweepLine {
            edges,
            current_y: Fixed::MIN,
            head: None,
            cursor: None,
            stopped: TryVec::new(budget),
        }
    }

    pub fn next(&self, e: EdgeId) -> Option<EdgeId> {
        self.edges[e].next
    }

    pub fn prev(&self, e: EdgeId) -> Option<EdgeId> {
        self.edges[e].prev
    }

    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e].edge
    }

    /// Iterates over the active edges, left to right.
    pub fn iter(&self) -> impl Iterator<Item = EdgeId> + '_ {
        std::iter::successors(self.head, |e| self.next(*e))
    }

    /// The sweep-line order: by `x` at the current `y`, then by slope, then
    /// longest first.
    fn compare(&self, a: EdgeId, b: EdgeId) -> Ordering {
        let (ea, eb) = (self.edge(a), self.edge(b));
        edges_compare_x_for_y(ea, eb, self.current_y)
            .then_with(|| slope_compare(ea, eb))
            .then_with(|| eb.bottom.cmp(&ea.bottom))
            .then_with(|| a.cmp(&b))
    }

    pub fn insert(&mut self, e: EdgeId) {
        let Some(mut pos) = self.cursor.or(self.head) else {
            self.edges[e].prev = None;
            self.edges[e].next = None;
            self.head = Some(e);
            self.cursor = Some(e);
            return;
        };

        let (prev, next) = if self.compare(e, pos) == Ordering::Less {
            while let Some(p) = self.prev(pos) {
                if self.compare(e, p) != Ordering::Less {
                    break;
                }
                pos = p;
            }
            (self.prev(pos), Some(pos))
        } else {
            while let Some(n) = self.next(pos) {
                if self.compare(e, n) != Ordering::Greater {
                    break;
                }
                pos = n;
            }
            (Some(pos), self.next(pos))
        };

        self.edges[e].prev = prev;
        self.edges[e].next = next;
        match prev {
            Some(p) => self.edges[p].next = Some(e),
            None => self.head = Some(e),
        }
        if let Some(n) = next {
            self.edges[n].prev = Some(e);
        }
        self.cursor = Some(e);
    }

    pub fn remove(&mut self, e: EdgeId) {
        let (prev, next) = (self.prev(e), self.next(e));
        match prev {
            Some(p) => self.edges[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.edges[n].prev = prev;
        }
        if self.cursor == Some(e) {
            self.cursor = prev.or(next);
        }
        self.edges[e].prev = None;
        self.edges[e].next = None;
    }

    /// Swaps two adjacent edges; `left` must be immediately before `right`.
    pub fn swap(&mut self, left: EdgeId, right: EdgeId) {
        debug_assert_eq!(self.next(left), Some(right));
        let prev = self.prev(left);
        let next = self.next(right);
        match prev {
            Some(p) => self.edges[p].next = Some(right),
            None => self.head = Some(right),
        }
        if let Some(n) = next {
            self.edges[n].prev = Some(left);
        }
        self.edges[right].prev = prev;
        self.edges[right].next = Some(left);
        self.edges[left].prev = Some(right);
        self.edges[left].next = next;
    }

    /// Are two edges collinear? The answer is cached on `a`.
    pub fn collinear(&mut self, a: EdgeId, b: EdgeId) -> bool {
        match self.edges[a].collinear {
            Collinear::Collinear(c) if c == b => return true,
            Collinear::NotCollinear(c) if c == b => return false,
            _ => {}
        }
        let ret = edges_collinear(self.edge(a), self.edge(b));
        self.edges[a].collinear = if ret {
            Collinear::Collinear(b)
        } else {
            Collinear::NotCollinear(b)
        };
        ret
    }

    /// Takes an edge off the sweep line. If it has an open trapezoid, the
    /// edge is kept aside until the sweep leaves the current `y`.
    pub fn stop(&mut self, e: EdgeId) -> Result<(), Error> {
        self.remove(e);
        if self.edges[e].deferred.right.is_some() {
            self.stopped.try_push(e)?;
        }
        Ok(())
    }

    /// If a stopped edge lies on the same line as `e` (which just started),
    /// `e` takes over its open trapezoid.
    pub fn adopt_stopped(&mut self, e: EdgeId) {
        for i in 0..self.stopped.len() {
            let s = self.stopped[i];
            if self.edge(e).top <= self.edge(s).bottom && self.collinear(e, s) {
                log::trace!("{e:?} continues the trapezoid of {s:?}");
                self.edges[e].deferred = self.edges[s].deferred;
                self.edges[s].deferred.right = None;
                self.stopped.swap_remove(i);
                return;
            }
        }
    }

    /// Closes the open trapezoids of all the stopped edges.
    pub fn flush_stopped(&mut self, sink: &mut impl Sink) -> Result<(), Error> {
        while let Some(s) = self.stopped.pop() {
            let bottom = self.edge(s).bottom;
            self.end_deferred(s, bottom, sink)?;
        }
        Ok(())
    }

    /// Closes the open trapezoid on `e` (if there is one) at `bottom`.
    pub fn end_deferred(
        &mut self,
        e: EdgeId,
        bottom: Fixed,
        sink: &mut impl Sink,
    ) -> Result<(), Error> {
        let deferred = self.edges[e].deferred;
        if let Some(right) = deferred.right {
            self.edges[e].deferred.right = None;
            if deferred.top < bottom {
                sink.add_band(deferred.top, bottom, self.edge(e), self.edge(right))?;
            }
        }
        Ok(())
    }

    /// Makes sure that there's an open trapezoid between `left` and `right`,
    /// starting no later than `top`.
    ///
    /// If `left` already has a trapezoid with a right side on the same line as
    /// `right`, that trapezoid just carries on.
    fn start_or_continue(
        &mut self,
        left: EdgeId,
        top: Fixed,
        right: EdgeId,
        sink: &mut impl Sink,
    ) -> Result<(), Error> {
        let deferred = self.edges[left].deferred;
        if deferred.right == Some(right) {
            return Ok(());
        }
        if let Some(old_right) = deferred.right {
            if self.collinear(old_right, right) {
                self.edges[left].deferred.right = Some(right);
                return Ok(());
            }
            self.end_deferred(left, top, sink)?;
        }
        if !self.collinear(left, right) {
            self.edges[left].deferred = Deferred {
                right: Some(right),
                top,
            };
        }
        Ok(())
    }

    /// Walks the sweep line from left to right, opening, continuing and
    /// closing trapezoids for the band starting at `top`.
    pub fn walk(&mut self, top: Fixed, rule: Rule, sink: &mut impl Sink) -> Result<(), Error> {
        let mut winding = [0i32; 2];
        let mut left: Option<EdgeId> = None;
        let mut pos = self.head;

        while let Some(e) = pos {
            let next = self.next(e);
            let owner = self.edges[e].owner;
            winding[owner] += self.edge(e).dir;
            let inside = rule.inside(winding);

            match left {
                None if inside => left = Some(e),
                Some(l) if !inside => {
                    self.end_deferred(e, top, sink)?;
                    // Skip over collinear edges: if the region starts again on
                    // the same line, it doesn't really end here.
                    let skip = match next {
                        Some(n) => self.collinear(e, n),
                        None => false,
                    };
                    if !skip {
                        self.start_or_continue(l, top, e, sink)?;
                        left = None;
                    }
                }
                _ => self.end_deferred(e, top, sink)?,
            }
            pos = next;
        }

        if let Some(l) = left {
            self.end_deferred(l, top, sink)?;
        }
        Ok(())
    }

    #[cfg(feature = "slow-asserts")]
    pub fn check_invariants(&self) {
        let mut prev = None;
        for e in self.iter() {
            assert_eq!(self.prev(e), prev, "broken link at {e:?}");
            let edge = self.edge(e);
            assert!(
                edge.top <= self.current_y && self.current_y <= edge.bottom,
                "{e:?} ({edge:?}) is not active at y={}",
                self.current_y
            );
            prev = Some(e);
        }
        for &s in &self.stopped {
            assert!(self.edges[s].deferred.right.is_some());
            assert_eq!(self.edge(s).bottom, self.current_y);
        }
    }

    #[cfg(not(feature = "slow-asserts"))]
    pub fn check_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{fixed_from_int, Line, Point};

    fn sweep_line(edges: &[(i32, i32, i32, i32)]) -> SweepLine {
        let mut vec = EdgeVec::default();
        for &(x0, y0, x1, y1) in edges {
            let line = Line::new(
                Point::new(fixed_from_int(x0), fixed_from_int(y0)),
                Point::new(fixed_from_int(x1), fixed_from_int(y1)),
            );
            let edge = Edge {
                line,
                top: line.p1.y,
                bottom: line.p2.y,
                dir: 1,
            };
            vec.try_push(SweepEdge::new(edge, 0)).unwrap();
        }
        SweepLine::new(vec, Budget::unlimited())
    }

    #[test]
    fn insertion_order() {
        let mut line = sweep_line(&[
            (5, 0, 5, 10),
            (0, 0, 0, 10),
            (0, 0, 10, 10),
            (0, 0, 0, 5),
            (9, 0, 0, 10),
        ]);
        line.current_y = 0;
        for e in line.edges.indices().collect::<Vec<_>>() {
            line.insert(e);
        }
        let order: Vec<_> = line.iter().map(|e| e.0).collect();
        // At x = 0, the vertical edges come before the one leaning right, and
        // the longer vertical one comes first.
        assert_eq!(order, vec![1, 3, 2, 0, 4]);

        line.swap(EdgeId(3), EdgeId(2));
        line.remove(EdgeId(1));
        let order: Vec<_> = line.iter().map(|e| e.0).collect();
        assert_eq!(order, vec![2, 3, 0, 4]);
        assert_eq!(line.prev(EdgeId(2)), None);
        assert_eq!(line.prev(EdgeId(4)), Some(EdgeId(0)));
    }

    #[test]
    fn collinear_cache() {
        let mut line = sweep_line(&[(0, 0, 2, 2), (3, 3, 4, 4), (0, 1, 1, 2)]);
        assert!(line.collinear(EdgeId(0), EdgeId(1)));
        assert_eq!(line.edges[EdgeId(0)].collinear, Collinear::Collinear(EdgeId(1)));
        assert!(!line.collinear(EdgeId(0), EdgeId(2)));
        assert_eq!(
            line.edges[EdgeId(0)].collinear,
            Collinear::NotCollinear(EdgeId(2))
        );
    }

    #[test]
    fn rules() {
        let nonzero = Rule::from(FillRule::NonZero);
        let evenodd = Rule::from(FillRule::EvenOdd);
        assert!(nonzero.inside([2, 0]));
        assert!(nonzero.inside([-1, 0]));
        assert!(!evenodd.inside([2, 0]));
        assert!(evenodd.inside([-3, 0]));
        assert!(!Rule::Both.inside([1, 0]));
        assert!(Rule::Both.inside([1, -2]));
    }
}
