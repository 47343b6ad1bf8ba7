//! The sweep's event queue.
//!
//! Start events are known up front, so they live in a sorted array. Stop and
//! intersection events are discovered as we go; their records are allocated
//! from a freelist and a binary min-heap orders the handles. Popping takes
//! whichever of the two heads comes first.

use crate::{
    geom::Point,
    pool::{Budget, Freelist, PoolIdx, TryVec},
    Error,
};

use super::EdgeId;

/// What happens at an event.
///
/// The order of the variants matters: at a single point, stops are processed
/// first and starts last, so that an edge that ends where another one begins
/// has already left the sweep line when its continuation is inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Stop,
    Intersection,
    Start,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Event {
    pub point: Point,
    pub kind: EventKind,
    /// The edge, or for intersections the edge that is currently on the left.
    pub e1: EdgeId,
    /// For intersections, the edge that is currently on the right.
    pub e2: EdgeId,
}

impl Event {
    pub fn start(point: Point, e: EdgeId) -> Self {
        Event {
            point,
            kind: EventKind::Start,
            e1: e,
            e2: e,
        }
    }

    pub fn stop(point: Point, e: EdgeId) -> Self {
        Event {
            point,
            kind: EventKind::Stop,
            e1: e,
            e2: e,
        }
    }

    pub fn intersection(point: Point, left: EdgeId, right: EdgeId) -> Self {
        Event {
            point,
            kind: EventKind::Intersection,
            e1: left,
            e2: right,
        }
    }
}

#[derive(Debug)]
pub struct EventQueue {
    starts: TryVec<Event>,
    next_start: usize,
    records: Freelist<Event, 32>,
    heap: TryVec<PoolIdx>,
}

impl EventQueue {
    /// Creates a queue holding the given start events, in any order.
    pub fn new(mut starts: TryVec<Event>, budget: Budget) -> Self {
        starts.sort_unstable();
        EventQueue {
            starts,
            next_start: 0,
            records: Freelist::new(budget.clone()),
            heap: TryVec::new(budget),
        }
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.records[self.heap[i]] < self.records[self.heap[j]]
    }

    fn float_up(&mut self, mut curr: usize) {
        while curr > 0 {
            let parent = (curr - 1) / 2;
            if !self.less(curr, parent) {
                break;
            }
            self.heap.swap(curr, parent);
            curr = parent;
        }
    }

    fn float_down(&mut self, mut curr: usize) {
        loop {
            let mut child = 2 * curr + 1;
            if child >= self.heap.len() {
                break;
            }
            if child + 1 < self.heap.len() && self.less(child + 1, child) {
                child += 1;
            }
            if !self.less(child, curr) {
                break;
            }
            self.heap.swap(curr, child);
            curr = child;
        }
    }

    /// Adds a stop or intersection event.
    pub fn push(&mut self, ev: Event) -> Result<(), Error> {
        debug_assert_ne!(ev.kind, EventKind::Start);
        let idx = self.records.alloc(ev)?;
        if let Err(e) = self.heap.try_push(idx) {
            self.records.free(idx);
            return Err(e);
        }
        self.float_up(self.heap.len() - 1);
        Ok(())
    }

    fn pop_heap(&mut self) -> Option<Event> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.float_down(0);
        }
        Some(self.records.free(top))
    }

    /// Removes and returns the first event.
    pub fn pop(&mut self) -> Option<Event> {
        let start = self.starts.get(self.next_start).copied();
        let heap_top = self.heap.first().map(|&idx| self.records[idx]);
        match (start, heap_top) {
            (Some(s), Some(h)) if h < s => self.pop_heap(),
            (Some(s), _) => {
                self.next_start += 1;
                Some(s)
            }
            (None, _) => self.pop_heap(),
        }
    }

    /// The number of events still waiting.
    pub fn len(&self) -> usize {
        self.starts.len() - self.next_start + self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(events: &[Event]) -> TryVec<Event> {
        let mut ret = TryVec::new(Budget::unlimited());
        ret.try_extend_from_slice(events).unwrap();
        ret
    }

    #[test]
    fn events_come_out_in_order() {
        let p = |x, y| Point::new(x, y);
        let mut q = EventQueue::new(
            starts(&[
                Event::start(p(5, 10), EdgeId(0)),
                Event::start(p(0, 0), EdgeId(1)),
                Event::start(p(5, 10), EdgeId(2)),
            ]),
            Budget::unlimited(),
        );
        q.push(Event::stop(p(5, 10), EdgeId(1))).unwrap();
        q.push(Event::intersection(p(5, 10), EdgeId(3), EdgeId(4)))
            .unwrap();
        q.push(Event::stop(p(-100, 3), EdgeId(5))).unwrap();
        q.push(Event::stop(p(100, 20), EdgeId(6))).unwrap();
        assert_eq!(q.len(), 7);

        let order: Vec<_> = std::iter::from_fn(|| q.pop())
            .map(|ev| (ev.kind, ev.e1.0))
            .collect();
        assert_eq!(
            order,
            vec![
                (EventKind::Start, 1),
                (EventKind::Stop, 5),
                (EventKind::Stop, 1),
                (EventKind::Intersection, 3),
                (EventKind::Start, 0),
                (EventKind::Start, 2),
                (EventKind::Stop, 6),
            ]
        );
    }

    #[test]
    fn heap_sorts() {
        let mut q = EventQueue::new(starts(&[]), Budget::unlimited());
        let ys = [7, 3, 9, 1, 1, 8, 2, 6, 5, 4, 0, 100, 50];
        for (i, y) in ys.iter().enumerate() {
            q.push(Event::stop(Point::new(0, *y), EdgeId(i))).unwrap();
        }
        let mut popped = Vec::new();
        while let Some(ev) = q.pop() {
            popped.push(ev.point.y);
            // Records get recycled.
            if ev.point.y == 5 && ev.e1 != EdgeId(99) {
                q.push(Event::stop(Point::new(0, 5), EdgeId(99))).unwrap();
                q.push(Event::stop(Point::new(0, 6), EdgeId(99))).unwrap();
            }
        }
        assert_eq!(popped, vec![0, 1, 1, 2, 3, 4, 5, 5, 6, 6, 7, 8, 9, 50, 100]);
    }
}
