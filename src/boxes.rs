//! Collections of axis-aligned rectangles.

use crate::{
    geom::Rect,
    pool::{Budget, Growable},
    Error,
};

const EMBEDDED_BOXES: usize = 32;

/// A list of axis-aligned rectangles.
///
/// The rectangles may overlap (unless they came out of
/// [`tessellate_boxes`](crate::sweep::tessellate_boxes)), and empty ones are
/// never stored.
#[derive(Clone, Debug)]
pub struct Boxes {
    boxes: Growable<Rect, EMBEDDED_BOXES>,
    budget: Budget,
}

impl Default for Boxes {
    fn default() -> Self {
        Self::with_budget(Budget::unlimited())
    }
}

impl Boxes {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty list whose storage is charged to `budget`.
    pub fn with_budget(budget: Budget) -> Self {
        Boxes {
            boxes: Growable::new(2),
            budget,
        }
    }

    /// Builds a list from some rectangles.
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Result<Self, Error> {
        let mut ret = Self::new();
        for r in rects {
            ret.add(r)?;
        }
        Ok(ret)
    }

    /// The budget charged for this list's storage.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Adds a rectangle, unless it is empty.
    pub fn add(&mut self, rect: Rect) -> Result<(), Error> {
        if rect.is_empty() {
            return Ok(());
        }
        self.boxes.try_push(rect, &self.budget)
    }

    /// The number of rectangles.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The rectangles, as a slice.
    pub fn as_slice(&self) -> &[Rect] {
        &self.boxes
    }

    /// Iterates over the rectangles.
    pub fn iter(&self) -> std::slice::Iter<'_, Rect> {
        self.boxes.iter()
    }

    /// Removes all the rectangles.
    pub fn clear(&mut self) {
        self.boxes.clear();
    }

    /// The smallest rectangle containing all of them.
    pub fn extents(&self) -> Option<Rect> {
        self.boxes
            .iter()
            .fold(None, |acc: Option<Rect>, b| Some(acc.map_or(*b, |acc| acc.union(b))))
    }

    /// Do all the rectangles have their sides on pixel boundaries?
    pub fn is_pixel_aligned(&self) -> bool {
        self.boxes.iter().all(Rect::is_pixel_aligned)
    }

    /// The sum of the rectangles' areas, in square pixels.
    ///
    /// This counts overlapping parts more than once.
    pub fn area(&self) -> f64 {
        self.boxes.iter().map(Rect::area).sum()
    }

    /// Does any of the rectangles contain the point `(x, y)`, in pixels?
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.boxes.iter().any(|b| b.contains(x, y))
    }
}

impl<'a> IntoIterator for &'a Boxes {
    type Item = &'a Rect;
    type IntoIter = std::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_and_area() {
        let boxes = Boxes::from_rects([
            Rect::from_pixels(0, 0, 2, 2),
            Rect::from_pixels(1, 1, 3, 4),
            Rect::from_pixels(7, 7, 7, 9),
        ])
        .unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.extents(), Some(Rect::from_pixels(0, 0, 3, 4)));
        assert_eq!(boxes.area(), 10.0);
        assert!(boxes.is_pixel_aligned());
        assert!(boxes.contains(2.5, 3.5));
        assert!(!boxes.contains(2.5, 0.5));
        assert_eq!(Boxes::new().extents(), None);
    }
}
