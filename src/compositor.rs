//! Glue between the drawing operations and the scan converters.
//!
//! These functions decide which converter to use, clip the work to the
//! pixels that can actually change, and fall back to a slower path when a
//! fast one declines with [`Error::Unsupported`]. They return
//! [`Error::NothingToDo`] when nothing inside the clip would be drawn.

use kurbo::BezPath;

use crate::{
    boxes::Boxes,
    geom::Rect,
    polygon::Polygon,
    scan::{Grid, Mono, PixelBox, RectangularConverter, ScanConverter, SpanRenderer, Tor, Tor22},
    sweep::{polygon_intersect, tessellate_boxes},
    traps::Traps,
    Error, FillRule,
};

/// How much antialiasing to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Antialias {
    /// No antialiasing: every pixel is either fully covered or not at all.
    None,
    /// Whatever the default is.
    #[default]
    Default,
    /// Grayscale antialiasing.
    Gray,
    /// Subpixel antialiasing. We don't do subpixel rendering, so this is the
    /// same as [`Antialias::Gray`].
    Subpixel,
    /// Antialiasing that favors speed over quality.
    Fast,
    /// Balanced antialiasing.
    Good,
    /// Antialiasing that favors quality over speed.
    Best,
}

/// The pixels in `clip` that something with the bounding box `bounds` can
/// touch.
fn touched_pixels(bounds: Option<Rect>, clip: PixelBox) -> Result<PixelBox, Error> {
    let bounds = bounds.ok_or(Error::NothingToDo)?;
    let touched = PixelBox::from(bounds.pixel_extents()).intersect(&clip);
    if touched.is_empty() {
        return Err(Error::NothingToDo);
    }
    Ok(touched)
}

fn convert<G: Grid>(
    polygon: &Polygon,
    fill_rule: FillRule,
    extents: PixelBox,
    renderer: &mut impl SpanRenderer,
) -> Result<(), Error> {
    let mut conv = ScanConverter::<G>::with_budget(extents, fill_rule, polygon.budget().clone())?;
    conv.add_polygon(polygon)?;
    conv.generate(renderer)
}

/// Draws the coverage of a polygon, within `clip`.
pub fn fill_polygon(
    polygon: &Polygon,
    fill_rule: FillRule,
    antialias: Antialias,
    clip: PixelBox,
    renderer: &mut impl SpanRenderer,
) -> Result<(), Error> {
    let extents = touched_pixels(polygon.extents(), clip)?;
    log::debug!(
        "filling {} edges over {extents:?} with {antialias:?}",
        polygon.num_edges()
    );
    match antialias {
        Antialias::None => convert::<Mono>(polygon, fill_rule, extents, renderer),
        Antialias::Fast => convert::<Tor22>(polygon, fill_rule, extents, renderer),
        Antialias::Default
        | Antialias::Gray
        | Antialias::Subpixel
        | Antialias::Good
        | Antialias::Best => convert::<Tor>(polygon, fill_rule, extents, renderer),
    }
}

/// Draws the coverage of a Bézier path (in pixels), within `clip`.
pub fn fill_path(
    path: &BezPath,
    tolerance: f64,
    fill_rule: FillRule,
    antialias: Antialias,
    clip: PixelBox,
    renderer: &mut impl SpanRenderer,
) -> Result<(), Error> {
    let polygon = Polygon::from_bez_path(path, tolerance)?;
    fill_polygon(&polygon, fill_rule, antialias, clip, renderer)
}

/// Draws the coverage of some boxes, within `clip`.
///
/// Boxes take a fast path that never looks at winding numbers. Unless the
/// boxes are pixel-aligned and filled with the non-zero rule, their overlaps
/// are resolved first.
pub fn fill_boxes(
    boxes: &Boxes,
    fill_rule: FillRule,
    antialias: Antialias,
    clip: PixelBox,
    renderer: &mut impl SpanRenderer,
) -> Result<(), Error> {
    let extents = touched_pixels(boxes.extents(), clip)?;
    if antialias == Antialias::None {
        let polygon = Polygon::from_boxes(boxes)?;
        return convert::<Mono>(&polygon, fill_rule, extents, renderer);
    }

    let budget = boxes.budget().clone();
    let mut conv = match RectangularConverter::with_budget(extents, fill_rule, budget.clone()) {
        Ok(mut conv) if boxes.is_pixel_aligned() => {
            conv.add_boxes(boxes)?;
            return conv.generate(renderer);
        }
        Ok(conv) => conv,
        Err(Error::Unsupported) => {
            RectangularConverter::with_budget(extents, FillRule::NonZero, budget.clone())?
        }
        Err(e) => return Err(e),
    };

    // Fractional boxes that overlap would have their coverage counted twice.
    log::debug!("resolving overlaps of {} boxes first", boxes.len());
    let mut resolved = Boxes::with_budget(budget);
    tessellate_boxes(&mut resolved, boxes, fill_rule)?;
    conv.add_boxes(&resolved)?;
    conv.generate(renderer)
}

/// Draws the coverage of some trapezoids, within `clip`.
///
/// The trapezoids are assumed not to overlap each other.
pub fn fill_traps(
    traps: &Traps,
    antialias: Antialias,
    clip: PixelBox,
    renderer: &mut impl SpanRenderer,
) -> Result<(), Error> {
    let polygon = Polygon::from_traps(traps)?;
    fill_polygon(&polygon, FillRule::NonZero, antialias, clip, renderer)
}

/// Restricts `polygon` to the inside of `clip`.
///
/// Afterwards, `polygon` has winding number one wherever both it and the
/// clip were inside (according to their fill rules), and zero elsewhere.
/// Returns [`Error::NothingToDo`] if they don't overlap at all.
pub fn clip_polygon(
    polygon: &mut Polygon,
    fill_rule: FillRule,
    clip: &Polygon,
    clip_rule: FillRule,
) -> Result<(), Error> {
    polygon_intersect(polygon, fill_rule, clip, clip_rule)?;
    if polygon.is_empty() {
        return Err(Error::NothingToDo);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{
        geom::{Point, Rect},
        scan::CoverageMask,
    };

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let mut poly = Polygon::new();
        poly.add_contour(&[
            Point::from_f64(x0, y0),
            Point::from_f64(x1, y0),
            Point::from_f64(x1, y1),
            Point::from_f64(x0, y1),
        ])
        .unwrap();
        poly
    }

    fn mask() -> CoverageMask {
        CoverageMask::new(PixelBox::new(0, 0, 10, 10)).unwrap()
    }

    #[test]
    fn every_antialias_mode_fills() {
        let poly = square(1.0, 1.0, 4.0, 3.0);
        for aa in [
            Antialias::None,
            Antialias::Default,
            Antialias::Gray,
            Antialias::Subpixel,
            Antialias::Fast,
            Antialias::Good,
            Antialias::Best,
        ] {
            let mut m = mask();
            let clip = m.extents();
            fill_polygon(&poly, FillRule::NonZero, aa, clip, &mut m).unwrap();
            assert_eq!(m.total_coverage(), 6.0, "{aa:?}");
        }
    }

    #[test]
    fn nothing_to_do() {
        let mut m = mask();
        let clip = m.extents();
        assert_matches!(
            fill_polygon(&Polygon::new(), FillRule::NonZero, Antialias::Default, clip, &mut m),
            Err(Error::NothingToDo)
        );
        let outside = square(20.0, 20.0, 30.0, 30.0);
        assert_matches!(
            fill_polygon(&outside, FillRule::NonZero, Antialias::Default, clip, &mut m),
            Err(Error::NothingToDo)
        );
        assert_matches!(
            fill_boxes(&Boxes::new(), FillRule::NonZero, Antialias::Default, clip, &mut m),
            Err(Error::NothingToDo)
        );
    }

    #[test]
    fn boxes_fall_back_for_even_odd() {
        let boxes = Boxes::from_rects([Rect::from_pixels(0, 0, 4, 4), Rect::from_pixels(2, 2, 6, 6)])
            .unwrap();
        let mut nonzero = mask();
        let clip = nonzero.extents();
        fill_boxes(&boxes, FillRule::NonZero, Antialias::Default, clip, &mut nonzero).unwrap();
        assert_eq!(nonzero.total_coverage(), 28.0);

        let mut evenodd = mask();
        fill_boxes(&boxes, FillRule::EvenOdd, Antialias::Default, clip, &mut evenodd).unwrap();
        assert_eq!(evenodd.total_coverage(), 24.0);
        assert_eq!(evenodd.get(3, 3), 0);
        assert_eq!(evenodd.get(1, 1), 255);

        let mut mono = mask();
        fill_boxes(&boxes, FillRule::EvenOdd, Antialias::None, clip, &mut mono).unwrap();
        assert_eq!(mono.data(), evenodd.data());
    }

    #[test]
    fn overlapping_fractional_boxes() {
        // Two copies of the left half of a pixel.
        let half = Rect::new(0, 0, 128, 256);
        let boxes = Boxes::from_rects([half, half]).unwrap();
        let polygon = Polygon::from_boxes(&boxes).unwrap();
        for fill_rule in [FillRule::NonZero, FillRule::EvenOdd] {
            let mut expected = mask();
            let clip = expected.extents();
            fill_polygon(&polygon, fill_rule, Antialias::Default, clip, &mut expected).unwrap();

            let mut m = mask();
            let result = fill_boxes(&boxes, fill_rule, Antialias::Default, clip, &mut m);
            if fill_rule == FillRule::EvenOdd {
                // The copies cancel out.
                assert_matches!(result, Ok(()));
                assert_eq!(m.total_coverage(), 0.0);
            } else {
                result.unwrap();
                assert_eq!(m.get(0, 0), 128);
            }
            assert_eq!(m.data(), expected.data(), "{fill_rule:?}");
        }

        // Overlapping by a quarter of a pixel, horizontally.
        let boxes = Boxes::from_rects([Rect::new(0, 0, 192, 256), Rect::new(128, 0, 448, 256)])
            .unwrap();
        let mut m = mask();
        let clip = m.extents();
        fill_boxes(&boxes, FillRule::NonZero, Antialias::Default, clip, &mut m).unwrap();
        assert_eq!(m.get(0, 0), 255);
        assert_eq!(m.get(1, 0), 191);
    }

    #[test]
    fn traps_and_paths() {
        let mut traps = Traps::new();
        traps.add_box(&Rect::from_pixels(1, 1, 3, 3)).unwrap();
        let mut m = mask();
        let clip = m.extents();
        fill_traps(&traps, Antialias::Good, clip, &mut m).unwrap();
        assert_eq!(m.total_coverage(), 4.0);

        let path = BezPath::from_svg("M2,2 L6,2 L6,4 L2,4 Z").unwrap();
        let mut m = mask();
        fill_path(&path, 0.1, FillRule::EvenOdd, Antialias::Fast, clip, &mut m).unwrap();
        assert_eq!(m.total_coverage(), 8.0);
    }

    #[test]
    fn clipping() {
        let mut poly = square(0.0, 0.0, 4.0, 4.0);
        clip_polygon(&mut poly, FillRule::NonZero, &square(2.0, 2.0, 6.0, 6.0), FillRule::NonZero)
            .unwrap();
        let mut m = mask();
        let clip = m.extents();
        fill_polygon(&poly, FillRule::NonZero, Antialias::Default, clip, &mut m).unwrap();
        assert_eq!(m.total_coverage(), 4.0);
        assert_eq!(m.get(2, 2), 255);
        assert_eq!(m.get(1, 1), 0);

        let mut poly = square(0.0, 0.0, 1.0, 1.0);
        assert_matches!(
            clip_polygon(&mut poly, FillRule::NonZero, &square(5.0, 5.0, 6.0, 6.0), FillRule::NonZero),
            Err(Error::NothingToDo)
        );
    }

    #[test]
    fn clip_limits_rows() {
        let poly = square(0.0, 0.0, 10.0, 10.0);
        let mut rows = Vec::new();
        fill_polygon(
            &poly,
            FillRule::NonZero,
            Antialias::Default,
            PixelBox::new(2, 3, 5, 6),
            &mut |y: i32, height: i32, spans: &[crate::scan::Span]| {
                rows.push((y, height, spans.len()));
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(rows, vec![(3, 3, 2)]);
    }
}
