#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use polysweep::{
    arbitrary::polygon,
    scan::{PixelBox, ScanConverter, Span, Tor},
    Error, FillRule,
};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(poly) = polygon(&mut u) else {
        return;
    };
    let Ok(even_odd) = u.arbitrary::<bool>() else {
        return;
    };
    let fill_rule = if even_odd {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    };

    // Look at the top-left corner of the polygon.
    let Some(bounds) = poly.extents() else {
        return;
    };
    let (x0, y0, _, _) = bounds.pixel_extents();
    let extents = PixelBox::new(x0 - 8, y0 - 8, x0 + 64, y0 + 64);
    let mut conv = ScanConverter::<Tor>::new(extents, fill_rule).unwrap();
    conv.add_polygon(&poly).unwrap();

    let mut next_y = extents.y0;
    conv.generate(&mut |y: i32, height: i32, spans: &[Span]| -> Result<(), Error> {
        assert_eq!(y, next_y);
        assert!(height > 0);
        next_y = y + height;
        for pair in spans.windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
        for span in spans {
            assert!(extents.x0 <= span.x && span.x <= extents.x1);
        }
        Ok(())
    })
    .unwrap();
});
