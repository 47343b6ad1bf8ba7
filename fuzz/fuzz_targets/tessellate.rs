#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use polysweep::{arbitrary::polygon, sweep::tessellate_polygon, FillRule, Traps};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(poly) = polygon(&mut u) else {
        return;
    };

    for fill_rule in [FillRule::EvenOdd, FillRule::NonZero] {
        let mut traps = Traps::new();
        tessellate_polygon(&mut traps, &poly, fill_rule).unwrap();
        for t in &traps {
            assert!(t.top < t.bottom, "{t:?}");
            assert!(t.left.p1.y < t.left.p2.y, "{t:?}");
            assert!(t.right.p1.y < t.right.p2.y, "{t:?}");
        }
    }
});
