#![no_main]

use libfuzzer_sys::fuzz_target;
use polysweep::wide::{floored_divrem, floored_muldivrem, round_div, Exactness, QuoRem};

fuzz_target!(|input: (i32, i32, i32)| {
    let (num, a, den) = input;
    if den == 0 {
        return;
    }
    let (num, a, den) = (num as i64, a as i64, den as i64);

    let QuoRem { quo, rem } = floored_divrem(num, den);
    assert_eq!(quo * den + rem, num);
    assert!(rem == 0 || (rem < 0) == (den < 0));
    assert!(rem.abs() < den.abs());
    assert_eq!(quo, num.div_euclid(den) - i64::from(den < 0 && num.rem_euclid(den) != 0));

    let QuoRem { quo, rem } = floored_muldivrem(num, a, den);
    assert_eq!(quo as i128 * den as i128 + rem as i128, num as i128 * a as i128);
    assert!(rem.abs() < den.abs());

    let (rounded, exactness) = round_div(num as i128, den as i128);
    let twice_err = 2 * (rounded * den as i128 - num as i128) * den.signum() as i128;
    assert!(twice_err.abs() <= den.abs() as i128);
    match exactness {
        Exactness::Exact => assert_eq!(twice_err, 0),
        Exactness::RoundedUp => assert!(twice_err > 0),
        Exactness::RoundedDown => assert!(twice_err < 0),
    }
});
