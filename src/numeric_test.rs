// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use proptest::prelude::*;

use super::{encode_int, format, parse};

#[test]
fn zero_is_nulla() {
    assert_eq!(format(0.0), "NULLA");
    assert_eq!(parse("NULLA"), 0.0);
}

#[test]
fn encodes_subtractive_pairs() {
    assert_eq!(encode_int(4), "IV");
    assert_eq!(encode_int(9), "IX");
    assert_eq!(encode_int(1994), "MCMXCIV");
}

#[test]
fn negative_values_carry_a_leading_sign() {
    assert_eq!(format(-4.0), "-IV");
    assert_eq!(parse("-IV"), -4.0);
}

#[test]
fn fractional_part_round_trips_for_a_simple_value() {
    let text = format(3.5);
    assert!((parse(&text) - 3.5).abs() < 1e-9);
}

#[test]
fn malformed_text_decodes_leniently_rather_than_panicking() {
    assert_eq!(parse("NOTROMAN"), 0.0);
}

proptest! {
    #[test]
    fn integer_round_trip(n in 1u32..=3999) {
        let text = format(f64::from(n));
        let back = parse(&text);
        prop_assert!((back - f64::from(n)).abs() < 1e-9);
    }
}
