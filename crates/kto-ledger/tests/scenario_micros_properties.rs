//! Property tests for fixed-point arithmetic.

use kto_ledger::Micros;
use proptest::prelude::*;

/// Values whose pairwise products stay well inside i64 after scaling.
fn moderate() -> impl Strategy<Value = Micros> {
    (-1_000_000_000_000i64..1_000_000_000_000i64).prop_map(Micros::new)
}

proptest! {
    #[test]
    fn display_then_parse_round_trips(raw in any::<i64>()) {
        let m = Micros::new(raw);
        let back: Micros = m.to_string().parse().unwrap();
        prop_assert_eq!(back, m);
    }

    #[test]
    fn json_round_trips(raw in any::<i64>()) {
        let m = Micros::new(raw);
        let json = serde_json::to_string(&m).unwrap();
        let back: Micros = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, m);
    }

    #[test]
    fn unit_is_multiplicative_identity(raw in any::<i64>()) {
        let m = Micros::new(raw);
        prop_assert_eq!(m * Micros::UNIT, m);
        prop_assert_eq!(Micros::UNIT * m, m);
    }

    #[test]
    fn mul_commutes(a in moderate(), b in moderate()) {
        prop_assert_eq!(a.checked_mul(b), b.checked_mul(a));
    }

    #[test]
    fn integer_mul_associates(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000, c in -1_000i64..1_000) {
        let (a, b, c) = (Micros::from_units(a), Micros::from_units(b), Micros::from_units(c));
        prop_assert_eq!((a * b) * c, a * (b * c));
    }

    #[test]
    fn split_frac_recombines(raw in any::<i64>()) {
        let (int, frac) = Micros::new(raw).split_frac();
        prop_assert_eq!(int as i128 * 1_000_000 + frac as i128, raw as i128);
        prop_assert!(frac.abs() < 1_000_000);
    }
}
