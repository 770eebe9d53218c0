//! Property tests for price formatting and synthetic data.

use proptest::prelude::*;
use sigscan_core::domain::Interval;
use sigscan_runner::report::format_price;
use sigscan_runner::{BarProvider, SyntheticProvider};

fn strip(formatted: &str) -> f64 {
    formatted
        .trim_start_matches('-')
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .unwrap()
}

proptest! {
    #[test]
    fn large_prices_round_to_cents(price in 10.0..1e9_f64) {
        let s = format_price(price);
        prop_assert!(s.starts_with('$'));
        let digits = s.split('.').next().unwrap().trim_start_matches('$');
        for group in digits.split(',').skip(1) {
            prop_assert_eq!(group.len(), 3);
        }
        prop_assert!((strip(&s) - price).abs() <= 0.005 + 1e-9);
    }

    #[test]
    fn small_prices_use_four_decimals(price in 0.0001..10.0_f64) {
        let s = format_price(price);
        prop_assert_eq!(s.split('.').nth(1).unwrap().len(), 4);
        prop_assert!((strip(&s) - price).abs() <= 0.00005 + 1e-12);
    }

    #[test]
    fn dust_prices_use_eight_decimals(price in 1e-9..0.0001_f64) {
        let s = format_price(price);
        prop_assert_eq!(s.split('.').nth(1).unwrap().len(), 8);
    }

    #[test]
    fn sign_does_not_change_digits(price in 0.00001..1e7_f64) {
        let pos = format_price(price);
        let neg = format_price(-price);
        prop_assert_eq!(format!("-{pos}"), neg);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn synthetic_series_are_sane(symbol in "[A-Z]{2,5}/USD", n in 1usize..400) {
        let result = SyntheticProvider::new().fetch(&symbol, Interval::H1, n).unwrap();
        prop_assert_eq!(result.series.len(), n);
        prop_assert!(result.series.is_ordered());
        prop_assert!(result.series.bars.iter().all(|b| b.is_sane()));
    }
}
