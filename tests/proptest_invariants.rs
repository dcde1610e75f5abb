//! Property-based tests for the sort engine and ledger arithmetic.

use chrono::NaiveDate;
use proptest::prelude::*;
use screener_ledger::config::FeeSchedule;
use screener_ledger::sort::{sort_records, SortField, SortOrder, SortState};
use screener_ledger::state::{Annotation, LedgerState};
use screener_ledger::SecurityRecord;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

/// Per values with plenty of ties and gaps.
fn record_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (0i32..5).prop_map(|v| Some(f64::from(v)))]
}

fn records(pers: Vec<Option<f64>>) -> Vec<SecurityRecord> {
    pers.into_iter()
        .enumerate()
        .map(|(i, per)| SecurityRecord {
            per,
            ..SecurityRecord::new(format!("T{i}"), format!("n{}", i % 3))
        })
        .collect()
}

fn field_strategy() -> impl Strategy<Value = SortField> {
    prop::sample::select(SortField::ALL.to_vec())
}

fn qty_strategy() -> impl Strategy<Value = f64> {
    (1u32..=1_000).prop_map(f64::from)
}

fn price_strategy() -> impl Strategy<Value = f64> {
    (1u32..=100_000).prop_map(|c| f64::from(c) / 100.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // ========================================================================
    // SORT ENGINE
    // ========================================================================

    /// Three clicks on a column come back to the base sequence.
    #[test]
    fn sort_cycle_is_identity(pers in prop::collection::vec(record_strategy(), 0..30), field in field_strategy()) {
        let base = records(pers);
        let mut state = SortState::default();
        for _ in 0..3 {
            state = state.toggle(field);
        }
        prop_assert_eq!(state.apply(&base), base);
    }

    /// Equal keys keep their input order.
    #[test]
    fn sort_is_stable(pers in prop::collection::vec(record_strategy(), 0..30), desc in any::<bool>()) {
        let base = records(pers);
        let order = if desc { SortOrder::Descending } else { SortOrder::Ascending };
        let sorted = sort_records(&base, SortField::Per, order);
        let index = |t: &str| base.iter().position(|r| r.ticker == t).unwrap();
        for w in sorted.windows(2) {
            if w[0].per == w[1].per {
                prop_assert!(index(&w[0].ticker) < index(&w[1].ticker));
            }
        }
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    /// Buy order does not change the resulting lot.
    #[test]
    fn buy_averaging_commutes(q1 in qty_strategy(), p1 in price_strategy(), q2 in qty_strategy(), p2 in price_strategy()) {
        let mut a = LedgerState::default();
        a.apply_buy("AAPL", day(), q1, p1, Annotation::default());
        let la = a.apply_buy("AAPL", day(), q2, p2, Annotation::default()).clone();

        let mut b = LedgerState::default();
        b.apply_buy("AAPL", day(), q2, p2, Annotation::default());
        let lb = b.apply_buy("AAPL", day(), q1, p1, Annotation::default()).clone();

        prop_assert_eq!(la.quantity, lb.quantity);
        prop_assert!((la.avg_price - lb.avg_price).abs() < 1e-9 * la.avg_price.max(1.0));
    }

    /// Splitting one sell into many gives the same aggregate, and the lot
    /// never goes negative.
    #[test]
    fn sell_split_invariance(
        held in 2u32..200,
        splits in prop::collection::vec(1u32..50, 1..6),
        buy_price in price_strategy(),
        sell_price in price_strategy(),
    ) {
        let fees = FeeSchedule::default();
        let total: u32 = splits.iter().sum::<u32>().min(held);

        let mut whole = LedgerState::default();
        whole.apply_buy("MSFT", day(), f64::from(held), buy_price, Annotation::default());
        let one = whole
            .apply_sell("MSFT", day(), f64::from(total), sell_price, Annotation::default(), &fees)
            .unwrap()
            .clone();

        let mut parts = LedgerState::default();
        parts.apply_buy("MSFT", day(), f64::from(held), buy_price, Annotation::default());
        let mut left = total;
        for s in &splits {
            let q = (*s).min(left);
            if q == 0 {
                break;
            }
            parts
                .apply_sell("MSFT", day(), f64::from(q), sell_price, Annotation::default(), &fees)
                .unwrap();
            left -= q;
            prop_assert!(parts.position_qty("MSFT") >= 0.0);
        }
        let many = parts.record("MSFT").unwrap();

        let tol = 1e-6 * one.profit.abs().max(1.0);
        prop_assert_eq!(many.quantity, one.quantity);
        prop_assert!((many.profit - one.profit).abs() < tol);
        prop_assert!((many.profit_rate - one.profit_rate).abs() < 1e-6 * one.profit_rate.abs().max(1.0));
        prop_assert_eq!(parts.position_qty("MSFT"), whole.position_qty("MSFT"));
        prop_assert_eq!(parts.position("MSFT").is_none(), total == held);
    }
}
