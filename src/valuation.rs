//! Portfolio-level unrealized and realized P&L, split by fee bucket.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::FeeSchedule;
use crate::types::{ClosedTradeRecord, MarketBucket, OpenLot, Universe};
use crate::utils::known;

/// Latest known price per ticker.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    prices: HashMap<String, f64>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// First market (in key order) that lists a ticker supplies its price.
    /// The screening data writes `0` for a price it could not fetch, so
    /// non-positive prices are skipped and such lots value at their average.
    pub fn from_universe(universe: &Universe) -> Self {
        let mut book = Self::new();
        for r in universe.values().flatten() {
            if let Some(p) = known(r.price).filter(|p| *p > 0.0) {
                book.prices.entry(r.ticker.to_uppercase()).or_insert(p);
            }
        }
        book
    }

    pub fn insert(&mut self, ticker: &str, price: f64) {
        self.prices.insert(ticker.to_uppercase(), price);
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.prices.get(&ticker.to_uppercase()).copied()
    }

    /// Latest price, or the lot's own average when none is known.
    pub fn price_for(&self, lot: &OpenLot) -> f64 {
        self.get(&lot.ticker).unwrap_or(lot.avg_price)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketSummary {
    pub positions: usize,
    pub evaluation: f64,
    pub cost: f64,
    pub unrealized: f64,
    pub unrealized_rate: f64,
    pub realized: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub domestic: BucketSummary,
    pub foreign: BucketSummary,
}

impl PortfolioSummary {
    pub fn bucket(&self, b: MarketBucket) -> &BucketSummary {
        match b {
            MarketBucket::Domestic => &self.domestic,
            MarketBucket::Foreign => &self.foreign,
        }
    }

    fn bucket_mut(&mut self, b: MarketBucket) -> &mut BucketSummary {
        match b {
            MarketBucket::Domestic => &mut self.domestic,
            MarketBucket::Foreign => &mut self.foreign,
        }
    }
}

/// One valued holding, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub ticker: String,
    pub market: MarketBucket,
    pub quantity: f64,
    pub avg_price: f64,
    pub current_price: f64,
    pub evaluation: f64,
    pub unrealized: f64,
    pub unrealized_rate: f64,
}

fn pct(pnl: f64, cost: f64) -> f64 {
    if cost == 0.0 {
        0.0
    } else {
        pnl / cost * 100.0
    }
}

pub fn holding_rows(lots: &[OpenLot], prices: &PriceBook, fees: &FeeSchedule) -> Vec<HoldingRow> {
    lots.iter()
        .map(|lot| {
            let current_price = prices.price_for(lot);
            let evaluation = lot.quantity * current_price;
            let unrealized = evaluation - lot.cost();
            HoldingRow {
                ticker: lot.ticker.clone(),
                market: fees.bucket(&lot.ticker),
                quantity: lot.quantity,
                avg_price: lot.avg_price,
                current_price,
                evaluation,
                unrealized,
                unrealized_rate: pct(unrealized, lot.cost()),
            }
        })
        .collect()
}

pub fn summarize(
    lots: &[OpenLot],
    history: &[ClosedTradeRecord],
    prices: &PriceBook,
    fees: &FeeSchedule,
) -> PortfolioSummary {
    let mut out = PortfolioSummary::default();
    for lot in lots {
        let b = out.bucket_mut(fees.bucket(&lot.ticker));
        b.positions += 1;
        b.evaluation += lot.quantity * prices.price_for(lot);
        b.cost += lot.cost();
    }
    for rec in history {
        out.bucket_mut(rec.market).realized += rec.profit;
    }
    for b in [&mut out.domestic, &mut out.foreign] {
        b.unrealized = b.evaluation - b.cost;
        b.unrealized_rate = pct(b.unrealized, b.cost);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SecurityRecord;

    fn lot(t: &str, q: f64, avg: f64) -> OpenLot {
        let d = "2024-01-02".parse().unwrap();
        OpenLot {
            ticker: t.into(),
            quantity: q,
            avg_price: avg,
            date: d,
            opened_on: d,
            notes: vec![],
        }
    }

    #[test]
    fn splits_buckets_and_falls_back_to_avg_price() {
        let mut prices = PriceBook::new();
        prices.insert("AAPL", 120.0);
        let lots = [lot("AAPL", 10.0, 100.0), lot("005930.KS", 2.0, 70_000.0), lot("ZZZ", 5.0, 8.0)];
        let s = summarize(&lots, &[], &prices, &FeeSchedule::default());

        assert_eq!(s.foreign.positions, 2);
        assert_eq!(s.foreign.evaluation, 1200.0 + 40.0);
        assert_eq!(s.foreign.cost, 1000.0 + 40.0);
        assert_eq!(s.foreign.unrealized, 200.0);
        assert!((s.foreign.unrealized_rate - 200.0 / 1040.0 * 100.0).abs() < 1e-9);

        assert_eq!(s.domestic.evaluation, 140_000.0);
        assert_eq!(s.domestic.unrealized, 0.0);
    }

    #[test]
    fn zero_cost_gives_zero_rate() {
        let s = summarize(&[lot("FREE", 3.0, 0.0)], &[], &PriceBook::new(), &FeeSchedule::default());
        assert_eq!(s.foreign.unrealized_rate, 0.0);
        assert_eq!(s.bucket(MarketBucket::Domestic), &BucketSummary::default());
    }

    #[test]
    fn price_book_prefers_first_market() {
        let mut u = Universe::new();
        u.insert("NASDAQ".into(), vec![SecurityRecord { price: Some(10.0), ..SecurityRecord::new("X", "x") }]);
        u.insert("SP500".into(), vec![SecurityRecord { price: Some(11.0), ..SecurityRecord::new("X", "x") }]);
        assert_eq!(PriceBook::from_universe(&u).get("x"), Some(10.0));
    }

    #[test]
    fn zero_price_falls_back_to_average() {
        let mut u = Universe::new();
        u.insert("KOSPI".into(), vec![SecurityRecord { price: Some(0.0), ..SecurityRecord::new("000660.KS", "SK hynix") }]);
        u.insert("NASDAQ".into(), vec![SecurityRecord { price: Some(0.0), ..SecurityRecord::new("000660.KS", "SK hynix") }]);
        let book = PriceBook::from_universe(&u);
        assert_eq!(book.get("000660.KS"), None);
        let rows = holding_rows(&[lot("000660.KS", 3.0, 150_000.0)], &book, &FeeSchedule::default());
        assert_eq!(rows[0].current_price, 150_000.0);
        assert_eq!(rows[0].unrealized, 0.0);
    }

    #[test]
    fn holding_rows_value_each_lot() {
        let mut prices = PriceBook::new();
        prices.insert("MSFT", 450.0);
        let rows = holding_rows(&[lot("MSFT", 2.0, 400.0)], &prices, &FeeSchedule::default());
        assert_eq!(rows[0].evaluation, 900.0);
        assert_eq!(rows[0].unrealized, 100.0);
        assert!((rows[0].unrealized_rate - 12.5).abs() < 1e-9);
    }
}
