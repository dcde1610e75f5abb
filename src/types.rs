//! Core domain types: screened securities, open lots and closed-trade history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Market id -> records in the order the upstream pipeline produced them.
pub type Universe = BTreeMap<String, Vec<SecurityRecord>>;

/// One screened security as delivered by the external metrics pipeline.
///
/// Every numeric metric is optional: `None` means "no data", which is not the
/// same thing as a measured zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityRecord {
    pub ticker: String,
    pub name: String,
    pub industry: String,
    pub price: Option<f64>,
    pub ath: Option<f64>,
    pub lowest_after_ath: Option<f64>,
    pub correction_ratio: Option<f64>,
    pub price_to_ath: Option<f64>,
    pub days_since_ath: Option<u32>,
    /// Lower percentile of today's MA spread within the past year (0..=100).
    /// The pipeline writes `-1` when it could not compute one.
    pub ma_spread_percentile: Option<f64>,
    pub ma20_spread: Option<f64>,
    pub ma50_spread: Option<f64>,
    pub ma20_50_spread: Option<f64>,
    pub eps_q0: Option<f64>,
    pub eps_q1: Option<f64>,
    pub eps_q2: Option<f64>,
    pub eps_q3: Option<f64>,
    pub per: Option<f64>,
    pub roe: Option<f64>,
}

impl SecurityRecord {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Percentile with the `-1` sentinel (and NaN) mapped to `None`.
    pub fn spread_percentile(&self) -> Option<f64> {
        self.ma_spread_percentile.filter(|v| *v >= 0.0)
    }

    pub fn eps_quarters(&self) -> [Option<f64>; 4] {
        [self.eps_q0, self.eps_q1, self.eps_q2, self.eps_q3]
    }
}

/// Fee bucket of a ticker, derived from its exchange suffix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MarketBucket {
    Domestic,
    Foreign,
}

/// Annotation attached to a buy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuyNote {
    pub date: NaiveDate,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
}

/// Currently held position in one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenLot {
    pub ticker: String,
    pub quantity: f64,
    pub avg_price: f64,
    /// Date of the most recent buy.
    pub date: NaiveDate,
    /// Date of the buy that opened this holding.
    pub opened_on: NaiveDate,
    #[serde(default)]
    pub notes: Vec<BuyNote>,
}

impl OpenLot {
    pub fn cost(&self) -> f64 {
        self.quantity * self.avg_price
    }
}

/// One settled sell, kept as an annotation on the aggregated record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellNote {
    pub date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    /// Buy-side average of the lot at the time of the sell.
    pub buy_price: f64,
    pub profit: f64,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
}

/// Aggregated realized result of every sell of one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedTradeRecord {
    pub id: String,
    pub ticker: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub quantity: f64,
    pub avg_buy_price: f64,
    pub avg_sell_price: f64,
    pub profit: f64,
    pub profit_rate: f64,
    pub market: MarketBucket,
    #[serde(default)]
    pub notes: Vec<SellNote>,
}

/// A single sell, as recovered from a record's annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct SellEvent<'a> {
    pub ticker: &'a str,
    pub date: NaiveDate,
    pub quantity: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub profit: f64,
    pub rationale: &'a str,
}

impl ClosedTradeRecord {
    /// Per-sell view of this record, in the order the sells were settled.
    pub fn events(&self) -> impl Iterator<Item = SellEvent<'_>> {
        self.notes.iter().map(move |n| SellEvent {
            ticker: &self.ticker,
            date: n.date,
            quantity: n.quantity,
            buy_price: n.buy_price,
            sell_price: n.price,
            profit: n.profit,
            rationale: &n.rationale,
        })
    }
}
