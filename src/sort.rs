//! Column ordering for the screening table.
//!
//! Sorting is a three-state cycle per column (descending, ascending, none).
//! `None` never sorts: it hands back the caller's base sequence unchanged.
//! Missing numbers compare as negative infinity so they can never look like
//! the best value in a column.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::green_cell_count;
use crate::types::SecurityRecord;
use crate::utils::{known, locale_cmp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Ticker,
    Name,
    Industry,
    Ath,
    LowestAfterAth,
    Price,
    CorrectionRatio,
    PriceToAth,
    DaysSinceAth,
    MaSpreadPercentile,
    Ma20Spread,
    Ma50Spread,
    #[serde(rename = "ma20_50_spread")]
    Ma20v50Spread,
    EpsQ0,
    EpsQ1,
    EpsQ2,
    EpsQ3,
    Per,
    Roe,
    GreenCells,
}

/// Value of one cell, as seen by the comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

impl SortField {
    pub const ALL: [SortField; 20] = [
        SortField::Ticker,
        SortField::Name,
        SortField::Industry,
        SortField::Ath,
        SortField::LowestAfterAth,
        SortField::Price,
        SortField::CorrectionRatio,
        SortField::PriceToAth,
        SortField::DaysSinceAth,
        SortField::MaSpreadPercentile,
        SortField::Ma20Spread,
        SortField::Ma50Spread,
        SortField::Ma20v50Spread,
        SortField::EpsQ0,
        SortField::EpsQ1,
        SortField::EpsQ2,
        SortField::EpsQ3,
        SortField::Per,
        SortField::Roe,
        SortField::GreenCells,
    ];

    /// Column key used by the table header and in config files.
    pub fn key(self) -> &'static str {
        match self {
            SortField::Ticker => "ticker",
            SortField::Name => "name",
            SortField::Industry => "industry",
            SortField::Ath => "ath",
            SortField::LowestAfterAth => "lowest_after_ath",
            SortField::Price => "price",
            SortField::CorrectionRatio => "correction_ratio",
            SortField::PriceToAth => "price_to_ath",
            SortField::DaysSinceAth => "days_since_ath",
            SortField::MaSpreadPercentile => "ma_spread_percentile",
            SortField::Ma20Spread => "ma20_spread",
            SortField::Ma50Spread => "ma50_spread",
            SortField::Ma20v50Spread => "ma20_50_spread",
            SortField::EpsQ0 => "eps_q0",
            SortField::EpsQ1 => "eps_q1",
            SortField::EpsQ2 => "eps_q2",
            SortField::EpsQ3 => "eps_q3",
            SortField::Per => "per",
            SortField::Roe => "roe",
            SortField::GreenCells => "green_cells",
        }
    }

    pub fn value(self, r: &SecurityRecord) -> FieldValue<'_> {
        use FieldValue::{Number, Text};
        match self {
            SortField::Ticker => Text(&r.ticker),
            SortField::Name => Text(&r.name),
            SortField::Industry => Text(&r.industry),
            SortField::Ath => Number(r.ath),
            SortField::LowestAfterAth => Number(r.lowest_after_ath),
            SortField::Price => Number(r.price),
            SortField::CorrectionRatio => Number(r.correction_ratio),
            SortField::PriceToAth => Number(r.price_to_ath),
            SortField::DaysSinceAth => Number(r.days_since_ath.map(f64::from)),
            SortField::MaSpreadPercentile => Number(r.spread_percentile()),
            SortField::Ma20Spread => Number(r.ma20_spread),
            SortField::Ma50Spread => Number(r.ma50_spread),
            SortField::Ma20v50Spread => Number(r.ma20_50_spread),
            SortField::EpsQ0 => Number(r.eps_q0),
            SortField::EpsQ1 => Number(r.eps_q1),
            SortField::EpsQ2 => Number(r.eps_q2),
            SortField::EpsQ3 => Number(r.eps_q3),
            SortField::Per => Number(r.per),
            SortField::Roe => Number(r.roe),
            SortField::GreenCells => Number(Some(f64::from(green_cell_count(r)))),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown sort column: {s}"))
    }
}

/// Ascending comparison of two cells. Text only compares against text; any
/// other pairing falls back to numbers with missing values at -inf.
pub fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => locale_cmp(x, y),
        (x, y) => numeric(x)
            .partial_cmp(&numeric(y))
            .unwrap_or(Ordering::Equal),
    }
}

fn numeric(v: FieldValue<'_>) -> f64 {
    match v {
        FieldValue::Number(n) => known(n).unwrap_or(f64::NEG_INFINITY),
        FieldValue::Text(_) => f64::NEG_INFINITY,
    }
}

/// Order `base` by `field`. Stable for equal keys; `SortOrder::None`
/// returns `base` as given.
pub fn sort_records(base: &[SecurityRecord], field: SortField, order: SortOrder) -> Vec<SecurityRecord> {
    let mut out = base.to_vec();
    match order {
        SortOrder::None => {}
        SortOrder::Ascending => {
            out.sort_by(|a, b| compare_values(field.value(a), field.value(b)));
        }
        SortOrder::Descending => {
            out.sort_by(|a, b| compare_values(field.value(b), field.value(a)));
        }
    }
    out
}

/// Default table order when no column is active: most green cells first.
pub fn default_order(records: &[SecurityRecord]) -> Vec<SecurityRecord> {
    sort_records(records, SortField::GreenCells, SortOrder::Descending)
}

/// Active column and direction of the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub field: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl SortState {
    pub fn order(&self) -> SortOrder {
        self.order.unwrap_or(SortOrder::None)
    }

    /// Next state after a header click on `field`.
    pub fn toggle(self, field: SortField) -> Self {
        if self.field != Some(field) {
            return Self {
                field: Some(field),
                order: Some(SortOrder::Descending),
            };
        }
        match self.order() {
            SortOrder::Descending => Self {
                field: Some(field),
                order: Some(SortOrder::Ascending),
            },
            SortOrder::Ascending => Self::default(),
            SortOrder::None => Self {
                field: Some(field),
                order: Some(SortOrder::Descending),
            },
        }
    }

    pub fn apply(&self, base: &[SecurityRecord]) -> Vec<SecurityRecord> {
        match self.field {
            Some(field) => sort_records(base, field, self.order()),
            None => base.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ticker: &str, per: Option<f64>) -> SecurityRecord {
        SecurityRecord {
            per,
            ..SecurityRecord::new(ticker, ticker.to_lowercase())
        }
    }

    fn tickers(v: &[SecurityRecord]) -> Vec<&str> {
        v.iter().map(|r| r.ticker.as_str()).collect()
    }

    #[test]
    fn missing_numbers_are_negative_infinity() {
        let base = vec![rec("A", Some(10.0)), rec("B", None), rec("C", Some(-5.0))];
        let desc = sort_records(&base, SortField::Per, SortOrder::Descending);
        assert_eq!(tickers(&desc), ["A", "C", "B"]);
        let asc = sort_records(&base, SortField::Per, SortOrder::Ascending);
        assert_eq!(tickers(&asc), ["B", "C", "A"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let base = vec![
            rec("A", Some(1.0)),
            rec("B", Some(2.0)),
            rec("C", Some(1.0)),
            rec("D", None),
            rec("E", None),
        ];
        let desc = sort_records(&base, SortField::Per, SortOrder::Descending);
        assert_eq!(tickers(&desc), ["B", "A", "C", "D", "E"]);
    }

    #[test]
    fn none_returns_base() {
        let base = vec![rec("Z", Some(1.0)), rec("A", Some(9.0))];
        assert_eq!(sort_records(&base, SortField::Per, SortOrder::None), base);
    }

    #[test]
    fn text_columns_are_case_insensitive() {
        let base = vec![
            SecurityRecord::new("1", "beta"),
            SecurityRecord::new("2", "Alpha"),
            SecurityRecord::new("3", "charlie"),
        ];
        let asc = sort_records(&base, SortField::Name, SortOrder::Ascending);
        assert_eq!(tickers(&asc), ["2", "1", "3"]);
    }

    #[test]
    fn toggle_cycles_through_three_states() {
        let s = SortState::default().toggle(SortField::Per);
        assert_eq!(s.order(), SortOrder::Descending);
        let s = s.toggle(SortField::Per);
        assert_eq!(s.order(), SortOrder::Ascending);
        let s = s.toggle(SortField::Per);
        assert_eq!(s, SortState::default());
        let s = s.toggle(SortField::Per).toggle(SortField::Roe);
        assert_eq!(s.field, Some(SortField::Roe));
        assert_eq!(s.order(), SortOrder::Descending);
    }

    #[test]
    fn column_keys_parse_back() {
        for f in SortField::ALL {
            assert_eq!(f.key().parse::<SortField>().unwrap(), f);
        }
        assert!("volume".parse::<SortField>().is_err());
    }

    #[test]
    fn default_order_ranks_green_cells() {
        let strong = SecurityRecord {
            price_to_ath: Some(0.95),
            roe: Some(25.0),
            ..SecurityRecord::new("S", "strong")
        };
        let weak = SecurityRecord::new("W", "weak");
        let out = default_order(&[weak, strong]);
        assert_eq!(tickers(&out), ["S", "W"]);
    }
}
