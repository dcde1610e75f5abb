//! Threshold bands for single metrics and the derived green-cell score.

use serde::{Deserialize, Serialize};

use crate::sort::SortField;
use crate::types::SecurityRecord;
use crate::utils::known;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Favorable,
    Neutral,
    OverextendedUp,
    OverextendedDown,
    /// No data for this metric.
    Unknown,
}

impl Band {
    pub fn is_favorable(self) -> bool {
        self == Band::Favorable
    }
}

fn band(v: Option<f64>, f: impl FnOnce(f64) -> Band) -> Band {
    known(v).map_or(Band::Unknown, f)
}

pub fn correction_band(v: Option<f64>) -> Band {
    band(v, |x| if x > 0.50 { Band::OverextendedDown } else { Band::Neutral })
}

pub fn price_to_ath_band(v: Option<f64>) -> Band {
    band(v, |x| if x >= 0.90 { Band::Favorable } else { Band::Neutral })
}

pub fn days_since_ath_band(v: Option<u32>) -> Band {
    match v {
        None => Band::Unknown,
        Some(d) if (40..=365).contains(&d) => Band::Favorable,
        Some(_) => Band::Neutral,
    }
}

pub fn eps_band(v: Option<f64>) -> Band {
    band(v, |x| if x >= 20.0 { Band::Favorable } else { Band::Neutral })
}

pub fn roe_band(v: Option<f64>) -> Band {
    band(v, |x| if x >= 20.0 { Band::Favorable } else { Band::Neutral })
}

pub fn per_band(v: Option<f64>) -> Band {
    band(v, |x| {
        if x > 50.0 {
            Band::OverextendedUp
        } else if x >= 15.0 {
            Band::Favorable
        } else {
            Band::Neutral
        }
    })
}

/// Price sitting within 3% of its moving average (or the two averages within 3%).
pub fn spread_band(v: Option<f64>) -> Band {
    band(v, |x| {
        if (-0.03..=0.03).contains(&x) {
            Band::Favorable
        } else {
            Band::Neutral
        }
    })
}

/// Number of favorable cells across the scored columns.
pub fn green_cell_count(r: &SecurityRecord) -> u32 {
    let mut bands = vec![
        price_to_ath_band(r.price_to_ath),
        days_since_ath_band(r.days_since_ath),
        spread_band(r.ma20_spread),
        spread_band(r.ma50_spread),
        spread_band(r.ma20_50_spread),
        per_band(r.per),
        roe_band(r.roe),
    ];
    bands.extend(r.eps_quarters().into_iter().map(eps_band));
    bands.into_iter().filter(|b| b.is_favorable()).count() as u32
}

/// Band of the cell shown for `field`. Unscored columns are always neutral.
pub fn band_for(field: SortField, r: &SecurityRecord) -> Band {
    match field {
        SortField::CorrectionRatio => correction_band(r.correction_ratio),
        SortField::PriceToAth => price_to_ath_band(r.price_to_ath),
        SortField::DaysSinceAth => days_since_ath_band(r.days_since_ath),
        SortField::Ma20Spread => spread_band(r.ma20_spread),
        SortField::Ma50Spread => spread_band(r.ma50_spread),
        SortField::Ma20v50Spread => spread_band(r.ma20_50_spread),
        SortField::EpsQ0 => eps_band(r.eps_q0),
        SortField::EpsQ1 => eps_band(r.eps_q1),
        SortField::EpsQ2 => eps_band(r.eps_q2),
        SortField::EpsQ3 => eps_band(r.eps_q3),
        SortField::Per => per_band(r.per),
        SortField::Roe => roe_band(r.roe),
        _ => Band::Neutral,
    }
}
