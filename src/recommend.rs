//! Buy-candidate screening across markets.
//!
//! Two generations of rules exist. `V1` screens a single market and ranks by
//! the moving-average spread percentile; `V2` screens every market, removes
//! tickers already covered by the primary index, drops ADRs on the secondary
//! exchange, requires a tight moving-average band and keeps the six names
//! closest to their all-time high.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{green_cell_count, spread_band};
use crate::types::{SecurityRecord, Universe};
use crate::utils::{is_adr_name, known};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSet {
    V1,
    #[default]
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Closest to the all-time high first.
    PriceToAthDesc,
    /// Tightest moving averages first, missing percentiles last.
    SpreadPercentileAsc,
}

/// Fully expanded rule mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRules {
    pub all_markets: bool,
    pub exclude_primary_overlap: bool,
    pub exclude_adr_on_secondary: bool,
    /// Two most recent EPS quarters both zero (or missing) passes the EPS check.
    pub eps_zero_bypass: bool,
    /// At least one of the 20d/50d spreads must be within +/-3%.
    pub require_spread_band: bool,
    pub ranking: Ranking,
    pub limit: Option<usize>,
}

impl RuleSet {
    pub fn rules(self) -> RecommendRules {
        match self {
            RuleSet::V1 => RecommendRules {
                all_markets: false,
                exclude_primary_overlap: false,
                exclude_adr_on_secondary: false,
                eps_zero_bypass: false,
                require_spread_band: false,
                ranking: Ranking::SpreadPercentileAsc,
                limit: None,
            },
            RuleSet::V2 => RecommendRules {
                all_markets: true,
                exclude_primary_overlap: true,
                exclude_adr_on_secondary: true,
                eps_zero_bypass: true,
                require_spread_band: true,
                ranking: Ranking::PriceToAthDesc,
                limit: Some(6),
            },
        }
    }
}

/// Which markets play the primary-index and secondary-exchange roles.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRoles {
    pub primary: String,
    pub secondary: String,
}

impl Default for MarketRoles {
    fn default() -> Self {
        Self {
            primary: "SP500".to_string(),
            secondary: "NASDAQ".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub market: String,
    pub ticker: String,
    pub name: String,
    pub price_to_ath: Option<f64>,
    pub ma_spread_percentile: Option<f64>,
    pub green_cells: u32,
}

impl Candidate {
    fn from_record(market: &str, r: &SecurityRecord) -> Self {
        Self {
            market: market.to_string(),
            ticker: r.ticker.clone(),
            name: r.name.clone(),
            price_to_ath: known(r.price_to_ath),
            ma_spread_percentile: r.spread_percentile(),
            green_cells: green_cell_count(r),
        }
    }
}

fn in_range(v: Option<f64>, lo: f64, hi: f64) -> bool {
    known(v).is_some_and(|x| x >= lo && x <= hi)
}

fn eps_passes(r: &SecurityRecord, rules: &RecommendRules) -> bool {
    let q0 = known(r.eps_q0);
    let q1 = known(r.eps_q1);
    // Missing growth figures are reported as zero by the pipeline; treat both
    // the same way as "not published yet".
    let unavailable = |q: Option<f64>| q.map_or(true, |x| x == 0.0);
    if rules.eps_zero_bypass && unavailable(q0) && unavailable(q1) {
        return true;
    }
    q0.is_some_and(|x| x >= 20.0) && q1.is_some_and(|x| x >= 20.0)
}

/// Numeric gate shared by both rule generations.
pub fn passes_conditions(r: &SecurityRecord, rules: &RecommendRules) -> bool {
    let correction = known(r.correction_ratio).is_some_and(|x| x <= 0.40);
    let near_high = known(r.price_to_ath).is_some_and(|x| x >= 0.90);
    let aged = r.days_since_ath.is_some_and(|d| (40..=365).contains(&d));
    let spread = !rules.require_spread_band
        || spread_band(r.ma20_spread).is_favorable()
        || spread_band(r.ma50_spread).is_favorable();
    correction && near_high && aged && eps_passes(r, rules) && spread
}

/// Screen one market. `primary_tickers` is the ticker set of the primary index.
pub fn recommend_market(
    market: &str,
    records: &[SecurityRecord],
    primary_tickers: &HashSet<&str>,
    roles: &MarketRoles,
    rules: &RecommendRules,
) -> Vec<Candidate> {
    let is_primary = market == roles.primary;
    let is_secondary = market == roles.secondary;

    let mut survivors: Vec<&SecurityRecord> = records
        .iter()
        .filter(|r| {
            if rules.exclude_primary_overlap && !is_primary && primary_tickers.contains(r.ticker.as_str()) {
                debug!(market, ticker = %r.ticker, "skip: already in primary index");
                return false;
            }
            if rules.exclude_adr_on_secondary && is_secondary && is_adr_name(&r.name) {
                debug!(market, ticker = %r.ticker, "skip: depositary receipt");
                return false;
            }
            true
        })
        .filter(|r| passes_conditions(r, rules))
        .collect();

    match rules.ranking {
        Ranking::PriceToAthDesc => survivors.sort_by(|a, b| {
            let ka = known(a.price_to_ath).unwrap_or(f64::NEG_INFINITY);
            let kb = known(b.price_to_ath).unwrap_or(f64::NEG_INFINITY);
            kb.partial_cmp(&ka).unwrap_or(std::cmp::Ordering::Equal)
        }),
        Ranking::SpreadPercentileAsc => survivors.sort_by(|a, b| {
            let ka = a.spread_percentile().unwrap_or(f64::INFINITY);
            let kb = b.spread_percentile().unwrap_or(f64::INFINITY);
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        }),
    }

    let matched = survivors.len();
    if let Some(limit) = rules.limit {
        survivors.truncate(limit);
    }
    info!(market, matched, kept = survivors.len(), "recommendations ready");

    survivors
        .into_iter()
        .map(|r| Candidate::from_record(market, r))
        .collect()
}

/// Screen every market of the universe (or just the primary one for
/// single-market rules). Markets come back in universe key order.
pub fn recommend(
    universe: &Universe,
    roles: &MarketRoles,
    rules: &RecommendRules,
) -> Vec<(String, Vec<Candidate>)> {
    let primary_tickers: HashSet<&str> = universe
        .get(&roles.primary)
        .map(|rs| rs.iter().map(|r| r.ticker.as_str()).collect())
        .unwrap_or_default();

    universe
        .iter()
        .filter(|(market, _)| rules.all_markets || **market == roles.primary)
        .map(|(market, records)| {
            let picks = recommend_market(market, records, &primary_tickers, roles, rules);
            (market.clone(), picks)
        })
        .collect()
}
