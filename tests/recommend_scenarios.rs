//! Recommendation runs over a universe parsed from pipeline-shaped JSON.

use screener_ledger::recommend::{recommend, MarketRoles, RuleSet};
use screener_ledger::Universe;

fn universe_json() -> &'static str {
    r#"{
        "SP500": [
            { "ticker": "AAPL", "name": "Apple Inc.", "industry": "Information Technology",
              "price": 190.0, "ath": 199.0, "correction_ratio": 0.35, "price_to_ath": 0.95,
              "days_since_ath": 100, "eps_q0": 25, "eps_q1": 22, "ma20_spread": 0.01 },
            { "ticker": "KO", "name": "Coca-Cola", "industry": "Consumer Staples",
              "price": 60.0, "correction_ratio": 0.10, "price_to_ath": 0.97,
              "days_since_ath": 20, "eps_q0": 25, "eps_q1": 22, "ma20_spread": 0.0 }
        ],
        "NASDAQ": [
            { "ticker": "AAPL", "name": "Apple Inc.", "correction_ratio": 0.35, "price_to_ath": 0.95,
              "days_since_ath": 100, "eps_q0": 25, "eps_q1": 22, "ma20_spread": 0.01 },
            { "ticker": "ASML", "name": "ASML Holding N.V. ADR", "correction_ratio": 0.2,
              "price_to_ath": 0.99, "days_since_ath": 90, "eps_q0": 40, "eps_q1": 35,
              "ma50_spread": 0.02 },
            { "ticker": "MRVL", "name": "Marvell Technology", "correction_ratio": 0.3,
              "price_to_ath": 0.91, "days_since_ath": 200, "eps_q0": 0, "eps_q1": 0,
              "eps_q2": -40, "ma50_spread": -0.02 }
        ],
        "KOSPI": [
            { "ticker": "005930.KS", "name": "삼성전자", "correction_ratio": 0.38,
              "price_to_ath": 0.92, "days_since_ath": 365, "eps_q0": 30, "eps_q1": 20,
              "ma20_spread": 0.5, "ma50_spread": 0.03 }
        ]
    }"#
}

fn picks(out: &[(String, Vec<screener_ledger::recommend::Candidate>)], market: &str) -> Vec<String> {
    out.iter()
        .find(|(m, _)| m == market)
        .map(|(_, c)| c.iter().map(|c| c.ticker.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn v2_screens_every_market_with_exclusions() {
    let u: Universe = serde_json::from_str(universe_json()).unwrap();
    let out = recommend(&u, &MarketRoles::default(), &RuleSet::V2.rules());

    assert_eq!(picks(&out, "SP500"), ["AAPL"]);
    // AAPL is already an SP500 name, ASML is an ADR.
    assert_eq!(picks(&out, "NASDAQ"), ["MRVL"]);
    assert_eq!(picks(&out, "KOSPI"), ["005930.KS"]);
}

#[test]
fn v1_screens_primary_only() {
    let u: Universe = serde_json::from_str(universe_json()).unwrap();
    let out = recommend(&u, &MarketRoles::default(), &RuleSet::V1.rules());
    assert_eq!(out.len(), 1);
    assert_eq!(picks(&out, "SP500"), ["AAPL"]);
}
