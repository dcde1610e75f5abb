//! Persisted ledger state: open lots and aggregated sell history.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::FeeSchedule;
use crate::error::{Result, StoreError};
use crate::store::KvStore;
use crate::types::{BuyNote, ClosedTradeRecord, OpenLot, SellNote};
use crate::utils::snap_to_held;

pub const POSITIONS_KEY: &str = "positions";
pub const HISTORY_KEY: &str = "history";

/// Optional free text and chart reference attached to a trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub chart: Option<String>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.rationale.trim().is_empty() && self.chart.is_none()
    }
}

/// Fee-adjusted result of settling one sell against a lot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub cost_basis: f64,
    pub revenue: f64,
    pub profit: f64,
    pub profit_rate: f64,
}

pub fn settle(quantity: f64, avg_price: f64, price: f64, buy_fee: f64, sell_fee: f64) -> Settlement {
    let cost_basis = quantity * avg_price * (1.0 + buy_fee);
    let revenue = quantity * price * (1.0 - sell_fee);
    let profit = revenue - cost_basis;
    Settlement {
        cost_basis,
        revenue,
        profit,
        profit_rate: rate(profit, cost_basis),
    }
}

fn rate(profit: f64, cost: f64) -> f64 {
    if cost == 0.0 {
        0.0
    } else {
        profit / cost * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub positions: Vec<OpenLot>,
    pub history: Vec<ClosedTradeRecord>,
}

fn load_key<T: DeserializeOwned + Default>(store: &impl KvStore, key: &str) -> T {
    match store.get(key) {
        Ok(Some(s)) => match serde_json::from_str(&s) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, "corrupt ledger snapshot, starting empty: {e}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, "ledger snapshot unreadable, starting empty: {e}");
            T::default()
        }
    }
}

impl LedgerState {
    /// Read both collections. Anything unreadable comes back empty.
    pub fn load(store: &impl KvStore) -> Self {
        Self {
            positions: load_key(store, POSITIONS_KEY),
            history: load_key(store, HISTORY_KEY),
        }
    }

    pub fn save(&self, store: &mut impl KvStore) -> std::result::Result<(), StoreError> {
        let encode = |key: &'static str, r: serde_json::Result<String>| {
            r.map_err(|source| StoreError::Encode {
                key: key.to_string(),
                source,
            })
        };
        let positions = encode(POSITIONS_KEY, serde_json::to_string_pretty(&self.positions))?;
        let history = encode(HISTORY_KEY, serde_json::to_string_pretty(&self.history))?;
        store.put_many(vec![(POSITIONS_KEY, positions), (HISTORY_KEY, history)])
    }

    pub fn position(&self, ticker: &str) -> Option<&OpenLot> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    pub fn record(&self, ticker: &str) -> Option<&ClosedTradeRecord> {
        self.history.iter().find(|h| h.ticker == ticker)
    }

    pub fn position_qty(&self, ticker: &str) -> f64 {
        self.position(ticker).map_or(0.0, |p| p.quantity)
    }

    /// Weighted-average add. Inputs are assumed validated.
    pub fn apply_buy(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        quantity: f64,
        price: f64,
        note: Annotation,
    ) -> &OpenLot {
        let note = (!note.is_empty()).then(|| BuyNote {
            date,
            rationale: note.rationale,
            chart: note.chart,
        });

        let idx = match self.positions.iter().position(|p| p.ticker == ticker) {
            Some(i) => {
                let lot = &mut self.positions[i];
                let total_cost = lot.avg_price * lot.quantity + price * quantity;
                lot.quantity += quantity;
                lot.avg_price = total_cost / lot.quantity;
                lot.date = date;
                lot.notes.extend(note);
                i
            }
            None => {
                self.positions.push(OpenLot {
                    ticker: ticker.to_string(),
                    quantity,
                    avg_price: price,
                    date,
                    opened_on: date,
                    notes: note.into_iter().collect(),
                });
                self.positions.len() - 1
            }
        };
        &self.positions[idx]
    }

    /// Realize a sell against the open lot and fold it into the ticker's
    /// history record. Inputs are assumed validated against the lot. A
    /// quantity within float noise of the holding sells the whole lot.
    pub fn apply_sell(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        quantity: f64,
        price: f64,
        note: Annotation,
        fees: &FeeSchedule,
    ) -> Result<&ClosedTradeRecord> {
        let lot_idx = self
            .positions
            .iter()
            .position(|p| p.ticker == ticker)
            .ok_or_else(|| crate::error::LedgerError::NoPosition(ticker.to_string()))?;
        let lot = &self.positions[lot_idx];
        let quantity = snap_to_held(quantity, lot.quantity);
        let rates = fees.rates(ticker);
        let s = settle(quantity, lot.avg_price, price, rates.buy, rates.sell);

        let sell_note = SellNote {
            date,
            quantity,
            price,
            buy_price: lot.avg_price,
            profit: s.profit,
            rationale: note.rationale,
            chart: note.chart,
        };

        let rec_idx = match self.history.iter().position(|h| h.ticker == ticker) {
            Some(i) => {
                let rec = &mut self.history[i];
                let total_qty = rec.quantity + quantity;
                rec.avg_buy_price = (rec.avg_buy_price * rec.quantity + lot.avg_price * quantity) / total_qty;
                rec.avg_sell_price = (rec.avg_sell_price * rec.quantity + price * quantity) / total_qty;
                rec.quantity = total_qty;
                rec.profit += s.profit;
                let cost_basis = total_qty * rec.avg_buy_price * (1.0 + rates.buy);
                rec.profit_rate = rate(rec.profit, cost_basis);
                rec.buy_date = rec.buy_date.min(lot.opened_on);
                rec.sell_date = rec.sell_date.max(date);
                rec.notes.push(sell_note);
                i
            }
            None => {
                self.history.push(ClosedTradeRecord {
                    id: Uuid::new_v4().to_string(),
                    ticker: ticker.to_string(),
                    buy_date: lot.opened_on,
                    sell_date: date,
                    quantity,
                    avg_buy_price: lot.avg_price,
                    avg_sell_price: price,
                    profit: s.profit,
                    profit_rate: s.profit_rate,
                    market: fees.bucket(ticker),
                    notes: vec![sell_note],
                });
                self.history.len() - 1
            }
        };

        let lot = &mut self.positions[lot_idx];
        lot.quantity -= quantity;
        if lot.quantity <= 0.0 {
            self.positions.remove(lot_idx);
        }
        Ok(&self.history[rec_idx])
    }

    /// Returns whether a lot was removed.
    pub fn remove_position(&mut self, ticker: &str) -> bool {
        let before = self.positions.len();
        self.positions.retain(|p| p.ticker != ticker);
        before != self.positions.len()
    }

    /// Returns whether a history record was removed.
    pub fn remove_history(&mut self, id: &str) -> bool {
        let before = self.history.len();
        self.history.retain(|h| h.id != id);
        before != self.history.len()
    }
}
