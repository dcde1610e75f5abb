//! Command handler over the persisted ledger.
//!
//! Every command loads the full snapshot from the store, mutates it in memory
//! and writes both collections back before returning. A rejected command
//! never writes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FeeSchedule;
use crate::error::Result;
use crate::risk;
use crate::state::{Annotation, LedgerState};
use crate::store::KvStore;
use crate::types::{ClosedTradeRecord, OpenLot};
use crate::utils::sanitize_symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyCommand {
    pub ticker: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub note: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellCommand {
    pub ticker: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub note: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerCommand {
    Buy(BuyCommand),
    Sell(SellCommand),
    DeletePosition { ticker: String },
    DeleteHistory { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Bought(OpenLot),
    Sold(ClosedTradeRecord),
    /// `true` when something was actually removed.
    Deleted(bool),
}

pub struct Ledger<S: KvStore> {
    store: S,
    fees: FeeSchedule,
}

impl<S: KvStore> Ledger<S> {
    pub fn new(store: S, fees: FeeSchedule) -> Self {
        Self { store, fees }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Current persisted state.
    pub fn snapshot(&self) -> LedgerState {
        LedgerState::load(&self.store)
    }

    pub fn execute(&mut self, cmd: LedgerCommand) -> Result<Outcome> {
        match cmd {
            LedgerCommand::Buy(c) => self.record_buy(c).map(Outcome::Bought),
            LedgerCommand::Sell(c) => self.record_sell(c).map(Outcome::Sold),
            LedgerCommand::DeletePosition { ticker } => self.delete_position(&ticker).map(Outcome::Deleted),
            LedgerCommand::DeleteHistory { id } => self.delete_history(&id).map(Outcome::Deleted),
        }
    }

    pub fn record_buy(&mut self, cmd: BuyCommand) -> Result<OpenLot> {
        risk::pre_check_buy(cmd.quantity, cmd.price)?;
        let ticker = sanitize_symbol(&cmd.ticker);

        let mut st = LedgerState::load(&self.store);
        let lot = st
            .apply_buy(&ticker, cmd.date, cmd.quantity, cmd.price, cmd.note)
            .clone();
        st.save(&mut self.store)?;

        info!(
            "BUY {} {} @ {} -> holding {} @ avg {:.4}",
            ticker, cmd.quantity, cmd.price, lot.quantity, lot.avg_price
        );
        Ok(lot)
    }

    pub fn record_sell(&mut self, cmd: SellCommand) -> Result<ClosedTradeRecord> {
        let ticker = sanitize_symbol(&cmd.ticker);

        let mut st = LedgerState::load(&self.store);
        risk::pre_check_sell(&st, &ticker, cmd.quantity, cmd.price)?;
        let rec = st
            .apply_sell(&ticker, cmd.date, cmd.quantity, cmd.price, cmd.note, &self.fees)?
            .clone();
        st.save(&mut self.store)?;

        info!(
            "SELL {} {} @ {} -> realized {:.2} ({:.2}%), remaining {}",
            ticker,
            cmd.quantity,
            cmd.price,
            rec.profit,
            rec.profit_rate,
            st.position_qty(&ticker)
        );
        Ok(rec)
    }

    pub fn delete_position(&mut self, ticker: &str) -> Result<bool> {
        let ticker = sanitize_symbol(ticker);
        let mut st = LedgerState::load(&self.store);
        let removed = st.remove_position(&ticker);
        if removed {
            st.save(&mut self.store)?;
        }
        debug!(%ticker, removed, "delete position");
        Ok(removed)
    }

    pub fn delete_history(&mut self, id: &str) -> Result<bool> {
        let mut st = LedgerState::load(&self.store);
        let removed = st.remove_history(id);
        if removed {
            st.save(&mut self.store)?;
        }
        debug!(id, removed, "delete history");
        Ok(removed)
    }
}
