//! Equity screener and personal position ledger.
//!
//! Screening: [`classify`] bands single metrics, [`sort`] orders the table,
//! [`recommend`] picks buy candidates per market. Journaling: [`ledger`]
//! turns buy/sell commands into open lots and realized history persisted
//! through a [`store::KvStore`]; [`valuation`] summarizes both.

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod recommend;
pub mod risk;
pub mod session;
pub mod sort;
pub mod state;
pub mod store;
pub mod types;
pub mod utils;
pub mod valuation;

pub use error::{LedgerError, Result, StoreError};
pub use ledger::{BuyCommand, Ledger, LedgerCommand, Outcome, SellCommand};
pub use types::{ClosedTradeRecord, MarketBucket, OpenLot, SecurityRecord, Universe};
