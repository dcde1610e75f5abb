//! Explicit view state for the screening table.
//!
//! Commands never mutate in place: `apply` returns the next state.

use serde::{Deserialize, Serialize};

use crate::sort::{default_order, SortField, SortState};
use crate::types::{SecurityRecord, Universe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSortCommand {
    pub field: SortField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewCommand {
    SetSort(SetSortCommand),
    /// Switch market; the sort resets like a fresh table.
    SelectMarket { market: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub market: String,
    pub sort: SortState,
}

impl ViewState {
    pub fn new(market: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            sort: SortState::default(),
        }
    }

    pub fn apply(&self, cmd: &ViewCommand) -> Self {
        match cmd {
            ViewCommand::SetSort(c) => Self {
                market: self.market.clone(),
                sort: self.sort.toggle(c.field),
            },
            ViewCommand::SelectMarket { market } => Self::new(market.clone()),
        }
    }

    /// Rows of the selected market in display order.
    pub fn rows(&self, universe: &Universe) -> Vec<SecurityRecord> {
        let records = universe.get(&self.market).map(Vec::as_slice).unwrap_or_default();
        self.sort.apply(&default_order(records))
    }
}
