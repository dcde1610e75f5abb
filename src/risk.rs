//! Validation of ledger commands before they touch state.

use crate::error::{LedgerError, Result};
use crate::state::LedgerState;
use crate::utils::snap_to_held;

fn check_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(LedgerError::InvalidPrice(price));
    }
    Ok(())
}

pub fn pre_check_buy(quantity: f64, price: f64) -> Result<()> {
    check_quantity(quantity)?;
    check_price(price)
}

pub fn pre_check_sell(state: &LedgerState, ticker: &str, quantity: f64, price: f64) -> Result<()> {
    check_quantity(quantity)?;
    check_price(price)?;
    let Some(lot) = state.position(ticker) else {
        return Err(LedgerError::NoPosition(ticker.to_string()));
    };
    if snap_to_held(quantity, lot.quantity) > lot.quantity {
        return Err(LedgerError::InsufficientQuantity {
            ticker: ticker.to_string(),
            requested: quantity,
            held: lot.quantity,
        });
    }
    Ok(())
}
