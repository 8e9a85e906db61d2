//! Checked 256-bit arithmetic. Every balance, allowance, supply and
//! reservation mutation goes through these helpers; nothing in the crate
//! uses wrapping or saturating operations on amounts.

use alloy_primitives::U256;

use crate::error::LedgerError;

pub fn checked_add(a: U256, b: U256) -> Result<U256, LedgerError> {
    a.checked_add(b).ok_or_else(LedgerError::overflow)
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256, LedgerError> {
    a.checked_sub(b).ok_or_else(LedgerError::underflow)
}

/// Rejects a zero amount.
pub fn require_positive(amount: U256) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::invalid_argument(
            "amount must be greater than zero",
        ));
    }
    Ok(())
}
