//! # Boundary Parsing
//!
//! Turns untrusted text from the submission layer into typed amounts and
//! addresses. The ledger core only ever sees `U256` and `Address`; anything
//! that cannot be represented exactly (negative numbers, fractions, exponent
//! notation, values past `2^256 - 1`) is rejected here, before it can be
//! rounded or wrapped into something the holder never signed.

use alloy_primitives::{Address, U256};
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Errors from parsing untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid argument {input:?}: {reason}")]
    InvalidArgument { input: String, reason: &'static str },

    #[error("amount {input} exceeds the 256-bit maximum")]
    Overflow { input: String },
}

impl AmountError {
    fn invalid(input: &str, reason: &'static str) -> Self {
        AmountError::InvalidArgument {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses a plain decimal unsigned integer into a `U256`.
///
/// Accepts digits only. Leading zeros are fine; signs, decimal points,
/// exponents and whitespace are not.
///
/// ```
/// use ethless_protocol::amount::{parse_amount, AmountError};
/// use ethless_protocol::U256;
///
/// assert_eq!(parse_amount("1000").unwrap(), U256::from(1000u64));
/// assert!(matches!(parse_amount("-1"), Err(AmountError::InvalidArgument { .. })));
/// ```
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    if input.is_empty() {
        return Err(AmountError::invalid(input, "empty amount"));
    }
    if input.starts_with('-') || input.starts_with('+') {
        return Err(AmountError::invalid(input, "signed amounts are not allowed"));
    }
    if input.contains('.') {
        return Err(AmountError::invalid(input, "fractional amounts are not allowed"));
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::invalid(input, "amount must be a decimal integer"));
    }

    // Only digits remain, so the sole failure left is a value past 2^256 - 1.
    U256::from_str_radix(input, 10).map_err(|_| AmountError::Overflow {
        input: input.to_string(),
    })
}

/// Parses a `0x`-prefixed, 40-hex-digit account address.
pub fn parse_address(input: &str) -> Result<Address, AmountError> {
    let hex_part = input
        .strip_prefix("0x")
        .ok_or_else(|| AmountError::invalid(input, "address must start with 0x"))?;
    if hex_part.len() != ADDRESS_LENGTH * 2 {
        return Err(AmountError::invalid(input, "address must be 20 bytes"));
    }
    Address::from_str(hex_part).map_err(|_| AmountError::invalid(input, "address is not hex"))
}
