//! # Nonce Registry
//!
//! Replay protection for signed authorizations. Two schemes coexist:
//!
//! - **Free-form nonces** for burn, transfer and reserve. The signer picks
//!   any `U256` (wallet tooling typically uses a millisecond timestamp); the
//!   registry records each `(account, nonce)` pair once and refuses it
//!   forever after. The three families share one namespace per account, so a
//!   nonce spent on a transfer cannot be reused for a reserve.
//! - **Sequential counters** for permits and typed transfers, one counter
//!   per owner shared by both. The authorization must carry exactly the
//!   owner's current counter, which then advances by one.
//!
//! Consumed nonces are never released, not even when the operation they
//! authorized fails afterwards.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::arithmetic::checked_add;
use crate::error::LedgerError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonceRegistry {
    used: HashMap<Address, HashSet<U256>>,
    permit_counters: HashMap<Address, U256>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `(account, nonce)` as used. Nothing changes on failure.
    pub fn consume(&mut self, account: Address, nonce: U256) -> Result<(), LedgerError> {
        if !self.used.entry(account).or_default().insert(nonce) {
            return Err(LedgerError::NonceAlreadyUsed { account, nonce });
        }
        Ok(())
    }

    pub fn is_used(&self, account: Address, nonce: U256) -> bool {
        self.used
            .get(&account)
            .is_some_and(|nonces| nonces.contains(&nonce))
    }

    /// The nonce the owner's next permit or typed transfer must carry.
    pub fn permit_nonce(&self, owner: Address) -> U256 {
        self.permit_counters
            .get(&owner)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Fails with `InvalidNonce` unless `supplied` is the owner's current
    /// counter.
    pub fn check_permit_nonce(&self, owner: Address, supplied: U256) -> Result<(), LedgerError> {
        let expected = self.permit_nonce(owner);
        if supplied != expected {
            return Err(LedgerError::InvalidNonce { expected, supplied });
        }
        Ok(())
    }

    /// Checks `supplied` against the counter and advances it. Returns the
    /// new counter.
    pub fn use_permit_nonce(&mut self, owner: Address, supplied: U256) -> Result<U256, LedgerError> {
        self.check_permit_nonce(owner, supplied)?;
        let next = checked_add(supplied, U256::from(1u8))?;
        self.permit_counters.insert(owner, next);
        Ok(next)
    }
}
