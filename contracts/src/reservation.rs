//! # Reservation Engine
//!
//! Two-phase escrow. A reserve locks `amount + fee` out of the reserver's
//! balance; the reservation then settles exactly once:
//!
//! 1. **Execute**: before the expiry block, the designated executor (or
//!    anyone, when none is designated) pays `amount` to the recipient and
//!    collects `fee`.
//! 2. **Reclaim**: once the expiry block is reached, the permitted caller
//!    returns `amount + fee` to the reserver. A reservation without a
//!    recipient can never execute, so the reserver may reclaim it at any
//!    time.
//!
//! ```text
//!            execute (block < expiry)
//!   Active ─────────────────────────▶ Executed
//!     │
//!     │      reclaim (block >= expiry, or no recipient)
//!     └─────────────────────────────▶ Reclaimed
//! ```
//!
//! Reservations are keyed by `(reserver, nonce)`. The nonce is the one the
//! reserve authorization consumed, which makes the key unique.
//!
//! This module owns the state machine and its guards. Moving funds is the
//! token's job; it calls the `check_*` guards, settles through the ledger,
//! and only then flips the status.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::arithmetic::checked_add;
use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Funds are locked.
    Active,
    /// Paid out to the recipient. Terminal.
    Executed,
    /// Returned to the reserver. Terminal.
    Reclaimed,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Active => write!(f, "Active"),
            ReservationStatus::Executed => write!(f, "Executed"),
            ReservationStatus::Reclaimed => write!(f, "Reclaimed"),
        }
    }
}

/// A single escrowed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reserver: Address,
    /// Payout target. The zero address means there is none.
    pub recipient: Address,
    /// Account allowed to settle. The zero address means no one is
    /// designated.
    pub executor: Address,
    pub amount: U256,
    pub fee: U256,
    pub nonce: U256,
    pub expiry_block: u64,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Total locked: `amount + fee`.
    pub fn total(&self) -> Result<U256, LedgerError> {
        checked_add(self.amount, self.fee)
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    fn require_active(&self) -> Result<(), LedgerError> {
        match self.status {
            ReservationStatus::Active => Ok(()),
            status => Err(LedgerError::ReservationNotActive { status }),
        }
    }

    /// The account allowed to reclaim: the executor if one is designated,
    /// otherwise the reserver.
    pub fn reclaimer(&self) -> Address {
        if self.executor.is_zero() {
            self.reserver
        } else {
            self.executor
        }
    }

    /// Guards for [`mark_executed`](Self::mark_executed).
    pub fn check_executable(&self, caller: Address, current_block: u64) -> Result<(), LedgerError> {
        self.require_active()?;
        if current_block >= self.expiry_block {
            return Err(LedgerError::ReservationExpired {
                expiry_block: self.expiry_block,
                current_block,
            });
        }
        if !self.executor.is_zero() && caller != self.executor {
            return Err(LedgerError::UnauthorizedExecutor {
                executor: self.executor,
                caller,
            });
        }
        if self.recipient.is_zero() {
            return Err(LedgerError::TransferToZeroAddress);
        }
        Ok(())
    }

    /// Guards for [`mark_reclaimed`](Self::mark_reclaimed).
    ///
    /// Without a recipient the reservation can never execute, so the
    /// reserver (or the executor) may take it back at any block.
    pub fn check_reclaimable(&self, caller: Address, current_block: u64) -> Result<(), LedgerError> {
        self.require_active()?;
        let allowed = if self.recipient.is_zero() {
            caller == self.reserver || caller == self.reclaimer()
        } else {
            caller == self.reclaimer() && current_block >= self.expiry_block
        };
        if !allowed {
            return Err(LedgerError::ReservationNotYetReclaimable { caller });
        }
        Ok(())
    }

    /// `Active -> Executed`.
    pub fn mark_executed(&mut self) -> Result<(), LedgerError> {
        match self.status {
            ReservationStatus::Active => {
                self.status = ReservationStatus::Executed;
                Ok(())
            }
            status => Err(LedgerError::ReservationNotActive { status }),
        }
    }

    /// `Active -> Reclaimed`.
    pub fn mark_reclaimed(&mut self) -> Result<(), LedgerError> {
        match self.status {
            ReservationStatus::Active => {
                self.status = ReservationStatus::Reclaimed;
                Ok(())
            }
            status => Err(LedgerError::ReservationNotActive { status }),
        }
    }
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// All reservations, keyed by reserver then nonce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationBook {
    reservations: HashMap<Address, HashMap<U256, Reservation>>,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new reservation. The key must be fresh.
    pub fn insert(&mut self, reservation: Reservation) -> Result<(), LedgerError> {
        let by_nonce = self.reservations.entry(reservation.reserver).or_default();
        if by_nonce.contains_key(&reservation.nonce) {
            return Err(LedgerError::NonceAlreadyUsed {
                account: reservation.reserver,
                nonce: reservation.nonce,
            });
        }
        by_nonce.insert(reservation.nonce, reservation);
        Ok(())
    }

    pub fn get(&self, reserver: Address, nonce: U256) -> Option<&Reservation> {
        self.reservations
            .get(&reserver)
            .and_then(|by_nonce| by_nonce.get(&nonce))
    }

    /// Like [`get`](Self::get), but a missing entry is `ReservationNotFound`.
    pub fn require(&self, reserver: Address, nonce: U256) -> Result<&Reservation, LedgerError> {
        self.get(reserver, nonce)
            .ok_or(LedgerError::ReservationNotFound { reserver, nonce })
    }

    pub fn require_mut(
        &mut self,
        reserver: Address,
        nonce: U256,
    ) -> Result<&mut Reservation, LedgerError> {
        self.reservations
            .get_mut(&reserver)
            .and_then(|by_nonce| by_nonce.get_mut(&nonce))
            .ok_or(LedgerError::ReservationNotFound { reserver, nonce })
    }

    /// Sum of `amount + fee` over the account's active reservations.
    pub fn reserve_of(&self, account: Address) -> Result<U256, LedgerError> {
        let Some(by_nonce) = self.reservations.get(&account) else {
            return Ok(U256::ZERO);
        };
        by_nonce
            .values()
            .filter(|r| r.is_active())
            .try_fold(U256::ZERO, |acc, r| checked_add(acc, r.total()?))
    }

    /// Sum of `amount + fee` over every active reservation.
    pub fn total_active(&self) -> Result<U256, LedgerError> {
        self.iter()
            .filter(|r| r.is_active())
            .try_fold(U256::ZERO, |acc, r| checked_add(acc, r.total()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values().flat_map(|by_nonce| by_nonce.values())
    }

    pub fn len(&self) -> usize {
        self.reservations.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reserver() -> Address {
        Address::repeat_byte(1)
    }

    fn recipient() -> Address {
        Address::repeat_byte(2)
    }

    fn executor() -> Address {
        Address::repeat_byte(3)
    }

    fn sample() -> Reservation {
        Reservation {
            reserver: reserver(),
            recipient: recipient(),
            executor: executor(),
            amount: U256::from(500u64),
            fee: U256::from(10u64),
            nonce: U256::from(1u8),
            expiry_block: 100,
            status: ReservationStatus::Active,
        }
    }

    #[test]
    fn test_execute_window() {
        let r = sample();
        assert!(r.check_executable(executor(), 99).is_ok());
        assert_eq!(
            r.check_executable(executor(), 100).unwrap_err().kind(),
            ErrorKind::ReservationExpired
        );
    }

    #[test]
    fn test_execute_requires_designated_executor() {
        let r = sample();
        assert_eq!(
            r.check_executable(recipient(), 10).unwrap_err().kind(),
            ErrorKind::UnauthorizedExecutor
        );

        let mut open = sample();
        open.executor = Address::ZERO;
        assert!(open.check_executable(Address::repeat_byte(9), 10).is_ok());
    }

    #[test]
    fn test_execute_without_recipient() {
        let mut r = sample();
        r.recipient = Address::ZERO;
        assert_eq!(
            r.check_executable(executor(), 10).unwrap_err().kind(),
            ErrorKind::TransferToZeroAddress
        );
    }

    #[test]
    fn test_reclaim_window() {
        let r = sample();
        assert_eq!(
            r.check_reclaimable(executor(), 99).unwrap_err().kind(),
            ErrorKind::ReservationNotYetReclaimable
        );
        assert!(r.check_reclaimable(executor(), 100).is_ok());
        // Only the executor may reclaim when one is designated.
        assert!(r.check_reclaimable(reserver(), 100).is_err());
    }

    #[test]
    fn test_reclaim_without_executor_goes_to_reserver() {
        let mut r = sample();
        r.executor = Address::ZERO;
        assert_eq!(r.reclaimer(), reserver());
        assert!(r.check_reclaimable(reserver(), 100).is_ok());
        assert!(r.check_reclaimable(recipient(), 100).is_err());
    }

    #[test]
    fn test_reclaim_without_recipient_any_time() {
        let mut r = sample();
        r.recipient = Address::ZERO;
        assert!(r.check_reclaimable(reserver(), 0).is_ok());
        assert!(r.check_reclaimable(executor(), 0).is_ok());
        assert_eq!(
            r.check_reclaimable(recipient(), 0).unwrap_err().kind(),
            ErrorKind::ReservationNotYetReclaimable
        );
    }

    #[test]
    fn test_transitions_are_exclusive() {
        let mut r = sample();
        r.mark_executed().unwrap();
        assert_eq!(r.status, ReservationStatus::Executed);

        let err = r.mark_reclaimed().unwrap_err();
        assert_eq!(
            err,
            LedgerError::ReservationNotActive {
                status: ReservationStatus::Executed
            }
        );
        assert!(r.check_executable(executor(), 10).is_err());
        assert!(r.check_reclaimable(executor(), 1000).is_err());
    }

    #[test]
    fn test_book_totals() {
        let mut book = ReservationBook::new();
        book.insert(sample()).unwrap();

        let mut second = sample();
        second.nonce = U256::from(2u8);
        second.amount = U256::from(100u64);
        book.insert(second).unwrap();

        assert_eq!(book.reserve_of(reserver()).unwrap(), U256::from(620u64));
        assert_eq!(book.reserve_of(recipient()).unwrap(), U256::ZERO);

        book.require_mut(reserver(), U256::from(1u8))
            .unwrap()
            .mark_reclaimed()
            .unwrap();
        assert_eq!(book.reserve_of(reserver()).unwrap(), U256::from(110u64));
        assert_eq!(book.total_active().unwrap(), U256::from(110u64));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_book_rejects_duplicate_key() {
        let mut book = ReservationBook::new();
        book.insert(sample()).unwrap();
        assert!(book.insert(sample()).is_err());
    }

    #[test]
    fn test_missing_reservation() {
        let book = ReservationBook::new();
        assert_eq!(
            book.require(reserver(), U256::ZERO).unwrap_err().kind(),
            ErrorKind::ReservationNotFound
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ReservationStatus::Reclaimed.to_string(), "Reclaimed");
    }
}
