//! # Ledger
//!
//! Balances, allowances and total supply, with the ERC-20 operations over
//! them. Every mutation is checked (see [`crate::arithmetic`]) and every
//! successful one emits its event into the caller's [`EventLog`].
//!
//! ## Rollback
//!
//! Each write records the value it replaced in an undo journal. The token
//! takes a [`checkpoint`](Ledger::checkpoint) before a call and either
//! [`commit`](Ledger::commit)s or [`revert_to`](Ledger::revert_to)s it, so a
//! call that fails halfway through (say, after the debit but before the
//! second credit) leaves balances exactly as they were.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::arithmetic::{checked_add, checked_sub, require_positive};
use crate::error::LedgerError;
use crate::events::{EventLog, LedgerEvent};

/// Allowance value that is never decremented by delegated spends.
pub const UNLIMITED_ALLOWANCE: U256 = U256::MAX;

#[derive(Debug, Clone)]
enum JournalEntry {
    Balance {
        account: Address,
        previous: U256,
    },
    Allowance {
        owner: Address,
        spender: Address,
        previous: U256,
    },
    TotalSupply {
        previous: U256,
    },
}

/// Token balances and allowances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    balances: HashMap<Address, U256>,
    /// `owner -> (spender -> amount)`.
    allowances: HashMap<Address, HashMap<Address, U256>>,
    total_supply: U256,
    #[serde(skip)]
    journal: Vec<JournalEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------- Views ----------

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or(U256::ZERO)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Every account that has ever been credited, with its balance.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    /// Sum of all balances. Fails only if the ledger is corrupt.
    pub fn sum_of_balances(&self) -> Result<U256, LedgerError> {
        self.balances
            .values()
            .try_fold(U256::ZERO, |acc, b| checked_add(acc, *b))
    }

    // ---------- Journal ----------

    /// Marks the current journal position.
    pub fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    /// Undoes every write made since `mark`, newest first.
    pub fn revert_to(&mut self, mark: usize) {
        while self.journal.len() > mark {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Balance { account, previous } => {
                    self.balances.insert(account, previous);
                }
                JournalEntry::Allowance {
                    owner,
                    spender,
                    previous,
                } => {
                    self.allowances
                        .entry(owner)
                        .or_default()
                        .insert(spender, previous);
                }
                JournalEntry::TotalSupply { previous } => {
                    self.total_supply = previous;
                }
            }
        }
    }

    /// Keeps every write made since `mark`. The outermost commit drops the
    /// journal.
    pub fn commit(&mut self, mark: usize) {
        if mark == 0 {
            self.journal.clear();
        }
    }

    fn set_balance(&mut self, account: Address, value: U256) {
        let previous = self.balance_of(account);
        self.journal.push(JournalEntry::Balance { account, previous });
        self.balances.insert(account, value);
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, value: U256) {
        let previous = self.allowance(owner, spender);
        self.journal.push(JournalEntry::Allowance {
            owner,
            spender,
            previous,
        });
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, value);
    }

    fn set_total_supply(&mut self, value: U256) {
        self.journal.push(JournalEntry::TotalSupply {
            previous: self.total_supply,
        });
        self.total_supply = value;
    }

    // ---------- Primitive mutations ----------

    /// Adds `amount` to `account`. Returns the new balance.
    pub fn credit(&mut self, account: Address, amount: U256) -> Result<U256, LedgerError> {
        let updated = checked_add(self.balance_of(account), amount)?;
        self.set_balance(account, updated);
        Ok(updated)
    }

    /// Removes `amount` from `account`. Returns the new balance.
    pub fn debit(&mut self, account: Address, amount: U256) -> Result<U256, LedgerError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                balance,
                required: amount,
            });
        }
        let updated = checked_sub(balance, amount)?;
        self.set_balance(account, updated);
        Ok(updated)
    }

    /// Fails with `InsufficientBalance` unless `account` holds `required`.
    pub fn require_balance(&self, account: Address, required: U256) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        if balance < required {
            return Err(LedgerError::InsufficientBalance {
                account,
                balance,
                required,
            });
        }
        Ok(())
    }

    /// Debit, credit and `Transfer` event, with no positivity check. Zero
    /// amounts move nothing and emit nothing.
    pub fn move_funds(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        events.push(LedgerEvent::Transfer {
            from,
            to,
            value: amount,
        });
        Ok(())
    }

    // ---------- ERC-20 operations ----------

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        require_non_zero(from)?;
        require_non_zero(to)?;
        self.move_funds(from, to, amount, events)?;
        debug!(%from, %to, %amount, "transfer");
        Ok(())
    }

    /// `spender` moves `amount` of `from`'s balance to `to`. The allowance
    /// is checked before the balance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        require_non_zero(from)?;
        require_non_zero(to)?;
        let remaining = self.check_allowance(from, spender, amount)?;
        self.require_balance(from, amount)?;
        self.spend_allowance(from, spender, remaining, events);
        self.move_funds(from, to, amount, events)?;
        debug!(%spender, %from, %to, %amount, "transfer_from");
        Ok(())
    }

    /// Sets the allowance to exactly `amount`. Zero is allowed.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_non_zero(owner)?;
        require_non_zero(spender)?;
        self.set_allowance(owner, spender, amount);
        events.push(LedgerEvent::Approval {
            owner,
            spender,
            value: amount,
        });
        debug!(%owner, %spender, %amount, "approve");
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        delta: U256,
        events: &mut EventLog,
    ) -> Result<U256, LedgerError> {
        let updated = checked_add(self.allowance(owner, spender), delta)?;
        self.approve(owner, spender, updated, events)?;
        Ok(updated)
    }

    /// Fails with `Underflow` when `delta` exceeds the current allowance.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        delta: U256,
        events: &mut EventLog,
    ) -> Result<U256, LedgerError> {
        let updated = checked_sub(self.allowance(owner, spender), delta)?;
        self.approve(owner, spender, updated, events)?;
        Ok(updated)
    }

    /// Allowance left after `spender` spends `amount` of `owner`'s funds, or
    /// `None` for an unlimited allowance.
    fn check_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<U256>, LedgerError> {
        let current = self.allowance(owner, spender);
        if current == UNLIMITED_ALLOWANCE {
            return Ok(None);
        }
        if current < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner,
                spender,
                allowance: current,
                required: amount,
            });
        }
        checked_sub(current, amount).map(Some)
    }

    /// Writes the allowance computed by [`check_allowance`](Self::check_allowance).
    /// An unlimited allowance is left untouched and emits nothing.
    fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        remaining: Option<U256>,
        events: &mut EventLog,
    ) {
        let Some(updated) = remaining else {
            return;
        };
        self.set_allowance(owner, spender, updated);
        events.push(LedgerEvent::Approval {
            owner,
            spender,
            value: updated,
        });
    }

    /// Destroys `amount` of `holder`'s balance.
    pub fn burn(
        &mut self,
        holder: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        require_non_zero(holder)?;
        self.debit(holder, amount)?;
        let supply = checked_sub(self.total_supply, amount)?;
        self.set_total_supply(supply);
        events.push(LedgerEvent::Transfer {
            from: holder,
            to: Address::ZERO,
            value: amount,
        });
        debug!(%holder, %amount, total_supply = %supply, "burn");
        Ok(())
    }

    pub fn burn_from(
        &mut self,
        spender: Address,
        holder: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        require_non_zero(holder)?;
        let remaining = self.check_allowance(holder, spender, amount)?;
        self.require_balance(holder, amount)?;
        self.spend_allowance(holder, spender, remaining, events);
        self.burn(holder, amount, events)
    }

    /// Creates `amount` new tokens. Only reachable through token
    /// initialization.
    pub(crate) fn mint(
        &mut self,
        to: Address,
        amount: U256,
        events: &mut EventLog,
    ) -> Result<(), LedgerError> {
        require_non_zero(to)?;
        let supply = checked_add(self.total_supply, amount)?;
        self.credit(to, amount)?;
        self.set_total_supply(supply);
        events.push(LedgerEvent::Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        });
        debug!(%to, %amount, "mint");
        Ok(())
    }
}

fn require_non_zero(account: Address) -> Result<(), LedgerError> {
    if account.is_zero() {
        return Err(LedgerError::TransferToZeroAddress);
    }
    Ok(())
}
