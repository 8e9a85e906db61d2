//! # Event Log
//!
//! Append-only record of every state change, in emission order. A call that
//! fails leaves no events behind: the token truncates the log back to where
//! the call started.
//!
//! Events serialize with an explicit `kind` tag so an indexer can consume the
//! JSON-lines export without knowing the Rust types.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A single emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LedgerEvent {
    /// Balance movement. Mints have `from == 0`, burns have `to == 0`.
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    /// Allowance set to `value` (the new absolute allowance).
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    ReservationCreated {
        reserver: Address,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        expiry_block: u64,
    },
    /// `executor` is the account that executed, which collected the fee.
    ReservationExecuted {
        reserver: Address,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
    },
    ReservationReclaimed {
        reserver: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
    },
}

/// Ordered event sink owned by the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every event after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events emitted at or after position `from`.
    pub fn since(&self, from: usize) -> &[LedgerEvent] {
        self.events.get(from..).unwrap_or(&[])
    }

    /// One JSON object per line, in emission order.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}
