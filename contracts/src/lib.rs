// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ethless Token Contract
//!
//! An ERC-20 ledger with gas-delegated ("ethless") operations. A holder signs
//! an authorization off-chain; a relayer submits it, pays for execution and
//! collects a fee in tokens.
//!
//! - **Ledger**: balances, allowances, supply, the ERC-20 operations.
//! - **Nonce Registry**: replay protection for every signed authorization.
//! - **Authorization**: signature recovery and nonce consumption in front of
//!   every ethless call, plus EIP-712 permits.
//! - **Reservations**: two-phase escrow that either executes to a recipient
//!   or is reclaimed by the reserver.
//!
//! ## Design Principles
//!
//! 1. All monetary operations are checked. Amounts are `U256` and never wrap.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. A call either applies completely or not at all. A consumed nonce is
//!    the only thing a failed call can leave behind.
//! 4. Every public type is serializable (serde) for export and storage.

pub mod arithmetic;
pub mod authorization;
pub mod context;
pub mod error;
pub mod events;
pub mod ledger;
pub mod nonces;
pub mod reservation;
pub mod token;

pub use context::{CallContext, ChainEnv};
pub use error::{ArithmeticKind, ErrorKind, LedgerError};
pub use events::{EventLog, LedgerEvent};
pub use reservation::{Reservation, ReservationStatus};
pub use token::{EthlessToken, SharedToken, TokenMetadata};
