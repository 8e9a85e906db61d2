// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ethless Protocol: Core Primitives
//!
//! The off-chain half of ethless token operations. A holder signs an
//! authorization; a relayer submits it and pays for execution; the ledger
//! recovers the signer and settles. This crate is everything both sides have
//! to agree on byte-for-byte.
//!
//! ## Architecture
//!
//! - **crypto**: Keccak hashing, packed/word encoders, secp256k1 keys and
//!   recoverable signatures.
//! - **message**: The canonical burn / transfer / reserve message families.
//! - **permit**: EIP-712 typed-data permits.
//! - **amount**: Parsing untrusted amounts and addresses at the boundary.
//! - **config**: Domain tags, wire constants, chain ids, genesis config.
//! - **logging**: `tracing` subscriber setup for hosts.
//!
//! ## Design Philosophy
//!
//! 1. A signature authorizes exactly one operation on one deployment.
//! 2. Every amount is a `U256`; nothing is ever rounded.
//! 3. Curve and hash code comes from audited crates, never from here.

pub mod amount;
pub mod config;
pub mod crypto;
pub mod logging;
pub mod message;
pub mod permit;

pub use alloy_primitives::{Address, B256, U256};
