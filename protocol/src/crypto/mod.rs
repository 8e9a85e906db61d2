//! # Cryptographic Primitives
//!
//! Everything the ledger needs to authenticate an off-chain authorization:
//!
//! - **Keccak-256** for message hashing, plus the packed and word encoders
//!   the message layouts are built from.
//! - **secp256k1 ECDSA with recovery** for signatures. The signer's address
//!   is recovered from the signature rather than looked up.
//!
//! Nothing here is hand-rolled: hashing comes from `alloy-primitives`,
//! curve arithmetic from `k256`. These modules only fix the byte layouts
//! and the strictness rules.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{eth_signed_message_hash, keccak, typed_data_hash, PackedEncoder, WordEncoder};
pub use keys::{address_from_verifying_key, EthlessKeypair, KeyError};
pub use signatures::{verify_signer, RecoverableSignature, SignatureError};
