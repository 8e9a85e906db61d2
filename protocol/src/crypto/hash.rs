//! # Hashing & Encoding Utilities
//!
//! Keccak-256 plus the two byte layouts the signed messages are built from:
//!
//! - **Packed encoding**: every value written at its natural width with no
//!   padding (`uint8` is 1 byte, `address` 20, `uint256` 32). This is what
//!   the ethless message families hash. It is only unambiguous because every
//!   field in those layouts has a fixed width; never add a dynamic field to a
//!   packed layout.
//!
//! - **Word encoding**: every value left-padded to a 32-byte word. EIP-712
//!   struct hashes and domain separators use this.
//!
//! Both encoders are tiny builders over a `Vec<u8>` so call sites read like
//! the field list they encode.

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::config::{EIP712_DIGEST_PREFIX, ETH_SIGNED_MESSAGE_PREFIX};

/// Keccak-256 of arbitrary bytes.
///
/// # Example
///
/// ```
/// use ethless_protocol::crypto::keccak;
///
/// let digest = keccak(b"ethless");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn keccak(data: &[u8]) -> B256 {
    keccak256(data)
}

/// Wraps a 32-byte message hash in the EIP-191 personal-message envelope:
/// `keccak256("\x19Ethereum Signed Message:\n32" || hash)`.
///
/// This is the digest a wallet actually signs when asked to `signMessage`
/// over raw hash bytes, so it is the digest the verifier recovers against.
pub fn eth_signed_message_hash(message_hash: &B256) -> B256 {
    let mut preimage = Vec::with_capacity(ETH_SIGNED_MESSAGE_PREFIX.len() + 32);
    preimage.extend_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    preimage.extend_from_slice(message_hash.as_slice());
    keccak256(&preimage)
}

/// EIP-712 digest: `keccak256(0x19 0x01 || domain_separator || struct_hash)`.
pub fn typed_data_hash(domain_separator: &B256, struct_hash: &B256) -> B256 {
    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&EIP712_DIGEST_PREFIX);
    preimage.extend_from_slice(domain_separator.as_slice());
    preimage.extend_from_slice(struct_hash.as_slice());
    keccak256(&preimage)
}

// ---------------------------------------------------------------------------
// Packed encoding
// ---------------------------------------------------------------------------

/// Builder for tightly packed encodings.
#[derive(Debug, Default, Clone)]
pub struct PackedEncoder {
    buf: Vec<u8>,
}

impl PackedEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single byte (`uint8`).
    pub fn uint8(mut self, value: u8) -> Self {
        self.buf.push(value);
        self
    }

    /// Appends a big-endian 32-byte `uint256`.
    pub fn uint256(mut self, value: U256) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Appends a 20-byte address.
    pub fn address(mut self, value: Address) -> Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Returns the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Hashes the encoded bytes with Keccak-256.
    pub fn hash(self) -> B256 {
        keccak256(&self.buf)
    }
}

// ---------------------------------------------------------------------------
// Word encoding
// ---------------------------------------------------------------------------

/// Builder for 32-byte-word encodings (the static subset of `abi.encode`).
#[derive(Debug, Default, Clone)]
pub struct WordEncoder {
    buf: Vec<u8>,
}

impl WordEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw 32-byte word (typehashes, hashed strings).
    pub fn word(mut self, value: B256) -> Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Appends a `uint256` word.
    pub fn uint256(mut self, value: U256) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Appends an address left-padded to 32 bytes.
    pub fn address(mut self, value: Address) -> Self {
        self.buf.extend_from_slice(value.into_word().as_slice());
        self
    }

    /// Appends `keccak256(value)`, the EIP-712 encoding of a `string`.
    pub fn string(self, value: &str) -> Self {
        let hashed = keccak256(value.as_bytes());
        self.word(hashed)
    }

    /// Returns the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Hashes the encoded bytes with Keccak-256.
    pub fn hash(self) -> B256 {
        keccak256(&self.buf)
    }
}
