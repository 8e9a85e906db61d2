//! # Recoverable Signatures
//!
//! secp256k1 ECDSA signatures in the 65-byte `r || s || v` layout wallets
//! produce, and recovery of the signing address from a digest.
//!
//! The ledger never stores public keys. It recovers the signer from each
//! authorization and compares the recovered address with the account the
//! caller claims to act for. Everything that can go wrong on the way (bad
//! length, bad `v`, zero scalars, high-s, no valid point) collapses into
//! [`SignatureError`], and the ledger collapses that into a single
//! "invalid signature" rejection.
//!
//! ## Strictness
//!
//! High-s signatures are rejected. For every valid `(r, s)` there is a twin
//! `(r, n - s)` that verifies too; accepting both would give every
//! authorization two distinct byte encodings.

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::address_from_verifying_key;
use crate::config::SIGNATURE_LENGTH;

/// Errors during signature parsing or recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("malformed signature scalars")]
    Malformed,

    #[error("non-canonical signature: s is in the upper half of the curve order")]
    HighS,

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("signer mismatch: expected {expected}, recovered {recovered}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },
}

/// A 65-byte recoverable ECDSA signature.
///
/// `v` is accepted in both the legacy `27/28` form and the raw `0/1`
/// recovery-id form; [`EthlessKeypair`](super::EthlessKeypair) always emits
/// `27/28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl RecoverableSignature {
    /// Assembles a signature from its split `(v, r, s)` form, the shape the
    /// permit entry point receives.
    pub fn from_parts(v: u8, r: B256, s: B256) -> Self {
        Self { r, s, v }
    }

    /// Parses the 65-byte `r || s || v` layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// Parses a hex string (optional `0x` prefix).
    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed).map_err(|_| SignatureError::Malformed)?;
        Self::from_bytes(&bytes)
    }

    /// Serializes to the 65-byte wire layout.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    /// `0x`-prefixed hex of the wire layout.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        let raw = match self.v {
            27 | 28 => self.v - 27,
            0 | 1 => self.v,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        RecoveryId::from_byte(raw).ok_or(SignatureError::InvalidRecoveryId(self.v))
    }

    /// Recovers the address that produced this signature over `digest`.
    pub fn recover(&self, digest: &B256) -> Result<Address, SignatureError> {
        let recovery_id = self.recovery_id()?;

        let mut scalars = [0u8; 64];
        scalars[..32].copy_from_slice(self.r.as_slice());
        scalars[32..].copy_from_slice(self.s.as_slice());
        let signature = Signature::from_slice(&scalars).map_err(|_| SignatureError::Malformed)?;

        // `normalize_s` only returns `Some` when s was high.
        if signature.normalize_s().is_some() {
            return Err(SignatureError::HighS);
        }

        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        Ok(address_from_verifying_key(&key))
    }
}

/// Recovers the signer of `digest` and checks it against `expected`.
pub fn verify_signer(
    digest: &B256,
    signature: &RecoverableSignature,
    expected: Address,
) -> Result<(), SignatureError> {
    let recovered = signature.recover(digest)?;
    if recovered != expected {
        return Err(SignatureError::SignerMismatch {
            expected,
            recovered,
        });
    }
    Ok(())
}
