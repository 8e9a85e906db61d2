//! # Key Management
//!
//! secp256k1 keypairs for token holders.
//!
//! Holders never hand their key to the ledger. They sign an authorization
//! off-chain and a relayer submits it, so the only thing the ledger ever sees
//! is the signature and the 20-byte address it recovers to. This module is
//! what the signing side (wallets, relayer tooling, tests) uses to produce
//! those signatures.
//!
//! ## Security considerations
//!
//! - Keys are generated from `OsRng`.
//! - Signing is RFC 6979 deterministic, so a weak RNG at signing time cannot
//!   leak the key.
//! - Signatures are always emitted in low-s form; the verifier rejects
//!   high-s signatures, so the two halves agree on malleability.
//! - Key bytes are never logged and never appear in `Debug` output.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use super::signatures::RecoverableSignature;
use crate::config::SECRET_KEY_LENGTH;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("signing failed")]
    SigningFailed,
}

/// Derives the account address of a public key: the low 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag; the address commits to X || Y only.
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

/// A holder's secp256k1 keypair.
///
/// `EthlessKeypair` intentionally does NOT implement `Serialize`. Exporting
/// a private key should be a deliberate act; use
/// [`secret_key_bytes`](Self::secret_key_bytes) explicitly.
///
/// # Examples
///
/// ```
/// use ethless_protocol::crypto::{keccak, EthlessKeypair};
///
/// let kp = EthlessKeypair::generate();
/// let digest = keccak(b"authorize 100 tokens");
/// let sig = kp.sign_prehash(&digest).unwrap();
/// assert_eq!(sig.recover(&digest).unwrap(), kp.address());
/// ```
#[derive(Clone)]
pub struct EthlessKeypair {
    signing_key: SigningKey,
}

impl EthlessKeypair {
    /// Generates a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Reconstructs a keypair from a raw 32-byte secret scalar.
    ///
    /// Fails for the zero scalar and for values at or above the curve order.
    pub fn from_bytes(secret: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Reconstructs a keypair from a hex-encoded secret key, with or without
    /// a `0x` prefix. Devnet convenience; real deployments keep keys in a
    /// wallet.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&arr)
    }

    /// The account address this keypair controls.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Returns the public verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs a 32-byte digest and returns a recoverable signature.
    ///
    /// The digest is signed as-is. Callers are responsible for applying the
    /// right envelope first (EIP-191 for ethless messages, EIP-712 for
    /// permits); the message builders in [`crate::message`] and
    /// [`crate::permit`] do that for you.
    pub fn sign_prehash(&self, digest: &B256) -> Result<RecoverableSignature, KeyError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|_| KeyError::SigningFailed)?;

        let (r, s) = signature.split_bytes();
        Ok(RecoverableSignature::from_parts(
            27 + recovery_id.to_byte(),
            B256::from_slice(&r),
            B256::from_slice(&s),
        ))
    }

    /// Exports the raw 32-byte secret key material. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes().into()
    }
}

impl fmt::Debug for EthlessKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthlessKeypair(address={})", self.address())
    }
}

impl PartialEq for EthlessKeypair {
    /// Keypairs compare by address, never by secret material.
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for EthlessKeypair {}
