//! # EIP-712 Permit and Typed Transfer
//!
//! Allowance approval by signature. The owner signs a typed `Permit` struct
//! off-chain; anyone may submit it, and the ledger sets the allowance as if
//! the owner had called `approve` directly.
//!
//! [`TransferAuthorization`] is the same construction for a plain transfer:
//! the sender signs a typed `Transfer` struct and the ledger moves the funds
//! as if the sender had called `transfer`. It carries no fee and draws its
//! nonce from the same per-owner counter as permits.
//!
//! Unlike the ethless families, permits use typed structured data
//! (EIP-712) rather than a packed personal message, and a strictly sequential
//! per-owner nonce rather than a free-form one. The digest is:
//!
//! ```text
//! keccak256(0x19 0x01 || domainSeparator || hashStruct(permit))
//! ```
//!
//! where the domain separator commits to the token name, the version string,
//! the chain id and the token contract address.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::config::{EIP712_DOMAIN_TYPE, EIP712_VERSION, PERMIT_TYPE, TRANSFER_TYPE};
use crate::crypto::{
    keccak, typed_data_hash, EthlessKeypair, KeyError, RecoverableSignature, SignatureError,
    WordEncoder,
};

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
pub fn domain_typehash() -> B256 {
    keccak(EIP712_DOMAIN_TYPE.as_bytes())
}

/// `keccak256("Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)")`
pub fn permit_typehash() -> B256 {
    keccak(PERMIT_TYPE.as_bytes())
}

/// `keccak256("Transfer(address sender,address recipient,uint256 amount,uint256 nonce,uint256 deadline)")`
pub fn transfer_typehash() -> B256 {
    keccak(TRANSFER_TYPE.as_bytes())
}

/// The EIP-712 signing domain of one token deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain for a token, using the fixed protocol version string.
    pub fn for_token(name: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: name.into(),
            version: EIP712_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    /// The domain separator.
    pub fn separator(&self) -> B256 {
        WordEncoder::new()
            .word(domain_typehash())
            .string(&self.name)
            .string(&self.version)
            .uint256(U256::from(self.chain_id))
            .address(self.verifying_contract)
            .hash()
    }
}

/// A permit authorization: `owner` allows `spender` to spend `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    /// Must equal the owner's current permit counter.
    pub nonce: U256,
    /// Unix timestamp; the permit is valid while `deadline > now`.
    pub deadline: U256,
}

impl Permit {
    pub fn struct_hash(&self) -> B256 {
        WordEncoder::new()
            .word(permit_typehash())
            .address(self.owner)
            .address(self.spender)
            .uint256(self.value)
            .uint256(self.nonce)
            .uint256(self.deadline)
            .hash()
    }

    /// The EIP-712 digest the owner signs.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        typed_data_hash(&domain.separator(), &self.struct_hash())
    }

    pub fn sign(
        &self,
        domain: &Eip712Domain,
        keypair: &EthlessKeypair,
    ) -> Result<RecoverableSignature, KeyError> {
        keypair.sign_prehash(&self.signing_hash(domain))
    }

    pub fn recover(
        &self,
        domain: &Eip712Domain,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        signature.recover(&self.signing_hash(domain))
    }
}

/// A typed transfer authorization: `sender` pays `amount` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAuthorization {
    pub sender: Address,
    pub recipient: Address,
    pub amount: U256,
    /// Must equal the sender's current counter, shared with permits.
    pub nonce: U256,
    /// Unix timestamp; valid while `deadline > now`.
    pub deadline: U256,
}

impl TransferAuthorization {
    pub fn struct_hash(&self) -> B256 {
        WordEncoder::new()
            .word(transfer_typehash())
            .address(self.sender)
            .address(self.recipient)
            .uint256(self.amount)
            .uint256(self.nonce)
            .uint256(self.deadline)
            .hash()
    }

    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        typed_data_hash(&domain.separator(), &self.struct_hash())
    }

    pub fn sign(
        &self,
        domain: &Eip712Domain,
        keypair: &EthlessKeypair,
    ) -> Result<RecoverableSignature, KeyError> {
        keypair.sign_prehash(&self.signing_hash(domain))
    }

    pub fn recover(
        &self,
        domain: &Eip712Domain,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        signature.recover(&self.signing_hash(domain))
    }
}
