//! # Ethless Message Families
//!
//! The canonical messages a holder signs to authorize a relayer-submitted
//! burn, transfer or reserve.
//!
//! Every message starts with the same three fields: a one-byte domain tag
//! naming the family, the chain id, and the contract address. The tag binds
//! a signature to one operation kind; the chain id and contract address bind
//! it to one deployment. Operation fields follow in a fixed order:
//!
//! ```text
//! Burn     (1): burner, amount, fee, nonce
//! Transfer (3): sender, recipient, amount, fee, nonce
//! Reserve  (4): sender, recipient, executor, amount, fee, nonce, expiryBlock
//! ```
//!
//! The fields are packed, hashed with Keccak-256, and the hash is wrapped in
//! the EIP-191 personal-message envelope before signing. That is exactly what
//! `signMessage(arrayify(solidityKeccak256(types, values)))` produces in
//! wallet tooling, so existing relayers interoperate unchanged.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::config::{DOMAIN_TAG_BURN, DOMAIN_TAG_RESERVE, DOMAIN_TAG_TRANSFER};
use crate::crypto::{
    eth_signed_message_hash, EthlessKeypair, KeyError, PackedEncoder, RecoverableSignature,
    SignatureError,
};

/// The operation family a message authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainTag {
    Burn,
    Transfer,
    Reserve,
}

impl DomainTag {
    /// The tag byte that leads the packed encoding.
    pub fn as_u8(self) -> u8 {
        match self {
            DomainTag::Burn => DOMAIN_TAG_BURN,
            DomainTag::Transfer => DOMAIN_TAG_TRANSFER,
            DomainTag::Reserve => DOMAIN_TAG_RESERVE,
        }
    }

    /// Parses a tag byte. Unknown and reserved tags return `None`.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            DOMAIN_TAG_BURN => Some(DomainTag::Burn),
            DOMAIN_TAG_TRANSFER => Some(DomainTag::Transfer),
            DOMAIN_TAG_RESERVE => Some(DomainTag::Reserve),
            _ => None,
        }
    }
}

impl std::fmt::Display for DomainTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainTag::Burn => write!(f, "Burn"),
            DomainTag::Transfer => write!(f, "Transfer"),
            DomainTag::Reserve => write!(f, "Reserve"),
        }
    }
}

/// A signed-authorization payload, one variant per family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthlessMessage {
    /// Burn `amount` from `burner`, paying `fee` to the submitter.
    Burn {
        burner: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
    },
    /// Move `amount` from `sender` to `recipient`, paying `fee` to the
    /// submitter.
    Transfer {
        sender: Address,
        recipient: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
    },
    /// Lock `amount + fee` from `sender` until `expiry_block`.
    Reserve {
        sender: Address,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        expiry_block: u64,
    },
}

impl EthlessMessage {
    /// The family this message belongs to.
    pub fn domain_tag(&self) -> DomainTag {
        match self {
            EthlessMessage::Burn { .. } => DomainTag::Burn,
            EthlessMessage::Transfer { .. } => DomainTag::Transfer,
            EthlessMessage::Reserve { .. } => DomainTag::Reserve,
        }
    }

    /// The account whose funds the message authorizes spending, i.e. the
    /// address the signature must recover to.
    pub fn signer(&self) -> Address {
        match self {
            EthlessMessage::Burn { burner, .. } => *burner,
            EthlessMessage::Transfer { sender, .. } => *sender,
            EthlessMessage::Reserve { sender, .. } => *sender,
        }
    }

    /// The caller-chosen replay-protection nonce.
    pub fn nonce(&self) -> U256 {
        match self {
            EthlessMessage::Burn { nonce, .. }
            | EthlessMessage::Transfer { nonce, .. }
            | EthlessMessage::Reserve { nonce, .. } => *nonce,
        }
    }

    /// Packed encoding of the full message, domain header included.
    pub fn encode_packed(&self, chain_id: u64, contract: Address) -> Vec<u8> {
        let header = PackedEncoder::new()
            .uint8(self.domain_tag().as_u8())
            .uint256(U256::from(chain_id))
            .address(contract);

        let encoder = match self {
            EthlessMessage::Burn {
                burner,
                amount,
                fee,
                nonce,
            } => header
                .address(*burner)
                .uint256(*amount)
                .uint256(*fee)
                .uint256(*nonce),
            EthlessMessage::Transfer {
                sender,
                recipient,
                amount,
                fee,
                nonce,
            } => header
                .address(*sender)
                .address(*recipient)
                .uint256(*amount)
                .uint256(*fee)
                .uint256(*nonce),
            EthlessMessage::Reserve {
                sender,
                recipient,
                executor,
                amount,
                fee,
                nonce,
                expiry_block,
            } => header
                .address(*sender)
                .address(*recipient)
                .address(*executor)
                .uint256(*amount)
                .uint256(*fee)
                .uint256(*nonce)
                .uint256(U256::from(*expiry_block)),
        };
        encoder.finish()
    }

    /// `keccak256(encode_packed(..))`, the hash the holder is asked to sign.
    pub fn message_hash(&self, chain_id: u64, contract: Address) -> B256 {
        crate::crypto::keccak(&self.encode_packed(chain_id, contract))
    }

    /// The digest actually signed: the message hash in its EIP-191 envelope.
    pub fn signing_hash(&self, chain_id: u64, contract: Address) -> B256 {
        eth_signed_message_hash(&self.message_hash(chain_id, contract))
    }

    /// Signs the message for the given deployment.
    pub fn sign(
        &self,
        chain_id: u64,
        contract: Address,
        keypair: &EthlessKeypair,
    ) -> Result<RecoverableSignature, KeyError> {
        keypair.sign_prehash(&self.signing_hash(chain_id, contract))
    }

    /// Recovers the address that signed this message for the given deployment.
    pub fn recover(
        &self,
        chain_id: u64,
        contract: Address,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        signature.recover(&self.signing_hash(chain_id, contract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CHAIN_ID_LOCAL;

    fn contract() -> Address {
        Address::repeat_byte(0xC0)
    }

    fn transfer(sender: Address) -> EthlessMessage {
        EthlessMessage::Transfer {
            sender,
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(100u64),
            fee: U256::from(10u64),
            nonce: U256::from(7u64),
        }
    }

    #[test]
    fn test_packed_layout_lengths() {
        let burn = EthlessMessage::Burn {
            burner: Address::repeat_byte(1),
            amount: U256::from(1u64),
            fee: U256::ZERO,
            nonce: U256::ZERO,
        };
        // tag + chainId + contract + burner + 3 words
        assert_eq!(burn.encode_packed(1, contract()).len(), 1 + 32 + 20 + 20 + 96);

        let reserve = EthlessMessage::Reserve {
            sender: Address::repeat_byte(1),
            recipient: Address::repeat_byte(2),
            executor: Address::repeat_byte(3),
            amount: U256::from(1u64),
            fee: U256::ZERO,
            nonce: U256::ZERO,
            expiry_block: 10,
        };
        assert_eq!(
            reserve.encode_packed(1, contract()).len(),
            1 + 32 + 20 + 60 + 128
        );
    }

    #[test]
    fn test_leading_byte_is_domain_tag() {
        let msg = transfer(Address::repeat_byte(1));
        assert_eq!(msg.encode_packed(1, contract())[0], DOMAIN_TAG_TRANSFER);
    }

    #[test]
    fn test_domain_tag_roundtrip() {
        for tag in [DomainTag::Burn, DomainTag::Transfer, DomainTag::Reserve] {
            assert_eq!(DomainTag::from_u8(tag.as_u8()), Some(tag));
        }
        assert_eq!(DomainTag::from_u8(2), None);
    }

    #[test]
    fn test_sign_and_recover_for_deployment() {
        let kp = EthlessKeypair::generate();
        let msg = transfer(kp.address());
        let sig = msg.sign(CHAIN_ID_LOCAL, contract(), &kp).unwrap();
        assert_eq!(
            msg.recover(CHAIN_ID_LOCAL, contract(), &sig).unwrap(),
            kp.address()
        );
    }

    #[test]
    fn test_signature_bound_to_chain_and_contract() {
        let kp = EthlessKeypair::generate();
        let msg = transfer(kp.address());
        let sig = msg.sign(CHAIN_ID_LOCAL, contract(), &kp).unwrap();

        let other_chain = msg.recover(1, contract(), &sig);
        assert!(other_chain.map(|a| a != kp.address()).unwrap_or(true));

        let other_contract = msg.recover(CHAIN_ID_LOCAL, Address::repeat_byte(0xC1), &sig);
        assert!(other_contract.map(|a| a != kp.address()).unwrap_or(true));
    }

    #[test]
    fn test_families_never_share_a_digest() {
        // Same numeric fields, different family: the tag must separate them.
        let burn = EthlessMessage::Burn {
            burner: Address::repeat_byte(1),
            amount: U256::from(5u64),
            fee: U256::from(1u64),
            nonce: U256::from(9u64),
        };
        let transfer = EthlessMessage::Transfer {
            sender: Address::repeat_byte(1),
            recipient: Address::repeat_byte(1),
            amount: U256::from(5u64),
            fee: U256::from(1u64),
            nonce: U256::from(9u64),
        };
        assert_ne!(
            burn.signing_hash(1, contract()),
            transfer.signing_hash(1, contract())
        );
    }

    #[test]
    fn test_accessors() {
        let kp = EthlessKeypair::generate();
        let msg = transfer(kp.address());
        assert_eq!(msg.signer(), kp.address());
        assert_eq!(msg.nonce(), U256::from(7u64));
        assert_eq!(msg.domain_tag(), DomainTag::Transfer);
        assert_eq!(msg.domain_tag().to_string(), "Transfer");
    }
}
