//! # Protocol Configuration & Constants
//!
//! Every magic number the ethless wire format depends on lives here. The
//! relayer tooling that builds and signs messages off-chain must agree with
//! these byte-for-byte, so treat a change here as a breaking change to every
//! signature ever produced.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message Families
// ---------------------------------------------------------------------------

/// Domain tag for ethless burn authorizations.
pub const DOMAIN_TAG_BURN: u8 = 1;

/// Domain tag 2 belonged to the mint family, which the ledger never exposes.
/// It stays reserved so a mint signature can never be replayed as anything else.
pub const DOMAIN_TAG_RESERVED_MINT: u8 = 2;

/// Domain tag for ethless transfer authorizations.
pub const DOMAIN_TAG_TRANSFER: u8 = 3;

/// Domain tag for ethless reserve authorizations.
pub const DOMAIN_TAG_RESERVE: u8 = 4;

/// Prefix applied to the 32-byte message hash before signing (EIP-191,
/// version `0x45`). Wallets add it automatically in `personal_sign`.
pub const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Leading bytes of an EIP-712 typed-data digest.
pub const EIP712_DIGEST_PREFIX: [u8; 2] = [0x19, 0x01];

/// EIP-712 domain type string. Field order is part of the hash.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// EIP-2612 permit struct type string.
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// Typed signed-transfer struct type string. Shares the permit counter.
pub const TRANSFER_TYPE: &str =
    "Transfer(address sender,address recipient,uint256 amount,uint256 nonce,uint256 deadline)";

/// Version string baked into the EIP-712 domain separator.
pub const EIP712_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 ECDSA with public-key recovery. The only scheme the ledger
/// accepts; there is no negotiation.
pub const SIGNING_ALGORITHM: &str = "secp256k1-ecdsa-recoverable";

/// Raw secret key length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Recoverable signature length: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Account addresses are the low 20 bytes of `keccak256(pubkey)`.
pub const ADDRESS_LENGTH: usize = 20;

/// Keccak-256 digest length.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Token Parameters
// ---------------------------------------------------------------------------

/// Decimal places reported by every token instance.
pub const TOKEN_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// Ethereum mainnet.
pub const CHAIN_ID_MAINNET: u64 = 1;

/// Sepolia testnet.
pub const CHAIN_ID_SEPOLIA: u64 = 11_155_111;

/// Local development chain (hardhat / anvil default).
pub const CHAIN_ID_LOCAL: u64 = 31_337;

/// Returns a friendly name for a chain ID, mainly for logging.
pub fn chain_name(chain_id: u64) -> String {
    match chain_id {
        CHAIN_ID_MAINNET => "mainnet".to_string(),
        CHAIN_ID_SEPOLIA => "sepolia".to_string(),
        CHAIN_ID_LOCAL => "local".to_string(),
        other => format!("chain-{other}"),
    }
}

// ---------------------------------------------------------------------------
// Genesis Configuration
// ---------------------------------------------------------------------------

/// Genesis parameters for a token instance.
///
/// Deployment tooling usually keeps these in a JSON file next to the
/// deployment script; [`TokenConfig::from_json`] reads that shape directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token name. Doubles as the EIP-712 domain name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Supply minted to the owner at initialization, in base units.
    pub total_supply: U256,
}

impl TokenConfig {
    /// Parses a config from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_tags_are_distinct() {
        let tags = [
            DOMAIN_TAG_BURN,
            DOMAIN_TAG_RESERVED_MINT,
            DOMAIN_TAG_TRANSFER,
            DOMAIN_TAG_RESERVE,
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_signed_message_prefix_length() {
        // "\x19Ethereum Signed Message:\n32" is 28 bytes.
        assert_eq!(ETH_SIGNED_MESSAGE_PREFIX.len(), 28);
        assert!(ETH_SIGNED_MESSAGE_PREFIX.ends_with(b"32"));
    }

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SECRET_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 65);
        assert_eq!(ADDRESS_LENGTH, 20);
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
    }

    #[test]
    fn test_chain_name_formatting() {
        assert_eq!(chain_name(CHAIN_ID_MAINNET), "mainnet");
        assert_eq!(chain_name(CHAIN_ID_LOCAL), "local");
        assert_eq!(chain_name(42), "chain-42");
    }

    #[test]
    fn test_token_config_from_json() {
        let json = r#"{"name":"mini","symbol":"mini","total_supply":"0x3e8"}"#;
        let config = TokenConfig::from_json(json).unwrap();
        assert_eq!(config.name, "mini");
        assert_eq!(config.total_supply, U256::from(1000u64));
    }

    #[test]
    fn test_token_config_rejects_missing_fields() {
        assert!(TokenConfig::from_json(r#"{"name":"mini"}"#).is_err());
    }
}
