//! Shared harness for the token integration tests: a deployed token, four
//! deterministic accounts, and a mock chain whose block height and clock the
//! test advances by hand.

#![allow(dead_code)]

use ethless_contracts::{CallContext, ChainEnv, EthlessToken};
use ethless_protocol::config::{TokenConfig, CHAIN_ID_LOCAL};
use ethless_protocol::crypto::{EthlessKeypair, RecoverableSignature};
use ethless_protocol::logging::{try_init_logging, LogFormat};
use ethless_protocol::message::EthlessMessage;
use ethless_protocol::permit::{Permit, TransferAuthorization};
use ethless_protocol::{Address, U256};

pub const NAME: &str = "mini";
pub const SYMBOL: &str = "mini";
pub const GENESIS_BLOCK: u64 = 100;
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub fn contract_address() -> Address {
    Address::repeat_byte(0xC0)
}

pub fn env() -> ChainEnv {
    ChainEnv {
        chain_id: CHAIN_ID_LOCAL,
        contract_address: contract_address(),
    }
}

/// Deterministic keypair; `seed` must be non-zero.
pub fn keypair(seed: u8) -> EthlessKeypair {
    EthlessKeypair::from_bytes(&[seed; 32]).expect("valid test key")
}

/// `100_000_000_000` whole tokens at 18 decimals.
pub fn default_supply() -> U256 {
    U256::from(100_000_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
}

pub struct Harness {
    pub token: EthlessToken,
    pub owner: EthlessKeypair,
    pub user1: EthlessKeypair,
    pub user2: EthlessKeypair,
    pub user3: EthlessKeypair,
    pub block: u64,
    pub timestamp: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_supply(default_supply())
    }

    pub fn with_supply(supply: U256) -> Self {
        let _ = try_init_logging("warn", LogFormat::Pretty);
        let owner = keypair(1);
        let config = TokenConfig {
            name: NAME.into(),
            symbol: SYMBOL.into(),
            total_supply: supply,
        };
        let token =
            EthlessToken::from_config(env(), owner.address(), &config).expect("initialize");
        Self {
            token,
            owner,
            user1: keypair(2),
            user2: keypair(3),
            user3: keypair(4),
            block: GENESIS_BLOCK,
            timestamp: GENESIS_TIMESTAMP,
        }
    }

    /// Call context for `caller` at the current block.
    pub fn ctx(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.block, self.timestamp)
    }

    /// Mines `blocks` blocks, 12 seconds apart.
    pub fn advance(&mut self, blocks: u64) {
        self.block += blocks;
        self.timestamp += blocks * 12;
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.token.balance_of(account)
    }

    pub fn sign(&self, signer: &EthlessKeypair, message: &EthlessMessage) -> RecoverableSignature {
        message
            .sign(CHAIN_ID_LOCAL, contract_address(), signer)
            .expect("sign message")
    }

    pub fn sign_permit(&self, signer: &EthlessKeypair, permit: &Permit) -> RecoverableSignature {
        permit
            .sign(&self.token.domain(), signer)
            .expect("sign permit")
    }

    pub fn sign_transfer(
        &self,
        signer: &EthlessKeypair,
        transfer: &TransferAuthorization,
    ) -> RecoverableSignature {
        transfer
            .sign(&self.token.domain(), signer)
            .expect("sign typed transfer")
    }

    /// Signs and submits a reserve from `sender`, relayed by `relayer`.
    #[allow(clippy::too_many_arguments)]
    pub fn reserve(
        &mut self,
        relayer: Address,
        sender: &EthlessKeypair,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        expiry_block: u64,
    ) -> Result<(), ethless_contracts::LedgerError> {
        let message = EthlessMessage::Reserve {
            sender: sender.address(),
            recipient,
            executor,
            amount,
            fee,
            nonce,
            expiry_block,
        };
        let sig = self.sign(sender, &message);
        let ctx = self.ctx(relayer);
        self.token.submit(&ctx, &message, &sig)
    }

    /// balances + active reservations, which must always equal supply.
    pub fn accounted(&self) -> U256 {
        let balances = self.token.ledger().sum_of_balances().expect("balances");
        let reserved = self.token.reservations().total_active().expect("reserved");
        balances + reserved
    }
}

pub fn units(n: u64) -> U256 {
    U256::from(n)
}
