//! # Ethless Token
//!
//! The token contract: an ERC-20 ledger whose holders can also act through
//! signed authorizations submitted by someone else.
//!
//! Three ways in:
//!
//! - **Direct calls** (`transfer`, `approve`, `burn`, ...). The caller in the
//!   [`CallContext`] is the acting account.
//! - **Ethless calls** (`ethless_transfer`, `ethless_burn`, `reserve`). The
//!   caller is a relayer. The acting account is whoever signed the message,
//!   and the relayer collects the fee.
//! - **Permit**. An EIP-712 signed approval, submitted by anyone.
//!
//! Reservations then settle through `execute` or `reclaim`.
//!
//! ## Atomicity
//!
//! Every mutating call runs as one transaction: if it fails,
//! ledger writes are undone and events emitted during the call are dropped.
//! The one deliberate exception is the nonce registry. A nonce consumed by an
//! admitted authorization stays consumed even when the ledger operation that
//! follows is rejected.

use alloy_primitives::{Address, B256, U256};
use ethless_protocol::config::{TokenConfig, TOKEN_DECIMALS};
use ethless_protocol::crypto::RecoverableSignature;
use ethless_protocol::message::EthlessMessage;
use ethless_protocol::permit::{Eip712Domain, Permit, TransferAuthorization};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::arithmetic::{checked_add, require_positive};
use crate::authorization::{authorize, authorize_permit, authorize_transfer};
use crate::context::{CallContext, ChainEnv};
use crate::error::LedgerError;
use crate::events::{EventLog, LedgerEvent};
use crate::ledger::Ledger;
use crate::nonces::NonceRegistry;
use crate::reservation::{Reservation, ReservationBook, ReservationStatus};

/// A token instance shared between threads. The write lock serializes calls.
pub type SharedToken = Arc<RwLock<EthlessToken>>;

/// Descriptive token data fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
}

/// The token contract state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthlessToken {
    env: ChainEnv,
    metadata: Option<TokenMetadata>,
    ledger: Ledger,
    nonces: NonceRegistry,
    reservations: ReservationBook,
    events: EventLog,
}

impl EthlessToken {
    /// A deployed but uninitialized token. Every mutating call fails with
    /// `NotInitialized` until [`initialize`](Self::initialize) succeeds.
    pub fn new(env: ChainEnv) -> Self {
        Self {
            env,
            metadata: None,
            ledger: Ledger::new(),
            nonces: NonceRegistry::new(),
            reservations: ReservationBook::new(),
            events: EventLog::new(),
        }
    }

    /// Deploys and initializes in one step.
    pub fn from_config(
        env: ChainEnv,
        owner: Address,
        config: &TokenConfig,
    ) -> Result<Self, LedgerError> {
        let mut token = Self::new(env);
        token.initialize(owner, &config.name, &config.symbol, config.total_supply)?;
        Ok(token)
    }

    /// Wraps the token for shared use.
    pub fn into_shared(self) -> SharedToken {
        Arc::new(RwLock::new(self))
    }

    /// Sets metadata and mints `total_supply` to `owner`. Callable once.
    pub fn initialize(
        &mut self,
        owner: Address,
        name: &str,
        symbol: &str,
        total_supply: U256,
    ) -> Result<(), LedgerError> {
        if self.metadata.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }
        self.transact("initialize", |token| {
            token.ledger.mint(owner, total_supply, &mut token.events)?;
            token.metadata = Some(TokenMetadata {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals: TOKEN_DECIMALS,
                owner,
            });
            Ok(())
        })?;
        info!(
            %owner,
            name,
            symbol,
            %total_supply,
            chain = %ethless_protocol::config::chain_name(self.env.chain_id),
            "token initialized"
        );
        Ok(())
    }

    // ---------- Views ----------

    pub fn env(&self) -> &ChainEnv {
        &self.env
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Option<&TokenMetadata> {
        self.metadata.as_ref()
    }

    pub fn name(&self) -> &str {
        self.metadata.as_ref().map_or("", |m| m.name.as_str())
    }

    pub fn symbol(&self) -> &str {
        self.metadata.as_ref().map_or("", |m| m.symbol.as_str())
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    pub fn owner(&self) -> Option<Address> {
        self.metadata.as_ref().map(|m| m.owner)
    }

    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    /// Spendable balance. Funds locked in active reservations are excluded.
    pub fn balance_of(&self, account: Address) -> U256 {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.allowance(owner, spender)
    }

    /// The nonce the owner's next permit must be signed over.
    pub fn nonces(&self, owner: Address) -> U256 {
        self.nonces.permit_nonce(owner)
    }

    /// Whether a burn/transfer/reserve nonce has been consumed.
    pub fn is_nonce_used(&self, account: Address, nonce: U256) -> bool {
        self.nonces.is_used(account, nonce)
    }

    pub fn get_reservation(&self, reserver: Address, nonce: U256) -> Option<&Reservation> {
        self.reservations.get(reserver, nonce)
    }

    /// Total `amount + fee` locked in the account's active reservations.
    pub fn reserve_of(&self, account: Address) -> Result<U256, LedgerError> {
        self.reservations.reserve_of(account)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn reservations(&self) -> &ReservationBook {
        &self.reservations
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The EIP-712 domain permits must be signed for.
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::for_token(self.name(), self.env.chain_id, self.env.contract_address)
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain().separator()
    }

    // ---------- Direct ERC-20 calls ----------

    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.call("transfer", |token| {
            token
                .ledger
                .transfer(ctx.caller, to, amount, &mut token.events)
        })
    }

    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.call("transfer_from", |token| {
            token
                .ledger
                .transfer_from(ctx.caller, from, to, amount, &mut token.events)
        })
    }

    pub fn approve(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.call("approve", |token| {
            token
                .ledger
                .approve(ctx.caller, spender, amount, &mut token.events)
        })
    }

    pub fn increase_allowance(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        delta: U256,
    ) -> Result<U256, LedgerError> {
        self.call("increase_allowance", |token| {
            token
                .ledger
                .increase_allowance(ctx.caller, spender, delta, &mut token.events)
        })
    }

    pub fn decrease_allowance(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        delta: U256,
    ) -> Result<U256, LedgerError> {
        self.call("decrease_allowance", |token| {
            token
                .ledger
                .decrease_allowance(ctx.caller, spender, delta, &mut token.events)
        })
    }

    pub fn burn(&mut self, ctx: &CallContext, amount: U256) -> Result<(), LedgerError> {
        self.call("burn", |token| {
            token.ledger.burn(ctx.caller, amount, &mut token.events)
        })
    }

    pub fn burn_from(
        &mut self,
        ctx: &CallContext,
        holder: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.call("burn_from", |token| {
            token
                .ledger
                .burn_from(ctx.caller, holder, amount, &mut token.events)
        })
    }

    // ---------- Permit ----------

    /// EIP-2612 `permit`. The signature must cover the owner's current
    /// counter, so a replayed permit fails signature verification.
    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        ctx: &CallContext,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        v: u8,
        r: B256,
        s: B256,
    ) -> Result<(), LedgerError> {
        let permit = Permit {
            owner,
            spender,
            value,
            nonce: self.nonces.permit_nonce(owner),
            deadline,
        };
        self.submit_permit(ctx, &permit, &RecoverableSignature::from_parts(v, r, s))
    }

    /// Permit with an explicit nonce. A nonce other than the owner's
    /// current counter fails with `InvalidNonce`.
    pub fn submit_permit(
        &mut self,
        ctx: &CallContext,
        permit: &Permit,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        self.call("permit", |token| {
            let domain = token.domain();
            authorize_permit(&domain, &token.nonces, permit, signature, ctx.timestamp)?;
            token.ledger.approve(
                permit.owner,
                permit.spender,
                permit.value,
                &mut token.events,
            )?;
            token.nonces.use_permit_nonce(permit.owner, permit.nonce)?;
            debug!(owner = %permit.owner, spender = %permit.spender, value = %permit.value, relayer = %ctx.caller, "permit");
            Ok(())
        })
    }

    // ---------- Typed transfer ----------

    /// Transfer on the sender's EIP-712 signature, with no fee. The
    /// signature must cover the sender's current counter, so a replay fails
    /// signature verification.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_with_signature(
        &mut self,
        ctx: &CallContext,
        sender: Address,
        recipient: Address,
        amount: U256,
        deadline: U256,
        v: u8,
        r: B256,
        s: B256,
    ) -> Result<(), LedgerError> {
        let transfer = TransferAuthorization {
            sender,
            recipient,
            amount,
            nonce: self.nonces.permit_nonce(sender),
            deadline,
        };
        self.submit_transfer_authorization(ctx, &transfer, &RecoverableSignature::from_parts(v, r, s))
    }

    /// Typed transfer with an explicit nonce. A nonce other than the
    /// sender's current counter fails with `InvalidNonce`.
    pub fn submit_transfer_authorization(
        &mut self,
        ctx: &CallContext,
        transfer: &TransferAuthorization,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        self.call("transfer_with_signature", |token| {
            let domain = token.domain();
            authorize_transfer(&domain, &token.nonces, transfer, signature, ctx.timestamp)?;
            token.ledger.transfer(
                transfer.sender,
                transfer.recipient,
                transfer.amount,
                &mut token.events,
            )?;
            token.nonces.use_permit_nonce(transfer.sender, transfer.nonce)?;
            debug!(sender = %transfer.sender, recipient = %transfer.recipient, amount = %transfer.amount, relayer = %ctx.caller, "typed transfer");
            Ok(())
        })
    }

    // ---------- Ethless calls ----------

    /// Moves `amount` from `sender` to `recipient` and `fee` from `sender`
    /// to the caller, on `sender`'s signature.
    #[allow(clippy::too_many_arguments)]
    pub fn ethless_transfer(
        &mut self,
        ctx: &CallContext,
        sender: Address,
        recipient: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        let message = EthlessMessage::Transfer {
            sender,
            recipient,
            amount,
            fee,
            nonce,
        };
        self.submit(ctx, &message, signature)
    }

    /// Burns `amount` of `burner`'s balance and pays `fee` to the caller, on
    /// `burner`'s signature.
    pub fn ethless_burn(
        &mut self,
        ctx: &CallContext,
        burner: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        let message = EthlessMessage::Burn {
            burner,
            amount,
            fee,
            nonce,
        };
        self.submit(ctx, &message, signature)
    }

    /// Locks `amount + fee` of `sender`'s balance until `expiry_block`, on
    /// `sender`'s signature.
    #[allow(clippy::too_many_arguments)]
    pub fn reserve(
        &mut self,
        ctx: &CallContext,
        sender: Address,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        expiry_block: u64,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        let message = EthlessMessage::Reserve {
            sender,
            recipient,
            executor,
            amount,
            fee,
            nonce,
            expiry_block,
        };
        self.submit(ctx, &message, signature)
    }

    /// Admits a signed message and applies it. Entry point for relayers
    /// that already hold a decoded [`EthlessMessage`].
    pub fn submit(
        &mut self,
        ctx: &CallContext,
        message: &EthlessMessage,
        signature: &RecoverableSignature,
    ) -> Result<(), LedgerError> {
        self.require_initialized()?;
        // Admission is outside `transact`: a consumed nonce survives a
        // rejected ledger operation.
        let signer = authorize(&self.env, &mut self.nonces, message, signature)?;

        self.transact("submit", |token| match *message {
            EthlessMessage::Transfer {
                recipient,
                amount,
                fee,
                ..
            } => token.apply_transfer(ctx, signer, recipient, amount, fee),
            EthlessMessage::Burn { amount, fee, .. } => token.apply_burn(ctx, signer, amount, fee),
            EthlessMessage::Reserve {
                recipient,
                executor,
                amount,
                fee,
                nonce,
                expiry_block,
                ..
            } => token.apply_reserve(ctx, signer, recipient, executor, amount, fee, nonce, expiry_block),
        })
    }

    fn apply_transfer(
        &mut self,
        ctx: &CallContext,
        sender: Address,
        recipient: Address,
        amount: U256,
        fee: U256,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        if recipient.is_zero() {
            return Err(LedgerError::TransferToZeroAddress);
        }
        let total = checked_add(amount, fee)?;
        self.ledger.require_balance(sender, total)?;

        self.ledger
            .move_funds(sender, recipient, amount, &mut self.events)?;
        self.ledger
            .move_funds(sender, ctx.caller, fee, &mut self.events)?;
        debug!(%sender, %recipient, %amount, %fee, relayer = %ctx.caller, "ethless transfer");
        Ok(())
    }

    fn apply_burn(
        &mut self,
        ctx: &CallContext,
        burner: Address,
        amount: U256,
        fee: U256,
    ) -> Result<(), LedgerError> {
        require_positive(amount)?;
        let total = checked_add(amount, fee)?;
        self.ledger.require_balance(burner, total)?;

        self.ledger.burn(burner, amount, &mut self.events)?;
        self.ledger
            .move_funds(burner, ctx.caller, fee, &mut self.events)?;
        debug!(%burner, %amount, %fee, relayer = %ctx.caller, "ethless burn");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_reserve(
        &mut self,
        ctx: &CallContext,
        reserver: Address,
        recipient: Address,
        executor: Address,
        amount: U256,
        fee: U256,
        nonce: U256,
        expiry_block: u64,
    ) -> Result<(), LedgerError> {
        if expiry_block <= ctx.block_number {
            return Err(LedgerError::DeadlineNotInFuture {
                expiry_block,
                current_block: ctx.block_number,
            });
        }
        let total = checked_add(amount, fee)?;
        let balance = self.ledger.balance_of(reserver);
        if total > balance {
            return Err(LedgerError::ReserveExceedsBalance {
                required: total,
                balance,
            });
        }

        self.ledger.debit(reserver, total)?;
        self.reservations.insert(Reservation {
            reserver,
            recipient,
            executor,
            amount,
            fee,
            nonce,
            expiry_block,
            status: ReservationStatus::Active,
        })?;
        self.events.push(LedgerEvent::ReservationCreated {
            reserver,
            recipient,
            executor,
            amount,
            fee,
            nonce,
            expiry_block,
        });
        info!(%reserver, %nonce, %amount, %fee, expiry_block, "reservation created");
        Ok(())
    }

    // ---------- Settlement ----------

    /// Pays an active reservation out: `amount` to the recipient, `fee` to
    /// the caller.
    pub fn execute(
        &mut self,
        ctx: &CallContext,
        reserver: Address,
        nonce: U256,
    ) -> Result<(), LedgerError> {
        self.call("execute", |token| {
            let reservation = token.reservations.require(reserver, nonce)?.clone();
            reservation.check_executable(ctx.caller, ctx.block_number)?;

            token.ledger.credit(reservation.recipient, reservation.amount)?;
            token.ledger.credit(ctx.caller, reservation.fee)?;
            token
                .reservations
                .require_mut(reserver, nonce)?
                .mark_executed()?;

            if !reservation.amount.is_zero() {
                token.events.push(LedgerEvent::Transfer {
                    from: reserver,
                    to: reservation.recipient,
                    value: reservation.amount,
                });
            }
            if !reservation.fee.is_zero() {
                token.events.push(LedgerEvent::Transfer {
                    from: reserver,
                    to: ctx.caller,
                    value: reservation.fee,
                });
            }
            token.events.push(LedgerEvent::ReservationExecuted {
                reserver,
                recipient: reservation.recipient,
                executor: ctx.caller,
                amount: reservation.amount,
                fee: reservation.fee,
                nonce,
            });
            info!(%reserver, %nonce, recipient = %reservation.recipient, executor = %ctx.caller, "reservation executed");
            Ok(())
        })
    }

    /// Returns an active reservation's `amount + fee` to the reserver.
    pub fn reclaim(
        &mut self,
        ctx: &CallContext,
        reserver: Address,
        nonce: U256,
    ) -> Result<(), LedgerError> {
        self.call("reclaim", |token| {
            let reservation = token.reservations.require(reserver, nonce)?.clone();
            reservation.check_reclaimable(ctx.caller, ctx.block_number)?;

            token.ledger.credit(reserver, reservation.total()?)?;
            token
                .reservations
                .require_mut(reserver, nonce)?
                .mark_reclaimed()?;

            token.events.push(LedgerEvent::ReservationReclaimed {
                reserver,
                amount: reservation.amount,
                fee: reservation.fee,
                nonce,
            });
            info!(%reserver, %nonce, caller = %ctx.caller, "reservation reclaimed");
            Ok(())
        })
    }

    // ---------- Internals ----------

    fn require_initialized(&self) -> Result<(), LedgerError> {
        if self.metadata.is_none() {
            return Err(LedgerError::NotInitialized);
        }
        Ok(())
    }

    /// A mutating call on an initialized token.
    fn call<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        self.require_initialized()?;
        self.transact(name, op)
    }

    /// Runs `op` as one all-or-nothing call.
    fn transact<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let ledger_mark = self.ledger.checkpoint();
        let events_mark = self.events.len();

        match op(self) {
            Ok(value) => {
                self.ledger.commit(ledger_mark);
                Ok(value)
            }
            Err(err) => {
                self.ledger.revert_to(ledger_mark);
                self.events.truncate(events_mark);
                debug!(call = name, %err, "call reverted");
                Err(err)
            }
        }
    }
}
