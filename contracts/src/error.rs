//! Error taxonomy for every token operation.
//!
//! Each variant carries the values that made the check fail, so a rejected
//! call can be logged or reported without re-reading state. Callers that only
//! care about the category use [`LedgerError::kind`].

use alloy_primitives::{Address, U256};
use ethless_protocol::amount::AmountError;
use ethless_protocol::crypto::SignatureError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reservation::ReservationStatus;

/// Direction of a failed checked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticKind {
    Overflow,
    Underflow,
}

impl std::fmt::Display for ArithmeticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticKind::Overflow => write!(f, "overflow"),
            ArithmeticKind::Underflow => write!(f, "underflow"),
        }
    }
}

/// Errors returned by the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("arithmetic fault: {kind}")]
    ArithmeticFault { kind: ArithmeticKind },

    #[error("insufficient balance: {account} has {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        required: U256,
    },

    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}, needs {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: U256,
        required: U256,
    },

    /// Malformed signature, high-s signature, or signer mismatch. The cause
    /// is kept for logs only.
    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("nonce {nonce} already used by {account}")]
    NonceAlreadyUsed { account: Address, nonce: U256 },

    #[error("invalid permit nonce: expected {expected}, got {supplied}")]
    InvalidNonce { expected: U256, supplied: U256 },

    #[error("expired deadline: {deadline} is not after {now}")]
    ExpiredDeadline { deadline: U256, now: u64 },

    #[error("expiry block {expiry_block} is not after current block {current_block}")]
    DeadlineNotInFuture {
        expiry_block: u64,
        current_block: u64,
    },

    #[error("reserve of {required} exceeds balance {balance}")]
    ReserveExceedsBalance { required: U256, balance: U256 },

    #[error("reservation not found: {reserver} nonce {nonce}")]
    ReservationNotFound { reserver: Address, nonce: U256 },

    #[error("reservation is {status}, expected Active")]
    ReservationNotActive { status: ReservationStatus },

    #[error("reservation expired at block {expiry_block} (current block {current_block})")]
    ReservationExpired {
        expiry_block: u64,
        current_block: u64,
    },

    /// Raised both for a reclaim before expiry and for a reclaim by someone
    /// other than the permitted caller.
    #[error("reservation has not expired or {caller} may not reclaim it")]
    ReservationNotYetReclaimable { caller: Address },

    #[error("transfer to or from the zero address")]
    TransferToZeroAddress,

    #[error("unauthorized executor: reservation names {executor}, caller is {caller}")]
    UnauthorizedExecutor { executor: Address, caller: Address },

    #[error("token already initialized")]
    AlreadyInitialized,

    #[error("token not initialized")]
    NotInitialized,
}

/// Flat error category, one per [`LedgerError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    ArithmeticFault(ArithmeticKind),
    InsufficientBalance,
    InsufficientAllowance,
    InvalidSignature,
    NonceAlreadyUsed,
    InvalidNonce,
    ExpiredDeadline,
    DeadlineNotInFuture,
    ReserveExceedsBalance,
    ReservationNotFound,
    ReservationNotActive,
    ReservationExpired,
    ReservationNotYetReclaimable,
    TransferToZeroAddress,
    UnauthorizedExecutor,
    AlreadyInitialized,
    NotInitialized,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LedgerError::ArithmeticFault { kind } => ErrorKind::ArithmeticFault(*kind),
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            LedgerError::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            LedgerError::NonceAlreadyUsed { .. } => ErrorKind::NonceAlreadyUsed,
            LedgerError::InvalidNonce { .. } => ErrorKind::InvalidNonce,
            LedgerError::ExpiredDeadline { .. } => ErrorKind::ExpiredDeadline,
            LedgerError::DeadlineNotInFuture { .. } => ErrorKind::DeadlineNotInFuture,
            LedgerError::ReserveExceedsBalance { .. } => ErrorKind::ReserveExceedsBalance,
            LedgerError::ReservationNotFound { .. } => ErrorKind::ReservationNotFound,
            LedgerError::ReservationNotActive { .. } => ErrorKind::ReservationNotActive,
            LedgerError::ReservationExpired { .. } => ErrorKind::ReservationExpired,
            LedgerError::ReservationNotYetReclaimable { .. } => {
                ErrorKind::ReservationNotYetReclaimable
            }
            LedgerError::TransferToZeroAddress => ErrorKind::TransferToZeroAddress,
            LedgerError::UnauthorizedExecutor { .. } => ErrorKind::UnauthorizedExecutor,
            LedgerError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            LedgerError::NotInitialized => ErrorKind::NotInitialized,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow() -> Self {
        LedgerError::ArithmeticFault {
            kind: ArithmeticKind::Overflow,
        }
    }

    pub(crate) fn underflow() -> Self {
        LedgerError::ArithmeticFault {
            kind: ArithmeticKind::Underflow,
        }
    }
}

impl From<SignatureError> for LedgerError {
    fn from(err: SignatureError) -> Self {
        LedgerError::InvalidSignature {
            reason: err.to_string(),
        }
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::InvalidArgument { .. } => LedgerError::InvalidArgument {
                reason: err.to_string(),
            },
            AmountError::Overflow { .. } => LedgerError::overflow(),
        }
    }
}
