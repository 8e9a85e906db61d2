//! Host-supplied execution context.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Fixed for the lifetime of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEnv {
    pub chain_id: u64,
    pub contract_address: Address,
}

/// Supplied with every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The account submitting the call. For ethless operations this is the
    /// relayer, and it receives the fee.
    pub caller: Address,
    pub block_number: u64,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, block_number: u64, timestamp: u64) -> Self {
        Self {
            caller,
            block_number,
            timestamp,
        }
    }

    /// Same block, different caller.
    pub fn with_caller(self, caller: Address) -> Self {
        Self { caller, ..self }
    }
}
