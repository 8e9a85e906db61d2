//! # Authorization Gate
//!
//! Admits a signed authorization before anything touches balances:
//!
//! 1. Rebuild the canonical message for this deployment.
//! 2. Recover the signer; it must be the account the message spends from.
//! 3. Consume the nonce.
//!
//! Steps 1 and 2 mutate nothing, so a forged or malformed signature never
//! burns a nonce. Step 3 is permanent: once a valid signature has been
//! admitted it is spent, whether or not the operation behind it succeeds.
//!
//! Typed authorizations (permits and typed transfers) go through
//! [`authorize_permit`] and [`authorize_transfer`]. Both check the deadline,
//! the sequential counter and the EIP-712 signature, in that order, but leave
//! advancing the counter to the caller once the operation has gone through.

use alloy_primitives::{Address, U256};
use ethless_protocol::crypto::{RecoverableSignature, SignatureError};
use ethless_protocol::message::EthlessMessage;
use ethless_protocol::permit::{Eip712Domain, Permit, TransferAuthorization};
use tracing::warn;

use crate::context::ChainEnv;
use crate::error::LedgerError;
use crate::nonces::NonceRegistry;

/// Verifies `signature` over `message` and consumes its nonce. Returns the
/// authenticated signer.
pub fn authorize(
    env: &ChainEnv,
    nonces: &mut NonceRegistry,
    message: &EthlessMessage,
    signature: &RecoverableSignature,
) -> Result<Address, LedgerError> {
    let claimed = message.signer();
    verify_message(env, message, signature)?;

    if let Err(err) = nonces.consume(claimed, message.nonce()) {
        warn!(
            family = %message.domain_tag(),
            signer = %claimed,
            nonce = %message.nonce(),
            "rejected replayed authorization"
        );
        return Err(err);
    }
    Ok(claimed)
}

/// Signature check alone, no nonce consumption.
pub fn verify_message(
    env: &ChainEnv,
    message: &EthlessMessage,
    signature: &RecoverableSignature,
) -> Result<(), LedgerError> {
    let claimed = message.signer();
    let recovered = message
        .recover(env.chain_id, env.contract_address, signature)
        .map_err(|err| {
            warn!(family = %message.domain_tag(), signer = %claimed, %err, "rejected signature");
            LedgerError::from(err)
        })?;

    if recovered != claimed {
        warn!(
            family = %message.domain_tag(),
            signer = %claimed,
            %recovered,
            "rejected signature from wrong signer"
        );
        return Err(LedgerError::InvalidSignature {
            reason: format!("signed by {recovered}, not {claimed}"),
        });
    }
    Ok(())
}

/// Admits a permit: `deadline > now`, the nonce is the owner's current
/// counter, and the owner signed it.
pub fn authorize_permit(
    domain: &Eip712Domain,
    nonces: &NonceRegistry,
    permit: &Permit,
    signature: &RecoverableSignature,
    now: u64,
) -> Result<(), LedgerError> {
    admit_typed(
        "permit",
        nonces,
        permit.owner,
        permit.nonce,
        permit.deadline,
        now,
        || permit.recover(domain, signature),
    )
}

/// Admits a typed transfer under the same rules as a permit, against the
/// sender's counter.
pub fn authorize_transfer(
    domain: &Eip712Domain,
    nonces: &NonceRegistry,
    transfer: &TransferAuthorization,
    signature: &RecoverableSignature,
    now: u64,
) -> Result<(), LedgerError> {
    admit_typed(
        "typed transfer",
        nonces,
        transfer.sender,
        transfer.nonce,
        transfer.deadline,
        now,
        || transfer.recover(domain, signature),
    )
}

fn admit_typed(
    what: &'static str,
    nonces: &NonceRegistry,
    signer: Address,
    nonce: U256,
    deadline: U256,
    now: u64,
    recover: impl FnOnce() -> Result<Address, SignatureError>,
) -> Result<(), LedgerError> {
    if deadline <= U256::from(now) {
        return Err(LedgerError::ExpiredDeadline { deadline, now });
    }

    nonces.check_permit_nonce(signer, nonce)?;

    let recovered = recover().map_err(|err| {
        warn!(kind = what, %signer, %err, "rejected typed signature");
        LedgerError::from(err)
    })?;
    if recovered != signer {
        warn!(kind = what, %signer, %recovered, "rejected typed signature from wrong signer");
        return Err(LedgerError::InvalidSignature {
            reason: format!("{what} signed by {recovered}, not {signer}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ethless_protocol::crypto::EthlessKeypair;

    fn env() -> ChainEnv {
        ChainEnv {
            chain_id: 31_337,
            contract_address: Address::repeat_byte(0xC0),
        }
    }

    fn burn_by(burner: Address, nonce: u64) -> EthlessMessage {
        EthlessMessage::Burn {
            burner,
            amount: U256::from(10u8),
            fee: U256::from(1u8),
            nonce: U256::from(nonce),
        }
    }

    #[test]
    fn test_valid_authorization_consumes_nonce() {
        let kp = EthlessKeypair::generate();
        let msg = burn_by(kp.address(), 5);
        let sig = msg.sign(env().chain_id, env().contract_address, &kp).unwrap();

        let mut nonces = NonceRegistry::new();
        assert_eq!(authorize(&env(), &mut nonces, &msg, &sig).unwrap(), kp.address());
        assert!(nonces.is_used(kp.address(), U256::from(5u8)));

        let replay = authorize(&env(), &mut nonces, &msg, &sig).unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::NonceAlreadyUsed);
    }

    #[test]
    fn test_wrong_signer_keeps_nonce_free() {
        let holder = EthlessKeypair::generate();
        let attacker = EthlessKeypair::generate();
        let msg = burn_by(holder.address(), 5);
        let sig = msg
            .sign(env().chain_id, env().contract_address, &attacker)
            .unwrap();

        let mut nonces = NonceRegistry::new();
        let err = authorize(&env(), &mut nonces, &msg, &sig).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        assert!(!nonces.is_used(holder.address(), U256::from(5u8)));
    }

    #[test]
    fn test_other_deployment_rejected() {
        let kp = EthlessKeypair::generate();
        let msg = burn_by(kp.address(), 5);
        let sig = msg.sign(1, env().contract_address, &kp).unwrap();

        let mut nonces = NonceRegistry::new();
        let err = authorize(&env(), &mut nonces, &msg, &sig).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_permit_checks() {
        let owner = EthlessKeypair::generate();
        let domain = Eip712Domain::for_token("mini", env().chain_id, env().contract_address);
        let permit = Permit {
            owner: owner.address(),
            spender: Address::repeat_byte(7),
            value: U256::from(50u8),
            nonce: U256::ZERO,
            deadline: U256::from(1_000u64),
        };
        let sig = permit.sign(&domain, &owner).unwrap();
        let nonces = NonceRegistry::new();

        assert!(authorize_permit(&domain, &nonces, &permit, &sig, 999).is_ok());
        assert_eq!(
            authorize_permit(&domain, &nonces, &permit, &sig, 1_000)
                .unwrap_err()
                .kind(),
            ErrorKind::ExpiredDeadline
        );

        let mut wrong_nonce = permit.clone();
        wrong_nonce.nonce = U256::from(1u8);
        assert_eq!(
            authorize_permit(&domain, &nonces, &wrong_nonce, &sig, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidNonce
        );

        let mut other_spender = permit.clone();
        other_spender.spender = Address::repeat_byte(8);
        assert_eq!(
            authorize_permit(&domain, &nonces, &other_spender, &sig, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidSignature
        );
    }

    #[test]
    fn test_typed_transfer_checks() {
        let sender = EthlessKeypair::generate();
        let domain = Eip712Domain::for_token("mini", env().chain_id, env().contract_address);
        let transfer = TransferAuthorization {
            sender: sender.address(),
            recipient: Address::repeat_byte(7),
            amount: U256::from(50u8),
            nonce: U256::ZERO,
            deadline: U256::from(1_000u64),
        };
        let sig = transfer.sign(&domain, &sender).unwrap();
        let mut nonces = NonceRegistry::new();

        assert!(authorize_transfer(&domain, &nonces, &transfer, &sig, 999).is_ok());
        assert_eq!(
            authorize_transfer(&domain, &nonces, &transfer, &sig, 1_000)
                .unwrap_err()
                .kind(),
            ErrorKind::ExpiredDeadline
        );

        // A permit signature over the same values does not pass as a transfer.
        let as_permit = Permit {
            owner: transfer.sender,
            spender: transfer.recipient,
            value: transfer.amount,
            nonce: transfer.nonce,
            deadline: transfer.deadline,
        };
        let permit_sig = as_permit.sign(&domain, &sender).unwrap();
        assert_eq!(
            authorize_transfer(&domain, &nonces, &transfer, &permit_sig, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidSignature
        );

        nonces.use_permit_nonce(sender.address(), U256::ZERO).unwrap();
        assert_eq!(
            authorize_transfer(&domain, &nonces, &transfer, &sig, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidNonce
        );
    }
}
