//! Private-transaction validator (component P, §6).
//!
//! This is a peripheral component: it has no dependency on [`crate::frame`]
//! or [`crate::frame_stack`]. It is included to document that cross-chain /
//! nonce validation for privacy-restricted transactions is a small,
//! standalone concern, not part of the message-frame core.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use strum::Display;

/// The outcome of validating a private transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum PrivateTxValidation {
    Valid,
    PrivateValueNotZero,
    PrivateUnimplementedTransactionType,
    InvalidSignature,
    WrongChainId,
    ReplayProtectedSignaturesNotSupported,
    PrivateNonceTooLow,
    IncorrectPrivateNonce,
}

/// Privacy restriction declared by a private transaction; only `Restricted`
/// is currently implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyRestriction {
    Restricted,
    Unimplemented,
}

/// The subset of a transaction's fields the private-tx validator needs.
#[derive(Debug, Clone)]
pub struct PrivateTransaction {
    pub value: U256,
    pub privacy_restriction: PrivacyRestriction,
    pub has_recoverable_signature: bool,
    pub chain_id: Option<u64>,
    pub nonce: u64,
}

/// Validates a private transaction against the node's chain id and the
/// sender account's current nonce.
///
/// `allow_future_nonces` mirrors a node configuration flag: when false, the
/// transaction's nonce must exactly match the account nonce; when true, a
/// nonce greater than the account nonce is also accepted.
pub fn validate_private_transaction(
    tx: &PrivateTransaction,
    node_chain_id: Option<u64>,
    account_nonce: u64,
    allow_future_nonces: bool,
) -> PrivateTxValidation {
    if !tx.value.is_zero() {
        return PrivateTxValidation::PrivateValueNotZero;
    }

    if tx.privacy_restriction != PrivacyRestriction::Restricted {
        return PrivateTxValidation::PrivateUnimplementedTransactionType;
    }

    if !tx.has_recoverable_signature {
        return PrivateTxValidation::InvalidSignature;
    }

    match (node_chain_id, tx.chain_id) {
        (Some(expected), Some(actual)) if expected != actual => {
            return PrivateTxValidation::WrongChainId;
        }
        (None, Some(_)) => {
            return PrivateTxValidation::ReplayProtectedSignaturesNotSupported;
        }
        _ => {}
    }

    if tx.nonce < account_nonce {
        return PrivateTxValidation::PrivateNonceTooLow;
    }

    if tx.nonce > account_nonce && !allow_future_nonces {
        return PrivateTxValidation::IncorrectPrivateNonce;
    }

    PrivateTxValidation::Valid
}
