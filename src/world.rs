//! The narrow world-state interface consumed at frame construction (§6).
//!
//! This is deliberately small: the frame core never calls back into the
//! world after it is built. It only needs enough to pre-warm the access
//! list (component E) while building the frame.

use crate::errors::DatabaseError;
use ethereum_types::{Address, U256};

/// A read-only view of one account's storage, as seen by the frame builder.
pub trait AccountView {
    fn get_storage_value(&self, slot: U256) -> Result<U256, DatabaseError>;
}

/// The minimal world-state surface the frame core depends on.
pub trait WorldState {
    type Account: AccountView;

    fn get_account(&self, address: Address) -> Result<Option<Self::Account>, DatabaseError>;
}
