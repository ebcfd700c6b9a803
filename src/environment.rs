//! The read-only per-frame environment view (component L).

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::HashMap;
use std::sync::Arc;

/// Block-level values visible to every frame in a transaction, independent
/// of call depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockValues {
    pub number: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    pub gas_limit: u64,
    pub base_fee_per_gas: U256,
    pub prev_randao: Option<H256>,
    pub chain_id: u64,
}

/// A typed key into [`Environment`]'s context-variable map, avoiding runtime
/// casts at the point of use. The key carries the type it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey<T> {
    name: &'static str,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A heterogeneous bag of side-channel values (e.g. an L2 fee policy, a
/// debugger hook identifier) keyed by typed [`ContextKey`]s, resolved once at
/// frame construction so the interpreter's hot path never needs a cast.
#[derive(Default)]
pub struct ContextVariables {
    values: HashMap<&'static str, Arc<dyn std::any::Any + Send + Sync>>,
}

impl ContextVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, key: ContextKey<T>, value: T) {
        self.values.insert(key.name(), Arc::new(value));
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: ContextKey<T>) -> Option<&T> {
        self.values.get(key.name()).and_then(|v| v.downcast_ref())
    }
}

impl std::fmt::Debug for ContextVariables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextVariables")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Everything a frame observes about its surrounding call, set once at
/// construction and never mutated thereafter.
#[derive(Debug)]
pub struct Environment {
    pub recipient: Address,
    pub originator: Address,
    pub contract: Address,
    pub sender: Address,
    pub value: U256,
    pub apparent_value: U256,
    pub gas_price: U256,
    pub input_data: Bytes,
    pub block_values: BlockValues,
    pub mining_beneficiary: Address,
    /// A narrow block-hash lookup; returns `None` for out-of-range numbers.
    pub block_hash_lookup: Arc<dyn Fn(u64) -> Option<H256> + Send + Sync>,
    pub context_variables: ContextVariables,
    pub versioned_hashes: Option<Vec<H256>>,
}

impl Environment {
    pub fn block_hash(&self, block_number: u64) -> Option<H256> {
        (self.block_hash_lookup)(block_number)
    }
}
