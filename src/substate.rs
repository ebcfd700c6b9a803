//! Per-frame warm sets, transient storage, and substate accumulators
//! (components D, E, F).
//!
//! Each of these is *local* to one frame: a frame only ever mutates its own
//! copy. Parent-chain lookups (is this already warm anywhere up the call
//! stack? what did an ancestor write to this transient slot?) are performed
//! by [`crate::frame::Frame`], which walks the ancestor slice handed to it by
//! [`crate::frame_stack::FrameStack`] and queries the local-only accessors
//! defined here.

use ethereum_types::{Address, U256};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// A single emitted event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<U256>,
    pub data: bytes::Bytes,
}

/// Warm-address and warm-storage-slot tracking local to one frame (EIP-2929).
#[derive(Debug, Clone, Default)]
pub struct WarmSet {
    addresses: FxHashSet<Address>,
    storage: FxHashSet<(Address, U256)>,
}

impl WarmSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn contains_storage(&self, address: &Address, slot: &U256) -> bool {
        self.storage.contains(&(*address, *slot))
    }

    /// Marks `address` warm locally; returns whether it was already warm locally.
    pub fn insert_address(&mut self, address: Address) -> bool {
        !self.addresses.insert(address)
    }

    /// Marks `(address, slot)` warm locally; returns whether it was already warm locally.
    pub fn insert_storage(&mut self, address: Address, slot: U256) -> bool {
        !self.storage.insert((address, slot))
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    pub fn storage_entries(&self) -> impl Iterator<Item = &(Address, U256)> {
        self.storage.iter()
    }

    /// Unions `other` into `self`, used when a completed child merges into its parent.
    pub fn extend(&mut self, other: WarmSet) {
        self.addresses.extend(other.addresses);
        self.storage.extend(other.storage);
    }
}

/// Transient storage local to one frame (EIP-1153).
#[derive(Debug, Clone, Default)]
pub struct TransientStorage {
    entries: FxHashMap<(Address, U256), U256>,
}

impl TransientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_local(&self, address: &Address, slot: &U256) -> Option<U256> {
        self.entries.get(&(*address, *slot)).copied()
    }

    pub fn set(&mut self, address: Address, slot: U256, value: U256) {
        self.entries.insert((address, slot), value);
    }

    /// Commits `other`'s entries into `self`, overwriting on key collision.
    /// Used when a successful child frame merges into its parent.
    pub fn commit(&mut self, other: TransientStorage) {
        self.entries.extend(other.entries);
    }
}

/// Logs, refunds, and the self-destruct/create sets accumulated by one frame.
#[derive(Debug, Clone, Default)]
pub struct Substate {
    pub logs: Vec<Log>,
    pub gas_refund: u64,
    selfdestructs: FxHashSet<Address>,
    creates: FxHashSet<Address>,
    pub refunds: FxHashMap<Address, U256>,
}

impl Substate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub fn increment_gas_refund(&mut self, amount: u64) {
        self.gas_refund = self.gas_refund.saturating_add(amount);
    }

    /// Marks `address` for self-destruction locally; returns whether it was already marked locally.
    pub fn add_selfdestruct(&mut self, address: Address) -> bool {
        !self.selfdestructs.insert(address)
    }

    pub fn is_selfdestruct_local(&self, address: &Address) -> bool {
        self.selfdestructs.contains(address)
    }

    pub fn selfdestructs(&self) -> impl Iterator<Item = &Address> {
        self.selfdestructs.iter()
    }

    /// Marks `address` as newly created locally; returns whether it was already marked locally.
    pub fn add_create(&mut self, address: Address) -> bool {
        !self.creates.insert(address)
    }

    pub fn is_created_local(&self, address: &Address) -> bool {
        self.creates.contains(address)
    }

    pub fn creates(&self) -> impl Iterator<Item = &Address> {
        self.creates.iter()
    }

    pub fn add_refund(&mut self, address: Address, value: U256) {
        self.refunds.insert(address, value);
    }

    /// Merges a completed child's accumulators into `self` (the parent).
    pub fn merge_child(&mut self, child: Substate) {
        self.logs.extend(child.logs);
        self.gas_refund = self.gas_refund.saturating_add(child.gas_refund);
        self.selfdestructs.extend(child.selfdestructs);
        self.creates.extend(child.creates);
        self.refunds.extend(child.refunds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_set_insert_reports_prior_membership() {
        let mut warm = WarmSet::new();
        let a = Address::from_low_u64_be(1);
        assert!(!warm.insert_address(a));
        assert!(warm.insert_address(a));
        assert!(warm.contains_address(&a));
    }

    #[test]
    fn transient_storage_commit_overwrites() {
        let mut parent = TransientStorage::new();
        let a = Address::from_low_u64_be(1);
        parent.set(a, U256::from(1), U256::from(10));

        let mut child = TransientStorage::new();
        child.set(a, U256::from(1), U256::from(20));

        parent.commit(child);
        assert_eq!(parent.get_local(&a, &U256::from(1)), Some(U256::from(20)));
    }

    #[test]
    fn selfdestructs_and_creates_do_not_both_record_same_address() {
        let mut substate = Substate::new();
        let a = Address::from_low_u64_be(1);
        substate.add_create(a);
        assert!(!substate.is_selfdestruct_local(&a));
    }

    #[test]
    fn merge_child_accumulates_gas_refund_and_logs() {
        let mut parent = Substate::new();
        let mut child = Substate::new();
        child.increment_gas_refund(100);
        child.add_log(Log {
            address: Address::zero(),
            topics: vec![],
            data: bytes::Bytes::new(),
        });
        parent.merge_child(child);
        assert_eq!(parent.gas_refund, 100);
        assert_eq!(parent.logs.len(), 1);
    }
}
