//! The frame aggregate and its validated builder (component I), plus the
//! ancestor-aware operations over warm sets (E) and transient storage (D)
//! that only make sense once a frame knows its ancestor chain.

use std::sync::Arc;

use bytes::Bytes;
use derive_more::Display;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::code::Code;
use crate::constants::MAX_STACK_SIZE;
use crate::environment::{BlockValues, ContextVariables, Environment};
use crate::errors::{ExceptionalHalt, FrameBuildError, VMError};
use crate::memory::Memory;
use crate::return_stack::ReturnStack;
use crate::stack::Stack;
use crate::state::{FrameState, Lifecycle};
use crate::substate::{Substate, TransientStorage, WarmSet};
use crate::world::{AccountView, WorldState};

/// Whether a frame was entered to create a contract or to call one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum FrameType {
    #[display("contract-creation")]
    ContractCreation,
    #[display("message-call")]
    MessageCall,
}

/// Observable-change hooks for tracer integration (component K).
#[derive(Debug, Clone, Default)]
pub struct TracerHooks {
    pub last_updated_memory: Option<(usize, usize)>,
    pub last_updated_storage: Option<(Address, U256)>,
    pub exceptional_halt_reason: Option<ExceptionalHalt>,
    pub current_operation: Option<String>,
    pub revert_reason: Option<Bytes>,
}

impl TracerHooks {
    /// Clears the per-operation hooks; called by the interpreter before each opcode.
    pub fn reset(&mut self) {
        self.last_updated_memory = None;
        self.last_updated_storage = None;
    }
}

/// The outcome of a terminated frame, handed to its completer exactly once.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub state: FrameState,
    pub gas_remaining: i64,
    pub output_data: Bytes,
    pub exceptional_halt_reason: Option<ExceptionalHalt>,
    pub revert_reason: Option<Bytes>,
}

impl FrameResult {
    pub fn is_success(&self) -> bool {
        self.state == FrameState::CompletedSuccess
    }
}

type Completer = Box<dyn FnOnce(&FrameResult) + Send>;

/// The message-frame execution context: the per-call state container the
/// interpreter mutates on every instruction.
pub struct Frame {
    pub frame_type: FrameType,
    lifecycle: Lifecycle,

    pub gas_remaining: i64,
    pub pc: usize,
    pub section: usize,
    pub stack: Stack,
    pub return_stack: ReturnStack,
    pub memory: Memory,
    pub output_data: Bytes,
    pub return_data: Bytes,
    pub is_static: bool,
    pub depth: u64,

    pub environment: Environment,
    pub code: Code,

    pub substate: Substate,
    warm_set: WarmSet,
    transient_storage: TransientStorage,

    pub hooks: TracerHooks,

    completer: Option<Completer>,
    completed: bool,
}

impl Frame {
    pub fn state(&self) -> FrameState {
        self.lifecycle.current()
    }

    /// Advances the lifecycle; fails if `next` is not reachable from the current state.
    pub fn set_state(&mut self, next: FrameState) -> Result<(), VMError> {
        self.lifecycle.transition(next)
    }

    // -- Warm sets (component E), ancestor-aware -----------------------------

    /// Marks `address` warm; returns whether it was already warm anywhere
    /// along `ancestors` (the frame's chain back to the root, nearest-parent
    /// last) or locally.
    pub fn warm_up_address(&mut self, ancestors: &[Frame], address: Address) -> bool {
        if self.warm_set.contains_address(&address) {
            return true;
        }
        let already_warm = ancestors.iter().any(|f| f.warm_set.contains_address(&address));
        self.warm_set.insert_address(address);
        tracing::trace!(?address, already_warm, "warmed up address");
        already_warm
    }

    pub fn warm_up_storage(&mut self, ancestors: &[Frame], address: Address, slot: U256) -> bool {
        if self.warm_set.contains_storage(&address, &slot) {
            return true;
        }
        let already_warm = ancestors
            .iter()
            .any(|f| f.warm_set.contains_storage(&address, &slot));
        self.warm_set.insert_storage(address, slot);
        already_warm
    }

    pub fn is_address_warm_locally(&self, address: &Address) -> bool {
        self.warm_set.contains_address(address)
    }

    // -- Memory (component C), hook-syncing wrappers (component K) -----------

    /// Writes `src` at `offset`, left-padding with zeros if shorter than
    /// `length`, and mirrors the touched range into `hooks.last_updated_memory`
    /// for tracer integration — the memory-write counterpart of
    /// [`Frame::set_transient`]'s `hooks.last_updated_storage` write.
    pub fn write_memory_bytes(&mut self, offset: usize, length: usize, src: &[u8]) -> Result<(), VMError> {
        self.memory.set_bytes(offset, length, src)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    /// `write_memory_bytes`, but sourcing from `src` starting at `src_offset`.
    pub fn write_memory_bytes_from(
        &mut self,
        offset: usize,
        src_offset: usize,
        length: usize,
        src: &[u8],
    ) -> Result<(), VMError> {
        self.memory.set_bytes_from(offset, src_offset, length, src)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    /// Right-aligned write (short sources left-padded with zeros), syncing
    /// `hooks.last_updated_memory` the same way `write_memory_bytes` does.
    pub fn write_memory_bytes_right_aligned(
        &mut self,
        offset: usize,
        length: usize,
        src: &[u8],
    ) -> Result<(), VMError> {
        self.memory.set_bytes_right_aligned(offset, length, src)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    /// Writes a single byte, syncing `hooks.last_updated_memory`.
    pub fn write_memory_byte(&mut self, offset: usize, value: u8) -> Result<(), VMError> {
        self.memory.set_byte(offset, value)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    /// Writes a 32-byte word, syncing `hooks.last_updated_memory`.
    pub fn write_memory_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        self.memory.set_word(offset, word)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    /// In-place `memmove`-correct copy, syncing `hooks.last_updated_memory`.
    pub fn copy_memory(&mut self, dst: usize, src: usize, length: usize) -> Result<(), VMError> {
        self.memory.copy(dst, src, length)?;
        self.hooks.last_updated_memory = self.memory.last_updated();
        Ok(())
    }

    // -- Transient storage (component D), ancestor-aware ---------------------

    /// Reads a transient storage slot, walking `ancestors` from nearest parent
    /// to root on a local miss and memoizing the resolved value (including an
    /// implicit zero) into this frame.
    pub fn get_transient(&mut self, ancestors: &[Frame], address: Address, slot: U256) -> U256 {
        if let Some(value) = self.transient_storage.get_local(&address, &slot) {
            return value;
        }
        let resolved = ancestors
            .iter()
            .rev()
            .find_map(|f| f.transient_storage.get_local(&address, &slot))
            .unwrap_or_default();
        self.transient_storage.set(address, slot, resolved);
        resolved
    }

    pub fn set_transient(&mut self, address: Address, slot: U256, value: U256) {
        self.transient_storage.set(address, slot, value);
        self.hooks.last_updated_storage = Some((address, slot));
    }

    pub(crate) fn take_transient_storage(&mut self) -> TransientStorage {
        std::mem::take(&mut self.transient_storage)
    }

    pub(crate) fn commit_transient_storage(&mut self, delta: TransientStorage) {
        self.transient_storage.commit(delta);
    }

    pub(crate) fn take_warm_set(&mut self) -> WarmSet {
        std::mem::take(&mut self.warm_set)
    }

    pub(crate) fn merge_warm_set(&mut self, delta: WarmSet) {
        self.warm_set.extend(delta);
    }

    /// True iff `address` was created in this transaction, checked against
    /// this frame and every ancestor.
    pub fn was_created_in_transaction(&self, ancestors: &[Frame], address: &Address) -> bool {
        self.substate.is_created_local(address)
            || ancestors.iter().any(|f| f.substate.is_created_local(address))
    }

    // -- Completion -----------------------------------------------------------

    /// Invokes the completer exactly once; returns an error if called twice.
    pub fn notify_completion(&mut self, result: &FrameResult) -> Result<(), VMError> {
        if self.completed {
            return Err(crate::errors::InternalError::DoubleCompletion.into());
        }
        self.completed = true;
        tracing::debug!(state = %result.state, gas_remaining = result.gas_remaining, "frame completed");
        if let Some(completer) = self.completer.take() {
            completer(result);
        }
        Ok(())
    }

    pub fn to_result(&self) -> FrameResult {
        FrameResult {
            state: self.state(),
            gas_remaining: self.gas_remaining,
            output_data: self.output_data.clone(),
            exceptional_halt_reason: self.hooks.exceptional_halt_reason,
            revert_reason: self.hooks.revert_reason.clone(),
        }
    }

    // -- Gas --------------------------------------------------------------

    /// Decrements remaining gas and returns the new value, which may go
    /// negative. The caller is responsible for checking for exhaustion.
    #[expect(clippy::as_conversions, reason = "gas amounts never exceed i64::MAX")]
    pub fn decrement_gas(&mut self, amount: u64) -> i64 {
        self.gas_remaining = self.gas_remaining.saturating_sub(amount as i64);
        self.gas_remaining
    }

    #[expect(clippy::as_conversions, reason = "gas amounts never exceed i64::MAX")]
    pub fn increment_gas(&mut self, amount: u64) {
        self.gas_remaining = self.gas_remaining.saturating_add(amount as i64);
    }
}

/// Builds a [`Frame`], validating that every required field is present and
/// pre-warming the access list against a [`WorldState`].
pub struct FrameBuilder {
    frame_type: Option<FrameType>,
    gas_remaining: Option<i64>,
    recipient: Option<Address>,
    originator: Option<Address>,
    contract: Option<Address>,
    sender: Option<Address>,
    value: Option<U256>,
    apparent_value: Option<U256>,
    gas_price: Option<U256>,
    input_data: Bytes,
    code: Option<Code>,
    block_values: Option<BlockValues>,
    mining_beneficiary: Option<Address>,
    block_hash_lookup: Option<Arc<dyn Fn(u64) -> Option<H256> + Send + Sync>>,
    is_static: bool,
    depth: i64,
    max_stack_size: usize,
    context_variables: ContextVariables,
    versioned_hashes: Option<Vec<H256>>,
    completer: Option<Completer>,
    access_list: Vec<(Address, Vec<U256>)>,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self {
            frame_type: None,
            gas_remaining: None,
            recipient: None,
            originator: None,
            contract: None,
            sender: None,
            value: None,
            apparent_value: None,
            gas_price: None,
            input_data: Bytes::new(),
            code: None,
            block_values: None,
            mining_beneficiary: None,
            block_hash_lookup: None,
            is_static: false,
            depth: 0,
            max_stack_size: MAX_STACK_SIZE,
            context_variables: ContextVariables::new(),
            versioned_hashes: None,
            completer: None,
            access_list: Vec::new(),
        }
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    pub fn gas_remaining(mut self, gas: i64) -> Self {
        self.gas_remaining = Some(gas);
        self
    }

    pub fn recipient(mut self, address: Address) -> Self {
        self.recipient = Some(address);
        self
    }

    pub fn originator(mut self, address: Address) -> Self {
        self.originator = Some(address);
        self
    }

    pub fn contract(mut self, address: Address) -> Self {
        self.contract = Some(address);
        self
    }

    pub fn sender(mut self, address: Address) -> Self {
        self.sender = Some(address);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn apparent_value(mut self, value: U256) -> Self {
        self.apparent_value = Some(value);
        self
    }

    pub fn gas_price(mut self, price: U256) -> Self {
        self.gas_price = Some(price);
        self
    }

    pub fn input_data(mut self, data: Bytes) -> Self {
        self.input_data = data;
        self
    }

    pub fn code(mut self, code: Code) -> Self {
        self.code = Some(code);
        self
    }

    pub fn block_values(mut self, values: BlockValues) -> Self {
        self.block_values = Some(values);
        self
    }

    pub fn mining_beneficiary(mut self, address: Address) -> Self {
        self.mining_beneficiary = Some(address);
        self
    }

    pub fn block_hash_lookup(
        mut self,
        lookup: Arc<dyn Fn(u64) -> Option<H256> + Send + Sync>,
    ) -> Self {
        self.block_hash_lookup = Some(lookup);
        self
    }

    pub fn is_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn depth(mut self, depth: i64) -> Self {
        self.depth = depth;
        self
    }

    pub fn max_stack_size(mut self, size: usize) -> Self {
        self.max_stack_size = size;
        self
    }

    pub fn context_variables(mut self, vars: ContextVariables) -> Self {
        self.context_variables = vars;
        self
    }

    pub fn versioned_hashes(mut self, hashes: Vec<H256>) -> Self {
        self.versioned_hashes = Some(hashes);
        self
    }

    pub fn completer(mut self, completer: Completer) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Declares the access list to warm during construction: address, plus
    /// the storage slots of that address to pre-read from `world`.
    pub fn access_list(mut self, access_list: Vec<(Address, Vec<U256>)>) -> Self {
        self.access_list = access_list;
        self
    }

    /// Validates all required fields, then seeds warm sets by pre-reading
    /// the access list (and `sender`/`contract`) from `world`.
    pub fn build<W: WorldState>(self, world: &W) -> Result<Frame, VMError> {
        let frame_type = self.frame_type.ok_or(FrameBuildError::MissingField("frame_type"))?;
        let gas_remaining = self
            .gas_remaining
            .ok_or(FrameBuildError::MissingField("gas_remaining"))?;
        let recipient = self.recipient.ok_or(FrameBuildError::MissingField("recipient"))?;
        let originator = self
            .originator
            .ok_or(FrameBuildError::MissingField("originator"))?;
        let contract = self.contract.ok_or(FrameBuildError::MissingField("contract"))?;
        let sender = self.sender.ok_or(FrameBuildError::MissingField("sender"))?;
        let value = self.value.ok_or(FrameBuildError::MissingField("value"))?;
        let apparent_value = self
            .apparent_value
            .ok_or(FrameBuildError::MissingField("apparent_value"))?;
        let gas_price = self.gas_price.ok_or(FrameBuildError::MissingField("gas_price"))?;
        let code = self.code.ok_or(FrameBuildError::MissingField("code"))?;
        let block_values = self
            .block_values
            .ok_or(FrameBuildError::MissingField("block_values"))?;
        let mining_beneficiary = self
            .mining_beneficiary
            .ok_or(FrameBuildError::MissingField("mining_beneficiary"))?;
        let block_hash_lookup = self
            .block_hash_lookup
            .ok_or(FrameBuildError::MissingField("block_hash_lookup"))?;

        if self.depth < 0 {
            return Err(FrameBuildError::InvalidDepth(self.depth).into());
        }

        let environment = Environment {
            recipient,
            originator,
            contract,
            sender,
            value,
            apparent_value,
            gas_price,
            input_data: self.input_data,
            block_values,
            mining_beneficiary,
            block_hash_lookup,
            context_variables: self.context_variables,
            versioned_hashes: self.versioned_hashes,
        };

        let pc = if code.is_valid() { code.entry_point() } else { 0 };

        let mut warm_set = WarmSet::new();
        warm_set.insert_address(sender);
        warm_set.insert_address(contract);

        for (address, slots) in &self.access_list {
            warm_set.insert_address(*address);
            if let Some(account) = world.get_account(*address)? {
                for slot in slots {
                    warm_set.insert_storage(*address, *slot);
                    // Pre-read so the first in-frame read is already cached
                    // against the database; the value itself is owned by the
                    // caller's storage layer, not duplicated here.
                    let _ = account.get_storage_value(*slot)?;
                }
            }
        }

        #[expect(clippy::as_conversions, reason = "depth is checked non-negative above")]
        let depth = self.depth as u64;

        Ok(Frame {
            frame_type,
            lifecycle: Lifecycle::new(),
            gas_remaining,
            pc,
            section: 0,
            stack: Stack::with_max_size(self.max_stack_size),
            return_stack: ReturnStack::new(),
            memory: Memory::new(),
            output_data: Bytes::new(),
            return_data: Bytes::new(),
            is_static: self.is_static,
            depth,
            environment,
            code,
            substate: Substate::new(),
            warm_set,
            transient_storage: TransientStorage::new(),
            hooks: TracerHooks::default(),
            completer: self.completer,
            completed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DatabaseError;

    struct NullAccount;
    impl AccountView for NullAccount {
        fn get_storage_value(&self, _slot: U256) -> Result<U256, DatabaseError> {
            Ok(U256::zero())
        }
    }

    struct NullWorld;
    impl WorldState for NullWorld {
        type Account = NullAccount;
        fn get_account(&self, _address: Address) -> Result<Option<Self::Account>, DatabaseError> {
            Ok(Some(NullAccount))
        }
    }

    fn build_frame() -> Frame {
        FrameBuilder::new()
            .frame_type(FrameType::MessageCall)
            .gas_remaining(100_000)
            .recipient(Address::from_low_u64_be(1))
            .originator(Address::from_low_u64_be(2))
            .contract(Address::from_low_u64_be(1))
            .sender(Address::from_low_u64_be(2))
            .value(U256::zero())
            .apparent_value(U256::zero())
            .gas_price(U256::one())
            .code(Code::legacy(Bytes::new()))
            .block_values(BlockValues {
                number: 1,
                timestamp: 0,
                coinbase: Address::zero(),
                gas_limit: 30_000_000,
                base_fee_per_gas: U256::zero(),
                prev_randao: None,
                chain_id: 1,
            })
            .mining_beneficiary(Address::zero())
            .block_hash_lookup(Arc::new(|_| None))
            .build(&NullWorld)
            .unwrap()
    }

    #[test]
    fn missing_field_fails_construction() {
        let result = FrameBuilder::new().build(&NullWorld);
        assert!(result.is_err());
    }

    #[test]
    fn sender_and_contract_are_pre_warmed() {
        let frame = build_frame();
        assert!(frame.is_address_warm_locally(&Address::from_low_u64_be(1)));
        assert!(frame.is_address_warm_locally(&Address::from_low_u64_be(2)));
    }

    #[test]
    fn warm_up_checks_ancestors() {
        let parent = build_frame();
        let mut child = build_frame();
        let addr = Address::from_low_u64_be(99);
        let ancestors = vec![parent];
        assert!(!child.warm_up_address(&ancestors, addr));
        assert!(child.is_address_warm_locally(&addr));
    }

    #[test]
    fn memory_write_syncs_last_updated_hook_and_reset_clears_it() {
        let mut frame = build_frame();
        assert_eq!(frame.hooks.last_updated_memory, None);

        frame.write_memory_bytes(0, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.hooks.last_updated_memory, Some((0, 4)));

        frame.hooks.reset();
        assert_eq!(frame.hooks.last_updated_memory, None);

        frame.write_memory_word(32, U256::from(7)).unwrap();
        assert_eq!(frame.hooks.last_updated_memory, Some((32, 32)));
    }

    #[test]
    fn completer_runs_exactly_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut frame = FrameBuilder::new()
            .frame_type(FrameType::MessageCall)
            .gas_remaining(1)
            .recipient(Address::zero())
            .originator(Address::zero())
            .contract(Address::zero())
            .sender(Address::zero())
            .value(U256::zero())
            .apparent_value(U256::zero())
            .gas_price(U256::zero())
            .code(Code::legacy(Bytes::new()))
            .block_values(BlockValues {
                number: 0,
                timestamp: 0,
                coinbase: Address::zero(),
                gas_limit: 0,
                base_fee_per_gas: U256::zero(),
                prev_randao: None,
                chain_id: 1,
            })
            .mining_beneficiary(Address::zero())
            .block_hash_lookup(Arc::new(|_| None))
            .completer(Box::new(move |_result| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .build(&NullWorld)
            .unwrap();

        let result = frame.to_result();
        frame.notify_completion(&result).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(frame.notify_completion(&result).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
