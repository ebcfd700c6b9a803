//! End-to-end scenario tests (§8) exercised through the public `Frame` /
//! `FrameStack` surface rather than individual component internals.

use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, U256};
use evm_frame::code::Code;
use evm_frame::environment::BlockValues;
use evm_frame::errors::DatabaseError;
use evm_frame::frame::{Frame, FrameBuilder, FrameResult, FrameType};
use evm_frame::frame_stack::FrameStack;
use evm_frame::state::FrameState;
use evm_frame::world::{AccountView, WorldState};

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

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn build_root(addr: u64, gas: i64) -> Frame {
    FrameBuilder::new()
        .frame_type(FrameType::MessageCall)
        .gas_remaining(gas)
        .recipient(Address::from_low_u64_be(addr))
        .originator(Address::from_low_u64_be(addr))
        .contract(Address::from_low_u64_be(addr))
        .sender(Address::from_low_u64_be(addr + 1))
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

/// S1 — simple memory write/read.
#[test]
fn s1_simple_memory_write_read() {
    init_tracing();
    let mut frame = build_root(1, 100_000);
    let word = hex::decode("0000000000000000000000000000000000000000000000000000000000000001")
        .unwrap();
    assert_eq!(word.len(), 32);

    frame.write_memory_bytes(0, 32, &word).unwrap();
    let read_back = frame.memory.get_bytes(0, 32).unwrap();
    assert_eq!(read_back.as_ref(), word.as_slice());
    assert_eq!(frame.memory.active_bytes(), 32);
    assert_eq!(frame.memory.active_words(), 1);
    assert_eq!(frame.hooks.last_updated_memory, Some((0, 32)));
}

/// S5 — transient storage writes are visible to the parent only after an
/// explicit commit, which the real interpreter only performs on success.
#[test]
fn s5_transient_storage_revert_semantics() {
    init_tracing();
    let mut parent = build_root(1, 100_000);
    let addr = Address::from_low_u64_be(0xA);
    let slot = U256::from(5);
    parent.set_transient(addr, slot, U256::from(1));

    let mut stack = FrameStack::new(parent);
    let mut child = build_root(2, 100_000);
    child.set_transient(addr, slot, U256::from(2));
    stack.push_child(child);

    // Without commit (simulated here by completing as a failure), the
    // parent's original value must be unchanged.
    let reverted = FrameResult {
        state: FrameState::CompletedFailed,
        gas_remaining: 0,
        output_data: Bytes::new(),
        exceptional_halt_reason: None,
        revert_reason: Some(Bytes::from_static(b"reverted")),
    };
    stack.complete_child(reverted).unwrap();
    assert_eq!(
        stack.current_mut().get_transient(&[], addr, slot),
        U256::from(1)
    );

    // Re-run the same sequence, but complete the child as a success: the
    // parent now observes the child's write.
    let mut parent = build_root(1, 100_000);
    parent.set_transient(addr, slot, U256::from(1));
    let mut stack = FrameStack::new(parent);
    let mut child = build_root(2, 100_000);
    child.set_transient(addr, slot, U256::from(2));
    stack.push_child(child);

    let succeeded = FrameResult {
        state: FrameState::CompletedSuccess,
        gas_remaining: 90_000,
        output_data: Bytes::new(),
        exceptional_halt_reason: None,
        revert_reason: None,
    };
    stack.complete_child(succeeded).unwrap();
    assert_eq!(
        stack.current_mut().get_transient(&[], addr, slot),
        U256::from(2)
    );
}
