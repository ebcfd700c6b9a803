//! Property-based tests for the testable invariants of the frame core.

use ethereum_types::{Address, U256};
use evm_frame::memory::Memory;
use evm_frame::stack::Stack;
use evm_frame::substate::{TransientStorage, WarmSet};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum StackOp {
    Push(u64),
    Pop,
}

fn arb_stack_ops() -> impl Strategy<Value = Vec<StackOp>> {
    proptest::collection::vec(
        prop_oneof![
            any::<u64>().prop_map(StackOp::Push),
            Just(StackOp::Pop),
        ],
        0..256,
    )
}

proptest! {
    /// Stack size always equals pushes minus successful pops; popping past
    /// empty always raises underflow rather than panicking.
    #[test]
    fn stack_size_tracks_pushes_minus_pops(ops in arb_stack_ops()) {
        let mut stack = Stack::new();
        let mut model: i64 = 0;
        for op in ops {
            match op {
                StackOp::Push(v) => {
                    stack.push(U256::from(v)).unwrap();
                    model += 1;
                }
                StackOp::Pop => {
                    if model == 0 {
                        prop_assert!(stack.pop().is_err());
                    } else {
                        stack.pop().unwrap();
                        model -= 1;
                    }
                }
            }
        }
        prop_assert_eq!(i64::try_from(stack.len()).unwrap(), model);
    }

    /// `calculate_new_active_words` never mutates and is monotone in length.
    #[test]
    fn memory_active_words_prediction_is_pure_and_monotone(offset in 0usize..4096, len1 in 0usize..256, len2 in 0usize..256) {
        let mem = Memory::new();
        let a = mem.calculate_new_active_words(offset, len1).unwrap();
        let b = mem.calculate_new_active_words(offset, len1.max(len2)).unwrap();
        prop_assert_eq!(mem.active_bytes(), 0, "must not mutate");
        prop_assert!(b >= a);
    }

    /// Writing N bytes and reading them back returns exactly what was written.
    #[test]
    fn memory_write_read_roundtrip(offset in 0usize..1024, data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut mem = Memory::new();
        mem.set_bytes(offset, data.len(), &data).unwrap();
        let read_back = mem.get_bytes(offset, data.len()).unwrap();
        prop_assert_eq!(read_back.as_ref(), data.as_slice());
    }

    /// Warming an address twice never double-counts: the second call always
    /// reports it was already warm.
    #[test]
    fn warm_set_is_idempotent(addr_byte in any::<u8>()) {
        let mut warm = WarmSet::new();
        let address = Address::from_low_u64_be(u64::from(addr_byte));
        let first = warm.insert_address(address);
        let second = warm.insert_address(address);
        prop_assert!(!first);
        prop_assert!(second);
    }

    /// A transient storage read with no writes is always zero, regardless of key.
    #[test]
    fn transient_storage_default_read_is_zero(addr_byte in any::<u8>(), slot in any::<u64>()) {
        let storage = TransientStorage::new();
        let address = Address::from_low_u64_be(u64::from(addr_byte));
        prop_assert_eq!(storage.get_local(&address, &U256::from(slot)), None);
    }
}
