//! # evm-frame
//!
//! The message-frame execution context of an EVM interpreter: the per-call
//! state container the bytecode interpreter mutates on every instruction.
//!
//! This crate is deliberately narrow. It does **not** dispatch opcodes,
//! schedule gas, persist world state, or perform cryptography — those are
//! external collaborators, reached only through the small interfaces in
//! [`world`]. What it owns is everything a call frame needs to stay
//! internally consistent across nested calls:
//!
//! - a bounded operand [`stack`] and a [`return_stack`] for structured
//!   code-section control flow ([`code`]),
//! - byte-addressable [`memory`] with lazy expansion,
//! - [`substate`] accumulators (logs, refunds, self-destructs, creates),
//!   warm address/storage sets, and transient storage, each of which must
//!   merge into a parent frame on success and vanish on revert
//!   ([`frame_stack`]),
//! - an 8-state lifecycle [`state`] machine,
//! - and the [`frame::Frame`] aggregate itself, assembled only through a
//!   validated [`frame::FrameBuilder`].
//!
//! A small, unrelated [`private_tx`] validator is included alongside to
//! demonstrate that privacy/nonce validation for private transactions is its
//! own peripheral concern, not part of the frame core.
//!
//! ## Example
//!
//! ```ignore
//! use evm_frame::frame::{FrameBuilder, FrameType};
//! use evm_frame::frame_stack::FrameStack;
//!
//! let root = FrameBuilder::new()
//!     .frame_type(FrameType::MessageCall)
//!     // ... required fields ...
//!     .build(&world)?;
//! let mut frames = FrameStack::new(root);
//! ```

pub mod code;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod frame;
pub mod frame_stack;
pub mod memory;
pub mod private_tx;
pub mod return_stack;
pub mod stack;
pub mod state;
pub mod substate;
pub mod world;
