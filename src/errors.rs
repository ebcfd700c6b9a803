//! Error taxonomy for the frame execution core.
//!
//! Mirrors the layering used throughout the wider VM: consensus-relevant
//! outcomes are modeled as [`ExceptionalHalt`] and surfaced through
//! [`VMError`], while programmer/arithmetic errors that should never occur
//! on valid input are modeled as [`InternalError`] so they are never
//! confused with a halt a contract could trigger.

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top level error type returned by frame operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VMError {
    #[error("Exceptional halt: {0}")]
    ExceptionalHalt(#[from] ExceptionalHalt),

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),

    #[error("Frame build error: {0}")]
    FrameBuild(#[from] FrameBuildError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Reasons a frame may halt with no further state to unwind.
///
/// This is deliberately open-ended: individual opcodes layered on top of
/// this core may need halt reasons of their own, but the control-flow and
/// memory/stack primitives only ever raise the variants below.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionalHalt {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("out of gas")]
    OutOfGas,
    #[error("out of bounds")]
    OutOfBounds,
    #[error("value too large")]
    VeryLargeNumber,
    #[error("invalid jump destination")]
    InvalidJumpDestination,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("opcode not allowed in static context")]
    OpcodeNotAllowedInStaticContext,
    #[error("code section missing")]
    CodeSectionMissing,
    #[error("too many stack items for code section")]
    TooManyStackItems,
    #[error("too few inputs for code section")]
    TooFewInputsForCodeSection,
    #[error("stack height does not match jumpf target inputs")]
    JumpfStackMismatch,
    #[error("stack height does not match code section return outputs")]
    IncorrectCodeSectionReturnOutputs,
}

/// Errors that indicate a bug in the caller, never a consensus-level outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("type conversion failed")]
    TypeConversion,
    #[error("illegal frame state transition from {from:?} to {to:?}")]
    IllegalStateTransition { from: String, to: String },
    #[error("completer invoked more than once")]
    DoubleCompletion,
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while validating a [`crate::frame::FrameBuilder`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameBuildError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("depth must be non-negative, got {0}")]
    InvalidDepth(i64),
}

/// Errors surfaced by the narrow world-state interface consumed at construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("account {0:?} not found")]
    AccountNotFound(Address),
    #[error("{0}")]
    Custom(String),
}
