//! Constants shared across the frame execution core.

/// Default maximum depth of the operand stack.
pub const MAX_STACK_SIZE: usize = 1024;

/// Size of a word in bytes.
pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

/// Divisor used in the quadratic term of the memory expansion cost formula.
pub const MEMORY_EXPANSION_QUOTIENT: u64 = 512;
