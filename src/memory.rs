//! Byte-addressable frame memory (component C).
//!
//! Memory is logically infinite; only the largest word-aligned region ever
//! touched ("active" memory) is actually backed by storage. Reads beyond the
//! active region return zero-filled bytes.

use crate::constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_U64, WORD_SIZE_IN_BYTES_USIZE};
use crate::errors::{ExceptionalHalt::OutOfBounds, InternalError, VMError};
use bytes::Bytes;
use ethereum_types::U256;

/// A frame's private byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    buffer: Vec<u8>,
    last_updated: Option<(usize, usize)>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes actually backed by storage.
    #[inline]
    pub fn active_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Active memory measured in 32-byte words.
    #[inline]
    pub fn active_words(&self) -> usize {
        self.buffer.len().div_ceil(WORD_SIZE_IN_BYTES_USIZE)
    }

    /// The range touched by the most recent explicit write, for tracer hooks.
    pub fn last_updated(&self) -> Option<(usize, usize)> {
        self.last_updated
    }

    pub fn reset_last_updated(&mut self) {
        self.last_updated = None;
    }

    /// Returns the active-word count the buffer would have after touching
    /// `[offset, offset + length)`, without mutating anything.
    pub fn calculate_new_active_words(&self, offset: usize, length: usize) -> Result<usize, VMError> {
        if length == 0 {
            return Ok(self.active_words());
        }
        let end = offset.checked_add(length).ok_or(OutOfBounds)?;
        let needed_words = end.div_ceil(WORD_SIZE_IN_BYTES_USIZE);
        Ok(needed_words.max(self.active_words()))
    }

    /// Grows the buffer so that `[offset, offset + length)` is backed,
    /// rounding up to the next whole word.
    pub fn ensure_capacity_for_bytes(&mut self, offset: usize, length: usize) -> Result<(), VMError> {
        if length == 0 {
            return Ok(());
        }
        let end = offset.checked_add(length).ok_or(OutOfBounds)?;
        let new_len = end
            .checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(OutOfBounds)?;
        if new_len > self.buffer.len() {
            tracing::trace!(from = self.buffer.len(), to = new_len, "expanding frame memory");
            self.buffer.resize(new_len, 0);
        }
        Ok(())
    }

    pub fn set_byte(&mut self, offset: usize, value: u8) -> Result<(), VMError> {
        self.ensure_capacity_for_bytes(offset, 1)?;
        // SAFETY: ensure_capacity_for_bytes just grew the buffer to cover `offset`.
        #[allow(unsafe_code)]
        unsafe {
            *self.buffer.get_unchecked_mut(offset) = value;
        }
        self.last_updated = Some((offset, 1));
        Ok(())
    }

    /// Writes `src` at `offset`, left-padding with zeros if `src` is shorter
    /// than `length` (the write occupies the low-order bytes of the range).
    pub fn set_bytes(&mut self, offset: usize, length: usize, src: &[u8]) -> Result<(), VMError> {
        if length == 0 {
            return Ok(());
        }
        self.ensure_capacity_for_bytes(offset, length)?;
        let copy_len = src.len().min(length);
        // SAFETY: ensure_capacity_for_bytes just grew the buffer to cover the whole range.
        #[allow(unsafe_code, clippy::indexing_slicing)]
        unsafe {
            self.buffer
                .get_unchecked_mut(offset..offset.wrapping_add(copy_len))
                .copy_from_slice(src.get_unchecked(..copy_len));
            if copy_len < length {
                self.buffer
                    .get_unchecked_mut(offset.wrapping_add(copy_len)..offset.wrapping_add(length))
                    .fill(0);
            }
        }
        self.last_updated = Some((offset, length));
        Ok(())
    }

    /// Writes `src` starting at `src_offset` for `length` bytes into memory at `offset`.
    pub fn set_bytes_from(
        &mut self,
        offset: usize,
        src_offset: usize,
        length: usize,
        src: &[u8],
    ) -> Result<(), VMError> {
        if length == 0 {
            return Ok(());
        }
        let available = src.len().saturating_sub(src_offset);
        let copy_len = available.min(length);
        let slice = src.get(src_offset..src_offset.wrapping_add(copy_len)).unwrap_or(&[]);
        self.set_bytes(offset, length, slice)
    }

    /// Right-aligned write: short sources are left-padded with zeros, as for
    /// EVM return-data-to-word coercions.
    pub fn set_bytes_right_aligned(
        &mut self,
        offset: usize,
        length: usize,
        src: &[u8],
    ) -> Result<(), VMError> {
        if length == 0 {
            return Ok(());
        }
        self.ensure_capacity_for_bytes(offset, length)?;
        let copy_len = src.len().min(length);
        let pad_len = length - copy_len;
        #[allow(unsafe_code, clippy::indexing_slicing)]
        unsafe {
            if pad_len > 0 {
                self.buffer
                    .get_unchecked_mut(offset..offset.wrapping_add(pad_len))
                    .fill(0);
            }
            self.buffer
                .get_unchecked_mut(offset.wrapping_add(pad_len)..offset.wrapping_add(length))
                .copy_from_slice(src.get_unchecked(src.len() - copy_len..));
        }
        self.last_updated = Some((offset, length));
        Ok(())
    }

    pub fn get_bytes(&mut self, offset: usize, length: usize) -> Result<Bytes, VMError> {
        if length == 0 {
            return Ok(Bytes::new());
        }
        self.ensure_capacity_for_bytes(offset, length)?;
        // SAFETY: ensure_capacity_for_bytes just grew the buffer to cover the range.
        #[allow(unsafe_code)]
        let slice = unsafe {
            self.buffer
                .get_unchecked(offset..offset.wrapping_add(length))
        };
        Ok(Bytes::copy_from_slice(slice))
    }

    pub fn get_word(&mut self, offset: usize) -> Result<U256, VMError> {
        let bytes = self.get_bytes(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        Ok(U256::from_big_endian(&bytes))
    }

    pub fn set_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        let mut buf = [0u8; WORD_SIZE_IN_BYTES_USIZE];
        word.to_big_endian(&mut buf);
        self.set_bytes(offset, WORD_SIZE_IN_BYTES_USIZE, &buf)
    }

    /// Copies `length` bytes from `src` to `dst` within this memory,
    /// behaving correctly for overlapping ranges (as `memmove`).
    pub fn copy(&mut self, dst: usize, src: usize, length: usize) -> Result<(), VMError> {
        if length == 0 {
            return Ok(());
        }
        let touches = dst.max(src).checked_add(length).ok_or(InternalError::Overflow)?;
        self.ensure_capacity_for_bytes(0, touches)?;
        let src_end = src.checked_add(length).ok_or(InternalError::Overflow)?;
        self.buffer.copy_within(src..src_end, dst);
        self.last_updated = Some((dst, length));
        Ok(())
    }
}

/// Gas cost of a memory expansion from `current_memory_size` to `new_memory_size`, in bytes.
pub fn expansion_cost(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    if new_memory_size <= current_memory_size {
        return Ok(0);
    }
    // new_memory_size > current_memory_size, and cost is monotone, so this cannot underflow.
    Ok(cost(new_memory_size)?.wrapping_sub(cost(current_memory_size)?))
}

fn cost(memory_size: usize) -> Result<u64, VMError> {
    let memory_size = u64::try_from(memory_size).map_err(|_| InternalError::TypeConversion)?;
    let words = memory_size.div_ceil(WORD_SIZE_IN_BYTES_U64);
    #[allow(clippy::arithmetic_side_effects)]
    let gas_cost = words * words / MEMORY_EXPANSION_QUOTIENT + 3 * words;
    Ok(gas_cost)
}

pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    offset
        .checked_add(size)
        .and_then(|sum| sum.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or(OutOfBounds.into())
}
