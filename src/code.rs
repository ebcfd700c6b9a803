//! Structured code sections and code-section control flow (component H).
//!
//! Legacy bytecode is represented as a single section spanning the whole
//! program; EOF-style bytecode carries many sections with declared stack
//! contracts that `CALLF`/`JUMPF`/`RETF` validate against.

use crate::errors::{ExceptionalHalt, VMError};
use crate::return_stack::{ReturnStack, ReturnStackItem};
use bytes::Bytes;

/// The stack contract and entry point of one code section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSection {
    /// Byte offset within the raw bytecode where this section begins.
    pub entry_point: usize,
    /// Stack items this section expects to find on entry.
    pub inputs: usize,
    /// Stack items this section leaves behind on a successful `RETF`.
    pub outputs: usize,
    /// Additional stack depth this section may use beyond `inputs`.
    pub max_stack_height: usize,
}

/// A unit of executable bytecode, legacy or EOF-structured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub raw: Bytes,
    sections: Vec<CodeSection>,
}

impl Code {
    /// Wraps legacy bytecode as a single implicit section 0.
    pub fn legacy(raw: Bytes) -> Self {
        let len = raw.len();
        Self {
            raw,
            sections: vec![CodeSection {
                entry_point: 0,
                inputs: 0,
                outputs: 0,
                max_stack_height: len,
            }],
        }
    }

    /// Wraps EOF-structured bytecode with explicit per-section contracts.
    pub fn structured(raw: Bytes, sections: Vec<CodeSection>) -> Self {
        Self { raw, sections }
    }

    pub fn is_valid(&self) -> bool {
        !self.sections.is_empty()
    }

    pub fn get_section(&self, index: usize) -> Option<&CodeSection> {
        self.sections.get(index)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn entry_point(&self) -> usize {
        self.sections.first().map(|s| s.entry_point).unwrap_or(0)
    }
}

/// The mutable cursor `CALLF`/`JUMPF`/`RETF` operate over, borrowed from the
/// owning frame for the duration of one control-flow operation.
pub struct ControlFlowCursor<'a> {
    pub pc: &'a mut usize,
    pub section: &'a mut usize,
    pub stack_size: usize,
    /// The frame's actually-configured stack bound (`Stack::max_size()`),
    /// not necessarily [`crate::constants::MAX_STACK_SIZE`] — a frame built
    /// with `FrameBuilder::max_stack_size` may use a different limit.
    pub max_stack_size: usize,
    pub return_stack: &'a mut ReturnStack,
}

/// `CALLF target`: push a return site and transfer control into `target`.
pub fn call_function(
    code: &Code,
    cursor: &mut ControlFlowCursor<'_>,
    target: usize,
) -> Result<Option<ExceptionalHalt>, VMError> {
    let Some(target_section) = code.get_section(target) else {
        return Ok(Some(ExceptionalHalt::CodeSectionMissing));
    };

    if cursor
        .stack_size
        .saturating_add(target_section.max_stack_height)
        > cursor.max_stack_size
    {
        return Ok(Some(ExceptionalHalt::TooManyStackItems));
    }

    if cursor.stack_size < target_section.inputs {
        return Ok(Some(ExceptionalHalt::TooFewInputsForCodeSection));
    }

    cursor.return_stack.push(ReturnStackItem {
        section: *cursor.section,
        pc: cursor.pc.wrapping_add(2),
        stack_height: cursor.stack_size - target_section.inputs,
    });

    *cursor.section = target;
    *cursor.pc = target_section.entry_point.wrapping_sub(1);

    Ok(None)
}

/// `JUMPF target`: tail-transfer control into `target` without growing the return stack.
pub fn jump_function(
    code: &Code,
    cursor: &mut ControlFlowCursor<'_>,
    target: usize,
) -> Result<Option<ExceptionalHalt>, VMError> {
    let Some(target_section) = code.get_section(target) else {
        return Ok(Some(ExceptionalHalt::CodeSectionMissing));
    };

    if cursor
        .stack_size
        .saturating_add(target_section.max_stack_height)
        > cursor.max_stack_size
    {
        return Ok(Some(ExceptionalHalt::TooManyStackItems));
    }

    let top = cursor.return_stack.peek()?;
    if cursor.stack_size != top.stack_height + target_section.inputs {
        return Ok(Some(ExceptionalHalt::JumpfStackMismatch));
    }

    *cursor.section = target;
    *cursor.pc = usize::MAX;

    Ok(None)
}

/// Outcome of a successful `RETF`: either control returned to a caller
/// section, or the whole frame completed because the return stack is empty.
pub enum ReturnOutcome {
    Resumed,
    FrameComplete,
}

/// `RETF`: pop the return stack and resume the caller, or complete the frame
/// if no caller remains.
pub fn return_function(
    code: &Code,
    cursor: &mut ControlFlowCursor<'_>,
) -> Result<Result<ReturnOutcome, ExceptionalHalt>, VMError> {
    let current_section = code
        .get_section(*cursor.section)
        .ok_or(ExceptionalHalt::CodeSectionMissing)?;

    let popped = cursor.return_stack.pop()?;
    if cursor.stack_size != popped.stack_height + current_section.outputs {
        // Put the item back: RETF failing must not consume the return stack.
        cursor.return_stack.push(popped);
        return Ok(Err(ExceptionalHalt::IncorrectCodeSectionReturnOutputs));
    }

    if cursor.return_stack.is_empty() {
        return Ok(Ok(ReturnOutcome::FrameComplete));
    }

    *cursor.pc = popped.pc;
    *cursor.section = popped.section;
    Ok(Ok(ReturnOutcome::Resumed))
}
