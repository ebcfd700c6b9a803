//! The frame stack driver (component O) and parent/child merge (component J).
//!
//! `FrameStack` is the only place in this crate that ever holds two frames
//! at once: the active frame and its ancestors. It exists so that ancestor
//! lookups (warm sets, transient storage) can be expressed as borrows of a
//! slice rather than an owned parent chain, per the non-owning-handle design
//! this crate settled on.

use crate::frame::{Frame, FrameResult};
use crate::state::FrameState;

/// Owns the ancestor chain plus the currently executing frame.
pub struct FrameStack {
    ancestors: Vec<Frame>,
    current: Frame,
}

impl FrameStack {
    pub fn new(root: Frame) -> Self {
        Self {
            ancestors: Vec::new(),
            current: root,
        }
    }

    pub fn current(&self) -> &Frame {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.current
    }

    pub fn ancestors(&self) -> &[Frame] {
        &self.ancestors
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Suspends the active frame and makes `child` the active frame.
    pub fn push_child(&mut self, child: Frame) {
        let parent = std::mem::replace(&mut self.current, child);
        self.ancestors.push(parent);
    }

    /// Completes the active frame against `result`, merging or discarding its
    /// effects into the parent per component J, and restores the parent as
    /// the active frame. Returns the completed child's result and output.
    ///
    /// Panics if called with no suspended parent; callers must check
    /// [`FrameStack::depth`] before calling.
    pub fn complete_child(&mut self, result: FrameResult) -> Result<FrameResult, crate::errors::VMError> {
        let parent = self
            .ancestors
            .pop()
            .ok_or(crate::errors::InternalError::Custom(
                "complete_child called with no suspended parent".to_string(),
            ))?;
        let mut child = std::mem::replace(&mut self.current, parent);

        child.notify_completion(&result)?;

        if result.is_success() {
            let warm_set = child.take_warm_set();
            let transient = child.take_transient_storage();
            self.current.merge_warm_set(warm_set);
            self.current.commit_transient_storage(transient);
            self.current.substate.merge_child(std::mem::take(&mut child.substate));
            tracing::debug!(depth = self.ancestors.len(), "merged completed child frame into parent");
        } else {
            tracing::debug!(depth = self.ancestors.len(), "discarded failed child frame's substate");
        }
        // On failure (ExceptionalHalt or Revert), the child's warm sets,
        // transient storage writes, and substate are simply dropped along
        // with `child`.

        Ok(result)
    }

    /// True once the frame stack is back at the root with no suspended ancestors.
    pub fn is_at_root(&self) -> bool {
        self.ancestors.is_empty()
    }

    pub fn current_state(&self) -> FrameState {
        self.current.state()
    }
}
