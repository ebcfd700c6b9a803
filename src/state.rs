//! The frame lifecycle state machine (component G).

use crate::errors::{InternalError, VMError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The lifecycle state of a [`crate::frame::Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum FrameState {
    NotStarted,
    CodeExecuting,
    /// A child call is in flight; this frame is parked until it completes.
    CodeSuspended,
    CodeSuccess,
    ExceptionalHalt,
    Revert,
    CompletedFailed,
    CompletedSuccess,
}

impl FrameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CompletedSuccess | Self::CompletedFailed)
    }

    /// Whether transitioning from `self` to `next` follows the lifecycle diagram.
    fn allows(self, next: Self) -> bool {
        use FrameState::*;
        matches!(
            (self, next),
            (NotStarted, CodeExecuting)
                | (CodeExecuting, CodeSuspended)
                | (CodeExecuting, CodeSuccess)
                | (CodeExecuting, ExceptionalHalt)
                | (CodeExecuting, Revert)
                | (NotStarted, ExceptionalHalt)
                | (CodeSuspended, CodeExecuting)
                | (CodeSuspended, ExceptionalHalt)
                | (CodeSuccess, CompletedSuccess)
                | (ExceptionalHalt, CompletedFailed)
                | (Revert, CompletedFailed)
        )
    }
}

/// A frame's current lifecycle state, with transitions validated against the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    state: FrameState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: FrameState::NotStarted,
        }
    }

    pub fn current(&self) -> FrameState {
        self.state
    }

    /// Attempts the transition to `next`, returning an [`InternalError`] if
    /// the lifecycle diagram does not allow it from the current state.
    pub fn transition(&mut self, next: FrameState) -> Result<(), VMError> {
        if !self.state.allows(next) {
            tracing::debug!(from = %self.state, to = %next, "rejected illegal frame state transition");
            return Err(InternalError::IllegalStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        tracing::trace!(from = %self.state, to = %next, "frame state transition");
        self.state = next;
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
