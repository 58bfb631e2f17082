//! Lifecycle of a single compile.

use std::fmt;

use thiserror::Error;

/// How far a compile has progressed.
///
/// A compile moves forward through the states in order. Code generation may
/// skip the C target (`Checked` to `VerificationTargetGenerated`) and any
/// state after `Checked` may finish. `Failed` is reachable from every state
/// and is final, as is `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Parsed,
    ModelInstalled,
    Checked,
    CTargetGenerated,
    VerificationTargetGenerated,
    Done,
    Failed,
}

/// An attempted transition the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move from {from} to {to}")]
pub struct StateError {
    pub from: PipelineState,
    pub to: PipelineState,
}

impl PipelineState {
    /// Whether a compile in this state has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, Parsed)
            | (Parsed, ModelInstalled)
            | (ModelInstalled, Checked)
            | (Checked, CTargetGenerated)
            | (Checked | CTargetGenerated, VerificationTargetGenerated)
            | (Checked | CTargetGenerated | VerificationTargetGenerated, Done) => true,
            _ => false,
        }
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn advance(self, next: PipelineState) -> Result<PipelineState, StateError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(StateError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Parsed => "parsed",
            PipelineState::ModelInstalled => "model-installed",
            PipelineState::Checked => "checked",
            PipelineState::CTargetGenerated => "c-target-generated",
            PipelineState::VerificationTargetGenerated => "verification-target-generated",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}
