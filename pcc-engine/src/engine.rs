//! The model engine contract.

use pcc_core::{Flag, ProgramName};
use thiserror::Error;

use crate::{ApplyResult, Program, QueryOutcome, RenderResult, TransformStep};

/// Errors reported by a model engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine refused to start the operation.
    #[error("the engine did not start `{verb}`")]
    NotStarted { verb: &'static str },

    #[error("program '{0}' is not installed")]
    NotInstalled(ProgramName),

    #[error("module '{module}' not found in program '{program}'")]
    UnknownModule { program: ProgramName, module: String },

    #[error("invalid query pattern '{0}'")]
    InvalidPattern(String),

    /// Any other engine-side failure.
    #[error("{0}")]
    Failed(String),
}

/// The completion of a long-running engine operation.
///
/// A `Pending` borrows the engine that produced it, so a second operation
/// cannot start on the same engine until this one has been waited on.
#[must_use = "engine operations do nothing until waited on"]
pub struct Pending<'e, T> {
    work: Box<dyn FnOnce() -> Result<T, EngineError> + 'e>,
}

impl<'e, T: 'e> Pending<'e, T> {
    /// An operation that completes when waited on.
    pub fn new(work: impl FnOnce() -> Result<T, EngineError> + 'e) -> Self {
        Self {
            work: Box::new(work),
        }
    }

    /// An operation whose result is already known.
    pub fn ready(result: Result<T, EngineError>) -> Self {
        Self::new(move || result)
    }

    /// An operation the engine refused to start.
    pub fn not_started(verb: &'static str) -> Self {
        Self::ready(Err(EngineError::NotStarted { verb }))
    }

    /// Block until the operation completes.
    pub fn wait(self) -> Result<T, EngineError> {
        (self.work)()
    }
}

/// The outcome of installing or uninstalling programs.
#[derive(Debug, Clone, Default)]
pub struct InstallOutcome {
    pub succeeded: bool,
    /// Messages paired with the name of the node they refer to.
    pub flags: Vec<(String, Flag)>,
}

impl InstallOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            flags: Vec::new(),
        }
    }

    pub fn failure(node: impl Into<String>, flag: Flag) -> Self {
        Self {
            succeeded: false,
            flags: vec![(node.into(), flag)],
        }
    }

    /// The first message, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.flags.first().map(|(_, flag)| flag.message.as_str())
    }
}

/// A rule/model engine session.
///
/// Every operation returns a [`Pending`] completion. The engine evaluates at
/// most one operation at a time; the borrow held by `Pending` enforces that
/// callers wait for each operation before starting the next.
pub trait ModelEngine {
    /// Install a program so its modules can be queried, transformed and
    /// rendered.
    fn install(&mut self, program: &Program) -> Pending<'_, InstallOutcome>;

    /// Retract previously installed programs.
    fn uninstall(&mut self, programs: &[ProgramName]) -> Pending<'_, InstallOutcome>;

    /// Evaluate `goals` against `module` of an installed program.
    fn query(
        &mut self,
        program: &ProgramName,
        module: &str,
        goals: &[&str],
    ) -> Pending<'_, QueryOutcome>;

    /// Run a transform over installed modules.
    fn apply(&mut self, step: &TransformStep) -> Pending<'_, ApplyResult>;

    /// Render an installed module into virtual files using the renderer
    /// configured on its program.
    fn render(&mut self, program: &ProgramName, module: &str) -> Pending<'_, RenderResult>;
}
