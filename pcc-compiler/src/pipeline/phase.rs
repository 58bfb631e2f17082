//! Pipeline phase trait.

use eyre::Result;

use super::CompilationContext;

/// Information about a pipeline phase.
#[derive(Debug, Clone)]
pub struct PhaseInfo {
    /// The phase name.
    pub name: &'static str,
    /// A human-readable description.
    pub description: &'static str,
}

/// A stage of the compilation pipeline.
///
/// Phases run in order over the compilation context. A phase that cannot
/// continue either records diagnostics and returns
/// [`StageFailed`](crate::StageFailed), or returns any other error, which
/// the compiler reports as a fatal diagnostic.
pub trait Phase: Send + Sync {
    /// The name of this phase (used in logs and plugin hooks).
    fn name(&self) -> &'static str;

    /// A human-readable description of what this phase does.
    fn description(&self) -> &'static str;

    /// Whether this phase applies to the current compile.
    #[allow(unused_variables)]
    fn enabled(&self, ctx: &CompilationContext<'_>) -> bool {
        true
    }

    /// Run this phase on the compilation context.
    ///
    /// # Errors
    ///
    /// Returns an error if the phase fails. Non-fatal issues are recorded
    /// as diagnostics instead.
    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()>;

    /// Get information about this phase.
    fn info(&self) -> PhaseInfo {
        PhaseInfo {
            name: self.name(),
            description: self.description(),
        }
    }
}
