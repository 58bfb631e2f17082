//! Client contract for the rule/model engine used by the pcc compiler
//! driver.
//!
//! The engine evaluates type inference, well-formedness checks and
//! term-rewriting transforms over installed programs. The driver only sees it
//! through the [`ModelEngine`] trait:
//!
//! - [`ModelEngine::install`] / [`ModelEngine::uninstall`] manage programs
//! - [`ModelEngine::query`] evaluates goals and yields proof trees
//! - [`ModelEngine::apply`] runs a named transform
//! - [`ModelEngine::render`] prints a module as virtual files
//!
//! Each verb returns a [`Pending`] completion that must be waited on before
//! the engine accepts another operation.

mod engine;
mod model;
mod query;
mod results;
mod support;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::{EngineError, InstallOutcome, ModelEngine, Pending};
pub use model::{
    ACTIVE_RENDERER, Fact, KEEP_LINE_NUMBERS, Model, ModuleRef, PARSERS_COLLECTION, Program,
    Setting, StepArg, TransformStep,
};
pub use query::{Conclusion, Locator, Proof, ProofEnumeration, QueryOutcome, QueryResult};
pub use results::{ApplyResult, RenderResult, VirtualFile};
pub use support::{SupportCache, SupportError, SupportModule};
