//! The compilation pipeline.
//!
//! A compile runs a fixed sequence of [`Phase`]s over a shared
//! [`CompilationContext`]:
//!
//! - `parse` resolves the root file and its includes into one program
//! - `install` serializes the program and installs it in the engine
//! - `check` queries the engine and turns failed proofs into diagnostics
//! - `generate-c` lowers the checked program to C and links it
//! - `generate-verification` lowers it to a verification model and compiles
//!   that with the external model compiler
//!
//! Phases that do not apply to the current options are skipped. Plugins
//! receive hooks before and after every phase that runs.
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::new().plugin(TimingPlugin::new());
//! pipeline.run(&mut ctx)?;
//! ```

mod context;
mod phase;
pub mod phases;
mod plugin;
mod runner;
mod state;
mod timing;

pub use context::{CompilationContext, InstalledModels};
pub use phase::{Phase, PhaseInfo};
pub use plugin::Plugin;
pub use runner::Pipeline;
pub use state::{PipelineState, StateError};
pub use timing::TimingPlugin;
