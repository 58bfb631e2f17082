//! Compilation pipeline driver for the P state-machine language.
//!
//! The driver resolves a root source file and its includes into one
//! program, serializes it into the model engine, checks it, and lowers it to
//! a C implementation and, in test mode, to a compiled verification model.
//!
//! # Module Organization
//!
//! - [`compiler`] - The compile controller ([`Compiler`])
//! - [`pipeline`] - Phases, plugins and the per-compile context
//! - [`resolve`] - Include resolution over a pluggable [`SourceParser`]
//! - [`filter`] - Removal of specification machines
//! - [`alias`] - Collision-free declaration names for the model
//! - [`serialize`] - Conversion of the program into an engine model
//! - [`testing`] - Test doubles (feature-gated)
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = Compiler::new(engine, parser, Toolchain::beside_executable()?);
//! let options = CompileOptions::new().with_output_dir("out");
//! let ok = compiler.compile("main.p", &mut StandardOutput::new(), &options);
//! ```

pub mod alias;
pub mod compiler;
mod error;
pub mod filter;
mod options;
pub mod pipeline;
pub mod resolve;
pub mod serialize;
mod toolchain;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use compiler::Compiler;
pub use error::{Error, Result, StageFailed};
pub use options::CompileOptions;
pub use pipeline::PipelineState;
pub use resolve::{ParseOutput, SourceParser};
pub use toolchain::{RUNTIME_SUPPORT_FILES, Toolchain};
