//! Core types and utilities for the pcc compiler driver.
//!
//! This crate provides the fundamental types shared by every stage of the
//! compiler: program identities, source spans, diagnostics and the sinks
//! they are flushed to.

mod diagnostic;
mod diagnostics;
mod file;
mod output;
mod program_name;
mod utils;

// Diagnostics
pub use diagnostic::{Flag, Severity, Span, codes};
pub use diagnostics::{DiagnosticSet, ERROR_NUMBER, FileNames, FlagFormatter, FlagStyle};
// File operations
pub use file::File;
// Output sinks
pub use output::{CollectedOutput, CompilerOutput, StandardOutput, StreamOutput};
// Program identities
pub use program_name::{ProgramName, ProgramNameError};
// String utilities
pub use utils::safe_module_name;
