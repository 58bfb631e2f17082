//! Built-in pipeline phases.

mod check;
mod generate_c;
mod generate_verification;
mod install;
mod parse;
mod render;

pub use check::{CheckPhase, ERROR_PATTERNS, ErrorPattern};
pub use generate_c::GenerateCPhase;
pub use generate_verification::GenerateVerificationPhase;
pub use install::InstallPhase;
pub use parse::ParsePhase;
