use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use pcc_core::ProgramName;
use pcc_engine::{EngineError, SupportError};
use thiserror::Error;

/// Result type for option loading (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(code(pcc::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse compile options")]
    #[diagnostic(code(pcc::options))]
    Options {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not load support module '{module}'")]
    #[diagnostic(
        code(pcc::support_module),
        help("the support modules are expected next to the compiler executable")
    )]
    Support {
        module: &'static str,
        #[source]
        source: SupportError,
    },

    #[error("engine {verb} failed")]
    #[diagnostic(code(pcc::engine))]
    Engine {
        verb: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("could not install '{program}': {message}")]
    #[diagnostic(code(pcc::install))]
    Install { program: ProgramName, message: String },

    #[error("could not uninstall '{program}': {message}")]
    #[diagnostic(code(pcc::uninstall))]
    Uninstall { program: ProgramName, message: String },

    #[error("transform produced no module '{0}'")]
    #[diagnostic(code(pcc::missing_output))]
    MissingOutput(String),

    #[error("Unable to load runtime support file '{path}'")]
    #[diagnostic(code(pcc::runtime_support))]
    RuntimeSupport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot find the model compiler at '{path}'")]
    #[diagnostic(
        code(pcc::model_compiler_missing),
        help("build the model compiler or configure its location in the toolchain")
    )]
    ModelCompilerMissing { path: PathBuf },

    #[error("failed to run the model compiler '{path}'")]
    #[diagnostic(code(pcc::model_compiler_spawn))]
    ModelCompilerSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an options parse error with source context
    pub fn options(source: toml::de::Error, src: &str, filename: &str) -> Box<Self> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Options {
            src: NamedSource::new(filename, src.to_string()),
            span,
            source,
        })
    }

    pub fn engine(verb: &'static str, source: EngineError) -> Self {
        Error::Engine { verb, source }
    }
}

/// Marker for a stage that failed after reporting its own diagnostics.
///
/// The controller stops the compile without adding another diagnostic.
#[derive(Debug, Error)]
#[error("{stage} failed")]
pub struct StageFailed {
    pub stage: &'static str,
}

impl StageFailed {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }
}
