//! Locations of the external artifacts the compiler depends on.

use std::path::{Path, PathBuf};

/// Runtime support sources appended to every generated verification file.
pub const RUNTIME_SUPPORT_FILES: [&str; 3] = ["Prt.zing", "PrtTypes.zing", "PrtValues.zing"];

#[cfg(windows)]
const MODEL_COMPILER: &str = "zc.exe";
#[cfg(not(windows))]
const MODEL_COMPILER: &str = "zc";

/// Support modules, the verification-model compiler and its runtime support
/// files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Directory containing the support module programs.
    pub support_dir: PathBuf,
    /// The external verification-model compiler.
    pub model_compiler: PathBuf,
    /// Runtime support files, appended in order to generated verification
    /// files.
    pub runtime_support: Vec<PathBuf>,
}

impl Toolchain {
    /// A toolchain with everything in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            support_dir: dir.to_path_buf(),
            model_compiler: dir.join(MODEL_COMPILER),
            runtime_support: RUNTIME_SUPPORT_FILES
                .iter()
                .map(|name| dir.join(name))
                .collect(),
        }
    }

    /// A toolchain installed next to the running executable.
    pub fn beside_executable() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::in_dir(dir))
    }

    pub fn with_model_compiler(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_compiler = path.into();
        self
    }
}
