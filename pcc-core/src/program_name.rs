//! Canonical identities for source files and generated artifacts.
//!
//! A [`ProgramName`] is the key used by the include graph to detect files it
//! has already seen, and the handle passed to the model engine when programs
//! are installed or uninstalled. Two names compare equal when their
//! normalized absolute paths match case-insensitively.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

/// Error produced when a path cannot be turned into a program name.
#[derive(Debug, Error)]
pub enum ProgramNameError {
    #[error("program name is empty")]
    Empty,

    #[error("'{}' is not an absolute path", .0.display())]
    NotAbsolute(PathBuf),
}

/// Canonical, absolute, case-insensitive identity of a program.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "String")]
pub struct ProgramName {
    path: PathBuf,
    key: String,
}

impl ProgramName {
    /// Create a program name from an absolute path.
    ///
    /// The path is normalized lexically: `.` components are dropped and `..`
    /// components remove their parent. The file system is never consulted,
    /// so names can refer to artifacts that do not exist yet.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ProgramNameError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ProgramNameError::Empty);
        }
        if !path.is_absolute() {
            return Err(ProgramNameError::NotAbsolute(path.to_path_buf()));
        }

        let path = normalize(path);
        let key = path.to_string_lossy().to_lowercase();
        Ok(Self { path, key })
    }

    /// Resolve `path` against `base` unless it is already absolute.
    pub fn resolve(base: &Path, path: impl AsRef<Path>) -> Result<Self, ProgramNameError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ProgramNameError::Empty);
        }
        if path.is_absolute() {
            Self::new(path)
        } else {
            Self::new(base.join(path))
        }
    }

    /// The normalized absolute path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory containing this program.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// The final path component (e.g. `main.p`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// The final path component without its extension (e.g. `main`).
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

impl PartialEq for ProgramName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ProgramName {}

impl Hash for ProgramName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ProgramName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProgramName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<ProgramName> for String {
    fn from(name: ProgramName) -> Self {
        name.to_string()
    }
}
