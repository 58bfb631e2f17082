use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// A file to be written to the output directory.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    content: String,
}

impl File {
    /// Create a new file with the given path and content
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Append text verbatim to the end of the content
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Write the file, replacing any existing content
    pub fn write(&self) -> Result<()> {
        write_file(&self.path, &self.content)
            .wrap_err_with(|| format!("could not write '{}'", self.path.display()))
    }
}
