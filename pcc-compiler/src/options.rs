//! Compile options.

use std::path::{Path, PathBuf};

use clap::Args;
use pcc_core::{FileNames, FlagFormatter, FlagStyle, ProgramName};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Options controlling one compile.
///
/// Embeds into a command line with `#[command(flatten)]`, or loads from a
/// TOML file with [`CompileOptions::from_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompileOptions {
    /// Directory generated files are written to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base name of generated files (defaults to the input file name without extension)
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// Compile for testing: keep specification machines and generate the verification model
    #[arg(long)]
    pub test: bool,

    /// Stop after static analysis
    #[arg(long)]
    pub analyze: bool,

    /// Do not generate C output
    #[arg(long = "no-c")]
    pub no_c_output: bool,

    /// Report the inferred type of every expression
    #[arg(long)]
    pub print_types: bool,

    /// Print file names instead of full paths in diagnostics
    #[arg(long)]
    pub short_names: bool,

    /// Report how long each compilation stage takes
    #[arg(long)]
    pub profile: bool,

    /// Write the serialized program model next to the generated files
    #[arg(long)]
    pub emit_model: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        Self::from_str_with_filename(&content, &path.display().to_string())
    }

    /// Parse options from TOML with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::options(e, content, filename))
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn test_mode(mut self) -> Self {
        self.test = true;
        self
    }

    pub fn analyze_only(mut self) -> Self {
        self.analyze = true;
        self
    }

    pub fn without_c_output(mut self) -> Self {
        self.no_c_output = true;
        self
    }

    pub fn print_types(mut self) -> Self {
        self.print_types = true;
        self
    }

    pub fn short_names(mut self) -> Self {
        self.short_names = true;
        self
    }

    pub fn profile(mut self) -> Self {
        self.profile = true;
        self
    }

    pub fn emit_model(mut self) -> Self {
        self.emit_model = true;
        self
    }

    /// The directory generated files go to.
    ///
    /// A relative directory is resolved against the current directory.
    pub fn output_dir(&self) -> PathBuf {
        let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd().join(dir),
            None => cwd(),
        }
    }

    /// The base name of generated files for a compile rooted at `root`.
    pub fn output_base(&self, root: &ProgramName) -> String {
        self.output_name
            .clone()
            .unwrap_or_else(|| root.file_stem())
    }

    /// How diagnostics are rendered for these options.
    ///
    /// Test compiles print the compact form so expected output can be
    /// compared without error numbers.
    pub fn flag_formatter(&self) -> FlagFormatter {
        let style = if self.test {
            FlagStyle::Compact
        } else {
            FlagStyle::Verbose
        };
        let file_names = if self.short_names {
            FileNames::Short
        } else {
            FileNames::Full
        };
        FlagFormatter::new(style, file_names)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        options: CompileOptions,
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "pc",
            "--output-dir",
            "out",
            "--test",
            "--no-c",
            "--short-names",
        ]);
        assert_eq!(cli.options.output_dir, Some(PathBuf::from("out")));
        assert!(cli.options.test);
        assert!(cli.options.no_c_output);
        assert!(cli.options.short_names);
        assert!(!cli.options.analyze);
    }

    #[test]
    fn test_relative_output_dir_resolved_against_cwd() {
        let options = CompileOptions::new().with_output_dir("out");

        let dir = options.output_dir();

        assert!(dir.is_absolute());
        assert_eq!(dir, std::env::current_dir().unwrap().join("out"));
    }

    #[test]
    fn test_absolute_output_dir_kept() {
        let out = std::env::temp_dir().join("pc-out");
        let options = CompileOptions::new().with_output_dir(&out);

        assert_eq!(options.output_dir(), out);
    }

    #[test]
    fn test_from_toml() {
        let options = CompileOptions::from_str_with_filename(
            r#"
            output-name = "pingpong"
            analyze = true
            print-types = true
        "#,
            "pc.toml",
        )
        .unwrap();

        assert_eq!(options.output_name.as_deref(), Some("pingpong"));
        assert!(options.analyze);
        assert!(options.print_types);
        assert!(!options.test);
    }

    #[test]
    fn test_from_toml_unknown_field() {
        let err = CompileOptions::from_str_with_filename("colour = true", "pc.toml").unwrap_err();
        assert!(matches!(*err, Error::Options { .. }));
    }

    #[test]
    fn test_output_base_defaults_to_stem() {
        let root = ProgramName::new(std::env::temp_dir().join("PingPong.p")).unwrap();
        assert_eq!(CompileOptions::new().output_base(&root), "PingPong");
        assert_eq!(
            CompileOptions::new()
                .with_output_name("out")
                .output_base(&root),
            "out"
        );
    }
}
