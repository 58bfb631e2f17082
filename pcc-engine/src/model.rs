//! The engine's native program representation.
//!
//! A [`Program`] is the unit of installation: a named container of settings
//! and [`Model`]s. Models are sets of [`Fact`]s over a domain. Programs
//! print in the engine's textual syntax, which is also the persisted form
//! written next to generated output.

use std::fmt;

use pcc_core::{File, ProgramName};
use pcc_ir::Term;

/// Keeps source line numbers in proofs so locators point into user files.
pub const KEEP_LINE_NUMBERS: &str = "proofs_KeepLineNumbers";
/// Selects the renderer used to print a module's terms as text.
pub const ACTIVE_RENDERER: &str = "parse_ActiveRenderer";
/// Prefix of the settings that register a renderer by name.
pub const PARSERS_COLLECTION: &str = "parsers";

/// A program-level configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A reference to a module, optionally qualified by the program it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
    pub location: Option<String>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {:?}", self.name, location),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One fact of a model, optionally bound to an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub alias: Option<String>,
    pub term: Term,
}

impl Fact {
    pub fn new(term: Term) -> Self {
        Self { alias: None, term }
    }

    pub fn aliased(alias: impl Into<String>, term: Term) -> Self {
        Self {
            alias: Some(alias.into()),
            term,
        }
    }
}

/// A named set of facts conforming to a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub domain: ModuleRef,
    pub facts: Vec<Fact>,
}

impl Model {
    pub fn new(name: impl Into<String>, domain: ModuleRef) -> Self {
        Self {
            name: name.into(),
            domain,
            facts: Vec::new(),
        }
    }

    pub fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    /// Facts whose term is an application of `functor`.
    pub fn facts_named<'a>(&'a self, functor: &'a str) -> impl Iterator<Item = &'a Fact> {
        self.facts
            .iter()
            .filter(move |fact| fact.term.functor() == Some(functor))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model {} of {}", self.name, self.domain)?;
        writeln!(f, "{{")?;
        for fact in &self.facts {
            match &fact.alias {
                Some(alias) => writeln!(f, "  {} is {}.", alias, fact.term)?,
                None => writeln!(f, "  {}.", fact.term)?,
            }
        }
        write!(f, "}}")
    }
}

/// A unit of installation.
///
/// Programs built by the compiler carry models. Support programs loaded from
/// disk carry their verbatim `source` text instead; the engine parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: ProgramName,
    pub settings: Vec<Setting>,
    pub models: Vec<Model>,
    pub source: Option<String>,
}

impl Program {
    pub fn new(name: ProgramName) -> Self {
        Self {
            name,
            settings: Vec::new(),
            models: Vec::new(),
            source: None,
        }
    }

    /// A program backed by source text the engine parses on install.
    pub fn from_source(name: ProgramName, source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(name)
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.push(Setting::new(key, value));
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// The program's printed form as a file at `path`.
    pub fn to_file(&self, path: impl Into<std::path::PathBuf>) -> File {
        File::new(path, self.to_string())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.settings.is_empty() {
            writeln!(f, "[")?;
            for setting in &self.settings {
                writeln!(f, "  {} = {:?}", setting.key, setting.value)?;
            }
            writeln!(f, "]")?;
            writeln!(f)?;
        }
        if let Some(source) = &self.source {
            writeln!(f, "{}", source.trim_end())?;
        }
        for (i, model) in self.models.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", model)?;
        }
        Ok(())
    }
}

/// An argument of a transform application.
#[derive(Debug, Clone, PartialEq)]
pub enum StepArg {
    Module(ModuleRef),
    Constant(Term),
}

/// Application of a named transform to modules and constants, binding the
/// produced modules to `outputs` in order.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStep {
    pub transform: ModuleRef,
    pub args: Vec<StepArg>,
    pub outputs: Vec<String>,
}

impl TransformStep {
    pub fn new(transform: ModuleRef) -> Self {
        Self {
            transform,
            args: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn module_arg(mut self, module: ModuleRef) -> Self {
        self.args.push(StepArg::Module(module));
        self
    }

    pub fn constant_arg(mut self, value: Term) -> Self {
        self.args.push(StepArg::Constant(value));
        self
    }

    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}(", self.outputs.join(", "), self.transform.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match arg {
                StepArg::Module(module) => write!(f, "{}", module.name)?,
                StepArg::Constant(term) => write!(f, "{}", term)?,
            }
        }
        write!(f, ")")
    }
}
