//! Results of transform application and rendering.

use indexmap::IndexMap;
use pcc_core::{Flag, ProgramName};
use pcc_ir::Term;

use crate::{Fact, Model, Program};

/// Modules produced by applying a transform, keyed by output name.
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    pub outputs: IndexMap<String, Model>,
    /// Messages produced while starting the transform.
    pub flags: Vec<Flag>,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, model: Model) -> Self {
        self.outputs.insert(model.name.clone(), model);
        self
    }

    /// Extract an output module into a fresh program named `program`.
    ///
    /// Every fact alias is prefixed with `alias_prefix` so extracted names
    /// never clash with user declarations. Returns `None` if the transform
    /// produced no module called `module`.
    pub fn output_model(
        &self,
        module: &str,
        program: ProgramName,
        alias_prefix: &str,
    ) -> Option<Program> {
        let model = self.outputs.get(module)?;
        let mut extracted = Model::new(model.name.clone(), model.domain.clone());
        extracted.facts = model
            .facts
            .iter()
            .map(|fact| Fact {
                alias: fact
                    .alias
                    .as_ref()
                    .map(|alias| format!("{}{}", alias_prefix, alias)),
                term: fact.term.clone(),
            })
            .collect();
        Some(Program::new(program).with_model(extracted))
    }
}

/// A named text body produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    pub name: String,
    pub contents: String,
}

impl VirtualFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a `File(name, body)` fact. Returns `None` for any other term.
    pub fn from_term(term: &Term) -> Option<Self> {
        if term.functor() != Some("File") {
            return None;
        }
        match term.args() {
            [name, body] => Some(Self::new(name.as_str()?, body.as_str()?)),
            _ => None,
        }
    }
}

/// The outcome of rendering a module.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    pub succeeded: bool,
    pub files: Vec<VirtualFile>,
    pub flags: Vec<Flag>,
}

impl RenderResult {
    pub fn success(files: Vec<VirtualFile>) -> Self {
        Self {
            succeeded: true,
            files,
            flags: Vec::new(),
        }
    }

    pub fn failure(flags: Vec<Flag>) -> Self {
        Self {
            succeeded: false,
            files: Vec::new(),
            flags,
        }
    }
}
