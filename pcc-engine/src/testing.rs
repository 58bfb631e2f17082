//! Test utilities for code driving a model engine.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::collections::HashMap;

use indexmap::IndexMap;
use pcc_core::{Flag, ProgramName};
use pcc_ir::Term;

use crate::{
    ACTIVE_RENDERER, ApplyResult, Conclusion, EngineError, InstallOutcome, Model, ModelEngine,
    Pending, Program, Proof, ProofEnumeration, QueryOutcome, QueryResult, RenderResult, StepArg,
    TransformStep, VirtualFile,
};

/// An engine operation recorded by [`StubEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Install(ProgramName),
    Uninstall(Vec<ProgramName>),
    Query { program: ProgramName, module: String },
    Apply(String),
    Render { program: ProgramName, module: String },
}

/// What the stub reports when a module is checked.
#[derive(Debug, Clone)]
pub struct StubCheck {
    pub conclusion: Conclusion,
    pub proofs: Vec<Proof>,
    pub flags: Vec<Flag>,
}

impl StubCheck {
    /// A passing check with no proofs.
    pub fn pass() -> Self {
        Self {
            conclusion: Conclusion::True,
            proofs: Vec::new(),
            flags: Vec::new(),
        }
    }

    /// A failing check reporting `proofs`.
    pub fn fail(proofs: Vec<Proof>) -> Self {
        Self {
            conclusion: Conclusion::False,
            proofs,
            flags: Vec::new(),
        }
    }
}

type CheckFn = Box<dyn Fn(&Model) -> StubCheck>;
type TransformFn = Box<dyn Fn(&[Model], &[Term]) -> Vec<Model>>;

/// An in-memory engine.
///
/// Installs are tracked by program name and duplicates are rejected, like a
/// real session. Queries run a pluggable check over the queried model.
/// Transforms are closures registered by name; their results are renamed to
/// the step's output names. Rendering turns `File(name, body)` facts of the
/// rendered module into virtual files, unless the module has
/// `RenderError(message)` facts, which make the render fail.
pub struct StubEngine {
    installed: IndexMap<ProgramName, Program>,
    calls: Vec<EngineCall>,
    check: CheckFn,
    transforms: HashMap<String, TransformFn>,
    refuse: Option<&'static str>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            installed: IndexMap::new(),
            calls: Vec::new(),
            check: Box::new(|_| StubCheck::pass()),
            transforms: HashMap::new(),
            refuse: None,
        }
    }

    /// Use `check` to answer queries.
    pub fn with_check(mut self, check: impl Fn(&Model) -> StubCheck + 'static) -> Self {
        self.check = Box::new(check);
        self
    }

    /// Register a transform under its module name.
    pub fn with_transform(
        mut self,
        name: impl Into<String>,
        transform: impl Fn(&[Model], &[Term]) -> Vec<Model> + 'static,
    ) -> Self {
        self.transforms.insert(name.into(), Box::new(transform));
        self
    }

    /// Refuse to start any operation named `verb`.
    pub fn refusing(mut self, verb: &'static str) -> Self {
        self.refuse = Some(verb);
        self
    }

    /// Change which operation is refused on a running engine.
    pub fn set_refusing(&mut self, verb: Option<&'static str>) {
        self.refuse = verb;
    }

    /// Every operation started so far, in order.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Names of the currently installed programs, in installation order.
    pub fn installed(&self) -> Vec<&ProgramName> {
        self.installed.keys().collect()
    }

    pub fn is_installed(&self, program: &ProgramName) -> bool {
        self.installed.contains_key(program)
    }

    pub fn program(&self, program: &ProgramName) -> Option<&Program> {
        self.installed.get(program)
    }

    fn refuses(&self, verb: &str) -> bool {
        self.refuse == Some(verb)
    }

    fn find_model(&self, module: &str) -> Option<&Model> {
        self.installed
            .values()
            .find_map(|program| program.model(module))
    }

    fn installed_model(&self, program: &ProgramName, module: &str) -> Result<&Model, EngineError> {
        let installed = self
            .installed
            .get(program)
            .ok_or_else(|| EngineError::NotInstalled(program.clone()))?;
        installed
            .model(module)
            .ok_or_else(|| EngineError::UnknownModule {
                program: program.clone(),
                module: module.to_string(),
            })
    }

    fn run_transform(&self, step: &TransformStep) -> Result<ApplyResult, EngineError> {
        if let Some(location) = &step.transform.location
            && let Ok(name) = ProgramName::new(location)
            && !self.installed.contains_key(&name)
        {
            return Err(EngineError::NotInstalled(name));
        }
        let transform = self.transforms.get(&step.transform.name).ok_or_else(|| {
            EngineError::Failed(format!("unknown transform '{}'", step.transform.name))
        })?;

        let mut modules = Vec::new();
        let mut constants = Vec::new();
        for arg in &step.args {
            match arg {
                StepArg::Module(module) => {
                    let model = self.find_model(&module.name).ok_or_else(|| {
                        EngineError::Failed(format!("module '{}' is not installed", module.name))
                    })?;
                    modules.push(model.clone());
                }
                StepArg::Constant(term) => constants.push(term.clone()),
            }
        }

        let mut result = ApplyResult::new();
        for (mut model, output) in transform(&modules, &constants)
            .into_iter()
            .zip(&step.outputs)
        {
            model.name = output.clone();
            result = result.with_output(model);
        }
        Ok(result)
    }
}

struct StubQuery {
    check: StubCheck,
}

impl QueryResult for StubQuery {
    fn conclusion(&self) -> Conclusion {
        self.check.conclusion
    }

    fn enumerate_proofs(
        &self,
        pattern: &str,
        max_per_goal: usize,
    ) -> Result<ProofEnumeration, EngineError> {
        let pattern = Pattern::parse(pattern)?;
        let mut per_goal: HashMap<String, usize> = HashMap::new();
        let mut proofs = Vec::new();
        for proof in &self.check.proofs {
            if !pattern.matches(&proof.conclusion) {
                continue;
            }
            let seen = per_goal.entry(proof.conclusion.to_string()).or_default();
            if *seen < max_per_goal {
                *seen += 1;
                proofs.push(proof.clone());
            }
        }
        Ok(ProofEnumeration {
            proofs,
            flags: Vec::new(),
        })
    }
}

/// A query pattern such as `TypeOf(_, _, ERROR)`: a functor with argument
/// wildcards or printed constants.
struct Pattern<'a> {
    functor: &'a str,
    args: Vec<&'a str>,
}

impl<'a> Pattern<'a> {
    fn parse(pattern: &'a str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidPattern(pattern.to_string());
        let (functor, rest) = pattern.split_once('(').ok_or_else(invalid)?;
        let inner = rest.trim_end().strip_suffix(')').ok_or_else(invalid)?;
        let args = inner
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        Ok(Self {
            functor: functor.trim(),
            args,
        })
    }

    fn matches(&self, term: &Term) -> bool {
        term.functor() == Some(self.functor)
            && term.args().len() == self.args.len()
            && self
                .args
                .iter()
                .zip(term.args())
                .all(|(p, arg)| *p == "_" || *p == arg.to_string())
    }
}

impl ModelEngine for StubEngine {
    fn install(&mut self, program: &Program) -> Pending<'_, InstallOutcome> {
        if self.refuses("install") {
            return Pending::not_started("install");
        }
        self.calls.push(EngineCall::Install(program.name.clone()));
        if self.installed.contains_key(&program.name) {
            return Pending::ready(Ok(InstallOutcome::failure(
                program.name.to_string(),
                Flag::error(format!("program '{}' is already installed", program.name), 0),
            )));
        }
        self.installed
            .insert(program.name.clone(), program.clone());
        Pending::ready(Ok(InstallOutcome::success()))
    }

    fn uninstall(&mut self, programs: &[ProgramName]) -> Pending<'_, InstallOutcome> {
        if self.refuses("uninstall") {
            return Pending::not_started("uninstall");
        }
        self.calls.push(EngineCall::Uninstall(programs.to_vec()));
        if let Some(missing) = programs.iter().find(|p| !self.installed.contains_key(*p)) {
            return Pending::ready(Ok(InstallOutcome::failure(
                missing.to_string(),
                Flag::error(format!("program '{}' is not installed", missing), 0),
            )));
        }
        for program in programs {
            self.installed.shift_remove(program);
        }
        Pending::ready(Ok(InstallOutcome::success()))
    }

    fn query(
        &mut self,
        program: &ProgramName,
        module: &str,
        _goals: &[&str],
    ) -> Pending<'_, QueryOutcome> {
        if self.refuses("query") {
            return Pending::not_started("query");
        }
        self.calls.push(EngineCall::Query {
            program: program.clone(),
            module: module.to_string(),
        });
        let result = self.installed_model(program, module).map(|model| {
            let check = (self.check)(model);
            QueryOutcome {
                flags: check.flags.clone(),
                result: Box::new(StubQuery { check }) as Box<dyn QueryResult>,
            }
        });
        Pending::ready(result)
    }

    fn apply(&mut self, step: &TransformStep) -> Pending<'_, ApplyResult> {
        if self.refuses("apply") {
            return Pending::not_started("apply");
        }
        self.calls.push(EngineCall::Apply(step.transform.name.clone()));
        let result = self.run_transform(step);
        Pending::ready(result)
    }

    fn render(&mut self, program: &ProgramName, module: &str) -> Pending<'_, RenderResult> {
        if self.refuses("render") {
            return Pending::not_started("render");
        }
        self.calls.push(EngineCall::Render {
            program: program.clone(),
            module: module.to_string(),
        });
        let renderer = self
            .installed
            .get(program)
            .and_then(|p| p.setting(ACTIVE_RENDERER));
        if renderer.is_none() {
            return Pending::ready(Ok(RenderResult::failure(vec![Flag::error(
                format!("no renderer configured for '{}'", program),
                0,
            )])));
        }
        let result = self.installed_model(program, module).map(|model| {
            let errors: Vec<Flag> = model
                .facts_named("RenderError")
                .filter_map(|fact| fact.term.args().first().and_then(Term::as_str))
                .map(|message| Flag::error(message, 0).in_program(program.clone()))
                .collect();
            if !errors.is_empty() {
                return RenderResult::failure(errors);
            }
            RenderResult::success(
                model
                    .facts
                    .iter()
                    .filter_map(|fact| VirtualFile::from_term(&fact.term))
                    .collect(),
            )
        });
        Pending::ready(result)
    }
}
