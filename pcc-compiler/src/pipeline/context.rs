//! Compilation context passed through pipeline phases.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use eyre::{Result, eyre};
use indexmap::IndexSet;
use pcc_core::{CompilerOutput, DiagnosticSet, Flag, ProgramName, Severity};
use pcc_engine::{
    ApplyResult, InstallOutcome, KEEP_LINE_NUMBERS, ModelEngine, ModuleRef, Program, SupportCache,
    SupportModule, TransformStep,
};
use pcc_ir::AggregateProgram;

use super::PipelineState;
use crate::{CompileOptions, Error, Toolchain, resolve::SourceParser};

/// Programs this compiler has installed in its engine.
///
/// Support modules stay installed for the life of the compiler. Every other
/// program is tracked from the moment it is installed until the engine
/// confirms it is gone, so the next compile can remove anything left over.
#[derive(Debug, Default)]
pub struct InstalledModels {
    programs: IndexSet<ProgramName>,
    support: HashSet<SupportModule>,
}

impl InstalledModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an installed program.
    pub fn insert(&mut self, program: ProgramName) -> bool {
        self.programs.insert(program)
    }

    /// Forget a program the engine no longer holds.
    pub fn remove(&mut self, program: &ProgramName) -> bool {
        self.programs.shift_remove(program)
    }

    pub fn contains(&self, program: &ProgramName) -> bool {
        self.programs.contains(program)
    }

    /// Tracked programs, in installation order.
    pub fn programs(&self) -> impl Iterator<Item = &ProgramName> {
        self.programs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn has_support(&self, module: SupportModule) -> bool {
        self.support.contains(&module)
    }

    fn mark_support(&mut self, module: SupportModule) {
        self.support.insert(module);
    }
}

/// Context passed through all pipeline phases.
///
/// The context borrows the compiler's long-lived parts (engine, parser,
/// installed programs) and owns everything produced by one compile.
pub struct CompilationContext<'a> {
    pub engine: &'a mut dyn ModelEngine,
    pub parser: &'a mut dyn SourceParser,
    pub output: &'a mut dyn CompilerOutput,
    pub options: &'a CompileOptions,
    pub toolchain: &'a Toolchain,
    pub support: &'a SupportCache,
    pub installed: &'a mut InstalledModels,
    /// The file named on the command line.
    pub input: PathBuf,
    /// Diagnostics collected during the compile.
    pub diagnostics: DiagnosticSet,
    pub state: PipelineState,
    /// The resolved root file (set by the parse phase).
    pub root: Option<ProgramName>,
    /// Name of the root module in the engine (set by the parse phase).
    pub root_module: String,
    /// The merged program (set by the parse phase).
    pub program: Option<AggregateProgram>,
    /// Every file that contributed to the program, root first.
    pub files: Vec<ProgramName>,
    /// Files written to the output directory.
    pub generated: Vec<PathBuf>,
}

impl<'a> CompilationContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: &'a mut dyn ModelEngine,
        parser: &'a mut dyn SourceParser,
        output: &'a mut dyn CompilerOutput,
        options: &'a CompileOptions,
        toolchain: &'a Toolchain,
        support: &'a SupportCache,
        installed: &'a mut InstalledModels,
        input: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            parser,
            output,
            options,
            toolchain,
            support,
            installed,
            input: input.into(),
            diagnostics: DiagnosticSet::new(),
            state: PipelineState::Idle,
            root: None,
            root_module: String::new(),
            program: None,
            files: Vec::new(),
            generated: Vec::new(),
        }
    }

    /// The resolved root file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parse phase has not run.
    pub fn root(&self) -> Result<&ProgramName> {
        self.root
            .as_ref()
            .ok_or_else(|| eyre!("no root program; did the parse phase run?"))
    }

    /// Move the compile to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lifecycle does not allow the transition.
    pub fn advance(&mut self, next: PipelineState) -> Result<()> {
        self.state = self.state.advance(next)?;
        tracing::debug!(state = %self.state, "compile advanced");
        Ok(())
    }

    /// Record a diagnostic.
    pub fn add_flag(&mut self, flag: Flag) {
        self.diagnostics.add(flag);
    }

    pub fn add_flags(&mut self, flags: impl IntoIterator<Item = Flag>) {
        self.diagnostics.extend(flags);
    }

    /// Write a progress message straight to the output sink.
    pub fn progress(&mut self, message: &str) {
        tracing::info!("{}", message);
        self.output.write_message(message, Severity::Info);
    }

    pub fn output_dir(&self) -> PathBuf {
        self.options.output_dir()
    }

    /// Base name of the generated outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the parse phase has not run.
    pub fn output_base(&self) -> Result<String> {
        Ok(self.options.output_base(self.root()?))
    }

    /// Name of a program persisted as `{output dir}/{file}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not usable as a program name.
    pub fn output_program(&self, file: &str) -> Result<ProgramName> {
        Ok(ProgramName::new(self.output_dir().join(file))?)
    }

    pub fn support_dir(&self) -> &Path {
        &self.toolchain.support_dir
    }

    pub fn support_ref(&self, module: SupportModule) -> ModuleRef {
        module.module_ref(self.support_dir())
    }

    /// Reference to the root module at the root file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parse phase has not run.
    pub fn root_ref(&self) -> Result<ModuleRef> {
        Ok(ModuleRef::new(self.root_module.clone()).at(self.root()?.to_string()))
    }

    /// Install support modules that are not installed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a module cannot be loaded or installed.
    pub fn ensure_support(&mut self, modules: &[SupportModule]) -> Result<()> {
        for &module in modules {
            if self.installed.has_support(module) {
                continue;
            }
            let program = self
                .support
                .load(module, &self.toolchain.support_dir)
                .map_err(|source| Error::Support {
                    module: module.module_name(),
                    source,
                })?;
            self.install(&program)?;
            self.installed.mark_support(module);
        }
        Ok(())
    }

    /// Install a program that is removed again before the compile ends.
    ///
    /// The program stays tracked until [`uninstall`](Self::uninstall)
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the install fails.
    pub fn install_temporary(&mut self, program: &Program) -> Result<()> {
        self.install(program)?;
        self.installed.insert(program.name.clone());
        Ok(())
    }

    /// Install `program`, treating rejection as fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine does not start or rejects the program.
    pub fn install(&mut self, program: &Program) -> Result<()> {
        let outcome = self
            .engine
            .install(program)
            .wait()
            .map_err(|e| Error::engine("install", e))?;
        check_outcome(outcome, |message| Error::Install {
            program: program.name.clone(),
            message,
        })?;
        tracing::debug!(program = %program.name, "installed");
        Ok(())
    }

    /// Install `program` with line numbers kept in proofs, and record it as
    /// a product of this compile.
    ///
    /// # Errors
    ///
    /// Returns an error if the install fails.
    pub fn install_product(&mut self, program: Program) -> Result<()> {
        let program = program.with_setting(KEEP_LINE_NUMBERS, "TRUE");
        self.install(&program)?;
        self.installed.insert(program.name);
        Ok(())
    }

    /// Uninstall programs this compile installed temporarily and stop
    /// tracking them.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine does not start or refuses. The
    /// programs stay tracked in that case.
    pub fn uninstall(&mut self, programs: &[ProgramName]) -> Result<()> {
        let Some(first) = programs.first().cloned() else {
            return Ok(());
        };
        let outcome = self
            .engine
            .uninstall(programs)
            .wait()
            .map_err(|e| Error::engine("uninstall", e))?;
        check_outcome(outcome, |message| Error::Uninstall {
            program: first,
            message,
        })?;
        for program in programs {
            self.installed.remove(program);
        }
        Ok(())
    }

    /// Apply a transform, keeping its diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine does not start the transform.
    pub fn apply(&mut self, step: &TransformStep) -> Result<ApplyResult> {
        tracing::debug!(step = %step, "applying transform");
        let mut result = self
            .engine
            .apply(step)
            .wait()
            .map_err(|e| Error::engine("apply", e))?;
        self.add_flags(std::mem::take(&mut result.flags));
        Ok(result)
    }

    /// Extract the output `module` of `result` into a program named
    /// `{output dir}/{module}.model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform did not produce `module`.
    pub fn extract(&self, result: &ApplyResult, module: &str) -> Result<Program> {
        self.extract_with_prefix(result, module, OUTPUT_ALIAS_PREFIX)
    }

    /// Like [`extract`](Self::extract), with fact aliases prefixed by
    /// `alias_prefix` instead of [`OUTPUT_ALIAS_PREFIX`].
    ///
    /// # Errors
    ///
    /// Returns an error if the transform did not produce `module`.
    pub fn extract_with_prefix(
        &self,
        result: &ApplyResult,
        module: &str,
        alias_prefix: &str,
    ) -> Result<Program> {
        let name = self.output_program(&format!("{}.model", module))?;
        result
            .output_model(module, name, alias_prefix)
            .ok_or_else(|| Error::MissingOutput(module.to_string()).into())
    }
}

/// Prefix given to aliases of extracted transform outputs.
pub const OUTPUT_ALIAS_PREFIX: &str = "p_compiler__";

fn check_outcome(
    outcome: InstallOutcome,
    error: impl FnOnce(String) -> Error,
) -> std::result::Result<(), Error> {
    if outcome.succeeded {
        return Ok(());
    }
    let message = outcome
        .first_message()
        .unwrap_or("the engine gave no reason")
        .to_string();
    Err(error(message))
}
