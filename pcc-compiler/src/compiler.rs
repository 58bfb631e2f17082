//! The compile controller.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use eyre::Result;
use pcc_core::{CompilerOutput, DiagnosticSet, Flag, ProgramName, Severity, codes};
use pcc_engine::{ModelEngine, SupportCache};
use pcc_ir::AggregateProgram;

use crate::{
    CompileOptions, Error, StageFailed, Toolchain,
    pipeline::{CompilationContext, InstalledModels, Pipeline, PipelineState, TimingPlugin},
    resolve::SourceParser,
};

/// Drives compiles against one engine session.
///
/// A compiler owns its engine session and parser. Support modules are
/// installed into the session on first use and stay installed; everything
/// else a compile installs is removed when the next compile starts, so
/// repeated compiles of the same file behave the same.
pub struct Compiler<E, P> {
    engine: E,
    parser: P,
    toolchain: Toolchain,
    support: Arc<SupportCache>,
    installed: InstalledModels,
    program: Option<AggregateProgram>,
    files: Vec<ProgramName>,
    generated: Vec<PathBuf>,
    state: PipelineState,
}

impl<E: ModelEngine, P: SourceParser> Compiler<E, P> {
    /// Create a compiler using the process-wide support module cache.
    pub fn new(engine: E, parser: P, toolchain: Toolchain) -> Self {
        Self {
            engine,
            parser,
            toolchain,
            support: SupportCache::global(),
            installed: InstalledModels::new(),
            program: None,
            files: Vec::new(),
            generated: Vec::new(),
            state: PipelineState::Idle,
        }
    }

    /// Use `cache` instead of the process-wide support module cache.
    pub fn with_support_cache(mut self, cache: Arc<SupportCache>) -> Self {
        self.support = cache;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Programs installed by the last compile.
    pub fn installed(&self) -> &InstalledModels {
        &self.installed
    }

    /// The program produced by the last successful parse.
    pub fn parsed_program(&self) -> Option<&AggregateProgram> {
        self.program.as_ref()
    }

    /// Files read by the last compile, root first.
    pub fn parsed_files(&self) -> &[ProgramName] {
        &self.files
    }

    /// Files written by the last compile.
    pub fn generated_files(&self) -> &[PathBuf] {
        &self.generated
    }

    /// Where the last compile stopped.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Compile `input`.
    ///
    /// Diagnostics are written to `output` once the compile stops, in
    /// aggregator order, followed by `Compilation failed` if it failed.
    /// Progress messages are written as they happen.
    ///
    /// Returns whether every stage the options ask for succeeded.
    pub fn compile(
        &mut self,
        input: impl AsRef<Path>,
        output: &mut dyn CompilerOutput,
        options: &CompileOptions,
    ) -> bool {
        let input = input.as_ref();
        let _span = tracing::info_span!("compile", input = %input.display()).entered();

        self.program = None;
        self.files.clear();
        self.generated.clear();

        let diagnostics = match self.reset() {
            Ok(()) => self.run_pipeline(input, output, options),
            Err(e) => {
                self.state = PipelineState::Failed;
                let mut diagnostics = DiagnosticSet::new();
                diagnostics.add(fatal(&e, None));
                diagnostics
            }
        };

        let formatter = options.flag_formatter();
        for flag in &diagnostics {
            output.write_message(&formatter.format(flag), flag.severity);
        }
        let succeeded = self.state == PipelineState::Done;
        if !succeeded {
            output.write_message("Compilation failed", Severity::Error);
        }
        tracing::info!(
            state = %self.state,
            errors = diagnostics.error_count(),
            "compile finished"
        );
        succeeded
    }

    fn run_pipeline(
        &mut self,
        input: &Path,
        output: &mut dyn CompilerOutput,
        options: &CompileOptions,
    ) -> DiagnosticSet {
        let mut pipeline = Pipeline::new();
        if options.profile {
            pipeline = pipeline.plugin(TimingPlugin::new());
        }

        let mut ctx = CompilationContext::new(
            &mut self.engine,
            &mut self.parser,
            output,
            options,
            &self.toolchain,
            &self.support,
            &mut self.installed,
            input,
        );
        if let Err(e) = pipeline.run(&mut ctx) {
            if let Some(stage) = e.downcast_ref::<StageFailed>() {
                tracing::debug!(stage = stage.stage, "stage failed");
            } else {
                let flag = fatal(&e, ctx.root.clone());
                ctx.add_flag(flag);
            }
            ctx.state = PipelineState::Failed;
        }

        self.state = ctx.state;
        self.program = ctx.program;
        self.files = ctx.files;
        self.generated = ctx.generated;
        ctx.diagnostics
    }

    /// Remove the programs installed by the previous compile.
    ///
    /// Programs stay tracked until the engine confirms the uninstall, so a
    /// failed reset is retried by the next compile.
    fn reset(&mut self) -> Result<()> {
        self.state = PipelineState::Idle;
        if self.installed.is_empty() {
            return Ok(());
        }
        let programs: Vec<ProgramName> = self.installed.programs().cloned().collect();
        tracing::debug!(count = programs.len(), "uninstalling previous compile");
        let outcome = self
            .engine
            .uninstall(&programs)
            .wait()
            .map_err(|e| Error::engine("uninstall", e))?;
        if !outcome.succeeded {
            return Err(Error::Uninstall {
                program: programs[0].clone(),
                message: outcome
                    .first_message()
                    .unwrap_or("the engine gave no reason")
                    .to_string(),
            }
            .into());
        }
        for program in &programs {
            self.installed.remove(program);
        }
        Ok(())
    }
}

fn fatal(error: &eyre::Report, program: Option<ProgramName>) -> Flag {
    Flag::error(format!("{:#}", error), codes::FATAL).in_program(program)
}
