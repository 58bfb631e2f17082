//! Pipeline orchestrator.

use eyre::Result;

use super::{
    CompilationContext, Phase, PipelineState, Plugin,
    phases::{CheckPhase, GenerateCPhase, GenerateVerificationPhase, InstallPhase, ParsePhase},
};

/// The compilation pipeline orchestrator.
///
/// The pipeline runs the built-in phases (parse, install, check, generate-c,
/// generate-verification) followed by any added phases, calling plugin
/// hooks around each phase that is enabled for the compile.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::new().plugin(TimingPlugin::new());
/// pipeline.run(&mut ctx)?;
/// ```
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    /// Create a new pipeline with the built-in phases.
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Add a phase to run after the built-in phases.
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    /// Add a plugin to receive phase lifecycle hooks.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Run the pipeline on a prepared context.
    ///
    /// On success the context ends in [`PipelineState::Done`].
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a phase or plugin. The context is
    /// left in the state reached before the error.
    pub fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let builtin_phases: [Box<dyn Phase>; 5] = [
            Box::new(ParsePhase),
            Box::new(InstallPhase),
            Box::new(CheckPhase),
            Box::new(GenerateCPhase),
            Box::new(GenerateVerificationPhase),
        ];

        for phase in builtin_phases.iter().chain(self.phases.iter()) {
            if !phase.enabled(ctx) {
                tracing::debug!(phase = phase.name(), "skipping phase");
                continue;
            }
            self.run_phase(phase.as_ref(), ctx)?;
        }

        ctx.advance(PipelineState::Done)
    }

    /// Run a single phase with plugin hooks.
    fn run_phase(&self, phase: &dyn Phase, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let phase_name = phase.name();
        let _span = tracing::info_span!("phase", name = phase_name).entered();

        for plugin in &self.plugins {
            plugin.on_before_phase(phase_name, ctx)?;
        }

        phase.run(ctx)?;

        for plugin in &self.plugins {
            plugin.on_after_phase(phase_name, ctx)?;
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use pcc_core::CollectedOutput;
    use pcc_engine::SupportCache;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        CompileOptions,
        pipeline::InstalledModels,
        testing::{LineParser, fixture_toolchain, stub_engine},
    };

    struct CountingPlugin {
        before_count: Arc<AtomicUsize>,
        after_count: Arc<AtomicUsize>,
    }

    impl CountingPlugin {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let before = Arc::new(AtomicUsize::new(0));
            let after = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    before_count: before.clone(),
                    after_count: after.clone(),
                },
                before,
                after,
            )
        }
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_before_phase(&self, _phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.before_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_after_phase(&self, _phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.after_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MarkerPhase;

    impl Phase for MarkerPhase {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn description(&self) -> &'static str {
            "Report that the built-in phases finished"
        }

        fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
            ctx.progress("marker ran");
            Ok(())
        }
    }

    fn run_pipeline(
        pipeline: &Pipeline,
        source: &str,
        options: &CompileOptions,
    ) -> (Result<()>, PipelineState, CollectedOutput) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = dir.path().join("main.p");
        std::fs::write(&input, source).expect("Failed to write source");
        let toolchain = fixture_toolchain(dir.path()).expect("Failed to write toolchain");

        let mut engine = stub_engine();
        let mut parser = LineParser::new();
        let mut output = CollectedOutput::new();
        let support = SupportCache::new();
        let mut installed = InstalledModels::new();
        let mut ctx = CompilationContext::new(
            &mut engine,
            &mut parser,
            &mut output,
            options,
            &toolchain,
            &support,
            &mut installed,
            input,
        );
        let result = pipeline.run(&mut ctx);
        let state = ctx.state;
        drop(ctx);
        (result, state, output)
    }

    #[test]
    fn test_pipeline_runs_phases() {
        let options = CompileOptions::new().analyze_only();

        let (result, state, _) = run_pipeline(&Pipeline::new(), "machine Main\n", &options);

        assert!(result.is_ok());
        assert_eq!(state, PipelineState::Done);
    }

    #[test]
    fn test_pipeline_plugin_hooks() {
        let options = CompileOptions::new().analyze_only();
        let (plugin, before_count, after_count) = CountingPlugin::new();

        let pipeline = Pipeline::new().plugin(plugin);
        let (result, _, _) = run_pipeline(&pipeline, "machine Main\n", &options);

        assert!(result.is_ok());
        // parse, install and check; both generate phases are disabled
        assert_eq!(before_count.load(Ordering::SeqCst), 3);
        assert_eq!(after_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failed_phase_skips_after_hook() {
        let options = CompileOptions::new().analyze_only();
        let (plugin, before_count, after_count) = CountingPlugin::new();

        let pipeline = Pipeline::new().plugin(plugin);
        let (result, state, _) = run_pipeline(&pipeline, "while true\n", &options);

        assert!(result.is_err());
        assert_eq!(state, PipelineState::Idle);
        assert_eq!(before_count.load(Ordering::SeqCst), 1);
        assert_eq!(after_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_added_phase_runs_last() {
        let options = CompileOptions::new().analyze_only();

        let pipeline = Pipeline::new().phase(MarkerPhase);
        let (result, _, output) = run_pipeline(&pipeline, "machine Main\n", &options);

        assert!(result.is_ok());
        assert_eq!(output.lines(pcc_core::Severity::Info), vec!["marker ran"]);
    }
}
