//! Parse phase - resolves the root file and its includes.

use eyre::Result;
use pcc_core::{ProgramName, safe_module_name};
use pcc_engine::SupportModule;

use crate::{
    StageFailed,
    filter::remove_spec_machines,
    pipeline::{CompilationContext, Phase, PipelineState},
    resolve::{bad_file, resolve},
};

/// Phase that builds the aggregate program.
///
/// Outside test mode, specification machines are removed from the result.
pub struct ParsePhase;

impl Phase for ParsePhase {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn description(&self) -> &'static str {
        "Parse the root file and every file it includes"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let root = match ProgramName::resolve(&cwd, &ctx.input) {
            Ok(root) => root,
            Err(e) => {
                let flag = bad_file(ctx.input.display(), e);
                ctx.add_flag(flag);
                return Err(StageFailed::new("parse").into());
            }
        };

        let resolution = match resolve(&root, &mut *ctx.parser) {
            Ok(resolution) => resolution,
            Err(failure) => {
                ctx.add_flags(failure.flags);
                return Err(StageFailed::new("parse").into());
            }
        };
        ctx.add_flags(resolution.flags);

        let program = if ctx.options.test {
            resolution.program
        } else {
            remove_spec_machines(resolution.program)
        };
        tracing::debug!(
            files = resolution.files.len(),
            declarations = program.decl_count(),
            "program resolved"
        );

        ctx.root_module = safe_module_name(&root.file_name(), &SupportModule::reserved_names());
        ctx.root = Some(root);
        ctx.files = resolution.files;
        ctx.program = Some(program);
        ctx.advance(PipelineState::Parsed)
    }
}
