//! Install phase - serializes the program and installs it in the engine.

use eyre::{Result, eyre};
use pcc_engine::{Program, SupportModule};

use crate::{
    pipeline::{CompilationContext, Phase, PipelineState},
    serialize::ModelSerializer,
};

/// Phase that installs the root model.
///
/// The source domain is installed first if needed. The root program is
/// recorded so the next compile can remove it. With `emit_model`, the
/// serialized program is also written to `{output dir}/{root module}.model`.
pub struct InstallPhase;

impl Phase for InstallPhase {
    fn name(&self) -> &'static str {
        "install"
    }

    fn description(&self) -> &'static str {
        "Serialize the program and install it in the engine"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        ctx.ensure_support(&[SupportModule::SourceDomain])?;

        let root = ctx.root()?.clone();
        let domain = ctx.support_ref(SupportModule::SourceDomain);
        let program = ctx
            .program
            .as_ref()
            .ok_or_else(|| eyre!("no program to install; did the parse phase run?"))?;
        let model = ModelSerializer::new(program).to_model(&ctx.root_module, domain);
        let program = Program::new(root).with_model(model);

        if ctx.options.emit_model {
            let path = ctx
                .output_dir()
                .join(format!("{}.model", ctx.root_module));
            program.to_file(&path).write()?;
            tracing::debug!(path = %path.display(), "model written");
        }

        ctx.install_product(program)?;
        ctx.advance(PipelineState::ModelInstalled)
    }
}
