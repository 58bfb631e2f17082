//! Generate-C phase - lowers the checked program to C and links it.

use eyre::Result;
use pcc_engine::{KEEP_LINE_NUMBERS, ModuleRef, Program, SupportModule, TransformStep};
use pcc_ir::Term;

use super::render::render_program;
use crate::{
    StageFailed,
    pipeline::{CompilationContext, Phase, PipelineState},
};

const C_RENDERER: &str = "C";

/// Phase that produces the C implementation.
///
/// The lowering produces two modules: the C program and a link descriptor.
/// The C program is rendered to files in the output directory. The link
/// descriptor is written to `{output dir}/{root module}_LinkModel.model`,
/// then installed and transformed into the linking C code, which is
/// rendered too.
pub struct GenerateCPhase;

impl Phase for GenerateCPhase {
    fn name(&self) -> &'static str {
        "generate-c"
    }

    fn description(&self) -> &'static str {
        "Generate the C implementation and link it"
    }

    fn enabled(&self, ctx: &CompilationContext<'_>) -> bool {
        !ctx.options.analyze && !ctx.options.no_c_output
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        ctx.ensure_support(&[
            SupportModule::TargetDomain,
            SupportModule::LinkTransform,
            SupportModule::TargetTransform,
        ])?;

        let c_module = format!("{}_CModel", ctx.root_module);
        let link_module = format!("{}_LinkModel", ctx.root_module);
        let step = TransformStep::new(ctx.support_ref(SupportModule::TargetTransform))
            .module_arg(ctx.root_ref()?)
            .constant_arg(Term::str(ctx.output_base()?))
            .constant_arg(Term::id(if ctx.options.test { "TRUE" } else { "FALSE" }))
            .output(&c_module)
            .output(&link_module);
        let result = ctx.apply(&step)?;

        let c_program = ctx.extract(&result, &c_module)?;
        let rendered = render_program(ctx, c_program, C_RENDERER, "")?;

        let link_program = ctx.extract(&result, &link_module)?;
        let path = ctx.output_dir().join(format!("{}.model", link_module));
        link_program.to_file(&path).write()?;
        let linked = link(ctx, link_program)?;

        if !(rendered && linked) {
            return Err(StageFailed::new("generate-c").into());
        }
        ctx.advance(PipelineState::CTargetGenerated)
    }
}

/// Install the link descriptor, lower it to C and render the result.
///
/// The descriptor is uninstalled again whether or not linking succeeds.
fn link(ctx: &mut CompilationContext<'_>, link_program: Program) -> Result<bool> {
    let link_module = link_program
        .models
        .first()
        .map(|model| model.name.clone())
        .unwrap_or_default();
    let link_program = link_program.with_setting(KEEP_LINE_NUMBERS, "TRUE");
    let link_name = link_program.name.clone();
    ctx.install_temporary(&link_program)?;

    let linked = lower_link(ctx, ModuleRef::new(link_module).at(link_name.to_string()));
    ctx.uninstall(std::slice::from_ref(&link_name))?;
    linked
}

fn lower_link(ctx: &mut CompilationContext<'_>, descriptor: ModuleRef) -> Result<bool> {
    let output = format!("{}_CLinkModel", ctx.root_module);
    let step = TransformStep::new(ctx.support_ref(SupportModule::LinkTransform))
        .module_arg(descriptor)
        .output(&output);
    let result = ctx.apply(&step)?;
    let program = ctx.extract(&result, &output)?;
    render_program(ctx, program, C_RENDERER, "")
}
