//! Generate-verification phase - produces and compiles the verification
//! model.

use std::process::Command;

use eyre::Result;
use pcc_core::{Flag, codes};
use pcc_engine::{ModuleRef, SupportModule, TransformStep};
use pcc_ir::Term;

use super::render::render_program;
use crate::{
    Error, StageFailed,
    pipeline::{CompilationContext, Phase, PipelineState},
};

const VERIFICATION_RENDERER: &str = "Zing";

/// Phase that produces the verification target.
///
/// The root model is first annotated with inferred types. The typed model
/// stays installed until the next compile. The verification transform then
/// lowers both models to a verification program, whose files are rendered
/// with the runtime support sources appended, and the external model
/// compiler turns `{base}.zing` into `{base}.dll`.
pub struct GenerateVerificationPhase;

impl Phase for GenerateVerificationPhase {
    fn name(&self) -> &'static str {
        "generate-verification"
    }

    fn description(&self) -> &'static str {
        "Generate and compile the verification model"
    }

    fn enabled(&self, ctx: &CompilationContext<'_>) -> bool {
        !ctx.options.analyze && ctx.options.test
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let typed = install_typed_model(ctx)?;

        ctx.ensure_support(&[
            SupportModule::VerificationDomain,
            SupportModule::VerificationTransform,
        ])?;
        let base = ctx.output_base()?;
        let zing_file = format!("{}.zing", base);
        let dll_file = format!("{}.dll", base);

        let output = format!("{}_ZingModel", ctx.root_module);
        let step = TransformStep::new(ctx.support_ref(SupportModule::VerificationTransform))
            .module_arg(ctx.root_ref()?)
            .module_arg(typed)
            .constant_arg(Term::str(&zing_file))
            .output(&output);
        let result = ctx.apply(&step)?;
        let program = ctx.extract(&result, &output)?;

        let appendix = runtime_support(ctx)?;
        if !render_program(ctx, program, VERIFICATION_RENDERER, &appendix)? {
            return Err(StageFailed::new("generate-verification").into());
        }

        compile_model(ctx, &zing_file, &dll_file)?;
        ctx.advance(PipelineState::VerificationTargetGenerated)
    }
}

/// Install the root model annotated with inferred types and return a
/// reference to it.
fn install_typed_model(ctx: &mut CompilationContext<'_>) -> Result<ModuleRef> {
    ctx.ensure_support(&[SupportModule::InferredTypesTransform])?;

    let output = format!("{}_WithTypes", ctx.root_module);
    let step = TransformStep::new(ctx.support_ref(SupportModule::InferredTypesTransform))
        .module_arg(ctx.root_ref()?)
        .output(&output);
    let result = ctx.apply(&step)?;
    // the typed model keeps the root model's aliases
    let program = ctx.extract_with_prefix(&result, &output, "")?;
    let reference = ModuleRef::new(output).at(program.name.to_string());

    ctx.install_product(program)?;
    Ok(reference)
}

/// The runtime support sources, concatenated in order.
fn runtime_support(ctx: &CompilationContext<'_>) -> Result<String> {
    let mut text = String::new();
    for path in &ctx.toolchain.runtime_support {
        let source = std::fs::read_to_string(path).map_err(|source| Error::RuntimeSupport {
            path: path.clone(),
            source,
        })?;
        text.push_str(&source);
    }
    Ok(text)
}

/// Run the model compiler on the rendered verification file.
fn compile_model(ctx: &mut CompilationContext<'_>, zing_file: &str, dll_file: &str) -> Result<()> {
    let compiler = ctx.toolchain.model_compiler.clone();
    if !compiler.is_file() {
        return Err(Error::ModelCompilerMissing { path: compiler }.into());
    }

    let out = ctx.output_dir();
    ctx.progress(&format!("Compiling {} to {} ...", zing_file, dll_file));
    let output = Command::new(&compiler)
        .arg("/nowarn:292")
        .arg(format!("/out:{}", out.join(dll_file).display()))
        .arg(out.join(zing_file))
        .output()
        .map_err(|source| Error::ModelCompilerSpawn {
            path: compiler.clone(),
            source,
        })?;

    if !output.status.success() {
        tracing::debug!(status = %output.status, "model compiler failed");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut message = String::from("The model compiler failed to compile the generated code");
        if !stdout.trim().is_empty() {
            message.push('\n');
            message.push_str(stdout.trim_end());
        }
        let flag = Flag::error(message, codes::FATAL).in_program(ctx.root.clone());
        ctx.add_flag(flag);
        return Err(StageFailed::new("generate-verification").into());
    }
    Ok(())
}
