//! Rendering of generated models into files.

use eyre::Result;
use pcc_core::{File, Flag, codes};
use pcc_engine::{ACTIVE_RENDERER, PARSERS_COLLECTION, Program};

use crate::{Error, pipeline::CompilationContext};

/// Render the single model of `program` with `renderer` and write every
/// produced file to the output directory, with `appendix` added to the end
/// of each.
///
/// The program is installed only for the duration of the render. Returns
/// whether rendering and every write succeeded; failures are recorded as
/// diagnostics.
///
/// # Errors
///
/// Returns an error if the engine fails or the program cannot be
/// installed.
pub(crate) fn render_program(
    ctx: &mut CompilationContext<'_>,
    program: Program,
    renderer: &str,
    appendix: &str,
) -> Result<bool> {
    let module = match program.models.first() {
        Some(model) => model.name.clone(),
        None => return Err(Error::MissingOutput(program.name.to_string()).into()),
    };
    let program = program
        .with_setting(format!("{}.{}", PARSERS_COLLECTION, renderer), renderer)
        .with_setting(ACTIVE_RENDERER, renderer);
    let name = program.name.clone();

    ctx.install_temporary(&program)?;
    let rendered = ctx
        .engine
        .render(&name, &module)
        .wait()
        .map_err(|e| Error::engine("render", e));
    ctx.uninstall(std::slice::from_ref(&name))?;
    let rendered = rendered?;

    ctx.add_flags(rendered.flags);
    if !rendered.succeeded {
        tracing::debug!(module = %module, renderer, "render failed");
        return Ok(false);
    }

    let out = ctx.output_dir();
    let mut succeeded = true;
    for virtual_file in rendered.files {
        let path = out.join(&virtual_file.name);
        ctx.progress(&format!("Writing {} ...", virtual_file.name));

        let mut file = File::new(&path, virtual_file.contents);
        file.append(appendix);
        match file.write() {
            Ok(()) => ctx.generated.push(path),
            Err(e) => {
                ctx.add_flag(Flag::error(
                    format!("Could not save file {} - {:#}", path.display(), e),
                    codes::SAVE_FAILED,
                ));
                succeeded = false;
            }
        }
    }
    Ok(succeeded)
}
