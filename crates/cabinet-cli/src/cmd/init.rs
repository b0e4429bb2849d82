use std::path::Path;

use cabinet_core::manifest::{scaffold_manifest, ScaffoldOptions, MANIFEST_FILE};

use crate::dispatch::Context;

pub(crate) fn run_init(
    ctx: &Context,
    dir: &Path,
    options: ScaffoldOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = scaffold_manifest(dir, options, &ctx.runtimes())?;
    println!(
        "Wrote {} for '{}' ({})",
        dir.join(MANIFEST_FILE).display(),
        descriptor.name,
        descriptor.language
    );
    Ok(())
}
