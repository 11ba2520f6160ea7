use anyhow::{Context as _, Result};

use converge::{ApplyContext, Directories, DirectorySpec};

use crate::Context;
use crate::cli::DirArgs;
use crate::commands::{expand_path, local_runner};
use crate::ui;

pub fn run(ctx: &Context, args: DirArgs) -> Result<()> {
    let path = expand_path(&args.path);
    let runner = local_runner(false);
    let apply = ApplyContext::new(&runner, &ctx.cancel).dry_run(args.dry_run);

    let result = Directories::new(apply)
        .ensure(&path, &DirectorySpec { mode: args.mode })
        .with_context(|| format!("Failed to converge directory {}", path.display()))?;

    ui::outcome("directory", &path.display().to_string(), &result, ctx.quiet);
    Ok(())
}
