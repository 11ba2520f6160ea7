use anyhow::{Context as _, Result};

use converge::{ApplyContext, GitCheckout, GitCheckoutSpec};

use crate::Context;
use crate::cli::GitArgs;
use crate::commands::{expand_path, local_runner};
use crate::ui;

fn spec_from_args(args: &GitArgs) -> GitCheckoutSpec {
    let mut spec = GitCheckoutSpec::new(&args.repo, expand_path(&args.dest))
        .with_remote(&args.remote)
        .with_version(&args.version)
        .with_depth(args.depth)
        .with_bare(args.bare);
    spec.refspec = args.refspec.clone();
    spec.reference = args.reference.clone();
    spec
}

pub fn run(ctx: &Context, args: GitArgs) -> Result<()> {
    let runner = local_runner(args.apply.sudo);
    let apply = ApplyContext::new(&runner, &ctx.cancel).dry_run(args.apply.dry_run);
    let spec = spec_from_args(&args);

    let result = GitCheckout::new(apply)
        .ensure(&spec)
        .with_context(|| format!("Failed to converge checkout {}", spec.dest.display()))?;

    let subject = format!("{} @ {}", spec.dest.display(), spec.version);
    ui::outcome("checkout", &subject, &result, ctx.quiet);
    Ok(())
}
