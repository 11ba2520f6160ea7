use anyhow::{Context as _, Result};

use converge::{ApplyContext, GroupSpec, Groups, Reconciler};

use crate::Context;
use crate::cli::GroupArgs;
use crate::commands::local_runner;
use crate::ui;

pub fn run(ctx: &Context, args: GroupArgs) -> Result<()> {
    let runner = local_runner(args.apply.sudo);
    let db = sysdb::Files::default();
    let apply = ApplyContext::new(&runner, &ctx.cancel).dry_run(args.apply.dry_run);

    let mut spec = GroupSpec::new().with_system(args.system);
    spec.gid = args.gid;

    let result = Groups::new(apply, &db)
        .ensure(&args.name, &spec)
        .with_context(|| format!("Failed to converge group {}", args.name))?;

    ui::outcome("group", &args.name, &result, ctx.quiet);
    Ok(())
}
