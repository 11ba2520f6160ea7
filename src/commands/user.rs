use anyhow::{Context as _, Result};

use converge::{ApplyContext, Reconciler, UserSpec, Users};

use crate::Context;
use crate::cli::UserArgs;
use crate::commands::{expand_path, local_runner};
use crate::ui;

fn spec_from_args(args: &UserArgs) -> UserSpec {
    UserSpec {
        uid: args.uid,
        group: args.group.clone(),
        groups: args.groups.clone(),
        append_groups: args.append,
        comment: args.comment.clone(),
        home: args.home.as_deref().map(expand_path),
        shell: args.shell.clone(),
        expires: args.expires,
        password: args.password.clone(),
        create_home: !args.no_create_home,
        system: args.system,
    }
}

pub fn run(ctx: &Context, args: UserArgs) -> Result<()> {
    let runner = local_runner(args.apply.sudo);
    let db = sysdb::Files::default();
    let apply = ApplyContext::new(&runner, &ctx.cancel).dry_run(args.apply.dry_run);
    let spec = spec_from_args(&args);

    let result = Users::new(apply, &db)
        .ensure(&args.name, &spec)
        .with_context(|| format!("Failed to converge user {}", args.name))?;

    ui::outcome("user", &args.name, &result, ctx.quiet);
    Ok(())
}
