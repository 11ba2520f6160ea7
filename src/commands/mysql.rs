use anyhow::{Context as _, Result};

use converge::{ApplyContext, CreateUser, MySql, Privilege};

use crate::Context;
use crate::cli::MysqlUserArgs;
use crate::commands::target_runner;
use crate::ui;

pub fn create_user(ctx: &Context, args: MysqlUserArgs) -> Result<()> {
    let runner = target_runner(args.host_file.as_deref(), args.apply.sudo)?;
    let apply = ApplyContext::new(&runner, &ctx.cancel).dry_run(args.apply.dry_run);

    let spec = CreateUser {
        host: Some(args.host.clone()),
        password: args.password.clone(),
        privilege: Privilege {
            database: args.database.clone(),
            table: args.table.clone(),
            privileges: args.privilege.clone(),
        },
    };

    let result = MySql::new(apply)
        .create_user(&args.name, &spec)
        .with_context(|| format!("Failed to create mysql user {}@{}", args.name, args.host))?;

    ui::outcome("mysql user", &format!("{}@{}", args.name, args.host), &result, ctx.quiet);
    Ok(())
}
