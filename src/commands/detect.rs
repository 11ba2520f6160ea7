use anyhow::{Context as _, Result};
use std::path::Path;

use crate::Context;
use crate::commands::target_runner;
use crate::ui;

pub fn run(ctx: &Context, host_file: Option<&Path>) -> Result<()> {
    let runner = target_runner(host_file, false)?;
    let target = runner.transport().describe();

    let platform = deploy::detect(&runner, &ctx.cancel)
        .with_context(|| format!("Failed to detect platform of {target}"))?;

    if ctx.quiet {
        println!("{platform}");
        return Ok(());
    }

    ui::header("Platform");
    ui::kv("target", &target);
    ui::kv("os", platform.os.as_str());
    ui::kv("arch", platform.arch.as_str());
    match deploy::target_triple(&platform) {
        Ok(triple) => ui::kv("rust target", triple),
        Err(e) => ui::warn(&format!("No build target: {e}")),
    }
    Ok(())
}
