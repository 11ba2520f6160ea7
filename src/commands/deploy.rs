use anyhow::{Context as _, Result};

use deploy::{CargoBuilder, Deployment, Stage, StageObserver};
use transport::Runner;

use crate::Context;
use crate::cli::DeployArgs;
use crate::commands::{expand_path, load_host};
use crate::ui;

const STAGES: usize = 5;

/// Prints one numbered line per pipeline stage
struct StepPrinter {
    quiet: bool,
    current: usize,
}

impl StageObserver for StepPrinter {
    fn on_stage_start(&mut self, stage: Stage) {
        self.current += 1;
        if !self.quiet {
            ui::step(self.current, STAGES, &stage.to_string());
        }
    }

    fn on_stage_complete(&mut self, _stage: Stage) {}
}

pub fn run(ctx: &Context, args: DeployArgs) -> Result<()> {
    let config = expand_path(&args.config);
    let package_dir = expand_path(&args.package_dir);

    let host = load_host(&config)?;
    let destination = host.destination();
    let runner = Runner::remote(host);
    let builder = CargoBuilder::new(&package_dir, &args.bin);

    let mut printer = StepPrinter {
        quiet: ctx.quiet,
        current: 0,
    };

    let report = Deployment::new(&runner, &builder, &args.bin, &config)
        .run(&ctx.cancel, &mut printer)
        .with_context(|| format!("Deploy of {} to {destination} failed", args.bin))?;

    let stdout = report.output.stdout_str();
    if !stdout.trim().is_empty() {
        print!("{stdout}");
    }
    let stderr = report.output.stderr_str();
    if !stderr.trim().is_empty() {
        eprint!("{stderr}");
    }

    if !ctx.quiet {
        ui::success(&format!("Deployed {} to {destination} ({})", args.bin, report.platform));
        if ctx.verbose > 0 {
            ui::kv("artifact", &report.artifact.display().to_string());
            ui::kv("binary", &report.remote_binary);
            ui::kv("config", &report.remote_config);
        }
    }
    Ok(())
}
