mod cli;
mod commands;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use transport::CancelToken;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Fired by Ctrl+C; running commands are killed
    pub cancel: CancelToken,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted, stopping running commands");
        handler_token.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        cancel,
    };

    let result = match cli.command {
        Command::Detect { host_file } => commands::detect::run(&ctx, host_file.as_deref()),
        Command::Deploy(args) => commands::deploy::run(&ctx, args),
        Command::Group(args) => commands::group::run(&ctx, args),
        Command::User(args) => commands::user::run(&ctx, args),
        Command::Dir(args) => commands::dir::run(&ctx, args),
        Command::Git(args) => commands::git::run(&ctx, args),
        Command::MysqlUser(args) => commands::mysql::create_user(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hostkit", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

/// Print the error chain and, for errors raised by the workspace crates,
/// what to do about them.
fn report(err: &anyhow::Error) {
    if is_cancelled(err) {
        ui::error("Cancelled");
        return;
    }
    ui::error(&format!("{err:#}"));

    let advice = err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<converge::Error>() {
            return Some(e.category().advice());
        }
        if let Some(e) = cause.downcast_ref::<deploy::Error>() {
            return Some(e.category().advice());
        }
        cause
            .downcast_ref::<transport::Error>()
            .map(|e| e.category().advice())
    });
    if let Some(advice) = advice {
        ui::dim(advice);
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<transport::Error>()
            .is_some_and(transport::Error::is_cancelled)
            || cause
                .downcast_ref::<converge::Error>()
                .is_some_and(converge::Error::is_cancelled)
            || cause
                .downcast_ref::<deploy::Error>()
                .is_some_and(|e| e.category() == deploy::ErrorCategory::Cancelled)
    })
}
