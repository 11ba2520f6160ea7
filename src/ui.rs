use colored::Colorize;
use converge::ApplyResult;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Short label for a converge outcome
pub fn outcome_label(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "ok",
        ApplyResult::Created => "created",
        ApplyResult::Modified => "changed",
        ApplyResult::Skipped { .. } => "would change",
    }
}

/// Print the outcome of converging one entity
pub fn outcome(kind: &str, name: &str, result: &ApplyResult, quiet: bool) {
    let subject = format!("{kind} {name}");
    let label = outcome_label(result);
    match result {
        ApplyResult::NoChange if quiet => {}
        ApplyResult::NoChange => dim(&format!("{subject}: {label}")),
        ApplyResult::Created | ApplyResult::Modified => success(&format!("{subject}: {label}")),
        ApplyResult::Skipped { reason } => {
            info(&format!("{subject}: {label}"));
            if !quiet {
                dim(reason);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
