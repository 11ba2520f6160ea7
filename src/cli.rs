use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hostkit")]
#[command(version)]
#[command(about = "Provision hosts: detect, deploy, and converge accounts and checkouts", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the OS and architecture of this machine or a remote host
    Detect {
        /// Host descriptor (YAML with `host` and optional `user`)
        #[arg(long, env = "HOSTKIT_HOST_FILE")]
        host_file: Option<PathBuf>,
    },

    /// Cross-compile a binary for a host, ship it with its config and run it
    Deploy(DeployArgs),

    /// Ensure a group exists with the given attributes
    Group(GroupArgs),

    /// Ensure a user account exists with the given attributes
    User(UserArgs),

    /// Ensure a directory exists with the given mode
    Dir(DirArgs),

    /// Ensure a git checkout exists at the requested version
    #[command(disable_version_flag = true)]
    Git(GitArgs),

    /// Create a MySQL account and grant it a privilege
    MysqlUser(MysqlUserArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct ApplyArgs {
    /// Run privileged commands through `sudo -n`
    #[arg(long)]
    pub sudo: bool,

    /// Show what would change without changing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

// ============================================================================
// Deploy
// ============================================================================

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Cargo package directory to build
    pub package_dir: String,

    /// Binary target to build and run
    #[arg(long)]
    pub bin: String,

    /// Config file: names the host and is shipped alongside the binary
    #[arg(long, default_value = "config.yml")]
    pub config: String,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Group name
    pub name: String,

    /// Fixed group id
    #[arg(long)]
    pub gid: Option<u32>,

    /// Create a system group
    #[arg(long)]
    pub system: bool,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

#[derive(Args, Debug)]
pub struct UserArgs {
    /// Login name
    pub name: String,

    /// Fixed user id
    #[arg(long)]
    pub uid: Option<u32>,

    /// Primary group (name or gid)
    #[arg(long)]
    pub group: Option<String>,

    /// Supplementary groups
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Keep supplementary groups not listed in --groups
    #[arg(long, requires = "groups")]
    pub append: bool,

    /// Full name or description
    #[arg(long)]
    pub comment: Option<String>,

    /// Home directory
    #[arg(long)]
    pub home: Option<String>,

    /// Login shell
    #[arg(long)]
    pub shell: Option<String>,

    /// Day the account is disabled (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub expires: Option<NaiveDate>,

    /// Encrypted password as produced by crypt(3)
    #[arg(long)]
    pub password: Option<String>,

    /// Do not create the home directory
    #[arg(long)]
    pub no_create_home: bool,

    /// Create a system account
    #[arg(long)]
    pub system: bool,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

// ============================================================================
// Filesystem
// ============================================================================

#[derive(Args, Debug)]
pub struct DirArgs {
    /// Absolute directory path
    pub path: String,

    /// Octal permission bits (e.g., 755)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<u32>,

    /// Show what would change without changing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct GitArgs {
    /// Repository URL or local path
    pub repo: String,

    /// Checkout destination
    pub dest: String,

    /// Remote name
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// Branch, tag or commit
    #[arg(long, default_value = "HEAD")]
    pub version: String,

    /// Extra ref to fetch after cloning
    #[arg(long)]
    pub refspec: Option<String>,

    /// Shallow clone depth
    #[arg(long, default_value_t = 0)]
    pub depth: u32,

    /// Local repository to borrow objects from
    #[arg(long)]
    pub reference: Option<String>,

    /// Create a bare repository
    #[arg(long)]
    pub bare: bool,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

// ============================================================================
// MySQL
// ============================================================================

#[derive(Args, Debug)]
pub struct MysqlUserArgs {
    /// Account name
    pub name: String,

    /// Host part of the account
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Account password
    #[arg(long, env = "HOSTKIT_MYSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Privileges to grant
    #[arg(long, value_delimiter = ',', default_value = "ALL")]
    pub privilege: Vec<String>,

    /// Database the grant applies to (all when omitted)
    #[arg(long)]
    pub database: Option<String>,

    /// Table the grant applies to (all when omitted)
    #[arg(long)]
    pub table: Option<String>,

    /// Run the mysql client on this host instead of locally
    #[arg(long, env = "HOSTKIT_HOST_FILE")]
    pub host_file: Option<PathBuf>,

    #[command(flatten)]
    pub apply: ApplyArgs,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, converge::EXPIRY_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_mode(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        Ok(_) => Err(format!("mode out of range: {s}")),
        Err(e) => Err(format!("invalid octal mode {s:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_user_args() {
        let cli = Cli::try_parse_from([
            "hostkit", "user", "deploy", "--groups", "adm,docker", "--append", "--expires",
            "2031-12-31", "--no-create-home", "--sudo",
        ])
        .unwrap();
        let Command::User(args) = cli.command else {
            panic!("expected user command");
        };
        assert_eq!(args.groups, vec!["adm", "docker"]);
        assert!(args.append);
        assert_eq!(args.expires, NaiveDate::from_ymd_opt(2031, 12, 31));
        assert!(args.no_create_home);
        assert!(args.apply.sudo);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["hostkit", "user", "x", "--expires", "31/12/2031"]).is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("755"), Ok(0o755));
        assert_eq!(parse_mode("0o2775"), Ok(0o2775));
        assert!(parse_mode("789").is_err());
        assert!(parse_mode("77777").is_err());
    }

    #[test]
    fn test_git_defaults() {
        let cli = Cli::try_parse_from(["hostkit", "git", "https://example.com/r.git", "/srv/r"])
            .unwrap();
        let Command::Git(args) = cli.command else {
            panic!("expected git command");
        };
        assert_eq!(args.remote, "origin");
        assert_eq!(args.version, "HEAD");
        assert_eq!(args.depth, 0);
        assert!(!args.apply.dry_run);
    }

    #[test]
    fn test_git_version_is_the_checkout_ref() {
        let cli = Cli::try_parse_from([
            "hostkit", "git", "https://example.com/r.git", "/srv/r", "--version", "v1.2.0", "-n",
        ])
        .unwrap();
        let Command::Git(args) = cli.command else {
            panic!("expected git command");
        };
        assert_eq!(args.version, "v1.2.0");
        assert!(args.apply.dry_run);

        // the program version stays on the top-level command
        let err = Cli::try_parse_from(["hostkit", "--version"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
