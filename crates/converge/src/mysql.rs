//! MySQL account helpers driven through the `mysql` client.

use std::fmt;
use transport::{CommandSpec, ExecutionResult, Input};

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::types::ApplyResult;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "3306";

/// A `GRANT` clause. Empty database or table means `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    pub database: Option<String>,
    pub table: Option<String>,
    /// e.g., `["ALL"]` or `["SELECT", "INSERT"]`
    pub privileges: Vec<String>,
}

impl Default for Privilege {
    fn default() -> Self {
        Self {
            database: None,
            table: None,
            privileges: vec!["ALL".to_string()],
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let db = self.database.as_deref().filter(|d| !d.is_empty()).unwrap_or("*");
        let table = self.table.as_deref().filter(|t| !t.is_empty()).unwrap_or("*");
        write!(f, "GRANT {} ON {db} . {table}", self.privileges.join(","))
    }
}

/// Account to create and the privilege to grant it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUser {
    /// Host part of the account (`'name'@'host'`); defaults to localhost
    pub host: Option<String>,
    pub password: Option<String>,
    pub privilege: Privilege,
}

/// How to reach the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    /// Default database for the session
    pub database: Option<String>,
}

impl Connection {
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--port".to_string(),
            self.port.clone().unwrap_or_else(|| DEFAULT_PORT.to_string()),
            "--host".to_string(),
            self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
        ];
        if let Some(user) = &self.user {
            args.extend(["--user".to_string(), user.clone()]);
        }
        if let Some(password) = &self.password {
            args.push(format!("--password={password}"));
        }
        args
    }
}

/// Runs statements against a MySQL server through the `mysql` client on
/// the runner's target.
pub struct MySql<'a> {
    ctx: ApplyContext<'a>,
}

impl<'a> MySql<'a> {
    pub fn new(ctx: ApplyContext<'a>) -> Self {
        Self { ctx }
    }

    /// Create `name` if it does not exist and grant it `spec.privilege`.
    ///
    /// The server decides whether the account is new, so a successful run
    /// reports `Modified`.
    pub fn create_user(&self, name: &str, spec: &CreateUser) -> Result<ApplyResult> {
        let statement = create_user_statement(name, spec);
        let cmd = CommandSpec::new("mysql").args(["--execute".to_string(), statement]);

        if self.ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run, would create mysql user {name}"),
            });
        }
        self.ctx.run(&cmd)?;
        log::info!("mysql user {name}: granted");
        Ok(ApplyResult::Modified)
    }

    /// Pipe `statements` to the `mysql` client.
    pub fn run_statements(&self, statements: Input, conn: &Connection) -> Result<ExecutionResult> {
        let mut args = conn.args();
        if let Some(db) = &conn.database {
            args.push(db.clone());
        }
        let cmd = CommandSpec::new("mysql").args(args).input(statements);
        self.ctx.run(&cmd)
    }

    /// Dump a database. Not available over the current transports.
    pub fn dump(&self, database: &str, _conn: &Connection) -> Result<()> {
        Err(Error::Unsupported(format!(
            "dumping {database} needs multiplexed remote streaming"
        )))
    }
}

fn create_user_statement(name: &str, spec: &CreateUser) -> String {
    let host = spec.host.as_deref().unwrap_or(DEFAULT_HOST);
    let account = format!("{}@{}", sql_quote(name), sql_quote(host));
    let mut create = format!("CREATE USER IF NOT EXISTS {account}");
    if let Some(password) = &spec.password {
        create.push_str(&format!(" IDENTIFIED BY {}", sql_quote(password)));
    }
    format!("{create}; {} TO {account}", spec.privilege)
}

/// Quote a string literal for MySQL.
fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::CancelToken;
    use transport::testing::FakeRunner;

    #[test]
    fn test_privilege_display() {
        assert_eq!(Privilege::default().to_string(), "GRANT ALL ON * . *");
        let p = Privilege {
            database: Some("shop".into()),
            table: Some(String::new()),
            privileges: vec!["SELECT".into(), "INSERT".into()],
        };
        assert_eq!(p.to_string(), "GRANT SELECT,INSERT ON shop . *");
    }

    #[test]
    fn test_create_user() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let mysql = MySql::new(ApplyContext::new(&fake, &cancel));

        let spec = CreateUser {
            password: Some("s3cr'et".into()),
            privilege: Privilege {
                database: Some("shop".into()),
                ..Privilege::default()
            },
            ..CreateUser::default()
        };
        let result = mysql.create_user("app", &spec).unwrap();
        assert_eq!(result, ApplyResult::Modified);

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].argv(),
            vec![
                "mysql",
                "--execute",
                "CREATE USER IF NOT EXISTS 'app'@'localhost' IDENTIFIED BY 's3cr\\'et'; \
                 GRANT ALL ON shop . * TO 'app'@'localhost'",
            ]
        );
    }

    #[test]
    fn test_run_statements_defaults() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let mysql = MySql::new(ApplyContext::new(&fake, &cancel));

        let conn = Connection {
            user: Some("root".into()),
            password: Some("pw".into()),
            database: Some("shop".into()),
            ..Connection::default()
        };
        mysql
            .run_statements(Input::Bytes(b"SELECT 1;".to_vec()), &conn)
            .unwrap();

        let calls = fake.calls();
        let call = &calls[0];
        assert_eq!(
            call.argv(),
            vec![
                "mysql", "--port", "3306", "--host", "localhost", "--user", "root",
                "--password=pw", "shop",
            ]
        );
        assert_eq!(call.input, Some(Input::Bytes(b"SELECT 1;".to_vec())));
    }

    #[test]
    fn test_dump_is_unsupported() {
        let fake = FakeRunner::new();
        let cancel = CancelToken::new();
        let err = MySql::new(ApplyContext::new(&fake, &cancel))
            .dump("shop", &Connection::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(fake.calls().is_empty());
    }
}
