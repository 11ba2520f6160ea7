//! Remote host descriptor.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A machine reachable over ssh.
///
/// Loaded from a small YAML document:
///
/// ```yaml
/// host: web1.example.com
/// user: deploy
/// ```
///
/// Without `user` the ssh client's default identity is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Host name or address
    #[serde(rename = "host", default)]
    pub name: String,
    /// Optional login user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Host {
    /// Create a host, validating the fields.
    pub fn new(name: impl Into<String>, user: Option<String>) -> Result<Self> {
        Self {
            name: name.into(),
            user,
        }
        .validated()
    }

    /// Load a host descriptor from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a host descriptor from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let host: Self =
            serde_yaml_ng::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        host.validated()
    }

    fn validated(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::Config("missing required field `host`".to_string()));
        }
        if self.name.chars().any(char::is_whitespace) || self.name.starts_with('-') {
            return Err(Error::Config(format!("invalid host name: {:?}", self.name)));
        }
        self.user = self
            .user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Ok(self)
    }

    /// Address used by ssh and scp: `user@host`, or just `host`.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.name),
            None => self.name.clone(),
        }
    }
}
