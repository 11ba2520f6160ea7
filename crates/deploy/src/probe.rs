//! Host platform detection.
//!
//! The target is asked for `uname -sm` and the two words are mapped
//! through fixed tables. Nothing is guessed: an unknown word is an error.
//!
//! | `uname -s`  | OS        |   | `uname -m`        | Arch    |
//! |-------------|-----------|---|-------------------|---------|
//! | Darwin      | darwin    |   | x86_64            | amd64   |
//! | Linux       | linux     |   | i386, i686        | 386     |
//! | FreeBSD     | freebsd   |   | armv6l, armv7l    | arm     |
//! | DragonFly   | dragonfly |   | aarch64, arm64    | arm64   |
//! |             |           |   | s390x, 2097       | s390x   |

use serde::Serialize;
use std::fmt;

use transport::{CancelToken, CommandRunner, CommandSpec};

use crate::error::{Error, Result};

/// Operating system family of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Darwin,
    Linux,
    FreeBsd,
    DragonFly,
}

impl Os {
    /// Map a `uname -s` word (case-insensitive).
    pub fn from_uname(word: &str) -> Result<Self> {
        match word.to_ascii_lowercase().as_str() {
            "darwin" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "freebsd" => Ok(Self::FreeBsd),
            "dragonfly" => Ok(Self::DragonFly),
            _ => Err(Error::UnsupportedTarget {
                what: "operating system",
                value: word.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::FreeBsd => "freebsd",
            Self::DragonFly => "dragonfly",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Arch {
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "386")]
    I386,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "s390x")]
    S390x,
}

impl Arch {
    /// Map a `uname -m` word (case-insensitive).
    pub fn from_uname(word: &str) -> Result<Self> {
        match word.to_ascii_lowercase().as_str() {
            "x86_64" => Ok(Self::Amd64),
            "i386" | "i686" => Ok(Self::I386),
            "armv6l" | "armv7l" => Ok(Self::Arm),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            // 2097 is what z10 mainframes report
            "s390x" | "2097" => Ok(Self::S390x),
            _ => Err(Error::UnsupportedTarget {
                what: "architecture",
                value: word.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "386",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::S390x => "s390x",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OS and architecture pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Parse `uname -sm` output.
    pub fn from_uname(output: &str) -> Result<Self> {
        let fields: Vec<&str> = output.split_whitespace().collect();
        let [os, arch] = fields.as_slice() else {
            return Err(Error::MalformedProbe(output.trim().to_string()));
        };
        Ok(Self {
            os: Os::from_uname(os)?,
            arch: Arch::from_uname(arch)?,
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Ask the runner's target for its platform.
pub fn detect(runner: &dyn CommandRunner, cancel: &CancelToken) -> Result<Platform> {
    let output = runner.run(&CommandSpec::new("uname").arg("-sm"), cancel)?;
    let platform = Platform::from_uname(&output.stdout_str())?;
    log::debug!("Detected platform {platform}");
    Ok(platform)
}
