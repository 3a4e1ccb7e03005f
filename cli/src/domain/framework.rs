//! Runtime frameworks and their per-variant deployment strategy.
//!
//! Every framework-conditional decision of the remote deployer is expressed
//! as data on `RuntimeStrategy`, so adding a framework is a change local to
//! this file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Web application framework detected in (or hinted for) a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Flask,
    Django,
    #[serde(rename = "nodejs")]
    NodeJs,
    Unknown,
}

/// How declared dependencies are installed on the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    /// `python3 -m pip install -r <manifest>`; needs a manifest path.
    PipRequirements,
    /// `npm install` inside the project directory.
    NpmInstall,
}

/// How the application process is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    /// Run the entry-point file with the Python interpreter.
    PythonEntryPoint,
    /// Run the entry point as a Django management script (`runserver`).
    DjangoManage,
    /// `npm start`.
    NpmStart,
}

/// Per-framework deployment strategy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStrategy {
    /// Package-manager binary probed with `command -v`.
    pub toolchain_binary: &'static str,
    /// System package installed when the binary is missing.
    pub toolchain_package: &'static str,
    pub install: InstallKind,
    pub launch: LaunchKind,
    /// Entry point used when analysis found none.
    pub fallback_entry: &'static str,
    /// Pattern for the diagnostic process listing.
    pub process_pattern: &'static str,
}

const PYTHON: RuntimeStrategy = RuntimeStrategy {
    toolchain_binary: "pip3",
    toolchain_package: "python3-pip",
    install: InstallKind::PipRequirements,
    launch: LaunchKind::PythonEntryPoint,
    fallback_entry: "app.py",
    process_pattern: "python3",
};

impl Framework {
    /// All frameworks, in display order.
    pub const ALL: [Framework; 4] = [Self::Flask, Self::Django, Self::NodeJs, Self::Unknown];

    /// Default listening ports. Never empty; the first entry is primary.
    #[must_use]
    pub fn default_ports(self) -> Vec<u16> {
        match self {
            Self::Django => vec![8000],
            Self::NodeJs => vec![3000],
            Self::Flask | Self::Unknown => vec![5000],
        }
    }

    /// Deployment strategy. Unknown frameworks deploy as Python.
    #[must_use]
    pub fn strategy(self) -> RuntimeStrategy {
        match self {
            Self::Flask | Self::Unknown => PYTHON,
            Self::Django => RuntimeStrategy {
                launch: LaunchKind::DjangoManage,
                fallback_entry: "manage.py",
                ..PYTHON
            },
            Self::NodeJs => RuntimeStrategy {
                toolchain_binary: "npm",
                toolchain_package: "npm",
                install: InstallKind::NpmInstall,
                launch: LaunchKind::NpmStart,
                fallback_entry: "index.js",
                process_pattern: "node",
            },
        }
    }

    /// `true` when the instance bootstrap installs the Node toolchain.
    #[must_use]
    pub fn is_node(self) -> bool {
        self == Self::NodeJs
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flask => "flask",
            Self::Django => "django",
            Self::NodeJs => "nodejs",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse used for classifier answers: unrecognised names map to
    /// `Unknown` instead of failing.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        hint.parse().unwrap_or(Self::Unknown)
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flask" => Ok(Self::Flask),
            "django" => Ok(Self::Django),
            "nodejs" | "node" | "node.js" | "express" => Ok(Self::NodeJs),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!(
                "unknown framework '{other}' (expected flask, django, nodejs or unknown)"
            )),
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
