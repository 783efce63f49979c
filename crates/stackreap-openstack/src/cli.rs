//! openstack CLI wrapper
//!
//! Runs `openstack` with machine-readable output and maps failures through
//! [`OpenStackError::from_stderr`].

use crate::error::{OpenStackError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use stackreap_cloud::TagQuery;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// openstack CLI wrapper
#[derive(Debug, Clone)]
pub struct OpenStackCli {
    program: String,
    cloud: Option<String>,
}

impl OpenStackCli {
    /// `cloud` selects an entry of `clouds.yaml`; `None` leaves selection
    /// to the `OS_*` environment.
    pub fn new(cloud: Option<String>) -> Self {
        Self {
            program: "openstack".to_string(),
            cloud,
        }
    }

    /// Uses another executable in place of `openstack`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn cloud(&self) -> Option<&str> {
        self.cloud.as_deref()
    }

    /// Runs a command and returns stdout.
    pub async fn run<A: AsRef<str>>(&self, args: &[A]) -> Result<String> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let mut cmd = Command::new(&self.program);
        if let Some(cloud) = &self.cloud {
            cmd.arg("--os-cloud").arg(cloud);
        }
        cmd.args(&args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Running: {} {}", self.program, args.join(" "));

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(OpenStackError::CliNotFound),
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OpenStackError::from_stderr(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Runs a command with `-f json` and parses its output.
    pub async fn json<T: DeserializeOwned, A: AsRef<str>>(&self, args: &[A]) -> Result<T> {
        let output = self.run(&with_json(args)).await?;
        parse_output(args, &output)
    }

    /// Like [`json`](Self::json) for list commands; empty output is an empty list.
    pub async fn list<T: DeserializeOwned, A: AsRef<str>>(&self, args: &[A]) -> Result<Vec<T>> {
        let output = self.run(&with_json(args)).await?;
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_output(args, &output)
    }

    /// Runs a command whose output is not needed.
    pub async fn exec<A: AsRef<str>>(&self, args: &[A]) -> Result<()> {
        self.run(args).await?;
        Ok(())
    }

    /// Issues a token, which proves the credentials work.
    pub async fn token_issue(&self) -> Result<TokenInfo> {
        self.json(&["token", "issue"]).await
    }

    pub async fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        self.list(&["catalog", "list"]).await
    }
}

fn with_json<A: AsRef<str>>(args: &[A]) -> Vec<&str> {
    args.iter()
        .map(AsRef::as_ref)
        .chain(["-f", "json"])
        .collect()
}

fn parse_output<T: DeserializeOwned, A: AsRef<str>>(args: &[A], output: &str) -> Result<T> {
    serde_json::from_str(output).map_err(|e| OpenStackError::UnexpectedOutput {
        command: args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" "),
        message: e.to_string(),
    })
}

/// Server-side tag filter flags understood by the networking commands.
pub(crate) fn tag_args(query: &TagQuery) -> Vec<String> {
    match query {
        TagQuery::All => Vec::new(),
        TagQuery::Any(tags) => vec!["--any-tags".to_string(), tags.join(",")],
        TagQuery::Every(tags) => vec!["--tags".to_string(), tags.join(",")],
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
}

/// One service of the Keystone catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Type", rename = "type")]
    pub service_type: String,
}

/// A record identified by name only, such as a container or an object.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRecord {
    #[serde(alias = "Name")]
    pub name: String,
}

/// Network extension as printed by `extension list --network`.
#[derive(Debug, Clone, Deserialize)]
pub struct Extension {
    #[serde(alias = "Alias")]
    pub alias: String,
}
