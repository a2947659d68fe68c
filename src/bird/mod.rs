// BIRD control adapter - runs `birdc` to read and change the routing table

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::AdapterError;

/// A static route requested by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub network: String,
    pub next_hop: String,
    pub interface: String,
    pub source_protocol: String,
    pub preference: u32,
}

impl StaticRoute {
    pub fn directive(&self) -> String {
        format!(
            "route {} via {} on {} preference {} type {};",
            self.network, self.next_hop, self.interface, self.preference, self.source_protocol
        )
    }
}

pub fn unroute_directive(network: &str) -> String {
    format!("unroute {};", network)
}

/// Operations on the local routing daemon. Every call blocks until the
/// daemon answers; failures are reported, never retried.
#[async_trait]
pub trait RouteDaemon: Send + Sync {
    /// Raw `show route` output
    async fn fetch_table(&self) -> Result<String, AdapterError>;

    async fn apply_route(&self, route: &StaticRoute) -> Result<(), AdapterError>;

    async fn withdraw_route(&self, network: &str) -> Result<(), AdapterError>;
}

/// `birdc` command line client
#[derive(Debug, Clone)]
pub struct Birdc {
    binary: String,
    socket: Option<PathBuf>,
}

impl Birdc {
    pub fn new(binary: impl Into<String>, socket: Option<PathBuf>) -> Self {
        Birdc {
            binary: binary.into(),
            socket,
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run birdc with `args`, optionally piping `input` to its stdin; returns stdout
    async fn exec(&self, args: &[&str], input: Option<&str>) -> Result<String, AdapterError> {
        let command = self.describe(args);
        tracing::debug!("Executing {}", command);

        let mut cmd = Command::new(&self.binary);
        if let Some(socket) = &self.socket {
            cmd.arg("-s").arg(socket);
        }
        cmd.args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| AdapterError::Spawn {
            command: command.clone(),
            source: e,
        })?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            let written = async {
                stdin.write_all(input.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.shutdown().await
            }
            .await;
            written.map_err(|e| AdapterError::Stdin {
                command: command.clone(),
                source: e,
            })?;
        }

        let output = child.wait_with_output().await.map_err(|e| AdapterError::Spawn {
            command: command.clone(),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::CommandFailed {
                command,
                exit_code: output.status.code().unwrap_or(-1),
                output: if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    stderr.trim().to_string()
                },
            });
        }

        Ok(stdout)
    }
}

#[async_trait]
impl RouteDaemon for Birdc {
    async fn fetch_table(&self) -> Result<String, AdapterError> {
        let output = self.exec(&["show", "route"], None).await?;
        tracing::debug!("BIRD route command output:\n{}", output);
        Ok(output)
    }

    async fn apply_route(&self, route: &StaticRoute) -> Result<(), AdapterError> {
        let directive = route.directive();
        self.exec(&["configure"], Some(&directive)).await?;
        tracing::info!(
            "Added route {} via {} on {} with preference {} and type {}",
            route.network,
            route.next_hop,
            route.interface,
            route.preference,
            route.source_protocol
        );
        Ok(())
    }

    async fn withdraw_route(&self, network: &str) -> Result<(), AdapterError> {
        self.exec(&["configure"], Some(&unroute_directive(network))).await?;
        tracing::info!("Deleted route {}", network);
        Ok(())
    }
}
