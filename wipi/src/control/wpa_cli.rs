use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;

use crate::api::config::WipiConfig;
use crate::api::models::CommandReply;
use crate::control::ControlClient;
use crate::control::command::CommandRunner;
use crate::{ConnectionError, Result};

/// [`ControlClient`] backed by the `wpa_cli` binary.
///
/// Every call spawns `wpa_cli -i <interface> <command>`, so no socket is
/// held between operations.
#[derive(Debug, Clone)]
pub struct WpaCli {
    program: PathBuf,
    interface: String,
    runner: CommandRunner,
}

impl WpaCli {
    pub fn new(config: &WipiConfig) -> Self {
        Self {
            program: config.wpa_cli.clone(),
            interface: config.interface.clone(),
            runner: CommandRunner::new(config.command_timeout()),
        }
    }

    async fn call(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["-i", self.interface.as_str()];
        full.extend_from_slice(args);
        self.runner.run(&self.program, &full).await
    }

    async fn status_call(&self, args: &[&str]) -> Result<CommandReply> {
        let reply = CommandReply::from_output(&self.call(args).await?);
        debug!("wpa_cli {} -> {reply}", args.join(" "));
        Ok(reply)
    }
}

#[async_trait]
impl ControlClient for WpaCli {
    async fn list_networks(&self) -> Result<String> {
        self.call(&["list_networks"]).await
    }

    async fn add_network(&self) -> Result<u32> {
        let out = self.call(&["add_network"]).await?;
        parse_network_id(&out)
    }

    async fn set_network(&self, id: u32, field: &str, value: &str) -> Result<CommandReply> {
        let id = id.to_string();
        let args = [
            "-i",
            self.interface.as_str(),
            "set_network",
            id.as_str(),
            field,
            value,
        ];

        let output = if is_secret(field) {
            let label = format!("wpa_cli -i {} set_network {id} {field} <redacted>", self.interface);
            self.runner.run_labelled(&self.program, &args, &label).await?
        } else {
            self.runner.run(&self.program, &args).await?
        };
        Ok(CommandReply::from_output(&output))
    }

    async fn select_network(&self, id: u32) -> Result<CommandReply> {
        let id = id.to_string();
        self.status_call(&["select_network", id.as_str()]).await
    }

    async fn remove_network(&self, id: u32) -> Result<CommandReply> {
        let id = id.to_string();
        self.status_call(&["remove_network", id.as_str()]).await
    }

    async fn save_config(&self) -> Result<CommandReply> {
        self.status_call(&["save_config"]).await
    }

    async fn reconfigure(&self) -> Result<CommandReply> {
        self.status_call(&["reconfigure"]).await
    }

    async fn reassociate(&self) -> Result<CommandReply> {
        self.status_call(&["reassociate"]).await
    }

    async fn scan(&self) -> Result<CommandReply> {
        self.status_call(&["scan"]).await
    }

    async fn scan_results(&self) -> Result<String> {
        self.call(&["scan_results"]).await
    }
}

fn is_secret(field: &str) -> bool {
    matches!(field, "psk" | "password" | "wep_key0")
}

/// `add_network` prints the new id on its last line, or `FAIL`.
fn parse_network_id(output: &str) -> Result<u32> {
    let last = output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim();
    last.parse::<u32>()
        .map_err(|_| ConnectionError::CommandRejected {
            cmd: "add_network".into(),
            reply: last.to_string(),
        })
}
