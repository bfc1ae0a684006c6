use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;

use crate::{ConnectionError, Result};
use crate::api::config::WipiConfig;
use crate::control::HostProbe;
use crate::control::command::CommandRunner;
use crate::types::constants::timeouts;

/// [`HostProbe`] backed by the standard Linux tools.
#[derive(Debug, Clone)]
pub struct SystemHost {
    iwconfig: PathBuf,
    ip: PathBuf,
    hostname: PathBuf,
    ping: PathBuf,
    runner: CommandRunner,
}

impl SystemHost {
    pub fn new(config: &WipiConfig) -> Self {
        Self {
            iwconfig: config.iwconfig.clone(),
            ip: config.ip.clone(),
            hostname: config.hostname.clone(),
            ping: config.ping.clone(),
            runner: CommandRunner::new(config.command_timeout()),
        }
    }
}

#[async_trait]
impl HostProbe for SystemHost {
    async fn iwconfig(&self, interface: &str) -> Result<String> {
        self.runner.run(&self.iwconfig, &[interface]).await
    }

    async fn ip_addresses(&self) -> Result<String> {
        self.runner.run(&self.hostname, &["-I"]).await
    }

    async fn hostname(&self) -> Result<String> {
        self.runner.run(&self.hostname, &[]).await
    }

    async fn link_show(&self, interface: &str) -> Result<String> {
        self.runner.run(&self.ip, &["addr", "show", interface]).await
    }

    async fn link_stats(&self, interface: &str) -> Result<String> {
        self.runner.run(&self.ip, &["-s", "link", "show", interface]).await
    }

    async fn ping(&self, target: &str) -> Result<bool> {
        let deadline = timeouts::PING_DEADLINE_SECS.to_string();
        let args = ["-c", "1", "-W", deadline.as_str(), target];
        let label = format!("ping -c 1 {target}");
        let output = self
            .runner
            .output(&self.ping, &args, &label)
            .await
            .map_err(|e| ConnectionError::ProbeFailed(e.to_string()))?;
        debug!("`{label}` exited with {:?}", output.status.code());
        Ok(output.status.success())
    }
}
