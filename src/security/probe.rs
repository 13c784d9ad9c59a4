//! Active ping probe of local subnets.
//!
//! Deprecated: depends on a `ping` binary and is linear in subnet size.
//! Disabled unless `trusted_proxy.probe.enabled` is set.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::process::Command;

use crate::config::ProbeConfig;
use crate::security::cidr::IpCidr;

/// Locate `ping` on `PATH`.
pub fn find_ping() -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join("ping"))
        .find(|candidate| candidate.is_file())
}

/// Hosts of `addr`'s subnet that answer a single ping.
pub async fn scan_subnet(addr: Ipv4Addr, config: &ProbeConfig) -> Vec<IpAddr> {
    let Some(ping) = find_ping() else {
        tracing::warn!("ping binary not found, skipping subnet probe");
        return Vec::new();
    };

    let subnet = match IpCidr::new(IpAddr::V4(addr), config.prefix_len) {
        Ok(subnet) => subnet,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid probe subnet");
            return Vec::new();
        }
    };

    tracing::info!(subnet = %subnet, "Probing subnet");

    let timeout = config.timeout_secs.max(1);
    let alive: Vec<IpAddr> = stream::iter(subnet.hosts_v4())
        .map(|host| {
            let ping = ping.clone();
            async move { ping_once(&ping, host, timeout).await.then_some(host) }
        })
        .buffer_unordered(config.concurrency.max(1))
        .filter_map(|host| async move { host })
        .collect()
        .await;

    tracing::info!(subnet = %subnet, alive = alive.len(), "Subnet probe complete");
    alive
}

async fn ping_once(ping: &Path, host: IpAddr, timeout_secs: u64) -> bool {
    let wait = timeout_secs.to_string();
    let target = host.to_string();
    let mut command = Command::new(ping);
    command
        .args(["-c", "1", "-W", wait.as_str(), target.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    let child = command.status();

    // Guard against ping implementations that ignore -W.
    let deadline = Duration::from_secs(timeout_secs + 1);
    match tokio::time::timeout(deadline, child).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            tracing::debug!(host = %host, error = %e, "ping failed to run");
            false
        }
        Err(_) => false,
    }
}
