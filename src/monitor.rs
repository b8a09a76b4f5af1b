//! Resident-memory sampling of a local process while a query runs.
//!
//! Reads `VmRSS` from `/proc/<pid>/status`, so it only works on Linux and only
//! for a server running on the same host (typically `mysqld`).

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, TpchError};

/// Default sampling interval.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Memory figures gathered over one query, in KiB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    #[serde(rename = "monitor_pid")]
    pub pid: u32,
    #[serde(rename = "monitor_rss_start_kb")]
    pub rss_start_kb: u64,
    #[serde(rename = "monitor_rss_end_kb")]
    pub rss_end_kb: u64,
    #[serde(rename = "monitor_rss_peak_kb")]
    pub rss_peak_kb: u64,
    #[serde(rename = "monitor_samples")]
    pub samples: u64,
    #[serde(rename = "monitor_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryStats {
    fn starting_at(pid: u32, rss_kb: u64) -> Self {
        Self {
            pid,
            rss_start_kb: rss_kb,
            rss_end_kb: rss_kb,
            rss_peak_kb: rss_kb,
            samples: 1,
            error: None,
        }
    }

    /// Stats for a query during which the process could not be sampled.
    pub fn unavailable(pid: u32, error: impl Into<String>) -> Self {
        Self {
            pid,
            samples: 0,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn record(&mut self, rss_kb: u64) {
        self.rss_end_kb = rss_kb;
        self.rss_peak_kb = self.rss_peak_kb.max(rss_kb);
        self.samples += 1;
    }
}

/// Checks that `pid` can be sampled, before any work starts.
pub fn check_pid(pid: u32) -> Result<()> {
    read_rss_kb(pid)
        .map(|_| ())
        .map_err(|e| TpchError::config(format!("--monitor-pid {pid}: {e}")))
}

/// Background task sampling a process's RSS until stopped.
pub struct RssSampler {
    pid: u32,
    cancel: CancellationToken,
    handle: JoinHandle<MemoryStats>,
}

impl RssSampler {
    /// Takes the first sample and starts the background task.
    ///
    /// Fails if the process cannot be read at all.
    pub fn start(pid: u32, interval: Duration) -> Result<Self> {
        let rss_kb = read_rss_kb(pid)
            .map_err(|e| TpchError::io(format!("read /proc/{pid}/status: {e}")))?;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut stats = MemoryStats::starting_at(pid, rss_kb);
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the start sample covers it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => match read_rss_kb(pid) {
                        Ok(kb) => stats.record(kb),
                        Err(e) => {
                            stats.error = Some(format!("read /proc/{pid}/status: {e}"));
                            break;
                        }
                    },
                }
            }
            stats
        });

        Ok(Self {
            pid,
            cancel,
            handle,
        })
    }

    /// Stops sampling and returns what was gathered.
    pub async fn stop(self) -> MemoryStats {
        self.cancel.cancel();
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                debug!("RSS sampler for pid {} did not finish: {e}", self.pid);
                MemoryStats {
                    pid: self.pid,
                    error: Some(format!("sampler task failed: {e}")),
                    ..Default::default()
                }
            }
        }
    }
}

/// Extracts the `VmRSS` value (KiB) from the contents of `/proc/<pid>/status`.
pub fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

#[cfg(target_os = "linux")]
fn read_rss_kb(pid: u32) -> std::io::Result<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status"))?;
    parse_vm_rss_kb(&status).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "VmRSS not found in /proc/<pid>/status",
        )
    })
}

#[cfg(not(target_os = "linux"))]
fn read_rss_kb(_pid: u32) -> std::io::Result<u64> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "--monitor-pid requires Linux /proc",
    ))
}
