//! Durable status notification.
//!
//! Every report is written to the container root first, giving the daemon a
//! crash-recovery read path that works without any network, and only then
//! pushed to the loopback endpoint. Push failures are retried a bounded
//! number of times and never outrank the durability already achieved on
//! disk.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use wharf_core::error::{Result, WharfError};
use wharf_core::status::{
    dump_to_disk, StartStatus, StopStatus, START_STATUS_FILE, STOP_STATUS_FILE,
};

/// Daemon loopback endpoint receiving monitor pushes.
pub const NOTIFY_BASE_URL: &str = "http://127.0.0.1:2375";

const HTTP_RETRY_TIMES: u32 = 5;
const HTTP_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Pushes one container's status reports to the daemon.
pub struct Notifier {
    container_root: PathBuf,
    container_id: String,
    base_url: String,
    retry_interval: Duration,
    client: reqwest::blocking::Client,
}

impl Notifier {
    /// Notifier for the fixed daemon endpoint.
    pub fn new(container_root: PathBuf, container_id: String) -> Self {
        Self::with_endpoint(
            container_root,
            container_id,
            NOTIFY_BASE_URL.to_string(),
            HTTP_RETRY_INTERVAL,
        )
    }

    /// Endpoint and pacing override, for tests and nonstandard daemons.
    pub fn with_endpoint(
        container_root: PathBuf,
        container_id: String,
        base_url: String,
        retry_interval: Duration,
    ) -> Self {
        Self {
            container_root,
            container_id,
            base_url,
            retry_interval,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Persist and push a start status.
    pub fn push_start(&self, status: &StartStatus) -> Result<()> {
        self.notify("start", START_STATUS_FILE, status)
    }

    /// Persist and push a stop status.
    pub fn push_stop(&self, status: &StopStatus) -> Result<()> {
        self.notify("stop", STOP_STATUS_FILE, status)
    }

    fn notify<T: Serialize>(&self, kind: &str, file: &str, status: &T) -> Result<()> {
        let body = serde_json::to_vec(status)?;
        dump_to_disk(&self.container_root, file, &body)?;

        let url = format!("{}/monitor/{}/{kind}", self.base_url, self.container_id);
        let mut last_err = String::new();
        for attempt in 1..=HTTP_RETRY_TIMES {
            match self.post(&url, body.clone()) {
                Ok(()) => {
                    tracing::debug!(url = %url, attempt, "status delivered");
                    return Ok(());
                }
                Err(e) => {
                    tracing::info!(url = %url, attempt, error = %e, "status push failed");
                    last_err = e;
                    if attempt < HTTP_RETRY_TIMES {
                        std::thread::sleep(self.retry_interval);
                    }
                }
            }
        }
        Err(WharfError::Notify(last_err))
    }

    /// One delivery attempt. Only 204 counts as success; any other response
    /// surfaces its body as the failure detail.
    fn post(&self, url: &str, body: Vec<u8>) -> std::result::Result<(), String> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(());
        }
        let status = response.status();
        let detail = response.text().unwrap_or_default();
        if detail.is_empty() {
            Err(format!("unexpected response {status}"))
        } else {
            Err(detail)
        }
    }
}
