//! Supervision of one container run.
//!
//! The supervisor owns a single workload execution: it hands the saved
//! command to the execution driver, reports the confirmed start from inside
//! the driver's callback, then blocks until the run returns and reports the
//! stop unconditionally, whether or not the run itself failed.

use chrono::{DateTime, Utc};
use wharf_core::container::{Container, RestartPolicy};
use wharf_core::error::{Result, WharfError};
use wharf_core::status::{ExitStatus, StartStatus, StopStatus};
use wharf_engine::driver::ExecDriver;

use crate::notify::Notifier;

/// Process-local supervisor state. Created at the entry point, destroyed
/// when the process exits; only the status reports it emits are durable.
pub struct Supervisor {
    container: Container,
    restart_policy: RestartPolicy,
    start_time: DateTime<Utc>,
    notifier: Notifier,
}

impl Supervisor {
    pub fn new(container: Container) -> Self {
        let notifier = Notifier::new(container.root.clone(), container.id.clone());
        Self::with_notifier(container, notifier)
    }

    /// Supervisor with an injected notifier (tests, nonstandard endpoints).
    pub fn with_notifier(container: Container, notifier: Notifier) -> Self {
        let restart_policy = container.host_config.restart_policy.clone();
        Self {
            container,
            restart_policy,
            start_time: Utc::now(),
            notifier,
        }
    }

    /// Drive the execution driver and report both ends of the run.
    ///
    /// Returns an error when the workload never properly ran; the stop
    /// notification has already been attempted by then.
    pub fn supervise(mut self, driver: &dyn ExecDriver) -> Result<()> {
        tracing::info!(
            container_id = %self.container.id,
            restart_policy = %self.restart_policy.name,
            "supervising container"
        );

        let mut command = self.container.command.clone();
        command.env = self.container.daemon_environment();

        let run_result = driver.run(&command, &mut |pid| self.started(pid));
        let (exit, run_err) = match run_result {
            Ok(exit) => (exit, None),
            Err(e) => (ExitStatus::default(), Some(e.to_string())),
        };

        // The stop report goes out unconditionally, disk first.
        let status = StopStatus {
            exit,
            err: run_err.clone(),
        };
        if let Err(e) = self.notifier.push_stop(&status) {
            tracing::warn!(error = %e, "stop notification failed");
        }

        self.container.state.set_stopped(exit);
        if let Err(e) = self.container.to_disk() {
            tracing::debug!(error = %e, "state snapshot failed");
        }

        let elapsed = Utc::now().signed_duration_since(self.start_time);
        tracing::info!(
            container_id = %self.container.id,
            code = exit.code,
            elapsed_secs = elapsed.num_seconds(),
            "container run finished"
        );

        match run_err {
            Some(err) => Err(WharfError::Supervisor(format!("start container: {err}"))),
            None => Ok(()),
        }
    }

    /// Start callback. Runs synchronously inside the driver's run call,
    /// once the process has actually started, so the start report
    /// happens-before the supervisor blocks awaiting exit.
    fn started(&mut self, pid: i32) {
        tracing::info!(container_id = %self.container.id, pid, "container process started");
        if let Err(e) = self.notifier.push_start(&StartStatus { pid, err: None }) {
            tracing::warn!(error = %e, "start notification failed");
        }
        self.container.state.set_running(pid);
        if let Err(e) = self.container.to_disk() {
            tracing::debug!(error = %e, "state snapshot failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;
    use wharf_core::status::{load_start_status, load_stop_status};

    struct FakeDriver {
        exit_code: i32,
        fail: bool,
    }

    impl ExecDriver for FakeDriver {
        fn run(
            &self,
            _command: &wharf_core::container::ContainerCommand,
            on_start: &mut dyn FnMut(i32),
        ) -> Result<ExitStatus> {
            if self.fail {
                return Err(WharfError::Driver("no such executable".to_string()));
            }
            on_start(4321);
            Ok(ExitStatus {
                code: self.exit_code,
                signal: None,
            })
        }
    }

    /// Accept any number of requests, always answering 204.
    fn accepting_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ =
                    stream.write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
            }
        });
        format!("http://{addr}")
    }

    fn seed_container(root: &Path) {
        std::fs::create_dir_all(root).unwrap();
        std::fs::write(root.join("config.json"), r#"{"image":"img-1"}"#).unwrap();
        std::fs::write(root.join("hostconfig.json"), r#"{}"#).unwrap();
        std::fs::write(
            root.join("command.json"),
            r#"{"path":"/bin/sleep","args":["60"]}"#,
        )
        .unwrap();
    }

    fn supervisor(root: &Path, base_url: String) -> Supervisor {
        let container = Container::from_disk("cid-1", root).unwrap();
        let notifier = Notifier::with_endpoint(
            root.to_path_buf(),
            "cid-1".to_string(),
            base_url,
            Duration::from_millis(5),
        );
        Supervisor::with_notifier(container, notifier)
    }

    #[test]
    fn test_successful_run_reports_start_then_stop() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        seed_container(&root);

        let driver = FakeDriver {
            exit_code: 0,
            fail: false,
        };
        supervisor(&root, accepting_server()).supervise(&driver).unwrap();

        let start = load_start_status(&root).unwrap().unwrap();
        assert_eq!(start.pid, 4321);

        let stop = load_stop_status(&root).unwrap().unwrap();
        assert_eq!(stop.exit.code, 0);
        assert!(stop.err.is_none());
    }

    #[test]
    fn test_failed_run_still_reports_stop() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        seed_container(&root);

        let driver = FakeDriver {
            exit_code: 0,
            fail: true,
        };
        let err = supervisor(&root, accepting_server())
            .supervise(&driver)
            .unwrap_err();
        assert!(matches!(err, WharfError::Supervisor(_)));

        // The workload never started, so no start status exists...
        assert!(load_start_status(&root).unwrap().is_none());
        // ...but the stop report carries the run error.
        let stop = load_stop_status(&root).unwrap().unwrap();
        assert_eq!(stop.err.as_deref(), Some("driver error: no such executable"));
    }

    #[test]
    fn test_nonzero_exit_is_not_a_supervisor_error() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        seed_container(&root);

        let driver = FakeDriver {
            exit_code: 137,
            fail: false,
        };
        supervisor(&root, accepting_server()).supervise(&driver).unwrap();

        let stop = load_stop_status(&root).unwrap().unwrap();
        assert_eq!(stop.exit.code, 137);
        assert!(stop.err.is_none());
    }

    #[test]
    fn test_state_snapshot_reflects_the_run() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        seed_container(&root);

        let driver = FakeDriver {
            exit_code: 3,
            fail: false,
        };
        supervisor(&root, accepting_server()).supervise(&driver).unwrap();

        let state = wharf_core::container::State::load(&root);
        assert!(!state.running);
        assert!(state.started_at.is_some());
        assert!(state.finished_at.is_some());
        assert_eq!(state.exit_status.unwrap().code, 3);
    }

    #[test]
    fn test_unreachable_daemon_does_not_fail_the_run() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        seed_container(&root);

        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let driver = FakeDriver {
            exit_code: 0,
            fail: false,
        };
        supervisor(&root, format!("http://127.0.0.1:{port}"))
            .supervise(&driver)
            .unwrap();

        // Both reports made it to disk despite every push failing.
        assert!(load_start_status(&root).unwrap().is_some());
        assert!(load_stop_status(&root).unwrap().is_some());
    }
}
