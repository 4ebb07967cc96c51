//! Client certificate rotation watcher
//!
//! spiffe-helper rewrites the SVID files in place before they expire. New
//! pool connections read the files again, so nothing needs reloading; the
//! watcher only records each rotation as a trust event.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tracing::{debug, warn};

use workload_trust_core::{TrustPattern, TrustRecorder};

const ROTATION_MESSAGE: &str = "Client certificate rotated by spiffe-helper";

/// Polls the client certificate's modification time
#[derive(Debug, Clone)]
pub struct CertWatcher {
    path: PathBuf,
    interval: Duration,
    recorder: TrustRecorder,
    spiffe_id: String,
}

impl CertWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        interval: Duration,
        recorder: TrustRecorder,
        spiffe_id: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            interval,
            recorder,
            spiffe_id: spiffe_id.into(),
        }
    }

    /// Poll until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut last = None;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once(&mut last).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(path = %self.path.display(), "Certificate watcher stopped");
                        return;
                    }
                }
            }
        }
    }

    /// Compare the file's mtime with `last`, recording a rotation on change
    ///
    /// The first successful read only sets the baseline. Returns whether a
    /// rotation was recorded.
    pub async fn poll_once(&self, last: &mut Option<SystemTime>) -> bool {
        let modified = match tokio::fs::metadata(&self.path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot stat client certificate");
                return false;
            }
        };

        match last.replace(modified) {
            Some(previous) if previous != modified => {
                self.recorder
                    .record_rotation(TrustPattern::DirectTrust, &self.spiffe_id, ROTATION_MESSAGE);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::Arc;
    use workload_trust_core::{MemorySink, TrustEventKind};

    fn cert_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wt-{}-{}.pem", name, std::process::id()));
        std::fs::write(&path, "-----BEGIN CERTIFICATE-----\n").unwrap();
        path
    }

    fn set_mtime(path: &PathBuf, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[tokio::test]
    async fn test_rotation_recorded_on_mtime_change() {
        let path = cert_file("rotate");
        set_mtime(&path, 1_700_000_000);

        let sink = Arc::new(MemorySink::new());
        let watcher = CertWatcher::new(
            &path,
            Duration::from_secs(30),
            TrustRecorder::new("backend", sink.clone()),
            "spiffe://example.org/ns/demo/sa/backend",
        );

        let mut last = None;
        assert!(!watcher.poll_once(&mut last).await);
        assert!(!watcher.poll_once(&mut last).await);
        assert!(sink.is_empty());

        set_mtime(&path, 1_700_003_600);
        assert!(watcher.poll_once(&mut last).await);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TrustEventKind::CredentialRotation);
        assert_eq!(events[0].pattern, TrustPattern::DirectTrust);
        assert_eq!(events[0].message, ROTATION_MESSAGE);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_rotation() {
        let sink = Arc::new(MemorySink::new());
        let watcher = CertWatcher::new(
            std::env::temp_dir().join("wt-does-not-exist.pem"),
            Duration::from_secs(30),
            TrustRecorder::new("backend", sink.clone()),
            "spiffe://example.org/ns/demo/sa/backend",
        );

        let mut last = None;
        assert!(!watcher.poll_once(&mut last).await);
        assert!(last.is_none());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let path = cert_file("shutdown");
        let watcher = CertWatcher::new(
            &path,
            Duration::from_millis(10),
            TrustRecorder::new("backend", Arc::new(MemorySink::new())),
            "spiffe://example.org/ns/demo/sa/backend",
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(watcher.run(rx));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher exits")
            .unwrap();

        std::fs::remove_file(&path).ok();
    }
}
