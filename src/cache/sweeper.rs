use crate::extractor::models::Platform;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Counts from one pass over the cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Deletes cached videos once they are older than `max_age`
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    root: PathBuf,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(root: impl Into<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            root: root.into(),
            max_age,
            interval,
        }
    }

    /// One pass over every platform directory, judging ages against `now`
    pub async fn sweep_once(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();
        for platform in Platform::ALL {
            self.sweep_dir(&self.root.join(platform.dir_name()), now, &mut report)
                .await;
        }

        if report.deleted > 0 || report.failed > 0 {
            info!(
                "Sweep done: {} scanned, {} deleted, {} failed",
                report.scanned, report.deleted, report.failed
            );
        } else {
            debug!("Sweep done: {} scanned, nothing expired", report.scanned);
        }
        report
    }

    async fn sweep_dir(&self, dir: &Path, now: SystemTime, report: &mut SweepReport) {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                error!("Cannot read cache directory {}: {}", dir.display(), e);
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!("Error listing {}: {}", dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_file() => match meta.modified() {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!("No modification time for {}: {}", path.display(), e);
                        continue;
                    }
                },
                Ok(_) => continue,
                Err(e) => {
                    // Deleted between listing and stat
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            report.scanned += 1;
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!(
                        "Deleted {} (modified {}, {}s old)",
                        path.display(),
                        DateTime::<Utc>::from(modified).format("%Y-%m-%d %H:%M:%S"),
                        age.as_secs()
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!("Error deleting {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Sweep forever, one pass per interval
    pub async fn run(self) {
        info!(
            "Retention sweeper started: every {}s, max age {}s",
            self.interval.as_secs(),
            self.max_age.as_secs()
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep_once(SystemTime::now()).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
