//! The check → mirror → wait loop.
//!
//! [`CopyCycleController`] walks the states in [`CycleState`] one at a time.
//! While the target application runs, mirroring is paused and the controller
//! keeps re-checking every interval; once the target exits, the next check
//! resumes mirroring. Shutdown is only observed at state boundaries, so a
//! mirror pass that has started always finishes all of its pairs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use packmirror_core::config::AppConfig;
use packmirror_core::types::{MirrorPair, ProcessTarget};
use packmirror_detector::{Liveness, ProcessObserver};
use packmirror_sync::blocking::spawn_traced;
use packmirror_sync::{mirror_pair, MirrorOptions, MirrorReport};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::paths::CYCLE_INTERVAL;

/// Immutable inputs for one controller run.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Mirrored in order, each drained before the next starts.
    pub pairs: Vec<MirrorPair>,
    pub target: ProcessTarget,
    pub interval: Duration,
    pub options: MirrorOptions,
}

impl CycleConfig {
    pub fn from_app_config(config: &AppConfig, home: &Path) -> Self {
        Self {
            pairs: config.mirror_pairs_at(home),
            target: config.process_target(),
            interval: CYCLE_INTERVAL,
            options: MirrorOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    Checking,
    Mirroring,
    Waiting,
    Stopped,
}

/// One liveness check and, when clear, one pass over every pair.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub target_running: bool,
    /// Empty when the target was running.
    pub pairs: Vec<MirrorReport>,
}

impl CycleReport {
    pub fn files_copied(&self) -> usize {
        self.pairs.iter().map(|p| p.files_copied).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.pairs.iter().all(MirrorReport::is_clean)
    }
}

/// Counters returned when [`CopyCycleController::run`] stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub checks: u64,
    pub cycles_mirrored: u64,
    pub files_copied: u64,
}

enum Wake {
    Elapsed,
    Shutdown,
    SenderGone,
}

pub struct CopyCycleController<O> {
    config: CycleConfig,
    liveness: Arc<Liveness<O>>,
    shutdown: Option<broadcast::Receiver<()>>,
    paused: bool,
    summary: RunSummary,
}

impl<O: ProcessObserver + 'static> CopyCycleController<O> {
    pub fn new(config: CycleConfig, observer: O) -> Self {
        Self {
            config,
            liveness: Arc::new(Liveness::new(observer)),
            shutdown: None,
            paused: false,
            summary: RunSummary::default(),
        }
    }

    /// Stop at the next state boundary once anything is sent on `shutdown`.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Evaluate the liveness gate off the async thread.
    pub async fn target_running(&self) -> bool {
        let liveness = Arc::clone(&self.liveness);
        let target = self.config.target.clone();
        match spawn_traced(move || liveness.is_target_running(&target)).await {
            Ok(running) => running,
            Err(err) => {
                tracing::error!(error = %err, "liveness check task failed");
                false
            }
        }
    }

    /// Mirror every configured pair in order.
    pub async fn mirror_all(&self) -> Vec<MirrorReport> {
        let mut reports = Vec::with_capacity(self.config.pairs.len());
        for pair in &self.config.pairs {
            reports.push(mirror_pair(pair, &self.config.options).await);
        }
        reports
    }

    /// A single check-then-mirror cycle, outside the state loop.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let target_running = self.target_running().await;
        let pairs = if target_running {
            tracing::info!(process = %self.config.target, "target running, skipping mirror");
            Vec::new()
        } else {
            self.mirror_all().await
        };
        CycleReport {
            started_at,
            target_running,
            pairs,
        }
    }

    /// Advance the state machine by one state.
    pub async fn step(&mut self, state: CycleState) -> CycleState {
        match state {
            CycleState::Checking => {
                if self.shutdown_requested() {
                    return CycleState::Stopped;
                }
                self.summary.checks += 1;
                let running = self.target_running().await;
                if running != self.paused {
                    let process = &self.config.target;
                    if running {
                        tracing::info!(process = %process, "target running, mirroring paused");
                    } else {
                        tracing::info!(process = %process, "target exited, mirroring resumed");
                    }
                    self.paused = running;
                }
                if running {
                    CycleState::Waiting
                } else {
                    CycleState::Mirroring
                }
            }
            CycleState::Mirroring => {
                let report = CycleReport {
                    started_at: Utc::now(),
                    target_running: false,
                    pairs: self.mirror_all().await,
                };
                self.summary.cycles_mirrored += 1;
                self.summary.files_copied += report.files_copied() as u64;
                tracing::info!(
                    pairs = report.pairs.len(),
                    copied = report.files_copied(),
                    clean = report.is_clean(),
                    "copy cycle completed",
                );
                CycleState::Waiting
            }
            CycleState::Waiting => self.wait().await,
            CycleState::Stopped => CycleState::Stopped,
        }
    }

    /// Drive the loop from `Checking` until it reaches `Stopped`.
    pub async fn run(mut self) -> RunSummary {
        tracing::info!(
            pairs = self.config.pairs.len(),
            process = %self.config.target,
            interval_ms = self.config.interval.as_millis() as u64,
            "copy cycle controller started",
        );
        let mut state = CycleState::Checking;
        while state != CycleState::Stopped {
            state = self.step(state).await;
        }
        tracing::info!(
            checks = self.summary.checks,
            cycles = self.summary.cycles_mirrored,
            "copy cycle controller stopped",
        );
        self.summary
    }

    fn shutdown_requested(&mut self) -> bool {
        let Some(rx) = self.shutdown.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Lagged(_)) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.shutdown = None;
                false
            }
        }
    }

    async fn wait(&mut self) -> CycleState {
        let sleep = tokio::time::sleep(self.config.interval);
        tokio::pin!(sleep);

        let Some(rx) = self.shutdown.as_mut() else {
            sleep.await;
            return CycleState::Checking;
        };
        let wake = tokio::select! {
            _ = &mut sleep => Wake::Elapsed,
            received = rx.recv() => match received {
                Ok(()) | Err(RecvError::Lagged(_)) => Wake::Shutdown,
                Err(RecvError::Closed) => Wake::SenderGone,
            },
        };

        match wake {
            Wake::Elapsed => CycleState::Checking,
            Wake::Shutdown => {
                tracing::info!("shutdown requested");
                CycleState::Stopped
            }
            Wake::SenderGone => {
                self.shutdown = None;
                sleep.await;
                CycleState::Checking
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packmirror_core::types::PairLabel;
    use packmirror_detector::LivenessError;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct ToggleObserver(Arc<AtomicBool>);

    impl ProcessObserver for ToggleObserver {
        fn process_names(&self) -> Result<Vec<String>, LivenessError> {
            let mut names = vec!["explorer.exe".to_string()];
            if self.0.load(Ordering::SeqCst) {
                names.push("gta5.EXE".to_string());
            }
            Ok(names)
        }

        fn query_by_path(&self, _executable: &Path) -> Result<Vec<String>, LivenessError> {
            Ok(vec!["ProcessId".to_string()])
        }
    }

    struct Fixture {
        _root: TempDir,
        src: std::path::PathBuf,
        dst: std::path::PathBuf,
        config: CycleConfig,
    }

    fn fixture(interval: Duration) -> Fixture {
        let root = TempDir::new().unwrap();
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("x.txt"), "x").unwrap();
        fs::write(src.join("sub").join("y.txt"), "y").unwrap();
        let config = CycleConfig {
            pairs: vec![MirrorPair::new(PairLabel::Gunpack, &src, &dst)],
            target: ProcessTarget::from_executable(None),
            interval,
            options: MirrorOptions::default(),
        };
        Fixture {
            _root: root,
            src,
            dst,
            config,
        }
    }

    #[tokio::test]
    async fn running_target_goes_straight_to_waiting_without_copies() {
        let fx = fixture(Duration::from_secs(5));
        let observer = ToggleObserver::default();
        observer.0.store(true, Ordering::SeqCst);
        let mut controller = CopyCycleController::new(fx.config.clone(), observer);

        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Waiting);
        assert!(!fx.dst.exists());
        assert_eq!(controller.summary().cycles_mirrored, 0);
    }

    #[tokio::test]
    async fn idle_target_mirrors_every_pair() {
        let fx = fixture(Duration::from_secs(5));
        let mut controller = CopyCycleController::new(fx.config.clone(), ToggleObserver::default());

        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Mirroring);
        assert_eq!(controller.step(CycleState::Mirroring).await, CycleState::Waiting);
        assert_eq!(fs::read_to_string(fx.dst.join("x.txt")).unwrap(), "x");
        assert_eq!(fs::read_to_string(fx.dst.join("sub/y.txt")).unwrap(), "y");
        assert_eq!(controller.summary().files_copied, 2);
    }

    #[tokio::test]
    async fn pauses_while_running_and_resumes_after_exit() {
        let fx = fixture(Duration::from_secs(5));
        let observer = ToggleObserver::default();
        let running = Arc::clone(&observer.0);
        let mut controller = CopyCycleController::new(fx.config.clone(), observer);

        running.store(true, Ordering::SeqCst);
        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Waiting);
        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Waiting);
        assert!(!fx.dst.exists());

        running.store(false, Ordering::SeqCst);
        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Mirroring);
        controller.step(CycleState::Mirroring).await;
        assert!(fx.dst.join("x.txt").is_file());
        assert_eq!(controller.summary().checks, 3);
    }

    #[tokio::test]
    async fn pending_shutdown_interrupts_waiting() {
        let fx = fixture(Duration::from_secs(3600));
        let (tx, rx) = broadcast::channel(1);
        let mut controller =
            CopyCycleController::new(fx.config.clone(), ToggleObserver::default())
                .with_shutdown(rx);

        tx.send(()).unwrap();
        assert_eq!(controller.step(CycleState::Waiting).await, CycleState::Stopped);
    }

    #[tokio::test]
    async fn pending_shutdown_stops_before_checking() {
        let fx = fixture(Duration::from_secs(5));
        let (tx, rx) = broadcast::channel(1);
        let mut controller =
            CopyCycleController::new(fx.config.clone(), ToggleObserver::default())
                .with_shutdown(rx);

        tx.send(()).unwrap();
        assert_eq!(controller.step(CycleState::Checking).await, CycleState::Stopped);
        assert_eq!(controller.summary().checks, 0);
        assert!(!fx.dst.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_falls_back_to_plain_sleep() {
        let fx = fixture(Duration::from_secs(5));
        let (tx, rx) = broadcast::channel::<()>(1);
        let mut controller =
            CopyCycleController::new(fx.config.clone(), ToggleObserver::default())
                .with_shutdown(rx);

        drop(tx);
        let started = tokio::time::Instant::now();
        assert_eq!(controller.step(CycleState::Waiting).await, CycleState::Checking);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn run_cycle_reports_skip_when_target_running() {
        let fx = fixture(Duration::from_secs(5));
        let observer = ToggleObserver::default();
        observer.0.store(true, Ordering::SeqCst);
        let controller = CopyCycleController::new(fx.config.clone(), observer);

        let report = controller.run_cycle().await;
        assert!(report.target_running);
        assert!(report.pairs.is_empty());
        assert!(fx.src.join("x.txt").is_file());
        assert!(!fx.dst.exists());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_after_mirroring() {
        let fx = fixture(Duration::from_millis(10));
        let (tx, rx) = broadcast::channel(1);
        let controller =
            CopyCycleController::new(fx.config.clone(), ToggleObserver::default())
                .with_shutdown(rx);
        let handle = tokio::spawn(controller.run());

        let marker = fx.dst.join("sub").join("y.txt");
        for _ in 0..500 {
            if marker.is_file() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(marker.is_file(), "controller never mirrored");

        tx.send(()).unwrap();
        let summary = handle.await.unwrap();
        assert!(summary.cycles_mirrored >= 1);
        assert!(summary.checks >= summary.cycles_mirrored);
    }
}
