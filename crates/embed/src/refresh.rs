use crate::host::Workspace;
use crate::settings::RefreshConfig;
use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Something that can re-render every embed of a source file
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Re-resolve all live embeds of `path`; returns how many were re-rendered
    async fn refresh_source(&self, path: &str) -> usize;
}

/// Terminal state of one watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WatchOutcome {
    /// The active file moved away from the edited file; embeds were refreshed
    Matched { refreshed: usize },
    /// The ceiling elapsed while the edited file stayed active
    TimedOut,
    /// The owning view went away first
    Cancelled,
}

/// Running watch; dropping the handle does not stop the watch
#[derive(Debug)]
pub struct WatchHandle {
    path: String,
    task: JoinHandle<WatchOutcome>,
}

impl WatchHandle {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(self) -> WatchOutcome {
        self.task.await.unwrap_or(WatchOutcome::Cancelled)
    }
}

/// Polls the host's active file after an edit session and refreshes the embeds of
/// the edited file once the user has moved on.
///
/// Every watch observes the scheduler's shutdown channel: calling
/// [`RefreshScheduler::shutdown`] or dropping the scheduler ends all of them as
/// [`WatchOutcome::Cancelled`].
pub struct RefreshScheduler {
    config: RefreshConfig,
    workspace: Arc<dyn Workspace>,
    shutdown_tx: watch::Sender<bool>,
}

impl RefreshScheduler {
    pub fn new(workspace: Arc<dyn Workspace>, config: RefreshConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            workspace,
            shutdown_tx,
        }
    }

    #[must_use]
    pub const fn config(&self) -> RefreshConfig {
        self.config
    }

    /// Start watching `edited_path`. Watches are independent; two watches of the same
    /// file each refresh once.
    pub fn watch(
        &self,
        edited_path: impl Into<String>,
        target: Weak<dyn RefreshTarget>,
    ) -> WatchHandle {
        let path = edited_path.into();
        let shutdown_rx = self.shutdown_tx.subscribe();
        debug!(
            "watching {path} every {:?} for up to {:?}",
            self.config.interval, self.config.timeout
        );

        let task = tokio::spawn(run_watch(
            path.clone(),
            self.config,
            self.workspace.clone(),
            target,
            shutdown_rx,
        ));

        WatchHandle { path, task }
    }

    /// Cancel every outstanding watch
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_watch(
    path: String,
    config: RefreshConfig,
    workspace: Arc<dyn Workspace>,
    target: Weak<dyn RefreshTarget>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> WatchOutcome {
    if *shutdown_rx.borrow() {
        return WatchOutcome::Cancelled;
    }

    let mut ticker = time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut elapsed = time::Duration::ZERO;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => {
                debug!("watch on {path} cancelled");
                return WatchOutcome::Cancelled;
            }
        }

        if workspace.active_file().as_deref() != Some(path.as_str()) {
            let Some(target) = target.upgrade() else {
                debug!("view of {path} is gone; dropping watch");
                return WatchOutcome::Cancelled;
            };
            let refreshed = target.refresh_source(&path).await;
            info!("{path} left after edit; refreshed {refreshed} embed(s)");
            return WatchOutcome::Matched { refreshed };
        }

        elapsed += config.interval;
        if elapsed >= config.timeout {
            info!("timeout reached while waiting to refresh {path}; stop waiting");
            return WatchOutcome::TimedOut;
        }
    }
}
