//! Background eviction task for the response cache.
//!
//! The sweeper owns no cache state of its own: it calls [`ResponseCache::sweep`] on a fixed
//! interval and on demand, and keeps running totals for diagnostics. Control goes through a
//! cloneable [`SweeperHandle`] backed by an unbounded command channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use super::{ResponseCache, SweepReport};
use crate::config::CacheConfig;
use crate::metrics;

#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    pub interval_ms: u64,
    /// Zero disables the periodic stats line.
    pub stats_interval_ms: u64,
}

impl SweeperConfig {
    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self {
            interval_ms: cfg.sweep_interval_ms,
            stats_interval_ms: cfg.stats_interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

pub enum SweepCommand {
    SweepNow(oneshot::Sender<SweepReport>),
    Snapshot(oneshot::Sender<SweeperStats>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Default)]
pub struct SweeperStats {
    pub sweeps: u64,
    pub evicted_total: u64,
    pub followups_pruned_total: u64,
    pub last: Option<SweepReport>,
}

impl SweeperStats {
    fn record(&mut self, report: SweepReport) {
        self.sweeps += 1;
        self.evicted_total += report.evicted as u64;
        self.followups_pruned_total += report.followups_pruned as u64;
        self.last = Some(report);
    }
}

#[derive(Clone, Debug)]
pub struct SweeperHandle {
    tx: mpsc::UnboundedSender<SweepCommand>,
}

impl SweeperHandle {
    /// Run a sweep right away. `None` once the task has stopped.
    pub async fn sweep_now(&self) -> Option<SweepReport> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(SweepCommand::SweepNow(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    pub async fn snapshot(&self) -> Option<SweeperStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(SweepCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(SweepCommand::Shutdown(tx));
        let _ = rx.await;
    }
}

pub fn start_sweeper(cache: Arc<ResponseCache>, cfg: SweeperConfig) -> SweeperHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<SweepCommand>();
    let handle = SweeperHandle { tx };

    tokio::spawn(async move {
        let mut stats = SweeperStats::default();
        let period = cfg.interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_stats_log = Instant::now();
        loop {
            tokio::select! {
                biased;
                cmd = rx.recv() => {
                    match cmd {
                        Some(SweepCommand::SweepNow(resp)) => {
                            let report = cache.sweep();
                            stats.record(report);
                            let _ = resp.send(report);
                        }
                        Some(SweepCommand::Snapshot(resp)) => { let _ = resp.send(stats.clone()); }
                        Some(SweepCommand::Shutdown(done)) => { let _ = done.send(()); break; }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    stats.record(cache.sweep());
                }
            }

            if cfg.stats_interval_ms > 0 && last_stats_log.elapsed() >= cfg.stats_interval() {
                let m = metrics::snapshot();
                log::debug!(
                    target: "cache",
                    "sweeper stats: sweeps={} evicted_total={} live_entries={} handled={} busy_rejections={} expired={}",
                    stats.sweeps,
                    stats.evicted_total,
                    m.live_entries(),
                    m.interactions_handled,
                    m.interactions_rejected_busy,
                    m.interactions_expired
                );
                last_stats_log = Instant::now();
            }
        }
        log::debug!(target: "cache", "sweeper loop terminated");
    });

    handle
}
