//! Runs reconciliation cycles, once or on a fixed period.
use std::{future::Future, time::Duration};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Decides when reconciliation cycles run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    period: Option<Duration>,
}

impl Scheduler {
    /// `None` or a zero period runs a single cycle.
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            period: period.filter(|period| !period.is_zero()),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Run `cycle` until it fails or `shutdown` resolves.
    ///
    /// Without a period exactly one cycle runs and its result is returned. With a period the
    /// first cycle starts immediately and later cycles start on multiples of the period from
    /// the first; ticks missed by a slow cycle are skipped rather than bunched up. Cycles
    /// never overlap. `shutdown` is only observed between cycles, so a cycle in flight always
    /// completes. The first failing cycle ends the loop with its error.
    pub async fn run<F, Fut, S, E>(&self, mut cycle: F, shutdown: S) -> Result<(), E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<(), E>> + Send,
        S: Future<Output = ()> + Send,
        E: Send,
    {
        let Some(period) = self.period else {
            debug!("running a single reconciliation cycle");
            return cycle().await;
        };

        info!(
            period = %humantime::format_duration(period),
            "running periodic reconciliation"
        );
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut cycles: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(cycles, "shutdown requested, stopping reconciliation");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            cycles += 1;
            debug!(cycle = cycles, "starting reconciliation cycle");
            cycle().await?;
        }
    }
}

/// Wait for a `SIGTERM` or `SIGINT` to stop the process on UNIX systems
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(%e, "failed to register signal handlers, ignoring shutdown signals");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = term.recv() => info!("Received SIGTERM"),
        _ = int.recv() => info!("Received SIGINT"),
    }
}

/// Wait for a `ctrl+c` to stop the process on Windows systems
#[cfg(windows)]
pub async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received SIGINT");
}
