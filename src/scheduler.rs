//! Single-pass and continuous runs with cooperative cancellation.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{error, info};

use crate::checker::{AvailabilityChecker, PassSummary};
use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::report;
use crate::traits::{Notifier, SessionFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass, then exit
    Once,
    /// A pass, then a wait of this long, until cancelled
    Every(Duration),
}

/// Resolves once `true` is published; never resolves if the sender is gone.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|&stop| stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub struct Scheduler<F, N> {
    config: CheckerConfig,
    sessions: F,
    notifier: N,
}

impl<F: SessionFactory, N: Notifier> Scheduler<F, N> {
    pub fn new(config: CheckerConfig, sessions: F, notifier: N) -> Self {
        Self {
            config,
            sessions,
            notifier,
        }
    }

    /// One sweep over every date on `session`, framed by banner and closing line.
    pub async fn run_pass(&self, session: &F::Session) -> PassSummary {
        println!("{}", report::banner(&self.config, Local::now()));
        let summary = AvailabilityChecker::new(&self.config, session, &self.notifier)
            .scan_dates()
            .await;
        println!("{}", report::closing_line(summary.any_available));
        info!(
            "Pass finished: {} date(s) checked, seats found: {}",
            summary.results.len(),
            summary.any_available
        );
        summary
    }

    /// Run passes according to `mode` until done or `shutdown` flips to `true`.
    ///
    /// The first session is opened before anything else and its failure is
    /// returned; later passes open their own sessions and a failure there only
    /// skips that pass. Returns whether any pass found seats.
    pub async fn run(
        &self,
        mode: RunMode,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<bool, CheckError> {
        let mut next_session = Some(self.sessions.open()?);
        let mut any_available = false;

        if let RunMode::Every(interval) = mode {
            println!(
                "Continuous check every {}s — Ctrl+C to stop\n",
                interval.as_secs()
            );
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let session = match next_session.take() {
                Some(session) => Some(session),
                None => match self.sessions.open() {
                    Ok(session) => Some(session),
                    Err(e) => {
                        error!("Could not open a session for this pass: {}", e);
                        None
                    }
                },
            };

            if let Some(session) = session {
                tokio::select! {
                    biased;
                    () = cancelled(&mut shutdown) => break,
                    summary = self.run_pass(&session) => {
                        any_available |= summary.any_available;
                    }
                }
            }

            let RunMode::Every(interval) = mode else {
                return Ok(any_available);
            };

            info!("Next pass in {}s", interval.as_secs());
            tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        println!("\nStopped.");
        Ok(any_available)
    }
}
