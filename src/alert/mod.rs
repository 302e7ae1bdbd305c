//! Two-tier alerting: try the rich channel, fall back to the terminal.

use std::io::Write;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CheckError;
use crate::traits::Notifier;

/// Last-resort cue: a BEL character and a highlighted console line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl TerminalBell {
    fn ring(title: &str, message: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\x07")?;
        writeln!(stdout, "  >>> {title} <<< {message}")?;
        stdout.flush()
    }
}

#[async_trait]
impl Notifier for TerminalBell {
    async fn notify(&self, title: &str, message: &str) -> Result<(), CheckError> {
        Self::ring(title, message).map_err(|e| CheckError::notify(format!("terminal bell: {e}")))
    }
}

/// Sends through `primary`, and through `fallback` when that fails.
///
/// Never reports an error: an alert that cannot be delivered must not change
/// the outcome of a scan.
#[derive(Debug, Clone)]
pub struct FallbackNotifier<P, S> {
    primary: P,
    fallback: S,
}

impl<P, S> FallbackNotifier<P, S> {
    pub fn new(primary: P, fallback: S) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: Notifier, S: Notifier> Notifier for FallbackNotifier<P, S> {
    async fn notify(&self, title: &str, message: &str) -> Result<(), CheckError> {
        println!("\n[通知] {title}: {message}");

        if let Err(primary_err) = self.primary.notify(title, message).await {
            debug!("Primary alert channel failed ({}), using fallback", primary_err);
            if let Err(fallback_err) = self.fallback.notify(title, message).await {
                debug!("Fallback alert channel failed: {}", fallback_err);
            }
        }
        Ok(())
    }
}
