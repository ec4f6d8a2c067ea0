//! Shutdown signal handling for the long-running modes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Fires once on SIGINT or SIGTERM
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Install the SIGINT/SIGTERM handlers
    pub fn install() -> Result<Self, std::io::Error> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, receiver) = watch::channel(false);
        let tx = Arc::new(tx);

        for (kind, name) in [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ] {
            let mut stream = signal(kind)?;
            let flag = Arc::clone(&shutdown);
            let tx = Arc::clone(&tx);
            tokio::spawn(async move {
                stream.recv().await;
                eprintln!("{} Received {} (shutdown)", "↓".cyan(), name);
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(true);
            });
        }

        Ok(Self { shutdown, receiver })
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown was requested
    pub async fn wait(&mut self) {
        if self.is_shutdown() {
            return;
        }
        let _ = self.receiver.wait_for(|requested| *requested).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_without_shutdown() {
        let signal = ShutdownSignal::install().unwrap();
        assert!(!signal.is_shutdown());
    }
}
