//! Active expiration scheduler
//!
//! Runs `Server::sweep_expired` on a fixed interval from a background
//! thread, so expired keys that nobody reads still get reclaimed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use tracing::{debug, warn};

use crate::error::{NimbusError, Result};
use crate::server::Server;

/// Handle to a running sweeper thread. Stops the thread when dropped.
pub struct Sweeper {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    evicted: Arc<AtomicUsize>,
}

impl Sweeper {
    /// Start sweeping `server` every `interval`. A zero interval is rejected.
    pub fn spawn(server: Arc<Server>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(NimbusError::Config(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evicted);

        let handle = thread::Builder::new()
            .name("nimbuskv-sweeper".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    crossbeam::select! {
                        recv(ticker) -> _ => {
                            let n = server.sweep_expired();
                            if n > 0 {
                                counter.fetch_add(n, Ordering::Relaxed);
                                debug!(evicted = n, "active expiry pass");
                            }
                        }
                        // a message or a dropped sender both mean stop
                        recv(shutdown_rx) -> _ => break,
                    }
                }
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            evicted,
        })
    }

    /// Total keys evicted by this sweeper so far
    pub fn evicted(&self) -> usize {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Stop the thread and wait for it to finish
    pub fn stop(mut self) -> usize {
        self.shutdown_and_join();
        self.evicted()
    }

    fn shutdown_and_join(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
