//! Cooperative stop and pause flags
//!
//! A `CancelToken` is cloned into every phase of a posting cycle. Phases call
//! [`CancelToken::checkpoint`] between blocking steps; a stopped token turns
//! into [`BlogcastError::Stopped`], a paused one parks the caller in a poll
//! loop until it is resumed or stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{BlogcastError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.pause.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::Relaxed);
    }

    /// Flip the pause flag, returning the new state
    pub fn toggle_pause(&self) -> bool {
        !self.pause.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::Relaxed)
    }

    /// Shared stop flag, for signal handlers that need a raw `AtomicBool`
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Return `Err(Stopped)` if a stop was requested, waiting out any pause first
    pub async fn checkpoint(&self) -> Result<()> {
        if self.is_paused() && !self.is_stopped() {
            info!("Paused, waiting for resume...");
            while self.is_paused() && !self.is_stopped() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            if !self.is_stopped() {
                info!("Resumed");
            }
        }

        if self.is_stopped() {
            return Err(BlogcastError::Stopped);
        }
        Ok(())
    }

    /// Sleep for `duration`, waking early if a stop is requested
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            self.checkpoint().await?;
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(());
            }
            tokio::time::sleep((deadline - now).min(POLL_INTERVAL)).await;
        }
    }
}
