//! Time-windowed call coalescing.
//!
//! A [`Coalescer`] collapses a burst of calls into a single trailing firing
//! carrying the value of the last call. It owns no task and no callback:
//! the owner awaits [`Coalescer::fired`] inside its event loop (usually as
//! one arm of a `tokio::select!`) and applies the returned value itself.
//! At most one pending value is held per coalescer.
//!
//! - **Debounce**: every call pushes the deadline out by the full window,
//!   so the value fires only once calls stop for `window`.
//! - **Throttle** (trailing only): the first call opens a window; calls
//!   inside it only replace the value; the value fires when the window
//!   closes. Nothing fires if nothing was called.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// How calls inside an open window are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Debounce,
    Throttle,
}

struct Pending<T> {
    deadline: Instant,
    value: T,
}

/// A debounced or throttled call site.
pub struct Coalescer<T> {
    mode: Mode,
    window: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Coalescer<T> {
    /// Creates a coalescer in the given mode.
    pub fn new(mode: Mode, window: Duration) -> Self {
        Self {
            mode,
            window,
            pending: None,
        }
    }

    /// Trailing-edge debounce: fires `window` after the last call.
    pub fn debounce(window: Duration) -> Self {
        Self::new(Mode::Debounce, window)
    }

    /// Trailing-only throttle: fires once per window that saw a call.
    pub fn throttle(window: Duration) -> Self {
        Self::new(Mode::Throttle, window)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a call. The stored value is always the most recent one.
    pub fn call(&mut self, value: T) {
        match (&mut self.pending, self.mode) {
            (Some(pending), Mode::Throttle) => pending.value = value,
            _ => {
                self.pending = Some(Pending {
                    deadline: Instant::now() + self.window,
                    value,
                });
            }
        }
    }

    /// Drops the pending value, if any. Nothing fires afterwards until the
    /// next [`call`](Self::call).
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.pending.take().is_some();
        if cancelled {
            debug!(mode = ?self.mode, "Cancelled pending call");
        }
        cancelled
    }

    /// Returns `true` while a value is waiting for its window to close.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Waits for the pending value to fire and takes it.
    ///
    /// Never resolves while nothing is pending. Cancel-safe: dropping the
    /// future before it resolves leaves the pending value in place.
    pub async fn fired(&mut self) -> T {
        let Some(deadline) = self.deadline() else {
            return std::future::pending().await;
        };
        sleep_until(deadline).await;

        match self.pending.take() {
            Some(pending) => pending.value,
            None => std::future::pending().await,
        }
    }
}
