//! Question countdown for Quizforge.
//!
//! A [`Countdown`] is a background task that emits one [`CountdownTick`]
//! per interval (one second by default) until the remaining time reaches
//! zero. Every tick carries the [`Epoch`] the countdown was started under.
//!
//! # Staleness
//!
//! Cancelling a countdown aborts its task, but a tick may already be
//! sitting in the channel when that happens. Consumers therefore keep their
//! own current epoch and drop any tick whose epoch does not match it:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* may bump epoch and restart */ }
//!         Some(tick) = tick_rx.recv() => {
//!             if tick.epoch != current_epoch {
//!                 continue; // superseded countdown
//!             }
//!             // broadcast remaining time...
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Epoch
// ---------------------------------------------------------------------------

/// Generation counter identifying one countdown among all countdowns a
/// room has ever started. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch before any countdown has been started.
    pub const ZERO: Epoch = Epoch(0);

    /// Returns the following epoch.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a single countdown.
#[derive(Debug, Clone)]
pub struct CountdownConfig {
    /// Whole seconds to count down from.
    pub duration_secs: u32,
    /// Wall-clock time between ticks. One second in production; tests may
    /// shorten it.
    pub interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10,
            interval: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// Longest countdown accepted.
    pub const MAX_DURATION_SECS: u32 = 3600;

    /// A one-tick-per-second countdown of the given length.
    pub fn with_secs(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Countdown::start`]. Rules:
    /// - `duration_secs` clamped to `1..=MAX_DURATION_SECS`.
    /// - a zero `interval` becomes one second.
    pub fn validated(mut self) -> Self {
        if self.duration_secs == 0 {
            warn!("countdown duration of 0s, using 1s");
            self.duration_secs = 1;
        }
        if self.duration_secs > Self::MAX_DURATION_SECS {
            warn!(
                secs = self.duration_secs,
                max = Self::MAX_DURATION_SECS,
                "countdown duration exceeds maximum, clamping"
            );
            self.duration_secs = Self::MAX_DURATION_SECS;
        }
        if self.interval.is_zero() {
            warn!("countdown interval of 0, using 1s");
            self.interval = Duration::from_secs(1);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One tick of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Epoch the emitting countdown was started under.
    pub epoch: Epoch,
    /// Whole seconds left after this tick.
    pub remaining_secs: u32,
    /// Length of the countdown.
    pub total_secs: u32,
}

impl CountdownTick {
    /// Remaining time as a fraction of the total, from 1.0 down to 0.0.
    pub fn fraction(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        f64::from(self.remaining_secs) / f64::from(self.total_secs)
    }

    /// `true` for the final tick.
    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A running countdown. Dropping it (or calling [`cancel`](Self::cancel))
/// stops further ticks from being scheduled.
pub struct Countdown {
    epoch: Epoch,
    total_secs: u32,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawns a countdown task that sends its ticks to `ticks`.
    ///
    /// The first tick fires one interval after the call, the last one
    /// (`remaining_secs == 0`) after `duration_secs` intervals. The task
    /// ends on its own after the last tick or when the receiver is gone.
    pub fn start(
        epoch: Epoch,
        config: CountdownConfig,
        ticks: mpsc::UnboundedSender<CountdownTick>,
    ) -> Self {
        let config = config.validated();
        let total_secs = config.duration_secs;
        let period = config.interval;

        debug!(%epoch, secs = total_secs, "countdown started");

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // Late ticks are delivered late rather than dropped; every second
            // is announced, in order.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for remaining_secs in (0..total_secs).rev() {
                interval.tick().await;
                let tick = CountdownTick {
                    epoch,
                    remaining_secs,
                    total_secs,
                };
                trace!(%epoch, remaining_secs, "countdown tick");
                if ticks.send(tick).is_err() {
                    debug!(%epoch, "countdown receiver gone, stopping");
                    return;
                }
            }
        });

        Self {
            epoch,
            total_secs,
            handle,
        }
    }

    /// Stops the countdown. Ticks already sent are not recalled.
    pub fn cancel(self) {
        trace!(epoch = %self.epoch, "countdown cancelled");
        self.handle.abort();
    }

    /// The epoch this countdown runs under.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Length of the countdown in seconds.
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    /// Whether the countdown task has finished (expired or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
