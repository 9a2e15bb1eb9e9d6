//! Upload progress reporting.

use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Percent(u8);

impl Percent {
    /// 0%.
    pub const ZERO: Self = Self(0);
    /// 100%.
    pub const COMPLETE: Self = Self(100);

    /// Clamp a raw value into range.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Share of `done` over `total`, rounded down. An empty total counts as complete.
    #[must_use]
    pub fn of(done: u64, total: u64) -> Self {
        if total == 0 {
            return Self::COMPLETE;
        }
        let ratio = u128::from(done.min(total)) * 100 / u128::from(total);
        Self(u8::try_from(ratio).unwrap_or(100))
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Display for Percent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}%", self.0)
    }
}

/// Receives progress for a single upload.
///
/// Values are monotonically non-decreasing per upload. Implementations must
/// tolerate updates after they have rendered a "done" state.
pub trait ProgressSink: Send + Sync {
    /// Record the latest percentage.
    fn update(&self, percent: Percent);
}

/// Sink that drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _percent: Percent) {}
}

/// Forwards progress to a sink until the owning request resolves.
///
/// Once [`ProgressGate::close`] returns, the sink is never called again, even
/// if the transport keeps polling the request body on another task.
pub(crate) struct ProgressGate {
    sink: Arc<dyn ProgressSink>,
    state: Mutex<GateState>,
}

struct GateState {
    open: bool,
    last: Option<Percent>,
}

impl ProgressGate {
    pub(crate) fn new(sink: Arc<dyn ProgressSink>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            state: Mutex::new(GateState {
                open: true,
                last: None,
            }),
        })
    }

    /// Forward `percent` if the gate is open. Returns `false` once closed.
    ///
    /// Regressions and repeats are swallowed so the sink only sees increases.
    pub(crate) fn report(&self, percent: Percent) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.open {
            return false;
        }
        if state.last.is_some_and(|last| percent <= last) {
            return true;
        }
        state.last = Some(percent);
        // Held across the call so `close` cannot race an in-flight update.
        self.sink.update(percent);
        true
    }

    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open = false;
    }
}
