//! Polling cycle state and statistics.
//!
//! ```text
//!   Idle ──attach──► Running ──I/O failure / shutdown──► Stopped
//! ```
//!
//! `Stopped` is terminal. Ticks outside `Running` are skipped without
//! touching the controller.

use std::fmt;
use std::time::Duration;

use tracing::{error, info};

use crate::display::PanelDisplay;
use crate::error::BridgeError;

/// Lifecycle of the polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CycleState {
    /// Not yet attached to a controller.
    #[default]
    Idle,
    /// Ticking.
    Running,
    /// Halted after an I/O failure or shutdown.
    Stopped,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of one tick request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The cycle was not running; nothing happened.
    Skipped(CycleState),
    /// Tick executed; display state after the tick.
    Completed(PanelDisplay),
}

/// Counters kept across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Completed ticks.
    pub ticks: u64,
    /// Position feedback words written.
    pub publications: u64,
    /// Ticks where a cylinder output forced the position.
    pub forced: u64,
    /// Analog writes that failed and were discarded.
    pub dropped_writes: u64,
}

/// Polling cycle bookkeeping.
#[derive(Debug, Clone)]
pub struct PollingCycle {
    state: CycleState,
    period: Duration,
    stats: CycleStats,
    last_failure: Option<BridgeError>,
}

impl PollingCycle {
    /// Idle cycle with the given tick period.
    pub fn new(period: Duration) -> Self {
        Self {
            state: CycleState::Idle,
            period,
            stats: CycleStats::default(),
            last_failure: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Whether ticks are executed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == CycleState::Running
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Counters.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CycleStats {
        &mut self.stats
    }

    /// Failure that stopped the cycle, if any.
    pub fn last_failure(&self) -> Option<&BridgeError> {
        self.last_failure.as_ref()
    }

    /// Idle → Running. Returns `false` from any other state.
    pub fn start(&mut self) -> bool {
        if self.state != CycleState::Idle {
            return false;
        }
        self.state = CycleState::Running;
        info!("Polling cycle started (period {:?})", self.period);
        true
    }

    /// Halt after an I/O failure. Reported once; later failures are ignored.
    pub fn fail(&mut self, err: BridgeError) {
        if self.state == CycleState::Stopped {
            return;
        }
        error!("Polling cycle stopped after {} ticks: {}", self.stats.ticks, err);
        self.state = CycleState::Stopped;
        self.last_failure = Some(err);
    }

    /// Orderly halt.
    pub fn stop(&mut self) {
        if self.state != CycleState::Stopped {
            info!("Polling cycle stopped after {} ticks", self.stats.ticks);
            self.state = CycleState::Stopped;
        }
    }

    pub(crate) fn record_tick(&mut self) {
        self.stats.ticks += 1;
    }
}
