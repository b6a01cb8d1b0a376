//! Interlock engine for two-position sensors.
//!
//! Each pair models a mechanical selector that can never report both
//! positions at once (e.g. "retracted" and "extended" of one cylinder).
//! Activating one side forces the other side off; deactivating one side
//! leaves the other untouched.
//!
//! The engine only computes the resulting state changes. Writing them to
//! the Input Area is the caller's job, so the engine itself never fails at
//! runtime.

use ihk_common::io::signal::SignalId;
use thiserror::Error;

/// Capacity of the pair table.
pub const MAX_PAIRS: usize = 8;

/// End-position sensor pairs of the cell's cylinders.
pub const CYLINDER_INTERLOCKS: [InterlockPair; 2] = [
    InterlockPair::new(SignalId::Cylinder1Retracted, SignalId::Cylinder1Extended),
    InterlockPair::new(SignalId::Cylinder2Retracted, SignalId::Cylinder2Extended),
];

/// Invalid pair table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterlockError {
    /// More pairs than [`MAX_PAIRS`].
    #[error("Too many interlock pairs (max {MAX_PAIRS})")]
    TooManyPairs,
    /// A pair whose two sides are the same signal.
    #[error("Signal {0} cannot be interlocked with itself")]
    SelfPaired(SignalId),
    /// A signal listed in more than one pair.
    #[error("Signal {0} appears in more than one interlock pair")]
    Duplicate(SignalId),
}

/// Two mutually exclusive signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockPair {
    /// First position.
    pub a: SignalId,
    /// Second position.
    pub b: SignalId,
}

impl InterlockPair {
    /// Create a pair.
    pub const fn new(a: SignalId, b: SignalId) -> Self {
        Self { a, b }
    }

    /// The other side of the pair, if `id` belongs to it.
    pub fn partner(&self, id: SignalId) -> Option<SignalId> {
        if id == self.a {
            Some(self.b)
        } else if id == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// State changes resulting from one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// The requested signal and its new state.
    pub target: (SignalId, bool),
    /// Partner forced inactive, if the request activated a paired signal.
    pub forced_off: Option<SignalId>,
}

impl Projection {
    /// All changes in write order: the forced partner first, then the
    /// target. A write failing halfway never leaves both sides active.
    pub fn changes(self) -> impl Iterator<Item = (SignalId, bool)> + Clone {
        self.forced_off
            .map(|id| (id, false))
            .into_iter()
            .chain(core::iter::once(self.target))
    }
}

/// Fixed table of interlock pairs.
#[derive(Debug, Clone)]
pub struct InterlockEngine {
    pairs: heapless::Vec<InterlockPair, MAX_PAIRS>,
}

impl InterlockEngine {
    /// Build the engine from a pair table.
    pub fn new(pairs: &[InterlockPair]) -> Result<Self, InterlockError> {
        let mut table: heapless::Vec<InterlockPair, MAX_PAIRS> = heapless::Vec::new();
        for pair in pairs {
            if pair.a == pair.b {
                return Err(InterlockError::SelfPaired(pair.a));
            }
            for side in [pair.a, pair.b] {
                if table.iter().any(|p| p.partner(side).is_some()) {
                    return Err(InterlockError::Duplicate(side));
                }
            }
            table
                .push(*pair)
                .map_err(|_| InterlockError::TooManyPairs)?;
        }
        Ok(Self { pairs: table })
    }

    /// Configured pairs.
    pub fn pairs(&self) -> &[InterlockPair] {
        &self.pairs
    }

    /// Partner of `id`, if it is interlocked.
    pub fn partner(&self, id: SignalId) -> Option<SignalId> {
        self.pairs.iter().find_map(|p| p.partner(id))
    }

    /// Resulting state changes when `id` is requested to become `active`.
    ///
    /// Deterministic and side-effect free. Only activation forces the
    /// partner; deactivation never activates anything.
    pub fn project(&self, id: SignalId, active: bool) -> Projection {
        let forced_off = if active { self.partner(id) } else { None };
        Projection {
            target: (id, active),
            forced_off,
        }
    }
}
