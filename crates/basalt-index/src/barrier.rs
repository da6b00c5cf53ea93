//! Concurrency-group tokens.
//!
//! Compaction and cleanup commits apply index deltas inside a consistency
//! barrier shared with the rest of the engine, the same mechanism base
//! table writes run under, which gives indexes a consistent point relative
//! to flushes. The engine supplies the real [`OperationBarrier`];
//! [`LocalBarrier`] is a counting implementation for tests and
//! single-process embedding.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Marker for barrier-specific group state. Releasing the group is the
/// token's `Drop`.
pub trait OpToken: Send + Sync {}

/// An opaque handle bounding a sequence of index operations inside the
/// engine's consistency barrier.
///
/// Cloning is cheap; the group stays open until the last clone is dropped.
/// Groups are held only for the duration of applying a delta, never across
/// lifecycle operations.
#[derive(Clone)]
pub struct OperationGroup {
    _token: Arc<dyn OpToken>,
}

impl OperationGroup {
    pub fn new(token: impl OpToken + 'static) -> Self {
        Self {
            _token: Arc::new(token),
        }
    }

    /// A group bound to no barrier. Useful for callers that already hold
    /// their consistency guarantees elsewhere (e.g. unit tests).
    pub fn detached() -> Self {
        struct DetachedToken;
        impl OpToken for DetachedToken {}
        Self::new(DetachedToken)
    }
}

impl fmt::Debug for OperationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OperationGroup")
    }
}

/// Source of [`OperationGroup`] tokens.
pub trait OperationBarrier: Send + Sync {
    /// Opens a new group. The group ends when the last clone of the
    /// returned token is dropped.
    fn start(&self) -> OperationGroup;
}

/// Counting in-process barrier.
#[derive(Debug, Default)]
pub struct LocalBarrier {
    active: Arc<AtomicU64>,
    started: AtomicU64,
}

impl LocalBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups currently open.
    pub fn active_groups(&self) -> u64 {
        self.active.load(Ordering::Acquire)
    }

    /// Total number of groups ever started.
    pub fn groups_started(&self) -> u64 {
        self.started.load(Ordering::Acquire)
    }
}

struct CountedToken {
    active: Arc<AtomicU64>,
}

impl OpToken for CountedToken {}

impl Drop for CountedToken {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

impl OperationBarrier for LocalBarrier {
    fn start(&self) -> OperationGroup {
        self.active.fetch_add(1, Ordering::AcqRel);
        self.started.fetch_add(1, Ordering::AcqRel);
        OperationGroup::new(CountedToken {
            active: Arc::clone(&self.active),
        })
    }
}
