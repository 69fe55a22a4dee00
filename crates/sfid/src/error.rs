/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Reasons a generator refuses to be built.
///
/// Every variant is fatal: a process whose only identifier source fails to
/// build should refuse to start rather than fall back to some other layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The worker id does not fit the primary (non-backup) worker range.
    #[error("worker id {worker_id} out of range: must be between 0 and {max}")]
    WorkerIdOutOfRange {
        /// The rejected worker id.
        worker_id: i64,
        /// The largest primary worker id the layout allows.
        max: u64,
    },

    /// The datacenter id does not fit its bit field.
    #[error("data center id {data_center_id} out of range: must be between 0 and {max}")]
    DataCenterIdOutOfRange {
        /// The rejected datacenter id.
        data_center_id: i64,
        /// The largest datacenter id the layout allows.
        max: u64,
    },

    /// Worker, datacenter and sequence bits leave no room for a timestamp.
    #[error(
        "{worker_id_bits} worker id bits and {data_center_id_bits} data center id bits leave no \
         room for a timestamp (at most {max_location_bits} bits combined)"
    )]
    LayoutTooWide {
        /// Requested worker id bits.
        worker_id_bits: u32,
        /// Requested datacenter id bits.
        data_center_id_bits: u32,
        /// The largest combined width that still leaves a timestamp field.
        max_location_bits: u32,
    },

    /// The worker id space is too small to split into a primary block plus
    /// `backup_count` backup blocks.
    #[error("{worker_id_bits} worker id bits cannot hold a primary range plus {backup_count} backup ranges")]
    WorkerSpaceTooSmall {
        /// Requested worker id bits.
        worker_id_bits: u32,
        /// Requested number of backup tiers.
        backup_count: u32,
    },

    /// At least one backup tier is required.
    #[error("backup count must be at least 1")]
    NoBackupSlots,

    /// The epoch does not fit in 64 bits of milliseconds.
    #[error("epoch is out of range")]
    EpochOutOfRange,
}

/// All errors that generating an ID can produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The generator could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The clock rolled back past the tolerated window and every backup slot
    /// was already used at a later timestamp.
    ///
    /// Nothing is retried internally; the caller may try again later.
    #[error("clock moved backwards, refusing to generate id for {backward_ms} milliseconds")]
    ClockRollback {
        /// How far the clock is behind the last issued timestamp.
        backward_ms: u64,
    },

    /// The wait for a small clock rollback was interrupted.
    #[error("interrupted while waiting out a {backward_ms} ms clock rollback")]
    Interrupted {
        /// How far the clock was behind when the wait began.
        backward_ms: u64,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
