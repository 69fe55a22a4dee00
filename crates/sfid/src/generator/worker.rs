use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ConfigError, Error, Layout, Result, Sleeper, SnowflakeId, SnowflakeParts, SystemClock,
    ThreadSleeper, TimeSource, WorkerBuilder, WorkerConfig,
    generator::{Mutex, MutexGuard, State},
};

/// A lock-based Snowflake ID generator for one `(worker id, datacenter id)`
/// pair.
///
/// All sequencing state, the primary worker's and every backup slot's, sits
/// behind one mutex. [`Self::next_id`] holds it for the whole call, including
/// any wait, so concurrent callers queue up behind a stalled clock instead of
/// racing it.
///
/// ## Clock rollbacks
///
/// When the clock reads earlier than the last issued timestamp:
/// - shorter than `max_backward_ms`: sleep it out, re-read the clock, carry
///   on as usual;
/// - otherwise: issue the ID under a backup worker id with its own
///   timestamp/sequence state, leaving the primary state untouched. If every
///   backup slot has already issued later than the current reading, fail with
///   [`Error::ClockRollback`].
///
/// ## Sequence exhaustion
///
/// After 4096 IDs in one millisecond the call spins (no sleep) until the
/// clock moves on.
///
/// Construct one per `(worker id, datacenter id)` and share it by reference
/// or [`Arc`]; two live workers with the same ids will produce duplicates.
///
/// [`Arc`]: std::sync::Arc
#[derive(Debug)]
pub struct SnowflakeWorker<T = SystemClock, S = ThreadSleeper> {
    config: WorkerConfig,
    #[cfg(feature = "cache-padded")]
    pub(crate) state: crossbeam_utils::CachePadded<Mutex<State>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Mutex<State>,
    time: T,
    sleeper: S,
}

impl SnowflakeWorker {
    /// Builds a worker on the system clock with the default epoch, rollback
    /// tolerance and one backup tier.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either id is outside the range the bit
    /// widths allow, or the widths themselves are unusable.
    ///
    /// # Example
    ///
    /// ```
    /// use sfid::{ConfigError, SnowflakeWorker};
    ///
    /// let worker = SnowflakeWorker::new(5, 5, 7, 2).unwrap();
    /// assert_eq!(worker.config().layout().max_worker_id(), 15);
    ///
    /// let err = SnowflakeWorker::new(5, 5, 16, 2).unwrap_err();
    /// assert_eq!(err, ConfigError::WorkerIdOutOfRange { worker_id: 16, max: 15 });
    /// ```
    pub fn new(
        worker_id_bits: u32,
        data_center_id_bits: u32,
        worker_id: i64,
        data_center_id: i64,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .worker_id_bits(worker_id_bits)
            .data_center_id_bits(data_center_id_bits)
            .worker_id(worker_id)
            .data_center_id(data_center_id)
            .build()
    }

    /// Starts a [`WorkerBuilder`] with default settings.
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::new()
    }

    /// Builds a worker on the system clock from an already validated config.
    #[must_use]
    pub fn from_config(config: WorkerConfig) -> Self {
        Self::with_config(config, SystemClock, ThreadSleeper)
    }
}

impl<T, S> SnowflakeWorker<T, S>
where
    T: TimeSource,
    S: Sleeper,
{
    /// Builds a worker from a validated config, a clock and a sleeper.
    ///
    /// Every slot starts out as never used, so the first ID is issued at
    /// sequence 0 whatever the clock reads.
    pub fn with_config(config: WorkerConfig, time: T, sleeper: S) -> Self {
        let state = Mutex::new(State::new(config.layout().backup_count()));
        Self {
            config,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(state),
            #[cfg(not(feature = "cache-padded"))]
            state,
            time,
            sleeper,
        }
    }

    /// Generates the next ID, blocking while the clock catches up.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRollback`] if the clock jumped back by at least
    ///   `max_backward_ms` and no backup slot can take over
    /// - [`Error::Interrupted`] if the wait for a shorter rollback was cut
    ///   short
    /// - [`Error::LockPoisoned`] if a previous caller panicked while holding
    ///   the lock (std mutex only)
    ///
    /// # Example
    ///
    /// ```
    /// use sfid::SnowflakeWorker;
    ///
    /// let worker = SnowflakeWorker::new(5, 5, 1, 1).unwrap();
    /// let a = worker.next_id().unwrap();
    /// let b = worker.next_id().unwrap();
    /// assert!(a < b);
    /// ```
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "trace",
            skip(self),
            fields(worker_id = self.config.worker_id(), data_center_id = self.config.data_center_id())
        )
    )]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;
        let mut now = self.time.current_millis();

        if let Some(backward_ms) = state.primary.behind_by(now) {
            if backward_ms < self.config.max_backward_ms() {
                now = self.cold_wait_out_rollback(backward_ms)?;
            } else {
                return self.cold_next_backup_id(&mut state, now, backward_ms);
            }
        }

        let layout = self.config.layout();
        let now = state
            .primary
            .advance(now, layout.sequence_mask(), &self.time);
        Ok(layout.encode(
            now,
            self.config.data_center_id(),
            self.config.worker_id(),
            state.primary.sequence,
        ))
    }

    #[cold]
    #[inline(never)]
    fn cold_wait_out_rollback(&self, backward_ms: u64) -> Result<u64> {
        #[cfg(feature = "tracing")]
        tracing::debug!(backward_ms, "clock moved backwards, waiting it out");

        self.sleeper
            .sleep(Duration::from_millis(backward_ms))
            .map_err(|_| Error::Interrupted { backward_ms })?;
        Ok(self.time.current_millis())
    }

    #[cold]
    #[inline(never)]
    fn cold_next_backup_id(
        &self,
        state: &mut State,
        now: u64,
        backward_ms: u64,
    ) -> Result<SnowflakeId> {
        let Some(index) = state.backups.select(now) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(backward_ms, "clock moved backwards and no backup slot is free");
            return Err(Error::ClockRollback { backward_ms });
        };

        let layout = self.config.layout();
        let backup_worker_id = layout.backup_worker_id(self.config.worker_id(), index as u64 + 1);

        #[cfg(feature = "tracing")]
        tracing::warn!(
            backward_ms,
            backup_worker_id,
            "clock moved backwards, issuing under backup worker id"
        );

        let slot = state.backups.slot_mut(index);
        let now = slot.advance(now, layout.sequence_mask(), &self.time);
        Ok(layout.encode(
            now,
            self.config.data_center_id(),
            backup_worker_id,
            slot.sequence,
        ))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

impl<T, S> SnowflakeWorker<T, S> {
    #[must_use]
    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        self.config.layout()
    }

    /// Splits an ID issued under this worker's layout into its fields.
    #[must_use]
    pub const fn decode(&self, id: SnowflakeId) -> SnowflakeParts {
        self.config.layout().decode(id)
    }
}
