use core::time::Duration;

use crate::{
    ConfigError, DEFAULT_BACKUP_COUNT, DEFAULT_DATA_CENTER_ID_BITS, DEFAULT_EPOCH,
    DEFAULT_WORKER_ID_BITS, Layout, Sleeper, SnowflakeWorker, SystemClock, ThreadSleeper,
    TimeSource,
};

/// Default tolerance for backward clock jumps, in milliseconds.
///
/// Rollbacks shorter than this are waited out; anything longer switches to a
/// backup worker id. The wait happens while holding the generator lock, so
/// keep this small.
pub const DEFAULT_MAX_BACKWARD_MS: u64 = 3;

/// Validated, immutable settings of one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerConfig {
    layout: Layout,
    worker_id: u64,
    data_center_id: u64,
    max_backward_ms: u64,
}

impl WorkerConfig {
    /// Checks `worker_id` and `data_center_id` against `layout`.
    ///
    /// Both ids are taken signed so that negative values coming from
    /// configuration are reported rather than wrapped.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WorkerIdOutOfRange`] unless `0 <= worker_id <=
    ///   layout.max_worker_id()`
    /// - [`ConfigError::DataCenterIdOutOfRange`] unless `0 <= data_center_id
    ///   <= layout.max_data_center_id()`
    pub fn new(
        layout: Layout,
        worker_id: i64,
        data_center_id: i64,
        max_backward_ms: u64,
    ) -> Result<Self, ConfigError> {
        let max = layout.max_worker_id();
        let worker_id = u64::try_from(worker_id)
            .ok()
            .filter(|&id| id <= max)
            .ok_or(ConfigError::WorkerIdOutOfRange { worker_id, max })?;

        let max = layout.max_data_center_id();
        let data_center_id = u64::try_from(data_center_id)
            .ok()
            .filter(|&id| id <= max)
            .ok_or(ConfigError::DataCenterIdOutOfRange {
                data_center_id,
                max,
            })?;

        Ok(Self {
            layout,
            worker_id,
            data_center_id,
            max_backward_ms,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    #[must_use]
    pub const fn data_center_id(&self) -> u64 {
        self.data_center_id
    }

    #[must_use]
    pub const fn max_backward_ms(&self) -> u64 {
        self.max_backward_ms
    }

    /// Worker ids this worker falls back to, in tier order.
    pub fn backup_worker_ids(&self) -> impl Iterator<Item = u64> + '_ {
        (1..=u64::from(self.layout.backup_count()))
            .map(|tier| self.layout.backup_worker_id(self.worker_id, tier))
    }
}

/// Builder for [`SnowflakeWorker`].
///
/// Defaults: 5 worker id bits, 5 datacenter id bits, worker and datacenter
/// `0`, [`DEFAULT_MAX_BACKWARD_MS`], one backup tier, [`DEFAULT_EPOCH`], the
/// [`SystemClock`] and [`ThreadSleeper`].
///
/// # Example
///
/// ```
/// use sfid::SnowflakeWorker;
///
/// let worker = SnowflakeWorker::builder()
///     .worker_id_bits(5)
///     .data_center_id_bits(5)
///     .worker_id(3)
///     .data_center_id(1)
///     .build()
///     .unwrap();
///
/// let id = worker.next_id().unwrap();
/// let parts = worker.decode(id);
/// assert_eq!(parts.worker_id, 3);
/// assert_eq!(parts.data_center_id, 1);
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct WorkerBuilder<T = SystemClock, S = ThreadSleeper> {
    worker_id_bits: u32,
    data_center_id_bits: u32,
    worker_id: i64,
    data_center_id: i64,
    max_backward_ms: u64,
    backup_count: u32,
    epoch: Duration,
    time: T,
    sleeper: S,
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self {
            worker_id_bits: DEFAULT_WORKER_ID_BITS,
            data_center_id_bits: DEFAULT_DATA_CENTER_ID_BITS,
            worker_id: 0,
            data_center_id: 0,
            max_backward_ms: DEFAULT_MAX_BACKWARD_MS,
            backup_count: DEFAULT_BACKUP_COUNT,
            epoch: DEFAULT_EPOCH,
            time: SystemClock,
            sleeper: ThreadSleeper,
        }
    }
}

impl<T, S> WorkerBuilder<T, S> {
    pub fn worker_id_bits(mut self, bits: u32) -> Self {
        self.worker_id_bits = bits;
        self
    }

    pub fn data_center_id_bits(mut self, bits: u32) -> Self {
        self.data_center_id_bits = bits;
        self
    }

    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn data_center_id(mut self, data_center_id: i64) -> Self {
        self.data_center_id = data_center_id;
        self
    }

    /// Rollbacks strictly shorter than this are slept through.
    pub fn max_backward_ms(mut self, millis: u64) -> Self {
        self.max_backward_ms = millis;
        self
    }

    /// Number of backup tiers carved out of the worker id space.
    pub fn backup_count(mut self, count: u32) -> Self {
        self.backup_count = count;
        self
    }

    /// Sets the epoch, as a duration since the Unix epoch.
    ///
    /// Pick it once per identifier space and never change it afterwards.
    pub fn epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Replaces the clock.
    pub fn clock<T2>(self, time: T2) -> WorkerBuilder<T2, S> {
        WorkerBuilder {
            worker_id_bits: self.worker_id_bits,
            data_center_id_bits: self.data_center_id_bits,
            worker_id: self.worker_id,
            data_center_id: self.data_center_id,
            max_backward_ms: self.max_backward_ms,
            backup_count: self.backup_count,
            epoch: self.epoch,
            time,
            sleeper: self.sleeper,
        }
    }

    /// Replaces how small rollbacks are waited out.
    pub fn sleeper<S2>(self, sleeper: S2) -> WorkerBuilder<T, S2> {
        WorkerBuilder {
            worker_id_bits: self.worker_id_bits,
            data_center_id_bits: self.data_center_id_bits,
            worker_id: self.worker_id,
            data_center_id: self.data_center_id,
            max_backward_ms: self.max_backward_ms,
            backup_count: self.backup_count,
            epoch: self.epoch,
            time: self.time,
            sleeper,
        }
    }

    /// Validates the settings without building a worker.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`Layout::new`] or [`WorkerConfig::new`].
    pub fn build_config(&self) -> Result<WorkerConfig, ConfigError> {
        let layout = Layout::new(
            self.worker_id_bits,
            self.data_center_id_bits,
            self.backup_count,
            self.epoch,
        )?;
        WorkerConfig::new(
            layout,
            self.worker_id,
            self.data_center_id,
            self.max_backward_ms,
        )
    }

    /// Validates the settings and builds the worker.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; no worker is created in that case.
    pub fn build(self) -> Result<SnowflakeWorker<T, S>, ConfigError>
    where
        T: TimeSource,
        S: Sleeper,
    {
        let config = self.build_config()?;
        Ok(SnowflakeWorker::with_config(config, self.time, self.sleeper))
    }
}
