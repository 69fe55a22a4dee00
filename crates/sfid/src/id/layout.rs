use core::time::Duration;

use crate::{ConfigError, SnowflakeId, SnowflakeParts};

/// Bits reserved for the per-millisecond sequence. Fixed.
pub const SEQUENCE_BITS: u32 = 12;

/// Default width of the worker id field.
pub const DEFAULT_WORKER_ID_BITS: u32 = 5;

/// Default width of the datacenter id field.
pub const DEFAULT_DATA_CENTER_ID_BITS: u32 = 5;

/// Default number of backup worker tiers per primary worker.
pub const DEFAULT_BACKUP_COUNT: u32 = 1;

/// Usable bits in an ID; the sign bit stays clear.
const ID_BITS: u32 = 63;

/// Bit-field layout of a [`SnowflakeId`], derived once from the configured
/// worker and datacenter widths.
///
/// With the default 5/5 split:
///
/// ```text
///  Bit Index:  63           63 62            22 21               17 16           12 11             0
///              +--------------+----------------+-------------------+---------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | data center ID (5)| worker ID (5) | sequence (12) |
///              +--------------+----------------+-------------------+---------------+---------------+
///              |<--------------------- MSB ------------- 64 bits ------------- LSB --------------->|
/// ```
///
/// The worker id field is split into `backup_count + 1` equal blocks. Primary
/// worker ids live in the first block; backup tier `i` of worker `w` is
/// `w + i * max_worker_id`. With 5 worker bits and one backup tier, primary
/// ids are `0..=15` and worker 5 falls back to id 20.
///
/// The timestamp field is whatever remains of the 63 usable bits. Once the
/// time since the epoch no longer fits it, the field wraps silently and IDs
/// stop being ordered; with the default layout that takes about 69 years.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    worker_id_bits: u32,
    data_center_id_bits: u32,
    backup_count: u32,
    max_worker_id: u64,
    max_data_center_id: u64,
    worker_id_shift: u32,
    data_center_id_shift: u32,
    timestamp_shift: u32,
    sequence_mask: u64,
    worker_id_mask: u64,
    data_center_id_mask: u64,
    timestamp_mask: u64,
    epoch_millis: u64,
}

impl Layout {
    /// Derives shifts, masks and legal ranges for the given widths.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoBackupSlots`] if `backup_count` is zero
    /// - [`ConfigError::LayoutTooWide`] if the fields leave no timestamp bit
    /// - [`ConfigError::WorkerSpaceTooSmall`] if the worker field cannot hold
    ///   a primary block of at least two ids per tier
    /// - [`ConfigError::EpochOutOfRange`] if `epoch` overflows `u64`
    ///   milliseconds
    pub fn new(
        worker_id_bits: u32,
        data_center_id_bits: u32,
        backup_count: u32,
        epoch: Duration,
    ) -> Result<Self, ConfigError> {
        if backup_count == 0 {
            return Err(ConfigError::NoBackupSlots);
        }

        let max_location_bits = ID_BITS - SEQUENCE_BITS - 1;
        if worker_id_bits.saturating_add(data_center_id_bits) > max_location_bits {
            return Err(ConfigError::LayoutTooWide {
                worker_id_bits,
                data_center_id_bits,
                max_location_bits,
            });
        }

        // A block of one id would make every backup id equal its primary.
        let block = (1_u64 << worker_id_bits) / (u64::from(backup_count) + 1);
        if block < 2 {
            return Err(ConfigError::WorkerSpaceTooSmall {
                worker_id_bits,
                backup_count,
            });
        }

        let epoch_millis =
            u64::try_from(epoch.as_millis()).map_err(|_| ConfigError::EpochOutOfRange)?;

        let worker_id_shift = SEQUENCE_BITS;
        let data_center_id_shift = worker_id_shift + worker_id_bits;
        let timestamp_shift = data_center_id_shift + data_center_id_bits;

        Ok(Self {
            worker_id_bits,
            data_center_id_bits,
            backup_count,
            max_worker_id: block - 1,
            max_data_center_id: mask(data_center_id_bits),
            worker_id_shift,
            data_center_id_shift,
            timestamp_shift,
            sequence_mask: mask(SEQUENCE_BITS),
            worker_id_mask: mask(worker_id_bits),
            data_center_id_mask: mask(data_center_id_bits),
            timestamp_mask: mask(ID_BITS - timestamp_shift),
            epoch_millis,
        })
    }

    /// Packs the four fields into an ID.
    ///
    /// `timestamp` is in milliseconds since the Unix epoch; the layout's epoch
    /// is subtracted here. Each field is masked to its width, so an oversized
    /// value never bleeds into its neighbour. A timestamp delta that no longer
    /// fits (or a timestamp before the epoch) wraps.
    #[must_use]
    pub const fn encode(
        &self,
        timestamp: u64,
        data_center_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> SnowflakeId {
        let delta = timestamp.wrapping_sub(self.epoch_millis) & self.timestamp_mask;
        let data_center_id = data_center_id & self.data_center_id_mask;
        let worker_id = worker_id & self.worker_id_mask;
        let sequence = sequence & self.sequence_mask;
        SnowflakeId::from_raw(
            (delta << self.timestamp_shift)
                | (data_center_id << self.data_center_id_shift)
                | (worker_id << self.worker_id_shift)
                | sequence,
        )
    }

    /// Splits an ID back into its fields, adding the epoch back onto the
    /// timestamp.
    #[must_use]
    pub const fn decode(&self, id: SnowflakeId) -> SnowflakeParts {
        SnowflakeParts {
            timestamp: self.timestamp_delta(id).wrapping_add(self.epoch_millis),
            data_center_id: (id.to_raw() >> self.data_center_id_shift) & self.data_center_id_mask,
            worker_id: (id.to_raw() >> self.worker_id_shift) & self.worker_id_mask,
            sequence: id.to_raw() & self.sequence_mask,
        }
    }

    /// Milliseconds between the epoch and the moment `id` was issued, as
    /// stored in the ID.
    #[must_use]
    pub const fn timestamp_delta(&self, id: SnowflakeId) -> u64 {
        (id.to_raw() >> self.timestamp_shift) & self.timestamp_mask
    }

    /// The worker id backup tier `tier` (starting at 1) issues under.
    #[must_use]
    pub const fn backup_worker_id(&self, worker_id: u64, tier: u64) -> u64 {
        worker_id + tier * self.max_worker_id
    }

    /// Largest primary worker id.
    #[must_use]
    pub const fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    /// Largest datacenter id.
    #[must_use]
    pub const fn max_data_center_id(&self) -> u64 {
        self.max_data_center_id
    }

    /// Largest sequence value; also the mask applied when incrementing.
    #[must_use]
    pub const fn sequence_mask(&self) -> u64 {
        self.sequence_mask
    }

    /// Width of the worker id field, backup blocks included.
    #[must_use]
    pub const fn worker_id_bits(&self) -> u32 {
        self.worker_id_bits
    }

    /// Width of the datacenter id field.
    #[must_use]
    pub const fn data_center_id_bits(&self) -> u32 {
        self.data_center_id_bits
    }

    /// Width of the timestamp field.
    #[must_use]
    pub const fn timestamp_bits(&self) -> u32 {
        ID_BITS - self.timestamp_shift
    }

    /// Number of backup tiers carved out of the worker id field.
    #[must_use]
    pub const fn backup_count(&self) -> u32 {
        self.backup_count
    }

    /// Bit offset of the worker id field.
    #[must_use]
    pub const fn worker_id_shift(&self) -> u32 {
        self.worker_id_shift
    }

    /// Bit offset of the datacenter id field.
    #[must_use]
    pub const fn data_center_id_shift(&self) -> u32 {
        self.data_center_id_shift
    }

    /// Bit offset of the timestamp field.
    #[must_use]
    pub const fn timestamp_shift(&self) -> u32 {
        self.timestamp_shift
    }

    /// The epoch, in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }
}

const fn mask(bits: u32) -> u64 {
    (1_u64 << bits) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    fn default_layout() -> Layout {
        Layout::new(
            DEFAULT_WORKER_ID_BITS,
            DEFAULT_DATA_CENTER_ID_BITS,
            DEFAULT_BACKUP_COUNT,
            DEFAULT_EPOCH,
        )
        .unwrap()
    }

    #[test]
    fn default_layout_shifts_and_ranges() {
        let layout = default_layout();
        assert_eq!(layout.max_worker_id(), 15);
        assert_eq!(layout.max_data_center_id(), 31);
        assert_eq!(layout.sequence_mask(), 4095);
        assert_eq!(layout.worker_id_shift(), 12);
        assert_eq!(layout.data_center_id_shift(), 17);
        assert_eq!(layout.timestamp_shift(), 22);
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.epoch_millis(), 1_562_119_167_519);
    }

    #[test]
    fn backup_ids_stay_inside_worker_field() {
        let layout = Layout::new(5, 5, 3, DEFAULT_EPOCH).unwrap();
        assert_eq!(layout.max_worker_id(), 7);
        let max = layout.max_worker_id();
        for tier in 1..=3 {
            assert!(layout.backup_worker_id(max, tier) < 1 << layout.worker_id_bits());
        }
        assert_eq!(layout.backup_worker_id(5, 1), 12);
        assert_eq!(layout.backup_worker_id(5, 3), 26);
    }

    #[test]
    fn encode_places_fields() {
        let layout = default_layout();
        let epoch = layout.epoch_millis();
        let id = layout.encode(epoch + 1, 2, 3, 4);
        assert_eq!(id.to_raw(), (1 << 22) | (2 << 17) | (3 << 12) | 4);
    }

    #[test]
    fn decode_inverts_encode() {
        let layout = default_layout();
        let epoch = layout.epoch_millis();
        let max_delta = (1 << layout.timestamp_bits()) - 1;
        let samples = [
            (epoch, 0, 0, 0),
            (epoch + 1, 31, 15, 4095),
            (epoch + 123_456_789, 7, 20, 1),
            (epoch + max_delta, 31, 31, 4095),
        ];
        for (timestamp, data_center_id, worker_id, sequence) in samples {
            let id = layout.encode(timestamp, data_center_id, worker_id, sequence);
            assert_eq!(
                layout.decode(id),
                SnowflakeParts {
                    timestamp,
                    data_center_id,
                    worker_id,
                    sequence
                }
            );
        }
    }

    #[test]
    fn ids_order_by_timestamp_first() {
        let layout = default_layout();
        let epoch = layout.epoch_millis();
        let earlier = layout.encode(epoch + 10, 31, 31, 4095);
        let later = layout.encode(epoch + 11, 0, 0, 0);
        assert!(earlier < later);
    }

    #[test]
    fn timestamp_overflow_wraps_and_keeps_sign_bit_clear() {
        let layout = default_layout();
        let epoch = layout.epoch_millis();
        let overflow = epoch + (1 << layout.timestamp_bits()) + 5;
        let id = layout.encode(overflow, 31, 31, 4095);
        assert_eq!(layout.timestamp_delta(id), 5);
        assert!(id.to_i64() >= 0);
    }

    #[test]
    fn oversized_fields_do_not_bleed() {
        let layout = default_layout();
        let epoch = layout.epoch_millis();
        let id = layout.encode(epoch, 0, 0, 4096);
        assert_eq!(id.to_raw(), 0);
        let id = layout.encode(epoch, 32, 0, 0);
        assert_eq!(id.to_raw(), 0);
    }

    #[test]
    fn widest_layout_keeps_one_timestamp_bit() {
        let layout = Layout::new(25, 25, 1, DEFAULT_EPOCH).unwrap();
        assert_eq!(layout.timestamp_bits(), 1);

        let err = Layout::new(25, 26, 1, DEFAULT_EPOCH).unwrap_err();
        assert_eq!(
            err,
            ConfigError::LayoutTooWide {
                worker_id_bits: 25,
                data_center_id_bits: 26,
                max_location_bits: 50,
            }
        );
    }

    #[test]
    fn rejects_unusable_worker_space() {
        assert_eq!(
            Layout::new(1, 5, 1, DEFAULT_EPOCH).unwrap_err(),
            ConfigError::WorkerSpaceTooSmall {
                worker_id_bits: 1,
                backup_count: 1,
            }
        );
        assert!(Layout::new(0, 5, 1, DEFAULT_EPOCH).is_err());
        assert!(Layout::new(2, 5, 1, DEFAULT_EPOCH).is_ok());
    }

    #[test]
    fn rejects_zero_backup_count() {
        assert_eq!(
            Layout::new(5, 5, 0, DEFAULT_EPOCH).unwrap_err(),
            ConfigError::NoBackupSlots
        );
    }

    #[test]
    fn zero_data_center_bits_is_allowed() {
        let layout = Layout::new(10, 0, 1, DEFAULT_EPOCH).unwrap();
        assert_eq!(layout.max_data_center_id(), 0);
        assert_eq!(layout.max_worker_id(), 511);
        assert_eq!(layout.timestamp_shift(), 22);
    }
}
