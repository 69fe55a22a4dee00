use crate::time::{TimeSource, spin_until_after};

/// Sequencing state of one worker id: the timestamp it last issued at and
/// the sequence used there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Tick {
    /// `None` until the first ID is issued.
    pub(crate) last_timestamp: Option<u64>,
    pub(crate) sequence: u64,
}

impl Tick {
    pub(crate) const NEVER: Self = Self {
        last_timestamp: None,
        sequence: 0,
    };

    /// Whether the clock reads behind this tick's last timestamp, and by how
    /// much.
    pub(crate) fn behind_by(&self, now: u64) -> Option<u64> {
        self.last_timestamp
            .filter(|&last| now < last)
            .map(|last| last - now)
    }

    /// Claims the next `(timestamp, sequence)` pair at `now`.
    ///
    /// Bumps the sequence when `now` repeats the last timestamp, otherwise
    /// resets it. If the sequence wraps, spins on `time` until the clock
    /// passes the last timestamp and uses that reading instead. Returns the
    /// timestamp the pair was claimed at.
    pub(crate) fn advance<T: TimeSource + ?Sized>(
        &mut self,
        mut now: u64,
        sequence_mask: u64,
        time: &T,
    ) -> u64 {
        if self.last_timestamp == Some(now) {
            self.sequence = (self.sequence + 1) & sequence_mask;
            if self.sequence == 0 {
                now = spin_until_after(time, now);
            }
        } else {
            self.sequence = 0;
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Fixed set of backup slots, indexed by tier minus one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BackupPool {
    slots: Box<[Tick]>,
}

impl BackupPool {
    pub(crate) fn new(count: u32) -> Self {
        Self {
            slots: vec![Tick::NEVER; count as usize].into_boxed_slice(),
        }
    }

    /// Index of the last slot, in tier order, that has not issued anything
    /// later than `now`.
    ///
    /// The last eligible slot wins, not the least recently used one. Unused
    /// slots are always eligible.
    pub(crate) fn select(&self, now: u64) -> Option<usize> {
        self.slots
            .iter()
            .rposition(|slot| slot.last_timestamp.is_none_or(|last| last <= now))
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, index: usize) -> &Tick {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Tick {
        &mut self.slots[index]
    }
}

/// Everything one worker mutates, guarded by a single lock.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) primary: Tick,
    pub(crate) backups: BackupPool,
}

impl State {
    pub(crate) fn new(backup_count: u32) -> Self {
        Self {
            primary: Tick::NEVER,
            backups: BackupPool::new(backup_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTime(u64);

    impl TimeSource for FixedTime {
        fn current_millis(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn first_advance_starts_at_sequence_zero() {
        let mut tick = Tick::NEVER;
        assert_eq!(tick.advance(0, 4095, &FixedTime(0)), 0);
        assert_eq!(tick.sequence, 0);
        assert_eq!(tick.last_timestamp, Some(0));
    }

    #[test]
    fn advance_bumps_then_resets_sequence() {
        let mut tick = Tick::NEVER;
        tick.advance(7, 4095, &FixedTime(7));
        tick.advance(7, 4095, &FixedTime(7));
        assert_eq!(tick.sequence, 1);
        tick.advance(8, 4095, &FixedTime(8));
        assert_eq!(tick.sequence, 0);
        assert_eq!(tick.last_timestamp, Some(8));
    }

    #[test]
    fn advance_moves_to_next_millisecond_on_wrap() {
        let mut tick = Tick {
            last_timestamp: Some(7),
            sequence: 4095,
        };
        assert_eq!(tick.advance(7, 4095, &FixedTime(8)), 8);
        assert_eq!(tick.sequence, 0);
        assert_eq!(tick.last_timestamp, Some(8));
    }

    #[test]
    fn behind_by_reports_rollback_magnitude() {
        let tick = Tick {
            last_timestamp: Some(100),
            sequence: 3,
        };
        assert_eq!(tick.behind_by(90), Some(10));
        assert_eq!(tick.behind_by(100), None);
        assert_eq!(tick.behind_by(101), None);
        assert_eq!(Tick::NEVER.behind_by(0), None);
    }

    #[test]
    fn select_prefers_last_eligible_slot() {
        let mut pool = BackupPool::new(3);
        *pool.slot_mut(0) = Tick {
            last_timestamp: Some(50),
            sequence: 0,
        };
        *pool.slot_mut(1) = Tick {
            last_timestamp: Some(200),
            sequence: 0,
        };
        *pool.slot_mut(2) = Tick {
            last_timestamp: Some(80),
            sequence: 0,
        };
        assert_eq!(pool.select(100), Some(2));
        assert_eq!(pool.select(60), Some(0));
        assert_eq!(pool.select(10), None);
    }

    #[test]
    fn unused_slots_are_always_eligible() {
        let pool = BackupPool::new(2);
        assert_eq!(pool.select(0), Some(1));
        assert_eq!(pool.slot(0), &Tick::NEVER);
    }
}
