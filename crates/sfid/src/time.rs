use core::time::Duration;
use std::{
    sync::Arc,
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Default epoch: Wednesday, July 3, 2019 01:59:27.519 UTC
///
/// Every timestamp delta is measured from this instant. It must never change
/// for an identifier space that has already issued IDs: moving it breaks
/// ordering against older IDs and can make new IDs collide with them.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_562_119_167_519);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests. The unit is **milliseconds since the Unix epoch**; the
/// generator subtracts its own epoch when packing an ID.
///
/// Unlike a monotonic timer, a wall clock may jump backwards (NTP
/// corrections, manual changes). The generator is built to survive that.
///
/// # Example
///
/// ```
/// use sfid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The system wall clock.
///
/// Reads [`SystemTime::now`] on every call. A system clock set before 1970
/// reads as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            })
    }
}

/// Returned by a [`Sleeper`] whose wait was cut short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("sleep interrupted")]
pub struct Interrupted;

/// Blocks the calling thread while the generator waits out a small clock
/// rollback.
///
/// [`std::thread::sleep`] cannot be interrupted, but other waits can (a
/// condition variable tied to shutdown, a test double). An interrupted wait is
/// fatal for the ID being generated.
pub trait Sleeper {
    /// Blocks for `dur`.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if the wait ended early.
    fn sleep(&self, dur: Duration) -> Result<(), Interrupted>;
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, dur: Duration) -> Result<(), Interrupted> {
        (**self).sleep(dur)
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    fn sleep(&self, dur: Duration) -> Result<(), Interrupted> {
        (**self).sleep(dur)
    }
}

/// Sleeps with [`std::thread::sleep`]. Never interrupted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, dur: Duration) -> Result<(), Interrupted> {
        thread::sleep(dur);
        Ok(())
    }
}

/// Spins until `time` reads strictly later than `last`, returning that
/// reading.
///
/// This burns a core for up to a millisecond; it only runs once 4096 IDs were
/// issued within one millisecond.
#[inline]
pub(crate) fn spin_until_after<T: TimeSource + ?Sized>(time: &T, last: u64) -> u64 {
    loop {
        let now = time.current_millis();
        if now > last {
            return now;
        }
        core::hint::spin_loop();
    }
}
