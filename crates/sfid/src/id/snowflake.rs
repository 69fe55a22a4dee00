use core::fmt;

/// A packed 64-bit Snowflake ID.
///
/// The value is opaque: which bits hold the timestamp, datacenter, worker and
/// sequence depends on the [`Layout`] that produced it, and only that layout
/// can take it apart again (see [`Layout::decode`]).
///
/// The sign bit is never set, so every ID converts losslessly into an `i64`
/// for stores and languages without unsigned integers.
///
/// IDs from one generator compare in issue order as long as its clock does
/// not move backwards.
///
/// [`Layout`]: crate::Layout
/// [`Layout::decode`]: crate::Layout::decode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    /// Wraps a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the value as a signed integer.
    ///
    /// Lossless for every ID a generator produces, since the top bit is always
    /// clear.
    #[must_use]
    pub const fn to_i64(self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_i64()
    }
}

/// The four fields of a decoded [`SnowflakeId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SnowflakeParts {
    /// Milliseconds since the Unix epoch (the layout's epoch added back).
    pub timestamp: u64,
    /// The datacenter the ID was issued in.
    pub data_center_id: u64,
    /// The worker id used, which is a backup worker id if the ID was issued
    /// during a clock rollback.
    pub worker_id: u64,
    /// Position within the millisecond.
    pub sequence: u64,
}
