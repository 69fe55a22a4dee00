//! # sfid
//!
//! Snowflake-style 64-bit IDs: a timestamp, a datacenter id, a worker id and
//! a per-millisecond sequence packed into one integer, issued without any
//! central coordination.
//!
//! What sets this generator apart is how it handles a wall clock that jumps
//! backwards. Small jumps are slept through. Larger ones switch to a
//! *backup worker id* reserved out of the worker id space, which keeps its
//! own timestamp/sequence state, so IDs keep flowing without reusing a
//! `(timestamp, worker, sequence)` triple the primary id already issued.
//!
//! ```
//! use sfid::SnowflakeWorker;
//!
//! let worker = SnowflakeWorker::builder()
//!     .worker_id(4)
//!     .data_center_id(2)
//!     .build()
//!     .unwrap();
//!
//! let id = worker.next_id().unwrap();
//! let parts = worker.decode(id);
//! assert_eq!((parts.data_center_id, parts.worker_id), (2, 4));
//! ```
//!
//! ## Features
//!
//! - `parking-lot`: guard state with `parking_lot::Mutex` (never poisons)
//! - `cache-padded`: pad the state lock to a cache line
//! - `tracing`: emit spans and rollback events through `tracing`
//! - `serde`: derive `Serialize`/`Deserialize` for IDs and decoded parts
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::{DEFAULT_MAX_BACKWARD_MS, SnowflakeWorker, WorkerBuilder, WorkerConfig};
pub use crate::id::*;
pub use crate::time::{
    DEFAULT_EPOCH, Interrupted, Sleeper, SystemClock, ThreadSleeper, TimeSource,
};
