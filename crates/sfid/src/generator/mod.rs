mod builder;
mod mutex;
mod state;
mod worker;

pub use builder::*;
pub(crate) use mutex::*;
pub(crate) use state::*;
pub use worker::*;
