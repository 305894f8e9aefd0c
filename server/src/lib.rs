#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session hosting for Lane Defence.
//!
//! The [`Registry`] owns every live session. Each session runs as its own
//! task that owns a [`Driver`]: the world plus the scheduler, combat and
//! economy systems. Requests reach the task over a bounded channel and are
//! served one at a time, interleaved with the session's own timers, so a
//! session's state is only ever touched by a single task. Subscribers
//! receive [`Notification`] values over a broadcast channel.

pub mod config;
mod driver;
pub mod notification;
pub mod registry;
mod session;

pub use config::{ConfigError, ServerConfig};
pub use driver::Driver;
pub use notification::Notification;
pub use registry::{Registry, RegistryError};
