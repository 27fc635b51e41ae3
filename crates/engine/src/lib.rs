//! Trending token monitoring engine.
//!
//! This crate turns fetched token lists into alerts: it filters stale
//! tokens, suppresses repeats, and drives delivery on a fixed schedule.
//!
//! ## Architecture
//!
//! - `freshness` - Age filter
//! - `dedup` - TTL-bounded notified-id tracker
//! - `sink` - Delivery and formatting seams
//! - `cycle` - Single-flight fetch/filter/notify iteration
//! - `monitor` - Poll and purge timers, status

pub mod cycle;
pub mod dedup;
pub mod freshness;
pub mod monitor;
pub mod sink;

pub use cycle::{CheckCycle, CycleConfig, CycleError, CyclePhase, CycleReport};
pub use dedup::*;
pub use freshness::*;
pub use monitor::*;
pub use sink::*;
