//! Proactive session expiry detection.
//!
//! This module provides:
//! - `SessionMonitor`: the pure `Idle → Polling → {Warning → Expired}`
//!   state machine, testable without timers
//! - `spawn` / `MonitorHandle`: the tokio driver that polls the provider
//!   every 30 seconds, runs the 1-second warning countdown, and reports
//!   `MonitorEvent`s to the owning loop over a channel
//!
//! The driver fails closed: a provider error during polling is treated
//! the same as a missing session. All timers die with the handle.

pub mod driver;
pub mod machine;

pub use driver::{channel, spawn, MonitorEvent, MonitorHandle};
pub use machine::{MonitorAction, MonitorState, SessionCheck, SessionMonitor};
