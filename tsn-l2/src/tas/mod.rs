//! IEEE 802.1Qbv Time-Aware Shaper (TAS).
//!
//! Each interface holds an administrative [`GateControlList`] (what's configured) and an
//! operational one (what's running). Enabling the scheduler promotes the administrative list and
//! starts walking it entry by entry, opening and closing the transmission gates of the 8 traffic
//! classes. Egress code asks [`Tas::is_gate_open`] (or [`Tas::admit`]) before transmitting.
//!
//! Gates fail open: an unknown traffic class, an uninitialized interface or a disabled scheduler
//! never holds a frame back.

use thiserror::Error;

mod cycle;

mod driver;

mod gcl;
pub use gcl::{GateControlList, GateEntry, GateOperation, MAX_CYCLE_TIME_NS, MAX_GATE_ENTRIES};

mod scheduler;
pub use scheduler::Tas;

mod stats;
pub use stats::TasStats;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TasError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("No Tokio runtime to drive the gate schedule")]
    NoRuntime,
}

#[derive(Debug, Clone)]
pub struct TasOptions {
    /// The maximum number of interfaces with a TAS instance. Unbounded if `None`.
    max_interfaces: Option<usize>,
    /// Whether enabled schedules are advanced by a background task. If `false`, the host has to
    /// call [`Tas::tick`] at each deadline.
    autonomous: bool,
}

impl Default for TasOptions {
    fn default() -> Self {
        Self { max_interfaces: None, autonomous: true }
    }
}

impl TasOptions {
    /// Sets the maximum number of interfaces that can be initialized.
    pub fn max_interfaces(mut self, max_interfaces: usize) -> Self {
        self.max_interfaces = Some(max_interfaces);
        self
    }

    /// Sets whether [`Tas::enable`] spawns a Tokio task to advance the schedule. Default: `true`.
    pub fn autonomous(mut self, autonomous: bool) -> Self {
        self.autonomous = autonomous;
        self
    }
}
