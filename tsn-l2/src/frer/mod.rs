//! IEEE 802.1CB Frame Replication and Elimination for Reliability (FRER).
//!
//! Each interface owns a table of [`StreamConfig`]ured streams. On egress, frames of a stream
//! with replication enabled are stamped with an [`RTag`](tsn_wire::RTag) carrying the stream's
//! next sequence number. On ingress, tagged frames of a stream with elimination enabled are
//! checked against a bounded window of recently accepted sequence numbers, and duplicates are
//! dropped.

use thiserror::Error;
use tsn_wire::FrameError;

mod engine;
pub use engine::Frer;

mod history;

mod stats;
pub use stats::{StreamSnapshot, StreamStats};

mod stream;
pub use stream::{
    IpFiveTuple, StreamConfig, StreamIdentification, DEFAULT_HISTORY_LENGTH, MAX_HISTORY_LENGTH,
};

/// The default maximum number of streams per interface.
const DEFAULT_MAX_STREAMS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("Stream {0} already exists")]
    AlreadyExists(u16),
    #[error("Stream {0} not found")]
    NotFound(u16),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("No buffer space for the redundancy tag")]
    NoBufferSpace,
}

impl From<FrameError> for FrerError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::NoBufferSpace { .. } => Self::NoBufferSpace,
            FrameError::AlreadyTagged => {
                Self::InvalidArgument("frame already carries a redundancy tag")
            }
            FrameError::Truncated(_) => Self::InvalidArgument("truncated frame"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrerOptions {
    /// The maximum number of interfaces with a FRER instance. Unbounded if `None`.
    max_interfaces: Option<usize>,
    /// The maximum number of streams per interface.
    max_streams: usize,
}

impl Default for FrerOptions {
    fn default() -> Self {
        Self { max_interfaces: None, max_streams: DEFAULT_MAX_STREAMS }
    }
}

impl FrerOptions {
    /// Sets the maximum number of interfaces that can be initialized.
    pub fn max_interfaces(mut self, max_interfaces: usize) -> Self {
        self.max_interfaces = Some(max_interfaces);
        self
    }

    /// Sets the maximum number of streams per interface.
    pub fn max_streams(mut self, max_streams: usize) -> Self {
        self.max_streams = max_streams;
        self
    }
}
