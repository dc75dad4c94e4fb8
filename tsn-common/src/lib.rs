use std::fmt;

mod clock;
pub use clock::{Clock, ManualClock, MonotonicClock};

mod registry;
pub use registry::{InstanceRegistry, RegistryFull};

/// Opaque handle of a network interface, as assigned by the networking stack that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceId(u32);

impl InterfaceId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl From<u32> for InterfaceId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if{}", self.0)
    }
}

pub mod constants {
    /// Number of traffic classes (and thus transmission gates) per port.
    pub const NUM_TRAFFIC_CLASSES: usize = 8;

    pub const NANOS_PER_MICRO: u64 = 1_000;
    pub const NANOS_PER_MILLI: u64 = 1_000_000;
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;
}
