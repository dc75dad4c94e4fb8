use tracing::warn;
use tsn_common::constants::{NANOS_PER_SEC, NUM_TRAFFIC_CLASSES};

use super::TasError;

/// The maximum number of entries in a gate control list.
pub const MAX_GATE_ENTRIES: usize = 1024;

/// The longest supported cycle.
pub const MAX_CYCLE_TIME_NS: u64 = NANOS_PER_SEC;

/// What a gate entry does to the gates it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GateOperation {
    Close = 0,
    Open = 1,
}

/// One time slot of a gate control list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateEntry {
    pub operation: GateOperation,
    /// Bit `i` selects traffic class `i`.
    pub traffic_class_mask: u8,
    /// How long this entry stays in effect, in nanoseconds. Must be non-zero.
    pub time_interval_ns: u32,
}

impl GateEntry {
    /// Opens the gates in `mask` for `time_interval_ns`.
    pub const fn open(traffic_class_mask: u8, time_interval_ns: u32) -> Self {
        Self { operation: GateOperation::Open, traffic_class_mask, time_interval_ns }
    }

    /// Closes the gates in `mask` for `time_interval_ns`.
    pub const fn close(traffic_class_mask: u8, time_interval_ns: u32) -> Self {
        Self { operation: GateOperation::Close, traffic_class_mask, time_interval_ns }
    }

    /// Applies this entry to `states`. Gates outside the mask keep their state.
    pub fn apply(&self, states: &mut [bool; NUM_TRAFFIC_CLASSES]) {
        let open = self.operation == GateOperation::Open;
        for (tc, state) in states.iter_mut().enumerate() {
            if self.traffic_class_mask & (1 << tc) != 0 {
                *state = open;
            }
        }
    }
}

/// A gate control list: the schedule of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateControlList {
    pub entries: Vec<GateEntry>,
    /// Length of one cycle, 1 ns to 1 s. Should equal the sum of the entry intervals.
    pub cycle_time_ns: u64,
    pub cycle_time_extension_ns: u64,
    pub base_time_ns: u64,
    /// Gate states the schedule starts from, before entry 0 is applied.
    pub gate_states: [bool; NUM_TRAFFIC_CLASSES],
}

impl GateControlList {
    /// Creates an empty list with the given cycle time and all gates initially open.
    pub fn new(cycle_time_ns: u64) -> Self {
        Self {
            entries: Vec::new(),
            cycle_time_ns,
            cycle_time_extension_ns: 0,
            base_time_ns: 0,
            gate_states: [true; NUM_TRAFFIC_CLASSES],
        }
    }

    /// Appends an entry.
    pub fn entry(mut self, entry: GateEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn base_time(mut self, base_time_ns: u64) -> Self {
        self.base_time_ns = base_time_ns;
        self
    }

    pub fn cycle_time_extension(mut self, extension_ns: u64) -> Self {
        self.cycle_time_extension_ns = extension_ns;
        self
    }

    /// Sets the gate states the schedule starts from.
    pub fn initial_gate_states(mut self, states: [bool; NUM_TRAFFIC_CLASSES]) -> Self {
        self.gate_states = states;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry intervals.
    pub fn total_interval_ns(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.time_interval_ns)).sum()
    }

    /// Checks the list can be scheduled.
    ///
    /// A mismatch between the entry intervals and the cycle time is only logged: the cycle
    /// time is what's enforced at runtime.
    pub fn validate(&self) -> Result<(), TasError> {
        if self.entries.is_empty() || self.entries.len() > MAX_GATE_ENTRIES {
            return Err(TasError::InvalidArgument("gate control list must have 1..=1024 entries"));
        }

        if self.cycle_time_ns == 0 || self.cycle_time_ns > MAX_CYCLE_TIME_NS {
            return Err(TasError::InvalidArgument("cycle time must be in 1..=1_000_000_000 ns"));
        }

        if self.entries.iter().any(|e| e.time_interval_ns == 0) {
            return Err(TasError::InvalidArgument("gate entries must have a non-zero interval"));
        }

        let total = self.total_interval_ns();
        if total != self.cycle_time_ns {
            warn!(
                total,
                cycle_time = self.cycle_time_ns,
                "Gate entry intervals don't add up to the cycle time"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_entry_count() {
        assert!(GateControlList::new(1_000).validate().is_err());

        let mut gcl = GateControlList::new(MAX_CYCLE_TIME_NS);
        gcl.entries = vec![GateEntry::open(0xFF, 1); MAX_GATE_ENTRIES];
        assert!(gcl.validate().is_ok());

        gcl.entries.push(GateEntry::open(0xFF, 1));
        assert!(gcl.validate().is_err());
    }

    #[test]
    fn validate_cycle_time() {
        let entry = GateEntry::open(0xFF, 1_000);

        assert!(GateControlList::new(0).entry(entry).validate().is_err());
        assert!(GateControlList::new(MAX_CYCLE_TIME_NS + 1).entry(entry).validate().is_err());
        assert!(GateControlList::new(1).entry(entry).validate().is_ok());
        assert!(GateControlList::new(MAX_CYCLE_TIME_NS).entry(entry).validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let gcl = GateControlList::new(1_000)
            .entry(GateEntry::open(0x01, 1_000))
            .entry(GateEntry::close(0x01, 0));

        assert!(matches!(gcl.validate(), Err(TasError::InvalidArgument(_))));
    }

    #[test]
    fn apply_only_touches_masked_gates() {
        let mut states = [true; NUM_TRAFFIC_CLASSES];

        GateEntry::close(0b0000_0101, 1).apply(&mut states);
        assert_eq!(states, [false, true, false, true, true, true, true, true]);

        GateEntry::open(0b0000_0001, 1).apply(&mut states);
        assert_eq!(states, [true, true, false, true, true, true, true, true]);
    }
}
