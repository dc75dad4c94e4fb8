use tsn_common::constants::NUM_TRAFFIC_CLASSES;

/// Per traffic class admission counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GateCounters {
    pub(crate) transmitted: [u64; NUM_TRAFFIC_CLASSES],
    pub(crate) dropped: [u64; NUM_TRAFFIC_CLASSES],
}

impl GateCounters {
    #[inline]
    pub(crate) fn record(&mut self, tc: usize, admitted: bool) {
        if admitted {
            self.transmitted[tc] += 1;
        } else {
            self.dropped[tc] += 1;
        }
    }
}

/// A point-in-time view of an interface's scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasStats {
    pub(crate) gate_enabled: bool,
    pub(crate) gate_states: [bool; NUM_TRAFFIC_CLASSES],
    pub(crate) current_entry_index: usize,
    pub(crate) cycle_start_time_ns: u64,
    pub(crate) cycle_count: u64,
    pub(crate) admin_entries: usize,
    pub(crate) oper_entries: usize,
    pub(crate) counters: GateCounters,
}

impl TasStats {
    #[inline]
    pub fn gate_enabled(&self) -> bool {
        self.gate_enabled
    }

    #[inline]
    pub fn gate_states(&self) -> [bool; NUM_TRAFFIC_CLASSES] {
        self.gate_states
    }

    /// Index of the operational entry currently in effect.
    #[inline]
    pub fn current_entry_index(&self) -> usize {
        self.current_entry_index
    }

    /// Start of the current cycle, in clock nanoseconds.
    #[inline]
    pub fn cycle_start_time_ns(&self) -> u64 {
        self.cycle_start_time_ns
    }

    /// Cycles started since the schedule was last enabled, not counting the first.
    #[inline]
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Number of entries in the configured (admin) gate control list.
    #[inline]
    pub fn admin_entries(&self) -> usize {
        self.admin_entries
    }

    /// Number of entries in the running (operational) gate control list.
    #[inline]
    pub fn oper_entries(&self) -> usize {
        self.oper_entries
    }

    /// Frames of traffic class `tc` admitted for transmission.
    pub fn transmitted_frames(&self, tc: usize) -> u64 {
        self.counters.transmitted.get(tc).copied().unwrap_or_default()
    }

    /// Frames of traffic class `tc` held back by a closed gate.
    pub fn dropped_frames(&self, tc: usize) -> u64 {
        self.counters.dropped.get(tc).copied().unwrap_or_default()
    }

    pub fn total_transmitted(&self) -> u64 {
        self.counters.transmitted.iter().sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.counters.dropped.iter().sum()
    }
}
