use tsn_common::constants::NUM_TRAFFIC_CLASSES;

use super::{
    gcl::{GateControlList, GateEntry},
    TasError,
};

/// The operational schedule of an interface: a private copy of the gate control list that was
/// active when the schedule was enabled, and where in the cycle we are.
///
/// Entry deadlines are offsets from the start of the current cycle rather than from the previous
/// deadline, so late ticks don't accumulate into drift.
#[derive(Debug, Clone)]
pub(crate) struct Cycle {
    entries: Vec<GateEntry>,
    /// End of each entry as an offset from the cycle start. Capped at the cycle time, and the
    /// last entry always runs until the end of the cycle.
    ends: Vec<u64>,
    cycle_time_ns: u64,
    states: [bool; NUM_TRAFFIC_CLASSES],
    index: usize,
    cycle_start_ns: u64,
    cycle_count: u64,
}

impl Cycle {
    /// Starts a new schedule from `gcl` at `now_ns`, with entry 0 applied on top of the list's
    /// initial gate states.
    pub(crate) fn start(gcl: &GateControlList, now_ns: u64) -> Result<Self, TasError> {
        let mut entries = Vec::new();
        let mut ends = Vec::new();
        entries.try_reserve_exact(gcl.len()).map_err(|_| TasError::OutOfMemory)?;
        ends.try_reserve_exact(gcl.len()).map_err(|_| TasError::OutOfMemory)?;

        entries.extend_from_slice(&gcl.entries);

        let mut offset = 0u64;
        for entry in &entries {
            offset = offset.saturating_add(u64::from(entry.time_interval_ns));
            ends.push(offset.min(gcl.cycle_time_ns));
        }

        if let Some(last) = ends.last_mut() {
            *last = gcl.cycle_time_ns;
        }

        let mut states = gcl.gate_states;
        let first = entries.first().ok_or(TasError::InvalidArgument("empty gate control list"))?;
        first.apply(&mut states);

        Ok(Self {
            entries,
            ends,
            cycle_time_ns: gcl.cycle_time_ns,
            states,
            index: 0,
            cycle_start_ns: now_ns,
            cycle_count: 0,
        })
    }

    /// When the current entry ends, in clock nanoseconds.
    #[inline]
    pub(crate) fn deadline_ns(&self) -> u64 {
        self.cycle_start_ns + self.ends[self.index]
    }

    /// Moves to the next entry, wrapping to entry 0 and the next cycle after the last one.
    /// Returns the new entry's deadline.
    ///
    /// If `now_ns` is more than a full cycle past the new cycle start, the missed cycles are
    /// skipped instead of replayed.
    pub(crate) fn advance(&mut self, now_ns: u64) -> u64 {
        self.index += 1;

        if self.index == self.entries.len() {
            self.index = 0;
            self.cycle_start_ns += self.cycle_time_ns;
            self.cycle_count += 1;

            let behind = now_ns.saturating_sub(self.cycle_start_ns);
            if behind >= self.cycle_time_ns {
                let missed = behind / self.cycle_time_ns;
                self.cycle_start_ns += missed * self.cycle_time_ns;
                self.cycle_count += missed;
            }
        }

        self.entries[self.index].apply(&mut self.states);

        self.deadline_ns()
    }

    /// Forces every gate open.
    pub(crate) fn open_all(&mut self) {
        self.states = [true; NUM_TRAFFIC_CLASSES];
    }

    #[inline]
    pub(crate) fn states(&self) -> [bool; NUM_TRAFFIC_CLASSES] {
        self.states
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub(crate) fn cycle_start_ns(&self) -> u64 {
        self.cycle_start_ns
    }

    #[inline]
    pub(crate) fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
