use std::collections::TryReserveError;

/// Number of `u64` words needed for one presence bit per 16-bit sequence number.
const SEEN_WORDS: usize = (u16::MAX as usize + 1) / 64;

/// One accepted sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HistoryEntry {
    pub(crate) seq: u16,
    /// When the sequence number was accepted, in clock nanoseconds.
    pub(crate) timestamp_ns: u64,
}

/// Fixed-capacity window of the most recently accepted sequence numbers of a stream.
///
/// Entries are kept in a ring buffer in acceptance order; once the window is full, accepting a
/// new sequence number evicts the oldest one. A presence bitmap over the whole 16-bit sequence
/// space mirrors the ring so lookups don't scan the window.
///
/// Detection is exact for sequence numbers still in the window. A sequence number that has been
/// evicted (because `window` newer ones were accepted since) is forgotten and will be accepted
/// again.
#[derive(Debug)]
pub(crate) struct SequenceHistory {
    entries: Vec<HistoryEntry>,
    /// Slot to overwrite next once `entries` is full.
    head: usize,
    window: usize,
    seen: Vec<u64>,
}

impl SequenceHistory {
    /// Allocates an empty window of `window` entries.
    pub(crate) fn with_window(window: usize) -> Result<Self, TryReserveError> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(window)?;

        let mut seen = Vec::new();
        seen.try_reserve_exact(SEEN_WORDS)?;
        seen.resize(SEEN_WORDS, 0);

        Ok(Self { entries, head: 0, window, seen })
    }

    #[inline]
    pub(crate) fn contains(&self, seq: u16) -> bool {
        let (word, bit) = Self::slot(seq);
        self.seen[word] & bit != 0
    }

    /// Records `seq` as accepted at `timestamp_ns`, evicting the oldest entry if the window is
    /// full. Returns the evicted entry.
    ///
    /// Inserting a sequence number that is already in the window is a no-op.
    pub(crate) fn insert(&mut self, seq: u16, timestamp_ns: u64) -> Option<HistoryEntry> {
        if self.contains(seq) {
            return None;
        }

        let entry = HistoryEntry { seq, timestamp_ns };
        self.set_seen(seq, true);

        if self.entries.len() < self.window {
            self.entries.push(entry);
            return None;
        }

        let evicted = std::mem::replace(&mut self.entries[self.head], entry);
        self.head = (self.head + 1) % self.window;
        self.set_seen(evicted.seq, false);

        Some(evicted)
    }

    /// Number of sequence numbers currently remembered.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn window(&self) -> usize {
        self.window
    }

    /// The most recently accepted entry.
    pub(crate) fn latest(&self) -> Option<HistoryEntry> {
        if self.entries.len() < self.window {
            self.entries.last().copied()
        } else {
            let idx = (self.head + self.window - 1) % self.window;
            self.entries.get(idx).copied()
        }
    }

    #[inline]
    fn slot(seq: u16) -> (usize, u64) {
        (seq as usize / 64, 1 << (seq % 64))
    }

    #[inline]
    fn set_seen(&mut self, seq: u16, seen: bool) {
        let (word, bit) = Self::slot(seq);
        if seen {
            self.seen[word] |= bit;
        } else {
            self.seen[word] &= !bit;
        }
    }
}
