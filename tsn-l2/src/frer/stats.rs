use super::stream::StreamConfig;

/// Frame counters of a FRER stream. Updated under the instance lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames tagged for replication.
    pub replicated_frames: u64,
    /// Duplicates dropped on ingress.
    pub eliminated_frames: u64,
    /// Tagged frames accepted on ingress.
    pub passed_frames: u64,
}

/// A point-in-time copy of a stream's configuration and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub(crate) config: StreamConfig,
    pub(crate) next_seq_num: u16,
    pub(crate) stats: StreamStats,
    pub(crate) history_occupancy: usize,
    pub(crate) last_accepted_ns: Option<u64>,
}

impl StreamSnapshot {
    #[inline]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    #[inline]
    pub fn handle(&self) -> u16 {
        self.config.handle
    }

    /// The sequence number the next replicated frame will carry.
    #[inline]
    pub fn next_seq_num(&self) -> u16 {
        self.next_seq_num
    }

    #[inline]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    #[inline]
    pub fn replicated_frames(&self) -> u64 {
        self.stats.replicated_frames
    }

    #[inline]
    pub fn eliminated_frames(&self) -> u64 {
        self.stats.eliminated_frames
    }

    #[inline]
    pub fn passed_frames(&self) -> u64 {
        self.stats.passed_frames
    }

    /// Number of sequence numbers currently held by the duplicate-detection window.
    #[inline]
    pub fn history_occupancy(&self) -> usize {
        self.history_occupancy
    }

    /// When the most recent sequence number was accepted on ingress, in clock nanoseconds.
    #[inline]
    pub fn last_accepted_ns(&self) -> Option<u64> {
        self.last_accepted_ns
    }
}
