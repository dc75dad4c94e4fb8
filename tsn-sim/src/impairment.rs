/// Impairments applied to frames crossing a simulated [`Link`](crate::Link). Mirrors the netem
/// knobs that matter for frame ordering and delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkImpairment {
    /// Frame loss percentage (0.0 to 100.0).
    ///
    /// Frames are dropped with this probability. A value of 5.0 means approximately 5% of
    /// frames will be lost.
    pub loss: f64,

    /// Frame duplication percentage (0.0 to 100.0).
    ///
    /// Delivered frames are sent twice with this probability.
    pub duplicate: f64,

    /// Reordering gap.
    ///
    /// When non-zero, every `gap`-th frame is delivered immediately while the others are held
    /// back until then, so it overtakes them.
    pub gap: u32,
}

impl Default for LinkImpairment {
    fn default() -> Self {
        Self { loss: 0.0, duplicate: 0.0, gap: 0 }
    }
}

impl LinkImpairment {
    /// A link that drops frames with `percent` probability.
    pub fn lossy(percent: f64) -> Self {
        Self { loss: percent, ..Default::default() }
    }

    pub fn with_duplicate(mut self, percent: f64) -> Self {
        self.duplicate = percent;
        self
    }

    pub fn with_gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }
}
