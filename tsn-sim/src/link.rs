use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::trace;
use tsn_wire::Frame;

use crate::LinkImpairment;

/// Counters of a simulated link.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames handed to the link.
    pub sent: u64,
    /// Frames dropped by the loss impairment.
    pub lost: u64,
    /// Extra copies created by the duplication impairment.
    pub duplicated: u64,
    /// Frames that came out the other end.
    pub delivered: u64,
}

/// A unidirectional simulated link. Frames go in with [`Link::send`] and come out with
/// [`Link::recv`], impaired according to its [`LinkImpairment`].
#[derive(Debug)]
pub struct Link {
    impairment: LinkImpairment,
    rng: StdRng,
    /// Frames held back by the reordering gap.
    held: Vec<Frame>,
    ready: VecDeque<Frame>,
    /// Frames enqueued so far, used for the reordering gap.
    enqueued: u64,
    stats: LinkStats,
}

impl Link {
    /// Creates a link whose random decisions are seeded with `seed`.
    pub fn new(impairment: LinkImpairment, seed: u64) -> Self {
        Self {
            impairment,
            rng: StdRng::seed_from_u64(seed),
            held: Vec::new(),
            ready: VecDeque::new(),
            enqueued: 0,
            stats: LinkStats::default(),
        }
    }

    /// A link without impairments.
    pub fn perfect() -> Self {
        Self::new(LinkImpairment::default(), 0)
    }

    pub fn impairment(&self) -> LinkImpairment {
        self.impairment
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Puts a frame on the link.
    pub fn send(&mut self, frame: Frame) {
        self.stats.sent += 1;

        if self.roll(self.impairment.loss) {
            self.stats.lost += 1;
            trace!(len = frame.len(), "Link dropped frame");
            return;
        }

        if self.roll(self.impairment.duplicate) {
            self.stats.duplicated += 1;
            self.enqueue(frame.clone());
        }

        self.enqueue(frame);
    }

    /// Takes the next frame that made it across, if any.
    pub fn recv(&mut self) -> Option<Frame> {
        let frame = self.ready.pop_front()?;
        self.stats.delivered += 1;
        Some(frame)
    }

    /// Releases the frames held back for reordering.
    pub fn flush(&mut self) {
        self.ready.extend(std::mem::take(&mut self.held));
    }

    /// Flushes the link and returns everything that made it across.
    pub fn drain(&mut self) -> Vec<Frame> {
        self.flush();
        std::iter::from_fn(|| self.recv()).collect()
    }

    fn enqueue(&mut self, frame: Frame) {
        self.enqueued += 1;

        let gap = u64::from(self.impairment.gap);
        if gap == 0 || self.enqueued % gap == 0 {
            self.ready.push_back(frame);
            self.flush();
        } else {
            self.held.push(frame);
        }
    }

    /// Returns `true` with a probability of `percent` %.
    fn roll(&mut self, percent: f64) -> bool {
        percent > 0.0 && self.rng.gen::<f64>() * 100.0 < percent
    }
}
