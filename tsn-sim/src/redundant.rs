use tracing::debug;
use tsn_wire::Frame;

use crate::{Link, LinkImpairment, LinkStats};

/// Disjoint paths between a talker and a listener. Every frame sent is carried by every path,
/// each impaired independently, and the listener sees the merged output.
#[derive(Debug)]
pub struct RedundantLink {
    paths: Vec<Link>,
}

impl RedundantLink {
    /// Creates one path per impairment. Path `i` is seeded with `seed + i`.
    pub fn new(impairments: impl IntoIterator<Item = LinkImpairment>, seed: u64) -> Self {
        let paths = impairments
            .into_iter()
            .enumerate()
            .map(|(i, impairment)| Link::new(impairment, seed.wrapping_add(i as u64)))
            .collect::<Vec<_>>();

        debug!(paths = paths.len(), seed, "Created redundant link");

        Self { paths }
    }

    /// Sends a copy of `frame` over every path.
    pub fn send(&mut self, frame: &Frame) {
        for path in &mut self.paths {
            path.send(frame.clone());
        }
    }

    /// Takes everything the paths have delivered so far, interleaving the paths one frame at a
    /// time.
    pub fn recv(&mut self) -> Vec<Frame> {
        let mut merged = Vec::new();

        loop {
            let before = merged.len();
            merged.extend(self.paths.iter_mut().filter_map(Link::recv));

            if merged.len() == before {
                return merged;
            }
        }
    }

    /// Flushes every path and returns everything that made it across.
    pub fn drain(&mut self) -> Vec<Frame> {
        self.paths.iter_mut().for_each(Link::flush);
        self.recv()
    }

    pub fn paths(&self) -> &[Link] {
        &self.paths
    }

    pub fn path_stats(&self) -> Vec<LinkStats> {
        self.paths.iter().map(Link::stats).collect()
    }
}
