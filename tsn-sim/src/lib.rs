#![doc(issue_tracker_base_url = "https://github.com/chainbound/tsn-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! In-process link simulation for exercising FRER over lossy, redundant paths.
//!
//! A [`Link`] applies `netem`-style [`LinkImpairment`]s (loss, duplication, reordering) to the
//! frames that cross it. A [`RedundantLink`] sends every frame over several independently
//! impaired links and merges what comes out, the way a replicated stream reaches its listener
//! over disjoint paths. All randomness is seeded, so runs are reproducible.

mod impairment;
pub use impairment::LinkImpairment;

mod link;
pub use link::{Link, LinkStats};

mod redundant;
pub use redundant::RedundantLink;
