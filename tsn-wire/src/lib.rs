#![doc(issue_tracker_base_url = "https://github.com/chainbound/tsn-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod frame;
pub mod rtag;

pub use frame::{Frame, FrameBuilder, FrameError, Ipv4Flow};
pub use rtag::RTag;

pub use pnet::util::MacAddr;
