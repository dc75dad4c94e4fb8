#![doc(issue_tracker_base_url = "https://github.com/chainbound/tsn-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use tsn_common::{constants, Clock, InterfaceId, ManualClock, MonotonicClock};
pub use tsn_l2::*;
pub use tsn_wire::{rtag, Frame, FrameBuilder, FrameError, MacAddr, RTag};

mod port;
pub use port::{Driver, Port, PortError, PortStats};
