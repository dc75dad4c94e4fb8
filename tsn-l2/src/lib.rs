#![doc(issue_tracker_base_url = "https://github.com/chainbound/tsn-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Layer 2 TSN engines: IEEE 802.1CB frame replication and elimination ([`frer`]) and the
//! IEEE 802.1Qbv time-aware shaper ([`tas`]).
//!
//! The two engines share no state. Both keep one instance per interface, addressed by
//! [`InterfaceId`](tsn_common::InterfaceId).

pub mod frer;
pub use frer::{Frer, FrerError, FrerOptions, StreamConfig, StreamIdentification};

pub mod tas;
pub use tas::{GateControlList, GateEntry, GateOperation, Tas, TasError, TasOptions};
