use std::net::Ipv4Addr;

use tsn_wire::{Frame, MacAddr};

use super::{history::SequenceHistory, stats::StreamStats};

/// Default size of a stream's duplicate-detection window.
pub const DEFAULT_HISTORY_LENGTH: u16 = 32;

/// Largest supported duplicate-detection window.
pub const MAX_HISTORY_LENGTH: u16 = 1024;

/// How the frames of a stream are recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamIdentification {
    /// Matches every frame.
    Null,
    /// Source MAC address, optionally restricted to one VLAN.
    SourceMacVlan { mac: MacAddr, vlan: Option<u16> },
    /// Destination MAC address, optionally restricted to one VLAN.
    DestMacVlan { mac: MacAddr, vlan: Option<u16> },
    /// IPv4 5-tuple.
    IpStream(IpFiveTuple),
}

/// An IPv4 5-tuple. Ports are only compared for TCP and UDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpFiveTuple {
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
}

const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;

impl StreamIdentification {
    /// Returns `true` if `frame` belongs to the stream identified by `self`.
    ///
    /// A configured VLAN must equal the frame's 802.1Q VLAN ID; untagged frames never match a
    /// VLAN-restricted stream. Without a configured VLAN, the MAC address alone decides.
    pub fn matches(&self, frame: &Frame) -> bool {
        match self {
            Self::Null => true,
            Self::SourceMacVlan { mac, vlan } => {
                frame.source() == *mac && Self::vlan_matches(*vlan, frame)
            }
            Self::DestMacVlan { mac, vlan } => {
                frame.destination() == *mac && Self::vlan_matches(*vlan, frame)
            }
            Self::IpStream(tuple) => {
                let Some(flow) = frame.ipv4_flow() else {
                    return false;
                };

                if flow.protocol.0 != tuple.protocol ||
                    flow.source != tuple.source ||
                    flow.destination != tuple.destination
                {
                    return false;
                }

                match flow.ports {
                    Some(ports) => ports == (tuple.source_port, tuple.destination_port),
                    // Truncated transport header
                    None => !matches!(tuple.protocol, IPPROTO_TCP | IPPROTO_UDP),
                }
            }
        }
    }

    #[inline]
    fn vlan_matches(vlan: Option<u16>, frame: &Frame) -> bool {
        vlan.map_or(true, |vid| frame.vlan_id() == Some(vid))
    }
}

/// Configuration of a FRER stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Unique handle of the stream on its interface.
    pub handle: u16,
    pub identification: StreamIdentification,
    /// Tag matching egress frames with sequence numbers.
    pub replication_enabled: bool,
    /// Drop duplicate ingress frames.
    pub elimination_enabled: bool,
    /// Size of the duplicate-detection window, 1 to [`MAX_HISTORY_LENGTH`].
    pub history_length: u16,
}

impl StreamConfig {
    /// Creates a stream with replication and elimination enabled and the default history length.
    pub fn new(handle: u16, identification: StreamIdentification) -> Self {
        Self {
            handle,
            identification,
            replication_enabled: true,
            elimination_enabled: true,
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }

    pub fn replication(mut self, enabled: bool) -> Self {
        self.replication_enabled = enabled;
        self
    }

    pub fn elimination(mut self, enabled: bool) -> Self {
        self.elimination_enabled = enabled;
        self
    }

    pub fn history_length(mut self, history_length: u16) -> Self {
        self.history_length = history_length;
        self
    }
}

/// A configured stream and its runtime state.
#[derive(Debug)]
pub(crate) struct Stream {
    pub(crate) config: StreamConfig,
    pub(crate) history: SequenceHistory,
    /// Sequence number for the next replicated frame.
    pub(crate) next_seq_num: u16,
    pub(crate) stats: StreamStats,
}

impl Stream {
    pub(crate) fn new(config: StreamConfig, history: SequenceHistory) -> Self {
        Self { config, history, next_seq_num: 0, stats: StreamStats::default() }
    }

    /// Hands out the next sequence number, wrapping at 65536.
    #[inline]
    pub(crate) fn take_seq_num(&mut self) -> u16 {
        let seq = self.next_seq_num;
        self.next_seq_num = seq.wrapping_add(1);
        seq
    }
}
