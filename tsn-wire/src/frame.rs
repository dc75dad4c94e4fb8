use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};
use pnet::{
    packet::{
        ethernet::EtherTypes,
        ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
        ipv4::Ipv4Packet,
        tcp::TcpPacket,
        udp::UdpPacket,
        Packet,
    },
    util::MacAddr,
};
use thiserror::Error;

use crate::rtag::{RTag, TAG_LEN};

/// Destination + source address + EtherType.
pub const ETH_HEADER_LEN: usize = 14;
/// Length of an IEEE 802.1Q tag (TPID + TCI).
pub const VLAN_TAG_LEN: usize = 4;
/// Largest 802.1Q tagged frame without FCS, plus room for one R-TAG.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1518 + TAG_LEN;

const MAC_LEN: usize = 6;
/// Offset of the first EtherType / TPID field.
const ETHERTYPE_OFFSET: usize = 2 * MAC_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame too short: {0} bytes")]
    Truncated(usize),
    #[error("Frame already carries a redundancy tag")]
    AlreadyTagged,
    #[error("No room for {needed} more bytes ({len}/{max_len})")]
    NoBufferSpace { len: usize, needed: usize, max_len: usize },
}

/// An Ethernet frame (without FCS) as handed over by the device driver.
///
/// Besides the bytes, a frame carries the largest size the driver can transmit (`max_len`) and
/// an optional traffic class assigned by the stack. When no traffic class was assigned, the
/// 802.1Q priority code point is used, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    buf: BytesMut,
    max_len: usize,
    priority: Option<u8>,
}

impl Frame {
    /// Wraps raw frame bytes. Fails if they can't hold an Ethernet header.
    pub fn new(buf: impl Into<BytesMut>) -> Result<Self, FrameError> {
        let buf = buf.into();
        if buf.len() < ETH_HEADER_LEN {
            return Err(FrameError::Truncated(buf.len()));
        }

        Ok(Self { buf, max_len: DEFAULT_MAX_FRAME_LEN, priority: None })
    }

    /// Starts building a frame from `src` to `dst`.
    pub fn builder(dst: MacAddr, src: MacAddr) -> FrameBuilder {
        FrameBuilder { dst, src, vlan: None, ethertype: EtherTypes::Ipv4.0 }
    }

    /// Sets the largest size this frame may grow to.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Assigns a traffic class (0-7) to the frame.
    pub fn with_priority(mut self, traffic_class: u8) -> Self {
        self.priority = Some(traffic_class & 0x07);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always `false`: a frame holds at least an Ethernet header.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// The traffic class of this frame.
    pub fn priority(&self) -> u8 {
        self.priority.or_else(|| self.vlan_tci().map(|tci| (tci >> 13) as u8)).unwrap_or(0)
    }

    #[inline]
    pub fn destination(&self) -> MacAddr {
        self.mac_at(0)
    }

    #[inline]
    pub fn source(&self) -> MacAddr {
        self.mac_at(MAC_LEN)
    }

    /// The 802.1Q tag control information, if the frame is VLAN tagged.
    pub fn vlan_tci(&self) -> Option<u16> {
        if self.u16_at(ETHERTYPE_OFFSET)? != EtherTypes::Vlan.0 {
            return None;
        }

        self.u16_at(ETHERTYPE_OFFSET + 2)
    }

    /// The 802.1Q VLAN identifier, if the frame is VLAN tagged.
    #[inline]
    pub fn vlan_id(&self) -> Option<u16> {
        self.vlan_tci().map(|tci| tci & 0x0FFF)
    }

    /// Offset of the redundancy tag: right after the source address, or after the 802.1Q tag
    /// when there is one.
    #[inline]
    pub fn rtag_offset(&self) -> usize {
        if self.vlan_tci().is_some() {
            ETHERTYPE_OFFSET + VLAN_TAG_LEN
        } else {
            ETHERTYPE_OFFSET
        }
    }

    /// The redundancy tag of this frame, if present.
    pub fn rtag(&self) -> Option<RTag> {
        self.buf.get(self.rtag_offset()..).and_then(RTag::parse)
    }

    /// Inserts `tag` at [`Self::rtag_offset`].
    ///
    /// On error the frame is left untouched.
    pub fn insert_rtag(&mut self, tag: RTag) -> Result<(), FrameError> {
        if self.rtag().is_some() {
            return Err(FrameError::AlreadyTagged);
        }

        if self.buf.len() + TAG_LEN > self.max_len {
            return Err(FrameError::NoBufferSpace {
                len: self.buf.len(),
                needed: TAG_LEN,
                max_len: self.max_len,
            });
        }

        let offset = self.rtag_offset();
        let mut tagged = BytesMut::with_capacity(self.buf.len() + TAG_LEN);
        tagged.put_slice(&self.buf[..offset]);
        tag.write(&mut tagged);
        tagged.put_slice(&self.buf[offset..]);

        self.buf = tagged;
        tracing::trace!(seq = tag.seq(), offset, "inserted R-TAG");

        Ok(())
    }

    /// Removes the redundancy tag and returns it. No-op if the frame isn't tagged.
    pub fn strip_rtag(&mut self) -> Option<RTag> {
        let tag = self.rtag()?;
        let offset = self.rtag_offset();

        let mut tail = self.buf.split_off(offset);
        let _ = tail.split_to(TAG_LEN);
        self.buf.unsplit(tail);

        Some(tag)
    }

    /// The EtherType of the payload, after any VLAN and redundancy tag.
    pub fn ethertype(&self) -> Option<u16> {
        self.u16_at(self.payload_offset() - 2)
    }

    /// The layer 2 payload, after all headers and tags.
    pub fn payload(&self) -> &[u8] {
        self.buf.get(self.payload_offset()..).unwrap_or_default()
    }

    /// The IPv4 flow this frame belongs to, if it carries an IPv4 packet.
    pub fn ipv4_flow(&self) -> Option<Ipv4Flow> {
        if self.ethertype()? != EtherTypes::Ipv4.0 {
            return None;
        }

        let ip = Ipv4Packet::new(self.payload())?;
        if ip.get_version() != 4 {
            return None;
        }

        let protocol = ip.get_next_level_protocol();
        let ports = if protocol == IpNextHeaderProtocols::Tcp {
            TcpPacket::new(ip.payload()).map(|tcp| (tcp.get_source(), tcp.get_destination()))
        } else if protocol == IpNextHeaderProtocols::Udp {
            UdpPacket::new(ip.payload()).map(|udp| (udp.get_source(), udp.get_destination()))
        } else {
            None
        };

        Some(Ipv4Flow {
            protocol,
            source: ip.get_source(),
            destination: ip.get_destination(),
            ports,
        })
    }

    fn payload_offset(&self) -> usize {
        let mut offset = self.rtag_offset();
        if self.rtag().is_some() {
            offset += TAG_LEN;
        }
        offset + 2
    }

    fn mac_at(&self, offset: usize) -> MacAddr {
        let b = &self.buf[offset..offset + MAC_LEN];
        MacAddr::new(b[0], b[1], b[2], b[3], b[4], b[5])
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.buf.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }
}

/// Addressing of an IPv4 packet, as used for IP stream identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Flow {
    pub protocol: IpNextHeaderProtocol,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Source and destination port, for TCP and UDP.
    pub ports: Option<(u16, u16)>,
}

/// Builds untagged or 802.1Q tagged Ethernet frames.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    dst: MacAddr,
    src: MacAddr,
    vlan: Option<u16>,
    ethertype: u16,
}

impl FrameBuilder {
    /// Adds an 802.1Q tag with the given VLAN ID and priority code point.
    pub fn vlan(mut self, vid: u16, pcp: u8) -> Self {
        self.vlan = Some((u16::from(pcp & 0x07) << 13) | (vid & 0x0FFF));
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn build(self, payload: &[u8]) -> Frame {
        let mut buf = BytesMut::with_capacity(ETH_HEADER_LEN + VLAN_TAG_LEN + payload.len());

        for mac in [self.dst, self.src] {
            buf.put_slice(&[mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]);
        }

        if let Some(tci) = self.vlan {
            buf.put_u16(EtherTypes::Vlan.0);
            buf.put_u16(tci);
        }

        buf.put_u16(self.ethertype);
        buf.put_slice(payload);

        Frame { buf, max_len: DEFAULT_MAX_FRAME_LEN, priority: None }
    }
}
