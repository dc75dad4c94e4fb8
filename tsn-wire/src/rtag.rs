use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// EtherType announcing an IEEE 802.1CB redundancy tag.
pub const ETHERTYPE: u16 = 0x893F;

/// Length of the redundancy tag on the wire.
pub const TAG_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("Invalid R-TAG EtherType: {0:#06x}")]
    EtherType(u16),
}

/// The redundancy tag (R-TAG) stamped on replicated frames.
///
/// Wire layout, all big-endian:
///
/// ```text
/// +----------------+-----------------+----------------+
/// | 0x893F (2)     | sequence (2)    | reserved (2)   |
/// +----------------+-----------------+----------------+
/// ```
///
/// Reserved bytes are written as zero and ignored when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RTag {
    seq: u16,
}

impl RTag {
    #[inline]
    pub const fn new(seq: u16) -> Self {
        Self { seq }
    }

    /// The sequence number carried by this tag.
    #[inline]
    pub const fn seq(&self) -> u16 {
        self.seq
    }

    /// Parses a tag from the start of `src`. Returns `None` if `src` is too short or doesn't
    /// start with the R-TAG EtherType.
    pub fn parse(src: &[u8]) -> Option<Self> {
        if src.len() < TAG_LEN {
            return None;
        }

        if u16::from_be_bytes([src[0], src[1]]) != ETHERTYPE {
            return None;
        }

        Some(Self { seq: u16::from_be_bytes([src[2], src[3]]) })
    }

    /// Writes the tag to `dst`.
    #[inline]
    pub fn write<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16(ETHERTYPE);
        dst.put_u16(self.seq);
        dst.put_u16(0);
    }
}

/// R-TAG codec, for reading and writing bare tags on a byte stream.
#[derive(Debug, Default)]
pub struct Codec;

impl Codec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for Codec {
    type Item = RTag;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }

        // EtherType check (without advancing the cursor)
        let ethertype = u16::from_be_bytes([src[0], src[1]]);
        if ethertype != ETHERTYPE {
            return Err(Error::EtherType(ethertype));
        }

        if src.len() < TAG_LEN {
            return Ok(None);
        }

        src.advance(2);
        let seq = src.get_u16();
        // Reserved
        src.advance(2);

        Ok(Some(RTag::new(seq)))
    }
}

impl Encoder<RTag> for Codec {
    type Error = Error;

    fn encode(&mut self, item: RTag, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(TAG_LEN);
        item.write(dst);

        Ok(())
    }
}
