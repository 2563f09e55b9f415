//! Packet framing (RFC 4880 §4.2).

use std::borrow::Cow;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Signature,
    SecretKey,
    PublicKey,
    SecretSubkey,
    UserId,
    PublicSubkey,
    Other(u8),
}

impl Tag {
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => Tag::Signature,
            5 => Tag::SecretKey,
            6 => Tag::PublicKey,
            7 => Tag::SecretSubkey,
            13 => Tag::UserId,
            14 => Tag::PublicSubkey,
            other => Tag::Other(other),
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Tag::Signature => 2,
            Tag::SecretKey => 5,
            Tag::PublicKey => 6,
            Tag::SecretSubkey => 7,
            Tag::UserId => 13,
            Tag::PublicSubkey => 14,
            Tag::Other(value) => value,
        }
    }
}

/// One framed packet. The body is borrowed unless it arrived in partial
/// body chunks that had to be joined.
#[derive(Debug, Clone)]
pub struct Packet<'a> {
    pub tag:  Tag,
    pub body: Cow<'a, [u8]>,
}

/// Iterates over the packets of a binary OpenPGP stream. Stops after the
/// first framing error.
#[derive(Debug)]
pub struct PacketReader<'a> {
    data:   &'a [u8],
    failed: bool,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self { Self { data, failed: false } }
}

impl<'a> Iterator for PacketReader<'a> {
    type Item = Result<Packet<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        let mut reader = ByteReader::new(self.data);
        match read_packet(&mut reader) {
            Ok(packet) => {
                self.data = reader.rest();
                Some(Ok(packet))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn read_packet<'a>(r: &mut ByteReader<'a>) -> Result<Packet<'a>> {
    let ctb = r.u8()?;
    if ctb & 0x80 == 0 {
        return Err(Error::Malformed("packet header bit not set"));
    }

    if ctb & 0x40 != 0 {
        let tag = Tag::from_u8(ctb & 0x3F);
        let body = read_new_format_body(r)?;
        return Ok(Packet { tag, body });
    }

    let tag = Tag::from_u8((ctb >> 2) & 0x0F);
    let len = match ctb & 0x03 {
        0 => usize::from(r.u8()?),
        1 => usize::from(r.u16()?),
        2 => r.u32()? as usize,
        _ => r.remaining(),
    };
    Ok(Packet {
        tag,
        body: Cow::Borrowed(r.take(len)?),
    })
}

fn read_new_format_body<'a>(r: &mut ByteReader<'a>) -> Result<Cow<'a, [u8]>> {
    let mut partial: Option<Vec<u8>> = None;
    loop {
        let first = r.u8()?;
        let len = match first {
            0..=191 => usize::from(first),
            192..=223 => (usize::from(first - 192) << 8) + usize::from(r.u8()?) + 192,
            255 => r.u32()? as usize,
            _ => {
                let chunk = r.take(1usize << (first & 0x1F))?;
                partial.get_or_insert_with(Vec::new).extend_from_slice(chunk);
                continue;
            }
        };
        let last = r.take(len)?;
        return Ok(match partial {
            Some(mut joined) => {
                joined.extend_from_slice(last);
                Cow::Owned(joined)
            }
            None => Cow::Borrowed(last),
        });
    }
}

/// Big-endian cursor over a packet body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self { Self { data } }

    pub(crate) fn remaining(&self) -> usize { self.data.len() }

    pub(crate) fn is_empty(&self) -> bool { self.data.is_empty() }

    pub(crate) fn rest(&self) -> &'a [u8] { self.data }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.data.len() {
            return Err(Error::Truncated);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> { Ok(self.array::<1>()?[0]) }

    pub(crate) fn u16(&mut self) -> Result<u16> { Ok(u16::from_be_bytes(self.array()?)) }

    pub(crate) fn u32(&mut self) -> Result<u32> { Ok(u32::from_be_bytes(self.array()?)) }

    /// Multiprecision integer: a two-octet bit count, then the magnitude.
    pub(crate) fn mpi(&mut self) -> Result<&'a [u8]> {
        let bits = usize::from(self.u16()?);
        self.take(bits.div_ceil(8))
    }

    /// Subpacket length (RFC 4880 §5.2.3.1).
    pub(crate) fn subpacket_len(&mut self) -> Result<usize> {
        let first = self.u8()?;
        Ok(match first {
            0..=191 => usize::from(first),
            192..=254 => (usize::from(first - 192) << 8) + usize::from(self.u8()?) + 192,
            255 => self.u32()? as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(data: &[u8]) -> Vec<(Tag, Vec<u8>)> {
        PacketReader::new(data)
            .map(|p| p.map(|p| (p.tag, p.body.into_owned())))
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn old_format_lengths() {
        // tag 13, one-octet length
        let one = [0xB4, 0x02, b'h', b'i'];
        assert_eq!(collect(&one), vec![(Tag::UserId, b"hi".to_vec())]);

        // tag 2, two-octet length
        let two = [0x89, 0x00, 0x01, 0xAA];
        assert_eq!(collect(&two), vec![(Tag::Signature, vec![0xAA])]);

        // tag 6, four-octet length
        let four = [0x9A, 0x00, 0x00, 0x00, 0x01, 0x04];
        assert_eq!(collect(&four), vec![(Tag::PublicKey, vec![0x04])]);

        // tag 2, indeterminate length runs to the end
        let rest = [0x8B, 1, 2, 3];
        assert_eq!(collect(&rest), vec![(Tag::Signature, vec![1, 2, 3])]);
    }

    #[test]
    fn new_format_lengths() {
        let one = [0xC2, 0x01, 0x07];
        assert_eq!(collect(&one), vec![(Tag::Signature, vec![0x07])]);

        let mut two = vec![0xCE, 0xC0, 0x08];
        two.extend(std::iter::repeat_n(0x5A, 200));
        let packets = collect(&two);
        assert_eq!(packets[0].0, Tag::PublicSubkey);
        assert_eq!(packets[0].1.len(), 200);

        let five = [0xC2, 0xFF, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02];
        assert_eq!(collect(&five), vec![(Tag::Signature, vec![0x01, 0x02])]);
    }

    #[test]
    fn partial_body_chunks_are_joined() {
        // 2-byte partial chunk, then a final 1-byte length
        let data = [0xC2, 0xE1, 0x01, 0x02, 0x01, 0x03];
        assert_eq!(collect(&data), vec![(Tag::Signature, vec![1, 2, 3])]);
    }

    #[test]
    fn multiple_packets_in_sequence() {
        let data = [0xB4, 0x01, b'a', 0xC2, 0x01, 0x07];
        let tags: Vec<_> = collect(&data).into_iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec![Tag::UserId, Tag::Signature]);
    }

    #[test]
    fn truncated_body_is_an_error_and_stops() {
        let data = [0xB4, 0x05, b'a'];
        let mut reader = PacketReader::new(&data);
        assert!(matches!(reader.next(), Some(Err(Error::Truncated))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_header_bit_is_malformed() {
        let mut reader = PacketReader::new(b"not a key");
        assert!(matches!(reader.next(), Some(Err(Error::Malformed(_)))));
    }

    #[test]
    fn mpi_reads_bit_length() {
        let data = [0x00, 0x09, 0x01, 0xFF, 0xEE];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.mpi().unwrap(), &[0x01, 0xFF]);
        assert_eq!(r.rest(), &[0xEE]);
    }

    #[test]
    fn subpacket_lengths() {
        assert_eq!(ByteReader::new(&[0x05]).subpacket_len().unwrap(), 5);
        assert_eq!(ByteReader::new(&[0xC0, 0x00]).subpacket_len().unwrap(), 192);
        assert_eq!(ByteReader::new(&[0xFF, 0, 0, 1, 0]).subpacket_len().unwrap(), 256);
    }
}
