//! Wire format primitives
//!
//! Every chain format serializes the same way: a u16 codec version, a u32
//! type id, then big-endian fields. [`Packer`] appends values to a growable
//! buffer; [`Unpacker`] is the strict reader used for trial decoding, so it
//! refuses short reads, bounds list allocations, and can insist that the
//! whole input was consumed.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use crate::core::ids::{Address, Id, NodeId};

/// Codec version carried in the first two bytes of every transaction
pub const CODEC_VERSION: u16 = 0;

/// Serialization and deserialization errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Input too short: needed {needed} more bytes, {remaining} remaining")]
    ShortInput { needed: usize, remaining: usize },
    #[error("Trailing bytes after transaction: {remaining} remaining")]
    TrailingBytes { remaining: usize },
    #[error("Unknown type id {0:#06x}")]
    UnknownTypeId(u32),
    #[error("Unsupported codec version {0}")]
    UnsupportedVersion(u16),
    #[error("List of {count} entries cannot fit in {remaining} remaining bytes")]
    ListTooLong { count: u32, remaining: usize },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// =============================================================================
// Packer
// =============================================================================

/// Append-only big-endian writer
#[derive(Debug, Default)]
pub struct Packer {
    buf: BytesMut,
}

impl Packer {
    pub fn new() -> Self {
        Packer {
            buf: BytesMut::with_capacity(256),
        }
    }

    pub fn pack_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn pack_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    pub fn pack_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn pack_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    /// Append raw bytes with no length prefix
    pub fn pack_bytes(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Append a u32 length prefix followed by the bytes
    pub fn pack_byte_list(&mut self, data: &[u8]) {
        self.pack_u32(data.len() as u32);
        self.pack_bytes(data);
    }

    /// Append a u16 length prefix followed by the UTF-8 bytes
    ///
    /// Strings longer than the prefix can describe are refused before
    /// anything is written, never silently truncated.
    pub fn pack_str(&mut self, s: &str) -> Result<(), CodecError> {
        let len = u16::try_from(s.len()).map_err(|_| {
            CodecError::InvalidData(format!(
                "string of {} bytes exceeds the u16 length prefix",
                s.len()
            ))
        })?;
        self.pack_u16(len);
        self.pack_bytes(s.as_bytes());
        Ok(())
    }

    pub fn pack_id(&mut self, id: &Id) {
        self.pack_bytes(id.as_bytes());
    }

    pub fn pack_address(&mut self, addr: &Address) {
        self.pack_bytes(addr.as_bytes());
    }

    pub fn pack_node_id(&mut self, node: &NodeId) {
        self.pack_bytes(node.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn take(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

// =============================================================================
// Unpacker
// =============================================================================

/// Strict big-endian reader over a byte slice
///
/// Reads never run past the end of the input, and list headers are checked
/// against the remaining length before any allocation happens.
#[derive(Debug)]
pub struct Unpacker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Unpacker { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Error unless every input byte has been consumed
    pub fn expect_done(&self) -> Result<(), CodecError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                remaining: self.remaining(),
            })
        }
    }

    fn advance(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::ShortInput {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn unpack_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.advance(1)?[0])
    }

    pub fn unpack_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.advance(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn unpack_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.advance(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn unpack_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.advance(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn unpack_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.advance(n)
    }

    pub fn unpack_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.advance(N)?);
        Ok(out)
    }

    /// Read a u32 length prefix followed by that many bytes
    pub fn unpack_byte_list(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.unpack_u32()? as usize;
        self.advance(len)
    }

    /// Read a u16 length prefix followed by that many UTF-8 bytes
    pub fn unpack_str(&mut self) -> Result<String, CodecError> {
        let len = self.unpack_u16()? as usize;
        let raw = self.advance(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| CodecError::InvalidData(e.to_string()))
    }

    pub fn unpack_id(&mut self) -> Result<Id, CodecError> {
        Ok(Id::from_bytes(self.unpack_array::<32>()?))
    }

    pub fn unpack_address(&mut self) -> Result<Address, CodecError> {
        Ok(Address::from_bytes(self.unpack_array::<20>()?))
    }

    pub fn unpack_node_id(&mut self) -> Result<NodeId, CodecError> {
        Ok(NodeId::from_bytes(self.unpack_array::<20>()?))
    }

    /// Read a u32 list count and check it could fit in the remaining input
    ///
    /// `min_item_len` is the smallest possible encoding of one entry. A count
    /// that cannot fit is rejected before any Vec::with_capacity call, so a
    /// corrupt header cannot trigger a huge allocation.
    pub fn unpack_list_len(&mut self, min_item_len: usize) -> Result<usize, CodecError> {
        let count = self.unpack_u32()?;
        let min = min_item_len.max(1);
        if (count as usize).saturating_mul(min) > self.remaining() {
            return Err(CodecError::ListTooLong {
                count,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }
}
