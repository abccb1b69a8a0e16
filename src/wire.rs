//! Wire-level framing: tags, wire types and a bounds-checked reader.

use std::ops::RangeInclusive;

use crate::error::DecodeError;
use crate::varint::{VarintError, decode_var, encode_var, encoded_len};

/// Largest field number a tag can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Field numbers set aside by the wire format for its own use.
pub const RESERVED_FIELD_NUMBERS: RangeInclusive<u32> = 19000..=19999;

/// Protocol buffer wire types.
#[derive(Debug, PartialEq, Clone, Eq, Copy, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Varint (0)
    Varint = 0,

    /// 64-bit (1)
    Fixed64 = 1,

    /// Length-delimited (2)
    LengthDelimited = 2,

    /// 32-bit (5)
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = u8;

    /// Groups (3, 4) are deprecated and not supported; they are rejected like 6 and 7.
    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(other),
        }
    }
}

/// Value read off the wire before any schema is applied to it.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum RawValue<'a> {
    /// Varint (wire type = 0).
    Varint(u64),

    /// 64-bit value (wire type = 1).
    Fixed64(u64),

    /// Length-delimited value (wire type = 2).
    LengthDelimited(&'a [u8]),

    /// 32-bit value (wire type = 5).
    Fixed32(u32),
}

/// Append a tag for `number` / `wire_type`.
pub fn put_tag(buf: &mut Vec<u8>, number: u32, wire_type: WireType) {
    encode_var(((number as u64) << 3) | wire_type as u64, buf);
}

/// Append a length prefix followed by `bytes`.
pub fn put_length_delimited(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.reserve(encoded_len(bytes.len() as u64) + bytes.len());
    encode_var(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

pub fn put_fixed32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_fixed64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Cursor over an encoded message.
///
/// Offsets in errors are absolute: a reader created for a nested message with
/// [`Reader::nested`] keeps counting from the start of the outermost buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, base: 0 }
    }

    /// Reader over `data`, which starts at absolute offset `base`.
    pub fn nested(data: &'a [u8], base: usize) -> Self {
        Self { data, base }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    fn advance(&mut self, n: usize) -> &'a [u8] {
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        self.base += n;
        head
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let offset = self.base;
        let before = self.data.len();
        let value = decode_var(&mut self.data).map_err(|e| match e {
            VarintError::Truncated => DecodeError::TruncatedVarint { offset },
            VarintError::Overflow => DecodeError::VarintOverflow { offset },
        })?;
        self.base += before - self.data.len();
        Ok(value)
    }

    /// Read a tag and split it into field number and wire type.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let offset = self.base;
        let tag = self.read_varint()?;
        let number = tag >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(DecodeError::InvalidFieldNumber { offset, number });
        }
        let wire_type = WireType::try_from((tag & 0x07) as u8)
            .map_err(|wire_type| DecodeError::UnknownWireType { offset, wire_type })?;
        Ok((number as u32, wire_type))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        if self.data.len() < N {
            return Err(DecodeError::TruncatedFixed {
                offset: self.base,
                needed: N,
                remaining: self.data.len(),
            });
        }
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.advance(N));
        Ok(arr)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        self.read_array::<8>().map(u64::from_le_bytes)
    }

    /// Read a length-delimited payload. Returns the payload and its absolute offset.
    pub fn read_length_delimited(&mut self) -> Result<(&'a [u8], usize), DecodeError> {
        let offset = self.base;
        let len = self.read_varint()?;
        if len > self.data.len() as u64 {
            return Err(DecodeError::LengthOverrun {
                offset,
                declared: len,
                remaining: self.data.len(),
            });
        }
        let start = self.base;
        Ok((self.advance(len as usize), start))
    }

    /// Read one value of the given wire type.
    pub fn read_value(&mut self, wire_type: WireType) -> Result<RawValue<'a>, DecodeError> {
        Ok(match wire_type {
            WireType::Varint => RawValue::Varint(self.read_varint()?),
            WireType::Fixed64 => RawValue::Fixed64(self.read_fixed64()?),
            WireType::LengthDelimited => RawValue::LengthDelimited(self.read_length_delimited()?.0),
            WireType::Fixed32 => RawValue::Fixed32(self.read_fixed32()?),
        })
    }

    /// Skip one value of the given wire type and return the bytes it occupied.
    pub fn skip_value(&mut self, wire_type: WireType) -> Result<&'a [u8], DecodeError> {
        let start = self.data;
        let before = self.base;
        self.read_value(wire_type)?;
        Ok(&start[..self.base - before])
    }
}
