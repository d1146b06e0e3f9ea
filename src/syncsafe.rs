// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling the 28-bit sync-safe integers used by tag headers
//!
//! A sync-safe integer stores 7 bits in each of 4 bytes,
//! with the high bit of every byte left clear so the value
//! can never be mistaken for an MPEG audio sync marker.
//!
//! | Byte | Bits | Meaning |
//! |-----:|-----:|---------|
//! | 0    | 1+7  | bits 27-21 |
//! | 1    | 1+7  | bits 20-14 |
//! | 2    | 1+7  | bits 13-7 |
//! | 3    | 1+7  | bits 6-0 |

use bitstream_io::{BitRead, BitWrite, FromBitStream, ToBitStream};

/// Decodes 4 sync-safe bytes to a value
///
/// The high bit of each byte is ignored rather than validated.
///
/// # Example
/// ```
/// use id3_codec::syncsafe::decode;
///
/// assert_eq!(decode([0x00, 0x00, 0x08, 0x00]), 1024);
/// assert_eq!(decode([0x7F, 0x7F, 0x7F, 0x7F]), (1 << 28) - 1);
/// ```
pub fn decode(bytes: [u8; 4]) -> u32 {
    bytes
        .into_iter()
        .fold(0, |acc, b| (acc << 7) | u32::from(b & 0x7F))
}

/// Encodes a value to 4 sync-safe bytes, most significant group first
///
/// # Errors
///
/// Returns [`SyncsafeOverflow`] if the value doesn't fit in 28 bits.
///
/// # Example
/// ```
/// use id3_codec::syncsafe::encode;
///
/// assert_eq!(encode(1024).unwrap(), [0x00, 0x00, 0x08, 0x00]);
/// assert!(encode(1 << 28).is_err());
/// ```
pub fn encode(value: u32) -> Result<[u8; 4], SyncsafeOverflow> {
    Syncsafe::try_from(value).map(|s| s.to_bytes())
}

/// A 28-bit value stored in sync-safe form
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct Syncsafe(u32);

impl Syncsafe {
    /// The largest value a sync-safe integer may hold
    pub const MAX: u32 = (1 << 28) - 1;

    /// Our current value as a u32
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Our value as 4 sync-safe bytes
    pub fn to_bytes(self) -> [u8; 4] {
        [21, 14, 7, 0].map(|shift| ((self.0 >> shift) & 0x7F) as u8)
    }
}

impl From<Syncsafe> for u32 {
    fn from(Syncsafe(u): Syncsafe) -> Self {
        u
    }
}

impl From<[u8; 4]> for Syncsafe {
    fn from(bytes: [u8; 4]) -> Self {
        Self(decode(bytes))
    }
}

impl TryFrom<u32> for Syncsafe {
    type Error = SyncsafeOverflow;

    fn try_from(u: u32) -> Result<Self, Self::Error> {
        (u <= Self::MAX).then_some(Self(u)).ok_or(SyncsafeOverflow)
    }
}

impl TryFrom<u64> for Syncsafe {
    type Error = SyncsafeOverflow;

    fn try_from(u: u64) -> Result<Self, Self::Error> {
        u32::try_from(u)
            .map_err(|_| SyncsafeOverflow)
            .and_then(Self::try_from)
    }
}

impl FromBitStream for Syncsafe {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let mut value = 0;
        for _ in 0..4 {
            r.skip(1)?;
            value = (value << 7) | r.read::<7, u32>()?;
        }
        Ok(Self(value))
    }
}

impl ToBitStream for Syncsafe {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        self.to_bytes().into_iter().try_for_each(|b| {
            w.write::<1, u8>(0)?;
            w.write::<7, u8>(b)
        })
    }
}

impl std::fmt::Display for Syncsafe {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An error that occurs when trying to build an overly large `Syncsafe`
#[derive(Copy, Clone, Debug)]
pub struct SyncsafeOverflow;

impl std::error::Error for SyncsafeOverflow {}

impl std::fmt::Display for SyncsafeOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        "value too large for sync-safe integer".fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BigEndian, BitReader, BitWriter};

    #[test]
    fn test_high_bits_ignored() {
        assert_eq!(decode([0x80, 0x80, 0x88, 0x80]), 1024);
    }

    #[test]
    fn test_bitstream_matches_bytes() {
        let bytes: &[u8] = &[0x01, 0x7F, 0x00, 0x45];
        let value: Syncsafe = BitReader::endian(bytes, BigEndian).parse().unwrap();
        assert_eq!(value.get(), decode([0x01, 0x7F, 0x00, 0x45]));

        let mut out = Vec::new();
        BitWriter::endian(&mut out, BigEndian)
            .build(&value)
            .unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_overflow() {
        assert!(Syncsafe::try_from(Syncsafe::MAX).is_ok());
        assert!(Syncsafe::try_from(Syncsafe::MAX + 1).is_err());
        assert!(Syncsafe::try_from(u64::from(u32::MAX) + 1).is_err());
    }
}
