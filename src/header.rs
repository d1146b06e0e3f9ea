// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling the 10-byte ID3v2 tag header

use crate::Error;
use crate::syncsafe::{Syncsafe, SyncsafeOverflow};
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, FromBitStream, ToBitStream};

/// The identifier every tag starts with
pub const ID3_TAG: &[u8; 3] = b"ID3";

/// Size of the tag header, in bytes
pub const TAG_HEADER_SIZE: usize = 10;

/// An ID3v2 tag header
///
/// | Bytes | Field | Meaning |
/// |------:|------:|---------|
/// | 3     | -     | `"ID3"` |
/// | 1     | `version_major` | major version |
/// | 1     | `version_minor` | revision |
/// | 1     | `flags` | tag flags |
/// | 4     | `size` | sync-safe tag size, excluding this header |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use id3_codec::header::TagHeader;
///
/// let data: &[u8] = &[b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00];
/// let mut r = BitReader::endian(data, BigEndian);
/// assert_eq!(
///     r.parse::<TagHeader>().unwrap(),
///     TagHeader {
///         version_major: 3,
///         version_minor: 0,
///         flags: 0,
///         size: 1024,
///     },
/// );
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TagHeader {
    /// Major version (3 for ID3v2.3)
    pub version_major: u8,
    /// Revision number
    pub version_minor: u8,
    /// Tag-level flags, carried through unchanged
    pub flags: u8,
    /// Size of the tag body (frames and padding), in bytes
    pub size: u32,
}

impl TagHeader {
    /// Reads a tag header from the start of the given stream
    ///
    /// Returns the parsed header along with its raw bytes,
    /// so that a rewritten tag can reproduce the original
    /// header exactly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedHeader`] if fewer than 10 bytes
    /// are available, or [`Error::MissingId3Tag`] if the stream
    /// does not start with `"ID3"`.
    pub fn read<R: std::io::Read>(mut r: R) -> Result<(Self, [u8; TAG_HEADER_SIZE]), Error> {
        let mut raw = [0; TAG_HEADER_SIZE];
        r.read_exact(&mut raw).map_err(|err| match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::TruncatedHeader,
            _ => Error::Io(err),
        })?;

        BitReader::endian(raw.as_slice(), BigEndian)
            .parse()
            .map(|header| (header, raw))
    }

    /// Ensures the tag fits within a stream of the given length
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExcessiveTagSize`] if the header and tag body
    /// together are longer than the stream.
    pub fn check_len(&self, stream_len: u64) -> Result<(), Error> {
        match stream_len.checked_sub(TAG_HEADER_SIZE as u64) {
            Some(available) if u64::from(self.size) <= available => Ok(()),
            _ => Err(Error::ExcessiveTagSize),
        }
    }

    /// Total length of header plus tag body, in bytes
    pub fn total_len(&self) -> u64 {
        TAG_HEADER_SIZE as u64 + u64::from(self.size)
    }
}

/// Replaces the size field of a raw tag header in place,
/// leaving every other byte as it was
///
/// # Errors
///
/// Returns [`SyncsafeOverflow`] if the size needs more than 28 bits.
pub fn patch_size(raw: &mut [u8; TAG_HEADER_SIZE], size: u32) -> Result<(), SyncsafeOverflow> {
    raw[6..].copy_from_slice(&Syncsafe::try_from(size)?.to_bytes());
    Ok(())
}

/// Returns true if the stream starts with the `"ID3"` identifier
///
/// Streams shorter than 3 bytes simply return false.
///
/// # Errors
///
/// Passes along any I/O error other than end of stream.
pub fn has_id3_signature<R: std::io::Read>(r: R) -> std::io::Result<bool> {
    use std::io::Read;

    let mut tag = Vec::with_capacity(ID3_TAG.len());
    r.take(ID3_TAG.len() as u64).read_to_end(&mut tag)?;
    Ok(tag.as_slice() == ID3_TAG)
}

impl FromBitStream for TagHeader {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        if &r.read_to::<[u8; 3]>()? != ID3_TAG {
            return Err(Error::MissingId3Tag);
        }

        Ok(Self {
            version_major: r.read_to()?,
            version_minor: r.read_to()?,
            flags: r.read_to()?,
            size: r.parse::<Syncsafe>()?.get(),
        })
    }
}

impl ToBitStream for TagHeader {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_bytes(ID3_TAG)?;
        w.write_from(self.version_major)?;
        w.write_from(self.version_minor)?;
        w.write_from(self.flags)?;
        w.build(&Syncsafe::try_from(self.size)?)?;
        Ok(())
    }
}
