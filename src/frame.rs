// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For iterating over the frames of an ID3v2 tag
//!
//! Each frame consists of a [`FrameHeader`] followed by its content.
//!
//! ```text
//! ┌────────────┬────────┬────────┬┄┄┄┬─────────┐
//! │ Tag Header │ Frame₀ │ Frame₁ ┆ … ┆ Padding │ ID3v2 Tag
//! └────────────┼────────┼────────┴┄┄┄┴─────────┘
//! ╭────────────╯        ╰────────────────╮
//! ├──────────────┬───────────────────────┤
//! │ Frame Header │     Frame Content     │          Frame
//! └──────────────┴───────────────────────┘
//! ```

use crate::Error;
use crate::options::CorruptIdPolicy;
use arrayvec::ArrayVec;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, FromBitStream, ToBitStream};
use tracing::{trace, warn};

/// Size of a frame header, in bytes
pub const FRAME_HEADER_SIZE: usize = 10;

/// A four byte frame identifier, such as `TIT2`
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId(pub [u8; 4]);

impl FrameId {
    /// The attached picture frame
    pub const PICTURE: Self = Self(*b"APIC");

    /// Whether every byte of the identifier is printable ASCII
    ///
    /// ```
    /// use id3_codec::frame::FrameId;
    ///
    /// assert!(FrameId(*b"TIT2").is_valid());
    /// assert!(!FrameId(*b"TI\x012").is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|b| (0x20..=0x7E).contains(b))
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.escape_ascii().fmt(f)
    }
}

/// A frame header
///
/// | Bytes | Field | Meaning |
/// |------:|------:|---------|
/// | 4     | `id`  | frame identifier |
/// | 4     | `size` | content size in bytes, big-endian (not sync-safe) |
/// | 2     | `flags` | frame flags |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use id3_codec::frame::{FrameHeader, FrameId};
///
/// let data: &[u8] = &[b'T', b'I', b'T', b'2', 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
/// let mut r = BitReader::endian(data, BigEndian);
/// assert_eq!(
///     r.parse::<FrameHeader>().unwrap(),
///     FrameHeader {
///         id: FrameId(*b"TIT2"),
///         size: 256,
///         flags: 0,
///     },
/// );
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameHeader {
    /// The frame's identifier
    pub id: FrameId,
    /// The frame's content size, in bytes
    pub size: u32,
    /// The frame's flags, carried through unchanged
    pub flags: u16,
}

impl FrameHeader {
    /// Our header as raw bytes
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0; FRAME_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.id.0);
        bytes[4..8].copy_from_slice(&self.size.to_be_bytes());
        bytes[8..].copy_from_slice(&self.flags.to_be_bytes());
        bytes
    }

    /// Total length of header plus content, in bytes
    pub fn total_len(&self) -> u64 {
        FRAME_HEADER_SIZE as u64 + u64::from(self.size)
    }
}

impl FromBitStream for FrameHeader {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        Ok(Self {
            id: FrameId(r.read_to()?),
            size: r.read_to()?,
            flags: r.read_to()?,
        })
    }
}

impl ToBitStream for FrameHeader {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_bytes(&self.id.0)?;
        w.write_from(self.size)?;
        w.write_from(self.flags)
    }
}

/// A non-fatal problem found while scanning frames
///
/// Anything read before the problem remains valid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Anomaly {
    /// Fewer bytes than a full frame header remained
    TruncatedTag {
        /// Absolute offset of the partial header
        offset: u64,
        /// Number of header bytes actually available
        available: usize,
    },
    /// A frame identifier contained non-printable bytes
    CorruptFrameId {
        /// The offending identifier
        id: FrameId,
        /// Absolute offset of the frame header
        offset: u64,
    },
    /// The stream ended before a frame's declared content did
    TruncatedFrame {
        /// The frame's identifier
        id: FrameId,
        /// Absolute offset of the frame's content
        offset: u64,
        /// Number of content bytes missing from the stream
        missing: u32,
    },
    /// A frame declared more content than the tag has room for
    OversizedFrame {
        /// The frame's identifier
        id: FrameId,
        /// The frame's declared content size
        size: u32,
        /// Bytes remaining in the tag after the frame header
        remaining: u32,
    },
    /// An attached picture frame could not be decoded
    InvalidPicture {
        /// Absolute offset of the frame's content
        offset: u64,
    },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::TruncatedTag { offset, available } => write!(
                f,
                "truncated frame header at offset {offset} ({available} bytes)"
            ),
            Self::CorruptFrameId { id, offset } => {
                write!(f, "corrupt frame id \"{id}\" at offset {offset}")
            }
            Self::TruncatedFrame {
                id,
                offset,
                missing,
            } => write!(
                f,
                "frame {id} at offset {offset} is missing {missing} bytes of content"
            ),
            Self::OversizedFrame {
                id,
                size,
                remaining,
            } => write!(
                f,
                "frame {id} size {size} exceeds remaining tag space {remaining}"
            ),
            Self::InvalidPicture { offset } => {
                write!(f, "invalid picture frame at offset {offset}")
            }
        }
    }
}

/// Why frame scanning stopped
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanEnd {
    /// Every byte of the tag body was consumed by frames
    Exhausted,
    /// Zero-filled padding was reached
    Padding,
    /// A frame header was cut short
    Truncated,
    /// A frame declared more content than the tag has room for
    Oversized,
    /// A corrupt frame identifier was rejected by policy
    RejectedId,
}

impl ScanEnd {
    /// Whether scanning stopped somewhere other than
    /// padding or the end of the tag
    pub fn is_early(&self) -> bool {
        !matches!(self, Self::Exhausted | Self::Padding)
    }
}

/// A scanner over the frames of a tag body
///
/// The scanner reads frame headers one at a time
/// from a budget of `tag_size` bytes and hands out each
/// frame's content as a bounded reader.
/// Content left unread is skipped when the next frame
/// is requested, so no content is ever buffered.
///
/// # Example
/// ```
/// use id3_codec::{frame::{FrameScanner, FrameId, ScanEnd}, options::CorruptIdPolicy};
/// use std::io::Read;
///
/// let body: &[u8] = &[
///     b'T', b'I', b'T', b'2', 0, 0, 0, 3, 0, 0, 0x00, b'H', b'i',
///     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,  // padding
/// ];
///
/// let mut scanner = FrameScanner::new(body, body.len() as u32, 10, CorruptIdPolicy::Accept);
///
/// let mut frame = scanner.next_frame().unwrap().unwrap();
/// assert_eq!(frame.header().id, FrameId(*b"TIT2"));
/// assert_eq!(frame.offset(), 20);
/// let mut content = vec![];
/// frame.read_to_end(&mut content).unwrap();
/// assert_eq!(content, b"\x00Hi");
///
/// assert!(scanner.next_frame().unwrap().is_none());
/// assert_eq!(scanner.end(), Some(ScanEnd::Padding));
/// ```
pub struct FrameScanner<R> {
    reader: R,
    // tag body bytes not yet read from the reader
    remaining: u32,
    // absolute offset of the next unread byte
    position: u64,
    // content bytes of the current frame not yet consumed
    unread: u32,
    // identifier and content offset of the current frame
    current: (FrameId, u64),
    policy: CorruptIdPolicy,
    // header bytes read but not yielded as a frame
    pending: ArrayVec<u8, FRAME_HEADER_SIZE>,
    anomalies: Vec<Anomaly>,
    end: Option<ScanEnd>,
}

impl<R: std::io::Read> FrameScanner<R> {
    /// Creates a scanner over a reader positioned at the start
    /// of the tag body, just after the tag header.
    ///
    /// `tag_size` is the size from the tag header and
    /// `offset` is the absolute position of the tag body
    /// in the file (10, for a tag at the start of a file).
    pub fn new(reader: R, tag_size: u32, offset: u64, policy: CorruptIdPolicy) -> Self {
        Self {
            reader,
            remaining: tag_size,
            position: offset,
            unread: 0,
            current: (FrameId([0; 4]), offset),
            policy,
            pending: ArrayVec::new(),
            anomalies: Vec::new(),
            end: None,
        }
    }

    /// Returns the next frame, if any
    ///
    /// Returns `Ok(None)` once scanning has stopped,
    /// whether at padding, at the end of the tag body,
    /// or at a frame-level problem recorded as an [`Anomaly`].
    ///
    /// If the stream ends before the previous frame's
    /// unread content, that is recorded as
    /// [`Anomaly::TruncatedFrame`] and scanning stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub fn next_frame(&mut self) -> Result<Option<Frame<'_, R>>, Error> {
        use std::io::Read;

        if self.end.is_some() {
            return Ok(None);
        }

        self.skip_unread()?;
        if self.end.is_some() {
            return Ok(None);
        }

        if self.remaining == 0 {
            return Ok(self.stop(ScanEnd::Exhausted));
        }

        let offset = self.position;
        let wanted = self.remaining.min(FRAME_HEADER_SIZE as u32);
        std::io::copy(
            &mut self.reader.by_ref().take(wanted.into()),
            &mut self.pending,
        )?;
        let read = self.pending.len() as u32;
        self.remaining -= read;
        self.position += u64::from(read);

        match (self.pending.first().copied(), self.pending.len()) {
            (Some(0), _) => return Ok(self.stop(ScanEnd::Padding)),
            (_, available) if available < FRAME_HEADER_SIZE => {
                self.anomaly(Anomaly::TruncatedTag { offset, available });
                return Ok(self.stop(ScanEnd::Truncated));
            }
            _ => { /* a complete header */ }
        }

        let header: FrameHeader = BitReader::endian(self.pending.as_slice(), BigEndian).parse()?;

        if !header.id.is_valid() {
            self.anomaly(Anomaly::CorruptFrameId {
                id: header.id,
                offset,
            });
            if self.policy == CorruptIdPolicy::Reject {
                return Ok(self.stop(ScanEnd::RejectedId));
            }
        }

        if header.size > self.remaining {
            self.anomaly(Anomaly::OversizedFrame {
                id: header.id,
                size: header.size,
                remaining: self.remaining,
            });
            return Ok(self.stop(ScanEnd::Oversized));
        }

        self.pending.clear();
        self.remaining -= header.size;
        self.unread = header.size;

        let content_offset = self.position;
        self.position += u64::from(header.size);
        self.current = (header.id, content_offset);

        trace!(id = %header.id, size = header.size, offset = content_offset, "frame");

        Ok(Some(Frame {
            header,
            offset: content_offset,
            scanner: self,
        }))
    }

    /// Why scanning stopped, or `None` if it hasn't yet
    pub fn end(&self) -> Option<ScanEnd> {
        self.end
    }

    /// The non-fatal problems found so far
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Consumes the scanner, returning the unscanned remainder
    /// of the tag body
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails
    /// while skipping the current frame's unread content.
    pub fn into_tail(mut self) -> Result<Tail<R>, Error> {
        self.skip_unread()?;
        Ok(Tail {
            end: self.end,
            anomalies: self.anomalies,
            pending: self.pending,
            remaining: self.remaining,
            reader: self.reader,
        })
    }

    fn skip_unread(&mut self) -> Result<(), Error> {
        use std::io::Read;

        if self.unread > 0 {
            let wanted = u64::from(self.unread);
            let skipped = std::io::copy(
                &mut self.reader.by_ref().take(wanted),
                &mut std::io::sink(),
            )?;
            // skipped never exceeds unread
            self.unread -= skipped as u32;
            if self.unread > 0 {
                self.truncate_frame();
            }
        }
        Ok(())
    }

    /// Records that the current frame's content ended early
    /// and stops scanning
    fn truncate_frame(&mut self) {
        let (id, offset) = self.current;
        self.anomaly(Anomaly::TruncatedFrame {
            id,
            offset,
            missing: self.unread,
        });
        self.unread = 0;
        self.end = Some(ScanEnd::Truncated);
    }

    fn stop<T>(&mut self, end: ScanEnd) -> Option<T> {
        self.end = Some(end);
        None
    }

    fn anomaly(&mut self, anomaly: Anomaly) {
        warn!("{anomaly}");
        self.anomalies.push(anomaly);
    }
}

/// A single frame, whose content may be read
/// up to its declared size
pub struct Frame<'s, R> {
    header: FrameHeader,
    offset: u64,
    scanner: &'s mut FrameScanner<R>,
}

impl<R: std::io::Read> Frame<'_, R> {
    /// The frame's header
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Absolute offset of the frame's content
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads all of the frame's remaining content
    ///
    /// Returns `None` if the stream ends before the frame's
    /// declared size, which is recorded as
    /// [`Anomaly::TruncatedFrame`] and stops scanning.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub fn read_content(&mut self) -> Result<Option<Vec<u8>>, Error> {
        use std::io::Read;

        // the declared size isn't trusted for preallocation
        let mut content = Vec::new();
        self.read_to_end(&mut content)?;
        match self.scanner.unread {
            0 => Ok(Some(content)),
            _ => {
                self.scanner.truncate_frame();
                Ok(None)
            }
        }
    }
}

impl<R: std::io::Read> std::io::Read for Frame<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = (self.scanner.unread as usize).min(buf.len());
        self.scanner
            .reader
            .read(&mut buf[0..size])
            .inspect(|amt_read| {
                self.scanner.unread -= *amt_read as u32;
            })
    }
}

/// Whatever remains of a tag body once scanning has stopped
pub struct Tail<R> {
    /// Why scanning stopped
    pub end: Option<ScanEnd>,
    /// The non-fatal problems found while scanning
    pub anomalies: Vec<Anomaly>,
    /// Bytes already read from the stream but not part of any frame
    pub pending: ArrayVec<u8, FRAME_HEADER_SIZE>,
    /// Tag body bytes still unread in the stream
    pub remaining: u32,
    /// The underlying stream
    pub reader: R,
}

impl<R> Tail<R> {
    /// Total length of the remainder, in bytes
    pub fn len(&self) -> u64 {
        self.pending.len() as u64 + u64::from(self.remaining)
    }

    /// Whether the tag body was completely consumed by frames
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
