// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for reading and editing the ID3v2 tags
//! placed at the start of MP3 files.
//!
//! ```text
//! ┌────────────┬─────────┬─────────┬┄┄┄┬─────────┬────────────┐
//! │ Tag Header │ Frame₀  │ Frame₁  ┆ … ┆ Padding │ Audio data │
//! └────────────┴─────────┴─────────┴┄┄┄┴─────────┴────────────┘
//!   10 bytes   ╰──────────── tag size bytes ────╯
//! ```
//!
//! Viewing a file's tag is a single pass over its frames,
//! collecting the known text fields into a [`fields::TagRecord`]
//! and decoding any embedded cover art:
//!
//! ```no_run
//! use id3_codec::{fields::Field, options::Options, view::view_tags};
//!
//! let tag = view_tags("song.mp3", &Options::default()).unwrap();
//! if let Some(title) = tag.record.get(Field::Title) {
//!     println!("title : {}", String::from_utf8_lossy(title));
//! }
//! ```
//!
//! Editing rewrites a single field while leaving every other
//! frame and all of the audio data untouched:
//!
//! ```no_run
//! use id3_codec::{fields::Field, options::Options, rewrite::edit_tag};
//!
//! edit_tag("song.mp3", Field::Title, b"New Title", &Options::default()).unwrap();
//! ```

#![warn(missing_docs)]

pub mod fields;
pub mod frame;
pub mod header;
pub mod options;
pub mod picture;
pub mod rewrite;
pub mod syncsafe;
pub mod view;

pub use rewrite::{edit_tag, rewrite_tag};
pub use view::{extract_album_art, read_tag, view_tags};

/// A fatal error when reading or editing a tag
///
/// Problems with individual frames are not errors;
/// they are reported as [`frame::Anomaly`] values
/// alongside whatever was successfully read.
#[derive(Debug)]
pub enum Error {
    /// An I/O error reading or writing a stream
    Io(std::io::Error),
    /// The stream does not start with the "ID3" identifier
    MissingId3Tag,
    /// The stream ends before a complete 10 byte tag header
    TruncatedHeader,
    /// The tag size is larger than the stream or too large to encode
    ExcessiveTagSize,
    /// A frame's new content is too large for its size field
    ExcessiveFrameSize,
    /// A string inside a frame has no NUL terminator
    MissingTerminator,
    /// A picture's MIME type string is too long
    ExcessiveMimeLength,
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<syncsafe::SyncsafeOverflow> for Error {
    fn from(_: syncsafe::SyncsafeOverflow) -> Self {
        Self::ExcessiveTagSize
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::MissingId3Tag => "missing ID3 tag".fmt(f),
            Self::TruncatedHeader => "truncated ID3 tag header".fmt(f),
            Self::ExcessiveTagSize => "invalid ID3 tag size".fmt(f),
            Self::ExcessiveFrameSize => "frame content too large".fmt(f),
            Self::MissingTerminator => "unterminated string in frame".fmt(f),
            Self::ExcessiveMimeLength => "picture MIME type too long".fmt(f),
        }
    }
}

/// Counts the bytes passing through a writer
pub(crate) struct Counter<S> {
    pub stream: S,
    pub count: u64,
}

impl<S> Counter<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, count: 0 }
    }
}

impl<W: std::io::Write> std::io::Write for Counter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf).inspect(|amt| {
            self.count += *amt as u64;
        })
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

/// Returns the total length of a seekable stream
/// without disturbing its current position
pub(crate) fn stream_len<S: std::io::Seek>(s: &mut S) -> std::io::Result<u64> {
    use std::io::SeekFrom;

    let position = s.stream_position()?;
    let len = s.seek(SeekFrom::End(0))?;
    if position != len {
        s.seek(SeekFrom::Start(position))?;
    }
    Ok(len)
}
