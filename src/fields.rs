// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The text fields we know how to view and edit
//!
//! | Field | Frame |
//! |-------|-------|
//! | Title | `TIT2` |
//! | Artist | `TPE1` |
//! | Album | `TALB` |
//! | Track | `TRCK` |
//! | Year | `TYER` |
//! | Genre | `TCON` |
//! | Comment | `COMM` |
//!
//! Text frame content begins with a single encoding byte,
//! followed by the value itself.  Values are kept as raw bytes
//! with no character set conversion.

use crate::frame::FrameId;

/// A known text field
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    /// Song title
    Title,
    /// Lead artist
    Artist,
    /// Album name
    Album,
    /// Track number or position in the album
    Track,
    /// Year of release
    Year,
    /// Genre
    Genre,
    /// Comment
    Comment,
}

impl Field {
    /// All fields, in display order
    pub const ALL: [Self; 7] = [
        Self::Title,
        Self::Artist,
        Self::Album,
        Self::Track,
        Self::Year,
        Self::Genre,
        Self::Comment,
    ];

    /// The frame holding this field
    pub fn frame_id(&self) -> FrameId {
        FrameId(match self {
            Self::Title => *b"TIT2",
            Self::Artist => *b"TPE1",
            Self::Album => *b"TALB",
            Self::Track => *b"TRCK",
            Self::Year => *b"TYER",
            Self::Genre => *b"TCON",
            Self::Comment => *b"COMM",
        })
    }

    /// The field held by the given frame, if any
    ///
    /// ```
    /// use id3_codec::{fields::Field, frame::FrameId};
    ///
    /// assert_eq!(Field::from_frame_id(FrameId(*b"TALB")), Some(Field::Album));
    /// assert_eq!(Field::from_frame_id(FrameId(*b"APIC")), None);
    /// ```
    pub fn from_frame_id(id: FrameId) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.frame_id() == id)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Title => "Title".fmt(f),
            Self::Artist => "Artist".fmt(f),
            Self::Album => "Album".fmt(f),
            Self::Track => "Track".fmt(f),
            Self::Year => "Year".fmt(f),
            Self::Genre => "Genre".fmt(f),
            Self::Comment => "Comment".fmt(f),
        }
    }
}

impl std::str::FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.to_string().eq_ignore_ascii_case(s))
            .ok_or(UnknownField)
    }
}

/// An error that occurs when parsing an unknown field name
#[derive(Copy, Clone, Debug)]
pub struct UnknownField;

impl std::error::Error for UnknownField {}

impl std::fmt::Display for UnknownField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        "unknown tag field".fmt(f)
    }
}

/// The known text fields of a tag
///
/// Frames we don't recognize are not retained,
/// so a record cannot be used to rebuild a tag.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagRecord {
    values: [Option<Vec<u8>>; 7],
}

impl TagRecord {
    /// Returns field's value, if present
    pub fn get(&self, field: Field) -> Option<&[u8]> {
        self.values[field.index()].as_deref()
    }

    /// Replaces field's value
    pub fn set<V: Into<Vec<u8>>>(&mut self, field: Field, value: V) {
        self.values[field.index()] = Some(value.into());
    }

    /// Removes field's value
    pub fn remove(&mut self, field: Field) {
        self.values[field.index()] = None;
    }

    /// Iterates over the fields which are present
    pub fn iter(&self) -> impl Iterator<Item = (Field, &[u8])> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    /// Whether no fields are present
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Sets a field from a text frame's content, if the frame is one we know
    ///
    /// The leading encoding byte is dropped.
    /// Returns `true` if the frame was recognized.
    ///
    /// ```
    /// use id3_codec::{fields::{Field, TagRecord}, frame::FrameId};
    ///
    /// let mut record = TagRecord::default();
    /// assert!(record.absorb(FrameId(*b"TIT2"), &[0x00, b'H', b'i']));
    /// assert_eq!(record.get(Field::Title), Some(b"Hi".as_slice()));
    /// ```
    pub fn absorb(&mut self, id: FrameId, content: &[u8]) -> bool {
        match Field::from_frame_id(id) {
            Some(field) => {
                self.set(field, content.get(1..).unwrap_or_default());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!("title".parse::<Field>().unwrap(), Field::Title);
        assert_eq!("COMMENT".parse::<Field>().unwrap(), Field::Comment);
        assert!("composer".parse::<Field>().is_err());
    }

    #[test]
    fn test_frame_ids() {
        for field in Field::ALL {
            assert_eq!(Field::from_frame_id(field.frame_id()), Some(field));
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut record = TagRecord::default();
        assert!(record.is_empty());
        record.absorb(FrameId(*b"TPE1"), b"\x00First");
        record.absorb(FrameId(*b"TPE1"), b"\x00Second");
        assert_eq!(record.get(Field::Artist), Some(b"Second".as_slice()));
        assert_eq!(record.iter().count(), 1);
    }

    #[test]
    fn test_unknown_and_empty() {
        let mut record = TagRecord::default();
        assert!(!record.absorb(FrameId(*b"TXXX"), b"\x00ignored"));
        assert!(record.is_empty());

        record.absorb(FrameId(*b"TYER"), b"");
        assert_eq!(record.get(Field::Year), Some(b"".as_slice()));
        record.remove(Field::Year);
        assert!(record.is_empty());
    }
}
