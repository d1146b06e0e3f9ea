// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling attached picture (`APIC`) frames
//!
//! | Bytes | Field | Meaning |
//! |------:|------:|---------|
//! | 1     | -     | text encoding |
//! | n+1   | `mime` | NUL-terminated MIME type |
//! | 1     | `picture_type` | kind of picture |
//! | m+1   | `description` | NUL-terminated description |
//! | rest  | `data` | image data |

use crate::Error;
use arrayvec::ArrayVec;
use std::path::{Path, PathBuf};

/// Longest MIME type string we accept, in bytes
pub const MIME_MAX: usize = 64;

/// An attached picture
///
/// # Example
/// ```
/// use id3_codec::picture::{AlbumArt, MimeType};
///
/// let content: &[u8] = b"\x00image/png\x00\x03cover\x00\x89PNG";
/// let art = AlbumArt::parse(content).unwrap();
/// assert_eq!(art.mime, MimeType::Png);
/// assert_eq!(art.picture_type, 3);
/// assert_eq!(art.description, b"cover");
/// assert_eq!(art.data, b"\x89PNG");
/// assert_eq!(art.file_name(), "album_art.png");
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AlbumArt {
    /// The picture's MIME type
    pub mime: MimeType,
    /// The picture type byte
    pub picture_type: u8,
    /// The description of the picture, as raw bytes
    pub description: Vec<u8>,
    /// The binary picture data
    pub data: Vec<u8>,
}

impl AlbumArt {
    /// Base name of extracted picture files
    pub const FILE_STEM: &'static str = "album_art";

    /// Parses an attached picture from the frame's entire content
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTerminator`] if the MIME type or
    /// description has no NUL terminator within the frame,
    /// or [`Error::ExcessiveMimeLength`] if the MIME type is too long.
    pub fn parse(content: &[u8]) -> Result<Self, Error> {
        // the encoding byte only affects the description,
        // which we carry as raw bytes
        let content = content.get(1..).ok_or(Error::MissingTerminator)?;
        let (mime, content) = split_terminated(content)?;
        let (&picture_type, content) = content.split_first().ok_or(Error::MissingTerminator)?;
        let (description, data) = split_terminated(content)?;

        Ok(Self {
            mime: MimeType::try_from(mime)?,
            picture_type,
            description: description.to_vec(),
            data: data.to_vec(),
        })
    }

    /// The standard kind of picture, if our type byte is defined
    pub fn kind(&self) -> Option<PictureType> {
        PictureType::try_from(self.picture_type).ok()
    }

    /// File extension for extracted picture data
    ///
    /// PNG images use `png`, and everything else uses `jpg`.
    pub fn extension(&self) -> &'static str {
        match self.mime {
            MimeType::Png => "png",
            MimeType::Jpeg | MimeType::Other(_) => "jpg",
        }
    }

    /// File name for extracted picture data
    pub fn file_name(&self) -> String {
        format!("{}.{}", Self::FILE_STEM, self.extension())
    }

    /// Writes our picture data to the given directory,
    /// replacing any previous picture of the same name
    ///
    /// Returns the path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, Error> {
        let path = dir.as_ref().join(self.file_name());
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }
}

/// Splits bytes at the first NUL, returning what's before
/// and after the terminator
///
/// # Errors
///
/// Returns [`Error::MissingTerminator`] if no NUL is found.
///
/// ```
/// use id3_codec::picture::split_terminated;
///
/// assert_eq!(split_terminated(b"abc\x00def").unwrap(), (b"abc".as_slice(), b"def".as_slice()));
/// assert!(split_terminated(b"abc").is_err());
/// ```
pub fn split_terminated(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    bytes
        .iter()
        .position(|b| *b == 0)
        .map(|nul| (&bytes[..nul], &bytes[nul + 1..]))
        .ok_or(Error::MissingTerminator)
}

/// A picture's MIME type
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MimeType {
    /// `image/png`
    Png,
    /// `image/jpeg`
    Jpeg,
    /// Anything else, as raw bytes
    Other(ArrayVec<u8, MIME_MAX>),
}

impl MimeType {
    /// Our MIME type as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Png => b"image/png",
            Self::Jpeg => b"image/jpeg",
            Self::Other(other) => other.as_slice(),
        }
    }
}

impl TryFrom<&[u8]> for MimeType {
    type Error = Error;

    fn try_from(mime: &[u8]) -> Result<Self, Error> {
        match mime {
            b"image/png" => Ok(Self::Png),
            b"image/jpeg" => Ok(Self::Jpeg),
            other => ArrayVec::try_from(other)
                .map(Self::Other)
                .map_err(|_| Error::ExcessiveMimeLength),
        }
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.as_bytes().escape_ascii().fmt(f)
    }
}

/// Defined variants of picture type
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PictureType {
    /// Other
    Other = 0,
    /// PNG file icon of 32x32 pixels
    Png32x32 = 1,
    /// General file icon
    GeneralFileIcon = 2,
    /// Front cover
    FrontCover = 3,
    /// Back cover
    BackCover = 4,
    /// Liner notes page
    LinerNotes = 5,
    /// Media label (e.g., CD, Vinyl or Cassette label)
    MediaLabel = 6,
    /// Lead artist, lead performer, or soloist
    LeadArtist = 7,
    /// Artist or performer
    Artist = 8,
    /// Conductor
    Conductor = 9,
    /// Band or orchestra
    Band = 10,
    /// Composer
    Composer = 11,
    /// Lyricist or text writer
    Lyricist = 12,
    /// Recording location
    RecordingLocation = 13,
    /// During recording
    DuringRecording = 14,
    /// During performance
    DuringPerformance = 15,
    /// Movie or video screen capture
    ScreenCapture = 16,
    /// A bright colored fish
    Fish = 17,
    /// Illustration
    Illustration = 18,
    /// Band or artist logotype
    BandLogo = 19,
    /// Publisher or studio logotype
    PublisherLogo = 20,
}

impl std::fmt::Display for PictureType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Other => "Other".fmt(f),
            Self::Png32x32 => "32×32 PNG Icon".fmt(f),
            Self::GeneralFileIcon => "General File Icon".fmt(f),
            Self::FrontCover => "Cover (front)".fmt(f),
            Self::BackCover => "Cover (back)".fmt(f),
            Self::LinerNotes => "Liner Notes".fmt(f),
            Self::MediaLabel => "Media Label".fmt(f),
            Self::LeadArtist => "Lead Artist".fmt(f),
            Self::Artist => "Artist".fmt(f),
            Self::Conductor => "Conductor".fmt(f),
            Self::Band => "Band or Orchestra".fmt(f),
            Self::Composer => "Composer".fmt(f),
            Self::Lyricist => "Lyricist or Text Writer".fmt(f),
            Self::RecordingLocation => "Recording Location".fmt(f),
            Self::DuringRecording => "During Recording".fmt(f),
            Self::DuringPerformance => "During Performance".fmt(f),
            Self::ScreenCapture => "Movie or Video Screen Capture".fmt(f),
            Self::Fish => "A Bright Colored Fish".fmt(f),
            Self::Illustration => "Illustration".fmt(f),
            Self::BandLogo => "Band or Artist Logotype".fmt(f),
            Self::PublisherLogo => "Publisher or Studio Logotype".fmt(f),
        }
    }
}

impl TryFrom<u8> for PictureType {
    type Error = u8;

    fn try_from(u: u8) -> Result<Self, u8> {
        match u {
            0 => Ok(Self::Other),
            1 => Ok(Self::Png32x32),
            2 => Ok(Self::GeneralFileIcon),
            3 => Ok(Self::FrontCover),
            4 => Ok(Self::BackCover),
            5 => Ok(Self::LinerNotes),
            6 => Ok(Self::MediaLabel),
            7 => Ok(Self::LeadArtist),
            8 => Ok(Self::Artist),
            9 => Ok(Self::Conductor),
            10 => Ok(Self::Band),
            11 => Ok(Self::Composer),
            12 => Ok(Self::Lyricist),
            13 => Ok(Self::RecordingLocation),
            14 => Ok(Self::DuringRecording),
            15 => Ok(Self::DuringPerformance),
            16 => Ok(Self::ScreenCapture),
            17 => Ok(Self::Fish),
            18 => Ok(Self::Illustration),
            19 => Ok(Self::BandLogo),
            20 => Ok(Self::PublisherLogo),
            u => Err(u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        fn art(mime: &[u8]) -> AlbumArt {
            let mut content = vec![0];
            content.extend_from_slice(mime);
            content.extend_from_slice(b"\x00\x03\x00data");
            AlbumArt::parse(&content).unwrap()
        }

        assert_eq!(art(b"image/png").file_name(), "album_art.png");
        assert_eq!(art(b"image/jpeg").file_name(), "album_art.jpg");
        assert_eq!(art(b"image/gif").file_name(), "album_art.jpg");
        assert_eq!(art(b"").file_name(), "album_art.jpg");
        assert_eq!(art(b"image/PNG").file_name(), "album_art.jpg");
    }

    #[test]
    fn test_missing_terminators() {
        assert!(matches!(
            AlbumArt::parse(b""),
            Err(Error::MissingTerminator)
        ));
        assert!(matches!(
            AlbumArt::parse(b"\x00image/png"),
            Err(Error::MissingTerminator)
        ));
        assert!(matches!(
            AlbumArt::parse(b"\x00image/png\x00"),
            Err(Error::MissingTerminator)
        ));
        assert!(matches!(
            AlbumArt::parse(b"\x00image/png\x00\x03no end"),
            Err(Error::MissingTerminator)
        ));
    }

    #[test]
    fn test_long_mime() {
        let mut content = vec![0];
        content.extend(std::iter::repeat_n(b'x', MIME_MAX + 1));
        content.extend_from_slice(b"\x00\x03\x00");
        assert!(matches!(
            AlbumArt::parse(&content),
            Err(Error::ExcessiveMimeLength)
        ));
    }

    #[test]
    fn test_empty_payload() {
        let art = AlbumArt::parse(b"\x01image/jpeg\x00\x04\x00").unwrap();
        assert_eq!(art.mime, MimeType::Jpeg);
        assert_eq!(art.kind(), Some(PictureType::BackCover));
        assert!(art.data.is_empty());
    }

    #[test]
    fn test_picture_types() {
        for u in 0..=20 {
            assert_eq!(PictureType::try_from(u).map(|t| t as u8), Ok(u));
        }
        assert_eq!(PictureType::try_from(21), Err(21));
    }
}
