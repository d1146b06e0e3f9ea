// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For reading a tag's fields and attached picture

use crate::Error;
use crate::fields::{Field, TagRecord};
use crate::frame::{Anomaly, FrameId, FrameScanner, ScanEnd};
use crate::header::{TAG_HEADER_SIZE, TagHeader};
use crate::options::Options;
use crate::picture::AlbumArt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Everything read from a tag in a single pass
#[derive(Debug, Clone)]
pub struct TagView {
    /// The tag's header
    pub header: TagHeader,
    /// The known text fields
    pub record: TagRecord,
    /// The last attached picture, if any
    pub album_art: Option<AlbumArt>,
    /// Where the last attached picture was written, if anywhere
    pub album_art_path: Option<PathBuf>,
    /// Why frame scanning stopped
    pub end: ScanEnd,
    /// Frame-level problems found while scanning
    pub anomalies: Vec<Anomaly>,
}

impl TagView {
    /// Whether every frame was read without problems
    pub fn is_complete(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Reads a tag from the given reader,
/// which should be positioned at the start of the tag header
///
/// Frame-level problems stop the scan early but
/// whatever was read up to that point is kept.
/// This includes a stream which ends before the tag does.
/// If `options` has an artwork directory, each attached picture
/// is written there as it is found.
///
/// Because this may perform many small reads,
/// using a buffered reader may greatly improve performance
/// when reading from a raw `File`.
///
/// # Errors
///
/// Returns an error if the tag header is missing or truncated,
/// if an attached picture can't be written,
/// or if an I/O error occurs.
///
/// # Example
///
/// ```
/// use id3_codec::{fields::Field, options::Options, read_tag};
///
/// let mut tag = b"ID3\x03\x00\x00\x00\x00\x00\x1E".to_vec();
/// tag.extend(b"TIT2\x00\x00\x00\x03\x00\x00\x00Hi");
/// tag.extend([0; 17]);  // padding
///
/// let view = read_tag(tag.as_slice(), &Options::default()).unwrap();
/// assert_eq!(view.record.get(Field::Title), Some(b"Hi".as_slice()));
/// assert!(view.is_complete());
/// ```
pub fn read_tag<R: std::io::Read>(mut reader: R, options: &Options) -> Result<TagView, Error> {
    let (header, _) = TagHeader::read(reader.by_ref())?;
    read_frames(reader, header, options)
}

fn read_frames<R: std::io::Read>(
    reader: R,
    header: TagHeader,
    options: &Options,
) -> Result<TagView, Error> {
    let mut scanner = FrameScanner::new(
        reader,
        header.size,
        TAG_HEADER_SIZE as u64,
        options.corrupt_id_policy(),
    );
    let mut record = TagRecord::default();
    let mut album_art = None;
    let mut album_art_path = None;
    let mut bad_pictures = Vec::new();

    while let Some(mut frame) = scanner.next_frame()? {
        let id = frame.header().id;
        if id == FrameId::PICTURE {
            let Some(content) = frame.read_content()? else {
                break;
            };
            match AlbumArt::parse(&content) {
                Ok(art) => {
                    if let Some(dir) = options.artwork_output() {
                        album_art_path = Some(art.save_in(dir)?);
                    }
                    album_art = Some(art);
                }
                Err(err) => {
                    warn!("{err} at offset {}", frame.offset());
                    bad_pictures.push(Anomaly::InvalidPicture {
                        offset: frame.offset(),
                    });
                }
            }
        } else if Field::from_frame_id(id).is_some() {
            let Some(content) = frame.read_content()? else {
                break;
            };
            record.absorb(id, &content);
            debug!(%id, "read field");
        }
    }

    let tail = scanner.into_tail()?;
    let mut anomalies = tail.anomalies;
    anomalies.extend(bad_pictures);

    Ok(TagView {
        header,
        record,
        album_art,
        album_art_path,
        end: tail.end.unwrap_or(ScanEnd::Exhausted),
        anomalies,
    })
}

/// Reads a tag from the file at the given path
///
/// This is like [`read_tag`], but also ensures the tag's
/// declared size fits within the file.
///
/// # Errors
///
/// Returns an error if the file can't be opened,
/// if the tag header is missing, truncated or declares
/// a size larger than the file, or if an I/O error occurs.
pub fn view_tags<P: AsRef<Path>>(path: P, options: &Options) -> Result<TagView, Error> {
    let file = File::open(path.as_ref())?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let (header, _) = TagHeader::read(reader.by_ref())?;
    header.check_len(len)?;
    debug!(
        path = %path.as_ref().display(),
        version = header.version_major,
        size = header.size,
        "reading tag"
    );
    read_frames(reader, header, options)
}

/// Writes the attached picture of the file at the given path
/// into the given directory
///
/// Returns the path of the written picture,
/// or `None` if the tag has no usable attached picture.
///
/// # Errors
///
/// Returns any error from reading the tag or writing the picture.
pub fn extract_album_art<P, D>(path: P, dir: D, options: &Options) -> Result<Option<PathBuf>, Error>
where
    P: AsRef<Path>,
    D: AsRef<Path>,
{
    view_tags(path, &options.clone().artwork_dir(dir.as_ref()))
        .map(|view| view.album_art_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(frames: &[(&[u8; 4], &[u8])], padding: usize) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, content) in frames {
            body.extend_from_slice(*id);
            body.extend((content.len() as u32).to_be_bytes());
            body.extend([0, 0]);
            body.extend_from_slice(content);
        }
        body.extend(std::iter::repeat_n(0, padding));

        let mut tag = b"ID3\x03\x00\x00".to_vec();
        tag.extend(crate::syncsafe::encode(body.len() as u32).unwrap());
        tag.extend(body);
        tag
    }

    #[test]
    fn test_all_fields() {
        let data = tag(
            &[
                (b"TIT2", b"\x00Title".as_slice()),
                (b"TPE1", b"\x00Artist".as_slice()),
                (b"TALB", b"\x00Album".as_slice()),
                (b"TRCK", b"\x003".as_slice()),
                (b"TYER", b"\x001999".as_slice()),
                (b"TCON", b"\x00Rock".as_slice()),
                (b"COMM", b"\x00Comment".as_slice()),
                (b"TXXX", b"\x00ignored".as_slice()),
            ],
            30,
        );
        let view = read_tag(data.as_slice(), &Options::default()).unwrap();
        assert_eq!(view.record.get(Field::Title), Some(b"Title".as_slice()));
        assert_eq!(view.record.get(Field::Year), Some(b"1999".as_slice()));
        assert_eq!(view.record.get(Field::Comment), Some(b"Comment".as_slice()));
        assert_eq!(view.record.iter().count(), 7);
        assert_eq!(view.end, ScanEnd::Padding);
        assert!(view.album_art.is_none());
    }

    #[test]
    fn test_last_picture_wins() {
        let data = tag(
            &[
                (b"APIC", b"\x00image/png\x00\x03\x00first".as_slice()),
                (b"APIC", b"\x00image/jpeg\x00\x04\x00second".as_slice()),
            ],
            0,
        );
        let view = read_tag(data.as_slice(), &Options::default()).unwrap();
        let art = view.album_art.unwrap();
        assert_eq!(art.data, b"second");
        assert_eq!(art.extension(), "jpg");
        assert_eq!(view.end, ScanEnd::Exhausted);
    }

    #[test]
    fn test_bad_picture_is_anomaly() {
        let data = tag(
            &[
                (b"APIC", b"\x00image/png".as_slice()),
                (b"TIT2", b"\x00After".as_slice()),
            ],
            0,
        );
        let view = read_tag(data.as_slice(), &Options::default()).unwrap();
        assert!(view.album_art.is_none());
        assert_eq!(view.record.get(Field::Title), Some(b"After".as_slice()));
        assert_eq!(view.anomalies, vec![Anomaly::InvalidPicture { offset: 20 }]);
    }

    #[test]
    fn test_fields_kept_after_oversized() {
        let mut data = tag(
            &[
                (b"TIT2", b"\x00Kept".as_slice()),
                (b"TALB", b"\x00Also".as_slice()),
            ],
            0,
        );
        // make the second frame claim far more than the tag holds
        data[10 + 15 + 4..10 + 15 + 8].copy_from_slice(&500u32.to_be_bytes());

        let view = read_tag(data.as_slice(), &Options::default()).unwrap();
        assert_eq!(view.record.get(Field::Title), Some(b"Kept".as_slice()));
        assert_eq!(view.record.get(Field::Album), None);
        assert_eq!(view.end, ScanEnd::Oversized);
        assert!(!view.is_complete());
    }
}
