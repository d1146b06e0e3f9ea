// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For editing a single field of a tag
//!
//! Editing streams the original file into a replacement,
//! substituting the content of one kind of frame
//! and copying everything else unchanged.
//! If the edited frames shrink, the difference is made up
//! with padding so the tag keeps its original size.
//! If they grow beyond the tag's original size
//! (padding included), the tag header's size is patched
//! to match and the audio data moves forward.

use crate::frame::{Anomaly, FrameHeader, FrameScanner, ScanEnd};
use crate::header::{TAG_HEADER_SIZE, TagHeader, patch_size};
use crate::options::Options;
use crate::{Counter, Error, fields::Field};
use bitstream_io::{BigEndian, BitWrite, BitWriter};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};

/// How a tag's size was reconciled after editing
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resize {
    /// Frames fill exactly the original tag size
    Unchanged,
    /// Frames shrank, and this many bytes of zero padding
    /// fill the rest of the original tag size
    Padded(u64),
    /// Frames grew beyond the original tag size,
    /// and the tag header was patched to the new size
    Grown,
}

/// The outcome of rewriting a tag
#[derive(Clone, Debug)]
pub struct Rewrite {
    /// The original tag's header
    pub previous: TagHeader,
    /// The rewritten tag's size, excluding its header
    pub size: u32,
    /// How many frames had their content replaced
    ///
    /// Zero means the field's frame wasn't present,
    /// and the output is an unmodified copy of the input.
    pub replaced: usize,
    /// How the tag's size was reconciled
    pub resize: Resize,
    /// Why frame scanning stopped
    pub end: ScanEnd,
    /// Frame-level problems found while scanning
    pub anomalies: Vec<Anomaly>,
    /// Bytes of audio data copied after the tag
    pub audio_len: u64,
}

/// Emits a rewritten tag body,
/// counting every byte written after the tag header
struct TagSink<W: Write> {
    writer: Counter<W>,
}

impl<W: Write> TagSink<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: Counter::new(writer),
        }
    }

    /// Copies exactly `len` bytes from the original
    fn original<R: Read>(&mut self, r: R, len: u64) -> Result<(), Error> {
        match std::io::copy(&mut r.take(len), &mut self.writer)? {
            copied if copied == len => Ok(()),
            _ => Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into())),
        }
    }

    /// Writes a frame header followed by new content
    fn substituted(&mut self, header: &FrameHeader, content: &[&[u8]]) -> Result<(), Error> {
        BitWriter::endian(&mut self.writer, BigEndian).build(header)?;
        content
            .iter()
            .try_for_each(|c| self.writer.write_all(c))
            .map_err(Error::Io)
    }

    /// Writes `len` bytes of zero padding
    fn padding(&mut self, len: u64) -> Result<(), Error> {
        self.original(std::io::repeat(0), len)
    }

    fn written(&self) -> u64 {
        self.writer.count
    }

    fn into_inner(self) -> W {
        self.writer.stream
    }
}

/// Given a source positioned at the start of its tag header,
/// writes a copy to `output` with every frame of the
/// given field holding the new value
///
/// Frames other than the field's are copied byte-for-byte,
/// as is the tag header (aside from its size, if the tag grows)
/// and all of the audio data following the tag.
/// If scanning stops early at a truncated, oversized
/// or rejected frame, the rest of the tag body
/// is carried over unchanged.
///
/// If the field's frame isn't present, the output is
/// an unmodified copy of the source and [`Rewrite::replaced`] is 0.
///
/// # Errors
///
/// Returns an error if the tag header is invalid,
/// if the rewritten tag would be too large to encode,
/// or if any I/O error occurs.
///
/// # Example
///
/// ```
/// use id3_codec::{fields::Field, options::Options, rewrite::{rewrite_tag, Resize}};
/// use std::io::Cursor;
///
/// let mut original = b"ID3\x03\x00\x00\x00\x00\x00\x1E".to_vec();
/// original.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Title");
/// original.extend([0; 14]);     // padding
/// original.extend(b"\xFF\xFB");  // audio data
///
/// let mut rewritten = Cursor::new(vec![]);
///
/// let result = rewrite_tag(
///     Cursor::new(&original),
///     &mut rewritten,
///     Field::Title,
///     b"Hi",
///     &Options::default(),
/// ).unwrap();
///
/// assert_eq!(result.replaced, 1);
/// assert_eq!(result.resize, Resize::Padded(17));
///
/// let rewritten = rewritten.into_inner();
/// assert_eq!(rewritten.len(), original.len());
/// assert_eq!(&rewritten[20..23], b"\x00Hi");
/// assert!(rewritten.ends_with(b"\xFF\xFB"));
/// ```
pub fn rewrite_tag<R, W>(
    mut source: R,
    mut output: W,
    field: Field,
    value: &[u8],
    options: &Options,
) -> Result<Rewrite, Error>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let start = source.stream_position()?;
    let output_start = output.stream_position()?;

    let (previous, mut raw_header) = TagHeader::read(source.by_ref())?;
    previous.check_len(crate::stream_len(&mut source)? - start)?;
    output.write_all(&raw_header)?;

    let target = field.frame_id();
    let new_size = u32::try_from(value.len())
        .ok()
        .and_then(|len| len.checked_add(1))
        .ok_or(Error::ExcessiveFrameSize)?;

    let mut sink = TagSink::new(output.by_ref());
    let mut scanner = FrameScanner::new(
        source.by_ref(),
        previous.size,
        start + TAG_HEADER_SIZE as u64,
        options.corrupt_id_policy(),
    );
    let mut replaced = 0;

    while let Some(mut frame) = scanner.next_frame()? {
        let header = *frame.header();
        if header.id == target {
            // keep the original text encoding byte, if there is one
            let mut encoding = [0];
            if header.size > 0 {
                frame.read_exact(&mut encoding)?;
            }
            let old_value = u64::from(header.size.saturating_sub(1));
            if std::io::copy(&mut frame, &mut std::io::sink())? != old_value {
                return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            sink.substituted(
                &FrameHeader {
                    size: new_size,
                    ..header
                },
                &[encoding.as_slice(), value],
            )?;
            replaced += 1;
        } else {
            sink.substituted(&header, &[])?;
            sink.original(&mut frame, header.size.into())?;
        }
    }

    let tail = scanner.into_tail()?;
    let end = tail.end.unwrap_or(ScanEnd::Exhausted);
    if end.is_early() {
        // whatever we couldn't parse is carried over as-is
        sink.original(tail.pending.as_slice(), tail.pending.len() as u64)?;
        sink.original(tail.reader, tail.remaining.into())?;
    }
    let anomalies = tail.anomalies;

    let written = sink.written();
    let tag_size = u64::from(previous.size);

    let (size, resize) = match written.cmp(&tag_size) {
        std::cmp::Ordering::Less => {
            sink.padding(tag_size - written)?;
            (previous.size, Resize::Padded(tag_size - written))
        }
        std::cmp::Ordering::Equal => (previous.size, Resize::Unchanged),
        std::cmp::Ordering::Greater => {
            let size = u32::try_from(written).map_err(|_| Error::ExcessiveTagSize)?;
            patch_size(&mut raw_header, size)?;
            let output = sink.into_inner();
            output.seek(SeekFrom::Start(output_start))?;
            output.write_all(&raw_header)?;
            output.seek(SeekFrom::Start(
                output_start + TAG_HEADER_SIZE as u64 + written,
            ))?;
            (size, Resize::Grown)
        }
    };

    debug!(
        old_size = previous.size,
        new_size = size,
        ?resize,
        replaced,
        "rewrote tag"
    );
    if replaced == 0 {
        warn!(frame = %target, "field not present in tag, nothing replaced");
    }

    // skip the whole original tag, padding included
    source.seek(SeekFrom::Start(start + previous.total_len()))?;
    let audio_len = std::io::copy(&mut source, &mut output)?;
    output.flush()?;

    Ok(Rewrite {
        previous,
        size,
        replaced,
        resize,
        end,
        anomalies,
        audio_len,
    })
}

/// Given a path, rewrites every frame of the given field
/// to hold the new value
///
/// The rewritten file is staged alongside the original
/// and only moved over it once completely written,
/// so an error at any point leaves the original untouched.
///
/// # Errors
///
/// Returns any error from [`rewrite_tag`], or any I/O error
/// from staging or replacing the file.
pub fn edit_tag<P: AsRef<Path>>(
    path: P,
    field: Field,
    value: &[u8],
    options: &Options,
) -> Result<Rewrite, Error> {
    use std::fs::File;
    use std::io::{BufReader, BufWriter};

    let path = path.as_ref();

    replace_file(path, |staged| {
        rewrite_tag(
            BufReader::new(File::open(path)?),
            BufWriter::new(staged),
            field,
            value,
            options,
        )
    })
}

/// Stages new file contents next to `path` with `f`,
/// then atomically moves them over `path`
///
/// If `f` fails, the staged file is removed
/// and `path` is left as it was.
fn replace_file<T>(
    path: &Path,
    f: impl FnOnce(&mut std::fs::File) -> Result<T, Error>,
) -> Result<T, Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".id3-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    let result = f(staged.as_file_mut())?;

    let staged_file = staged.as_file();
    staged_file.set_permissions(std::fs::metadata(path)?.permissions())?;
    staged_file.sync_all()?;

    staged.persist(path).map_err(|err| Error::Io(err.error))?;
    debug!(path = %path.display(), "replaced file");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A writer which fails once `limit` bytes have been written
    struct FailingWriter<W> {
        writer: W,
        limit: usize,
    }

    impl<W: Write> Write for FailingWriter<W> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.limit == 0 {
                return Err(std::io::Error::other("simulated failure"));
            }
            let size = self.limit.min(buf.len());
            self.writer.write(&buf[0..size]).inspect(|amt| {
                self.limit -= amt;
            })
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.writer.flush()
        }
    }

    impl<W: Seek> Seek for FailingWriter<W> {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.writer.seek(pos)
        }
    }

    /// A tag of the largest encodable size, generated on demand,
    /// whose last frame fills it completely
    struct LargestTag {
        prefix: Vec<u8>,
        position: u64,
    }

    impl LargestTag {
        const LEN: u64 = 10 + crate::syncsafe::Syncsafe::MAX as u64 + 4;

        fn new() -> Self {
            let mut prefix = b"ID3\x03\x00\x00\x7F\x7F\x7F\x7F".to_vec();
            prefix.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Title");
            prefix.extend(b"TXXX");
            prefix.extend((crate::syncsafe::Syncsafe::MAX - 16 - 10).to_be_bytes());
            prefix.extend([0, 0]);
            Self {
                prefix,
                position: 0,
            }
        }
    }

    impl Read for LargestTag {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let available = Self::LEN.saturating_sub(self.position);
            let size = buf.len().min(available.try_into().unwrap_or(usize::MAX));
            let start = self.position.min(self.prefix.len() as u64) as usize;
            let from_prefix = self.prefix[start..].len().min(size);
            buf[0..from_prefix].copy_from_slice(&self.prefix[start..start + from_prefix]);
            buf[from_prefix..size].fill(0);
            self.position += size as u64;
            Ok(size)
        }
    }

    impl Seek for LargestTag {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.position = match pos {
                SeekFrom::Start(p) => p,
                SeekFrom::End(p) => Self::LEN.checked_add_signed(p).unwrap(),
                SeekFrom::Current(p) => self.position.checked_add_signed(p).unwrap(),
            };
            Ok(self.position)
        }
    }

    /// A seekable writer which discards everything
    #[derive(Default)]
    struct Discard {
        position: u64,
    }

    impl Write for Discard {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.position += buf.len() as u64;
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for Discard {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            if let SeekFrom::Start(p) = pos {
                self.position = p;
            }
            Ok(self.position)
        }
    }

    #[test]
    fn test_growth_past_largest_size() {
        // keeping the size is fine
        let result = rewrite_tag(
            LargestTag::new(),
            Discard::default(),
            Field::Title,
            b"Short",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(result.size, crate::syncsafe::Syncsafe::MAX);
        assert_eq!(result.audio_len, 4);

        // but the size field can't hold any more
        assert!(matches!(
            rewrite_tag(
                LargestTag::new(),
                Discard::default(),
                Field::Title,
                b"Longer Title",
                &Options::default(),
            ),
            Err(Error::ExcessiveTagSize)
        ));
    }

    fn sample() -> Vec<u8> {
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x28".to_vec();
        data.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Title");
        data.extend(b"TPE1\x00\x00\x00\x07\x00\x00\x00Artist");
        data.extend([0; 7]);
        data.extend(b"\xFF\xFBaudio");
        data
    }

    #[test]
    fn test_equal_size() {
        let original = sample();
        let mut out = Cursor::new(vec![]);
        let result = rewrite_tag(
            Cursor::new(&original),
            &mut out,
            Field::Title,
            b"Other",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(result.resize, Resize::Padded(7));

        let out = out.into_inner();
        assert_eq!(out.len(), original.len());
        assert_eq!(&out[..20], &original[..20]);
        assert_eq!(&out[20..26], b"\x00Other");
        assert_eq!(&out[26..], &original[26..]);
    }

    #[test]
    fn test_simulated_failure() {
        let original = sample();
        let result = rewrite_tag(
            Cursor::new(&original),
            FailingWriter {
                writer: Cursor::new(vec![]),
                limit: 25,
            },
            Field::Artist,
            b"Someone Else Entirely",
            &Options::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_replace_file_failure_leaves_original() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        let original = sample();
        std::fs::write(&path, &original).unwrap();

        let result: Result<(), Error> = replace_file(&path, |staged| {
            staged.write_all(b"partial")?;
            Err(Error::Io(std::io::Error::other("simulated failure")))
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), original);

        // no staged files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_edit_bad_header_leaves_original() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        // declares a tag far longer than the file
        let original = b"ID3\x03\x00\x00\x00\x00\x7F\x7Fshort".to_vec();
        std::fs::write(&path, &original).unwrap();

        assert!(matches!(
            edit_tag(&path, Field::Title, b"New", &Options::default()),
            Err(Error::ExcessiveTagSize)
        ));
        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
