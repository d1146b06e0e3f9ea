// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Options for viewing and editing tags

use std::path::{Path, PathBuf};

/// What to do with a frame whose identifier isn't printable ASCII
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CorruptIdPolicy {
    /// Report the frame and keep processing it as usual
    #[default]
    Accept,
    /// Report the frame and stop scanning
    Reject,
}

/// Tag processing options
///
/// # Example
///
/// ```
/// use id3_codec::options::{CorruptIdPolicy, Options};
///
/// let options = Options::default()
///     .reject_corrupt_ids()
///     .artwork_dir("/tmp");
///
/// assert_eq!(options.corrupt_id_policy(), CorruptIdPolicy::Reject);
/// assert!(options.artwork_output().is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Options {
    corrupt_ids: CorruptIdPolicy,
    artwork_dir: Option<PathBuf>,
}

impl Options {
    /// Assigns new corrupt frame identifier policy
    pub fn corrupt_ids(self, corrupt_ids: CorruptIdPolicy) -> Self {
        Self {
            corrupt_ids,
            ..self
        }
    }

    /// Stop scanning at the first corrupt frame identifier
    pub fn reject_corrupt_ids(self) -> Self {
        self.corrupt_ids(CorruptIdPolicy::Reject)
    }

    /// Writes any attached picture found while viewing
    /// into the given directory
    pub fn artwork_dir<P: Into<PathBuf>>(self, dir: P) -> Self {
        Self {
            artwork_dir: Some(dir.into()),
            ..self
        }
    }

    /// Our corrupt frame identifier policy
    pub fn corrupt_id_policy(&self) -> CorruptIdPolicy {
        self.corrupt_ids
    }

    /// Where attached pictures are written, if anywhere
    pub fn artwork_output(&self) -> Option<&Path> {
        self.artwork_dir.as_deref()
    }
}
