//! File bytes, either read into a buffer or memory-mapped.
//!
//! Safety: mapping a file is `unsafe` because another process may truncate or
//! rewrite it while the map is alive. The map here is read-only, lives only
//! for the duration of one decode, and is dropped before the caller sees the
//! decoded text.
#![allow(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::error::DocumentError;

/// Raw contents of a file. Dropping it releases the buffer or unmaps.
pub(crate) enum FileBytes {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl FileBytes {
    /// Read `path`, mapping it when it is larger than `mmap_threshold` bytes.
    pub(crate) fn read(path: &Path, mmap_threshold: u64) -> Result<Self, DocumentError> {
        let mut file = File::open(path).map_err(|e| DocumentError::read(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| DocumentError::read(path, e))?
            .len();

        if len > mmap_threshold {
            // SAFETY: read-only mapping of a file we just opened; the map does
            // not outlive this `FileBytes`.
            let map = unsafe { Mmap::map(&file) }.map_err(|e| DocumentError::read(path, e))?;
            return Ok(Self::Mapped(map));
        }

        let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        file.read_to_end(&mut buf)
            .map_err(|e| DocumentError::read(path, e))?;
        Ok(Self::Buffered(buf))
    }

    #[must_use]
    pub(crate) const fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Buffered(buf) => buf,
            Self::Mapped(map) => map,
        }
    }
}
