//! Block device: a byte-addressable facade over the backing file.
//!
//! Every method takes an explicit byte offset and performs a positioned
//! read or write (`pread`/`pwrite` on Unix) rather than a stateful
//! seek-then-read. A [`std::fs::File`] handle has exactly one cursor shared
//! by every clone of the descriptor, so a stateful `seek` followed by a
//! `read`/`write` would race across threads holding *different* per-file
//! locks (see the concurrency model in the crate root docs). Positioned I/O
//! sidesteps that hazard entirely and is what lets two operations on
//! different files truly run in parallel.

use std::fs::{File, OpenOptions};
use std::path::Path;

use blockfs_types::FsResult;

#[cfg(unix)]
use std::os::unix::fs::FileExt;

/// A thin facade over a random-access backing file, opened with
/// write-through semantics.
///
/// `Device` is `Sync`: all operations are positioned (no shared cursor), so
/// it is safe to call concurrently from multiple threads as long as callers
/// respect the lock discipline in [`crate::locks`].
pub struct Device {
    file: File,
    #[cfg(not(unix))]
    fallback: parking_lot::Mutex<()>,
}

impl Device {
    /// Opens (creating if absent) the backing file at `path`.
    pub fn open(path: &Path) -> FsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            file,
            #[cfg(not(unix))]
            fallback: parking_lot::Mutex::new(()),
        })
    }

    /// Current length of the backing file.
    pub fn len(&self) -> FsResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Reads exactly `buf.len()` bytes starting at `offset`.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> FsResult<()> {
        #[cfg(unix)]
        {
            self.file.read_exact_at(buf, offset as u64)?;
        }
        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let _guard = self.fallback.lock();
            let file = &self.file;
            (&*file).seek(SeekFrom::Start(offset as u64))?;
            (&*file).read_exact(buf)?;
        }
        Ok(())
    }

    /// Writes `buf` at `offset`. Does not sync; call [`Device::sync`]
    /// explicitly once a logical operation is complete.
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> FsResult<()> {
        #[cfg(unix)]
        {
            self.file.write_all_at(buf, offset as u64)?;
        }
        #[cfg(not(unix))]
        {
            use std::io::{Seek, SeekFrom, Write};
            let _guard = self.fallback.lock();
            let file = &self.file;
            (&*file).seek(SeekFrom::Start(offset as u64))?;
            (&*file).write_all(buf)?;
        }
        Ok(())
    }

    /// Writes `len` zero bytes starting at `offset`.
    pub fn write_zeros(&self, offset: usize, len: usize) -> FsResult<()> {
        let zeros = vec![0u8; len];
        self.write_at(offset, &zeros)
    }

    /// Flushes buffered writes and metadata to durable storage.
    pub fn sync(&self) -> FsResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Sets the backing file's length, zero-extending if it grows.
    pub fn truncate(&self, len: u64) -> FsResult<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    /// Explicitly releases the backing file descriptor.
    ///
    /// Called exactly once at process shutdown; after this, the `Device`
    /// must not be used again. Dropping a `Device` without calling this
    /// still closes the descriptor, but callers that want a durability
    /// guarantee on shutdown should `sync()` first.
    pub fn close(self) -> FsResult<()> {
        self.file.sync_all()?;
        drop(self.file);
        Ok(())
    }
}
