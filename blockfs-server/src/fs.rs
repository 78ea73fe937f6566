//! The file system facade: CREATE, WRITE, READ, DELETE, LIST.
//!
//! Owns the backing [`Device`] and the in-memory tables (`inode_table` +
//! `node_table`/free list, bundled as [`State`]) behind a single
//! [`RwLock`] — this lock plays the role of the global lock `G`. Per-file
//! locks (`F[name]`) live in [`LockManager`] and are always acquired
//! *before* `G`, never after, so a caller already holding `G` must never
//! reach for a file lock.

use std::path::Path;

use blockfs_types::{
    ChainNode, FsError, FsResult, INODE_SIZE, InodeEntry, MAX_BLOCKS, MAX_CONTENT_LEN, MAX_FILES,
    NAME_MAX, TOTAL_SIZE, blocks_needed, chain_node_offset, inode_offset,
};
use parking_lot::RwLock;

use crate::alloc;
use crate::chain::ChainTable;
use crate::device::Device;
use crate::inode_table::InodeTable;
use crate::locks::LockManager;

struct State {
    inodes: InodeTable,
    chains: ChainTable,
}

/// An open simulated disk: a backing file plus the locks and tables that
/// make concurrent access to it safe.
pub struct FileSystem {
    device: Device,
    state: RwLock<State>,
    locks: LockManager,
}

impl FileSystem {
    /// Opens `path`, initialising a fresh, empty disk if the file is
    /// absent or empty. `configured_size` is accepted for signature
    /// compatibility only: the on-disk layout is fixed by the constants in
    /// [`blockfs_types`] regardless of its value.
    pub fn open(path: &Path, _configured_size: u64) -> FsResult<Self> {
        let device = Device::open(path)?;
        let state = if device.len()? == 0 {
            Self::init_fresh(&device)?
        } else {
            State {
                inodes: InodeTable::load(&device)?,
                chains: ChainTable::load(&device)?,
            }
        };
        Ok(Self {
            device,
            state: RwLock::new(state),
            locks: LockManager::new(),
        })
    }

    fn init_fresh(device: &Device) -> FsResult<State> {
        device.truncate(TOTAL_SIZE as u64)?;
        for i in 0..MAX_FILES {
            device.write_at(inode_offset(i), &[0u8; INODE_SIZE])?;
        }
        for i in 0..MAX_BLOCKS {
            device.write_at(chain_node_offset(i), &ChainNode::FREE.encode())?;
        }
        device.sync()?;
        Ok(State {
            inodes: InodeTable::empty(),
            chains: ChainTable::empty(),
        })
    }

    /// Creates an empty file named `name`. Creating a name that already
    /// exists is a silent success — no state change, no error.
    pub fn create(&self, name: &str) -> FsResult<()> {
        if name.len() > NAME_MAX {
            return Err(FsError::NameTooLong);
        }

        let mut state = self.state.write();
        if state.inodes.find(name).is_some() {
            return Ok(());
        }
        let slot = state.inodes.find_free_slot().ok_or(FsError::NoFreeInode)?;
        state.inodes.set(&self.device, slot, Some(InodeEntry::new(name)))?;
        self.locks.file_lock(name);
        self.device.sync()?;
        Ok(())
    }

    /// Replaces the entire content of `name` with `content`.
    pub fn write(&self, name: &str, content: &[u8]) -> FsResult<()> {
        if content.len() > MAX_CONTENT_LEN {
            return Err(FsError::NoSpace);
        }
        let needed = blocks_needed(content.len());

        let file_lock = self.locks.file_lock(name);
        let _file_guard = file_lock.write();

        // Fail fast without taking the exclusive table lock if the file is
        // already gone or space is clearly short.
        {
            let state = self.state.read();
            if state.inodes.find(name).is_none() {
                return Err(FsError::NoSuchFile(name.to_owned()));
            }
            if alloc::find_free(state.chains.free_list(), needed).is_none() {
                return Err(FsError::NoSpace);
            }
        }

        let mut state = self.state.write();
        // Re-verify: a DELETE may have run between the check above and
        // here, since it was performed without holding the table lock.
        let slot = state
            .inodes
            .find(name)
            .ok_or_else(|| FsError::NoSuchFile(name.to_owned()))?;

        let old_first_block = state.inodes.get(slot).expect("slot occupied").first_block;
        state.chains.release(&self.device, old_first_block)?;

        let blocks = alloc::find_free(state.chains.free_list(), needed).ok_or(FsError::NoSpace)?;
        let first_block = state.chains.install(&self.device, &blocks, content)?;

        let mut entry = state.inodes.get(slot).expect("slot occupied").clone();
        entry.size = content.len() as u16;
        entry.first_block = first_block;
        state.inodes.set(&self.device, slot, Some(entry))?;

        self.device.sync()?;
        Ok(())
    }

    /// Returns the full content of `name`.
    ///
    /// Unlike `create`/`write`, a `READ` of a name that was never created
    /// (or was already deleted) must not grow the lock map — §9's "per-file
    /// lock map growth" rule only lists `CREATE` and `WRITE` as creators of
    /// `F[name]`. So this looks the lock up without inserting; an absent
    /// entry means the file does not exist.
    pub fn read(&self, name: &str) -> FsResult<Vec<u8>> {
        let file_lock = self
            .locks
            .existing_file_lock(name)
            .ok_or_else(|| FsError::NoSuchFile(name.to_owned()))?;
        let _file_guard = file_lock.read();

        let state = self.state.read();
        let slot = state
            .inodes
            .find(name)
            .ok_or_else(|| FsError::NoSuchFile(name.to_owned()))?;
        let entry = state.inodes.get(slot).expect("slot occupied");
        state.chains.read(&self.device, entry.first_block, entry.size as usize)
    }

    /// Removes `name` and returns its blocks to the free list.
    pub fn delete(&self, name: &str) -> FsResult<()> {
        let mut state = self.state.write();
        let slot = state
            .inodes
            .find(name)
            .ok_or_else(|| FsError::NoSuchFile(name.to_owned()))?;
        let first_block = state.inodes.get(slot).expect("slot occupied").first_block;
        state.chains.release(&self.device, first_block)?;
        state.inodes.set(&self.device, slot, None)?;
        self.device.sync()?;

        // Remove F[name] before releasing G (this write guard), per §4.7's
        // step order — otherwise a CREATE of the same name could run in the
        // gap and have its lock entry yanked out from under it.
        self.locks.forget_file(name);
        Ok(())
    }

    /// Names of all occupied files, in slot order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.state.read().inodes.names().map(str::to_owned).collect()
    }

    /// Flushes and releases the backing file descriptor. Call exactly once,
    /// at shutdown.
    pub fn close(self) -> FsResult<()> {
        self.device.close()
    }
}
