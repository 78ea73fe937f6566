//! Fixed array of inode slots and name lookup.

use blockfs_types::{FsResult, INODE_SIZE, InodeEntry, MAX_FILES, inode_offset};

use crate::device::Device;

/// In-memory mirror of the on-disk inode table.
#[derive(Debug, Default)]
pub struct InodeTable {
    slots: [Option<InodeEntry>; MAX_FILES],
}

impl InodeTable {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: [const { None }; MAX_FILES],
        }
    }

    /// Loads the inode table from `device`.
    pub fn load(device: &Device) -> FsResult<Self> {
        let mut slots: [Option<InodeEntry>; MAX_FILES] = [const { None }; MAX_FILES];
        for (i, slot) in slots.iter_mut().enumerate() {
            let mut buf = [0u8; INODE_SIZE];
            device.read_at(inode_offset(i), &mut buf)?;
            *slot = InodeEntry::decode(&buf)?;
        }
        Ok(Self { slots })
    }

    /// Returns the slot index of the inode named `name`, if any.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.name == name))
    }

    /// Returns the lowest-indexed empty slot, if any.
    #[must_use]
    pub fn find_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&InodeEntry> {
        self.slots[slot].as_ref()
    }

    /// Occupied inode names, in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.as_ref().map(|e| e.name.as_str()))
    }

    /// Updates slot `i` in memory and writes it through to `device`.
    ///
    /// Does not sync; the caller is responsible for syncing once its whole
    /// logical operation has been written through.
    pub fn set(&mut self, device: &Device, slot: usize, entry: Option<InodeEntry>) -> FsResult<()> {
        let buf = entry.as_ref().map_or([0u8; INODE_SIZE], InodeEntry::encode);
        device.write_at(inode_offset(slot), &buf)?;
        self.slots[slot] = entry;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn device() -> Device {
        let f = NamedTempFile::new().unwrap();
        Device::open(f.path()).unwrap()
    }

    #[test]
    fn empty_table_has_no_names() {
        let table = InodeTable::empty();
        assert_eq!(table.names().count(), 0);
        assert_eq!(table.find_free_slot(), Some(0));
    }

    #[test]
    fn set_and_find_round_trips() {
        let device = device();
        let mut table = InodeTable::empty();
        table.set(&device, 2, Some(InodeEntry::new("a"))).unwrap();
        assert_eq!(table.find("a"), Some(2));
        assert_eq!(table.find_free_slot(), Some(0));
    }

    #[test]
    fn clearing_a_slot_frees_it() {
        let device = device();
        let mut table = InodeTable::empty();
        table.set(&device, 0, Some(InodeEntry::new("a"))).unwrap();
        table.set(&device, 0, None).unwrap();
        assert_eq!(table.find("a"), None);
        assert_eq!(table.find_free_slot(), Some(0));
    }

    #[test]
    fn load_round_trips_through_disk() {
        let device = device();
        device.truncate(blockfs_types::TOTAL_SIZE as u64).unwrap();
        let mut table = InodeTable::empty();
        table.set(&device, 1, Some(InodeEntry::new("x"))).unwrap();

        let reloaded = InodeTable::load(&device).unwrap();
        assert_eq!(reloaded.find("x"), Some(1));
    }
}
