//! On-disk layout for the blockfs simulated disk.
//!
//! The backing file is partitioned as:
//!
//! | region              | size                                   | content                          |
//! |---------------------|-----------------------------------------|----------------------------------|
//! | inode table         | `MAX_FILES * INODE_SIZE`                | `MAX_FILES` [`InodeEntry`] slots |
//! | chain node table     | `MAX_BLOCKS * CHAIN_NODE_SIZE`           | `MAX_BLOCKS` [`ChainNode`] slots  |
//! | (padding to `DATA_START`) | -                                  | unused                            |
//! | data region          | `MAX_BLOCKS * BLOCK_SIZE`                | `MAX_BLOCKS` blocks of raw bytes  |
//!
//! There is no super block: the layout is fixed at compile time by the
//! constants below, not discovered from the backing file.

use std::fmt;

/// Maximum number of files the simulated disk can hold.
pub const MAX_FILES: usize = 5;
/// Number of fixed-size blocks in the data region.
pub const MAX_BLOCKS: usize = 10;
/// Size, in bytes, of one data block.
pub const BLOCK_SIZE: usize = 128;
/// Maximum byte length of a file name.
pub const NAME_MAX: usize = 11;

/// On-disk size of one [`InodeEntry`] slot: name + size + first_block.
pub const INODE_SIZE: usize = NAME_MAX + 2 + 2;
/// On-disk size of one [`ChainNode`] slot: block_index + next.
pub const CHAIN_NODE_SIZE: usize = 2 + 2;

/// Total size of the metadata region (inode table + chain node table).
pub const METADATA_SIZE: usize = MAX_FILES * INODE_SIZE + MAX_BLOCKS * CHAIN_NODE_SIZE;

/// Byte offset of the data region, rounded up to a block boundary.
pub const DATA_START: usize = METADATA_SIZE.next_multiple_of(BLOCK_SIZE);

/// Total length the backing file must have.
pub const TOTAL_SIZE: usize = DATA_START + MAX_BLOCKS * BLOCK_SIZE;

/// Largest file size representable by the 16-bit signed size field.
pub const MAX_CONTENT_LEN: usize = i16::MAX as usize;

/// Largest file size the data region can actually hold.
pub const MAX_FILE_SIZE: usize = MAX_BLOCKS * BLOCK_SIZE;

/// Byte offset of inode slot `i`.
#[must_use]
pub const fn inode_offset(i: usize) -> usize {
    i * INODE_SIZE
}

/// Byte offset of chain node slot `i`.
#[must_use]
pub const fn chain_node_offset(i: usize) -> usize {
    MAX_FILES * INODE_SIZE + i * CHAIN_NODE_SIZE
}

/// Byte offset of the start of data block `i`.
#[must_use]
pub const fn block_offset(i: usize) -> usize {
    DATA_START + i * BLOCK_SIZE
}

/// Number of blocks needed to hold `len` bytes of content.
#[must_use]
pub const fn blocks_needed(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE)
}

/// Errors surfaced by the simulated disk.
///
/// Each non-fatal variant corresponds 1:1 to a wire-level `ERROR: <message>`
/// response; [`FsError::Corrupt`] is fatal and only ever returned while
/// constructing a [`FileSystem`](#) from an existing backing file.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("filename too long")]
    NameTooLong,
    #[error("Maximum file limit reached")]
    NoFreeInode,
    #[error("file {0} does not exist")]
    NoSuchFile(String),
    #[error("file too large or insufficient space")]
    NoSpace,
    #[error("backing file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("file system image is corrupt: {0}")]
    Corrupt(String),
}

pub type FsResult<T> = Result<T, FsError>;

/// In-memory view of one inode slot.
///
/// `name` is always valid UTF-8 of at most [`NAME_MAX`] bytes. `first_block`
/// is `None` exactly when the file is empty (`size == 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeEntry {
    pub name: String,
    pub size: u16,
    pub first_block: Option<usize>,
}

impl InodeEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            first_block: None,
        }
    }

    /// Encodes this entry into its fixed [`INODE_SIZE`]-byte on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; INODE_SIZE] {
        let mut buf = [0u8; INODE_SIZE];
        let name_bytes = self.name.as_bytes();
        let len = name_bytes.len().min(NAME_MAX);
        buf[..len].copy_from_slice(&name_bytes[..len]);
        // Remaining name bytes are already zero from the initializer.

        let size = i16::try_from(self.size).unwrap_or(i16::MAX).to_be_bytes();
        buf[NAME_MAX..NAME_MAX + 2].copy_from_slice(&size);

        let first_block = self
            .first_block
            .map_or(-1i16, |b| i16::try_from(b).expect("block index fits i16"));
        buf[NAME_MAX + 2..NAME_MAX + 4].copy_from_slice(&first_block.to_be_bytes());

        buf
    }

    /// Decodes an [`INODE_SIZE`]-byte slot. Returns `Ok(None)` for an
    /// all-zero (empty) slot.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Corrupt`] if the name bytes are not valid UTF-8, or
    /// if `first_block` names a block index outside `[0, MAX_BLOCKS)`.
    pub fn decode(buf: &[u8; INODE_SIZE]) -> FsResult<Option<Self>> {
        if buf.iter().all(|&b| b == 0) {
            return Ok(None);
        }

        let name_field = &buf[..NAME_MAX];
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_MAX);
        let name = std::str::from_utf8(&name_field[..name_len])
            .map_err(|e| FsError::Corrupt(format!("inode name is not valid UTF-8: {e}")))?
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .to_owned();

        let size = i16::from_be_bytes([buf[NAME_MAX], buf[NAME_MAX + 1]]);
        if size < 0 {
            return Err(FsError::Corrupt(format!("negative inode size {size}")));
        }

        let first_block = i16::from_be_bytes([buf[NAME_MAX + 2], buf[NAME_MAX + 3]]);
        let first_block = match first_block {
            -1 => None,
            n if n >= 0 && (n as usize) < MAX_BLOCKS => Some(n as usize),
            n => return Err(FsError::Corrupt(format!("first_block out of range: {n}"))),
        };

        Ok(Some(Self {
            name,
            size: size as u16,
            first_block,
        }))
    }
}

/// In-memory view of one chain node slot.
///
/// `block_index` is `Some(k)` (equal to the slot's own index `k`, by
/// convention) while the block is part of a chain, `None` while free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainNode {
    pub block_index: Option<usize>,
    pub next: Option<usize>,
}

impl ChainNode {
    /// The node for a free block: `(-1, -1)`.
    pub const FREE: Self = Self {
        block_index: None,
        next: None,
    };

    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.block_index.is_none()
    }

    /// Encodes this node into its fixed [`CHAIN_NODE_SIZE`]-byte on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; CHAIN_NODE_SIZE] {
        let mut buf = [0u8; CHAIN_NODE_SIZE];
        let block_index = signed_or_absent(self.block_index);
        let next = signed_or_absent(self.next);
        buf[0..2].copy_from_slice(&block_index.to_be_bytes());
        buf[2..4].copy_from_slice(&next.to_be_bytes());
        buf
    }

    /// Decodes a [`CHAIN_NODE_SIZE`]-byte slot.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Corrupt`] if either field names an index outside
    /// `[0, MAX_BLOCKS)`.
    pub fn decode(buf: &[u8; CHAIN_NODE_SIZE]) -> FsResult<Self> {
        let block_index = decode_index(i16::from_be_bytes([buf[0], buf[1]]))?;
        let next = decode_index(i16::from_be_bytes([buf[2], buf[3]]))?;
        Ok(Self { block_index, next })
    }
}

fn signed_or_absent(v: Option<usize>) -> i16 {
    v.map_or(-1, |n| i16::try_from(n).expect("block index fits i16"))
}

fn decode_index(raw: i16) -> FsResult<Option<usize>> {
    match raw {
        -1 => Ok(None),
        n if n >= 0 && (n as usize) < MAX_BLOCKS => Ok(Some(n as usize)),
        n => Err(FsError::Corrupt(format!("chain index out of range: {n}"))),
    }
}

impl fmt::Display for ChainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.block_index.map_or(-1, |n| n as i64);
        let n = self.next.map_or(-1, |n| n as i64);
        write!(f, "({b}, {n})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants_match_spec() {
        assert_eq!(INODE_SIZE, 15);
        assert_eq!(CHAIN_NODE_SIZE, 4);
        assert_eq!(METADATA_SIZE, 115);
        assert_eq!(DATA_START, 128);
        assert_eq!(TOTAL_SIZE, 128 + 10 * 128);
        assert_eq!(MAX_FILE_SIZE, 1280);
    }

    #[test]
    fn inode_round_trip() {
        let entry = InodeEntry {
            name: "hello".to_owned(),
            size: 42,
            first_block: Some(3),
        };
        let buf = entry.encode();
        assert_eq!(InodeEntry::decode(&buf).unwrap(), Some(entry));
    }

    #[test]
    fn inode_name_is_nul_padded_and_truncated() {
        let entry = InodeEntry::new("averylongname-too-long");
        let buf = entry.encode();
        assert_eq!(&buf[..NAME_MAX], b"averylongna");
    }

    #[test]
    fn empty_slot_decodes_to_none() {
        let buf = [0u8; INODE_SIZE];
        assert_eq!(InodeEntry::decode(&buf).unwrap(), None);
    }

    #[test]
    fn inode_with_no_first_block_round_trips() {
        let entry = InodeEntry::new("empty");
        let buf = entry.encode();
        let decoded = InodeEntry::decode(&buf).unwrap().unwrap();
        assert_eq!(decoded.first_block, None);
        assert_eq!(decoded.size, 0);
    }

    #[test]
    fn corrupt_name_is_rejected() {
        let mut buf = [0u8; INODE_SIZE];
        buf[0] = 0xff; // invalid UTF-8 lead byte
        buf[1] = b'x';
        assert!(InodeEntry::decode(&buf).is_err());
    }

    #[test]
    fn corrupt_first_block_out_of_range_is_rejected() {
        let mut buf = [0u8; INODE_SIZE];
        buf[0] = b'a';
        buf[NAME_MAX + 2..NAME_MAX + 4].copy_from_slice(&20i16.to_be_bytes());
        assert!(InodeEntry::decode(&buf).is_err());
    }

    #[test]
    fn chain_node_round_trip() {
        let node = ChainNode {
            block_index: Some(4),
            next: Some(7),
        };
        assert_eq!(ChainNode::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn chain_node_free_round_trips_as_minus_one() {
        let buf = ChainNode::FREE.encode();
        assert_eq!(buf, [0xff, 0xff, 0xff, 0xff]);
        assert_eq!(ChainNode::decode(&buf).unwrap(), ChainNode::FREE);
    }

    #[test]
    fn blocks_needed_rounds_up() {
        assert_eq!(blocks_needed(0), 0);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE + 1), 2);
        assert_eq!(blocks_needed(MAX_FILE_SIZE), MAX_BLOCKS);
    }
}
