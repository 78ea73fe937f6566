//! Reads and rewrites a file's block chain.
//!
//! A chain is a linked list of small integer indices into the fixed
//! `node_table`/data-region arrays — it is never represented with owning
//! references, only plain data, so releasing and installing a chain is just
//! bookkeeping plus I/O.

use blockfs_types::{
    BLOCK_SIZE, ChainNode, FsError, FsResult, MAX_BLOCKS, block_offset, chain_node_offset,
};

use crate::device::Device;

/// In-memory mirror of the on-disk chain node table, plus the derived free
/// list.
pub struct ChainTable {
    nodes: [ChainNode; MAX_BLOCKS],
    free: [bool; MAX_BLOCKS],
}

impl ChainTable {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            nodes: [ChainNode::FREE; MAX_BLOCKS],
            free: [true; MAX_BLOCKS],
        }
    }

    /// Loads the chain node table from `device` and rebuilds the free list
    /// from it: a block is free iff its `block_index` field is negative.
    pub fn load(device: &Device) -> FsResult<Self> {
        let mut nodes = [ChainNode::FREE; MAX_BLOCKS];
        let mut free = [true; MAX_BLOCKS];
        for (i, node) in nodes.iter_mut().enumerate() {
            let mut buf = [0u8; blockfs_types::CHAIN_NODE_SIZE];
            device.read_at(chain_node_offset(i), &mut buf)?;
            let decoded = ChainNode::decode(&buf)?;
            free[i] = decoded.is_free();
            *node = decoded;
        }
        Ok(Self { nodes, free })
    }

    #[must_use]
    pub fn free_list(&self) -> &[bool; MAX_BLOCKS] {
        &self.free
    }

    #[must_use]
    pub fn node(&self, i: usize) -> ChainNode {
        self.nodes[i]
    }

    fn persist(&mut self, device: &Device, i: usize, node: ChainNode) -> FsResult<()> {
        device.write_at(chain_node_offset(i), &node.encode())?;
        self.free[i] = node.is_free();
        self.nodes[i] = node;
        Ok(())
    }

    /// Releases the chain starting at `first_block`, zero-filling each
    /// visited block's data and marking it free. Idempotent on an empty
    /// chain (`first_block == None`).
    pub fn release(&mut self, device: &Device, first_block: Option<usize>) -> FsResult<()> {
        let mut cursor = first_block;
        let mut visited = [false; MAX_BLOCKS];
        while let Some(k) = cursor {
            if k >= MAX_BLOCKS || visited[k] {
                return Err(FsError::Corrupt(format!(
                    "chain cycle or out-of-range index at {k}"
                )));
            }
            visited[k] = true;
            device.write_zeros(block_offset(k), BLOCK_SIZE)?;
            let next = self.nodes[k].next;
            self.persist(device, k, ChainNode::FREE)?;
            cursor = next;
        }
        Ok(())
    }

    /// Installs a new chain over the blocks in `blocks` (as returned by the
    /// allocator), writing `content` across them in order.
    ///
    /// Returns the chain's head (`Some(blocks[0])`, or `None` if `blocks`
    /// is empty).
    pub fn install(
        &mut self,
        device: &Device,
        blocks: &[usize],
        content: &[u8],
    ) -> FsResult<Option<usize>> {
        for (i, &k) in blocks.iter().enumerate() {
            let next = blocks.get(i + 1).copied();
            self.persist(
                device,
                k,
                ChainNode {
                    block_index: Some(k),
                    next,
                },
            )?;

            let start = i * BLOCK_SIZE;
            let end = (start + BLOCK_SIZE).min(content.len());
            device.write_at(block_offset(k), &content[start..end])?;
        }
        Ok(blocks.first().copied())
    }

    /// Reads a file's full content, walking the chain from `first_block`.
    pub fn read(
        &self,
        device: &Device,
        first_block: Option<usize>,
        size: usize,
    ) -> FsResult<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(size);
        let mut cursor = first_block;
        let mut visited = [false; MAX_BLOCKS];
        while out.len() < size {
            let Some(k) = cursor else {
                return Err(FsError::Corrupt("chain ended before size bytes".into()));
            };
            if k >= MAX_BLOCKS || visited[k] {
                return Err(FsError::Corrupt(format!(
                    "chain cycle or out-of-range index at {k}"
                )));
            }
            visited[k] = true;

            let remaining = size - out.len();
            let n = remaining.min(BLOCK_SIZE);
            let mut buf = [0u8; BLOCK_SIZE];
            device.read_at(block_offset(k), &mut buf[..n])?;
            out.extend_from_slice(&buf[..n]);

            cursor = self.nodes[k].next;
        }
        Ok(out)
    }
}
