use std::ptr::NonNull;

use crate::{
    block::{BlockHeader, BLOCK_HEADER_SIZE},
    list::BlockList,
};

/// One contiguous buffer obtained from the platform, plus the records the
/// pool keeps about it. The whole buffer is block storage; unlike the
/// headers, this struct lives outside of it:
///
/// ```text
///   Page record                    buffer (page_size bytes)
/// +-----------+        +--------+---------+--------+------------+
/// | buffer ---+------> | Header | Payload | Header |  Payload   |
/// | blocks    |        +--------+---------+--------+------------+
/// | mem_left  |
/// | index     |
/// +-----------+
/// ```
///
/// A fresh page holds exactly one free block covering the whole payload
/// area. Pages are never returned to the platform individually, only when
/// the owning pool goes away, so `index` stays valid for the pool's whole
/// lifetime and every header records it.
pub(crate) struct Page {
    /// Owned buffer of exactly the pool's `page_size` bytes.
    pub buffer: NonNull<u8>,
    /// Headers embedded in `buffer`, address order.
    pub blocks: BlockList,
    /// Payload bytes currently sitting in this page's available blocks,
    /// excluding the headers of those blocks. Used as a fast filter
    /// before the block scan.
    pub mem_left: usize,
    /// Position of this page in the pool's page vector.
    pub index: u32,
}

impl Page {
    /// Takes ownership of `buffer` and writes the initial spanning free
    /// block into it.
    ///
    /// # Safety
    ///
    /// `buffer` must be valid for `page_size` writable bytes, aligned for
    /// a [`BlockHeader`], and `page_size` must exceed the header size.
    pub unsafe fn new(buffer: NonNull<u8>, page_size: usize, index: u32) -> Self {
        let mut blocks = BlockList::new();
        let size = page_size - BLOCK_HEADER_SIZE;
        blocks.init(buffer, size, index);

        Self {
            buffer,
            blocks,
            mem_left: size,
            index,
        }
    }

    /// Returns the first block of this page.
    ///
    /// # Safety
    ///
    /// There is **ALWAYS** at least one block in a page.
    pub unsafe fn first_block(&self) -> NonNull<BlockHeader> {
        self.blocks.head.unwrap_unchecked()
    }
}
