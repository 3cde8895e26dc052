use std::{process, ptr::NonNull};

use crate::{
    align::align_up,
    block::{BlockHeader, BLOCK_HEADER_SIZE},
    error::RequestTooLarge,
    page::Page,
    platform, Pointer,
};

/// Construction parameters for a [`PagePool`].
///
/// ```
/// use pagepool::{PoolConfig, KILO};
///
/// let config = PoolConfig::new(64 * KILO, 128).grow_on_exhaustion(false);
/// assert_eq!(config.page_size, 64 * KILO);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Size in bytes of every page the pool will ever request. Pick it so
    /// a typical working set fits in a handful of pages.
    pub page_size: usize,
    /// Headroom in bytes the caller tolerates inside a chosen block. When
    /// the leftover of a block is not comfortably larger than this, the
    /// pool hands out the whole block instead of splitting it. A good
    /// value is the size of the smallest asset that will be allocated.
    pub fragment_threshold: usize,
    /// When false, failing to find space in the existing pages is fatal
    /// instead of triggering a new page request.
    pub grow_on_exhaustion: bool,
}

impl PoolConfig {
    /// Builds a config that grows on exhaustion, which is what most
    /// callers want.
    pub fn new(page_size: usize, fragment_threshold: usize) -> Self {
        Self {
            page_size,
            fragment_threshold,
            grow_on_exhaustion: true,
        }
    }

    /// Overrides the growth policy.
    pub fn grow_on_exhaustion(mut self, grow: bool) -> Self {
        self.grow_on_exhaustion = grow;
        self
    }
}

/// Variable-size allocator backed by platform provided pages.
///
/// The pool owns a vector of [`Page`]s in creation order. The vector is
/// both the page list (the search walks it front to back, new pages are
/// pushed at the back) and the index that lets [`PagePool::free`] find a
/// block's owning page in constant time from the page index stored in
/// its header.
///
/// One page is requested up front at construction; more appear lazily
/// when a request doesn't fit anywhere, if growth is enabled. Pages are
/// only returned to the platform when the pool is dropped.
///
/// All operations need `&mut self` and nothing is synchronized, so the
/// borrow checker enforces the single writer model. Use one pool per
/// thread or add an external lock.
pub struct PagePool {
    page_size: usize,
    fragment_threshold: usize,
    grow_on_exhaustion: bool,
    pages: Vec<Page>,
}

impl PagePool {
    /// Builds a pool that grows on exhaustion and immediately requests
    /// its first page. Shorthand for [`PagePool::with_config`] with the
    /// default growth policy.
    ///
    /// # Aborts
    ///
    /// If the platform refuses to provide the first page the process is
    /// aborted after logging a diagnostic, as with any other page
    /// request.
    ///
    /// # Panics
    ///
    /// If `page_size` is not larger than the block header, since such a
    /// page could not hold a single byte of payload.
    pub fn new(page_size: usize, fragment_threshold: usize) -> Self {
        Self::with_config(PoolConfig::new(page_size, fragment_threshold))
    }

    /// Builds a pool from an explicit [`PoolConfig`]. See
    /// [`PagePool::new`] for the failure behavior.
    pub fn with_config(config: PoolConfig) -> Self {
        assert!(
            config.page_size > BLOCK_HEADER_SIZE,
            "page_size must exceed the {BLOCK_HEADER_SIZE} byte block header"
        );

        let Some(buffer) = (unsafe { platform::request_memory(config.page_size) }) else {
            log::error!(
                "Bad Allocation detected during PagePool construction. Application Terminated."
            );
            process::abort();
        };

        let first_page = unsafe { Page::new(buffer, config.page_size, 0) };

        Self {
            page_size: config.page_size,
            fragment_threshold: config.fragment_threshold,
            grow_on_exhaustion: config.grow_on_exhaustion,
            pages: vec![first_page],
        }
    }

    /// Size in bytes of every page of this pool.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages requested so far. Starts at 1 and only ever
    /// grows.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Returns a pointer to a writable region of at least `size` bytes,
    /// valid until the matching [`PagePool::free`] or until the pool is
    /// dropped. The region is aligned at least as strictly as the block
    /// header.
    ///
    /// The request is rounded up internally to the header's alignment so
    /// that the header written after the block stays aligned; the caller
    /// may use the extra bytes but doesn't have to.
    ///
    /// # Errors
    ///
    /// Requests that could never fit in a page, not even a brand new
    /// empty one, are rejected with [`RequestTooLarge`].
    ///
    /// # Aborts
    ///
    /// When no existing page can serve the request and growth is
    /// disabled, or the platform refuses to provide a new page, the pool
    /// releases everything it holds, logs a diagnostic and aborts the
    /// process.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, RequestTooLarge> {
        let capacity = self.page_size - BLOCK_HEADER_SIZE;
        if size > capacity || align_up(size) > capacity {
            log::warn!(
                "requested memory size exceeds page capacity \
                 ({size} bytes requested, {capacity} usable per page)"
            );
            return Err(RequestTooLarge {
                requested: size,
                page_size: self.page_size,
            });
        }

        let size = align_up(size);

        unsafe {
            for index in 0..self.pages.len() {
                let page = &self.pages[index];

                // Fast cutoff before walking the block list. Note the
                // `>=`: a page whose free bytes match the request exactly
                // is skipped as well, trading that corner case for
                // cheaper pruning.
                if size >= page.mem_left {
                    continue;
                }

                if let Some(block) = Self::worst_fit(page, size) {
                    return Ok(self.place(index, block, size));
                }
            }

            if !self.grow_on_exhaustion {
                self.release_all_pages();
                log::error!("Bad Allocation detected. Application Terminated.");
                process::abort();
            }

            // A fresh page holds a single spanning free block and the
            // capacity check above guarantees the request fits in it.
            let index = self.request_new_page();
            let block = self.pages[index].first_block();
            Ok(self.place(index, block, size))
        }
    }

    /// Marks the block that owns `ptr` as available again, merges it with
    /// its free neighbors and credits the page's free byte counter. The
    /// forward neighbor is merged before the backward one so the backward
    /// merge already sees the extended size.
    ///
    /// # Safety
    ///
    /// `ptr` must be a pointer previously returned by
    /// [`PagePool::allocate`] on this same pool and not freed since.
    /// Double frees, foreign pointers and writes through `ptr` after this
    /// call are undefined behavior; the pool does not detect them.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let mut block = BlockHeader::from_payload_address(ptr);
        block.as_mut().available = true;

        let page = &mut self.pages[block.as_ref().page_index as usize];
        page.mem_left += block.as_ref().size;

        if block.as_ref().next.is_some_and(|next| next.as_ref().available) {
            let next = block.as_ref().next.unwrap();
            block.as_mut().size += next.as_ref().total_size();
            page.blocks.remove(next);
            page.mem_left += BLOCK_HEADER_SIZE;
        }

        if block.as_ref().prev.is_some_and(|prev| prev.as_ref().available) {
            let mut prev = block.as_ref().prev.unwrap();
            prev.as_mut().size += block.as_ref().total_size();
            page.blocks.remove(block);
            page.mem_left += BLOCK_HEADER_SIZE;
        }
    }

    /// Returns the available block of maximal size that can hold `size`
    /// bytes, or `None` if the page has no such block. Ties go to the
    /// block that comes first in address order.
    unsafe fn worst_fit(page: &Page, size: usize) -> Pointer<BlockHeader> {
        let mut candidate: Pointer<BlockHeader> = None;

        for block in page.blocks.iter() {
            if !block.as_ref().available || size > block.as_ref().size {
                continue;
            }

            let larger = match candidate {
                Some(current) => block.as_ref().size > current.as_ref().size,
                None => true,
            };

            if larger {
                candidate = Some(block);
            }
        }

        candidate
    }

    /// Carves `size` bytes out of the free `block` in page `index` and
    /// returns the payload address.
    ///
    /// When the headroom left in the block is comfortably larger than the
    /// fragmentation threshold (strictly larger than threshold plus one
    /// header) the leftover becomes a new free block spliced right after
    /// this one. Otherwise the whole block is handed out and the headroom
    /// rides along as internal fragmentation, reclaimed when the block is
    /// freed.
    unsafe fn place(
        &mut self,
        index: usize,
        mut block: NonNull<BlockHeader>,
        size: usize,
    ) -> NonNull<u8> {
        let page = &mut self.pages[index];
        let headroom = block.as_ref().size - size;

        if headroom > self.fragment_threshold + BLOCK_HEADER_SIZE {
            let address =
                NonNull::new_unchecked(BlockHeader::payload_address_of(block).as_ptr().add(size));

            page.blocks
                .insert_after(block, address, headroom - BLOCK_HEADER_SIZE, page.index);
            block.as_mut().size = size;

            // The split wrote one more header into what used to be free
            // payload.
            page.mem_left -= BLOCK_HEADER_SIZE;
        }

        block.as_mut().available = false;
        page.mem_left -= block.as_ref().size;

        BlockHeader::payload_address_of(block)
    }

    /// Appends a fresh page to the pool and returns its index.
    ///
    /// On platform failure every page held so far is released, a
    /// diagnostic is logged and the process aborts.
    unsafe fn request_new_page(&mut self) -> usize {
        let Some(buffer) = platform::request_memory(self.page_size) else {
            self.release_all_pages();
            log::error!("Bad Allocation detected. Application Terminated.");
            process::abort();
        };

        let index = self.pages.len();
        self.pages.push(Page::new(buffer, self.page_size, index as u32));

        index
    }

    /// Hands every page buffer back to the platform, in list order. Used
    /// by the fatal paths and by [`Drop`].
    fn release_all_pages(&mut self) {
        let page_size = self.page_size;

        for page in self.pages.drain(..) {
            unsafe { platform::return_memory(page.buffer, page_size) };
        }
    }
}

impl Drop for PagePool {
    fn drop(&mut self) {
        self.release_all_pages();
    }
}
