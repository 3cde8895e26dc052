use std::{mem, ptr::NonNull};

use crate::Pointer;

/// Block header size in bytes. This is the fixed per-allocation overhead,
/// and the quantity that every split consumes and every merge reclaims.
pub(crate) const BLOCK_HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Inline metadata record placed immediately before every block inside a
/// page. Here's a graphical representation of how it looks like in
/// memory:
///
/// ```text
/// +----------------------------+
/// | pointer to next header     |  <- null at the end of the page
/// +----------------------------+
/// | pointer to prev header     |  <- null at the start of the page
/// +----------------------------+
/// | payload size               |
/// +----------------------------+
/// | owning page index          |
/// +----------------------------+
/// | availability flag          |
/// +----------------------------+
/// |          Payload           |  <- this is what callers receive
/// |            ...             |
/// +----------------------------+
/// ```
///
/// The links only ever point within the same page, in address order, so
/// for any header with a successor the successor sits exactly
/// `BLOCK_HEADER_SIZE + size` bytes further. Note that the compiler is
/// free to reorder the fields, we never assume any specific layout, only
/// the total struct size matters.
pub(crate) struct BlockHeader {
    /// Next header in the same page, address order.
    pub next: Pointer<BlockHeader>,
    /// Previous header in the same page.
    pub prev: Pointer<BlockHeader>,
    /// Payload bytes that follow this header, excluding the header
    /// itself.
    pub size: usize,
    /// Index of the page this block lives in. Recorded at creation so
    /// that deallocation can find the owning page without searching.
    pub page_index: u32,
    /// Whether the payload is free for allocation.
    pub available: bool,
}

impl BlockHeader {
    /// Returns a pointer to the [`BlockHeader`] in front of the given
    /// payload address.
    ///
    /// ```text
    /// +---------------+
    /// |  BlockHeader  | <- Returned address points here.
    /// +---------------+
    /// |    Payload    | <- Given address should point here.
    /// +---------------+
    /// ```
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `address` points exactly to the
    /// first memory cell after a valid header, which is true for every
    /// pointer the pool hands out. Anything else is undefined behaviour.
    #[inline]
    pub unsafe fn from_payload_address(address: NonNull<u8>) -> NonNull<Self> {
        NonNull::new_unchecked(address.as_ptr().cast::<Self>().offset(-1))
    }

    /// Returns the payload address right after the header, the address
    /// callers are allowed to write to.
    ///
    /// We use this as `BlockHeader::payload_address_of(header)` instead
    /// of a method on `&self` to avoid creating intermediary references
    /// that would upset Miri's aliasing rules.
    ///
    /// # Safety
    ///
    /// `header` must point to a live header inside a page buffer. The
    /// returned address is valid for `size` bytes.
    #[inline]
    pub unsafe fn payload_address_of(header: NonNull<Self>) -> NonNull<u8> {
        NonNull::new_unchecked(header.as_ptr().offset(1)).cast()
    }

    /// Bytes this block occupies in its page, header included.
    #[inline]
    pub fn total_size(&self) -> usize {
        BLOCK_HEADER_SIZE + self.size
    }
}
