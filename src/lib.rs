//! Variable-size, page-backed heap allocator.
//!
//! This crate sits between an application and the system allocator. It is
//! meant for workloads that allocate and release assets of widely varying
//! sizes in a latency sensitive loop, for example mesh, texture or vertex
//! buffers streamed in at runtime, where paying for a system allocator
//! round trip on every request is unacceptable.
//!
//! Instead of forwarding each request, a [`PagePool`] grabs large
//! contiguous buffers ("pages") from the platform in bulk and carves
//! variable length blocks out of them. Every block is preceded by an
//! inline metadata header, and the headers of one page form a doubly
//! linked, address ordered list:
//!
//! ```text
//! +------+---------+------+---------+------+-------------------+
//! | Hdr  | Payload | Hdr  | Payload | Hdr  |  Payload (free)   |  page 0
//! +------+---------+------+---------+------+-------------------+
//!    ^                ^                 ^
//!    +---- next ----->+----- next ----->+        (prev links go back)
//! ```
//!
//! Placement is worst-fit: the largest free block that can hold the
//! request wins, which keeps the leftover fragment as large as possible.
//! Whether that leftover is split off into a new free block or absorbed
//! into the allocation is governed by a user supplied fragmentation
//! threshold. Freeing a block coalesces it with its free neighbors, and
//! when every page is exhausted the pool requests another one.
//!
//! # Example
//!
//! ```no_run
//! use pagepool::{PagePool, KILO};
//!
//! // 5 KiB pages, tolerate up to 50 bytes of headroom per block.
//! let mut pool = PagePool::new(5 * KILO, 50);
//!
//! let ptr = pool.allocate(128).expect("fits in a page");
//! unsafe {
//!     ptr.as_ptr().write_bytes(0xAB, 128);
//!     pool.free(ptr);
//! }
//! ```
//!
//! The pool is single threaded by design. Concurrent calls into one
//! instance are undefined; wrap it in a lock if the surrounding code
//! needs sharing. Independent instances don't share anything and can
//! live on different threads.

use std::ptr::NonNull;

mod align;
mod block;
mod dump;
mod error;
mod list;
mod page;
mod platform;
mod pool;

/// Non-null pointer to `T`. We use this in most cases instead of
/// `*mut T` because the compiler will yell at us if we don't write code
/// for the `None` case.
pub(crate) type Pointer<T> = Option<NonNull<T>>;

pub use error::RequestTooLarge;
pub use pool::{PagePool, PoolConfig};

/// One kilobyte, for spelling out page sizes.
pub const KILO: usize = 1024;

/// One megabyte.
pub const MEGA: usize = 1024 * KILO;

/// One gigabyte.
pub const GIGA: usize = 1024 * MEGA;
