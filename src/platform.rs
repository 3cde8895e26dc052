use std::ptr::NonNull;

use crate::Pointer;

/// Abstraction for platform specific memory handling. The pool only needs
/// to request page buffers and hand them back when it is dropped, it
/// doesn't care about the APIs offered by the underlying kernel or
/// libraries.
///
/// Returned buffers are zero filled and aligned to at least an OS page
/// boundary, which is far stricter than what the block headers need.
trait PlatformSpecificMemory {
    /// Requests a buffer where `length` bytes can be written safely.
    unsafe fn request_memory(length: usize) -> Pointer<u8>;

    /// Returns `length` bytes starting at `address` to the underlying
    /// kernel. `address` and `length` must match a previous successful
    /// [`PlatformSpecificMemory::request_memory`] call.
    unsafe fn return_memory(address: NonNull<u8>, length: usize);
}

/// Zero sized type that implements [`PlatformSpecificMemory`] for each
/// OS.
struct Platform;

/// Convenience wrapper for [`PlatformSpecificMemory::request_memory`].
#[inline]
pub(crate) unsafe fn request_memory(length: usize) -> Pointer<u8> {
    Platform::request_memory(length)
}

/// Convenience wrapper for [`PlatformSpecificMemory::return_memory`].
#[inline]
pub(crate) unsafe fn return_memory(address: NonNull<u8>, length: usize) {
    Platform::return_memory(address, length)
}

#[cfg(unix)]
#[cfg(not(miri))]
mod unix {
    use std::ptr::{self, NonNull};

    use super::{Platform, PlatformSpecificMemory};
    use crate::Pointer;

    impl PlatformSpecificMemory for Platform {
        unsafe fn request_memory(length: usize) -> Pointer<u8> {
            // Memory protection. Read-Write only.
            let protection = libc::PROT_READ | libc::PROT_WRITE;

            // Memory should be private to our process and not mapped to
            // any file. Anonymous mappings come back zeroed.
            let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;

            // For all the configuration options that `mmap` accepts see
            // https://man7.org/linux/man-pages/man2/mmap.2.html
            match libc::mmap(ptr::null_mut(), length, protection, flags, -1, 0) {
                libc::MAP_FAILED => None,
                address => Some(NonNull::new_unchecked(address).cast()),
            }
        }

        unsafe fn return_memory(address: NonNull<u8>, length: usize) {
            if libc::munmap(address.cast().as_ptr(), length) != 0 {
                // TODO: What should we do here? Panic? Memory region is
                // still valid here, it wasn't unmapped.
            }
        }
    }
}

#[cfg(windows)]
#[cfg(not(miri))]
mod windows {
    use std::ptr::NonNull;

    use windows::Win32::System::Memory;

    use super::{Platform, PlatformSpecificMemory};
    use crate::Pointer;

    impl PlatformSpecificMemory for Platform {
        unsafe fn request_memory(length: usize) -> Pointer<u8> {
            // Similar to mmap on Linux, Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            // This works a little bit different from mmap, memory has to
            // be reserved first and then committed in order to become
            // usable. We can do both at the same time with one single
            // call. Committed pages are zeroed by the kernel.
            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            // For more detailed explanations of each parameter, see
            // https://learn.microsoft.com/en-us/windows/win32/api/memoryapi/nf-memoryapi-virtualalloc#parameters
            let address = Memory::VirtualAlloc(None, length, flags, protection);

            NonNull::new(address.cast())
        }

        unsafe fn return_memory(address: NonNull<u8>, _length: usize) {
            // We have to decommit memory first and then release it. We
            // can do both at once by specifying a length of 0 and the
            // MEM_RELEASE flag. See the docs for details:
            // https://learn.microsoft.com/en-us/windows/win32/api/memoryapi/nf-memoryapi-virtualfree#parameters
            let address = address.cast().as_ptr();
            let length = 0;
            let flags = Memory::MEM_RELEASE;

            if !Memory::VirtualFree(address, length, flags).as_bool() {
                // TODO: Release failed, don't know what to do here yet.
                // Same problem as munmap on Linux.
            }
        }
    }
}

#[cfg(miri)]
mod miri {
    //! When using Miri we can't rely on system calls such as `mmap`
    //! because there's no FFI support, so instead we use the global
    //! allocator to mock bulk memory. This is also useful for detecting
    //! leaks in the pool itself (pages that are never returned).

    use std::{alloc, ptr::NonNull};

    use super::{Platform, PlatformSpecificMemory};
    use crate::{align::HEADER_ALIGN, Pointer};

    fn to_layout(length: usize) -> alloc::Layout {
        alloc::Layout::from_size_align(length, HEADER_ALIGN).unwrap()
    }

    impl PlatformSpecificMemory for Platform {
        unsafe fn request_memory(length: usize) -> Pointer<u8> {
            // Zeroed to match what the real platforms hand out.
            NonNull::new(alloc::alloc_zeroed(to_layout(length)))
        }

        unsafe fn return_memory(address: NonNull<u8>, length: usize) {
            alloc::dealloc(address.as_ptr(), to_layout(length));
        }
    }
}
