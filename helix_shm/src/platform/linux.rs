//! Linux-specific shared memory operations.

use crate::error::ShmResult;
use memmap2::{MmapMut, MmapOptions};
use nix::unistd::getpid;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::OpenOptionsExt;

/// Create a new shared memory file and map it read-write.
///
/// The file is created exclusively (0600) and sized to `size` bytes. Pages
/// are populated eagerly so the control cycle never takes a page fault on
/// first access.
pub fn create_segment_mmap(path: &str, size: usize) -> ShmResult<MmapMut> {
    let file = OpenOptions::new()
        .create_new(true)
        .read(true)
        .write(true)
        .mode(0o600)
        .open(path)?;

    file.set_len(size as u64)?;

    let mmap = unsafe { MmapOptions::new().populate().map_mut(&file)? };
    Ok(mmap)
}

/// Map an existing shared memory file.
///
/// The mapping is always read-write: even read-only handles update the
/// reader refcount in the shared header. Access-mode policy is enforced at
/// the registry level, not at the mapping level.
pub fn attach_segment_mmap(path: &str) -> ShmResult<MmapMut> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    attach_segment_mmap_fd(file.as_fd())
}

/// Map an existing shared memory segment from an already-open descriptor.
///
/// Used when segment descriptors arrive out-of-band (e.g. passed over a
/// domain socket by a supervising process) instead of by path.
pub fn attach_segment_mmap_fd(fd: BorrowedFd<'_>) -> ShmResult<MmapMut> {
    let file = File::from(fd.try_clone_to_owned()?);
    let mmap = unsafe { MmapOptions::new().populate().map_mut(&file)? };
    Ok(mmap)
}

/// Get current process ID.
pub fn get_current_pid() -> u32 {
    getpid().as_raw() as u32
}
