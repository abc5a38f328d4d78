//! Segment header and raw mapped-segment access.
//!
//! Shared memory layout is: `SegmentHeader | payload`. The header is written
//! once when a module publishes the segment; its identity fields
//! (`type_id`, `layout_version`, `payload_size`) are never mutated
//! afterwards. Update metadata (`num_updates`, `last_updated_*`) is mutated
//! only through [`SegmentHeader::updated_at`].

use crate::error::{ShmError, ShmResult};
use crate::platform;
use memmap2::MmapMut;
use static_assertions::const_assert_eq;
use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Magic bytes identifying a valid Helix interface segment.
pub const SEGMENT_MAGIC: [u8; 8] = *b"HELIXSHM";

/// Segment layout version compiled into this binary.
///
/// A handle may only be constructed over a segment whose header version
/// equals this value; the check is the only defense against a stale module
/// talking to a newer or older controller.
pub const SEGMENT_VERSION: u32 = 2;

/// Maximum length of a type id string, excluding the NUL terminator.
pub const MAX_TYPE_ID: usize = 31;

/// Size of the segment header in bytes. The payload starts at this offset.
pub const HEADER_SIZE: usize = core::mem::size_of::<SegmentHeader>();

/// Per-segment header — 128 bytes, cache-line aligned.
#[repr(C, align(64))]
pub struct SegmentHeader {
    /// Magic bytes: must be [`SEGMENT_MAGIC`].
    magic: [u8; 8],
    /// Segment layout version; must equal [`SEGMENT_VERSION`].
    layout_version: u32,
    _pad0: u32,
    /// Interface type id, NUL-padded.
    type_id: [u8; 32],
    /// Payload size in bytes (excludes this header).
    payload_size: u64,
    /// Number of updates made to the payload.
    num_updates: AtomicU64,
    /// Monotonic time of the last update [ns].
    last_updated_ns: AtomicU64,
    /// Control cycle of the last update.
    last_updated_cycle: AtomicU64,
    /// Number of attached read-only handles.
    reader_count: AtomicU32,
    /// Number of attached read-write handles.
    writer_count: AtomicU32,
    _pad1: [u8; 40],
}

const_assert_eq!(core::mem::size_of::<SegmentHeader>(), 128);
const_assert_eq!(core::mem::align_of::<SegmentHeader>(), 64);

impl SegmentHeader {
    /// Create a header for a freshly published segment.
    ///
    /// # Panics
    /// Panics if `type_id` exceeds [`MAX_TYPE_ID`] bytes; type ids are
    /// compile-time constants, so this is a programming error.
    pub fn new(type_id: &str, payload_size: usize) -> Self {
        assert!(
            type_id.len() <= MAX_TYPE_ID,
            "type id '{type_id}' exceeds {MAX_TYPE_ID} bytes"
        );
        let mut id = [0u8; 32];
        id[..type_id.len()].copy_from_slice(type_id.as_bytes());

        Self {
            magic: SEGMENT_MAGIC,
            layout_version: SEGMENT_VERSION,
            _pad0: 0,
            type_id: id,
            payload_size: payload_size as u64,
            num_updates: AtomicU64::new(0),
            last_updated_ns: AtomicU64::new(0),
            last_updated_cycle: AtomicU64::new(0),
            reader_count: AtomicU32::new(0),
            writer_count: AtomicU32::new(0),
            _pad1: [0; 40],
        }
    }

    /// Validate the magic bytes.
    pub fn check_magic(&self, name: &str) -> ShmResult<()> {
        if self.magic != SEGMENT_MAGIC {
            return Err(ShmError::ValidationError {
                interface: name.to_string(),
                reason: "segment header magic is invalid".to_string(),
            });
        }
        Ok(())
    }

    /// Layout version stored in the segment.
    pub fn layout_version(&self) -> u32 {
        self.layout_version
    }

    /// Type id stored in the segment, with NUL padding stripped.
    pub fn type_id(&self) -> &str {
        let end = self
            .type_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.type_id.len());
        core::str::from_utf8(&self.type_id[..end]).unwrap_or("")
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload_size as usize
    }

    /// Marks the time and control cycle at which the payload was updated
    /// and increments the update counter.
    pub fn updated_at(&self, time_ns: u64, cycle: u64) {
        self.last_updated_ns.store(time_ns, Ordering::Release);
        self.last_updated_cycle.store(cycle, Ordering::Release);
        self.num_updates.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of updates made to the payload. Helps detect missing updates.
    pub fn num_updates(&self) -> u64 {
        self.num_updates.load(Ordering::Acquire)
    }

    /// Monotonic time of the last update [ns]. Helps detect stale data.
    pub fn last_updated_ns(&self) -> u64 {
        self.last_updated_ns.load(Ordering::Acquire)
    }

    /// Control cycle of the last update. Compared against the cycle counter
    /// interface by strict handles.
    pub fn last_updated_cycle(&self) -> u64 {
        self.last_updated_cycle.load(Ordering::Acquire)
    }

    /// Increment the read-only handle refcount.
    pub fn add_reader(&self) -> u32 {
        self.reader_count.fetch_add(1, Ordering::AcqRel)
    }

    /// Decrement the read-only handle refcount.
    pub fn remove_reader(&self) -> u32 {
        self.reader_count.fetch_sub(1, Ordering::AcqRel)
    }

    /// Increment the read-write handle refcount.
    pub fn add_writer(&self) -> u32 {
        self.writer_count.fetch_add(1, Ordering::AcqRel)
    }

    /// Decrement the read-write handle refcount.
    pub fn remove_writer(&self) -> u32 {
        self.writer_count.fetch_sub(1, Ordering::AcqRel)
    }

    /// Current read-only handle count.
    pub fn reader_count(&self) -> u32 {
        self.reader_count.load(Ordering::Acquire)
    }

    /// Current read-write handle count.
    pub fn writer_count(&self) -> u32 {
        self.writer_count.load(Ordering::Acquire)
    }
}

/// Monotonic clock sample [ns], used for segment update stamps.
pub fn monotonic_ns() -> u64 {
    use nix::time::{ClockId, clock_gettime};
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => ts.tv_sec() as u64 * 1_000_000_000 + ts.tv_nsec() as u64,
        Err(_) => 0,
    }
}

/// A mapped interface segment: header plus payload.
///
/// Segments are created and initialized by a `SegmentRegistry`; this type
/// only carries the mapping. Handles share one `MappedSegment` per
/// interface via `Arc`, so a mapping is established at most once per
/// process and registry.
pub struct MappedSegment {
    name: String,
    // Keeps the mapping alive; all access goes through the raw pointers
    // below because header atomics and payload writes are interior
    // mutations of shared memory.
    _mmap: MmapMut,
    header: *const SegmentHeader,
    payload: *mut u8,
    payload_len: usize,
}

// SAFETY: the header is only accessed through atomics after construction,
// and payload consistency between a single writer and readers is the
// application's responsibility (single-writer-per-interface contract),
// exactly as for the underlying shared memory itself.
unsafe impl Send for MappedSegment {}
unsafe impl Sync for MappedSegment {}

impl MappedSegment {
    /// Create and initialize a new segment file at `path`.
    ///
    /// Writes a fresh [`SegmentHeader`] for `type_id`; the payload is
    /// zeroed and sized to `payload_size`.
    pub fn create(
        name: &str,
        path: &str,
        type_id: &str,
        payload_size: usize,
    ) -> ShmResult<Self> {
        let total = HEADER_SIZE + payload_size;
        let mut mmap = platform::create_segment_mmap(path, total).map_err(|e| match e {
            ShmError::Io { source } if source.kind() == std::io::ErrorKind::AlreadyExists => {
                ShmError::AlreadyExists {
                    name: name.to_string(),
                }
            }
            other => other,
        })?;

        // SAFETY: the mapping is page-aligned and at least HEADER_SIZE bytes.
        unsafe {
            let header = mmap.as_mut_ptr() as *mut SegmentHeader;
            header.write(SegmentHeader::new(type_id, payload_size));
        }

        Ok(Self::from_mmap(name, mmap, payload_size))
    }

    /// Map an existing segment file at `path`.
    pub fn attach(name: &str, path: &str) -> ShmResult<Self> {
        let mmap = platform::attach_segment_mmap(path).map_err(|e| match e {
            ShmError::Io { source } if source.kind() == std::io::ErrorKind::NotFound => {
                ShmError::NotFound {
                    name: name.to_string(),
                }
            }
            other => other,
        })?;
        Self::attach_mmap(name, mmap)
    }

    /// Map an existing segment from an out-of-band descriptor.
    pub fn attach_fd(name: &str, fd: BorrowedFd<'_>) -> ShmResult<Self> {
        let mmap = platform::attach_segment_mmap_fd(fd)?;
        Self::attach_mmap(name, mmap)
    }

    fn attach_mmap(name: &str, mmap: MmapMut) -> ShmResult<Self> {
        if mmap.len() < HEADER_SIZE {
            return Err(ShmError::InvalidSize {
                name: name.to_string(),
                size: mmap.len(),
                required: HEADER_SIZE,
            });
        }
        // SAFETY: length checked above; mapping is page-aligned.
        let header = unsafe { &*(mmap.as_ptr() as *const SegmentHeader) };
        header.check_magic(name)?;

        let payload_len = header.payload_size();
        if mmap.len() < HEADER_SIZE + payload_len {
            return Err(ShmError::InvalidSize {
                name: name.to_string(),
                size: mmap.len(),
                required: HEADER_SIZE + payload_len,
            });
        }

        Ok(Self::from_mmap(name, mmap, payload_len))
    }

    fn from_mmap(name: &str, mut mmap: MmapMut, payload_len: usize) -> Self {
        let base = mmap.as_mut_ptr();
        Self {
            name: name.to_string(),
            header: base as *const SegmentHeader,
            // SAFETY: mapping holds HEADER_SIZE + payload_len bytes.
            payload: unsafe { base.add(HEADER_SIZE) },
            payload_len,
            _mmap: mmap,
        }
    }

    /// Interface name this segment was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The segment header.
    pub fn header(&self) -> &SegmentHeader {
        // SAFETY: header pointer is valid for the lifetime of the mapping.
        unsafe { &*self.header }
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        // SAFETY: payload pointer + length are valid for the mapping lifetime.
        unsafe { core::slice::from_raw_parts(self.payload, self.payload_len) }
    }

    /// Mutable payload bytes.
    ///
    /// # Safety
    /// The caller must hold the write side of the single-writer contract:
    /// at most one thread mutates the payload of an interface at a time.
    /// Readers may observe torn values mid-write; strict handles detect
    /// staleness via the cycle counter rather than locking.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn payload_mut(&self) -> &mut [u8] {
        // SAFETY: see above; pointer + length are valid for the mapping.
        unsafe { core::slice::from_raw_parts_mut(self.payload, self.payload_len) }
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_one_cache_line_pair() {
        assert_eq!(core::mem::size_of::<SegmentHeader>(), 128);
        assert_eq!(HEADER_SIZE, 128);
    }

    #[test]
    fn header_identity_fields() {
        let header = SegmentHeader::new("helix.joint_state", 256);
        assert!(header.check_magic("t").is_ok());
        assert_eq!(header.layout_version(), SEGMENT_VERSION);
        assert_eq!(header.type_id(), "helix.joint_state");
        assert_eq!(header.payload_size(), 256);
        assert_eq!(header.num_updates(), 0);
    }

    #[test]
    fn updated_at_stamps_and_counts() {
        let header = SegmentHeader::new("t", 8);
        header.updated_at(1234, 7);
        assert_eq!(header.last_updated_ns(), 1234);
        assert_eq!(header.last_updated_cycle(), 7);
        assert_eq!(header.num_updates(), 1);

        header.updated_at(5678, 8);
        assert_eq!(header.num_updates(), 2);
        assert_eq!(header.last_updated_cycle(), 8);
    }

    #[test]
    fn refcounts_track_handles() {
        let header = SegmentHeader::new("t", 8);
        header.add_reader();
        header.add_reader();
        header.add_writer();
        assert_eq!(header.reader_count(), 2);
        assert_eq!(header.writer_count(), 1);
        header.remove_reader();
        assert_eq!(header.reader_count(), 1);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn overlong_type_id_panics() {
        let _ = SegmentHeader::new(&"x".repeat(64), 8);
    }

    #[test]
    fn create_then_attach_preserves_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg").to_string_lossy().into_owned();

        let created = MappedSegment::create("imu", &path, "helix.imu", 512).unwrap();
        created.header().updated_at(99, 3);
        drop(created);

        let attached = MappedSegment::attach("imu", &path).unwrap();
        assert_eq!(attached.header().type_id(), "helix.imu");
        assert_eq!(attached.header().last_updated_cycle(), 3);
        assert_eq!(attached.payload_len(), 512);
    }

    #[test]
    fn attach_rejects_truncated_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny").to_string_lossy().into_owned();
        std::fs::write(&path, [0u8; 32]).unwrap();

        let result = MappedSegment::attach("tiny", &path);
        assert!(matches!(result, Err(ShmError::InvalidSize { .. })));
    }

    #[test]
    fn monotonic_clock_advances() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
        assert!(a > 0);
    }
}
