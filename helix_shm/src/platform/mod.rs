//! Platform-specific shared memory operations.
//!
//! Currently Linux-only; the controller targets PREEMPT_RT kernels.

mod linux;

pub use linux::{attach_segment_mmap, attach_segment_mmap_fd, create_segment_mmap, get_current_pid};
