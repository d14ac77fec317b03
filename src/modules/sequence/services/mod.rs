pub mod allocator;

pub use allocator::{LockedAllocator, ScanAllocator, SequenceAllocator};
