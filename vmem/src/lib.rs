//! Emulation of a hierarchical (multi-level) virtual memory unit.
//!
//! The page-table tree lives *inside* the emulated physical memory: frame 0
//! is the root table, and every non-zero table entry is the frame index of
//! the next-level table (or, at the last level, of a leaf data page). Tables
//! are allocated on demand during translation; when the frame pool runs out,
//! a victim page is evicted to backing storage and its frame reused.

pub mod addr;
pub mod evict;
pub mod mmu;
pub mod phys;

pub use crate::mmu::{Mmu, OutOfRange};
pub use crate::phys::{MemStore, PageStore, PhysicalMemory, PoolMemory, Word};
