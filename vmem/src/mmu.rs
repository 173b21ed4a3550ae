//! The translation driver: tree walk, frame allocation, eviction.
//!
//! Table geometry is fixed by const generic parameters. `OFFSET_WIDTH` bits
//! are consumed per tree level, so every table and every page holds
//! `PAGE_SIZE = 1 << OFFSET_WIDTH` words; `TABLES_DEPTH` is the number of
//! table levels above the leaf data pages, and `NUM_FRAMES` is the size of
//! the physical frame pool.

use std::fmt;

use log::{debug, trace};

use crate::addr::decompose;
use crate::evict::cyclic_distance;
use crate::phys::{PhysicalMemory, Word};

/// A virtual address outside the configured address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub address: usize,
    pub limit: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "virtual address {:#x} outside the {:#x}-word address space",
            self.address, self.limit
        )
    }
}

impl std::error::Error for OutOfRange {}

pub struct Mmu<
    const OFFSET_WIDTH: usize,
    const TABLES_DEPTH: usize,
    const NUM_FRAMES: usize,
    MEMORY: PhysicalMemory,
> {
    memory: MEMORY,
}

impl<const OFFSET_WIDTH: usize, const TABLES_DEPTH: usize, const NUM_FRAMES: usize, MEMORY>
    Mmu<OFFSET_WIDTH, TABLES_DEPTH, NUM_FRAMES, MEMORY>
where
    MEMORY: PhysicalMemory,
{
    pub const PAGE_SIZE: usize = 1 << OFFSET_WIDTH;
    pub const NUM_PAGES: usize = 1 << (OFFSET_WIDTH * (TABLES_DEPTH + 1));
    pub const VIRTUAL_MEMORY_SIZE: usize = Self::NUM_PAGES * Self::PAGE_SIZE;

    /// Frame 0 holds the root table for the whole lifetime of the address
    /// space. It is never reclaimed, never evicted, never handed out.
    const ROOT_FRAME: usize = 0;

    /// Takes ownership of the physical memory and zeroes the root table,
    /// establishing the empty-tree state.
    ///
    /// # Panics
    ///
    /// If `NUM_FRAMES <= TABLES_DEPTH` the pool cannot hold a full
    /// root-to-leaf table chain; this is a configuration error and aborts.
    pub fn new(memory: MEMORY) -> Self {
        assert!(
            NUM_FRAMES > TABLES_DEPTH,
            "frame pool of {} cannot hold a table chain of depth {}",
            NUM_FRAMES,
            TABLES_DEPTH
        );

        let mut mmu = Mmu { memory };
        mmu.zero_frame(Self::ROOT_FRAME);
        mmu
    }

    pub fn memory(&self) -> &MEMORY {
        &self.memory
    }

    /// Reads the word at `address`. Fails only if the address is outside
    /// the virtual address space; translation itself always succeeds,
    /// allocating and evicting as needed.
    pub fn read(&mut self, address: usize) -> Result<Word, OutOfRange> {
        self.check_range(address)?;

        let physical = self.translate(address);

        Ok(self.memory.read(physical))
    }

    /// Writes `value` to the word at `address`.
    pub fn write(&mut self, address: usize, value: Word) -> Result<(), OutOfRange> {
        self.check_range(address)?;

        let physical = self.translate(address);
        self.memory.write(physical, value);

        Ok(())
    }

    fn check_range(&self, address: usize) -> Result<(), OutOfRange> {
        if address >= Self::VIRTUAL_MEMORY_SIZE {
            return Err(OutOfRange {
                address,
                limit: Self::VIRTUAL_MEMORY_SIZE,
            });
        }

        Ok(())
    }

    fn word_address(frame_index: usize, offset: usize) -> usize {
        frame_index * Self::PAGE_SIZE + offset
    }

    /// Walks the table tree for `address`, extending it level by level where
    /// entries are unmapped, and returns the physical address of the word.
    ///
    /// The leaf page is restored from backing storage on every translation,
    /// resident or not.
    fn translate(&mut self, address: usize) -> usize {
        let segments = decompose(address, OFFSET_WIDTH, TABLES_DEPTH);

        trace!(
            "mmu: access addr {:#x} page={:#x} segments={:?}",
            address,
            address >> OFFSET_WIDTH,
            segments
        );

        let mut frame = Self::ROOT_FRAME;
        for &segment in &segments[..TABLES_DEPTH] {
            let slot = Self::word_address(frame, segment);
            let mut next = self.memory.read(slot) as usize;

            if next == 0 {
                // the table currently being filled must not be reclaimed
                // out from under this walk
                next = self.obtain_frame(address, frame);
                self.memory.write(slot, next as Word);

                debug!("mmu: mapped frame {} at row {} of table frame {}", next, segment, frame);
            }

            frame = next;
        }

        self.memory.restore(frame, address >> OFFSET_WIDTH);

        Self::word_address(frame, segments[TABLES_DEPTH])
    }

    /// Produces a frame in `[1, NUM_FRAMES)` whose words are all zero, to be
    /// used as a fresh table or data page: an empty table is reclaimed if
    /// one exists, else the next never-used frame, else the frame freed by
    /// evicting the resident page cyclically farthest from `address`'s page.
    fn obtain_frame(&mut self, address: usize, protected_frame: usize) -> usize {
        let frame = match self.reclaim_empty_table(Self::ROOT_FRAME, protected_frame, TABLES_DEPTH) {
            0 => {
                let next_unused = self.highest_allocated_frame() + 1;

                if next_unused < NUM_FRAMES {
                    next_unused
                } else {
                    self.evict_farthest_page(address >> OFFSET_WIDTH)
                }
            }
            reclaimed => {
                debug!("mmu: reclaimed empty table frame {}", reclaimed);
                reclaimed
            }
        };

        self.zero_frame(frame);

        frame
    }

    fn zero_frame(&mut self, frame_index: usize) {
        for row in 0..Self::PAGE_SIZE {
            self.memory.write(Self::word_address(frame_index, row), 0);
        }
    }

    /// The highest frame index referenced anywhere in the tree, with the
    /// root's index 0 as the floor. `+ 1` is the next never-used frame while
    /// the pool still has headroom.
    fn highest_allocated_frame(&self) -> usize {
        self.max_frame_in_subtree(Self::ROOT_FRAME, TABLES_DEPTH)
    }

    fn max_frame_in_subtree(&self, frame_index: usize, depth: usize) -> usize {
        if depth == 0 {
            return frame_index;
        }

        let mut max_found = frame_index;
        for row in 0..Self::PAGE_SIZE {
            let entry = self.memory.read(Self::word_address(frame_index, row)) as usize;
            if entry == 0 {
                continue;
            }

            max_found = max_found.max(self.max_frame_in_subtree(entry, depth - 1));
        }

        max_found
    }

    /// Post-order search for a table frame whose entries are all zero. When
    /// one is found, the parent entry pointing at it is cleared and its index
    /// propagated up; the search stops at the first hit. Returns 0 when
    /// nothing is reclaimable (0 can never denote a reclaimable table, being
    /// the root). `protected_frame` is skipped.
    fn reclaim_empty_table(
        &mut self,
        frame_index: usize,
        protected_frame: usize,
        depth: usize,
    ) -> usize {
        // data pages are not tables
        if depth == 0 {
            return 0;
        }

        let mut is_empty = true;
        let mut reclaimed = 0;
        for row in 0..Self::PAGE_SIZE {
            let slot = Self::word_address(frame_index, row);
            let entry = self.memory.read(slot) as usize;
            if entry == 0 {
                continue;
            }
            is_empty = false;

            reclaimed = self.reclaim_empty_table(entry, protected_frame, depth - 1);
            if reclaimed == 0 {
                continue;
            }
            if reclaimed == entry {
                // the reclaimed table is our direct child: unlink it
                self.memory.write(slot, 0);
            }
            break;
        }

        if is_empty && frame_index != protected_frame {
            return frame_index;
        }

        reclaimed
    }

    /// Full-pool path: picks the resident page maximizing cyclic distance to
    /// `target_page` (first maximum in traversal order wins), clears its
    /// mapping entry, swaps it out, and returns the freed frame.
    fn evict_farthest_page(&mut self, target_page: usize) -> usize {
        let mut candidates = Vec::with_capacity(NUM_FRAMES);
        self.collect_resident_pages(Self::ROOT_FRAME, TABLES_DEPTH, 0, &mut candidates);

        let mut max_distance = 0;
        let mut victim = (0, 0);
        for &(page, table_frame) in &candidates {
            let distance = cyclic_distance(page, target_page, Self::NUM_PAGES);
            if distance > max_distance {
                max_distance = distance;
                victim = (page, table_frame);
            }
        }
        let (victim_page, table_frame) = victim;

        let row = victim_page & (Self::PAGE_SIZE - 1);
        let slot = Self::word_address(table_frame, row);
        let victim_frame = self.memory.read(slot) as usize;
        self.memory.write(slot, 0);

        debug!(
            "mmu: pool full, evicting page {:#x} from frame {} (distance {} to page {:#x})",
            victim_page, victim_frame, max_distance, target_page
        );

        self.memory.evict(victim_frame, victim_page);

        victim_frame
    }

    /// Collects every resident leaf page and the table frame holding its
    /// mapping entry, rows visited low-to-high at every level. The victim
    /// tie break depends on this order.
    fn collect_resident_pages(
        &self,
        frame_index: usize,
        depth: usize,
        page_prefix: usize,
        out: &mut Vec<(usize, usize)>,
    ) {
        for row in 0..Self::PAGE_SIZE {
            let entry = self.memory.read(Self::word_address(frame_index, row)) as usize;
            if entry == 0 {
                continue;
            }

            let page = (page_prefix << OFFSET_WIDTH) | row;
            if depth == 1 {
                out.push((page, frame_index));
            } else {
                self.collect_resident_pages(entry, depth - 1, page, out);
            }
        }
    }
}
