//! The physical memory the translation core runs against.
//!
//! The core only ever talks to the [`PhysicalMemory`] trait: word-level
//! access into the frame pool plus page-granular swap traffic. [`PoolMemory`]
//! is the stock implementation — an owned word buffer split into frames, with
//! the swap side delegated to a [`PageStore`].

use std::collections::HashMap;
use std::ops::Range;

/// One machine word of emulated memory. Table entries are stored as words
/// too: 0 means unmapped, anything else is a frame index.
pub type Word = u64;

/// Word read/write by physical address (`frame_index * page_size + offset`),
/// plus page swap-out/swap-in keyed by logical page number.
pub trait PhysicalMemory {
    fn read(&self, address: usize) -> Word;

    fn write(&mut self, address: usize, value: Word);

    /// Persist `frame_index`'s contents to backing storage under
    /// `page_number`, before the frame is reused.
    fn evict(&mut self, frame_index: usize, page_number: usize);

    /// Load backing-storage contents for `page_number` into `frame_index`.
    /// A restore is issued on every translation, resident page or not, so a
    /// page without stored contents must leave the frame as it is.
    fn restore(&mut self, frame_index: usize, page_number: usize);
}

/// Backing storage for swapped-out pages.
pub trait PageStore {
    /// Copies the stored contents of `page_number` into `target`. A page
    /// that was never flushed has no stored contents and must leave `target`
    /// untouched (a freshly zeroed frame then still reads as zeros).
    fn load_page_into(&mut self, page_number: usize, target: &mut [Word]);

    fn flush_page(&mut self, page_number: usize, buffer: &[Word]);
}

/// In-memory [`PageStore`] keeping flushed pages in a map. Handy for tests
/// and for running the translation core without a swap file.
#[derive(Default)]
pub struct MemStore {
    pages: HashMap<usize, Vec<Word>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

impl PageStore for MemStore {
    fn load_page_into(&mut self, page_number: usize, target: &mut [Word]) {
        if let Some(page) = self.pages.get(&page_number) {
            target.copy_from_slice(page);
        }
    }

    fn flush_page(&mut self, page_number: usize, buffer: &[Word]) {
        self.pages.insert(page_number, buffer.to_vec());
    }
}

/// A flat pool of `FRAME_COUNT` identical frames inside a `MEM_SIZE`-word
/// buffer, swapping pages through `STORE`.
pub struct PoolMemory<const MEM_SIZE: usize, const FRAME_COUNT: usize, STORE: PageStore> {
    words: [Word; MEM_SIZE],
    store: STORE,
}

impl<const MEM_SIZE: usize, const FRAME_COUNT: usize, STORE> PoolMemory<MEM_SIZE, FRAME_COUNT, STORE>
where
    STORE: PageStore,
{
    pub fn new(store: STORE) -> Self {
        PoolMemory {
            words: [0; MEM_SIZE],
            store,
        }
    }

    pub fn store(&self) -> &STORE {
        &self.store
    }

    fn frame_idx_to_range(frame_idx: usize) -> Range<usize> {
        let frame_size = MEM_SIZE / FRAME_COUNT;

        Range {
            start: frame_idx * frame_size,
            end: (frame_idx + 1) * frame_size,
        }
    }
}

impl<const MEM_SIZE: usize, const FRAME_COUNT: usize, STORE> PhysicalMemory
    for PoolMemory<MEM_SIZE, FRAME_COUNT, STORE>
where
    STORE: PageStore,
{
    fn read(&self, address: usize) -> Word {
        self.words[address]
    }

    fn write(&mut self, address: usize, value: Word) {
        self.words[address] = value;
    }

    fn evict(&mut self, frame_index: usize, page_number: usize) {
        let frame = &self.words[Self::frame_idx_to_range(frame_index)];

        self.store.flush_page(page_number, frame);
    }

    fn restore(&mut self, frame_index: usize, page_number: usize) {
        let frame = &mut self.words[Self::frame_idx_to_range(frame_index)];

        self.store.load_page_into(page_number, frame);
    }
}
