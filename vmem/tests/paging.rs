//! End-to-end translation behaviour through the public API.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use vmem::{MemStore, Mmu, PageStore, PoolMemory, Word};

/// A [`MemStore`] that additionally records the order in which pages are
/// swapped out, to observe the eviction policy from the outside.
#[derive(Default)]
struct RecordingStore {
    inner: MemStore,
    flushed: Vec<usize>,
}

impl PageStore for RecordingStore {
    fn load_page_into(&mut self, page_number: usize, target: &mut [Word]) {
        self.inner.load_page_into(page_number, target);
    }

    fn flush_page(&mut self, page_number: usize, buffer: &[Word]) {
        self.flushed.push(page_number);
        self.inner.flush_page(page_number, buffer);
    }
}

// page size 4, depth 2, 64 pages, 8 frames: saturates quickly
const OFFSET_WIDTH: usize = 2;
const TABLES_DEPTH: usize = 2;
const NUM_FRAMES: usize = 8;
const MEM_SIZE: usize = NUM_FRAMES * (1 << OFFSET_WIDTH);

type SmallMmu<S> = Mmu<OFFSET_WIDTH, TABLES_DEPTH, NUM_FRAMES, PoolMemory<MEM_SIZE, NUM_FRAMES, S>>;

fn saturate(mmu: &mut SmallMmu<RecordingStore>) {
    for (i, address) in (0..SmallMmu::<RecordingStore>::VIRTUAL_MEMORY_SIZE)
        .step_by(16)
        .enumerate()
    {
        mmu.write(address, i as Word).unwrap();
    }
}

#[test]
fn saturation_evicts_and_earlier_writes_survive_in_the_store() {
    let mut mmu = SmallMmu::new(PoolMemory::new(RecordingStore::default()));

    saturate(&mut mmu);

    let flushed = &mmu.memory().store().flushed;
    assert!(!flushed.is_empty(), "an 8-frame pool cannot hold 16 chains");

    for (i, address) in (0..SmallMmu::<RecordingStore>::VIRTUAL_MEMORY_SIZE)
        .step_by(16)
        .enumerate()
    {
        assert_eq!(mmu.read(address).unwrap(), i as Word);
    }
}

#[test]
fn eviction_order_is_deterministic() {
    let mut first = SmallMmu::new(PoolMemory::new(RecordingStore::default()));
    let mut second = SmallMmu::new(PoolMemory::new(RecordingStore::default()));

    saturate(&mut first);
    saturate(&mut second);

    assert_eq!(
        first.memory().store().flushed,
        second.memory().store().flushed
    );
}

#[test]
fn random_working_set_within_the_pool_round_trips() {
    // depth 1 with a 32-frame pool: the whole 16-page space stays resident,
    // so no write can be lost to a later restore
    type RoomyMmu = Mmu<2, 1, 32, PoolMemory<128, 32, MemStore>>;

    let mut mmu = RoomyMmu::new(PoolMemory::new(MemStore::new()));
    let mut rng = SmallRng::seed_from_u64(0x5EED);

    let mut expected = vec![0 as Word; RoomyMmu::VIRTUAL_MEMORY_SIZE];
    for _ in 0..1_000 {
        let address = rng.gen_range(0..RoomyMmu::VIRTUAL_MEMORY_SIZE);
        let value = rng.gen::<Word>();

        mmu.write(address, value).unwrap();
        expected[address] = value;
    }

    for (address, &value) in expected.iter().enumerate() {
        assert_eq!(mmu.read(address).unwrap(), value, "address {:#x}", address);
    }
}
