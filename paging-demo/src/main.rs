mod swap_file;

use log::info;
use vmem::{Mmu, PoolMemory};

// page size 16 words, three address bits-groups of 4, 4096 pages -- but only
// 16 physical frames, so hammering distant pages forces the eviction path
const OFFSET_WIDTH: usize = 4;
const TABLES_DEPTH: usize = 2;
const NUM_FRAMES: usize = 16;
const PAGE_SIZE: usize = 1 << OFFSET_WIDTH;
const MEM_SIZE: usize = NUM_FRAMES * PAGE_SIZE;

type DemoMmu = Mmu<OFFSET_WIDTH, TABLES_DEPTH, NUM_FRAMES, PoolMemory<MEM_SIZE, NUM_FRAMES, swap_file::SwapFileStore>>;

fn main() {
    env_logger::init();

    let store = swap_file::SwapFileStore::create(&"./swapfile.bin", PAGE_SIZE).unwrap();
    let mut mmu = DemoMmu::new(PoolMemory::new(store));

    info!(
        "address space: {} pages of {} words, {} physical frames",
        DemoMmu::NUM_PAGES,
        PAGE_SIZE,
        NUM_FRAMES
    );

    dbg!(mmu.write(0xCAFE, 0xD).unwrap());
    dbg!(mmu.read(0xCAFE).unwrap());
    dbg!(mmu.write(0xBEEF, 0x2).unwrap());
    dbg!(mmu.read(0xBEEF).unwrap());

    // walk far apart pages until the pool saturates and pages start going
    // to the swap file
    for page in 0..64 {
        let address = page * PAGE_SIZE;
        mmu.write(address, 0x1000 + page as u64).unwrap();
    }

    let mut intact = true;
    for page in 0..64 {
        let address = page * PAGE_SIZE;
        if mmu.read(address).unwrap() != 0x1000 + page as u64 {
            intact = false;
        }
    }

    dbg!(mmu.read(0xCAFE).unwrap());
    println!("64 pages written through a {}-frame pool, all intact: {}", NUM_FRAMES, intact);
}
