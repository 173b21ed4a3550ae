//! SwapFileStore - a [`PageStore`] backed by a flat file on disk.
//!
//! The file layout is as plain as it gets: page `p` lives at byte offset
//! `p * page_size * 8`, each word little-endian. Pages are written on flush
//! and the gap left by seeking past the end of the file reads as zeros.
//!
//! A load must leave the target untouched for pages that were never flushed,
//! so presence is tracked in a set rather than inferred from the file (a
//! flush of a high page number extends the file with zeros over lower,
//! never-flushed offsets).

use std::{
    collections::HashSet,
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    mem::size_of,
    path::Path,
};

use vmem::{PageStore, Word};

pub struct SwapFileStore {
    file: File,
    page_size: usize,
    present: HashSet<usize>,
}

impl SwapFileStore {
    /// Creates (or truncates) the swap file at `path` for pages of
    /// `page_size` words.
    pub fn create<P: AsRef<Path>>(path: &P, page_size: usize) -> std::io::Result<SwapFileStore> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(SwapFileStore {
            file,
            page_size,
            present: HashSet::new(),
        })
    }

    fn byte_offset(&self, page_number: usize) -> u64 {
        (page_number * self.page_size * size_of::<Word>()) as u64
    }
}

impl PageStore for SwapFileStore {
    fn load_page_into(&mut self, page_number: usize, target: &mut [Word]) {
        if !self.present.contains(&page_number) {
            return;
        }

        let mut buffer = vec![0u8; self.page_size * size_of::<Word>()];

        self.file
            .seek(SeekFrom::Start(self.byte_offset(page_number)))
            .unwrap();
        self.file.read_exact(&mut buffer).unwrap();

        for (word, chunk) in target.iter_mut().zip(buffer.chunks(size_of::<Word>())) {
            *word = Word::from_le_bytes(chunk.try_into().unwrap());
        }
    }

    fn flush_page(&mut self, page_number: usize, buffer: &[Word]) {
        let mut bytes = Vec::with_capacity(self.page_size * size_of::<Word>());
        for word in buffer {
            bytes.extend_from_slice(&word.to_le_bytes());
        }

        self.file
            .seek(SeekFrom::Start(self.byte_offset(page_number)))
            .unwrap();
        self.file.write_all(&bytes).unwrap();

        self.present.insert(page_number);
    }
}
