//! Splitting a virtual address into per-level table indices.

/// Splits `address` into `depth + 1` segments of `offset_width` bits each,
/// ordered root-to-leaf: segment 0 indexes the top-level table, the last
/// segment is the in-page offset.
pub fn decompose(mut address: usize, offset_width: usize, depth: usize) -> Vec<usize> {
    let mask = (1 << offset_width) - 1;
    let mut segments = vec![0; depth + 1];

    for segment in segments.iter_mut().rev() {
        *segment = address & mask;
        address >>= offset_width;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::decompose;

    fn recompose(segments: &[usize], offset_width: usize) -> usize {
        segments
            .iter()
            .fold(0, |acc, &segment| (acc << offset_width) | segment)
    }

    #[test]
    fn segments_are_root_to_leaf() {
        // 0b01_10_11 with 2-bit segments and depth 2
        let segments = decompose(0b011011, 2, 2);
        assert_eq!(segments, vec![0b01, 0b10, 0b11]);
    }

    #[test]
    fn segments_stay_below_page_size() {
        for address in 0..(1 << 9) {
            for segment in decompose(address, 3, 2) {
                assert!(segment < (1 << 3));
            }
        }
    }

    #[test]
    fn round_trip_covers_the_address_space() {
        let (offset_width, depth) = (2, 2);
        let virtual_memory_size = 1 << (offset_width * (depth + 1));

        for address in 0..virtual_memory_size {
            let segments = decompose(address, offset_width, depth);
            assert_eq!(segments.len(), depth + 1);
            assert_eq!(recompose(&segments, offset_width), address);
        }
    }
}
