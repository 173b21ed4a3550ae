//! Victim selection metric for the eviction policy.

/// Distance between two page numbers on a ring of `num_pages` pages.
///
/// The victim chosen on a full frame pool is the resident page maximizing
/// this distance to the page being faulted in.
pub fn cyclic_distance(page1: usize, page2: usize, num_pages: usize) -> usize {
    let distance = page1.abs_diff(page2);
    distance.min(num_pages - distance)
}

#[cfg(test)]
mod tests {
    use super::cyclic_distance;

    const NUM_PAGES: usize = 64;

    #[test]
    fn distance_to_self_is_zero() {
        for page in 0..NUM_PAGES {
            assert_eq!(cyclic_distance(page, page, NUM_PAGES), 0);
        }
    }

    #[test]
    fn symmetric_and_bounded_by_half_the_ring() {
        for p1 in 0..NUM_PAGES {
            for p2 in 0..NUM_PAGES {
                let d = cyclic_distance(p1, p2, NUM_PAGES);
                assert_eq!(d, cyclic_distance(p2, p1, NUM_PAGES));
                assert!(d <= NUM_PAGES / 2);
            }
        }
    }

    #[test]
    fn wraps_around_the_ring() {
        assert_eq!(cyclic_distance(0, NUM_PAGES - 1, NUM_PAGES), 1);
        assert_eq!(cyclic_distance(1, NUM_PAGES - 2, NUM_PAGES), 3);
        assert_eq!(cyclic_distance(0, NUM_PAGES / 2, NUM_PAGES), NUM_PAGES / 2);
    }
}
