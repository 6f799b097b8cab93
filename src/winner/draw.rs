use rand::Rng;

/// Chooses the winning index among `len` candidates
pub trait WinnerPicker: Send + Sync {
    /// An index in `0..len`, or `None` when there is nobody to pick
    fn pick(&self, len: usize) -> Option<usize>;
}

/// Uniform draw from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformPicker;

impl WinnerPicker for UniformPicker {
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::rng().random_range(0..len))
    }
}

/// Pick the winning element of `items`, returning its index too
pub fn draw<'a, T>(picker: &dyn WinnerPicker, items: &'a [T]) -> Option<(usize, &'a T)> {
    let index = picker.pick(items.len())?;
    items.get(index).map(|item| (index, item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_winner() {
        assert_eq!(UniformPicker.pick(0), None);
        let empty: [u8; 0] = [];
        assert!(draw(&UniformPicker, &empty).is_none());
    }

    #[test]
    fn test_single_candidate_always_wins() {
        for _ in 0..100 {
            assert_eq!(UniformPicker.pick(1), Some(0));
        }
    }

    #[test]
    fn test_index_stays_in_bounds() {
        for len in 1..50 {
            for _ in 0..200 {
                let index = UniformPicker.pick(len).unwrap();
                assert!(index < len);
            }
        }
    }

    #[test]
    fn test_draws_are_roughly_uniform() {
        const BUCKETS: usize = 10;
        const DRAWS: usize = 100_000;
        let mut counts = [0usize; BUCKETS];
        for _ in 0..DRAWS {
            counts[UniformPicker.pick(BUCKETS).unwrap()] += 1;
        }
        let expected = DRAWS / BUCKETS;
        for count in counts {
            // 10% tolerance is many standard deviations at this sample size
            assert!(count.abs_diff(expected) < expected / 10, "counts: {counts:?}");
        }
    }

    #[test]
    fn test_draw_returns_matching_element() {
        let items = ["a", "b", "c"];
        let (index, item) = draw(&UniformPicker, &items).unwrap();
        assert_eq!(items[index], *item);
    }
}
