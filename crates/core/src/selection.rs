use rand::Rng;

use crate::domain::business::Business;

/// Uniform index in `[0, len)`, or `None` for an empty list.
pub fn pick_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    (len > 0).then(|| rng.gen_range(0..len))
}

pub fn choose_business<'a, R: Rng + ?Sized>(
    businesses: &'a [Business],
    rng: &mut R,
) -> Option<&'a Business> {
    pick_index(businesses.len(), rng).and_then(|index| businesses.get(index))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{choose_business, pick_index};
    use crate::domain::business::Business;

    #[test]
    fn pick_index_stays_in_bounds_for_every_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 1..=64 {
            for _ in 0..200 {
                let index = pick_index(len, &mut rng).expect("non-empty list yields an index");
                assert!(index < len, "index {index} out of range for len {len}");
            }
        }
    }

    #[test]
    fn single_element_list_always_yields_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(pick_index(1, &mut rng), Some(0));
        }
    }

    #[test]
    fn empty_list_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick_index(0, &mut rng), None);
        assert!(choose_business(&[], &mut rng).is_none());
    }

    #[test]
    fn selection_reaches_every_entry() {
        let businesses: Vec<Business> = (0..5)
            .map(|i| Business::new(format!("bar-{i}"), format!("https://bar/{i}"), "img"))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);

        let seen: HashSet<String> = (0..500)
            .filter_map(|_| choose_business(&businesses, &mut rng))
            .map(|business| business.name.clone())
            .collect();

        assert_eq!(seen.len(), businesses.len());
    }
}
