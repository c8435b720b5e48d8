use crate::tag_array::{CacheAddressTranslation, TagArray};
use itertools::Itertools;

static LOGGER: std::sync::Once = std::sync::Once::new();

pub fn init_logging() {
    LOGGER.call_once(|| {
        env_logger::builder().is_test(true).init();
    });
}

/// Asserts that every set of a tag array is filled low to high, holds at
/// most `associativity` lines, and ranks its valid lines densely.
pub fn assert_rank_density<T>(tag_array: &TagArray<T>)
where
    T: CacheAddressTranslation,
{
    let associativity = tag_array.geometry().associativity;
    for (set_index, set) in tag_array.sets().enumerate() {
        assert_eq!(set.len(), associativity);
        let num_valid = set.iter().take_while(|line| line.valid).count();
        assert!(
            set[num_valid..].iter().all(|line| !line.valid),
            "set {set_index} has a valid line after an invalid one: {}",
            set.iter().join(", ")
        );
        let ranks: Vec<usize> = set[..num_valid]
            .iter()
            .map(|line| line.rank)
            .sorted()
            .collect();
        assert_eq!(
            ranks,
            (0..num_valid).collect::<Vec<_>>(),
            "set {set_index} has non-dense ranks: {}",
            set.iter().join(", ")
        );
    }
}
