//! # Partitioner
//!
//! Splits the example list into train, validation and test sets by position,
//! moves elements across the two internal boundaries so that sibling
//! statements of one source file are not split, and finally shuffles each
//! set on its own.
//!
//! The input is expected to be ordered so that occurrences from the same
//! file are contiguous. Rebalancing fixes the two cut boundaries only. When
//! the validation set is empty the two cuts coincide and train is
//! rebalanced against test directly.

use crate::{LogOccurrence, LoggraphError};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;

// =============================================================================
// GROUP KEY
// =============================================================================

/// Grouping key of a graph path: the file name with the digit run at the end
/// of its stem removed.
///
/// `src/Foo12.java.proto` and `other/Foo3.java.proto` share the key
/// `Foo.java.proto`; generated corpora number sibling files that way.
#[must_use]
pub fn group_key(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    let (stem, extension) = match name.find('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name.as_str(), ""),
    };
    let trimmed = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    format!("{}{}", trimmed, extension)
}

/// Items that belong to a source-file group.
pub trait Grouped {
    fn group_key(&self) -> String;
}

impl Grouped for LogOccurrence {
    fn group_key(&self) -> String {
        group_key(&self.graph_path)
    }
}

// =============================================================================
// SPLIT
// =============================================================================

/// The three partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Split<T> {
    #[must_use]
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// Shuffle every partition independently.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.train.shuffle(rng);
        self.validation.shuffle(rng);
        self.test.shuffle(rng);
    }
}

/// Absolute cut positions for `n` items.
///
/// The test cut is `floor(train_fraction * n)`. The validation cut is
/// `floor((1 - validation_fraction) * n)`, measured against the full `n` and
/// clamped to the test cut.
#[allow(clippy::float_arithmetic)]
#[must_use]
pub fn cut_points(n: usize, train_fraction: f64, validation_fraction: f64) -> (usize, usize) {
    let total = n as f64;
    let test_cut = ((train_fraction * total).floor() as usize).min(n);
    let validation_cut = (((1.0 - validation_fraction) * total).floor() as usize).min(test_cut);
    (test_cut, validation_cut)
}

/// Cut `items` by position and rebalance both boundaries. No shuffling.
///
/// Fails with [`LoggraphError::PartitionTooSmall`] when rebalancing would
/// drain the later partition of a boundary.
pub fn split_by_position<T: Grouped>(
    items: Vec<T>,
    train_fraction: f64,
    validation_fraction: f64,
) -> Result<Split<T>, LoggraphError> {
    let (test_cut, validation_cut) = cut_points(items.len(), train_fraction, validation_fraction);

    let mut train = items;
    let test = train.split_off(test_cut);
    let validation = train.split_off(validation_cut);

    let mut split = Split {
        train,
        validation,
        test,
    };
    rebalance(&mut split.train, &mut split.validation, "validation")?;
    if split.validation.is_empty() {
        rebalance(&mut split.train, &mut split.test, "test")?;
    } else {
        rebalance(&mut split.validation, &mut split.test, "test")?;
    }
    Ok(split)
}

/// Partition `items` and shuffle each partition with `rng`.
pub fn partition<T: Grouped, R: Rng + ?Sized>(
    items: Vec<T>,
    train_fraction: f64,
    validation_fraction: f64,
    rng: &mut R,
) -> Result<Split<T>, LoggraphError> {
    let mut split = split_by_position(items, train_fraction, validation_fraction)?;
    split.shuffle(rng);
    Ok(split)
}

/// Move leading elements of `later` to the end of `earlier` while they share
/// the group of `earlier`'s last element.
///
/// Empty sides have no boundary and are left alone.
fn rebalance<T: Grouped>(
    earlier: &mut Vec<T>,
    later: &mut Vec<T>,
    later_name: &'static str,
) -> Result<(), LoggraphError> {
    let Some(last) = earlier.last() else {
        return Ok(());
    };
    let key = last.group_key();

    let moved = later
        .iter()
        .take_while(|item| item.group_key() == key)
        .count();
    if moved == 0 {
        return Ok(());
    }
    if moved == later.len() {
        return Err(LoggraphError::PartitionTooSmall(later_name));
    }
    earlier.extend(later.drain(..moved));
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Item(&'static str, usize);

    impl Grouped for Item {
        fn group_key(&self) -> String {
            group_key(self.0)
        }
    }

    fn distinct(n: usize) -> Vec<Item> {
        const NAMES: [&str; 12] = [
            "A.java", "B.java", "C.java", "D.java", "E.java", "F.java", "G.java", "H.java",
            "I.java", "J.java", "K.java", "L.java",
        ];
        (0..n).map(|i| Item(NAMES[i], i)).collect()
    }

    #[test]
    fn group_key_strips_trailing_digits_of_stem() {
        assert_eq!(group_key("corpus/app/Foo12.java.proto"), "Foo.java.proto");
        assert_eq!(group_key("Foo.java.proto"), "Foo.java.proto");
        assert_eq!(group_key("x/Foo3"), "Foo");
        assert_eq!(group_key("v2Parser7.java"), "v2Parser.java");
        assert_eq!(group_key("proj/.hidden1"), ".hidden");
    }

    #[test]
    fn cut_points_use_full_length_for_validation() {
        assert_eq!(cut_points(10, 0.8, 0.2), (8, 8));
        assert_eq!(cut_points(100, 0.8, 0.3), (80, 70));
        // Validation cut beyond the test cut is clamped.
        assert_eq!(cut_points(10, 0.5, 0.1), (5, 5));
        assert_eq!(cut_points(0, 0.8, 0.2), (0, 0));
    }

    #[test]
    fn ten_distinct_items_follow_position_cuts() {
        let split = split_by_position(distinct(10), 0.8, 0.2).expect("split");
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.validation.len(), 0);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.test[0].1, 8);
    }

    #[test]
    fn siblings_straddling_train_cut_stay_in_train() {
        let mut items = distinct(10);
        items[6] = Item("Shared1.java", 6);
        items[7] = Item("Shared2.java", 7);
        // Test cut 9, validation cut 7: Shared1 ends train, Shared2 starts validation.
        let split = split_by_position(items, 0.9, 0.25).expect("split");
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.train.last().map(|i| i.1), Some(7));
        assert_eq!(split.validation.len(), 1);
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn siblings_straddling_coinciding_cuts_stay_in_train() {
        let mut items = distinct(10);
        items[7] = Item("Shared1.java", 7);
        items[8] = Item("Shared2.java", 8);
        // Both cuts at 8: Shared1 ends train, Shared2 starts test.
        let split = split_by_position(items, 0.8, 0.2).expect("split");
        assert_eq!(split.train.len(), 9);
        assert_eq!(split.train.last().map(|i| i.1), Some(8));
        assert!(split.validation.is_empty());
        assert_eq!(split.test, vec![Item("J.java", 9)]);
    }

    #[test]
    fn draining_test_across_empty_validation_is_an_error() {
        let mut items = distinct(10);
        items[7] = Item("Same1.java", 7);
        items[8] = Item("Same2.java", 8);
        items[9] = Item("Same3.java", 9);
        let result = split_by_position(items, 0.8, 0.2);
        assert!(matches!(result, Err(LoggraphError::PartitionTooSmall("test"))));
    }

    #[test]
    fn draining_a_partition_is_an_error() {
        let items = vec![
            Item("A1.java", 0),
            Item("A2.java", 1),
            Item("A3.java", 2),
            Item("B.java", 3),
        ];
        // test cut 3, validation cut 2: validation = [A3], drained into train.
        let result = split_by_position(items, 0.75, 0.5);
        assert!(matches!(result, Err(LoggraphError::PartitionTooSmall("validation"))));
    }

    #[test]
    fn shuffle_keeps_membership() {
        let mut rng = StdRng::seed_from_u64(7);
        let split = partition(distinct(12), 0.75, 0.5, &mut rng).expect("partition");
        assert_eq!(split.total(), 12);

        let mut train = split.train.clone();
        train.sort();
        assert_eq!(train, distinct(12)[..6].to_vec());
    }
}
