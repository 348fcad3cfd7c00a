//! Compaction of index sets into continuous ranges
//!
//! Observers of a position list (tables, map overlays) should see one notification per
//! contiguous run of changed rows, not one per row. The functions here sort an arbitrary
//! index set, split it into maximal runs of consecutive indices and drive a
//! [`RangeOperation`] over them: once per index for the fine-grained work, once per run
//! for the batched notification.
//!
//! Descending traversal exists for index-shifting work such as deletion: removing the
//! highest indices first keeps every not-yet-visited lower index valid.

use crate::{ReductionError, Result};

/// Order and batching policy for a compaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Lowest index first, runs of any length
    Ascending,
    /// Lowest index first, runs split once they reach the given length
    AscendingBounded(usize),
    /// Highest index first, runs of any length
    Descending,
}

/// Two-level callback driven by [`perform`]
pub trait RangeOperation {
    /// Called for every index, in traversal order
    fn on_index(&mut self, index: usize);

    /// Called after every index of a run was handled, with the run's numeric endpoints
    ///
    /// `from <= to` holds for both traversal directions.
    fn on_range(&mut self, from: usize, to: usize);

    /// Checked after every [`on_index`](Self::on_index) and [`on_range`](Self::on_range) call
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// How a [`perform`] call ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformOutcome {
    Completed,
    Interrupted,
}

/// Split indices into maximal runs according to the traversal policy
///
/// An empty input yields exactly one empty run. Duplicates are kept in place and
/// start a new run, since a repeated index is not the successor of itself.
///
/// # Errors
/// [`ReductionError::InvalidArgument`] for `AscendingBounded(0)`.
pub fn compact(indices: &[usize], traversal: Traversal) -> Result<Vec<Vec<usize>>> {
    match traversal {
        Traversal::Ascending => Ok(compact_runs(indices, usize::MAX, false)),
        Traversal::AscendingBounded(0) => Err(ReductionError::InvalidArgument(
            "maximum range length must be at least 1".to_string(),
        )),
        Traversal::AscendingBounded(max_len) => Ok(compact_runs(indices, max_len, false)),
        Traversal::Descending => Ok(compact_runs(indices, usize::MAX, true)),
    }
}

/// Runs of consecutive indices, lowest index first
pub fn compact_ascending(indices: &[usize]) -> Vec<Vec<usize>> {
    compact_runs(indices, usize::MAX, false)
}

/// Runs of consecutive indices, lowest index first, none longer than `max_len`
pub fn compact_ascending_bounded(indices: &[usize], max_len: usize) -> Result<Vec<Vec<usize>>> {
    compact(indices, Traversal::AscendingBounded(max_len))
}

/// Runs of consecutive indices, highest index first
pub fn compact_descending(indices: &[usize]) -> Vec<Vec<usize>> {
    compact_runs(indices, usize::MAX, true)
}

/// Sort, then greedily extend the current run while the next index is its successor
fn compact_runs(indices: &[usize], max_len: usize, descending: bool) -> Vec<Vec<usize>> {
    let mut ordered = indices.to_vec();
    ordered.sort_unstable();
    if descending {
        ordered.reverse();
    }

    let successor = |last: usize| {
        if descending {
            last.checked_sub(1)
        } else {
            last.checked_add(1)
        }
    };

    let mut ranges: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for index in ordered {
        let starts_new_run = match current.last() {
            Some(&last) => current.len() >= max_len || successor(last) != Some(index),
            None => false,
        };
        if starts_new_run {
            ranges.push(std::mem::take(&mut current));
        }
        current.push(index);
    }

    // Also keeps the single empty run for empty input
    ranges.push(current);
    ranges
}

/// Drive an operation over the compacted runs of `indices`
///
/// Stops as soon as the operation reports an interruption. The run in which that
/// happens does not get its [`RangeOperation::on_range`] call. Empty runs are skipped.
///
/// # Errors
/// [`ReductionError::InvalidArgument`] for `AscendingBounded(0)`; nothing is
/// invoked in that case.
pub fn perform<O: RangeOperation + ?Sized>(
    indices: &[usize],
    operation: &mut O,
    traversal: Traversal,
) -> Result<PerformOutcome> {
    for range in compact(indices, traversal)? {
        for &index in &range {
            operation.on_index(index);
            if operation.is_interrupted() {
                return Ok(PerformOutcome::Interrupted);
            }
        }

        let (Some(&from), Some(&to)) = (range.iter().min(), range.iter().max()) else {
            continue;
        };
        operation.on_range(from, to);
        if operation.is_interrupted() {
            return Ok(PerformOutcome::Interrupted);
        }
    }
    Ok(PerformOutcome::Completed)
}

/// All indices from `from` to `to`, both inclusive
pub fn as_range(from: usize, to: usize) -> Vec<usize> {
    (from..=to).collect()
}

/// Reorder indices chunk by chunk: all chunk interiors first, then all chunk endpoints
///
/// The list is cut into consecutive chunks of `segment_length` elements. The result
/// holds every chunk's inner elements in order, followed by each chunk's first and
/// last element. For `[0, 1, 2, 3]` and a segment length of 4 this is `[1, 2, 0, 3]`.
///
/// # Errors
/// [`ReductionError::InvalidArgument`] if `segment_length < 2`.
pub fn interiors_then_endpoints(indices: &[usize], segment_length: usize) -> Result<Vec<usize>> {
    if segment_length < 2 {
        return Err(ReductionError::InvalidArgument(format!(
            "segment length must be at least 2, got {segment_length}"
        )));
    }

    let mut interiors = Vec::with_capacity(indices.len());
    let mut endpoints = Vec::new();
    for chunk in indices.chunks(segment_length) {
        match chunk {
            [] => {}
            [single] => endpoints.push(*single),
            [first, inner @ .., last] => {
                interiors.extend_from_slice(inner);
                endpoints.push(*first);
                endpoints.push(*last);
            }
        }
    }

    interiors.extend(endpoints);
    Ok(interiors)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback and interrupts after a fixed number of indices
    #[derive(Default)]
    struct Recorder {
        indices: Vec<usize>,
        ranges: Vec<(usize, usize)>,
        interrupt_after: Option<usize>,
    }

    impl RangeOperation for Recorder {
        fn on_index(&mut self, index: usize) {
            self.indices.push(index);
        }

        fn on_range(&mut self, from: usize, to: usize) {
            self.ranges.push((from, to));
        }

        fn is_interrupted(&self) -> bool {
            self.interrupt_after
                .is_some_and(|limit| self.indices.len() >= limit)
        }
    }

    #[test]
    fn test_compact_ascending() {
        let ranges = compact_ascending(&[9, 1, 3, 2, 7, 8, 5]);
        assert_eq!(ranges, vec![vec![1, 2, 3], vec![5], vec![7, 8, 9]]);
    }

    #[test]
    fn test_compact_empty_yields_one_empty_range() {
        let empty: Vec<Vec<usize>> = vec![vec![]];
        assert_eq!(compact_ascending(&[]), empty);
        assert_eq!(compact_descending(&[]), empty);
        assert_eq!(compact_ascending_bounded(&[], 3).unwrap(), empty);
    }

    #[test]
    fn test_compact_single_index() {
        assert_eq!(compact_ascending(&[4]), vec![vec![4]]);
        assert_eq!(compact_descending(&[0]), vec![vec![0]]);
    }

    #[test]
    fn test_compact_flatten_reproduces_sorted_input() {
        let input = [12, 3, 3, 4, 0, 11, 7, 1, 12, 2];
        let mut sorted = input.to_vec();
        sorted.sort_unstable();

        let flattened: Vec<usize> = compact_ascending(&input).into_iter().flatten().collect();
        assert_eq!(flattened, sorted);
    }

    #[test]
    fn test_compact_duplicates_start_new_run() {
        assert_eq!(compact_ascending(&[2, 1, 1]), vec![vec![1], vec![1, 2]]);
    }

    #[test]
    fn test_compact_ascending_bounded() {
        let ranges = compact_ascending_bounded(&[0, 1, 2, 3, 4, 5, 6, 9, 10], 3).unwrap();
        assert_eq!(
            ranges,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6], vec![9, 10]]
        );
        assert!(ranges.iter().all(|r| r.len() <= 3));
    }

    #[test]
    fn test_compact_ascending_bounded_unbounded_matches_ascending() {
        let input = [5, 6, 7, 1, 2, 20, 21, 22, 23, 40];
        assert_eq!(
            compact_ascending_bounded(&input, usize::MAX).unwrap(),
            compact_ascending(&input)
        );
    }

    #[test]
    fn test_compact_ascending_bounded_rejects_zero() {
        let result = compact_ascending_bounded(&[1, 2, 3], 0);
        assert!(matches!(result, Err(ReductionError::InvalidArgument(_))));
    }

    #[test]
    fn test_compact_descending() {
        let ranges = compact_descending(&[9, 1, 3, 2, 7, 8, 5]);
        assert_eq!(ranges, vec![vec![9, 8, 7], vec![5], vec![3, 2, 1]]);
    }

    #[test]
    fn test_descending_is_reversed_ascending() {
        let input = [14, 2, 3, 9, 4, 10, 0, 15, 16];
        let mut reversed: Vec<Vec<usize>> = compact_descending(&input)
            .into_iter()
            .map(|mut range| {
                range.reverse();
                range
            })
            .collect();
        reversed.reverse();
        assert_eq!(reversed, compact_ascending(&input));
    }

    #[test]
    fn test_compact_matches_direct_functions() {
        let input = [3, 1, 2, 8];
        assert_eq!(
            compact(&input, Traversal::Ascending).unwrap(),
            compact_ascending(&input)
        );
        assert_eq!(
            compact(&input, Traversal::Descending).unwrap(),
            compact_descending(&input)
        );
    }

    #[test]
    fn test_perform_ascending() {
        let mut recorder = Recorder::default();
        let outcome = perform(&[4, 0, 1, 5, 2, 8], &mut recorder, Traversal::Ascending).unwrap();

        assert_eq!(outcome, PerformOutcome::Completed);
        assert_eq!(recorder.indices, vec![0, 1, 2, 4, 5, 8]);
        assert_eq!(recorder.ranges, vec![(0, 2), (4, 5), (8, 8)]);
    }

    #[test]
    fn test_perform_descending_reports_min_and_max() {
        let mut recorder = Recorder::default();
        perform(&[4, 0, 1, 5, 2, 8], &mut recorder, Traversal::Descending).unwrap();

        assert_eq!(recorder.indices, vec![8, 5, 4, 2, 1, 0]);
        assert_eq!(recorder.ranges, vec![(8, 8), (4, 5), (0, 2)]);
    }

    #[test]
    fn test_perform_bounded() {
        let mut recorder = Recorder::default();
        perform(&as_range(0, 6), &mut recorder, Traversal::AscendingBounded(3)).unwrap();
        assert_eq!(recorder.ranges, vec![(0, 2), (3, 5), (6, 6)]);
    }

    #[test]
    fn test_perform_empty_input_skips_on_range() {
        let mut recorder = Recorder::default();
        let outcome = perform(&[], &mut recorder, Traversal::Ascending).unwrap();
        assert_eq!(outcome, PerformOutcome::Completed);
        assert!(recorder.indices.is_empty());
        assert!(recorder.ranges.is_empty());
    }

    #[test]
    fn test_perform_interruption_stops_immediately() {
        let mut recorder = Recorder {
            interrupt_after: Some(4),
            ..Default::default()
        };
        let outcome = perform(&[0, 1, 2, 5, 6, 7, 9], &mut recorder, Traversal::Ascending).unwrap();

        assert_eq!(outcome, PerformOutcome::Interrupted);
        // Interrupted while in the second run: only the first run was announced
        assert_eq!(recorder.indices, vec![0, 1, 2, 5]);
        assert_eq!(recorder.ranges, vec![(0, 2)]);
    }

    #[test]
    fn test_perform_interruption_at_run_end_skips_on_range() {
        let mut recorder = Recorder {
            interrupt_after: Some(3),
            ..Default::default()
        };
        perform(&[0, 1, 2, 5], &mut recorder, Traversal::Ascending).unwrap();

        assert_eq!(recorder.indices, vec![0, 1, 2]);
        assert!(recorder.ranges.is_empty());
    }

    #[test]
    fn test_perform_invalid_bound_invokes_nothing() {
        let mut recorder = Recorder::default();
        let result = perform(&[1, 2], &mut recorder, Traversal::AscendingBounded(0));
        assert!(result.is_err());
        assert!(recorder.indices.is_empty());
    }

    #[test]
    fn test_perform_descending_deletion_keeps_indices_valid() {
        struct Remover<'a> {
            rows: &'a mut Vec<char>,
            deleted: Vec<(usize, usize)>,
        }

        impl RangeOperation for Remover<'_> {
            fn on_index(&mut self, index: usize) {
                self.rows.remove(index);
            }

            fn on_range(&mut self, from: usize, to: usize) {
                self.deleted.push((from, to));
            }
        }

        let mut rows: Vec<char> = "abcdefgh".chars().collect();
        let mut remover = Remover {
            rows: &mut rows,
            deleted: Vec::new(),
        };
        perform(&[1, 2, 5, 7], &mut remover, Traversal::Descending).unwrap();

        assert_eq!(remover.deleted, vec![(7, 7), (5, 5), (1, 2)]);
        assert_eq!(rows.into_iter().collect::<String>(), "adeg");
    }

    #[test]
    fn test_as_range() {
        assert_eq!(as_range(0, 1), vec![0, 1]);
        assert_eq!(as_range(3, 5), vec![3, 4, 5]);
        assert!(as_range(5, 3).is_empty());
    }

    #[test]
    fn test_interiors_then_endpoints() {
        assert_eq!(interiors_then_endpoints(&as_range(0, 1), 4).unwrap(), vec![0, 1]);
        assert_eq!(interiors_then_endpoints(&as_range(0, 2), 4).unwrap(), vec![1, 0, 2]);
        assert_eq!(
            interiors_then_endpoints(&as_range(0, 3), 4).unwrap(),
            vec![1, 2, 0, 3]
        );
    }

    #[test]
    fn test_interiors_then_endpoints_multiple_chunks() {
        let ordered = interiors_then_endpoints(&as_range(0, 8), 4).unwrap();
        assert_eq!(ordered, vec![1, 2, 5, 6, 0, 3, 4, 7, 8]);
        assert!(interiors_then_endpoints(&[1, 2], 1).is_err());
    }
}
