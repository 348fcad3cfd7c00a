//! Stateless reduction policies over explicit inputs
//!
//! Every function returns a subsequence of its input in the original order, never
//! duplicating a position. None of them consult a [`crate::BoundsProvider`]; the
//! [`crate::PositionReducer`] supplies bounds and thresholds on top of these.

use crate::{BoundingBox, NavigationPosition, ReductionError, Result, utils};

/// Drop positions that have no coordinates
pub fn filter_positions_without_coordinates<P: NavigationPosition + Clone>(
    positions: &[P],
) -> Vec<P> {
    #[cfg(feature = "profiling")]
    profiling::scope!("filter::positions_without_coordinates");

    let result: Vec<P> = positions
        .iter()
        .filter(|p| p.has_coordinates())
        .cloned()
        .collect();

    if result.len() != positions.len() {
        tracing::debug!(
            "Filtered positions without coordinates to reduce {} positions to {}",
            positions.len(),
            result.len()
        );
    }
    result
}

/// Pick the positions at the given indices, in index order
///
/// Indices past the end of `positions` are skipped.
pub fn filter_selected_positions<P: Clone>(positions: &[P], selected_indices: &[usize]) -> Vec<P> {
    let result: Vec<P> = selected_indices
        .iter()
        .filter_map(|&index| positions.get(index))
        .cloned()
        .collect();

    if result.len() != selected_indices.len() {
        tracing::debug!(
            "Filtered selected positions to reduce {} indices to {} positions",
            selected_indices.len(),
            result.len()
        );
    }
    result
}

/// Uniformly sample `target_count` positions, keeping the first and last
///
/// With `increment = (len - 1) / (target_count - 1)`, sample `j` for
/// `j in 1..target_count - 1` is the position at `trunc(increment * j + 1.0)`.
/// If `target_count` is not smaller than the input, the input is returned as is.
///
/// # Errors
/// [`ReductionError::InvalidArgument`] if `target_count < 2`.
pub fn filter_every_nth_position<P: Clone>(positions: &[P], target_count: usize) -> Result<Vec<P>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("filter::every_nth_position");

    if target_count < 2 {
        return Err(ReductionError::InvalidArgument(format!(
            "target count must be at least 2, got {target_count}"
        )));
    }
    if target_count >= positions.len() {
        return Ok(positions.to_vec());
    }

    let last = positions.len() - 1;
    let increment = last as f64 / (target_count - 1) as f64;

    let mut result = Vec::with_capacity(target_count);
    result.push(positions[0].clone());
    for sample in 1..target_count - 1 {
        // Truncation, not rounding: increment > 1 keeps every sample inside 1..last
        let index = (increment * sample as f64 + 1.0) as usize;
        result.push(positions[index.min(last - 1)].clone());
    }
    result.push(positions[last].clone());

    tracing::debug!(
        "Filtered every {}th position to reduce {} positions to {}",
        increment,
        positions.len(),
        result.len()
    );
    Ok(result)
}

/// Keep the positions inside a viewport grown by `threshold`, plus the ones that
/// bridge into and out of it
///
/// The viewport is [`expanded`](BoundingBox::expanded) by `threshold` on every side.
/// A position is kept if it is inside, or if it is the invisible neighbor of a visible
/// position (the one right before entering, the one right after leaving), so a
/// polyline does not stop short of the viewport edge. With `include_first_and_last`
/// the first and last position are kept regardless, and still bring along their
/// neighbor when it bridges into or out of the viewport. Positions without coordinates
/// are skipped and do not count as neighbors.
pub fn filter_visible_positions<P: NavigationPosition + Clone>(
    positions: &[P],
    bounds: &BoundingBox,
    threshold: f64,
    include_first_and_last: bool,
) -> Vec<P> {
    #[cfg(feature = "profiling")]
    profiling::scope!("filter::visible_positions");

    let len = positions.len();
    if include_first_and_last && len <= 2 {
        return positions.to_vec();
    }

    let visible_area = bounds.expanded(threshold);
    let candidates = if include_first_and_last {
        &positions[1..len - 1]
    } else {
        positions
    };

    let mut result = Vec::new();

    // (position, visible, already emitted)
    let mut previous: Option<(&P, bool, bool)> = None;
    if include_first_and_last {
        let first = &positions[0];
        result.push(first.clone());
        previous = Some((first, visible_area.contains(first), true));
    }
    for position in candidates {
        if !position.has_coordinates() {
            continue;
        }

        let visible = visible_area.contains(position);
        let previous_visible = previous.is_some_and(|(_, was_visible, _)| was_visible);
        let emitted = if visible {
            // Entering the visible area: bring along the position it is entered from
            if let Some((entry, false, false)) = previous {
                result.push(entry.clone());
            }
            true
        } else {
            // Leaving the visible area: keep the first position outside
            previous_visible
        };
        if emitted {
            result.push(position.clone());
        }

        previous = Some((position, visible, emitted));
    }

    if include_first_and_last {
        let last = &positions[len - 1];
        // The last position enters the visible area: bring along its predecessor
        match previous {
            Some((entry, false, false)) if visible_area.contains(last) => {
                result.push(entry.clone())
            }
            _ => {}
        }
        result.push(last.clone());
    }

    if result.len() != len {
        tracing::debug!(
            "Filtered visible positions with a threshold of {} to reduce {} positions to {}",
            threshold,
            len,
            result.len()
        );
    }
    result
}

/// Keep only the positions that shape the line at the given tolerance in meters
///
/// See [`utils::significant_indices`]; the first and last position are always kept.
pub fn filter_significant_positions<P: NavigationPosition + Clone>(
    positions: &[P],
    threshold: f64,
) -> Vec<P> {
    #[cfg(feature = "profiling")]
    profiling::scope!("filter::significant_positions");

    let result: Vec<P> = utils::significant_indices(positions, threshold)
        .into_iter()
        .map(|index| positions[index].clone())
        .collect();

    if result.len() != positions.len() {
        tracing::debug!(
            "Filtered significant positions with a threshold of {} m to reduce {} positions to {}",
            threshold,
            positions.len(),
            result.len()
        );
    }
    result
}
