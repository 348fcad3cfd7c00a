//! PositionReducer - Zoom-aware reduction of position lists for map rendering
//!
//! This module combines the stateless [`crate::filter`] policies into the pipeline a map
//! view runs before drawing a route, track or waypoint list, consulting a
//! [`BoundsProvider`] for the current zoom level and viewport.

use crate::{BoundingBox, BoundsProvider, NavigationPosition, Result, filter};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Douglas-Peucker tolerance in meters for each zoom level, starting at zoom 0
pub const THRESHOLD_PER_ZOOM: [f64; 18] = [
    120000.0, 70000.0, 40000.0, 20000.0, 10000.0, // level 4
    2700.0, 2100.0, 1500.0, 800.0, // level 8
    500.0, 225.0, 125.0, 80.0, 45.0, 20.0, 10.0, 4.0, 1.0, // level 17
];

/// What kind of position list is being reduced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteCharacteristics {
    /// Planned route: few positions, shape matters, never clipped to the viewport
    Route,
    /// Recorded track: many positions, clipped and simplified
    Track,
    /// Independent points: clipped, never simplified
    Waypoints,
}

/// Configuration for the reduction pipeline
///
/// The defaults keep a browser-based map responsive with tracks of several hundred
/// thousand positions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReducerConfig {
    /// Routes with at most this many positions are drawn unreduced (default 24)
    pub maximum_route_segment_length: usize,
    /// Tracks with at most this many positions are drawn unreduced (default 40)
    pub maximum_track_segment_length: usize,
    /// Waypoint lists with at most this many positions are drawn unreduced (default 15)
    pub maximum_waypoint_segment_length: usize,
    /// Maximum route positions, in multiples of the segment length (default 30)
    pub route_position_count_factor: usize,
    /// Maximum track positions, in multiples of the segment length (default 50)
    pub track_position_count_factor: usize,
    /// Maximum waypoints when descriptions are shown, in multiples of the segment length (default 5)
    pub waypoint_with_description_position_count_factor: usize,
    /// Maximum waypoints without descriptions, in multiples of the segment length (default 50)
    pub waypoint_position_count_factor: usize,
    /// Upper bound for the input of the significance calculation (default 50000)
    pub maximum_significant_position_count: usize,
    /// Viewport slack factor for zoom-based visibility filtering (default 3.0)
    pub visible_position_area_factor: f64,
    /// Selections above this size are reduced (default 50)
    pub maximum_selection_count: usize,
    /// Viewport slack for reducing selections (default 1.25)
    pub visible_selection_area_factor: f64,
    /// Significance tolerance in meters per zoom level; zoom levels past the end keep all positions
    pub threshold_per_zoom: Vec<f64>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            maximum_route_segment_length: 24,
            maximum_track_segment_length: 40,
            maximum_waypoint_segment_length: 15,
            route_position_count_factor: 30,
            track_position_count_factor: 50,
            waypoint_with_description_position_count_factor: 5,
            waypoint_position_count_factor: 50,
            maximum_significant_position_count: 50000,
            visible_position_area_factor: 3.0,
            maximum_selection_count: 5 * 10,
            visible_selection_area_factor: 1.25,
            threshold_per_zoom: THRESHOLD_PER_ZOOM.to_vec(),
        }
    }
}

/// Zoom level, characteristics and waypoint description setting of a cached reduction
type CacheKey = (i32, RouteCharacteristics, bool);

/// Reduces position lists to what a map view can render
///
/// Filters that need the viewport re-query the provider on every call. The full
/// [`reduce_positions`](Self::reduce_positions) pipeline caches its result per zoom
/// level and reduction arguments for the position list it was given; call
/// [`clear`](Self::clear) whenever that list changes.
pub struct PositionReducer<C, P> {
    callback: C,
    config: ReducerConfig,
    reduced_positions: HashMap<CacheKey, Vec<P>>,
    visible: Option<BoundingBox>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<C: BoundsProvider, P: NavigationPosition + Clone> PositionReducer<C, P> {
    /// Create a reducer with the default configuration
    pub fn new(callback: C) -> Self {
        Self::with_config(callback, ReducerConfig::default())
    }

    /// Create a reducer with the given configuration
    pub fn with_config(callback: C, config: ReducerConfig) -> Self {
        Self {
            callback,
            config,
            reduced_positions: HashMap::new(),
            visible: None,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Get a reference to the bounds provider
    #[inline]
    pub fn callback(&self) -> &C {
        &self.callback
    }

    /// Reduce a route, track or waypoint list for the current zoom level
    ///
    /// Lists no longer than the maximum segment length are only stripped of positions
    /// without coordinates and never query the provider. Longer lists are reduced once
    /// per zoom level, characteristics and waypoint description setting, and served
    /// from the cache afterwards.
    pub fn reduce_positions(
        &mut self,
        positions: &[P],
        characteristics: RouteCharacteristics,
        show_waypoint_description: bool,
    ) -> Result<Vec<P>> {
        let result = filter::filter_positions_without_coordinates(positions);
        if result.len() <= self.maximum_segment_length(characteristics) {
            return Ok(result);
        }

        let zoom = self.callback.zoom()?;
        let key = (zoom, characteristics, show_waypoint_description);
        if let Some(cached) = self.reduced_positions.get(&key) {
            return Ok(cached.clone());
        }

        let reduced =
            self.reduce_for_zoom(result, zoom, characteristics, show_waypoint_description)?;
        self.reduced_positions.insert(key, reduced.clone());
        Ok(reduced)
    }

    fn reduce_for_zoom(
        &mut self,
        positions: Vec<P>,
        zoom: i32,
        characteristics: RouteCharacteristics,
        show_waypoint_description: bool,
    ) -> Result<Vec<P>> {
        let maximum_position_count =
            self.maximum_position_count(characteristics, show_waypoint_description);
        let position_count_before_reduction = positions.len();
        let mut positions = positions;

        // Tracks and waypoint lists: only what is near the viewport
        if positions.len() > maximum_position_count
            && characteristics != RouteCharacteristics::Route
        {
            positions = self.filter_visible_positions_for_zoom(&positions, zoom)?;
        }

        // Bound the input of the significance calculation
        let maximum_significant_position_count = self.config.maximum_significant_position_count;
        if positions.len() > maximum_significant_position_count {
            positions = filter::filter_every_nth_position(
                &positions,
                maximum_significant_position_count,
            )?;
        }

        if characteristics != RouteCharacteristics::Waypoints {
            positions = self.filter_significant_positions(&positions, zoom);
        }

        if positions.len() > maximum_position_count {
            positions = filter::filter_every_nth_position(&positions, maximum_position_count)?;
        }

        self.visible = if positions.len() < position_count_before_reduction {
            BoundingBox::from_positions(&positions)
        } else {
            None
        };

        tracing::debug!(
            "Reduced {} positions to {} for zoom {} ({:?})",
            position_count_before_reduction,
            positions.len(),
            zoom,
            characteristics
        );
        Ok(positions)
    }

    /// Reduce the selected positions of a list to a renderable amount
    ///
    /// Indices refer to `positions` as given. Out-of-range indices and selected
    /// positions without coordinates are skipped. Large selections are first clipped to the
    /// viewport (keeping the first and last selected position), then sampled down to
    /// the maximum selection count.
    pub fn reduce_selected_positions(&self, positions: &[P], indices: &[usize]) -> Result<Vec<P>> {
        let result = filter::filter_selected_positions(positions, indices);
        let mut result = filter::filter_positions_without_coordinates(&result);

        let maximum_selection_count = self.config.maximum_selection_count;
        if result.len() > maximum_selection_count {
            result = self.filter_visible_positions(
                &result,
                self.config.visible_selection_area_factor,
                true,
            )?;
        }

        if result.len() > maximum_selection_count {
            result = filter::filter_every_nth_position(&result, maximum_selection_count)?;
        }
        Ok(result)
    }

    /// Keep the positions within the provider's current viewport, grown by `threshold`
    ///
    /// Returns the input unchanged while the provider has no viewport. Errors of the
    /// provider are propagated unchanged.
    pub fn filter_visible_positions(
        &self,
        positions: &[P],
        threshold: f64,
        include_first_and_last: bool,
    ) -> Result<Vec<P>> {
        let Some(bounds) = self.callback.visible_bounds()? else {
            return Ok(positions.to_vec());
        };
        Ok(filter::filter_visible_positions(
            positions,
            &bounds,
            threshold,
            include_first_and_last,
        ))
    }

    /// Viewport filter with a slack that grows past the deepest significance zoom level
    pub fn filter_visible_positions_for_zoom(&self, positions: &[P], zoom: i32) -> Result<Vec<P>> {
        let factor = self.config.visible_position_area_factor;
        let maximum_zoom = self.config.threshold_per_zoom.len() as f64;
        let threshold = (factor * (zoom as f64 - maximum_zoom)).max(1.0) * factor;
        self.filter_visible_positions(positions, threshold, false)
    }

    /// Uniform sampling; never queries the provider
    pub fn filter_every_nth_position(&self, positions: &[P], target_count: usize) -> Result<Vec<P>> {
        filter::filter_every_nth_position(positions, target_count)
    }

    /// Douglas-Peucker with the tolerance configured for `zoom`
    ///
    /// Zoom levels without a configured tolerance keep every position, since the
    /// calculation gets too expensive for the little it removes there.
    pub fn filter_significant_positions(&self, positions: &[P], zoom: i32) -> Vec<P> {
        let threshold = usize::try_from(zoom)
            .ok()
            .and_then(|level| self.config.threshold_per_zoom.get(level));

        match threshold {
            Some(&threshold) => {
                tracing::debug!("Zoom {} uses a significance threshold of {} m", zoom, threshold);
                filter::filter_significant_positions(positions, threshold)
            }
            None => {
                tracing::debug!("Zoom {} large: use all {} positions", zoom, positions.len());
                positions.to_vec()
            }
        }
    }

    /// Lists up to this length are rendered without reduction
    pub fn maximum_segment_length(&self, characteristics: RouteCharacteristics) -> usize {
        match characteristics {
            RouteCharacteristics::Route => self.config.maximum_route_segment_length,
            RouteCharacteristics::Track => self.config.maximum_track_segment_length,
            RouteCharacteristics::Waypoints => self.config.maximum_waypoint_segment_length,
        }
    }

    /// Upper bound for the result of [`reduce_positions`](Self::reduce_positions)
    pub fn maximum_position_count(
        &self,
        characteristics: RouteCharacteristics,
        show_waypoint_description: bool,
    ) -> usize {
        let factor = match characteristics {
            RouteCharacteristics::Route => self.config.route_position_count_factor,
            RouteCharacteristics::Track => self.config.track_position_count_factor,
            RouteCharacteristics::Waypoints if show_waypoint_description => {
                self.config.waypoint_with_description_position_count_factor
            }
            RouteCharacteristics::Waypoints => self.config.waypoint_position_count_factor,
        };
        factor * self.maximum_segment_length(characteristics)
    }

    /// Whether the last reduction dropped positions and recorded the area it covers
    #[inline]
    pub fn has_filtered_visible_area(&self) -> bool {
        self.visible.is_some()
    }

    /// Whether `bounds` is covered by the last reduction
    ///
    /// Always true if the last reduction kept every position.
    pub fn is_within_visible_area(&self, bounds: &BoundingBox) -> bool {
        self.visible
            .as_ref()
            .is_none_or(|visible| visible.contains_box(bounds))
    }

    /// Forget cached reductions and the recorded visible area
    pub fn clear(&mut self) {
        self.reduced_positions.clear();
        self.visible = None;
    }
}
