//! Map viewport bounds and the provider capability that supplies them

use crate::{NavigationPosition, Position, Result};
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rectangle spanned by a north-east and a south-west corner, in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// x = longitude, y = latitude
    north_east: Coord<f64>,
    south_west: Coord<f64>,
}

impl BoundingBox {
    /// Create a bounding box from its two corners
    pub fn new<N, S>(north_east: &N, south_west: &S) -> Self
    where
        N: NavigationPosition + ?Sized,
        S: NavigationPosition + ?Sized,
    {
        Self {
            north_east: Coord {
                x: north_east.longitude(),
                y: north_east.latitude(),
            },
            south_west: Coord {
                x: south_west.longitude(),
                y: south_west.latitude(),
            },
        }
    }

    /// Smallest box containing every position that has coordinates
    ///
    /// Returns `None` if no position has coordinates.
    pub fn from_positions<P: NavigationPosition>(positions: &[P]) -> Option<Self> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut found_valid_position = false;

        for position in positions.iter().filter(|p| p.has_coordinates()) {
            min_x = min_x.min(position.longitude());
            min_y = min_y.min(position.latitude());
            max_x = max_x.max(position.longitude());
            max_y = max_y.max(position.latitude());
            found_valid_position = true;
        }

        found_valid_position.then_some(Self {
            north_east: Coord { x: max_x, y: max_y },
            south_west: Coord { x: min_x, y: min_y },
        })
    }

    #[inline]
    pub fn north_east(&self) -> Position {
        Position::new(self.north_east.x, self.north_east.y)
    }

    #[inline]
    pub fn south_west(&self) -> Position {
        Position::new(self.south_west.x, self.south_west.y)
    }

    #[inline]
    pub fn north_west(&self) -> Position {
        Position::new(self.south_west.x, self.north_east.y)
    }

    #[inline]
    pub fn south_east(&self) -> Position {
        Position::new(self.north_east.x, self.south_west.y)
    }

    /// Midpoint of both corners
    pub fn center(&self) -> Position {
        Position::new(
            (self.south_west.x + self.north_east.x) / 2.0,
            (self.south_west.y + self.north_east.y) / 2.0,
        )
    }

    /// Longitude span in degrees
    #[inline]
    pub fn width(&self) -> f64 {
        (self.north_east.x - self.south_west.x).abs()
    }

    /// Latitude span in degrees
    #[inline]
    pub fn height(&self) -> f64 {
        (self.north_east.y - self.south_west.y).abs()
    }

    /// Check if a position lies within the box (edges inclusive)
    ///
    /// Positions without coordinates are never contained.
    #[inline]
    pub fn contains<P: NavigationPosition + ?Sized>(&self, position: &P) -> bool {
        let longitude = position.longitude();
        let latitude = position.latitude();
        longitude >= self.south_west.x
            && longitude <= self.north_east.x
            && latitude >= self.south_west.y
            && latitude <= self.north_east.y
    }

    /// Check if all four corners of another box lie within this one
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains(&other.north_east())
            && self.contains(&other.south_east())
            && self.contains(&other.south_west())
            && self.contains(&other.north_west())
    }

    /// Grow every side by `threshold` times the box's own width or height
    ///
    /// A threshold of 1.0 turns a 2x2 degree box into a 6x6 degree box around
    /// the same center.
    pub fn expanded(&self, threshold: f64) -> Self {
        let width = self.width() * threshold;
        let height = self.height() * threshold;
        Self {
            north_east: Coord {
                x: self.north_east.x + width,
                y: self.north_east.y + height,
            },
            south_west: Coord {
                x: self.south_west.x - width,
                y: self.south_west.y - height,
            },
        }
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bounds: BoundingBox) -> Self {
        Rect::new(bounds.south_west, bounds.north_east)
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            north_east: rect.max(),
            south_west: rect.min(),
        }
    }
}

/// Capability supplying the current map viewport and zoom level
///
/// Implemented by map views backed by live viewport state. Reducers call it
/// synchronously and re-query it on every reduction, since the viewport can change
/// between calls. `Ok(None)` means the map has no viewport yet; failures are
/// reported as [`crate::ReductionError::Callback`] and propagated unchanged.
pub trait BoundsProvider {
    /// Current zoom level
    fn zoom(&self) -> Result<i32>;

    /// North-east corner of the visible map area
    fn north_east_bounds(&self) -> Result<Option<Position>>;

    /// South-west corner of the visible map area
    fn south_west_bounds(&self) -> Result<Option<Position>>;

    /// Both corners as a bounding box, if the viewport is known
    fn visible_bounds(&self) -> Result<Option<BoundingBox>> {
        let north_east = self.north_east_bounds()?;
        let south_west = self.south_west_bounds()?;
        Ok(match (north_east, south_west) {
            (Some(north_east), Some(south_west)) => {
                Some(BoundingBox::new(&north_east, &south_west))
            }
            _ => None,
        })
    }
}

impl<T: BoundsProvider + ?Sized> BoundsProvider for &T {
    fn zoom(&self) -> Result<i32> {
        (**self).zoom()
    }

    fn north_east_bounds(&self) -> Result<Option<Position>> {
        (**self).north_east_bounds()
    }

    fn south_west_bounds(&self) -> Result<Option<Position>> {
        (**self).south_west_bounds()
    }
}

/// A fixed viewport, for headless reduction and tests
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticBounds {
    pub zoom: i32,
    pub bounds: Option<BoundingBox>,
}

impl StaticBounds {
    pub fn new(zoom: i32, bounds: BoundingBox) -> Self {
        Self {
            zoom,
            bounds: Some(bounds),
        }
    }

    /// A provider for a map that has not been laid out yet
    pub fn uninitialized(zoom: i32) -> Self {
        Self { zoom, bounds: None }
    }
}

impl BoundsProvider for StaticBounds {
    fn zoom(&self) -> Result<i32> {
        Ok(self.zoom)
    }

    fn north_east_bounds(&self) -> Result<Option<Position>> {
        Ok(self.bounds.map(|b| b.north_east()))
    }

    fn south_west_bounds(&self) -> Result<Option<Position>> {
        Ok(self.bounds.map(|b| b.south_west()))
    }
}
