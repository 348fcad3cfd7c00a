//! Position types consumed by the reduction policies
//!
//! Reducers only ever read longitude and latitude. Everything else a position
//! carries (elevation, time, descriptions, extensions) travels through untouched,
//! which is why the policies are generic over [`NavigationPosition`].

use geo::Point;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only coordinate access for anything that can be placed on a map
pub trait NavigationPosition {
    /// Longitude in degrees (WGS84)
    fn longitude(&self) -> f64;

    /// Latitude in degrees (WGS84)
    fn latitude(&self) -> f64;

    /// Whether both coordinates are usable
    ///
    /// Positions without coordinates are skipped by every reduction policy.
    #[inline]
    fn has_coordinates(&self) -> bool {
        self.longitude().is_finite() && self.latitude().is_finite()
    }

    /// The coordinates as a `geo` point (x = longitude, y = latitude)
    #[inline]
    fn point(&self) -> Option<Point<f64>> {
        self.has_coordinates()
            .then(|| Point::new(self.longitude(), self.latitude()))
    }
}

/// A plain geographic position with optional pass-through attributes
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Longitude in degrees
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Elevation in meters, if known
    pub elevation: Option<f64>,
    /// Free text attached by the format layer
    pub description: Option<String>,
}

impl Position {
    /// Create a position from longitude and latitude
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            elevation: None,
            description: None,
        }
    }

    /// Attach an elevation in meters
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Copy the coordinates of any other position
    pub fn from_navigation_position<P: NavigationPosition + ?Sized>(position: &P) -> Self {
        Self::new(position.longitude(), position.latitude())
    }
}

// Bitwise comparison keeps Eq and Hash consistent for floating point coordinates.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.longitude.to_bits() == other.longitude.to_bits()
            && self.latitude.to_bits() == other.latitude.to_bits()
            && self.elevation.map(f64::to_bits) == other.elevation.map(f64::to_bits)
            && self.description == other.description
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.longitude.to_bits().hash(state);
        self.latitude.to_bits().hash(state);
        self.elevation.map(f64::to_bits).hash(state);
        self.description.hash(state);
    }
}

impl NavigationPosition for Position {
    #[inline]
    fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    fn latitude(&self) -> f64 {
        self.latitude
    }
}

impl NavigationPosition for gpx::Waypoint {
    #[inline]
    fn longitude(&self) -> f64 {
        self.point().x()
    }

    #[inline]
    fn latitude(&self) -> f64 {
        self.point().y()
    }
}

impl NavigationPosition for Point<f64> {
    #[inline]
    fn longitude(&self) -> f64 {
        self.x()
    }

    #[inline]
    fn latitude(&self) -> f64 {
        self.y()
    }
}

impl<T: NavigationPosition + ?Sized> NavigationPosition for &T {
    #[inline]
    fn longitude(&self) -> f64 {
        (**self).longitude()
    }

    #[inline]
    fn latitude(&self) -> f64 {
        (**self).latitude()
    }

    #[inline]
    fn has_coordinates(&self) -> bool {
        (**self).has_coordinates()
    }
}
