use crate::{
    core::{projection, zoom::ZoomContext},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// Represents a point in screen, layer or server pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn round(&self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rejects pixel positions with a NaN or infinite component.
    pub fn validate(self) -> Result<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(MapError::InvalidCoordinates(format!(
                "pixel ({}, {})",
                self.x, self.y
            )))
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Coordinate system a [`GeoPoint`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CoordSystem {
    /// WGS84 degrees, `x` = longitude, `y` = latitude.
    #[default]
    Wgs84,
    /// Fixed-point MC2 angle units.
    Mc2,
    /// Server pixels at the carried zoom level, `y` pointing north.
    Map(ZoomContext),
}

/// Immutable geographic location tagged with its coordinate system.
///
/// Conversions never touch the receiver; they return a new point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    x: f64,
    y: f64,
    #[serde(default)]
    system: CoordSystem,
}

impl GeoPoint {
    /// WGS84 point from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            x: lon,
            y: lat,
            system: CoordSystem::Wgs84,
        }
    }

    /// Like [`GeoPoint::new`] but rejects non-finite input.
    pub fn try_new(lon: f64, lat: f64) -> Result<Self> {
        Self::new(lon, lat).validate()
    }

    pub fn mc2(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            system: CoordSystem::Mc2,
        }
    }

    pub fn map(x: f64, y: f64, context: ZoomContext) -> Self {
        Self {
            x,
            y,
            system: CoordSystem::Map(context),
        }
    }

    /// Parses a point such as `{"x": 12.59, "y": 55.657}`; missing or
    /// non-numeric fields are reported instead of producing NaN positions.
    pub fn from_json(json: &str) -> Result<Self> {
        let point: GeoPoint = serde_json::from_str(json)?;
        point.validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.x.is_finite() && self.y.is_finite() {
            Ok(self)
        } else {
            Err(MapError::InvalidCoordinates(format!(
                "({}, {}) in {:?}",
                self.x, self.y, self.system
            )))
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn system(&self) -> CoordSystem {
        self.system
    }

    pub fn as_point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// MC2 components of this point, unrounded.
    pub fn mc2_xy(&self) -> (f64, f64) {
        match self.system {
            CoordSystem::Wgs84 => (
                projection::wgs84_to_mc2(self.x) as f64,
                projection::wgs84_to_mc2(self.y) as f64,
            ),
            CoordSystem::Mc2 => (self.x, self.y),
            CoordSystem::Map(ctx) => {
                let mc2 = projection::server_to_mc2(self.x, self.y, &ctx);
                (mc2.x, mc2.y)
            }
        }
    }

    /// Longitude in WGS84 degrees.
    pub fn lon(&self) -> f64 {
        match self.system {
            CoordSystem::Wgs84 => self.x,
            _ => projection::mc2_to_wgs84(self.mc2_xy().0),
        }
    }

    /// Latitude in WGS84 degrees.
    pub fn lat(&self) -> f64 {
        match self.system {
            CoordSystem::Wgs84 => self.y,
            _ => projection::mc2_to_wgs84(self.mc2_xy().1),
        }
    }

    pub fn to_wgs84(&self) -> GeoPoint {
        GeoPoint::new(self.lon(), self.lat())
    }

    pub fn to_mc2(&self) -> GeoPoint {
        let (x, y) = self.mc2_xy();
        GeoPoint::mc2(x, y)
    }

    /// Server pixel coordinates at `context`, whatever system `self` is in.
    pub fn to_map(&self, context: &ZoomContext) -> GeoPoint {
        match self.system {
            CoordSystem::Map(own) if own == *context => *self,
            _ => {
                let (x, y) = self.mc2_xy();
                projection::mc2_to_server(x, y, context)
            }
        }
    }

    /// Great-circle distance in kilometres.
    pub fn km_to(&self, other: &GeoPoint) -> f64 {
        projection::distance_km(self, other)
    }

    pub fn miles_to(&self, other: &GeoPoint) -> f64 {
        projection::distance_miles(self, other)
    }

    /// Point reached after travelling `distance_km` along `bearing` degrees.
    pub fn destination(&self, distance_km: f64, bearing: f64) -> GeoPoint {
        projection::destination_point(self, distance_km, bearing)
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Geographic box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub east_lon: f64,
    pub west_lon: f64,
    pub north_lat: f64,
    pub south_lat: f64,
}

impl BoundingBox {
    pub fn new(east_lon: f64, west_lon: f64, north_lat: f64, south_lat: f64) -> Self {
        Self {
            east_lon,
            west_lon,
            north_lat,
            south_lat,
        }
    }

    pub fn validate(self) -> Result<Self> {
        let values = [self.east_lon, self.west_lon, self.north_lat, self.south_lat];
        if values.iter().all(|v| v.is_finite()) {
            Ok(self)
        } else {
            Err(MapError::InvalidCoordinates(format!("{self:?}")))
        }
    }

    /// North-east corner.
    pub fn upper(&self) -> GeoPoint {
        GeoPoint::new(self.east_lon, self.north_lat)
    }

    /// South-west corner.
    pub fn lower(&self) -> GeoPoint {
        GeoPoint::new(self.west_lon, self.south_lat)
    }
}
