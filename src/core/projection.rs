//! Conversions between WGS84 degrees, MC2 fixed-point angles, radians and the
//! server's pixel space, plus great-circle helpers.
//!
//! Server space is a Mercator grid whose width at a zoom level is
//! `totalTilesX * tileSize`; `y` grows to the north. None of these functions
//! normalise longitude, wraparound is the repetition resolver's job.

use crate::core::{
    constants::{EARTH_RADIUS_KM, KM_TO_MILES, MC2_FACTOR, MC2_RADIAN_FACTOR, WGS84_DECIMALS},
    geo::GeoPoint,
    zoom::ZoomContext,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Degrees to MC2, rounded to the nearest unit.
pub fn wgs84_to_mc2(degrees: f64) -> i64 {
    (degrees * MC2_FACTOR).round() as i64
}

/// MC2 to degrees, fixed to ten decimal digits.
pub fn mc2_to_wgs84(mc2: f64) -> f64 {
    let scale = 10_f64.powi(WGS84_DECIMALS);
    (mc2 / MC2_FACTOR * scale).round() / scale
}

pub fn mc2_to_radians(mc2: f64) -> f64 {
    mc2 * MC2_RADIAN_FACTOR
}

pub fn radians_to_mc2(radians: f64) -> f64 {
    radians / MC2_RADIAN_FACTOR
}

/// Degrees to radians through the MC2 grid, so results agree with MC2 math.
pub fn wgs84_to_radians(degrees: f64) -> f64 {
    mc2_to_radians(wgs84_to_mc2(degrees) as f64)
}

/// Projects an MC2 pair into server pixels at `context`.
pub fn mc2_to_server(x_mc2: f64, y_mc2: f64, context: &ZoomContext) -> GeoPoint {
    let lon = mc2_to_radians(x_mc2);
    let lat = mc2_to_radians(y_mc2);
    let scale = context.world_span() / TAU;

    let x = lon * scale;
    let y = (lat.tan() + 1.0 / lat.cos()).abs().ln() * scale;
    GeoPoint::map(x, y, *context)
}

/// Inverse of [`mc2_to_server`]. `x` is first brought back into the
/// canonical world.
pub fn server_to_mc2(x: f64, y: f64, context: &ZoomContext) -> GeoPoint {
    let x = context.real_x(x);
    let scale = TAU / context.world_span();

    let lon = x * scale;
    let lat = (y * scale).sinh().atan();
    GeoPoint::mc2(
        lon * MC2_FACTOR * 180.0 / PI,
        lat * MC2_FACTOR * 180.0 / PI,
    )
}

pub fn wgs84_to_server(lon: f64, lat: f64, context: &ZoomContext) -> GeoPoint {
    mc2_to_server(
        wgs84_to_mc2(lon) as f64,
        wgs84_to_mc2(lat) as f64,
        context,
    )
}

/// Haversine distance in kilometres.
pub fn distance_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lon1, lat1) = (from.lon(), from.lat());
    let (lon2, lat2) = (to.lon(), to.lat());

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn distance_miles(from: &GeoPoint, to: &GeoPoint) -> f64 {
    distance_km(from, to) * KM_TO_MILES
}

/// Destination reached from `origin` after `distance_km` on the initial
/// `bearing` (degrees clockwise from north).
pub fn destination_point(origin: &GeoPoint, distance_km: f64, bearing: f64) -> GeoPoint {
    let lon1 = origin.lon().to_radians();
    let lat1 = origin.lat().to_radians();
    let brng = bearing.to_radians();
    let d = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * brng.cos()).asin();
    let lon2 = lon1
        + (brng.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lon2.to_degrees(), lat2.to_degrees())
}

/// Which axis an angle belongs to; picks the hemisphere letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Lat,
    Lon,
}

/// Formats an MC2 angle as `D° M' S" H`, to the nearest whole second.
pub fn mc2_to_dms(value: f64, axis: Axis) -> String {
    let hemisphere = match (axis, value < 0.0) {
        (Axis::Lat, true) => 'S',
        (Axis::Lat, false) => 'N',
        (Axis::Lon, true) => 'W',
        (Axis::Lon, false) => 'E',
    };

    let seconds = (value.abs() / MC2_FACTOR * 3600.0).round() as i64;
    format!(
        "{}° {}' {}\" {}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60,
        hemisphere
    )
}

/// Degrees, minutes and seconds to MC2. The sign comes from `degrees`.
pub fn dms_to_mc2(degrees: f64, minutes: f64, seconds: f64) -> i64 {
    let value = (degrees.abs() * MC2_FACTOR).trunc() as i64
        + (minutes.abs() * MC2_FACTOR / 60.0).trunc() as i64
        + (seconds.abs() * MC2_FACTOR / 3600.0).trunc() as i64;

    if degrees < 0.0 {
        -value
    } else {
        value
    }
}
