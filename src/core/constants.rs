//! Core constants of the LMMap tile grid and the MC2 angle format.
//! Zoom-dependent values live in the zoom table; these hold at every level.

/// Default square tile size in server pixels.
pub const TILE_SIZE: u32 = 256;

/// MC2 units per WGS84 degree (2^32 / 360).
pub const MC2_FACTOR: f64 = 11_930_464.7111;

/// Radians per MC2 unit (π / 2^31).
pub const MC2_RADIAN_FACTOR: f64 = std::f64::consts::PI / 2_147_483_648.0;

/// Decimal digits kept when an MC2 value is turned back into degrees.
pub const WGS84_DECIMALS: i32 = 10;

/// Mean earth radius used by the great-circle helpers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres to miles, as used by the scale read-outs.
pub const KM_TO_MILES: f64 = 0.6;

/// Lowest zoom level of the server.
pub const MIN_ZOOM: u8 = 1;

/// Highest zoom level of the server.
pub const MAX_ZOOM: u8 = 15;

/// Half-width of the projected world at zoom 1, in server pixels.
pub const BASE_HALF_WORLD: i64 = 1280;

/// Tiles added to `viewport / tile` when sizing the grid.
pub const FILL_MARGIN: u32 = 3;

/// Quiet period after which buffered wheel ticks become one zoom.
pub const WHEEL_COALESCE_MS: u64 = 100;

/// Largest zoom step a single wheel gesture may produce.
pub const MAX_WHEEL_STEP: i32 = 3;

/// Default tile server host.
pub const DEFAULT_TILE_SERVER: &str = "oss-xml.services.wayfinder.com";

/// Path of the tile endpoint on every tile server.
pub const TILE_ENDPOINT: &str = "LMMap";

/// Padding (max-zoom pixels) added around a bounding box before choosing a zoom.
pub const FIT_BOUNDS_PADDING: f64 = 200.0;
