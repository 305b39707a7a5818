use crate::{core::config::MapConfig, MapError, Result};

/// Anything that can produce an image URL for a tile.
///
/// `x` is already canonical (inside the world's horizontal range) and `y` is
/// the tile's south edge, both in server pixels.
pub trait TileSource: Send + Sync {
    fn url(&self, x: i64, y: i64, zoom: u8) -> String;
}

/// The LMMap endpoint, spread over several hosts by a cheap coordinate hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmMapSource {
    servers: Vec<String>,
    endpoint: String,
    tile_size: i64,
}

impl LmMapSource {
    pub fn new(servers: Vec<String>, endpoint: impl Into<String>, tile_size: u32) -> Result<Self> {
        if servers.is_empty() {
            return Err(MapError::Config("tile source needs at least one server".into()));
        }
        if tile_size == 0 {
            return Err(MapError::Config("tile size must be positive".into()));
        }
        Ok(Self {
            servers,
            endpoint: endpoint.into(),
            tile_size: tile_size as i64,
        })
    }

    pub fn from_config(config: &MapConfig) -> Result<Self> {
        Self::new(
            config.tiles.servers.clone(),
            config.tiles.endpoint.clone(),
            config.tile_size,
        )
    }

    /// Host serving the tile at `(x, y)`. The origin tile always goes to the
    /// first host.
    pub fn server_for(&self, x: i64, y: i64) -> &str {
        if x == 0 && y == 0 {
            return &self.servers[0];
        }
        let n = self.servers.len() as f64;
        let ts = self.tile_size as f64;
        let seed = ((x.abs() as f64 / ts + y.abs() as f64 / ts - 1.0) % n).trunc();
        let index = (seed.max(0.0) as usize).min(self.servers.len() - 1);
        &self.servers[index]
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

impl TileSource for LmMapSource {
    fn url(&self, x: i64, y: i64, zoom: u8) -> String {
        format!(
            "http://{}/{}?x={}&y={}&zoom={}",
            self.server_for(x, y),
            self.endpoint,
            x,
            y,
            zoom
        )
    }
}
