//! A single cell of the tile matrix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a slot. The rendering layer keys its image element on
/// it, so the element is reused when the slot is relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Generation of a slot's assignment. A completion carrying an older token
/// belongs to a tile the slot no longer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoadToken(pub u64);

/// Whole-pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotState {
    /// Assigned a new position, no load issued yet.
    Stale,
    Loading,
    Ready,
    /// Outside the world vertically; shows nothing.
    Empty,
    /// Load failed. The placeholder stays until the slot is reassigned.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSlot {
    pub id: SlotId,
    /// Top-left corner relative to the map layer.
    pub pos: GridPoint,
    /// Server image coordinate: left edge and south edge of the tile.
    pub img: GridPoint,
    pub state: SlotState,
    pub token: LoadToken,
    pub url: Option<String>,
}

impl TileSlot {
    pub fn new(id: SlotId, pos: GridPoint, img: GridPoint) -> Self {
        Self {
            id,
            pos,
            img,
            state: SlotState::Stale,
            token: LoadToken(0),
            url: None,
        }
    }

    /// Moves the slot to show another tile. Any load in flight becomes stale;
    /// returns whether one was abandoned.
    pub fn relocate(&mut self, pos: GridPoint, img: GridPoint) -> bool {
        let abandoned = self.is_loading();
        self.pos = pos;
        self.img = img;
        self.state = SlotState::Stale;
        self.url = None;
        self.bump();
        abandoned
    }

    pub fn is_loading(&self) -> bool {
        self.state == SlotState::Loading
    }

    /// Starts loading `url` and returns the token its completion must carry.
    pub fn begin_load(&mut self, url: String) -> LoadToken {
        self.bump();
        self.state = SlotState::Loading;
        self.url = Some(url);
        self.token
    }

    /// Culls the slot: nothing to show here.
    pub fn clear(&mut self) {
        self.bump();
        self.state = SlotState::Empty;
        self.url = None;
    }

    /// Applies a load result. Returns false, changing nothing, when `token` is
    /// not the current assignment or the slot is not waiting for a load.
    pub fn finish(&mut self, token: LoadToken, success: bool) -> bool {
        if token != self.token || self.state != SlotState::Loading {
            return false;
        }
        self.state = if success {
            SlotState::Ready
        } else {
            SlotState::Failed
        };
        true
    }

    pub fn is_visible(&self) -> bool {
        self.state != SlotState::Empty
    }

    fn bump(&mut self) {
        self.token = LoadToken(self.token.0 + 1);
    }
}
