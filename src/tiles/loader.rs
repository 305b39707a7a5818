//! Hand-off between the matrix and whoever fetches the images.
//!
//! The matrix emits [`TileRequest`]s. The image layer fetches them however it
//! likes and reports back through a [`CompletionQueue`] sender, from any
//! thread; the owner drains the queue on its own thread.

use super::slot::{LoadToken, SlotId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// A tile the rendering layer should fetch into `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRequest {
    pub slot: SlotId,
    pub token: LoadToken,
    pub url: String,
    /// Canonical server x of the tile.
    pub x: i64,
    pub y: i64,
    pub zoom: u8,
}

impl TileRequest {
    /// Completion for this request.
    pub fn complete(&self, outcome: LoadOutcome) -> LoadCompletion {
        LoadCompletion {
            slot: self.slot,
            token: self.token,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCompletion {
    pub slot: SlotId,
    pub token: LoadToken,
    pub outcome: LoadOutcome,
}

/// Unbounded channel of load completions.
#[derive(Debug, Clone)]
pub struct CompletionQueue {
    tx: Sender<LoadCompletion>,
    rx: Receiver<LoadCompletion>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<LoadCompletion> {
        self.tx.clone()
    }

    /// Everything received so far, without blocking.
    pub fn drain(&self) -> Vec<LoadCompletion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        completions
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of the loads issued since the last full render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub expected: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadReport {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// A request was superseded before it completed; its completion will be
    /// dropped, so stop waiting for it.
    pub fn abandon(&mut self) {
        self.expected = self.expected.saturating_sub(1);
    }

    /// True once every expected tile has either arrived or failed.
    pub fn all_loaded(&self) -> bool {
        self.loaded + self.failed >= self.expected
    }
}
