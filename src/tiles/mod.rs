pub mod loader;
pub mod matrix;
pub mod ring;
pub mod slot;
pub mod source;

// Re-exports for convenience
pub use loader::{CompletionQueue, LoadCompletion, LoadOutcome, LoadReport, TileRequest};
pub use matrix::{FillDimensions, MatrixUpdate, TileMatrix, TilePlacement};
pub use slot::{GridPoint, LoadToken, SlotId, SlotState, TileSlot};
pub use source::{LmMapSource, TileSource};
