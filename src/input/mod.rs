pub mod wheel;

pub use wheel::{WheelCoalescer, WheelZoom};
