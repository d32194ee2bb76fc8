//! Vision processing stages

pub mod ball;
pub mod contours;
pub mod goal;
pub mod mapper;
pub mod mirror;
pub mod segmentation;

pub use mirror::{Circle, CropRect, MirrorTracker};
