//! Per-frame overlays drawn on sampled video frames.

pub mod anonymize;
pub mod blend;
pub mod caption;
pub mod compositor;
pub mod style;
