//! Video frame access and sampling.

/// `ffmpeg`/`ffprobe` subprocess grabber.
pub mod ffmpeg;
/// Frame grabber traits.
pub mod grabber;
/// Timestamp selection and pull-based frame sampling.
pub mod sampler;
