//! Serialization of rendered summaries into image containers.

/// Pixel codecs (`ImageCodec`) and the default `StandardCodec`.
pub mod codec;
/// Output container descriptions and default format lists.
pub mod format;
/// Per-format encoding with animated/still fallback.
pub mod multi;
