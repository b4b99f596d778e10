//! Annotation, video and output storage.

/// `MediaStore`, the local-filesystem store and the scoped media lease.
pub mod local;
/// Output file naming and annotation-to-video URI mapping.
pub mod naming;
