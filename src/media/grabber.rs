use std::path::Path;

use image::RgbImage;

use crate::foundation::core::Size;
use crate::foundation::error::VidsumResult;

/// Random-access, timestamp-keyed frame reader over one opened media source.
///
/// Reads are position-then-read and not reentrant, so a grabber is driven through `&mut`
/// and never shared. Dropping the grabber closes the underlying handle.
pub trait FrameGrabber {
    /// Native frame size of the video stream.
    fn frame_size(&self) -> Size;

    /// Decode the frame displayed at `timestamp_ns`.
    ///
    /// Seeking past the end of the stream or a decode error yields
    /// [`VidsumError::FrameUnavailable`](crate::VidsumError::FrameUnavailable).
    fn seek_and_read(&mut self, timestamp_ns: u64) -> VidsumResult<RgbImage>;
}

impl<G: FrameGrabber + ?Sized> FrameGrabber for &mut G {
    fn frame_size(&self) -> Size {
        (**self).frame_size()
    }

    fn seek_and_read(&mut self, timestamp_ns: u64) -> VidsumResult<RgbImage> {
        (**self).seek_and_read(timestamp_ns)
    }
}

impl<G: FrameGrabber + ?Sized> FrameGrabber for Box<G> {
    fn frame_size(&self) -> Size {
        (**self).frame_size()
    }

    fn seek_and_read(&mut self, timestamp_ns: u64) -> VidsumResult<RgbImage> {
        (**self).seek_and_read(timestamp_ns)
    }
}

/// Opens local media files into grabbers.
pub trait MediaOpener {
    type Grabber: FrameGrabber;

    /// Fails with [`VidsumError::CannotOpen`](crate::VidsumError::CannotOpen).
    fn open(&self, local_media_path: &Path) -> VidsumResult<Self::Grabber>;
}

/// One decoded frame, owned by the compositor step that consumes it.
#[derive(Clone, Debug)]
pub struct SampledFrame {
    pub image: RgbImage,
    pub timestamp_ns: u64,
    /// Index into the object's detection frames this sample illustrates.
    pub detection: Option<usize>,
}

impl SampledFrame {
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}
