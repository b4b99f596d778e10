use std::borrow::Cow;

use crate::encode::codec::ImageCodec;
use crate::encode::format::{ContainerFormat, OutputFormatSpec};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::render::output::{AnimationFrame, RenderedImage};

/// Bytes for one requested format.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedImage {
    pub format: ContainerFormat,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Whether `bytes` hold more than the first frame.
    pub animated: bool,
}

#[derive(Debug)]
pub struct FormatFailure {
    pub format: ContainerFormat,
    pub error: VidsumError,
}

/// Per-format results of one [`encode`] call, both in request order.
#[derive(Debug, Default)]
pub struct EncodeReport {
    pub outputs: Vec<EncodedImage>,
    pub failures: Vec<FormatFailure>,
}

impl EncodeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Encode `image` once per entry of `formats`.
///
/// An animation sent to a format without `supports_animation` is encoded as its first frame.
/// A failing format is recorded in [`EncodeReport::failures`] and the others still run.
pub fn encode<C: ImageCodec + ?Sized>(
    image: &RenderedImage,
    formats: &[OutputFormatSpec],
    codec: &C,
) -> EncodeReport {
    let mut report = EncodeReport::default();
    for format in formats {
        let result = format.validate().and_then(|()| encode_one(image, format, codec));
        match result {
            Ok((bytes, animated)) => {
                tracing::debug!(
                    format = %format.container,
                    animated,
                    bytes = bytes.len(),
                    "encoded output"
                );
                report.outputs.push(EncodedImage {
                    format: format.container,
                    bytes,
                    content_type: format.content_type(),
                    animated,
                });
            }
            Err(error) => {
                tracing::warn!(format = %format.container, %error, "format failed");
                report.failures.push(FormatFailure {
                    format: format.container,
                    error,
                });
            }
        }
    }
    report
}

fn encode_one<C: ImageCodec + ?Sized>(
    image: &RenderedImage,
    format: &OutputFormatSpec,
    codec: &C,
) -> VidsumResult<(Vec<u8>, bool)> {
    match image {
        RenderedImage::Still(still) => Ok((codec.encode_still(still, format)?, false)),
        RenderedImage::Animation(frames) if frames.is_empty() => {
            Err(VidsumError::encode_failure("animation has no frames"))
        }
        RenderedImage::Animation(frames) if !format.supports_animation => {
            Ok((codec.encode_still(&frames[0].image, format)?, false))
        }
        RenderedImage::Animation(frames) => {
            let frames = with_uniform_duration(frames, format.frame_duration_ms);
            Ok((codec.encode_animation(&frames, format)?, true))
        }
    }
}

fn with_uniform_duration(
    frames: &[AnimationFrame],
    duration_ms: Option<u32>,
) -> Cow<'_, [AnimationFrame]> {
    match duration_ms {
        None => Cow::Borrowed(frames),
        Some(duration_ms) => Cow::Owned(
            frames
                .iter()
                .map(|f| AnimationFrame {
                    image: f.image.clone(),
                    duration_ms,
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;

    /// Records every call; fails for GIF.
    #[derive(Default)]
    struct RecordingCodec {
        calls: RefCell<Vec<(ContainerFormat, usize, Vec<u32>)>>,
    }

    impl ImageCodec for RecordingCodec {
        fn encode_still(
            &self,
            image: &RgbImage,
            format: &OutputFormatSpec,
        ) -> VidsumResult<Vec<u8>> {
            self.calls
                .borrow_mut()
                .push((format.container, 1, Vec::new()));
            if format.container == ContainerFormat::Gif {
                return Err(VidsumError::encode_failure("gif broke"));
            }
            Ok(image.as_raw()[..3].to_vec())
        }

        fn encode_animation(
            &self,
            frames: &[AnimationFrame],
            format: &OutputFormatSpec,
        ) -> VidsumResult<Vec<u8>> {
            let durations = frames.iter().map(|f| f.duration_ms).collect();
            self.calls
                .borrow_mut()
                .push((format.container, frames.len(), durations));
            Ok(vec![frames.len() as u8])
        }
    }

    fn animation() -> RenderedImage {
        RenderedImage::animation(
            (0..3u8)
                .map(|i| AnimationFrame {
                    image: RgbImage::from_pixel(2, 2, Rgb([i, i, i])),
                    duration_ms: 250,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn animation_to_still_only_format_yields_the_first_frame() {
        let codec = RecordingCodec::default();
        let report = encode(
            &animation(),
            &[OutputFormatSpec::still(ContainerFormat::Png)],
            &codec,
        );
        assert!(report.is_complete());
        assert_eq!(report.outputs.len(), 1);
        assert!(!report.outputs[0].animated);
        assert_eq!(report.outputs[0].bytes, vec![0, 0, 0]);
        assert_eq!(report.outputs[0].content_type, "image/png");
        assert_eq!(codec.calls.borrow().len(), 1);
    }

    #[test]
    fn empty_animation_fails_each_format_without_calling_the_codec() {
        let codec = RecordingCodec::default();
        let formats = [
            OutputFormatSpec::animated(ContainerFormat::Gif),
            OutputFormatSpec::still(ContainerFormat::Png),
        ];
        let report = encode(&RenderedImage::Animation(Vec::new()), &formats, &codec);
        assert!(report.outputs.is_empty());
        let failed: Vec<_> = report.failures.iter().map(|f| f.format).collect();
        assert_eq!(failed, vec![ContainerFormat::Gif, ContainerFormat::Png]);
        assert!(
            report
                .failures
                .iter()
                .all(|f| matches!(f.error, VidsumError::EncodeFailure(_)))
        );
        assert!(codec.calls.borrow().is_empty());
    }

    #[test]
    fn failures_are_isolated_per_format() {
        let codec = RecordingCodec::default();
        let formats = [
            OutputFormatSpec::still(ContainerFormat::Jpeg),
            OutputFormatSpec::still(ContainerFormat::Gif),
            OutputFormatSpec::still(ContainerFormat::Webp),
        ];
        let still = RenderedImage::Still(RgbImage::new(2, 2));
        let report = encode(&still, &formats, &codec);
        let ok: Vec<_> = report.outputs.iter().map(|o| o.format).collect();
        assert_eq!(ok, vec![ContainerFormat::Jpeg, ContainerFormat::Webp]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].format, ContainerFormat::Gif);
    }

    #[test]
    fn uniform_duration_override_replaces_frame_durations() {
        let codec = RecordingCodec::default();
        let mut webp = OutputFormatSpec::animated(ContainerFormat::Webp);
        webp.frame_duration_ms = Some(333);
        let formats = [OutputFormatSpec::animated(ContainerFormat::Gif), webp];
        let report = encode(&animation(), &formats, &codec);
        assert!(report.outputs.iter().all(|o| o.animated));
        let calls = codec.calls.borrow();
        assert_eq!(calls[0], (ContainerFormat::Gif, 3, vec![250, 250, 250]));
        assert_eq!(calls[1], (ContainerFormat::Webp, 3, vec![333, 333, 333]));
    }

    #[test]
    fn invalid_format_specs_fail_without_calling_the_codec() {
        let codec = RecordingCodec::default();
        let report = encode(
            &animation(),
            &[OutputFormatSpec::animated(ContainerFormat::Jpeg)],
            &codec,
        );
        assert!(report.outputs.is_empty());
        assert!(matches!(
            report.failures[0].error,
            VidsumError::InvalidInput(_)
        ));
        assert!(codec.calls.borrow().is_empty());
    }
}
