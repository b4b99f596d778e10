use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{Delay, DynamicImage, ExtendedColorType, Frame, ImageEncoder as _, RgbImage};

use crate::encode::format::{ContainerFormat, OutputFormatSpec};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::render::output::AnimationFrame;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;
pub const DEFAULT_GIF_SPEED: u8 = 10;
pub const DEFAULT_WEBP_QUALITY: f32 = 80.0;
pub const DEFAULT_WEBP_METHOD: u8 = 1;

/// Pixel-to-bytes codec for one container at a time.
///
/// Implementations never see an animation for a format with `supports_animation == false`;
/// that fallback is decided by [`crate::encode::multi::encode`].
pub trait ImageCodec {
    fn encode_still(&self, image: &RgbImage, format: &OutputFormatSpec) -> VidsumResult<Vec<u8>>;

    /// Frames are non-empty and share one size. Output loops forever.
    fn encode_animation(
        &self,
        frames: &[AnimationFrame],
        format: &OutputFormatSpec,
    ) -> VidsumResult<Vec<u8>>;
}

/// Default codec over `image` (JPEG, PNG, GIF), `png` (APNG) and `webp` (still and animated).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCodec;

impl ImageCodec for StandardCodec {
    fn encode_still(&self, image: &RgbImage, format: &OutputFormatSpec) -> VidsumResult<Vec<u8>> {
        match format.container {
            ContainerFormat::Jpeg => encode_jpeg(image, format),
            ContainerFormat::Png => encode_png(image, format),
            ContainerFormat::Gif => encode_gif(
                &[AnimationFrame {
                    image: image.clone(),
                    duration_ms: 0,
                }],
                format,
                false,
            ),
            ContainerFormat::Webp => encode_webp(image, format),
        }
    }

    fn encode_animation(
        &self,
        frames: &[AnimationFrame],
        format: &OutputFormatSpec,
    ) -> VidsumResult<Vec<u8>> {
        if frames.is_empty() {
            return Err(VidsumError::encode_failure("animation has no frames"));
        }
        match format.container {
            ContainerFormat::Jpeg => Err(VidsumError::encode_failure(
                "jpeg cannot hold an animation",
            )),
            ContainerFormat::Png => encode_apng(frames, format),
            ContainerFormat::Gif => encode_gif(frames, format, true),
            ContainerFormat::Webp => encode_webp_animation(frames, format),
        }
    }
}

fn encode_err(format: ContainerFormat, err: impl std::fmt::Display) -> VidsumError {
    VidsumError::encode_failure(format!("{format}: {err}"))
}

fn encode_jpeg(image: &RgbImage, format: &OutputFormatSpec) -> VidsumResult<Vec<u8>> {
    let quality = format.param_u8("quality", DEFAULT_JPEG_QUALITY)?.clamp(1, 100);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(image)
        .map_err(|e| encode_err(format.container, e))?;
    Ok(out)
}

fn encode_png(image: &RgbImage, format: &OutputFormatSpec) -> VidsumResult<Vec<u8>> {
    let compression = if format.param_bool("optimize", false)? {
        CompressionType::Best
    } else {
        CompressionType::Default
    };
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, compression, PngFilter::Adaptive)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| encode_err(format.container, e))?;
    Ok(out)
}

fn encode_apng(frames: &[AnimationFrame], format: &OutputFormatSpec) -> VidsumResult<Vec<u8>> {
    let (w, h) = frames[0].image.dimensions();
    let err = |e: png::EncodingError| encode_err(format.container, e);
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, w, h);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        // 0 plays = loop forever.
        encoder.set_animated(frames.len() as u32, 0).map_err(err)?;
        let mut writer = encoder.write_header().map_err(err)?;
        for frame in frames {
            let delay_ms = u16::try_from(frame.duration_ms).unwrap_or(u16::MAX);
            writer.set_frame_delay(delay_ms, 1000).map_err(err)?;
            writer.write_image_data(frame.image.as_raw()).map_err(err)?;
        }
        writer.finish().map_err(err)?;
    }
    Ok(out)
}

fn encode_gif(
    frames: &[AnimationFrame],
    format: &OutputFormatSpec,
    looped: bool,
) -> VidsumResult<Vec<u8>> {
    let speed = format.param_u8("speed", DEFAULT_GIF_SPEED)?.clamp(1, 30);
    let err = |e: image::ImageError| encode_err(format.container, e);
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, i32::from(speed));
        if looped {
            encoder.set_repeat(Repeat::Infinite).map_err(err)?;
        }
        let gif_frames = frames.iter().map(|f| {
            let rgba = DynamicImage::ImageRgb8(f.image.clone()).into_rgba8();
            Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(f.duration_ms, 1))
        });
        encoder.encode_frames(gif_frames).map_err(err)?;
    }
    Ok(out)
}

fn webp_config(format: &OutputFormatSpec) -> VidsumResult<webp::WebPConfig> {
    let mut config = webp::WebPConfig::new()
        .map_err(|()| encode_err(format.container, "libwebp rejected the default config"))?;
    config.lossless = i32::from(format.param_bool("lossless", false)?);
    config.quality = format.param_f32("quality", DEFAULT_WEBP_QUALITY)?;
    config.method = i32::from(format.param_u8("method", DEFAULT_WEBP_METHOD)?.min(6));
    Ok(config)
}

fn encode_webp(image: &RgbImage, format: &OutputFormatSpec) -> VidsumResult<Vec<u8>> {
    let config = webp_config(format)?;
    let encoded = webp::Encoder::from_rgb(image.as_raw(), image.width(), image.height())
        .encode_advanced(&config)
        .map_err(|e| encode_err(format.container, format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode_webp_animation(
    frames: &[AnimationFrame],
    format: &OutputFormatSpec,
) -> VidsumResult<Vec<u8>> {
    let config = webp_config(format)?;
    let (w, h) = frames[0].image.dimensions();
    let mut encoder = webp::AnimEncoder::new(w, h, &config);
    encoder.set_loop_count(0);
    let mut timestamp_ms = 0i32;
    for frame in frames {
        encoder.add_frame(webp::AnimFrame::from_rgb(
            frame.image.as_raw(),
            w,
            h,
            timestamp_ms,
        ));
        let duration_ms = i32::try_from(frame.duration_ms).unwrap_or(i32::MAX);
        timestamp_ms = timestamp_ms.saturating_add(duration_ms);
    }
    // `try_encode` flushes with timestamp 0, which libwebp rejects; the last frame then gets
    // the mean duration of the earlier ones instead of its own.
    let encoded = encoder
        .try_encode()
        .map_err(|e| encode_err(format.container, format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn still() -> RgbImage {
        RgbImage::from_fn(16, 8, |x, y| Rgb([(x * 16) as u8, (y * 32) as u8, 128]))
    }

    #[test]
    fn jpeg_and_png_stills_have_their_signatures() {
        let codec = StandardCodec;
        let jpeg = codec
            .encode_still(&still(), &OutputFormatSpec::still(ContainerFormat::Jpeg))
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let png = codec
            .encode_still(
                &still(),
                &OutputFormatSpec::still(ContainerFormat::Png).with_param("optimize", true),
            )
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn jpeg_animation_is_an_encode_failure() {
        let frames = [AnimationFrame {
            image: still(),
            duration_ms: 100,
        }];
        let err = StandardCodec
            .encode_animation(&frames, &OutputFormatSpec::still(ContainerFormat::Jpeg))
            .unwrap_err();
        assert!(matches!(err, VidsumError::EncodeFailure(_)));
    }

    #[test]
    fn bad_params_surface_before_encoding() {
        let spec = OutputFormatSpec::still(ContainerFormat::Jpeg).with_param("quality", "best");
        assert!(StandardCodec.encode_still(&still(), &spec).is_err());
    }
}
