use std::io::Cursor;

use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Rgb, RgbImage};
use vidsum::encode::format::{default_animated_formats, default_still_formats};
use vidsum::{AnimationFrame, ContainerFormat, RenderedImage, StandardCodec, encode};

fn gradient(w: u32, h: u32, phase: u8) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            (x * 8) as u8 ^ phase,
            (y * 8) as u8,
            phase.wrapping_mul(3),
        ])
    })
}

fn animation() -> RenderedImage {
    RenderedImage::animation(
        (0..3u8)
            .map(|i| AnimationFrame {
                image: gradient(24, 16, i * 40),
                duration_ms: 250,
            })
            .collect(),
    )
    .unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn assert_signature(format: ContainerFormat, bytes: &[u8]) {
    match format {
        ContainerFormat::Jpeg => assert_eq!(&bytes[..2], &[0xFF, 0xD8]),
        ContainerFormat::Png => assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n"),
        ContainerFormat::Gif => assert_eq!(&bytes[..6], b"GIF89a"),
        ContainerFormat::Webp => {
            assert_eq!(&bytes[..4], b"RIFF");
            assert_eq!(&bytes[8..12], b"WEBP");
        }
    }
}

#[test]
fn default_still_formats_encode_with_real_codecs() {
    let still = RenderedImage::Still(gradient(32, 18, 7));
    let report = encode(&still, &default_still_formats(), &StandardCodec);
    assert!(report.is_complete(), "{:?}", report.failures);
    let formats: Vec<_> = report.outputs.iter().map(|o| o.format).collect();
    assert_eq!(
        formats,
        vec![
            ContainerFormat::Jpeg,
            ContainerFormat::Png,
            ContainerFormat::Webp
        ]
    );
    for output in &report.outputs {
        assert_signature(output.format, &output.bytes);
        assert!(!output.animated);
    }

    // Stills decode back to the same size.
    let png = image::load_from_memory(&report.outputs[1].bytes).unwrap();
    assert_eq!((png.width(), png.height()), (32, 18));
}

#[test]
fn default_animated_formats_keep_every_frame() {
    let report = encode(&animation(), &default_animated_formats(), &StandardCodec);
    assert!(report.is_complete(), "{:?}", report.failures);
    for output in &report.outputs {
        assert_signature(output.format, &output.bytes);
        assert!(output.animated);
        match output.format {
            ContainerFormat::Png => assert!(contains(&output.bytes, b"acTL")),
            ContainerFormat::Gif => assert!(contains(&output.bytes, b"NETSCAPE2.0")),
            ContainerFormat::Webp => assert!(contains(&output.bytes, b"ANMF")),
            ContainerFormat::Jpeg => unreachable!(),
        }
    }
}

#[test]
fn still_gif_is_a_plain_single_frame() {
    let still = RenderedImage::Still(gradient(8, 8, 1));
    let formats = [vidsum::OutputFormatSpec::still(ContainerFormat::Gif)];
    let report = encode(&still, &formats, &StandardCodec);
    let bytes = &report.outputs[0].bytes;
    assert_signature(ContainerFormat::Gif, bytes);
    assert!(!contains(bytes, b"NETSCAPE2.0"));
}

#[test]
fn animated_webp_keeps_the_first_frame_hold() {
    let frames = (0..3u8)
        .map(|i| AnimationFrame {
            image: gradient(24, 16, i * 40),
            duration_ms: if i == 0 { 1_200 } else { 250 },
        })
        .collect();
    let animation = RenderedImage::animation(frames).unwrap();
    let formats = [vidsum::OutputFormatSpec::animated(ContainerFormat::Webp)];
    let report = encode(&animation, &formats, &StandardCodec);
    assert!(report.is_complete(), "{:?}", report.failures);

    let decoder = WebPDecoder::new(Cursor::new(report.outputs[0].bytes.as_slice())).unwrap();
    let decoded = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(decoded.len(), 3);
    let delays: Vec<u32> = decoded
        .iter()
        .map(|f| {
            let (numer, denom) = f.delay().numer_denom_ms();
            numer / denom
        })
        .collect();
    // The last frame's duration is chosen by libwebp (mean of the others).
    assert_eq!(&delays[..2], &[1_200, 250]);
}
