use image::imageops;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;

use crate::annotations::model::{ObjectFrame, ObjectSubject, Subject};
use crate::foundation::core::{PixelRect, Point, Rect, Size, round_px};
use crate::foundation::error::VidsumResult;
use crate::media::grabber::SampledFrame;
use crate::overlay::anonymize::{blur_region, pixelate_region};
use crate::overlay::caption::{CaptionFont, caption_text, draw_caption};
use crate::overlay::style::{
    AnonymizeMode, CROP_MARGIN_PERCENT, OverlayStyle, font_size_px, landmark_marker_dims,
};

/// Normalized box to pixels: `(round(w*l), round(h*t), round(w*r)+1, round(h*b)+1)`.
///
/// The exclusive right/bottom edge lands one past the rounded boundary so the boundary pixel
/// itself is covered.
pub fn box_to_pixels(normalized: Rect, size: Size) -> PixelRect {
    let (w, h) = (f64::from(size.w), f64::from(size.h));
    PixelRect::new(
        round_px(w * normalized.x0),
        round_px(h * normalized.y0),
        round_px(w * normalized.x1) + 1,
        round_px(h * normalized.y1) + 1,
    )
}

/// Square crop window centered on `rect`, its side the longer box side plus
/// [`CROP_MARGIN_PERCENT`]. Not clipped.
pub fn crop_box(rect: PixelRect) -> PixelRect {
    let (w, h) = (rect.width() as f64, rect.height() as f64);
    let cx = rect.left as f64 + w / 2.0;
    let cy = rect.top as f64 + h / 2.0;
    let m = w.max(h) * f64::from(100 + CROP_MARGIN_PERCENT) / 100.0 / 2.0;
    PixelRect::new(
        round_px(cx - m),
        round_px(cy - m),
        round_px(cx + m) + 1,
        round_px(cy + m) + 1,
    )
}

/// Draw the overlays describing `subject` onto `frame`.
///
/// Shots pass through untouched. Objects get, in order: caption banner, anonymization,
/// bounding box, landmark markers, then the optional crop. `font = None` skips the caption.
/// A cropped result is smaller than the input frame.
pub fn composite(
    frame: SampledFrame,
    subject: &Subject,
    style: &OverlayStyle,
    font: Option<&CaptionFont>,
) -> VidsumResult<RgbImage> {
    let mut image = frame.image;
    let Subject::Object(obj) = subject else {
        return Ok(image);
    };
    let Some(detection) = obj.frames.get(frame.detection.unwrap_or(0)) else {
        return Ok(image);
    };

    if style.caption {
        if let Some(font) = font {
            draw_object_caption(&mut image, obj, style, font);
        }
    }

    let size = Size::new(image.width(), image.height());
    let has_area = detection.normalized_box.width() > 0.0 && detection.normalized_box.height() > 0.0;
    if has_area {
        let rect = box_to_pixels(detection.normalized_box, size);
        match style.anonymize {
            AnonymizeMode::Off => {}
            AnonymizeMode::Pixelate => pixelate_region(&mut image, rect),
            AnonymizeMode::Blur { radius } => blur_region(&mut image, rect, radius)?,
        }
        draw_outline(&mut image, rect, style.box_width_px, style.box_color.to_rgb());
    }

    if style.landmarks {
        draw_landmarks(&mut image, detection, style.box_color.to_rgb());
    }

    if style.crop && has_area {
        let window = crop_box(box_to_pixels(detection.normalized_box, size)).clip_to(size);
        if !window.is_empty() {
            image = imageops::crop_imm(
                &image,
                window.left as u32,
                window.top as u32,
                window.width() as u32,
                window.height() as u32,
            )
            .to_image();
        }
    }

    Ok(image)
}

fn draw_object_caption(
    image: &mut RgbImage,
    obj: &ObjectSubject,
    style: &OverlayStyle,
    font: &CaptionFont,
) {
    let text = caption_text(&obj.label, obj.confidence_percent(), obj.frame_count());
    let size_px = font_size_px(image.width(), image.height());
    draw_caption(
        image,
        font,
        size_px,
        &text,
        style.box_color,
        style.caption_background,
    );
}

/// Rectangle outline `width` pixels thick, growing inward from `rect`'s edges.
fn draw_outline(image: &mut RgbImage, rect: PixelRect, width: u32, color: Rgb<u8>) {
    for inset in 0..i64::from(width) {
        let w = rect.width() - 2 * inset;
        let h = rect.height() - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let r = imageproc::rect::Rect::at((rect.left + inset) as i32, (rect.top + inset) as i32)
            .of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, r, color);
    }
}

fn draw_landmarks(image: &mut RgbImage, detection: &ObjectFrame, color: Rgb<u8>) {
    let size = Size::new(image.width(), image.height());
    let (half, border) = landmark_marker_dims(size.w, size.h);
    let half = i64::from(half);
    for p in &detection.landmarks {
        let (x, y) = landmark_to_pixels(*p, size);
        let marker = PixelRect::new(x - half, y - half, x + half + 1, y + half + 1);
        draw_outline(image, marker, border, color);
    }
}

fn landmark_to_pixels(p: Point, size: Size) -> (i64, i64) {
    (
        round_px(p.x * f64::from(size.w)),
        round_px(p.y * f64::from(size.h)),
    )
}
