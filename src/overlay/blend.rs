use image::{Rgb, RgbImage};

use crate::foundation::core::{PixelRect, Rgba8, Size};

/// Straight-alpha `src` over an opaque `dst` pixel.
pub fn over(dst: Rgb<u8>, src: Rgba8) -> Rgb<u8> {
    let a = u16::from(src.0[3]);
    if a == 0 {
        return dst;
    }
    if a == 255 {
        return src.to_rgb();
    }
    let inv = 255u16 - a;
    let mut out = [0u8; 3];
    for i in 0..3 {
        let sc = mul_div255(u16::from(src.0[i]), a);
        let dc = mul_div255(u16::from(dst.0[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    Rgb(out)
}

/// Blend `color` over every pixel of `rect` (clipped to the image).
pub fn fill_rect_over(image: &mut RgbImage, rect: PixelRect, color: Rgba8) {
    let r = rect.clip_to(Size::new(image.width(), image.height()));
    if r.is_empty() || color.0[3] == 0 {
        return;
    }
    for y in r.top..r.bottom {
        for x in r.left..r.right {
            let px = image.get_pixel_mut(x as u32, y as u32);
            *px = over(*px, color);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
