use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::foundation::core::{PixelRect, Size};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::overlay::style::ANONYMIZATION_PIXELS;

/// Replace `rect` with a coarse mosaic of about [`ANONYMIZATION_PIXELS`] blocks along its
/// longer side.
pub fn pixelate_region(image: &mut RgbImage, rect: PixelRect) {
    let r = rect.clip_to(Size::new(image.width(), image.height()));
    if r.is_empty() {
        return;
    }
    let (x, y, w, h) = (r.left as u32, r.top as u32, r.width() as u32, r.height() as u32);
    let block = (w.max(h) / ANONYMIZATION_PIXELS).max(1);
    let small_w = (w / block).max(1);
    let small_h = (h / block).max(1);

    let region = imageops::crop_imm(image, x, y, w, h).to_image();
    let small = imageops::resize(&region, small_w, small_h, FilterType::Nearest);
    let coarse = imageops::resize(&small, w, h, FilterType::Nearest);
    imageops::replace(image, &coarse, i64::from(x), i64::from(y));
}

/// Gaussian-blur `rect` in place with a separable fixed-point kernel.
pub fn blur_region(image: &mut RgbImage, rect: PixelRect, radius: u32) -> VidsumResult<()> {
    let r = rect.clip_to(Size::new(image.width(), image.height()));
    if r.is_empty() || radius == 0 {
        return Ok(());
    }
    let (x, y, w, h) = (r.left as u32, r.top as u32, r.width() as u32, r.height() as u32);
    let region = imageops::crop_imm(image, x, y, w, h).to_image();
    let blurred = blur_rgb8(region.as_raw(), w, h, radius, radius as f32 / 2.0)?;
    let patch = RgbImage::from_raw(w, h, blurred)
        .ok_or_else(|| VidsumError::invalid_input("blurred region size mismatch"))?;
    imageops::replace(image, &patch, i64::from(x), i64::from(y));
    Ok(())
}

pub fn blur_rgb8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> VidsumResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| VidsumError::invalid_input("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(VidsumError::invalid_input(
            "blur_rgb8 expects src matching width*height*3",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> VidsumResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(VidsumError::invalid_input("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Push the rounding error into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - acc).clamp(0, 65536) as u32;

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 3;
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            for c in 0..3 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 3;
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            for c in 0..3 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
