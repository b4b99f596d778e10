use std::path::{Path, PathBuf};

use ab_glyph::{Font as _, FontVec, PxScale, ScaleFont as _};
use image::RgbImage;
use imageproc::drawing::{draw_text_mut, text_size};

use crate::foundation::core::{PixelRect, Rgba8};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::overlay::blend::fill_rect_over;

pub const CAPTION_SEPARATOR: &str = "\u{b7}";

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/usr/share/fonts/gnu-free/FreeSansBold.otf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Caption font plus the path it was loaded from.
pub struct CaptionFont {
    font: FontVec,
    source: PathBuf,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Vertical metrics at one pixel size, rounded outward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    pub ascent: u32,
    pub descent: u32,
}

impl FontMetrics {
    pub fn line_height(self) -> u32 {
        self.ascent + self.descent
    }
}

impl CaptionFont {
    pub fn load(path: &Path) -> VidsumResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            VidsumError::invalid_input(format!("failed to read font '{}': {e}", path.display()))
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            VidsumError::invalid_input(format!("invalid font '{}': {e}", path.display()))
        })?;
        Ok(Self {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Load `explicit` if given, else the first installed well-known sans-serif font.
    ///
    /// Returns `None` (with a warning) when nothing usable is found; captions are then skipped.
    pub fn discover(explicit: Option<&Path>) -> Option<Self> {
        if let Some(path) = explicit {
            return match Self::load(path) {
                Ok(font) => Some(font),
                Err(err) => {
                    tracing::warn!(%err, "caption font unavailable, captions disabled");
                    None
                }
            };
        }
        let found = SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.is_file())
            .find_map(|p| Self::load(p).ok());
        if found.is_none() {
            tracing::warn!("no system caption font found, captions disabled");
        }
        found
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn metrics(&self, size_px: u32) -> FontMetrics {
        let scaled = self.font.as_scaled(PxScale::from(size_px as f32));
        FontMetrics {
            ascent: scaled.ascent().max(0.0).ceil() as u32,
            descent: (-scaled.descent()).max(0.0).ceil() as u32,
        }
    }

    pub fn text_width(&self, size_px: u32, text: &str) -> u32 {
        text_size(PxScale::from(size_px as f32), &self.font, text).0
    }
}

/// `"{label} · {pct}% · {frames} fr."`
pub fn caption_text(label: &str, confidence_pct: u32, frame_count: usize) -> String {
    let sep = CAPTION_SEPARATOR;
    format!("{label} {sep} {confidence_pct}% {sep} {frame_count} fr.")
}

/// Where the caption banner and its text go, anchored at the frame's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptionLayout {
    pub banner: PixelRect,
    pub text_origin: (i32, i32),
}

/// Banner as tall as the font line and as wide as the text plus one separator-glyph width of
/// padding on each side.
pub fn caption_layout(text_w: u32, padding_w: u32, metrics: FontMetrics) -> CaptionLayout {
    let w = i64::from(text_w) + 2 * i64::from(padding_w);
    CaptionLayout {
        banner: PixelRect::new(0, 0, w, i64::from(metrics.line_height())),
        text_origin: (padding_w as i32, 0),
    }
}

/// Draw `text` over a semi-transparent banner in the top-left corner of `image`.
pub fn draw_caption(
    image: &mut RgbImage,
    font: &CaptionFont,
    size_px: u32,
    text: &str,
    text_color: Rgba8,
    background: Rgba8,
) {
    let metrics = font.metrics(size_px);
    let padding_w = font.text_width(size_px, CAPTION_SEPARATOR);
    let text_w = font.text_width(size_px, text);
    let layout = caption_layout(text_w, padding_w, metrics);

    fill_rect_over(image, layout.banner, background);
    draw_text_mut(
        image,
        text_color.to_rgb(),
        layout.text_origin.0,
        layout.text_origin.1,
        PxScale::from(size_px as f32),
        &font.font,
        text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_text_matches_the_summary_format() {
        assert_eq!(caption_text("car", 87, 42), "car \u{b7} 87% \u{b7} 42 fr.");
    }

    #[test]
    fn banner_is_text_plus_two_paddings_by_line_height() {
        let layout = caption_layout(
            120,
            8,
            FontMetrics {
                ascent: 22,
                descent: 6,
            },
        );
        assert_eq!(layout.banner, PixelRect::new(0, 0, 136, 28));
        assert_eq!(layout.text_origin, (8, 0));
    }

    #[test]
    fn caption_draws_a_blended_banner_and_colored_text() {
        let Some(font) = CaptionFont::discover(None) else {
            eprintln!("skipping: no system caption font");
            return;
        };
        let grey = image::Rgb([128u8, 128, 128]);
        let green = Rgba8::rgb(0, 255, 0);
        let shade = Rgba8::rgba(0, 0, 0, 0x40);
        let mut image = RgbImage::from_pixel(300, 60, grey);
        let text = caption_text("cat", 91, 10);
        draw_caption(&mut image, &font, 20, &text, green, shade);

        let metrics = font.metrics(20);
        let padding_w = font.text_width(20, CAPTION_SEPARATOR);
        let layout = caption_layout(font.text_width(20, &text), padding_w, metrics);
        assert!(padding_w > 0 && layout.banner.right < 300);

        // Left padding column: banner only.
        let banner_px = crate::overlay::blend::over(grey, shade);
        assert_eq!(*image.get_pixel(0, metrics.line_height() - 1), banner_px);
        // Right of and below the banner: untouched.
        assert_eq!(*image.get_pixel(layout.banner.right as u32, 0), grey);
        assert_eq!(*image.get_pixel(0, metrics.line_height()), grey);
        // Some text pixels carry the text color.
        let greenish = image
            .enumerate_pixels()
            .filter(|(_, y, _)| *y < metrics.line_height())
            .filter(|(_, _, p)| p.0[1] > p.0[0].saturating_add(60))
            .count();
        assert!(greenish > 0);
    }

    #[test]
    fn unreadable_font_paths_are_reported() {
        assert!(CaptionFont::load(Path::new("no/such/font.ttf")).is_err());
        assert!(CaptionFont::discover(Some(Path::new("no/such/font.ttf"))).is_none());
    }
}
