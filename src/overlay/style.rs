use std::path::PathBuf;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{VidsumError, VidsumResult};

/// Font size as a fraction of the smaller cell dimension.
pub const FONT_SIZE_RATIO: f64 = 0.08;
pub const FONT_SIZE_MIN_PX: u32 = 4;
/// Landmark marker size in per-mille of the smaller frame dimension.
pub const LANDMARK_DIM_PERMIL: u32 = 8;
pub const LANDMARK_DIM_MIN_PX: u32 = 4;
/// Block count along the longer side of a pixelated region.
pub const ANONYMIZATION_PIXELS: u32 = 13;
/// Margin around the subject box when cropping, in percent of its longer side.
pub const CROP_MARGIN_PERCENT: u32 = 10;

/// How detected regions are obscured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizeMode {
    #[default]
    Off,
    Pixelate,
    Blur {
        radius: u32,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Bounding box outline and caption text color.
    pub box_color: Rgba8,
    pub box_width_px: u32,
    pub caption: bool,
    pub caption_background: Rgba8,
    /// TrueType/OpenType font for captions; well-known system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
    pub anonymize: AnonymizeMode,
    pub landmarks: bool,
    /// Crop each object frame to a square around its box (plus margin), after the other
    /// overlays.
    pub crop: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: Rgba8::rgb(0x00, 0xFF, 0x00),
            box_width_px: 4,
            caption: true,
            caption_background: Rgba8::rgba(0x00, 0x00, 0x00, 0x40),
            font_path: None,
            anonymize: AnonymizeMode::Off,
            landmarks: false,
            crop: false,
        }
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> VidsumResult<()> {
        if self.box_width_px == 0 {
            return Err(VidsumError::invalid_input("box_width_px must be non-zero"));
        }
        if let AnonymizeMode::Blur { radius: 0 } = self.anonymize {
            return Err(VidsumError::invalid_input("blur radius must be non-zero"));
        }
        Ok(())
    }
}

/// Caption font size for a cell: 8% of its smaller side, at least 4px.
pub fn font_size_px(cell_w: u32, cell_h: u32) -> u32 {
    let px = (FONT_SIZE_RATIO * f64::from(cell_w.min(cell_h)) + 0.5).floor() as u32;
    px.max(FONT_SIZE_MIN_PX)
}

/// `(half_size, outline_width)` of a landmark marker on a `w x h` frame.
pub fn landmark_marker_dims(w: u32, h: u32) -> (u32, u32) {
    let dim = (w.min(h) * LANDMARK_DIM_PERMIL / 1000).max(LANDMARK_DIM_MIN_PX);
    let half = dim / 2;
    (half, (half / 2).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_tracks_the_smaller_side() {
        assert_eq!(font_size_px(640, 360), 29);
        assert_eq!(font_size_px(360, 640), 29);
        assert_eq!(font_size_px(20, 20), FONT_SIZE_MIN_PX);
    }

    #[test]
    fn landmark_markers_have_a_minimum_size() {
        assert_eq!(landmark_marker_dims(100, 100), (2, 1));
        assert_eq!(landmark_marker_dims(1920, 1080), (4, 2));
    }

    #[test]
    fn style_parses_from_partial_json() {
        let style: OverlayStyle =
            serde_json::from_str(r##"{"box_color":"#FF0000","anonymize":"pixelate"}"##).unwrap();
        assert_eq!(style.box_color, Rgba8::rgb(255, 0, 0));
        assert_eq!(style.anonymize, AnonymizeMode::Pixelate);
        assert_eq!(style.box_width_px, 4);

        let blur: OverlayStyle =
            serde_json::from_str(r#"{"anonymize":{"blur":{"radius":6}}}"#).unwrap();
        assert_eq!(blur.anonymize, AnonymizeMode::Blur { radius: 6 });
    }

    #[test]
    fn zero_width_boxes_are_rejected() {
        let style = OverlayStyle {
            box_width_px: 0,
            ..OverlayStyle::default()
        };
        assert!(style.validate().is_err());
    }
}
