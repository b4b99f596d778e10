use std::path::Path;

use crate::annotations::filter::FilterPolicy;
use crate::encode::format::{OutputFormatSpec, default_animated_formats, default_still_formats};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::overlay::style::OverlayStyle;
use crate::render::assembler::RenderMode;

pub const DEFAULT_MAX_CANVAS_W: u32 = 1920;

/// Everything that shapes one summary request, loadable from a JSON file.
///
/// Missing keys take their defaults, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub filter: FilterPolicy,
    pub mode: RenderMode,
    pub max_canvas_w: u32,
    /// Where inside a shot its still-grid frame is taken, `0.0..=1.0`.
    pub still_shot_ratio: f64,
    /// Frames per shot animation and per animated grid.
    pub animation_frames: usize,
    /// Detection frames per object animation.
    pub max_object_frames: usize,
    pub frame_duration_ms: u32,
    /// Longer display time for the first animation frame.
    pub first_frame_duration_ms: Option<u32>,
    pub background_rgb: [u8; 3],
    pub overlay: OverlayStyle,
    pub still_formats: Vec<OutputFormatSpec>,
    pub animated_formats: Vec<OutputFormatSpec>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            filter: FilterPolicy::default(),
            mode: RenderMode::StillGrid,
            max_canvas_w: DEFAULT_MAX_CANVAS_W,
            still_shot_ratio: 0.5,
            animation_frames: 6,
            max_object_frames: 12,
            frame_duration_ms: 250,
            first_frame_duration_ms: None,
            background_rgb: [0x80, 0x80, 0x80],
            overlay: OverlayStyle::default(),
            still_formats: default_still_formats(),
            animated_formats: default_animated_formats(),
        }
    }
}

impl SummaryConfig {
    pub fn from_json_file(path: &Path) -> VidsumResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            VidsumError::invalid_input(format!("failed to read config '{}': {e}", path.display()))
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            VidsumError::invalid_input(format!("invalid config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VidsumResult<()> {
        if self.max_canvas_w == 0 {
            return Err(VidsumError::invalid_input("max_canvas_w must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.still_shot_ratio) {
            return Err(VidsumError::invalid_input(
                "still_shot_ratio must be within [0, 1]",
            ));
        }
        if self.animation_frames == 0 || self.max_object_frames == 0 {
            return Err(VidsumError::invalid_input(
                "animation_frames and max_object_frames must be non-zero",
            ));
        }
        if self.frame_duration_ms == 0 || self.first_frame_duration_ms == Some(0) {
            return Err(VidsumError::invalid_input("frame durations must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.filter.min_confidence) {
            return Err(VidsumError::invalid_input(
                "filter.min_confidence must be within [0, 1]",
            ));
        }
        self.overlay.validate()?;
        for format in self.still_formats.iter().chain(&self.animated_formats) {
            format.validate()?;
        }
        Ok(())
    }

    /// Formats requested for an output of the given kind.
    pub fn formats_for(&self, animated: bool) -> &[OutputFormatSpec] {
        if animated {
            &self.animated_formats
        } else {
            &self.still_formats
        }
    }
}
