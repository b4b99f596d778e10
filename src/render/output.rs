use image::RgbImage;

use crate::foundation::core::Size;
use crate::foundation::error::{VidsumError, VidsumResult};

/// One frame of an animated output.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub image: RgbImage,
    /// Display time; always `> 0`.
    pub duration_ms: u32,
}

/// Assembled raster, ready for encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedImage {
    Still(RgbImage),
    /// Non-empty, every frame the same size.
    Animation(Vec<AnimationFrame>),
}

impl RenderedImage {
    /// Build an animation, rejecting empty sequences, zero durations, and mixed frame sizes.
    pub fn animation(frames: Vec<AnimationFrame>) -> VidsumResult<Self> {
        let Some(first) = frames.first() else {
            return Err(VidsumError::invalid_input(
                "animation requires at least one frame",
            ));
        };
        let size = first.image.dimensions();
        for (i, f) in frames.iter().enumerate() {
            if f.duration_ms == 0 {
                return Err(VidsumError::invalid_input(format!(
                    "animation frame {i} has zero duration"
                )));
            }
            if f.image.dimensions() != size {
                return Err(VidsumError::invalid_input(format!(
                    "animation frame {i} is {}x{}, expected {}x{}",
                    f.image.width(),
                    f.image.height(),
                    size.0,
                    size.1
                )));
            }
        }
        Ok(Self::Animation(frames))
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animation(_))
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Self::Still(_) => 1,
            Self::Animation(frames) => frames.len(),
        }
    }

    /// The still image, or the first animation frame; `None` for an empty animation.
    pub fn first_frame(&self) -> Option<&RgbImage> {
        match self {
            Self::Still(image) => Some(image),
            Self::Animation(frames) => frames.first().map(|f| &f.image),
        }
    }

    pub fn size(&self) -> Option<Size> {
        let (w, h) = self.first_frame()?.dimensions();
        Some(Size::new(w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32, duration_ms: u32) -> AnimationFrame {
        AnimationFrame {
            image: RgbImage::new(w, h),
            duration_ms,
        }
    }

    #[test]
    fn animation_constructor_checks_invariants() {
        assert!(RenderedImage::animation(Vec::new()).is_err());
        assert!(RenderedImage::animation(vec![frame(2, 2, 0)]).is_err());
        assert!(RenderedImage::animation(vec![frame(2, 2, 100), frame(3, 2, 100)]).is_err());

        let anim = RenderedImage::animation(vec![frame(4, 3, 100), frame(4, 3, 250)]).unwrap();
        assert!(anim.is_animated());
        assert_eq!(anim.frame_count(), 2);
        assert_eq!(anim.size(), Some(Size::new(4, 3)));
        assert!(RenderedImage::Animation(Vec::new()).first_frame().is_none());
    }
}
