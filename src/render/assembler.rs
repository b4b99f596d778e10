use std::cell::OnceCell;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::annotations::filter::filter;
use crate::annotations::model::{AnnotationSet, Subject};
use crate::config::SummaryConfig;
use crate::foundation::core::Size;
use crate::foundation::error::VidsumResult;
use crate::layout::grid::{GridGeometry, plan};
use crate::media::grabber::{FrameGrabber, SampledFrame};
use crate::media::sampler::{SamplePolicy, even_ratios, sample};
use crate::overlay::caption::CaptionFont;
use crate::overlay::compositor::composite;
use crate::render::output::{AnimationFrame, RenderedImage};

/// What a request produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One mosaic with a frame per subject.
    #[default]
    StillGrid,
    /// One animation per subject.
    Animations,
    /// One mosaic per animation frame, every subject sampled at the same relative position.
    AnimatedGrid,
}

impl RenderMode {
    pub fn is_animated(self) -> bool {
        !matches!(self, Self::StillGrid)
    }
}

/// Progress of one assembly.
///
/// `Init -> Filtered -> EmptyResult` when nothing survives filtering (or every subject fails),
/// else `Init -> Filtered -> Planned -> Sampling -> Composed -> Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyState {
    Init,
    Filtered,
    EmptyResult,
    Planned,
    Sampling,
    Composed,
    Done,
}

/// Identifies a rendered output for naming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputLabel {
    Grid {
        subject_count: usize,
        animated: bool,
    },
    Shot {
        index: usize,
    },
    Object {
        index: usize,
        label: String,
        confidence_pct: u32,
        frame_count: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedOutput {
    pub label: OutputLabel,
    pub image: RenderedImage,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Assembly {
    /// Nothing renderable: no subject survived filtering or every subject failed to sample.
    Empty,
    Rendered(Vec<RenderedOutput>),
}

impl Assembly {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn outputs(&self) -> &[RenderedOutput] {
        match self {
            Self::Empty => &[],
            Self::Rendered(outputs) => outputs,
        }
    }
}

/// Drives filter, plan, sample and composite for one request.
pub struct SummaryAssembler<'c> {
    config: &'c SummaryConfig,
    font: OnceCell<Option<CaptionFont>>,
    state: AssemblyState,
}

impl<'c> SummaryAssembler<'c> {
    /// The caption font is resolved from `config.overlay` on first use.
    pub fn new(config: &'c SummaryConfig) -> Self {
        Self {
            config,
            font: OnceCell::new(),
            state: AssemblyState::Init,
        }
    }

    /// Use `font` for captions instead of resolving one; `None` disables captions.
    pub fn with_font(config: &'c SummaryConfig, font: Option<CaptionFont>) -> Self {
        Self {
            config,
            font: OnceCell::from(font),
            state: AssemblyState::Init,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn config(&self) -> &'c SummaryConfig {
        self.config
    }

    /// Filter raw annotations with the configured policy.
    pub fn filter(&mut self, annotations: &AnnotationSet) -> Vec<Subject> {
        let subjects = filter(&annotations.subjects, &self.config.filter);
        tracing::info!(
            raw = annotations.len(),
            kept = subjects.len(),
            "filtered annotations"
        );
        self.state = if subjects.is_empty() {
            AssemblyState::EmptyResult
        } else {
            AssemblyState::Filtered
        };
        subjects
    }

    /// Filter then render in one step.
    pub fn assemble<G: FrameGrabber + ?Sized>(
        &mut self,
        annotations: &AnnotationSet,
        grabber: &mut G,
        mode: RenderMode,
    ) -> VidsumResult<Assembly> {
        let subjects = self.filter(annotations);
        if subjects.is_empty() {
            return Ok(Assembly::Empty);
        }
        self.render(&subjects, grabber, mode)
    }

    /// Render already-filtered `subjects`.
    ///
    /// Subjects whose frames cannot be read are skipped; any other error aborts the request.
    pub fn render<G: FrameGrabber + ?Sized>(
        &mut self,
        subjects: &[Subject],
        grabber: &mut G,
        mode: RenderMode,
    ) -> VidsumResult<Assembly> {
        if subjects.is_empty() {
            self.state = AssemblyState::EmptyResult;
            return Ok(Assembly::Empty);
        }
        tracing::info!(subjects = subjects.len(), ?mode, "rendering summary");
        let outputs = match mode {
            RenderMode::StillGrid => self.still_grid(subjects, grabber)?,
            RenderMode::Animations => self.animations(subjects, grabber)?,
            RenderMode::AnimatedGrid => self.animated_grid(subjects, grabber)?,
        };
        if outputs.is_empty() {
            tracing::warn!("every subject failed to sample");
            self.state = AssemblyState::EmptyResult;
            return Ok(Assembly::Empty);
        }
        self.state = AssemblyState::Done;
        Ok(Assembly::Rendered(outputs))
    }

    fn caption_font(&self) -> Option<&CaptionFont> {
        if !self.config.overlay.caption {
            return None;
        }
        self.font
            .get_or_init(|| CaptionFont::discover(self.config.overlay.font_path.as_deref()))
            .as_ref()
    }

    fn plan_cells<G: FrameGrabber + ?Sized>(
        &mut self,
        cell_count: usize,
        grabber: &G,
    ) -> VidsumResult<GridGeometry> {
        let geometry = plan(cell_count, grabber.frame_size(), self.config.max_canvas_w)?;
        tracing::debug!(
            columns = geometry.columns,
            rows = geometry.rows,
            cell_w = geometry.cell_size.w,
            cell_h = geometry.cell_size.h,
            scale = geometry.scale,
            "planned layout"
        );
        self.state = AssemblyState::Planned;
        Ok(geometry)
    }

    fn still_grid<G: FrameGrabber + ?Sized>(
        &mut self,
        subjects: &[Subject],
        grabber: &mut G,
    ) -> VidsumResult<Vec<RenderedOutput>> {
        let geometry = self.plan_cells(subjects.len(), grabber)?;
        let mut canvas = self.blank_canvas(geometry.canvas_size);
        self.state = AssemblyState::Sampling;

        let mut filled = 0usize;
        for (index, subject) in subjects.iter().enumerate() {
            let policy = match subject {
                Subject::Shot(_) => SamplePolicy::InterpolatedFrame(self.config.still_shot_ratio),
                Subject::Object(_) => SamplePolicy::SingleFrame,
            };
            let Some(frame) = sample_subject(index, subject, policy, grabber)?
                .and_then(|frames| frames.into_iter().next())
            else {
                continue;
            };
            let cell = self.compose(frame, subject, geometry.cell_size)?;
            let (x, y) = geometry.cell_origin(filled);
            imageops::replace(&mut canvas, &cell, i64::from(x), i64::from(y));
            filled += 1;
        }
        self.state = AssemblyState::Composed;

        if filled == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![RenderedOutput {
            label: OutputLabel::Grid {
                subject_count: filled,
                animated: false,
            },
            image: RenderedImage::Still(canvas),
        }])
    }

    fn animations<G: FrameGrabber + ?Sized>(
        &mut self,
        subjects: &[Subject],
        grabber: &mut G,
    ) -> VidsumResult<Vec<RenderedOutput>> {
        // A single cell bounds the animation frame size.
        let geometry = self.plan_cells(1, grabber)?;
        self.state = AssemblyState::Sampling;

        let mut outputs = Vec::new();
        for (index, subject) in subjects.iter().enumerate() {
            let policy = match subject {
                Subject::Shot(_) => SamplePolicy::AllFrames(self.config.animation_frames),
                Subject::Object(_) => SamplePolicy::AllFrames(self.config.max_object_frames),
            };
            let Some(samples) = sample_subject(index, subject, policy, grabber)? else {
                continue;
            };
            let mut frames = Vec::with_capacity(samples.len());
            for (i, sampled) in samples.into_iter().enumerate() {
                frames.push(AnimationFrame {
                    image: self.compose(sampled, subject, geometry.cell_size)?,
                    duration_ms: self.frame_duration_ms(i),
                });
            }
            if frames.is_empty() {
                continue;
            }
            outputs.push(RenderedOutput {
                label: subject_label(index, subject),
                image: RenderedImage::animation(frames)?,
            });
        }
        self.state = AssemblyState::Composed;
        Ok(outputs)
    }

    fn animated_grid<G: FrameGrabber + ?Sized>(
        &mut self,
        subjects: &[Subject],
        grabber: &mut G,
    ) -> VidsumResult<Vec<RenderedOutput>> {
        let geometry = self.plan_cells(subjects.len(), grabber)?;
        self.state = AssemblyState::Sampling;

        let mut frames = Vec::with_capacity(self.config.animation_frames);
        let mut any_filled = false;
        for (i, ratio) in even_ratios(self.config.animation_frames).enumerate() {
            let mut canvas = self.blank_canvas(geometry.canvas_size);
            for (index, subject) in subjects.iter().enumerate() {
                let policy = SamplePolicy::InterpolatedFrame(ratio);
                let Some(frame) = sample_subject(index, subject, policy, grabber)?
                    .and_then(|frames| frames.into_iter().next())
                else {
                    continue;
                };
                let cell = self.compose(frame, subject, geometry.cell_size)?;
                let (x, y) = geometry.cell_origin(index);
                imageops::replace(&mut canvas, &cell, i64::from(x), i64::from(y));
                any_filled = true;
            }
            frames.push(AnimationFrame {
                image: canvas,
                duration_ms: self.frame_duration_ms(i),
            });
        }
        self.state = AssemblyState::Composed;

        if !any_filled {
            return Ok(Vec::new());
        }
        Ok(vec![RenderedOutput {
            label: OutputLabel::Grid {
                subject_count: subjects.len(),
                animated: true,
            },
            image: RenderedImage::animation(frames)?,
        }])
    }

    fn compose(
        &self,
        mut frame: SampledFrame,
        subject: &Subject,
        cell_size: Size,
    ) -> VidsumResult<RgbImage> {
        frame.image = fit_to_cell(frame.image, cell_size);
        let frame_size = frame.size();
        let image = composite(frame, subject, &self.config.overlay, self.caption_font())?;
        if image.dimensions() == (frame_size.w, frame_size.h) {
            return Ok(image);
        }
        // Cropped: scale back into the frame's footprint so every frame of a subject matches.
        let mut canvas = self.blank_canvas(frame_size);
        let scaled = scale_into(&image, frame_size);
        let x = (frame_size.w - scaled.width()) / 2;
        let y = (frame_size.h - scaled.height()) / 2;
        imageops::replace(&mut canvas, &scaled, i64::from(x), i64::from(y));
        Ok(canvas)
    }

    fn blank_canvas(&self, size: Size) -> RgbImage {
        RgbImage::from_pixel(size.w, size.h, Rgb(self.config.background_rgb))
    }

    fn frame_duration_ms(&self, frame_index: usize) -> u32 {
        match (frame_index, self.config.first_frame_duration_ms) {
            (0, Some(hold_ms)) => hold_ms,
            _ => self.config.frame_duration_ms,
        }
    }
}

/// Sample one subject, turning subject-level failures into a logged skip.
fn sample_subject<G: FrameGrabber + ?Sized>(
    index: usize,
    subject: &Subject,
    policy: SamplePolicy,
    grabber: &mut G,
) -> VidsumResult<Option<Vec<SampledFrame>>> {
    match sample(subject, policy, grabber) {
        Ok(frames) if frames.is_empty() => Ok(None),
        Ok(frames) => Ok(Some(frames)),
        Err(err) if err.is_subject_level() => {
            tracing::warn!(index, %err, "skipping subject");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Downscale `image` to fit `cell`, keeping its aspect ratio. Never upscales.
fn fit_to_cell(image: RgbImage, cell: Size) -> RgbImage {
    let size = Size::new(image.width(), image.height());
    let target = size.fit_within(cell);
    if target == size {
        return image;
    }
    imageops::resize(&image, target.w, target.h, FilterType::Triangle)
}

/// Resize `image` up or down to the largest aspect-preserving size within `bounds`.
fn scale_into(image: &RgbImage, bounds: Size) -> RgbImage {
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    let scale = (f64::from(bounds.w) / w).min(f64::from(bounds.h) / h);
    let target_w = ((w * scale).round() as u32).clamp(1, bounds.w);
    let target_h = ((h * scale).round() as u32).clamp(1, bounds.h);
    imageops::resize(image, target_w, target_h, FilterType::Triangle)
}

fn subject_label(index: usize, subject: &Subject) -> OutputLabel {
    match subject {
        Subject::Shot(_) => OutputLabel::Shot { index },
        Subject::Object(obj) => OutputLabel::Object {
            index,
            label: obj.label.clone(),
            confidence_pct: obj.confidence_percent(),
            frame_count: obj.frame_count(),
        },
    }
}
