//! Vidsum turns time-coded video annotations into visual summaries.
//!
//! Given detected shots or tracked objects and the source video, it produces:
//!
//! - a still grid mosaic with one frame per subject
//! - an animated grid mosaic sampled across each shot
//! - one short animation per subject
//!
//! Each output is encoded into several image containers (JPEG, PNG/APNG, GIF, WebP).
#![forbid(unsafe_code)]

mod foundation;

pub mod annotations;
pub mod config;
pub mod encode;
pub mod layout;
pub mod media;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod storage;

pub use crate::foundation::core::{PixelRect, Point, Rect, Rgba8, Size};
pub use crate::foundation::error::{VidsumError, VidsumResult};

pub use crate::annotations::filter::{FilterPolicy, filter};
pub use crate::annotations::json::parse_annotations;
pub use crate::annotations::model::{
    AnnotationSet, Detector, ObjectFrame, ObjectSubject, RawSubject, ShotSubject, Subject,
};
pub use crate::config::SummaryConfig;
pub use crate::encode::codec::{ImageCodec, StandardCodec};
pub use crate::encode::format::{ContainerFormat, OutputFormatSpec};
pub use crate::encode::multi::{EncodeReport, EncodedImage, FormatFailure, encode};
pub use crate::layout::grid::{GridGeometry, plan};
pub use crate::media::ffmpeg::{FfmpegGrabber, FfmpegOpener, is_ffmpeg_on_path};
pub use crate::media::grabber::{FrameGrabber, MediaOpener, SampledFrame};
pub use crate::media::sampler::{FrameSamples, SamplePolicy, sample};
pub use crate::overlay::compositor::composite;
pub use crate::overlay::style::{AnonymizeMode, OverlayStyle};
pub use crate::pipeline::{
    SummaryOutcome, SummaryReport, WrittenOutput, detect_and_summarize, summarize,
};
pub use crate::render::assembler::{
    Assembly, AssemblyState, OutputLabel, RenderMode, RenderedOutput, SummaryAssembler,
};
pub use crate::render::output::{AnimationFrame, RenderedImage};
pub use crate::storage::local::{LocalMedia, LocalStore, MediaStore};
