use crate::annotations::model::{AnnotationSet, Detector, Subject};
use crate::config::SummaryConfig;
use crate::encode::codec::ImageCodec;
use crate::encode::format::ContainerFormat;
use crate::encode::multi::{FormatFailure, encode};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::media::grabber::MediaOpener;
use crate::render::assembler::{Assembly, OutputLabel, SummaryAssembler};
use crate::storage::local::{LocalMedia, MediaStore};
use crate::storage::naming::{output_path, video_uri_from_annotation};

/// One output written through the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenOutput {
    pub label: OutputLabel,
    pub format: ContainerFormat,
    pub destination: String,
    pub content_type: &'static str,
    pub byte_len: usize,
}

#[derive(Debug, Default)]
pub struct SummaryReport {
    pub written: Vec<WrittenOutput>,
    /// Formats that failed to encode; their siblings were still written.
    pub failures: Vec<(OutputLabel, FormatFailure)>,
}

#[derive(Debug)]
pub enum SummaryOutcome {
    /// Nothing survived filtering, or no subject could be sampled. No media was encoded.
    NoRenderableContent,
    Written(SummaryReport),
}

/// Summarize the video annotated by `annotation_uri`.
///
/// Order: read annotations, filter, fetch the video, open a grabber, assemble, encode per
/// format, write. The grabber is closed before the local media copy is released, and the
/// copy is released on every exit path.
#[tracing::instrument(skip(store, opener, codec, config), fields(mode = ?config.mode))]
pub fn summarize<S, O, C>(
    annotation_uri: &str,
    store: &S,
    opener: &O,
    codec: &C,
    config: &SummaryConfig,
) -> VidsumResult<SummaryOutcome>
where
    S: MediaStore + ?Sized,
    O: MediaOpener + ?Sized,
    C: ImageCodec + ?Sized,
{
    config.validate()?;
    let video_uri = video_uri_from_annotation(annotation_uri)?;
    let annotations = store.read_annotations(annotation_uri)?;

    let mut assembler = SummaryAssembler::new(config);
    let subjects = assembler.filter(&annotations);
    if subjects.is_empty() {
        tracing::info!("no renderable subjects after filtering");
        return Ok(SummaryOutcome::NoRenderableContent);
    }

    let media = store.fetch_video(&video_uri)?;
    render_and_write(&video_uri, &media, &subjects, &mut assembler, store, opener, codec)
}

/// Annotate `video_uri` with `detector`, then summarize it as [`summarize`] does.
///
/// The video is fetched once: the detector reads the leased copy and the grabber opens the
/// same file.
#[tracing::instrument(skip(detector, store, opener, codec, config), fields(mode = ?config.mode))]
pub fn detect_and_summarize<D, S, O, C>(
    video_uri: &str,
    detector: &D,
    store: &S,
    opener: &O,
    codec: &C,
    config: &SummaryConfig,
) -> VidsumResult<SummaryOutcome>
where
    D: Detector + ?Sized,
    S: MediaStore + ?Sized,
    O: MediaOpener + ?Sized,
    C: ImageCodec + ?Sized,
{
    config.validate()?;
    let media = store.fetch_video(video_uri)?;
    let video_bytes = std::fs::read(media.path()).map_err(|e| {
        VidsumError::storage(format!("read '{}': {e}", media.path().display()))
    })?;
    let annotations: AnnotationSet = detector.detect(&video_bytes)?;
    drop(video_bytes);
    tracing::debug!(subjects = annotations.len(), "detection complete");

    let mut assembler = SummaryAssembler::new(config);
    let subjects = assembler.filter(&annotations);
    if subjects.is_empty() {
        tracing::info!("no renderable subjects after filtering");
        return Ok(SummaryOutcome::NoRenderableContent);
    }
    render_and_write(video_uri, &media, &subjects, &mut assembler, store, opener, codec)
}

fn render_and_write<S, O, C>(
    video_uri: &str,
    media: &LocalMedia,
    subjects: &[Subject],
    assembler: &mut SummaryAssembler<'_>,
    store: &S,
    opener: &O,
    codec: &C,
) -> VidsumResult<SummaryOutcome>
where
    S: MediaStore + ?Sized,
    O: MediaOpener + ?Sized,
    C: ImageCodec + ?Sized,
{
    let config = assembler.config();
    let assembly = {
        let mut grabber = opener.open(media.path())?;
        assembler.render(subjects, &mut grabber, config.mode)?
    };

    let outputs = match assembly {
        Assembly::Empty => {
            tracing::info!("no subject could be rendered");
            return Ok(SummaryOutcome::NoRenderableContent);
        }
        Assembly::Rendered(outputs) => outputs,
    };

    let mut report = SummaryReport::default();
    for output in outputs {
        let formats = config.formats_for(output.image.is_animated());
        let encoded = encode(&output.image, formats, codec);
        for image in encoded.outputs {
            let destination = output_path(video_uri, &output.label, image.format)
                .to_string_lossy()
                .into_owned();
            store.write_output(&image.bytes, &destination, image.content_type)?;
            report.written.push(WrittenOutput {
                label: output.label.clone(),
                format: image.format,
                destination,
                content_type: image.content_type,
                byte_len: image.bytes.len(),
            });
        }
        report.failures.extend(
            encoded
                .failures
                .into_iter()
                .map(|failure| (output.label.clone(), failure)),
        );
    }
    tracing::info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "summary complete"
    );
    Ok(SummaryOutcome::Written(report))
}
