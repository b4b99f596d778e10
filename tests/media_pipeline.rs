use std::path::Path;
use std::process::Command;

use vidsum::{
    FfmpegGrabber, FfmpegOpener, FrameGrabber, LocalStore, RenderMode, StandardCodec,
    SummaryConfig, SummaryOutcome, VidsumError, is_ffmpeg_on_path,
};

fn synth_video(path: &Path) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x36:rate=10",
            "-t",
            "2",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(path)
        .status()?;
    anyhow::ensure!(status.success(), "ffmpeg failed creating {}", path.display());
    Ok(())
}

const TWO_SHOTS: &str = r#"{"annotation_results":[{"shot_annotations":[
    {"start_time_offset":{},"end_time_offset":{"seconds":1}},
    {"start_time_offset":{"seconds":1},"end_time_offset":{"seconds":1,"nanos":900000000}}
]}]}"#;

#[test]
fn grabber_reads_frames_and_reports_the_end_of_stream() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    synth_video(&video).unwrap();

    let mut grabber = FfmpegGrabber::open(&video).unwrap();
    assert_eq!(grabber.frame_size(), vidsum::Size::new(64, 36));
    let frame = grabber.seek_and_read(500_000_000).unwrap();
    assert_eq!(frame.dimensions(), (64, 36));

    let err = grabber.seek_and_read(60_000_000_000).unwrap_err();
    assert!(matches!(err, VidsumError::FrameUnavailable(_)));
}

#[test]
fn still_and_animated_grids_are_written_next_to_the_video() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    synth_video(&video).unwrap();
    let annotation = dir.path().join("clip.mp4.json");
    std::fs::write(&annotation, TWO_SHOTS).unwrap();

    for (mode, expected) in [
        (RenderMode::StillGrid, "clip.mp4.summary002_still"),
        (RenderMode::AnimatedGrid, "clip.mp4.summary002_anim"),
    ] {
        let config = SummaryConfig {
            mode,
            animation_frames: 3,
            ..SummaryConfig::default()
        };
        let outcome = vidsum::summarize(
            annotation.to_str().unwrap(),
            &LocalStore::new(),
            &FfmpegOpener,
            &StandardCodec,
            &config,
        )
        .unwrap();
        let SummaryOutcome::Written(report) = outcome else {
            panic!("expected outputs for {mode:?}");
        };
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.written.len(), 3);
        for written in &report.written {
            let path = Path::new(&written.destination);
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with(expected), "{name}");
            assert!(std::fs::metadata(path).unwrap().len() > 0);
        }
    }
}
