use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::RgbImage;

use crate::foundation::core::{NANOS_PER_SECOND, Size};
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::media::grabber::{FrameGrabber, MediaOpener};

/// What the grabber needs to know about a video: where it is and how large its frames are.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub frame_size: Size,
    /// Average frame rate; 0 when ffprobe does not report one.
    pub fps: f64,
    pub duration_sec: f64,
}

pub fn is_ffmpeg_on_path() -> bool {
    tool_available("ffmpeg") && tool_available("ffprobe")
}

fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probe the first video stream of `source_path` with `ffprobe`.
pub fn probe_video(source_path: &Path) -> VidsumResult<VideoSourceInfo> {
    if !source_path.is_file() {
        return Err(VidsumError::cannot_open(format!(
            "'{}' is not a readable file",
            source_path.display()
        )));
    }
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate:format=duration",
            "-of",
            "json",
        ])
        .arg(source_path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| VidsumError::cannot_open(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(VidsumError::cannot_open(format!(
            "ffprobe rejected '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe(source_path, &out.stdout)
}

fn parse_probe(source_path: &Path, json: &[u8]) -> VidsumResult<VideoSourceInfo> {
    #[derive(serde::Deserialize, Default)]
    #[serde(default)]
    struct Stream {
        width: u32,
        height: u32,
        avg_frame_rate: String,
    }
    #[derive(serde::Deserialize, Default)]
    #[serde(default)]
    struct Format {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct Report {
        #[serde(default)]
        streams: Vec<Stream>,
        #[serde(default)]
        format: Format,
    }

    let report: Report = serde_json::from_slice(json)
        .map_err(|e| VidsumError::cannot_open(format!("unreadable ffprobe output: {e}")))?;
    let stream = report.streams.into_iter().next().unwrap_or_default();
    let frame_size = Size::new(stream.width, stream.height);
    if frame_size.is_empty() {
        return Err(VidsumError::cannot_open(format!(
            "no decodable video stream in '{}'",
            source_path.display()
        )));
    }
    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        frame_size,
        fps: frame_rate(&stream.avg_frame_rate).unwrap_or(0.0),
        duration_sec: report
            .format
            .duration
            .and_then(|d| d.parse().ok())
            .unwrap_or(0.0),
    })
}

/// `"30000/1001"` to frames per second; `None` for malformed or zero-denominator rates.
fn frame_rate(ratio: &str) -> Option<f64> {
    let (num, den) = ratio.split_once('/')?;
    let (num, den) = (num.parse::<u32>().ok()?, den.parse::<u32>().ok()?);
    (den != 0).then(|| f64::from(num) / f64::from(den))
}

/// Frame grabber backed by the system `ffmpeg`/`ffprobe` binaries.
///
/// Each read spawns one `ffmpeg` process with an input-side seek, so no decoder state is kept
/// between reads and nothing needs closing.
#[derive(Debug)]
pub struct FfmpegGrabber {
    source: VideoSourceInfo,
}

impl FfmpegGrabber {
    pub fn open(source_path: &Path) -> VidsumResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(VidsumError::cannot_open(
                "ffmpeg and ffprobe are required for frame grabbing, but were not found on PATH",
            ));
        }
        let source = probe_video(source_path)?;
        tracing::debug!(
            path = %source.source_path.display(),
            width = source.frame_size.w,
            height = source.frame_size.h,
            fps = source.fps,
            duration_sec = source.duration_sec,
            "opened video"
        );
        Ok(Self { source })
    }

    pub fn source(&self) -> &VideoSourceInfo {
        &self.source
    }
}

impl FrameGrabber for FfmpegGrabber {
    fn frame_size(&self) -> Size {
        self.source.frame_size
    }

    fn seek_and_read(&mut self, timestamp_ns: u64) -> VidsumResult<RgbImage> {
        let pos_sec = timestamp_ns as f64 / NANOS_PER_SECOND as f64;
        let out = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{pos_sec:.9}")])
            .arg("-i")
            .arg(&self.source.source_path)
            .args([
                "-frames:v",
                "1",
                "-an",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                VidsumError::frame_unavailable(format!("failed to run ffmpeg for video decode: {e}"))
            })?;

        if !out.status.success() {
            return Err(VidsumError::frame_unavailable(format!(
                "ffmpeg decode failed for '{}' @{pos_sec:.3}s: {}",
                self.source.source_path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let Size { w, h } = self.source.frame_size;
        let expected_len = w as usize * h as usize * 3;
        if out.stdout.len() < expected_len {
            // ffmpeg exits cleanly with no output when seeking past the last frame.
            return Err(VidsumError::frame_unavailable(format!(
                "no frame @{pos_sec:.3}s in '{}' (got {} bytes, expected {expected_len})",
                self.source.source_path.display(),
                out.stdout.len()
            )));
        }

        let mut data = out.stdout;
        data.truncate(expected_len);
        RgbImage::from_raw(w, h, data).ok_or_else(|| {
            VidsumError::frame_unavailable("decoded frame does not match the probed video size")
        })
    }
}

/// [`MediaOpener`] producing [`FfmpegGrabber`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl MediaOpener for FfmpegOpener {
    type Grabber = FfmpegGrabber;

    fn open(&self, local_media_path: &Path) -> VidsumResult<FfmpegGrabber> {
        FfmpegGrabber::open(local_media_path)
    }
}
