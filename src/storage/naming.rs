use std::path::{Path, PathBuf};

use crate::encode::format::ContainerFormat;
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::render::assembler::OutputLabel;

pub const ANNOTATION_SUFFIX: &str = ".json";

/// `path/to/video.ext.json` -> `path/to/video.ext`.
pub fn video_uri_from_annotation(annotation_uri: &str) -> VidsumResult<String> {
    match annotation_uri.strip_suffix(ANNOTATION_SUFFIX) {
        Some(video) if !video.is_empty() && !video.ends_with('/') => Ok(video.to_string()),
        _ => Err(VidsumError::annotation(format!(
            "annotation uri '{annotation_uri}' must be '<video>{ANNOTATION_SUFFIX}'"
        ))),
    }
}

/// Output file name for `label` in `format`, derived from the video file name.
///
/// - grids: `video.ext.summary{NNN}_{still|anim}.{fmt}`
/// - shots: `video.ext.{index:03}_shot.{fmt}`
/// - objects: `video.ext.{index:03}_{label}_pct{conf}_fr{frames}.{fmt}`
pub fn output_name(video_name: &str, label: &OutputLabel, format: ContainerFormat) -> String {
    let ext = format.extension();
    let suffix = match label {
        OutputLabel::Grid {
            subject_count,
            animated,
        } => {
            let kind = if *animated { "anim" } else { "still" };
            format!("summary{subject_count:03}_{kind}")
        }
        OutputLabel::Shot { index } => format!("{index:03}_shot"),
        OutputLabel::Object {
            index,
            label,
            confidence_pct,
            frame_count,
        } => format!(
            "{index:03}_{}_pct{confidence_pct}_fr{frame_count}",
            sanitize_label(label)
        ),
    };
    format!("{video_name}.{suffix}.{ext}")
}

/// Output path next to `video_uri` (same directory, name from [`output_name`]).
pub fn output_path(video_uri: &str, label: &OutputLabel, format: ContainerFormat) -> PathBuf {
    let video = Path::new(video_uri);
    let video_name = video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = output_name(&video_name, label, format);
    match video.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_uris_map_to_their_video() {
        assert_eq!(
            video_uri_from_annotation("bucket/clips/cat.mp4.json").unwrap(),
            "bucket/clips/cat.mp4"
        );
        assert!(video_uri_from_annotation("bucket/clips/cat.mp4").is_err());
        assert!(video_uri_from_annotation(".json").is_err());
    }

    #[test]
    fn output_names_follow_the_summary_convention() {
        let grid = OutputLabel::Grid {
            subject_count: 7,
            animated: false,
        };
        assert_eq!(
            output_name("cat.mp4", &grid, ContainerFormat::Jpeg),
            "cat.mp4.summary007_still.jpeg"
        );

        let anim_grid = OutputLabel::Grid {
            subject_count: 12,
            animated: true,
        };
        assert_eq!(
            output_name("cat.mp4", &anim_grid, ContainerFormat::Webp),
            "cat.mp4.summary012_anim.webp"
        );

        assert_eq!(
            output_name("cat.mp4", &OutputLabel::Shot { index: 3 }, ContainerFormat::Gif),
            "cat.mp4.003_shot.gif"
        );

        let object = OutputLabel::Object {
            index: 0,
            label: "traffic light".to_string(),
            confidence_pct: 87,
            frame_count: 42,
        };
        assert_eq!(
            output_name("cat.mp4", &object, ContainerFormat::Png),
            "cat.mp4.000_traffic_light_pct87_fr42.png"
        );
    }

    #[test]
    fn output_paths_sit_next_to_the_video() {
        let path = output_path(
            "in/clips/cat.mp4",
            &OutputLabel::Shot { index: 0 },
            ContainerFormat::Png,
        );
        assert_eq!(path, Path::new("in/clips/cat.mp4.000_shot.png"));
    }
}
