//! Video Intelligence `AnnotateVideoResponse` JSON, as written to `output_uri` by the
//! annotation service.
//!
//! Both the snake_case layout of stored results and the camelCase layout of REST responses
//! are accepted. Time offsets may be `{ "seconds": .., "nanos": .. }` objects (with numeric or
//! string fields) or protobuf duration strings such as `"1.500s"`. Missing proto3 fields
//! default to zero.

use crate::annotations::model::{AnnotationSet, ObjectFrame, RawSubject};
use crate::foundation::core::{NANOS_PER_SECOND, Point, Rect};
use crate::foundation::error::{VidsumError, VidsumResult};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AnnotateVideoResponse {
    #[serde(alias = "annotationResults")]
    annotation_results: Vec<VideoAnnotationResults>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct VideoAnnotationResults {
    #[serde(alias = "shotAnnotations")]
    shot_annotations: Vec<VideoSegment>,
    #[serde(alias = "objectAnnotations")]
    object_annotations: Vec<ObjectTrackingAnnotation>,
    #[serde(alias = "personDetectionAnnotations")]
    person_detection_annotations: Vec<TrackedAnnotation>,
    #[serde(alias = "faceDetectionAnnotations")]
    face_detection_annotations: Vec<TrackedAnnotation>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct VideoSegment {
    #[serde(alias = "startTimeOffset")]
    start_time_offset: TimeOffset,
    #[serde(alias = "endTimeOffset")]
    end_time_offset: TimeOffset,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Entity {
    description: String,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ObjectTrackingAnnotation {
    entity: Entity,
    confidence: f64,
    frames: Vec<ObjectTrackingFrame>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ObjectTrackingFrame {
    #[serde(alias = "normalizedBoundingBox")]
    normalized_bounding_box: NormalizedBox,
    #[serde(alias = "timeOffset")]
    time_offset: TimeOffset,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NormalizedBox {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TrackedAnnotation {
    tracks: Vec<Track>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Track {
    confidence: f64,
    #[serde(alias = "timestampedObjects")]
    timestamped_objects: Vec<TimestampedObject>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TimestampedObject {
    #[serde(alias = "normalizedBoundingBox")]
    normalized_bounding_box: NormalizedBox,
    #[serde(alias = "timeOffset")]
    time_offset: TimeOffset,
    landmarks: Vec<DetectedLandmark>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DetectedLandmark {
    point: NormalizedVertex,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NormalizedVertex {
    x: f64,
    y: f64,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum TimeOffset {
    Parts {
        #[serde(default)]
        seconds: IntField,
        #[serde(default)]
        nanos: IntField,
    },
    Duration(String),
}

impl Default for TimeOffset {
    fn default() -> Self {
        Self::Parts {
            seconds: IntField::Num(0),
            nanos: IntField::Num(0),
        }
    }
}

/// proto3 JSON encodes int64 as strings, int32 as numbers; accept both everywhere.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum IntField {
    Num(i64),
    Text(String),
}

impl Default for IntField {
    fn default() -> Self {
        Self::Num(0)
    }
}

impl IntField {
    fn value(&self) -> VidsumResult<i64> {
        match self {
            IntField::Num(n) => Ok(*n),
            IntField::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| VidsumError::annotation(format!("invalid integer '{s}': {e}"))),
        }
    }
}

impl TimeOffset {
    fn to_ns(&self) -> VidsumResult<u64> {
        let ns = match self {
            TimeOffset::Parts { seconds, nanos } => {
                i128::from(seconds.value()?) * i128::from(NANOS_PER_SECOND)
                    + i128::from(nanos.value()?)
            }
            TimeOffset::Duration(s) => parse_duration_ns(s)?,
        };
        u64::try_from(ns.max(0))
            .map_err(|_| VidsumError::annotation(format!("time offset out of range: {ns}ns")))
    }
}

/// Parse a protobuf JSON duration (`"12s"`, `"1.5s"`, `"0.000000001s"`).
fn parse_duration_ns(s: &str) -> VidsumResult<i128> {
    let bad = || VidsumError::annotation(format!("invalid duration '{s}'"));
    let body = s.trim().strip_suffix('s').ok_or_else(bad)?;
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));
    if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let secs: i128 = if secs.is_empty() {
        0
    } else {
        secs.parse().map_err(|_| bad())?
    };
    let nanos: i128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse().map_err(|_| bad())?
    };
    let total = secs
        .checked_mul(i128::from(NANOS_PER_SECOND))
        .and_then(|ns| ns.checked_add(nanos))
        .ok_or_else(|| VidsumError::annotation(format!("duration '{s}' is out of range")))?;
    Ok(if negative { -total } else { total })
}

impl NormalizedBox {
    fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

/// Decode annotation JSON into an [`AnnotationSet`].
///
/// Only the first video result is used (one video per annotation file). Shots come first,
/// then tracked objects, then person and face tracks, each in file order.
pub fn parse_annotations(bytes: &[u8]) -> VidsumResult<AnnotationSet> {
    let response: AnnotateVideoResponse = serde_json::from_slice(bytes)
        .map_err(|e| VidsumError::annotation(format!("annotation json parse failed: {e}")))?;
    let Some(results) = response.annotation_results.into_iter().next() else {
        return Err(VidsumError::annotation(
            "annotation json has no annotation_results",
        ));
    };
    if let Some(err) = &results.error {
        return Err(VidsumError::annotation(format!(
            "annotation service reported an error: {err}"
        )));
    }

    let mut subjects = Vec::new();
    for shot in &results.shot_annotations {
        subjects.push(RawSubject::Shot {
            start_ns: shot.start_time_offset.to_ns()?,
            end_ns: shot.end_time_offset.to_ns()?,
        });
    }

    for obj in &results.object_annotations {
        let mut frames = Vec::with_capacity(obj.frames.len());
        for f in &obj.frames {
            frames.push(ObjectFrame::new(
                f.time_offset.to_ns()?,
                f.normalized_bounding_box.to_rect(),
            ));
        }
        subjects.push(RawSubject::Object {
            label: obj.entity.description.clone(),
            confidence: obj.confidence,
            frames,
        });
    }

    for (label, annotations) in [
        ("person", &results.person_detection_annotations),
        ("face", &results.face_detection_annotations),
    ] {
        for track in annotations.iter().flat_map(|a| a.tracks.iter()) {
            let mut frames = Vec::with_capacity(track.timestamped_objects.len());
            for t in &track.timestamped_objects {
                let mut frame =
                    ObjectFrame::new(t.time_offset.to_ns()?, t.normalized_bounding_box.to_rect());
                frame.landmarks = t
                    .landmarks
                    .iter()
                    .map(|l| Point::new(l.point.x, l.point.y))
                    .collect();
                frames.push(frame);
            }
            subjects.push(RawSubject::Object {
                label: label.to_string(),
                confidence: track.confidence,
                frames,
            });
        }
    }

    Ok(AnnotationSet::new(subjects))
}
