use crate::foundation::core::{Point, Rect};
use crate::foundation::error::VidsumResult;

/// One tracked-object detection at a given video position.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectFrame {
    pub timestamp_ns: u64,
    /// `(left, top, right, bottom)` as fractions of the frame size.
    pub normalized_box: Rect,
    /// Normalized landmark positions (face/person detection only).
    #[serde(default)]
    pub landmarks: Vec<Point>,
}

impl ObjectFrame {
    pub fn new(timestamp_ns: u64, normalized_box: Rect) -> Self {
        Self {
            timestamp_ns,
            normalized_box,
            landmarks: Vec::new(),
        }
    }
}

/// Unvalidated annotation entry as decoded from the wire format.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RawSubject {
    Shot {
        start_ns: u64,
        end_ns: u64,
    },
    Object {
        label: String,
        confidence: f64,
        frames: Vec<ObjectFrame>,
    },
}

/// Annotation input, independent of its original encoding.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationSet {
    pub subjects: Vec<RawSubject>,
}

impl AnnotationSet {
    pub fn new(subjects: Vec<RawSubject>) -> Self {
        Self { subjects }
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Shot interval `[start_ns, end_ns]`; `start_ns <= end_ns`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotSubject {
    pub start_ns: u64,
    pub end_ns: u64,
}

/// Tracked object with at least one detection frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSubject {
    pub label: String,
    pub confidence: f64,
    pub frames: Vec<ObjectFrame>,
}

impl ObjectSubject {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0 + 0.5).floor() as u32
    }
}

/// A renderable annotated unit. Only [`crate::filter`] builds these.
#[derive(Clone, Debug, PartialEq)]
pub enum Subject {
    Shot(ShotSubject),
    Object(ObjectSubject),
}

impl From<&Subject> for RawSubject {
    fn from(subject: &Subject) -> Self {
        match subject {
            Subject::Shot(s) => RawSubject::Shot {
                start_ns: s.start_ns,
                end_ns: s.end_ns,
            },
            Subject::Object(o) => RawSubject::Object {
                label: o.label.clone(),
                confidence: o.confidence,
                frames: o.frames.clone(),
            },
        }
    }
}

/// Annotation acquisition collaborator (a remote detection service, in practice).
pub trait Detector {
    fn detect(&self, video_bytes: &[u8]) -> VidsumResult<AnnotationSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_percent_rounds_half_up() {
        let o = ObjectSubject {
            label: "car".to_string(),
            confidence: 0.696,
            frames: vec![ObjectFrame::new(0, Rect::new(0.0, 0.0, 1.0, 1.0))],
        };
        assert_eq!(o.confidence_percent(), 70);
    }

    #[test]
    fn subject_converts_back_to_raw() {
        let s = Subject::Shot(ShotSubject {
            start_ns: 5,
            end_ns: 9,
        });
        assert_eq!(
            RawSubject::from(&s),
            RawSubject::Shot {
                start_ns: 5,
                end_ns: 9
            }
        );
    }
}
