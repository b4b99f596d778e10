use crate::annotations::model::{ObjectFrame, ObjectSubject, RawSubject, ShotSubject, Subject};
use crate::foundation::core::{Point, Rect};

/// Thresholds applied to tracked objects. Shots are never gated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    pub min_confidence: f64,
    pub min_frame_count: usize,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            min_frame_count: 10,
        }
    }
}

impl FilterPolicy {
    /// Keep everything that is structurally valid.
    pub fn permissive() -> Self {
        Self {
            min_confidence: 0.0,
            min_frame_count: 0,
        }
    }

    fn accepts(&self, confidence: f64, frame_count: usize) -> bool {
        self.min_confidence <= confidence && self.min_frame_count <= frame_count
    }
}

/// Validate and filter raw annotations into renderable subjects, preserving input order.
///
/// Never fails: dropped entries are only logged, and an empty result means there is nothing
/// to render.
pub fn filter(raw: &[RawSubject], policy: &FilterPolicy) -> Vec<Subject> {
    let mut out = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        match entry {
            RawSubject::Shot { start_ns, end_ns } => {
                if start_ns > end_ns {
                    tracing::debug!(index, start_ns, end_ns, "dropping inverted shot interval");
                    continue;
                }
                out.push(Subject::Shot(ShotSubject {
                    start_ns: *start_ns,
                    end_ns: *end_ns,
                }));
            }
            RawSubject::Object {
                label,
                confidence,
                frames,
            } => {
                if frames.is_empty() {
                    tracing::debug!(index, label = %label, "dropping object without frames");
                    continue;
                }
                if !confidence.is_finite() {
                    tracing::debug!(index, label = %label, "dropping object with invalid confidence");
                    continue;
                }
                if !policy.accepts(*confidence, frames.len()) {
                    tracing::debug!(
                        index,
                        label = %label,
                        confidence,
                        frames = frames.len(),
                        "object below thresholds"
                    );
                    continue;
                }
                out.push(Subject::Object(ObjectSubject {
                    label: label.clone(),
                    confidence: confidence.clamp(0.0, 1.0),
                    frames: frames.iter().map(normalize_frame).collect(),
                }));
            }
        }
    }
    out
}

fn normalize_frame(frame: &ObjectFrame) -> ObjectFrame {
    ObjectFrame {
        timestamp_ns: frame.timestamp_ns,
        normalized_box: normalize_box(frame.normalized_box),
        landmarks: frame
            .landmarks
            .iter()
            .map(|p| Point::new(unit(p.x), unit(p.y)))
            .collect(),
    }
}

/// Clamp to the unit square and order the edges (`left <= right`, `top <= bottom`).
pub fn normalize_box(r: Rect) -> Rect {
    let (l, rr) = (unit(r.x0), unit(r.x1));
    let (t, b) = (unit(r.y0), unit(r.y1));
    Rect::new(l.min(rr), t.min(b), l.max(rr), t.max(b))
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
