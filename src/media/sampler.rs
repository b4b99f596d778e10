use crate::annotations::model::Subject;
use crate::foundation::error::{VidsumError, VidsumResult};
use crate::media::grabber::{FrameGrabber, SampledFrame};

/// Which video positions illustrate a subject.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SamplePolicy {
    /// The subject's first timestamp (shot start, first detection).
    SingleFrame,
    /// A position inside the subject, `0.0` = first, `1.0` = last.
    InterpolatedFrame(f64),
    /// Up to `max_count` samples: every detection of an object (truncated), or evenly spaced
    /// interior positions of a shot.
    AllFrames(usize),
}

/// One position to request from the grabber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleTarget {
    pub timestamp_ns: u64,
    pub detection: Option<usize>,
}

fn check_ratio(ratio: f64) -> VidsumResult<f64> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(VidsumError::invalid_input(format!(
            "sample ratio must be within [0, 1] (got {ratio})"
        )));
    }
    Ok(ratio)
}

/// `k` evenly spaced interior ratios `(i + 1) / (k + 1)`.
pub fn even_ratios(k: usize) -> impl Iterator<Item = f64> {
    (0..k).map(move |i| (i + 1) as f64 / (k + 1) as f64)
}

/// Resolve the positions `policy` asks for on `subject`, in playback order.
pub fn sample_targets(subject: &Subject, policy: SamplePolicy) -> VidsumResult<Vec<SampleTarget>> {
    let targets = match (subject, policy) {
        (Subject::Shot(shot), SamplePolicy::SingleFrame) => vec![SampleTarget {
            timestamp_ns: shot.start_ns,
            detection: None,
        }],
        (Subject::Shot(shot), SamplePolicy::InterpolatedFrame(ratio)) => {
            let ratio = check_ratio(ratio)?;
            vec![SampleTarget {
                timestamp_ns: interpolate_ns(shot.start_ns, shot.end_ns, ratio),
                detection: None,
            }]
        }
        (Subject::Shot(shot), SamplePolicy::AllFrames(k)) => even_ratios(k)
            .map(|ratio| SampleTarget {
                timestamp_ns: interpolate_ns(shot.start_ns, shot.end_ns, ratio),
                detection: None,
            })
            .collect(),
        (Subject::Object(obj), SamplePolicy::SingleFrame) => obj
            .frames
            .first()
            .map(|f| SampleTarget {
                timestamp_ns: f.timestamp_ns,
                detection: Some(0),
            })
            .into_iter()
            .collect(),
        (Subject::Object(obj), SamplePolicy::InterpolatedFrame(ratio)) => {
            let ratio = check_ratio(ratio)?;
            if obj.frames.is_empty() {
                Vec::new()
            } else {
                let last = obj.frames.len() - 1;
                let idx = ((ratio * last as f64) + 0.5).floor() as usize;
                let idx = idx.min(last);
                vec![SampleTarget {
                    timestamp_ns: obj.frames[idx].timestamp_ns,
                    detection: Some(idx),
                }]
            }
        }
        (Subject::Object(obj), SamplePolicy::AllFrames(max_count)) => obj
            .frames
            .iter()
            .take(max_count)
            .enumerate()
            .map(|(idx, f)| SampleTarget {
                timestamp_ns: f.timestamp_ns,
                detection: Some(idx),
            })
            .collect(),
    };
    Ok(targets)
}

fn interpolate_ns(start_ns: u64, end_ns: u64, ratio: f64) -> u64 {
    let span = end_ns.saturating_sub(start_ns) as f64;
    start_ns + (ratio * span + 0.5).floor() as u64
}

/// Pull-based, single-pass frame reads for one subject.
///
/// Each `next()` performs exactly one grabber read. After the first failure the error is
/// yielded once and the iterator is exhausted: a subject is either fully sampled or skipped.
pub struct FrameSamples<'g, G: FrameGrabber + ?Sized> {
    grabber: &'g mut G,
    targets: std::vec::IntoIter<SampleTarget>,
    failed: bool,
}

impl<'g, G: FrameGrabber + ?Sized> FrameSamples<'g, G> {
    pub fn new(
        subject: &Subject,
        policy: SamplePolicy,
        grabber: &'g mut G,
    ) -> VidsumResult<Self> {
        Ok(Self {
            grabber,
            targets: sample_targets(subject, policy)?.into_iter(),
            failed: false,
        })
    }

    pub fn remaining(&self) -> usize {
        if self.failed { 0 } else { self.targets.len() }
    }
}

impl<G: FrameGrabber + ?Sized> Iterator for FrameSamples<'_, G> {
    type Item = VidsumResult<SampledFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let target = self.targets.next()?;
        match self.grabber.seek_and_read(target.timestamp_ns) {
            Ok(image) => Some(Ok(SampledFrame {
                image,
                timestamp_ns: target.timestamp_ns,
                detection: target.detection,
            })),
            Err(err) => {
                self.failed = true;
                Some(Err(match err {
                    VidsumError::FrameUnavailable(_) => err,
                    other => VidsumError::frame_unavailable(format!(
                        "@{}ns: {other}",
                        target.timestamp_ns
                    )),
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl<G: FrameGrabber + ?Sized> std::iter::FusedIterator for FrameSamples<'_, G> {}

/// Read every sample of `subject` eagerly; the first grabber failure aborts the subject.
pub fn sample<G: FrameGrabber + ?Sized>(
    subject: &Subject,
    policy: SamplePolicy,
    grabber: &mut G,
) -> VidsumResult<Vec<SampledFrame>> {
    FrameSamples::new(subject, policy, grabber)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::model::{ObjectFrame, ObjectSubject, ShotSubject};
    use crate::foundation::core::{Rect, Size};
    use image::RgbImage;

    struct ScriptedGrabber {
        fail_at_or_after_ns: u64,
        reads: Vec<u64>,
    }

    impl FrameGrabber for ScriptedGrabber {
        fn frame_size(&self) -> Size {
            Size::new(4, 2)
        }

        fn seek_and_read(&mut self, timestamp_ns: u64) -> VidsumResult<RgbImage> {
            self.reads.push(timestamp_ns);
            if timestamp_ns >= self.fail_at_or_after_ns {
                return Err(VidsumError::frame_unavailable("past end of stream"));
            }
            Ok(RgbImage::new(4, 2))
        }
    }

    fn shot(start_ns: u64, end_ns: u64) -> Subject {
        Subject::Shot(ShotSubject { start_ns, end_ns })
    }

    fn object(frames: usize) -> Subject {
        Subject::Object(ObjectSubject {
            label: "dog".to_string(),
            confidence: 0.9,
            frames: (0..frames as u64)
                .map(|i| ObjectFrame::new(1_000 + i * 10, Rect::new(0.0, 0.0, 0.5, 0.5)))
                .collect(),
        })
    }

    fn timestamps(subject: &Subject, policy: SamplePolicy) -> Vec<u64> {
        sample_targets(subject, policy)
            .unwrap()
            .into_iter()
            .map(|t| t.timestamp_ns)
            .collect()
    }

    #[test]
    fn shot_policies_resolve_positions() {
        let s = shot(1_000, 2_000);
        assert_eq!(timestamps(&s, SamplePolicy::SingleFrame), vec![1_000]);
        assert_eq!(timestamps(&s, SamplePolicy::InterpolatedFrame(0.5)), vec![1_500]);
        assert_eq!(timestamps(&s, SamplePolicy::InterpolatedFrame(1.0)), vec![2_000]);
        assert_eq!(
            timestamps(&s, SamplePolicy::AllFrames(3)),
            vec![1_250, 1_500, 1_750]
        );
    }

    #[test]
    fn object_policies_follow_detections() {
        let o = object(20);
        assert_eq!(timestamps(&o, SamplePolicy::SingleFrame), vec![1_000]);
        assert_eq!(timestamps(&o, SamplePolicy::InterpolatedFrame(1.0)), vec![1_190]);
        let all = sample_targets(&o, SamplePolicy::AllFrames(12)).unwrap();
        assert_eq!(all.len(), 12);
        assert_eq!(all[11].detection, Some(11));
        assert_eq!(all[11].timestamp_ns, 1_110);
    }

    #[test]
    fn out_of_range_ratios_are_invalid_input() {
        let err = sample_targets(&shot(0, 10), SamplePolicy::InterpolatedFrame(1.5)).unwrap_err();
        assert!(matches!(err, VidsumError::InvalidInput(_)));
    }

    #[test]
    fn first_failure_aborts_the_subject() {
        let mut grabber = ScriptedGrabber {
            fail_at_or_after_ns: 1_020,
            reads: Vec::new(),
        };
        let err = sample(&object(5), SamplePolicy::AllFrames(5), &mut grabber).unwrap_err();
        assert!(matches!(err, VidsumError::FrameUnavailable(_)));
        assert_eq!(grabber.reads, vec![1_000, 1_010, 1_020]);
    }

    #[test]
    fn iterator_is_single_pass_and_fused_after_error() {
        let mut grabber = ScriptedGrabber {
            fail_at_or_after_ns: 1_010,
            reads: Vec::new(),
        };
        let subject = object(4);
        let mut it = FrameSamples::new(&subject, SamplePolicy::AllFrames(4), &mut grabber).unwrap();
        assert!(it.next().unwrap().is_ok());
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
        assert_eq!(it.remaining(), 0);
    }

    #[test]
    fn samples_carry_their_detection_index() {
        let mut grabber = ScriptedGrabber {
            fail_at_or_after_ns: u64::MAX,
            reads: Vec::new(),
        };
        let frames = sample(&object(3), SamplePolicy::AllFrames(10), &mut grabber).unwrap();
        let idx: Vec<_> = frames.iter().map(|f| f.detection).collect();
        assert_eq!(idx, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(frames[2].timestamp_ns, 1_020);
    }
}
