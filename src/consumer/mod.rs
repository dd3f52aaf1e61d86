//! Helpers for code that consumes a topic

use log::{info, warn};

/// What a newly observed frame id says about the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapReport {
    /// First frame seen
    First,
    /// Exactly one more than the previous id
    InOrder,
    /// `n` frames were never received
    Dropped(u64),
    /// Same id as the previous frame
    Repeated,
    /// Lower id than the previous frame, usually a publisher restart
    Regressed,
}

/// Tracks frame ids on one topic and counts the ones that never arrived
#[derive(Debug, Clone, Default)]
pub struct FrameGapDetector {
    topic: String,
    last: Option<u64>,
    observed: u64,
    dropped: u64,
}

impl FrameGapDetector {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Record `frame_id` and classify it against the previous one
    pub fn observe(&mut self, frame_id: u64) -> GapReport {
        self.observed += 1;
        let report = match self.last {
            None => GapReport::First,
            Some(last) if frame_id == last => GapReport::Repeated,
            Some(last) if frame_id < last => GapReport::Regressed,
            Some(last) => match frame_id - last - 1 {
                0 => GapReport::InOrder,
                n => GapReport::Dropped(n),
            },
        };

        match report {
            GapReport::Dropped(n) => {
                self.dropped += n;
                warn!(
                    "{}: dropped {} frame(s) between {} and {}",
                    self.topic,
                    n,
                    self.last.unwrap_or_default(),
                    frame_id
                );
            }
            GapReport::Regressed => info!(
                "{}: frame id went back from {} to {}, assuming a restart",
                self.topic,
                self.last.unwrap_or_default(),
                frame_id
            ),
            _ => {}
        }

        self.last = Some(frame_id);
        report
    }

    pub fn last_frame_id(&self) -> Option<u64> {
        self.last
    }

    /// Frames observed so far
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Total frames inferred missing
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Forget the previous id; the next frame reports [`GapReport::First`]
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_gap() {
        let mut detector = FrameGapDetector::new("nodar/left/image/raw");
        assert_eq!(detector.observe(5), GapReport::First);
        assert_eq!(detector.observe(6), GapReport::InOrder);
        assert_eq!(detector.observe(8), GapReport::Dropped(1));
        assert_eq!(detector.dropped(), 1);
        assert_eq!(detector.observed(), 3);
    }

    #[test]
    fn test_dropped_total_accumulates() {
        let mut detector = FrameGapDetector::new("t");
        for id in [1, 4, 5, 15] {
            detector.observe(id);
        }
        assert_eq!(detector.dropped(), 2 + 9);
    }

    #[test]
    fn test_repeat_and_restart() {
        let mut detector = FrameGapDetector::new("t");
        detector.observe(100);
        assert_eq!(detector.observe(100), GapReport::Repeated);
        assert_eq!(detector.observe(3), GapReport::Regressed);
        assert_eq!(detector.observe(4), GapReport::InOrder);
        assert_eq!(detector.dropped(), 0);

        detector.reset();
        assert_eq!(detector.observe(50), GapReport::First);
        assert_eq!(detector.last_frame_id(), Some(50));
    }
}
