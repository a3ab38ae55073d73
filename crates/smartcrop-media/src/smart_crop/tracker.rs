//! Temporal smoothing of the primary face across sampled frames.
//!
//! One tracker follows one subject. It smooths the box with an exponential
//! moving average, bridges short detection gaps by carrying the last box
//! forward with decaying confidence, and restarts from scratch on long
//! gaps or implausible jumps.

use smartcrop_models::{FaceDetection, StabilizedFace};
use tracing::debug;

use super::config::TrackerConfig;
use crate::metrics;

/// EMA tracker for a single subject.
///
/// Frames must be fed in increasing frame-index order; the tracker is not
/// meant to be shared between concurrent writers.
#[derive(Debug, Clone)]
pub struct TemporalTracker {
    config: TrackerConfig,
    frame_width: f64,
    /// `None` while no subject is tracked
    state: Option<StabilizedFace>,
}

impl TemporalTracker {
    /// Create an empty tracker for frames `frame_width` pixels wide.
    pub fn new(frame_width: u32, config: TrackerConfig) -> Self {
        Self {
            config,
            frame_width: frame_width as f64,
            state: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_some()
    }

    /// Stored state, without any carry-forward decay applied.
    pub fn current(&self) -> Option<&StabilizedFace> {
        self.state.as_ref()
    }

    /// Drop the tracked subject.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Feed the primary detection of frame `frame_index` (or its absence).
    pub fn update(
        &mut self,
        detection: Option<&FaceDetection>,
        frame_index: u64,
    ) -> Option<StabilizedFace> {
        match (detection, self.state) {
            (None, None) => None,
            (None, Some(stored)) => {
                let missed = frame_index.saturating_sub(stored.last_seen);
                if missed > self.config.max_missed_frames {
                    debug!(
                        frame = frame_index,
                        missed, "Tracking lost after missed frames"
                    );
                    metrics::record_tracker_reset("lost");
                    self.state = None;
                    return None;
                }

                // Carry-forward is a read: stored state stays untouched
                let decay = self.config.confidence_decay.powi(missed as i32);
                Some(StabilizedFace {
                    bbox: stored.bbox,
                    confidence: stored.confidence * decay,
                    last_seen: stored.last_seen,
                })
            }
            (Some(det), None) => Some(self.initialize(det, frame_index)),
            (Some(det), Some(stored)) => {
                let jump = det.center().distance(&stored.center());
                if jump > self.frame_width * self.config.max_jump_ratio {
                    debug!(
                        frame = frame_index,
                        jump,
                        "Subject jump exceeds consistency bound, re-initializing"
                    );
                    metrics::record_tracker_reset("jump");
                    return Some(self.initialize(det, frame_index));
                }

                let smoothed = StabilizedFace {
                    bbox: stored.bbox.blend(&det.bbox, self.config.ema_alpha),
                    confidence: det.confidence,
                    last_seen: frame_index.max(stored.last_seen),
                };
                self.state = Some(smoothed);
                Some(smoothed)
            }
        }
    }

    fn initialize(&mut self, det: &FaceDetection, frame_index: u64) -> StabilizedFace {
        let face = StabilizedFace {
            bbox: det.bbox,
            confidence: det.confidence,
            last_seen: frame_index,
        };
        self.state = Some(face);
        face
    }
}
