//! Crop plan synthesis.
//!
//! Turns a compressed timeline into time-bounded segments, each with one
//! pane (center) or two stacked panes (split) whose horizontal crop offset
//! follows the recorded subject centers as a step function of time.

use smartcrop_models::{
    CompositionMode, CropPlan, HorizontalOffset, OffsetKeyframe, PaneSlot, PaneTransform,
    SegmentPlan, TimelineEntry,
};
use tracing::{debug, info};

use super::config::{OutputGeometry, SmartCropConfig};
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// A run of consecutive entries sharing one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    pub start_time: f64,
    pub end_time: f64,
    pub mode: CompositionMode,
    pub entries: &'a [TimelineEntry],
}

/// Group entries into segments.
///
/// A new segment starts on every mode change and whenever the current one
/// already holds `max_entries` entries. The first segment starts at 0, the
/// last one ends at `duration`, and every other segment ends where the next
/// one starts. The timeline must already be validated.
pub fn segment_timeline(
    entries: &[TimelineEntry],
    duration: f64,
    max_entries: usize,
) -> Vec<Segment<'_>> {
    let max_entries = max_entries.max(1);
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;

    for idx in 1..=entries.len() {
        let boundary = idx == entries.len()
            || entries[idx].mode != entries[start].mode
            || idx - start >= max_entries;
        if boundary {
            bounds.push((start, idx));
            start = idx;
        }
    }

    let count = bounds.len();
    bounds
        .iter()
        .enumerate()
        .map(|(i, &(from, to))| {
            let start_time = if i == 0 { 0.0 } else { entries[from].timestamp };
            let end_time = if i + 1 == count {
                duration
            } else {
                entries[to].timestamp
            };
            Segment {
                start_time,
                end_time,
                mode: entries[from].mode,
                entries: &entries[from..to],
            }
        })
        .collect()
}

/// Builds crop plans for one output geometry.
#[derive(Debug, Clone)]
pub struct CropPlanSynthesizer {
    output: OutputGeometry,
    max_segment_entries: usize,
}

impl Default for CropPlanSynthesizer {
    fn default() -> Self {
        Self::new(&SmartCropConfig::default())
    }
}

impl CropPlanSynthesizer {
    pub fn new(config: &SmartCropConfig) -> Self {
        Self {
            output: config.output.clone(),
            max_segment_entries: config.max_segment_entries,
        }
    }

    /// Synthesize the plan for a clip of `duration` seconds.
    ///
    /// # Errors
    /// - `EmptyTimeline` when there are no entries
    /// - `UnorderedTimeline` when timestamps are negative or not strictly increasing
    /// - `DurationBeforeTimeline` when the clip ends before the last entry
    /// - `InvalidFrameMetadata` for zero source dimensions or a non-finite duration
    pub fn synthesize(
        &self,
        timeline: &[TimelineEntry],
        duration: f64,
        source_width: u32,
        source_height: u32,
    ) -> MediaResult<CropPlan> {
        validate_timeline(timeline)?;

        if source_width == 0 || source_height == 0 {
            return Err(MediaError::invalid_metadata(format!(
                "source dimensions {}x{}",
                source_width, source_height
            )));
        }
        if !duration.is_finite() {
            return Err(MediaError::invalid_metadata(format!(
                "duration {}",
                duration
            )));
        }
        let last_timestamp = timeline[timeline.len() - 1].timestamp;
        if duration < last_timestamp {
            return Err(MediaError::DurationBeforeTimeline {
                duration,
                last_timestamp,
            });
        }

        let scale = self.output.height as f64 / source_height as f64;
        let scaled_width = (source_width as f64 * scale).floor() as u32;
        let geometry = PaneGeometry {
            scale,
            crop_width: self.output.width,
            max_offset: scaled_width.saturating_sub(self.output.width) as f64,
        };

        let segments: Vec<SegmentPlan> =
            segment_timeline(timeline, duration, self.max_segment_entries)
                .iter()
                .map(|segment| self.segment_plan(segment, &geometry))
                .collect();

        debug!(
            scaled_width,
            max_offset = geometry.max_offset,
            "Scaled source geometry"
        );
        info!(
            entries = timeline.len(),
            segments = segments.len(),
            duration,
            "Synthesized crop plan"
        );
        metrics::record_plan(segments.len());

        Ok(CropPlan {
            source_width,
            source_height,
            scaled_width,
            scaled_height: self.output.height,
            output_width: self.output.width,
            output_height: self.output.height,
            duration,
            segments,
        })
    }

    fn segment_plan(&self, segment: &Segment<'_>, geometry: &PaneGeometry) -> SegmentPlan {
        let panes = match segment.mode {
            CompositionMode::Center => vec![PaneTransform {
                slot: PaneSlot::Full,
                crop_width: self.output.width,
                crop_height: self.output.height,
                crop_y: 0,
                offset: geometry.offset_for(segment, 0),
            }],
            CompositionMode::Split => [PaneSlot::Top, PaneSlot::Bottom]
                .into_iter()
                .enumerate()
                .map(|(pane, slot)| PaneTransform {
                    slot,
                    crop_width: self.output.width,
                    crop_height: self.output.split_pane_height,
                    crop_y: self.output.split_crop_y,
                    offset: geometry.offset_for(segment, pane),
                })
                .collect(),
        };

        SegmentPlan {
            start_time: segment.start_time,
            end_time: segment.end_time,
            mode: segment.mode,
            panes,
        }
    }
}

/// Horizontal crop geometry in the scaled source.
struct PaneGeometry {
    scale: f64,
    crop_width: u32,
    max_offset: f64,
}

impl PaneGeometry {
    /// Horizontally centered crop, used when a center is missing.
    fn default_offset(&self) -> f64 {
        self.max_offset / 2.0
    }

    /// Crop left edge that centers source x-coordinate `x`, clamped to bounds.
    fn offset_for_center(&self, x: f64) -> f64 {
        (x * self.scale - self.crop_width as f64 / 2.0).clamp(0.0, self.max_offset)
    }

    fn entry_offset(&self, entry: &TimelineEntry, pane: usize) -> f64 {
        entry
            .center(pane)
            .map(|c| self.offset_for_center(c.x))
            .unwrap_or_else(|| self.default_offset())
    }

    /// Offset of pane `pane` over the segment.
    fn offset_for(&self, segment: &Segment<'_>, pane: usize) -> HorizontalOffset {
        if let [only] = segment.entries {
            return HorizontalOffset::Constant {
                offset: self.entry_offset(only, pane),
            };
        }

        let last = segment.entries.len() - 1;
        let keyframes = segment
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| OffsetKeyframe {
                start: if i == 0 {
                    segment.start_time
                } else {
                    entry.timestamp
                },
                end: if i == last {
                    segment.end_time
                } else {
                    segment.entries[i + 1].timestamp
                },
                offset: self.entry_offset(entry, pane),
            })
            .collect();

        HorizontalOffset::Keyframed { keyframes }
    }
}

fn validate_timeline(timeline: &[TimelineEntry]) -> MediaResult<()> {
    let Some(first) = timeline.first() else {
        return Err(MediaError::EmptyTimeline);
    };
    if !(first.timestamp >= 0.0) {
        return Err(MediaError::UnorderedTimeline {
            index: 0,
            timestamp: first.timestamp,
        });
    }
    for (index, pair) in timeline.windows(2).enumerate() {
        if !(pair[1].timestamp > pair[0].timestamp) {
            return Err(MediaError::UnorderedTimeline {
                index: index + 1,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
