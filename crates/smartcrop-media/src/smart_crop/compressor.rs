//! Timeline compression.
//!
//! Keeps only the change-points of a dense per-frame timeline: an entry
//! survives when its mode, its number of centers, or any center's x
//! position differs from the last entry that survived.

use smartcrop_models::TimelineEntry;
use tracing::debug;

/// Collapse redundant entries.
///
/// The first entry is always kept. Every entry is compared with the last
/// kept entry, not with its immediate predecessor, so slow drifts still
/// produce a change-point once they exceed `tolerance_px`. Compressing an
/// already compressed timeline returns it unchanged.
pub fn compress(entries: &[TimelineEntry], tolerance_px: f64) -> Vec<TimelineEntry> {
    let mut kept: Vec<TimelineEntry> = Vec::new();

    for entry in entries {
        let changed = match kept.last() {
            None => true,
            Some(last) => is_change_point(last, entry, tolerance_px),
        };
        if changed {
            kept.push(entry.clone());
        }
    }

    debug!(
        "Compressed timeline from {} to {} entries",
        entries.len(),
        kept.len()
    );
    kept
}

fn is_change_point(last: &TimelineEntry, entry: &TimelineEntry, tolerance_px: f64) -> bool {
    if entry.mode != last.mode {
        return true;
    }
    if entry.centers.len() != last.centers.len() {
        return true;
    }
    entry
        .centers
        .iter()
        .zip(&last.centers)
        .any(|(a, b)| (a.x - b.x).abs() > tolerance_px)
}
