//! FFmpeg filter-graph serialization of crop plans.
//!
//! The script reads the source on `[0:v]`, fans it out to one chain per
//! segment, crops and trims each chain to its segment, and concatenates
//! the chains into `[out]`.
//!
//! Keyframed offsets become a nested `if(lt(t,end),offset,...)` chain
//! evaluated on source time. Each keyframe covers `[start, end)` and the
//! last one extends to the end of the segment, so every frame time maps to
//! exactly one offset. Times are printed at full precision so boundaries
//! land on the same frames as in the plan.

use smartcrop_models::{CropPlan, HorizontalOffset, PaneTransform, SegmentPlan};

/// Serialization of a plan into an FFmpeg `filter_complex` script.
pub trait FilterScript {
    /// Deterministic script; the final video stream is labelled `[out]`.
    fn to_filter_script(&self) -> String;
}

impl FilterScript for CropPlan {
    fn to_filter_script(&self) -> String {
        let count = self.segments.len();
        let mut chains: Vec<String> = Vec::with_capacity(count + 2);

        if count > 1 {
            let labels: String = (0..count).map(|i| format!("[v{}]", i)).collect();
            chains.push(format!("[0:v]split={}{}", count, labels));
        } else {
            chains.push("[0:v]copy[v0]".to_string());
        }

        for (i, segment) in self.segments.iter().enumerate() {
            segment_chains(self, segment, i, &mut chains);
        }

        if count > 1 {
            let outputs: String = (0..count).map(|i| format!("[c{}]", i)).collect();
            chains.push(format!("{}concat=n={}:v=1:a=0[out]", outputs, count));
        } else {
            chains.push("[c0]null[out]".to_string());
        }

        chains.join(";\n")
    }
}

fn segment_chains(plan: &CropPlan, segment: &SegmentPlan, i: usize, chains: &mut Vec<String>) {
    let trim = format!(
        "trim=start={}:end={},setpts=PTS-STARTPTS",
        seconds(segment.start_time),
        seconds(segment.end_time)
    );

    match segment.panes.as_slice() {
        [top, bottom] => {
            chains.push(format!("[v{i}]split=2[left{i}][right{i}]"));
            chains.push(format!(
                "[left{i}]{},{}[left_scaled{i}]",
                crop_filter(plan, top),
                trim
            ));
            chains.push(format!(
                "[right{i}]{},{}[right_scaled{i}]",
                crop_filter(plan, bottom),
                trim
            ));
            chains.push(format!(
                "[left_scaled{i}][right_scaled{i}]vstack=inputs=2,setsar=1[c{i}]"
            ));
        }
        panes => {
            let crop = panes
                .first()
                .map(|pane| crop_filter(plan, pane))
                .unwrap_or_else(|| centered_crop(plan));
            chains.push(format!("[v{i}]{},{},setsar=1[c{i}]", crop, trim));
        }
    }
}

fn crop_filter(plan: &CropPlan, pane: &PaneTransform) -> String {
    format!(
        "scale=-1:{},crop=w={}:h={}:x='{}':y={}",
        plan.scaled_height,
        pane.crop_width,
        pane.crop_height,
        offset_expr(&pane.offset),
        pane.crop_y
    )
}

fn centered_crop(plan: &CropPlan) -> String {
    format!(
        "scale=-1:{},crop=w={}:h={}:x='{:.2}':y=0",
        plan.scaled_height,
        plan.output_width,
        plan.output_height,
        plan.scaled_width.saturating_sub(plan.output_width) as f64 / 2.0
    )
}

/// FFmpeg expression for a horizontal offset.
pub fn offset_expr(offset: &HorizontalOffset) -> String {
    match offset {
        HorizontalOffset::Constant { offset } => format!("{:.2}", offset),
        HorizontalOffset::Keyframed { keyframes } => match keyframes.split_last() {
            Some((last, inner)) => {
                let mut expr = String::new();
                for k in inner {
                    expr.push_str(&format!("if(lt(t,{}),{:.2},", seconds(k.end), k.offset));
                }
                expr.push_str(&format!("{:.2}", last.offset));
                expr.push_str(&")".repeat(inner.len()));
                expr
            }
            None => "0".to_string(),
        },
    }
}

/// Shortest decimal form that parses back to the same `f64`.
fn seconds(t: f64) -> String {
    format!("{}", t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smart_crop::CropPlanSynthesizer;
    use smartcrop_models::{CompositionMode, OffsetKeyframe, Point, TimelineEntry};

    fn center(t: f64, x: f64) -> TimelineEntry {
        TimelineEntry::with_centers(t, CompositionMode::Center, vec![Point::new(x, 540.0)])
    }

    #[test]
    fn test_constant_expr() {
        assert_eq!(
            offset_expr(&HorizontalOffset::Constant { offset: 1166.666 }),
            "1166.67"
        );
    }

    /// Evaluate an `offset_expr` chain at source time `t`.
    fn eval_offset(expr: &str, t: f64) -> f64 {
        let mut rest = expr;
        while let Some(tail) = rest.strip_prefix("if(lt(t,") {
            let (end, tail) = tail.split_once("),").unwrap();
            let (value, tail) = tail.split_once(',').unwrap();
            if t < end.parse::<f64>().unwrap() {
                return value.parse().unwrap();
            }
            rest = tail;
        }
        rest.trim_end_matches(')').parse().unwrap()
    }

    #[test]
    fn test_keyframed_expr_is_half_open_chain() {
        let offset = HorizontalOffset::Keyframed {
            keyframes: vec![
                OffsetKeyframe { start: 0.0, end: 1.0, offset: 100.0 },
                OffsetKeyframe { start: 1.0, end: 2.5, offset: 200.5 },
                OffsetKeyframe { start: 2.5, end: 4.0, offset: 50.0 },
            ],
        };
        let expr = offset_expr(&offset);
        assert_eq!(expr, "if(lt(t,1),100.00,if(lt(t,2.5),200.50,50.00))");

        assert_eq!(eval_offset(&expr, 0.999), 100.0);
        assert_eq!(eval_offset(&expr, 1.0), 200.5);
        assert_eq!(eval_offset(&expr, 2.5), 50.0);
        assert_eq!(eval_offset(&expr, 4.0), 50.0);
    }

    #[test]
    fn test_keyframed_expr_matches_plan_at_fractional_rates() {
        // Three samples per second, so entry times are not exact in decimal
        let timeline: Vec<_> = (0..12)
            .map(|k| center(k as f64 / 3.0, 600.0 + (k % 4) as f64 * 150.0))
            .collect();
        let plan = CropPlanSynthesizer::default()
            .synthesize(&timeline, 4.0, 1920, 1080)
            .unwrap();
        let offset = &plan.segments[0].panes[0].offset;
        assert!(!offset.is_constant());
        let expr = offset_expr(offset);

        let entry_times = timeline.iter().map(|e| e.timestamp);
        // Frame times of a 30 fps source over the same range
        let frame_times = (0..120).map(|f| f as f64 / 30.0);
        for t in entry_times.chain(frame_times) {
            let expected = offset.offset_at(t).unwrap();
            let actual = eval_offset(&expr, t);
            assert!(
                (actual - expected).abs() < 0.005,
                "t={t}: script {actual}, plan {expected}"
            );
        }
    }

    #[test]
    fn test_single_segment_script() {
        let plan = CropPlanSynthesizer::default()
            .synthesize(&[center(0.0, 960.0)], 10.0, 1920, 1080)
            .unwrap();
        let script = plan.to_filter_script();

        assert_eq!(
            script,
            "[0:v]copy[v0];\n\
             [v0]scale=-1:1920,crop=w=1080:h=1920:x='1166.67':y=0,\
             trim=start=0:end=10,setpts=PTS-STARTPTS,setsar=1[c0];\n\
             [c0]null[out]"
        );
    }

    #[test]
    fn test_multi_segment_script() {
        let timeline = vec![
            center(0.0, 960.0),
            TimelineEntry::with_centers(
                3.0,
                CompositionMode::Split,
                vec![Point::new(480.0, 540.0), Point::new(1440.0, 540.0)],
            ),
        ];
        let plan = CropPlanSynthesizer::default()
            .synthesize(&timeline, 8.0, 1920, 1080)
            .unwrap();
        let script = plan.to_filter_script();

        assert!(script.starts_with("[0:v]split=2[v0][v1];\n"));
        assert!(script.contains("[v1]split=2[left1][right1]"));
        assert!(script.contains("crop=w=1080:h=960:x='313.33':y=480,trim=start=3:end=8"));
        assert!(script.contains("[left_scaled1][right_scaled1]vstack=inputs=2,setsar=1[c1]"));
        assert!(script.ends_with("[c0][c1]concat=n=2:v=1:a=0[out]"));
    }

    #[test]
    fn test_script_is_deterministic() {
        let timeline: Vec<_> = (0..50).map(|i| center(i as f64, 500.0 + i as f64 * 10.0)).collect();
        let plan = CropPlanSynthesizer::default()
            .synthesize(&timeline, 60.0, 1920, 1080)
            .unwrap();
        assert_eq!(plan.to_filter_script(), plan.to_filter_script());
    }
}
