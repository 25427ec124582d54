//! Merge engine
//!
//! Builds one silhouette from the segments of several shapes:
//!
//! 1. Every column is swept to get the union of its segments.
//! 2. Small gaps between union intervals are bridged, starting with the
//!    smallest. Each bridge raises the threshold for the next one, but a
//!    column never drops below one interval fewer than its left neighbour
//!    had, so branching structure survives.
//! 3. Intervals are chained to the overlapping interval of the previous
//!    column. The chain length (run) tells long strokes from specks.
//! 4. A right-to-left pass removes short-lived intervals that are small
//!    compared to their column, propagating surviving run lengths back
//!    along the chain first so the start of a long stroke is not mistaken
//!    for noise.

use crate::config::MergeConfig;
use crate::error::{GeometryError, GeometryResult};
use crate::segment::{self, Segment};

/// One union interval of a column
#[derive(Clone, Copy, Debug, PartialEq)]
struct Interval {
    top: i32,
    bottom: i32,
    /// Columns this chain has persisted (seeded at 0 when the column has no
    /// left neighbour at all, at 1 when the neighbour has no overlap)
    run: u32,
    /// Overlapping interval in the previous column
    predecessor: Option<usize>,
}

impl Interval {
    fn extent(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }
}

#[derive(Debug)]
struct MergedColumn {
    x: i32,
    intervals: Vec<Interval>,
    /// Sum of interval lengths before gap bridging
    covered: i64,
}

/// Merge the segment lists of several shapes
pub fn merge_segments(inputs: &[Vec<Segment>], config: &MergeConfig) -> GeometryResult<Vec<Segment>> {
    let mut all: Vec<Segment> = inputs.iter().flatten().copied().collect();
    if all.is_empty() {
        return Err(GeometryError::EmptyInput);
    }
    all.sort();

    let mut columns: Vec<MergedColumn> = Vec::new();
    let mut previous_count = 0;
    for (x, column_segments) in segment::columns(&all) {
        let (mut intervals, covered) = sweep_column(column_segments);
        bridge_gaps(&mut intervals, covered, previous_count, config);
        if let Some(previous) = columns.last().filter(|c| Some(c.x) == x.checked_sub(1)) {
            link_to_previous(&mut intervals, &previous.intervals);
        }
        log::trace!(
            "column {}: {} segments -> {} intervals",
            x,
            column_segments.len(),
            intervals.len()
        );
        previous_count = intervals.len();
        columns.push(MergedColumn {
            x,
            intervals,
            covered,
        });
    }

    remove_noise(&mut columns, config);

    let merged: Vec<Segment> = columns
        .iter()
        .flat_map(|column| {
            column
                .intervals
                .iter()
                .map(move |i| Segment::new(column.x, i.top, i.bottom))
        })
        .collect();

    log::debug!(
        "merge: {} input segments over {} columns -> {} segments",
        all.len(),
        columns.len(),
        merged.len()
    );

    if merged.is_empty() {
        return Err(GeometryError::DegenerateMerge);
    }
    Ok(merged)
}

/// Union of one column's segments, plus the covered length
fn sweep_column(segments: &[Segment]) -> (Vec<Interval>, i64) {
    // (row, is_end): starts sort before ends on the same row, so touching
    // segments join into one interval
    let mut events: Vec<(i32, bool)> = segments
        .iter()
        .flat_map(|s| [(s.y_start, false), (s.y_end, true)])
        .collect();
    events.sort_unstable();

    let mut intervals = Vec::new();
    let mut covered = 0i64;
    let mut open = 0usize;
    let mut top = 0;
    for (row, is_end) in events {
        if !is_end {
            if open == 0 {
                top = row;
            }
            open += 1;
        } else {
            open -= 1;
            if open == 0 {
                intervals.push(Interval {
                    top,
                    bottom: row,
                    run: 0,
                    predecessor: None,
                });
                covered += row as i64 - top as i64;
            }
        }
    }
    (intervals, covered)
}

/// Bridge the smallest gaps of a column while the thresholds allow it
fn bridge_gaps(
    intervals: &mut Vec<Interval>,
    covered: i64,
    previous_count: usize,
    config: &MergeConfig,
) {
    let mut threshold = config.initial_gap_threshold as i64;
    while intervals.len() >= previous_count {
        let mut smallest = None;
        for j in 0..intervals.len().saturating_sub(1) {
            let gap = intervals[j + 1].top as i64 - intervals[j].bottom as i64;
            if gap < threshold {
                threshold = gap;
                smallest = Some(j);
            }
        }
        if threshold > covered {
            break;
        }
        let Some(j) = smallest else {
            break;
        };
        intervals[j].bottom = intervals[j + 1].bottom;
        intervals.remove(j + 1);
        threshold = threshold * config.gap_growth_factor as i64 + config.gap_growth_offset as i64;
    }
}

/// Chain each interval to the first overlapping interval of the column to
/// its left
fn link_to_previous(intervals: &mut [Interval], previous: &[Interval]) {
    let mut candidate = 0;
    for interval in intervals.iter_mut() {
        while candidate < previous.len() && previous[candidate].bottom < interval.top {
            candidate += 1;
        }
        match previous.get(candidate) {
            Some(p) if p.top <= interval.bottom => {
                interval.run = p.run + 1;
                interval.predecessor = Some(candidate);
            }
            _ => interval.run = 1,
        }
    }
}

/// Right-to-left pass removing short-lived small intervals
fn remove_noise(columns: &mut [MergedColumn], config: &MergeConfig) {
    for ci in (0..columns.len()).rev() {
        let mut propagated: Vec<(usize, u32)> = Vec::new();
        {
            let column = &mut columns[ci];
            let (Some(first), Some(last)) = (column.intervals.first(), column.intervals.last())
            else {
                continue;
            };
            let span = (last.bottom as i64 - first.top as i64) as f64;
            let limit = (column.covered as f64).min(span * config.noise_extent_ratio);

            column.intervals.retain(|interval| {
                let noise =
                    interval.run < config.noise_run_length && (interval.extent() as f64) < limit;
                if !noise {
                    if let Some(p) = interval.predecessor {
                        propagated.push((p, interval.run));
                    }
                }
                !noise
            });
        }
        if ci > 0 {
            let previous = &mut columns[ci - 1];
            for (p, run) in propagated {
                if let Some(interval) = previous.intervals.get_mut(p) {
                    interval.run = interval.run.max(run);
                }
            }
        }
    }
}
