//! Segment lists
//!
//! A shape's filled pixels are stored as vertical runs: one `Segment` per
//! contiguous span of a single column. Lists are kept sorted by column and
//! then by `y_start`.

use crate::error::{GeometryError, GeometryResult};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A vertical run of filled pixels in one column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Column (x coordinate)
    #[serde(rename = "x")]
    pub column: i32,
    /// First row
    #[serde(rename = "y1")]
    pub y_start: i32,
    /// Last row (inclusive, `y_start <= y_end`)
    #[serde(rename = "y2")]
    pub y_end: i32,
}

impl Segment {
    pub fn new(column: i32, y_start: i32, y_end: i32) -> Self {
        Self {
            column,
            y_start,
            y_end,
        }
    }

    /// Vertical length (`y_end - y_start`), widened so extreme rows fit
    pub fn length(&self) -> i64 {
        self.y_end as i64 - self.y_start as i64
    }

    /// Check `y_start <= y_end`
    pub fn validate(&self) -> GeometryResult<()> {
        if self.y_start > self.y_end {
            return Err(GeometryError::InvalidSegment {
                column: self.column,
                y_start: self.y_start,
                y_end: self.y_end,
            });
        }
        Ok(())
    }

    /// Whether the row ranges of two segments share at least one row
    pub fn overlaps_rows(&self, other: &Segment) -> bool {
        self.y_start.max(other.y_start) <= self.y_end.min(other.y_end)
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by column, then start row, then end row
impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.column
            .cmp(&other.column)
            .then(self.y_start.cmp(&other.y_start))
            .then(self.y_end.cmp(&other.y_end))
    }
}

/// Integer box `(x, y, w, h)` where `w` and `h` are coordinate spans
/// (a single-column shape has `w == 0`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Tight box over a segment list, `None` when the list is empty
    pub fn covering(segments: &[Segment]) -> Option<Self> {
        let first = segments.first()?;
        let (mut min_x, mut max_x) = (first.column, first.column);
        let (mut min_y, mut max_y) = (first.y_start, first.y_end);
        for segment in &segments[1..] {
            min_x = min_x.min(segment.column);
            max_x = max_x.max(segment.column);
            min_y = min_y.min(segment.y_start);
            max_y = max_y.max(segment.y_end);
        }
        Some(Self {
            x: min_x as f64,
            y: min_y as f64,
            w: (max_x as i64 - min_x as i64) as f64,
            h: (max_y as i64 - min_y as i64) as f64,
        })
    }

    /// Convert to a kurbo rectangle
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }
}

/// Render-time clip rectangle (inclusive on all sides)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl ClipBounds {
    pub fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Clip covering a whole surface of the given size
    pub fn extent(width: i32, height: i32) -> Self {
        Self::new(0, width, 0, height)
    }
}

/// Validate every segment of a list
pub fn validate_all(segments: &[Segment]) -> GeometryResult<()> {
    segments.iter().try_for_each(Segment::validate)
}

/// Sum of segment lengths
pub fn total_length(segments: &[Segment]) -> i64 {
    segments.iter().map(Segment::length).sum()
}

/// Group a sorted list into per-column slices
pub fn columns(segments: &[Segment]) -> impl Iterator<Item = (i32, &[Segment])> {
    segments
        .chunk_by(|a, b| a.column == b.column)
        .map(|chunk| (chunk[0].column, chunk))
}
