//! Split engine
//!
//! Cuts every segment crossed by a line, leaving a small gap around the cut
//! point, then groups the resulting segments into connected components with
//! a disjoint-set forest. Segments are connected when their columns are
//! close and their row ranges overlap.

use crate::config::SplitConfig;
use crate::segment::Segment;
use kurbo::Line;
use serde::{Deserialize, Serialize};

/// A cut line with its endpoints ordered left to right
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCutLine")]
pub struct CutLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl CutLine {
    /// Create a line, swapping the endpoints when `x1 > x2`
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        if x1 > x2 {
            Self {
                x1: x2,
                y1: y2,
                x2: x1,
                y2: y1,
            }
        } else {
            Self { x1, y1, x2, y2 }
        }
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    /// Row where a sloped line passes `column`, truncated toward zero
    ///
    /// `None` outside `[x1, x2]` and for vertical lines.
    pub fn row_at(&self, column: i32) -> Option<i32> {
        if self.is_vertical() || column < self.x1 || column > self.x2 {
            return None;
        }
        let slope = (self.y2 as f64 - self.y1 as f64) / (self.x2 as f64 - self.x1 as f64);
        Some(((column as f64 - self.x1 as f64) * slope + self.y1 as f64) as i32)
    }
}

#[derive(Deserialize)]
struct RawCutLine {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl From<RawCutLine> for CutLine {
    fn from(raw: RawCutLine) -> Self {
        CutLine::new(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

impl From<Line> for CutLine {
    fn from(line: Line) -> Self {
        CutLine::new(
            line.p0.x.round() as i32,
            line.p0.y.round() as i32,
            line.p1.x.round() as i32,
            line.p1.y.round() as i32,
        )
    }
}

/// Result of splitting a segment list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitPieces {
    /// Component containing the first segment
    pub retained: Vec<Segment>,
    /// Everything else
    pub detached: Vec<Segment>,
}

/// Disjoint-set forest over segment indices
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = id;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let a = self.find(a);
        let b = self.find(b);
        if a != b {
            let (parent, child) = if a < b { (a, b) } else { (b, a) };
            self.parent[child] = parent;
        }
    }
}

/// Cut `segments` along `cut` and separate the first connected component
pub fn split_segments(segments: &[Segment], cut: CutLine, config: &SplitConfig) -> SplitPieces {
    let mut pieces = Vec::with_capacity(segments.len() + 8);
    let mut cuts = 0usize;
    for segment in segments {
        match cut.row_at(segment.column) {
            Some(y) if y > segment.y_start && y < segment.y_end => {
                let above = y.saturating_sub(config.half_gap);
                let below = y.saturating_add(config.half_gap);
                pieces.push(Segment::new(segment.column, segment.y_start, above));
                pieces.push(Segment::new(segment.column, below, segment.y_end));
                cuts += 1;
            }
            _ => pieces.push(*segment),
        }
    }
    pieces.retain(|s| s.y_start <= s.y_end);
    pieces.sort();
    log::trace!("cut {} of {} segments", cuts, segments.len());

    if pieces.is_empty() {
        return SplitPieces::default();
    }

    let mut components = DisjointSet::new(pieces.len());
    let mut window_start = 0;
    for i in 0..pieces.len() {
        while pieces[window_start].column.saturating_add(config.column_window) < pieces[i].column {
            window_start += 1;
        }
        for k in window_start..i {
            if pieces[k].overlaps_rows(&pieces[i]) {
                components.union(k, i);
            }
        }
    }

    let first = components.find(0);
    let mut result = SplitPieces::default();
    for (i, segment) in pieces.into_iter().enumerate() {
        if components.find(i) == first {
            result.retained.push(segment);
        } else {
            result.detached.push(segment);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn block(x0: i32, x1: i32, y_start: i32, y_end: i32) -> Vec<Segment> {
        (x0..=x1).map(|x| Segment::new(x, y_start, y_end)).collect()
    }

    #[test]
    fn test_cut_line_normalizes() {
        let line = CutLine::new(10, 60, 0, 50);
        assert_eq!(line, CutLine::new(0, 50, 10, 60));
        assert_eq!(line.row_at(5), Some(55));
        assert_eq!(line.row_at(11), None);
        assert_eq!(CutLine::new(3, 0, 3, 9).row_at(3), None);
    }

    #[test]
    fn test_cut_line_from_kurbo() {
        let line = Line::new(Point::new(9.6, 1.2), Point::new(-0.4, 3.0));
        assert_eq!(CutLine::from(line), CutLine::new(0, 3, 10, 1));
    }

    #[test]
    fn test_cut_line_deserialize_normalizes() {
        let line: CutLine = serde_json::from_str(r#"{ "x1": 9, "y1": 1, "x2": 2, "y2": 5 }"#).unwrap();
        assert_eq!(line, CutLine::new(2, 5, 9, 1));
        assert_eq!(line.x1, 2);
    }

    #[test]
    fn test_vertical_cut_is_noop() {
        let segments = vec![Segment::new(10, 0, 100)];
        let pieces = split_segments(&segments, CutLine::new(10, 50, 10, 50), &SplitConfig::default());
        assert_eq!(pieces.retained, segments);
        assert!(pieces.detached.is_empty());
    }

    #[test]
    fn test_horizontal_cut_separates() {
        let segments = block(0, 10, 0, 100);
        let pieces = split_segments(&segments, CutLine::new(-5, 50, 15, 50), &SplitConfig::default());
        assert_eq!(pieces.retained, block(0, 10, 0, 46));
        assert_eq!(pieces.detached, block(0, 10, 54, 100));
    }

    #[test]
    fn test_reversed_cut_gives_same_pieces() {
        let segments = block(0, 10, 0, 100);
        let config = SplitConfig::default();
        let forward = split_segments(&segments, CutLine::new(0, 45, 10, 55), &config);
        let backward = split_segments(&segments, CutLine::new(10, 55, 0, 45), &config);
        assert_eq!(forward, backward);
        assert!(!forward.detached.is_empty());
    }

    #[test]
    fn test_partial_cut_stays_connected() {
        let segments = block(0, 10, 0, 100);
        let pieces = split_segments(&segments, CutLine::new(0, 50, 5, 50), &SplitConfig::default());
        assert!(pieces.detached.is_empty());
        // Six cut columns now carry two segments each
        assert_eq!(pieces.retained.len(), 17);
    }

    #[test]
    fn test_column_window() {
        let config = SplitConfig::default();

        let mut apart = block(0, 2, 0, 10);
        apart.extend(block(6, 8, 0, 10));
        let pieces = split_segments(&apart, CutLine::new(100, 0, 100, 0), &config);
        assert_eq!(pieces.retained, block(0, 2, 0, 10));
        assert_eq!(pieces.detached, block(6, 8, 0, 10));

        let mut near = block(0, 2, 0, 10);
        near.extend(block(5, 7, 0, 10));
        let pieces = split_segments(&near, CutLine::new(100, 0, 100, 0), &config);
        assert!(pieces.detached.is_empty());
    }

    #[test]
    fn test_short_segments_dropped() {
        let segments = vec![Segment::new(0, 10, 14), Segment::new(1, 0, 40)];
        let pieces = split_segments(&segments, CutLine::new(0, 12, 1, 12), &SplitConfig::default());
        assert_eq!(pieces.retained, vec![Segment::new(1, 0, 8)]);
        assert_eq!(pieces.detached, vec![Segment::new(1, 16, 40)]);
    }

    #[test]
    fn test_cut_at_extreme_rows() {
        let config = SplitConfig::default();
        let full = [Segment::new(0, i32::MIN, i32::MAX)];
        let pieces = split_segments(&full, CutLine::new(-1, 0, 1, 0), &config);
        assert_eq!(pieces.retained, vec![Segment::new(0, i32::MIN, -4)]);
        assert_eq!(pieces.detached, vec![Segment::new(0, 4, i32::MAX)]);

        // The gap below the cut is clamped to the last row
        let edge = i32::MAX - 1;
        let pieces = split_segments(
            &[Segment::new(0, 0, i32::MAX)],
            CutLine::new(-1, edge, 1, edge),
            &config,
        );
        assert_eq!(pieces.retained, vec![Segment::new(0, 0, edge - 4)]);
        assert_eq!(pieces.detached, vec![Segment::new(0, i32::MAX, i32::MAX)]);

        let line = CutLine::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(line.row_at(0), Some(0));
    }

    #[test]
    fn test_empty_input() {
        let pieces = split_segments(&[], CutLine::new(0, 0, 1, 1), &SplitConfig::default());
        assert_eq!(pieces, SplitPieces::default());
    }
}
