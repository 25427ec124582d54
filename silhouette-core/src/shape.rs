//! Segment-list shapes
//!
//! A `Shape` is a silhouette stored as vertical pixel runs. Its segments are
//! expressed relative to a reference box; the shape's current bounding box
//! may differ (while animating or after a resize), in which case segments
//! are remapped from the reference box into the bounding box when drawn or
//! hit-tested. `transform()` bakes that remap into the segments.

use crate::animation::AnimationBuilder;
use crate::color::Hsla;
use crate::config::{MergeConfig, RenderConfig, SplitConfig};
use crate::error::{GeometryError, GeometryResult};
use crate::merge;
use crate::segment::{self, ClipBounds, PixelBox, Segment};
use crate::split::{self, CutLine};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

/// Raw shape description, as read from scene files
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeData {
    #[serde(alias = "lines")]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub color: Hsla,
}

/// Handle a container gives to the shapes it owns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerLink {
    /// Dense index inside the container
    pub index: usize,
    pub surface_width: i32,
    pub surface_height: i32,
}

/// Per-column summary produced by [`Shape::compress`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnWeight {
    /// Length-weighted mean row (0 for empty columns)
    pub mean_y: f64,
    /// Total segment length in the column
    pub weight: f64,
}

/// A silhouette made of vertical segments
#[derive(Clone, Debug, Serialize)]
pub struct Shape {
    pub id: Uuid,
    segments: Vec<Segment>,
    bbox: PixelBox,
    ref_box: PixelBox,
    pub color: Hsla,
    /// Explicit clip; falls back to the container extent
    pub clip: Option<ClipBounds>,
    /// Appear animation, static until all four parts are set
    pub animation: AnimationBuilder,
    #[serde(skip)]
    link: Option<ContainerLink>,
}

impl Shape {
    /// Build a shape from raw segments
    pub fn from_segments(mut segments: Vec<Segment>, color: Hsla) -> GeometryResult<Self> {
        segment::validate_all(&segments)?;
        segments.sort();
        let bbox = PixelBox::covering(&segments).ok_or(GeometryError::EmptyInput)?;
        Ok(Self {
            id: Uuid::new_v4(),
            segments,
            bbox,
            ref_box: bbox,
            color: color.normalized(),
            clip: None,
            animation: AnimationBuilder::default(),
            link: None,
        })
    }

    /// Build a shape from a scene description
    pub fn from_data(data: ShapeData) -> GeometryResult<Self> {
        Self::from_segments(data.segments, data.color)
    }

    /// Merge several shapes into one silhouette
    ///
    /// The color is the average of the inputs weighted by their segment
    /// counts.
    pub fn from_merge(shapes: &[Shape], config: &MergeConfig) -> GeometryResult<Self> {
        if shapes.is_empty() {
            return Err(GeometryError::EmptyInput);
        }
        let inputs = shapes
            .iter()
            .map(|shape| shape.display_segments().map(Cow::into_owned))
            .collect::<GeometryResult<Vec<_>>>()?;
        let segments = merge::merge_segments(&inputs, config)?;
        let color = Hsla::weighted_average(
            shapes
                .iter()
                .map(|shape| (shape.color, shape.segments.len() as f64)),
        )
        .ok_or(GeometryError::EmptyInput)?;

        log::debug!(
            "merged {} shapes into {} segments",
            shapes.len(),
            segments.len()
        );
        Self::from_segments(segments, color)
    }

    /// Snapshot copy for animation frames
    ///
    /// Keeps id, geometry, color and container link; drops the animation.
    pub fn copy(&self) -> Self {
        Self {
            id: self.id,
            segments: self.segments.clone(),
            bbox: self.bbox,
            ref_box: self.ref_box,
            color: self.color,
            clip: self.clip,
            animation: AnimationBuilder::default(),
            link: self.link,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn bbox(&self) -> PixelBox {
        self.bbox
    }

    pub fn ref_box(&self) -> PixelBox {
        self.ref_box
    }

    /// Index inside the owning container, if any
    pub fn index(&self) -> Option<usize> {
        self.link.map(|link| link.index)
    }

    pub fn link(&self) -> Option<ContainerLink> {
        self.link
    }

    pub(crate) fn set_link(&mut self, link: Option<ContainerLink>) {
        self.link = link;
    }

    /// Move the bounding box
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.bbox.x = x;
        self.bbox.y = y;
    }

    /// Resize the bounding box
    pub fn set_size(&mut self, w: f64, h: f64) {
        self.bbox.w = w;
        self.bbox.h = h;
    }

    pub fn with_color(mut self, color: Hsla) -> Self {
        self.color = color.normalized();
        self
    }

    pub fn with_clip(mut self, clip: ClipBounds) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn with_animation(mut self, animation: AnimationBuilder) -> Self {
        self.animation = animation;
        self
    }

    /// Read an animatable field by name
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.bbox.x),
            "y" => Some(self.bbox.y),
            "w" => Some(self.bbox.w),
            "h" => Some(self.bbox.h),
            "hue" => Some(self.color.hue),
            "saturation" => Some(self.color.saturation),
            "lightness" => Some(self.color.lightness),
            "alpha" => Some(self.color.alpha),
            _ => None,
        }
    }

    /// Write an animatable field by name, returning whether it exists
    pub fn set_field(&mut self, name: &str, value: f64) -> bool {
        match name {
            "x" => self.bbox.x = value,
            "y" => self.bbox.y = value,
            "w" => self.bbox.w = value,
            "h" => self.bbox.h = value,
            "hue" => self.color.hue = value,
            "saturation" => self.color.saturation = value,
            "lightness" => self.color.lightness = value,
            "alpha" => self.color.alpha = value,
            _ => return false,
        }
        self.color = self.color.normalized();
        true
    }

    /// Total covered length
    pub fn area(&self) -> i64 {
        segment::total_length(&self.segments)
    }

    /// Width and height ratios from the reference box to the bounding box
    pub fn scale_ratios(&self) -> GeometryResult<(f64, f64)> {
        Ok((
            ratio(self.bbox.w, self.ref_box.w, "reference width")?,
            ratio(self.bbox.h, self.ref_box.h, "reference height")?,
        ))
    }

    fn map_segment(&self, segment: &Segment, rw: f64, rh: f64) -> Segment {
        Segment {
            column: ((segment.column as f64 - self.ref_box.x) * rw + self.bbox.x) as i32,
            y_start: ((segment.y_start as f64 - self.ref_box.y) * rh + self.bbox.y) as i32,
            y_end: ((segment.y_end as f64 - self.ref_box.y) * rh + self.bbox.y) as i32,
        }
    }

    /// Segments as they appear on screen (remapped into the bounding box)
    pub fn display_segments(&self) -> GeometryResult<Cow<'_, [Segment]>> {
        if self.bbox == self.ref_box {
            return Ok(Cow::Borrowed(&self.segments));
        }
        let (rw, rh) = self.scale_ratios()?;
        Ok(Cow::Owned(
            self.segments
                .iter()
                .map(|s| self.map_segment(s, rw, rh))
                .collect(),
        ))
    }

    /// Bake the reference-to-bounding-box remap into the segments
    ///
    /// Coordinates are truncated toward zero. Afterwards the reference box
    /// equals the bounding box, so a second call changes nothing.
    pub fn transform(&mut self) -> GeometryResult<()> {
        if self.bbox == self.ref_box {
            return Ok(());
        }
        let mut segments = self.display_segments()?.into_owned();
        segments.sort();
        self.segments = segments;
        self.ref_box = self.bbox;
        Ok(())
    }

    /// Hit test a surface pixel
    pub fn contains_pixel(&self, x: f64, y: f64) -> bool {
        let Ok((rw, rh)) = self.scale_ratios() else {
            return false;
        };
        let half_stroke = rw / 2.0;
        self.segments.iter().any(|s| {
            let mapped = self.map_segment(s, rw, rh);
            (mapped.column as f64 - x).abs() <= half_stroke
                && y >= mapped.y_start as f64
                && y <= mapped.y_end as f64
        })
    }

    /// Whether any filled pixel lies on the line `(x1, y1)-(x2, y2)`
    pub fn crosses_line(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        self.crosses(CutLine::new(x1, y1, x2, y2))
    }

    /// Line crossing test on a normalized line
    pub fn crosses(&self, line: CutLine) -> bool {
        let segments = self.display_or_stored();
        if line.is_vertical() {
            let (low, high) = (line.y1.min(line.y2), line.y1.max(line.y2));
            return segments
                .iter()
                .any(|s| s.column == line.x1 && s.y_end > low && s.y_start < high);
        }
        segments.iter().any(|s| match line.row_at(s.column) {
            Some(y) => y > s.y_start && y < s.y_end,
            None => false,
        })
    }

    fn display_or_stored(&self) -> Cow<'_, [Segment]> {
        match self.display_segments() {
            Ok(segments) => segments,
            Err(err) => {
                log::warn!("shape {}: {}, using stored segments", self.id, err);
                Cow::Borrowed(&self.segments)
            }
        }
    }

    /// Per-column weighted mean row, relative to the reference box
    pub fn compress(&self) -> Vec<ColumnWeight> {
        let width = self.ref_box.w.max(0.0) as usize + 1;
        let mut columns = vec![ColumnWeight::default(); width];
        let x0 = self.ref_box.x as i64;
        for s in &self.segments {
            let offset = s.column as i64 - x0;
            let Some(column) = usize::try_from(offset).ok().and_then(|i| columns.get_mut(i))
            else {
                continue;
            };
            let length = s.length() as f64;
            column.mean_y += (s.y_start as f64 + s.y_end as f64) * 0.5 * length;
            column.weight += length;
        }
        for column in &mut columns {
            if column.weight != 0.0 {
                column.mean_y /= column.weight;
            }
        }
        columns
    }

    /// Weighted mean row of the whole shape, in surface coordinates
    pub fn centroid_y(&self) -> f64 {
        let (sum, total) = self
            .compress()
            .iter()
            .fold((0.0, 0.0), |(sum, total), c| {
                (sum + c.mean_y * c.weight, total + c.weight)
            });
        if total == 0.0 {
            return self.bbox.y + self.bbox.h / 2.0;
        }
        let rh = ratio(self.bbox.h, self.ref_box.h, "reference height").unwrap_or(1.0);
        (sum / total - self.ref_box.y) * rh + self.bbox.y
    }

    /// Clip rectangle used for rendering
    pub fn effective_clip(&self, default_extent: i32) -> ClipBounds {
        self.clip
            .or_else(|| {
                self.link
                    .map(|link| ClipBounds::extent(link.surface_width, link.surface_height))
            })
            .unwrap_or_else(|| ClipBounds::extent(default_extent, default_extent))
    }

    /// Draw the shape, optionally overriding its alpha
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        alpha: Option<f64>,
        config: &RenderConfig,
    ) -> GeometryResult<()> {
        let (rw, rh) = self.scale_ratios()?;
        let clip = self.effective_clip(config.default_extent);
        let color = match alpha {
            Some(alpha) => self.color.with_alpha(alpha),
            None => self.color,
        };

        surface.set_line_width(rw);
        for s in &self.segments {
            let mapped = self.map_segment(s, rw, rh);
            if mapped.column < clip.left || mapped.column > clip.right {
                continue;
            }
            let top = mapped.y_start.max(clip.top);
            let bottom = mapped.y_end.min(clip.bottom);
            if top > bottom {
                continue;
            }
            surface.stroke_vertical_segment(
                mapped.column,
                top.saturating_sub(1),
                bottom.saturating_add(1),
                color,
            );
        }
        Ok(())
    }

    /// Cut the shape along a line
    ///
    /// The part connected to the first segment stays on `self`; everything
    /// else is returned as a new shape with the same color. `Ok(None)` means
    /// nothing was detached.
    pub fn split(&mut self, cut: CutLine, config: &SplitConfig) -> GeometryResult<Option<Shape>> {
        let pieces = {
            let segments = self.display_segments()?;
            split::split_segments(&segments, cut, config)
        };
        if pieces.retained.is_empty() {
            return Err(GeometryError::EmptyInput);
        }

        log::debug!(
            "split shape {}: {} retained, {} detached",
            self.id,
            pieces.retained.len(),
            pieces.detached.len()
        );

        let detached = if pieces.detached.is_empty() {
            None
        } else {
            Some(Shape::from_segments(pieces.detached, self.color)?)
        };
        let bbox = PixelBox::covering(&pieces.retained).ok_or(GeometryError::EmptyInput)?;
        self.segments = pieces.retained;
        self.bbox = bbox;
        self.ref_box = bbox;
        Ok(detached)
    }
}

/// `target / reference`, with `0 / 0` defined as 1
fn ratio(target: f64, reference: f64, what: &'static str) -> GeometryResult<f64> {
    if reference == 0.0 {
        if target == 0.0 {
            Ok(1.0)
        } else {
            Err(GeometryError::DivisionGuard { what })
        }
    } else {
        Ok(target / reference)
    }
}
