//! Shape containers
//!
//! [`Canvas`] owns a list of shapes and draws them in order.
//! [`AnimatedCanvas`] adds a frame list: each frame maps a shape index to a
//! snapshot, and shapes missing from a frame are drawn from the base list.

use crate::animation::AnimationTable;
use crate::config::{MergeConfig, RenderConfig, SplitConfig};
use crate::error::{GeometryError, GeometryResult};
use crate::shape::{ContainerLink, Shape};
use crate::split::CutLine;
use crate::surface::Surface;
use image::RgbaImage;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Image drawn under the shapes
#[derive(Clone, Debug)]
pub struct Background {
    pub image: RgbaImage,
    pub alpha: f64,
}

/// A static surface holding shapes
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    items: Vec<Shape>,
    background: Option<Background>,
    config: RenderConfig,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            items: Vec::new(),
            background: None,
            config: RenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_background(mut self, image: RgbaImage, alpha: f64) -> Self {
        self.set_background(Some(Background { image, alpha }));
        self
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Shape] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.items.get_mut(index)
    }

    /// Index of the shape with this id
    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|shape| shape.id == id)
    }

    fn link(&self, index: usize) -> ContainerLink {
        ContainerLink {
            index,
            surface_width: self.width as i32,
            surface_height: self.height as i32,
        }
    }

    /// Append a shape, returning its index
    pub fn add_item(&mut self, mut shape: Shape) -> usize {
        let index = self.items.len();
        shape.set_link(Some(self.link(index)));
        log::debug!("added shape {} at index {}", shape.id, index);
        self.items.push(shape);
        index
    }

    /// Remove a shape by id, renumbering the shapes after it
    ///
    /// Removing a shape that is not here is a no-op.
    pub fn remove_item(&mut self, id: Uuid) -> Option<Shape> {
        let index = self.position_of(id)?;
        let mut shape = self.items.remove(index);
        shape.set_link(None);
        for i in index..self.items.len() {
            let link = self.link(i);
            self.items[i].set_link(Some(link));
        }
        log::debug!("removed shape {} from index {}", id, index);
        Some(shape)
    }

    /// Clones of the shapes with these ids, each at most once
    fn shapes_by_id(&self, ids: &[Uuid]) -> Vec<Shape> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.position_of(*id))
            .map(|index| self.items[index].clone())
            .collect()
    }

    /// Replace the shapes with these ids by their merge
    ///
    /// Nothing changes when the merge fails. The merged shape is appended.
    /// Repeated ids count once.
    pub fn merge_items(&mut self, ids: &[Uuid], config: &MergeConfig) -> GeometryResult<usize> {
        let shapes = self.shapes_by_id(ids);
        let merged = Shape::from_merge(&shapes, config)?;
        for shape in &shapes {
            self.remove_item(shape.id);
        }
        Ok(self.add_item(merged))
    }

    /// Cut a shape, appending the detached piece
    ///
    /// Returns the index of the new shape, or `None` when nothing detached.
    pub fn split_item(
        &mut self,
        index: usize,
        cut: CutLine,
        config: &SplitConfig,
    ) -> GeometryResult<Option<usize>> {
        let len = self.items.len();
        let shape = self
            .items
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
        Ok(shape.split(cut, config)?.map(|piece| self.add_item(piece)))
    }

    /// First shape, in drawing order, covering a pixel
    pub fn item_at_pixel(&self, x: f64, y: f64) -> Option<usize> {
        self.items.iter().position(|shape| shape.contains_pixel(x, y))
    }

    fn clear(&self, surface: &mut dyn Surface) {
        surface.clear_region(self.width, self.height);
        if let Some(background) = &self.background {
            surface.draw_image(&background.image, background.alpha);
        }
    }

    /// Draw every shape
    ///
    /// With a highlighted index, the other shapes are drawn dimmed.
    pub fn render(&self, surface: &mut dyn Surface, highlighted: Option<usize>) {
        self.clear(surface);
        render_shapes(surface, self.items.iter().enumerate(), highlighted, &self.config);
    }
}

fn render_shapes<'a>(
    surface: &mut dyn Surface,
    shapes: impl Iterator<Item = (usize, &'a Shape)>,
    highlighted: Option<usize>,
    config: &RenderConfig,
) {
    for (index, shape) in shapes {
        let alpha = match highlighted {
            Some(h) if h != index => Some(config.dim_alpha),
            _ => None,
        };
        if let Err(err) = shape.render(surface, alpha, config) {
            log::warn!("skipping shape {} at index {}: {}", shape.id, index, err);
        }
    }
}

/// A surface whose shapes can be replaced per frame
#[derive(Clone, Debug)]
pub struct AnimatedCanvas {
    canvas: Canvas,
    /// Snapshot arena referenced by `frames`
    snapshots: Vec<Shape>,
    /// Per frame: shape index -> arena slot
    frames: Vec<BTreeMap<usize, usize>>,
    current_frame: Option<usize>,
}

impl AnimatedCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_canvas(Canvas::new(width, height))
    }

    /// Animate an existing canvas; its shapes become the base list
    pub fn from_canvas(canvas: Canvas) -> Self {
        Self {
            canvas,
            snapshots: Vec::new(),
            frames: Vec::new(),
            current_frame: None,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable access to a base shape
    ///
    /// Frames installed earlier keep their snapshots until the shape is
    /// animated again.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.canvas.get_mut(index)
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.canvas.set_background(background);
    }

    pub fn len(&self) -> usize {
        self.canvas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvas.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame drawn by the last successful render, `None` for the base list
    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    /// Snapshot of a shape at a frame, without fallback
    pub fn snapshot(&self, frame: usize, index: usize) -> Option<&Shape> {
        let slot = self.frames.get(frame)?.get(&index)?;
        self.snapshots.get(*slot)
    }

    /// The shape drawn at `index` for a frame, falling back to the base list
    pub fn shape_at(&self, frame: Option<usize>, index: usize) -> Option<&Shape> {
        frame
            .and_then(|frame| self.snapshot(frame, index))
            .or_else(|| self.canvas.get(index))
    }

    pub fn add_item(&mut self, shape: Shape) -> usize {
        self.canvas.add_item(shape)
    }

    /// Remove a shape and its frame entries
    ///
    /// Frame entries of later shapes move down one index with them.
    pub fn remove_item(&mut self, id: Uuid) -> Option<Shape> {
        let index = self.canvas.position_of(id)?;
        let shape = self.canvas.remove_item(id)?;
        for frame in &mut self.frames {
            frame.remove(&index);
            let later: Vec<(usize, usize)> = frame.range(index + 1..).map(|(k, v)| (*k, *v)).collect();
            for (old, slot) in later {
                frame.remove(&old);
                frame.insert(old - 1, slot);
                let link = self.canvas.link(old - 1);
                if let Some(snapshot) = self.snapshots.get_mut(slot) {
                    snapshot.set_link(Some(link));
                }
            }
        }
        self.compact();
        Some(shape)
    }

    /// Replace the shapes with these ids by their merge
    ///
    /// The inputs leave the frame list the way [`AnimatedCanvas::remove_item`]
    /// does; the merged shape is appended without frames.
    pub fn merge_items(&mut self, ids: &[Uuid], config: &MergeConfig) -> GeometryResult<usize> {
        let shapes = self.canvas.shapes_by_id(ids);
        let merged = Shape::from_merge(&shapes, config)?;
        for shape in &shapes {
            self.remove_item(shape.id);
        }
        Ok(self.add_item(merged))
    }

    /// Cut a base shape, appending the detached piece
    ///
    /// When a piece detaches, the frames of the cut shape are dropped so it
    /// is drawn from the base list.
    pub fn split_item(
        &mut self,
        index: usize,
        cut: CutLine,
        config: &SplitConfig,
    ) -> GeometryResult<Option<usize>> {
        let piece = self.canvas.split_item(index, cut, config)?;
        if piece.is_some() {
            for frame in &mut self.frames {
                frame.remove(&index);
            }
            self.compact();
        }
        Ok(piece)
    }

    fn check_frame_limit(&self, end: u64) -> GeometryResult<()> {
        let limit = self.canvas.config.max_frames;
        if end >= limit as u64 {
            return Err(GeometryError::FrameLimit { frame: end, limit });
        }
        Ok(())
    }

    /// Install a frame table for the shape at `index`
    ///
    /// Replaces frames installed earlier for that shape and grows the frame
    /// list as needed, up to the configured frame limit.
    pub fn install_animation(&mut self, index: usize, table: AnimationTable) -> GeometryResult<()> {
        let len = self.canvas.len();
        if index >= len {
            return Err(GeometryError::IndexOutOfRange { index, len });
        }
        let (start, end) = (table.start_frame(), table.end_frame());
        self.check_frame_limit(end as u64)?;
        for frame in &mut self.frames {
            frame.remove(&index);
        }
        let link = self.canvas.link(index);
        if self.frames.len() <= end {
            self.frames.resize_with(end + 1, BTreeMap::new);
        }
        for (frame, mut snapshot) in table.into_frames() {
            snapshot.set_link(Some(link));
            self.frames[frame].insert(index, self.snapshots.len());
            self.snapshots.push(snapshot);
        }
        self.compact();
        log::debug!("installed frames {}..={} for index {}", start, end, index);
        Ok(())
    }

    /// Build and install the animation configured on the shape at `index`
    ///
    /// Returns `false` when the shape's animation is incomplete.
    pub fn animate(&mut self, index: usize) -> GeometryResult<bool> {
        let len = self.canvas.len();
        let shape = self
            .canvas
            .get(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
        if let Some(end) = shape.animation.end_frame() {
            self.check_frame_limit(end)?;
        }
        match shape.animation.build(shape) {
            Some(table) => {
                self.install_animation(index, table)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Animate every shape with a complete animation, returning how many
    pub fn animate_all(&mut self) -> usize {
        let mut count = 0;
        for index in 0..self.canvas.len() {
            match self.animate(index) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(err) => log::warn!("animating index {}: {}", index, err),
            }
        }
        count
    }

    /// Drop every installed frame
    pub fn clear_animations(&mut self) {
        self.frames.clear();
        self.snapshots.clear();
        self.current_frame = None;
    }

    /// Rebuild the arena with only the slots some frame references
    fn compact(&mut self) {
        let mut old: Vec<Option<Shape>> = std::mem::take(&mut self.snapshots)
            .into_iter()
            .map(Some)
            .collect();
        for frame in &mut self.frames {
            for slot in frame.values_mut() {
                if let Some(shape) = old.get_mut(*slot).and_then(Option::take) {
                    *slot = self.snapshots.len();
                    self.snapshots.push(shape);
                }
            }
        }
    }

    /// Draw the base list (`frame == None`) or one frame
    ///
    /// A frame past the end of the frame list leaves a cleared surface with
    /// the background and returns [`GeometryError::IndexOutOfRange`].
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        frame: Option<usize>,
        highlighted: Option<usize>,
    ) -> GeometryResult<()> {
        self.canvas.clear(surface);
        if let Some(frame) = frame {
            if frame >= self.frames.len() {
                return Err(GeometryError::IndexOutOfRange {
                    index: frame,
                    len: self.frames.len(),
                });
            }
        }
        self.current_frame = frame;

        let shapes = (0..self.canvas.len()).filter_map(|index| {
            self.shape_at(frame, index).map(|shape| (index, shape))
        });
        render_shapes(surface, shapes, highlighted, &self.canvas.config);
        Ok(())
    }

    /// Replace the surface contents with an opaque image
    pub fn render_image(&self, surface: &mut dyn Surface, image: &RgbaImage) {
        surface.clear_region(self.canvas.width, self.canvas.height);
        surface.draw_image(image, 1.0);
    }

    /// Hit test against the shapes of the last rendered frame
    pub fn item_at_pixel(&self, x: f64, y: f64) -> Option<usize> {
        (0..self.canvas.len()).find(|&index| {
            self.shape_at(self.current_frame, index)
                .is_some_and(|shape| shape.contains_pixel(x, y))
        })
    }
}
