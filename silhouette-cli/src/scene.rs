//! Scene files
//!
//! A scene is a JSON document describing the surface, its shapes, and the
//! merges, cuts and appear animations to apply before rendering.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use silhouette_core::animation::{AnimationBuilder, AppearEffect};
use silhouette_core::segment::ClipBounds;
use silhouette_core::shape::ShapeData;
use silhouette_core::{AnimatedCanvas, Canvas, CutLine, EngineConfig, Shape};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Option<SceneBackground>,
    #[serde(default)]
    pub shapes: Vec<SceneShape>,
    /// Groups of shape indices (into `shapes`) to merge
    #[serde(default)]
    pub merges: Vec<Vec<usize>>,
    #[serde(default)]
    pub cuts: Vec<SceneCut>,
}

#[derive(Debug, Deserialize)]
pub struct SceneBackground {
    /// PNG path, relative to the scene file
    pub path: PathBuf,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct SceneShape {
    #[serde(flatten)]
    pub data: ShapeData,
    #[serde(default)]
    pub clip: Option<ClipBounds>,
    /// Preset appear animation
    #[serde(default)]
    pub appear: Option<SceneAppear>,
    /// Fully specified animation, in frames
    #[serde(default)]
    pub animation: Option<AnimationBuilder>,
}

#[derive(Debug, Deserialize)]
pub struct SceneAppear {
    pub effect: AppearEffect,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: f64,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: f64,
}

fn default_delay_ms() -> f64 {
    1000.0
}

fn default_duration_ms() -> f64 {
    1000.0
}

/// A cut applied to one of the scene's shapes
#[derive(Debug, Deserialize)]
pub struct SceneCut {
    /// Index into `shapes`
    pub shape: usize,
    #[serde(flatten)]
    pub line: CutLine,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        Self::from_json_str(&contents).with_context(|| format!("parsing scene {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the animated surface
    ///
    /// Shapes are added in order, then merges and cuts are applied, then
    /// appear animations are attached to the shapes that survived.
    pub fn build(&self, base_dir: &Path, config: &EngineConfig) -> Result<AnimatedCanvas> {
        let mut canvas = Canvas::new(self.width, self.height).with_config(config.render.clone());
        if let Some(background) = &self.background {
            let path = base_dir.join(&background.path);
            let image = image::open(&path)
                .with_context(|| format!("loading background {}", path.display()))?
                .to_rgba8();
            canvas = canvas.with_background(image, background.alpha);
        }

        let mut ids: Vec<Uuid> = Vec::with_capacity(self.shapes.len());
        for (i, entry) in self.shapes.iter().enumerate() {
            let mut shape = Shape::from_data(entry.data.clone())
                .with_context(|| format!("shape {}", i))?;
            if let Some(clip) = entry.clip {
                shape = shape.with_clip(clip);
            }
            if let Some(animation) = &entry.animation {
                shape = shape.with_animation(animation.clone());
            }
            ids.push(shape.id);
            canvas.add_item(shape);
        }

        for group in &self.merges {
            let group_ids = group
                .iter()
                .map(|&i| {
                    ids.get(i)
                        .copied()
                        .with_context(|| format!("merge refers to missing shape {}", i))
                })
                .collect::<Result<Vec<_>>>()?;
            let index = canvas
                .merge_items(&group_ids, &config.merge)
                .with_context(|| format!("merging shapes {:?}", group))?;
            log::info!("Merged shapes {:?} into index {}", group, index);
        }

        for cut in &self.cuts {
            let Some(id) = ids.get(cut.shape) else {
                bail!("cut refers to missing shape {}", cut.shape);
            };
            let Some(index) = canvas.position_of(*id) else {
                log::warn!("Shape {} was merged away, skipping cut", cut.shape);
                continue;
            };
            if canvas
                .split_item(index, cut.line, &config.split)
                .with_context(|| format!("cutting shape {}", cut.shape))?
                .is_none()
            {
                log::info!("Cut through shape {} detached nothing", cut.shape);
            }
        }

        let count = canvas.len();
        let height = self.height as f64;
        for (i, entry) in self.shapes.iter().enumerate() {
            let Some(appear) = &entry.appear else {
                continue;
            };
            let Some(index) = ids.get(i).and_then(|id| canvas.position_of(*id)) else {
                log::warn!("Shape {} was merged away, dropping its animation", i);
                continue;
            };
            let Some(shape) = canvas.get_mut(index) else {
                continue;
            };
            let animation = AnimationBuilder::new()
                .appear_ms(appear.delay_ms, config.fps)
                .duration_ms(appear.duration_ms, config.fps)
                .appear_effect(shape, appear.effect, count, height);
            shape.animation = animation;
        }

        let limit = config.render.max_frames;
        for (index, shape) in canvas.items().iter().enumerate() {
            if let Some(end) = shape.animation.end_frame() {
                if end >= limit as u64 {
                    bail!(
                        "animation of shape at index {} ends at frame {}, past the limit of {} frames",
                        index,
                        end,
                        limit
                    );
                }
            }
        }

        Ok(AnimatedCanvas::from_canvas(canvas))
    }
}
