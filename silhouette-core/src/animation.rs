//! Appear animations
//!
//! An animation interpolates a shape between two statuses over a number of
//! frames. [`AnimationBuilder`] collects the four parts (appear frame, from
//! status, to status, duration); [`AnimationBuilder::build`] turns a complete
//! builder into an [`AnimationTable`] of per-frame shape snapshots that a
//! container installs into its frame list.

use crate::config;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Fields captured by [`Status::of`]
pub const ANIMATED_FIELDS: [&str; 8] = [
    "x",
    "y",
    "w",
    "h",
    "hue",
    "saturation",
    "lightness",
    "alpha",
];

/// A named set of field values
///
/// Values are arbitrary JSON; only numbers take part in interpolation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(BTreeMap<String, Value>);

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every animatable field of a shape
    pub fn of(shape: &Shape) -> Self {
        let mut status = Self::new();
        for name in ANIMATED_FIELDS {
            if let Some(value) = shape.field(name) {
                status.insert(name, value);
            }
        }
        status
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style [`Status::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Numeric value of a field
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Status {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Preset "from" statuses for appear animations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppearEffect {
    /// Slide in from a row picked by the shape's index
    Position,
    /// Fade in from hue 0
    Hue,
    /// Fade in from a grey
    Saturation,
    /// Grow from half width around the horizontal center
    Size,
    /// Grow from zero height at the weighted centroid row
    Shape,
    /// Unknown names: the shape's own status
    None,
}

impl AppearEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppearEffect::Position => "position",
            AppearEffect::Hue => "color-h",
            AppearEffect::Saturation => "color-s",
            AppearEffect::Size => "size",
            AppearEffect::Shape => "shape",
            AppearEffect::None => "none",
        }
    }

    /// Initial status of `shape` for this effect
    ///
    /// `sibling_count` is the number of shapes in the container and
    /// `surface_height` its height; only [`AppearEffect::Position`] uses them.
    pub fn initial_status(&self, shape: &Shape, sibling_count: usize, surface_height: f64) -> Status {
        let mut status = Status::of(shape);
        let bbox = shape.bbox();
        match self {
            AppearEffect::Position => {
                let index = shape.index().unwrap_or(0) as f64;
                status.insert("y", surface_height / (sibling_count + 1) as f64 * index);
            }
            AppearEffect::Hue => status.insert("hue", 0.0),
            AppearEffect::Saturation => status.insert("saturation", 0.0),
            AppearEffect::Size => {
                let w = bbox.w / 2.0;
                status.insert("w", w);
                status.insert("x", bbox.x + w / 2.0);
            }
            AppearEffect::Shape => {
                status.insert("h", 0.0);
                status.insert("y", shape.centroid_y());
            }
            AppearEffect::None => {}
        }
        status
    }
}

impl FromStr for AppearEffect {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "position" => AppearEffect::Position,
            "color-h" => AppearEffect::Hue,
            "color-s" => AppearEffect::Saturation,
            "size" | "length" => AppearEffect::Size,
            "shape" => AppearEffect::Shape,
            _ => AppearEffect::None,
        })
    }
}

impl From<String> for AppearEffect {
    fn from(name: String) -> Self {
        match name.parse() {
            Ok(effect) => effect,
            Err(never) => match never {},
        }
    }
}

impl From<AppearEffect> for String {
    fn from(effect: AppearEffect) -> Self {
        effect.as_str().to_string()
    }
}

impl fmt::Display for AppearEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects the parts of an appear animation
///
/// Times are in frames; the `_ms` setters convert from milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationBuilder {
    #[serde(default, alias = "appearTime")]
    pub appear: Option<u32>,
    #[serde(default, alias = "fromStatus")]
    pub from: Option<Status>,
    #[serde(default, alias = "toStatus")]
    pub to: Option<Status>,
    #[serde(default)]
    pub duration: Option<u32>,
}

impl AnimationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appear(mut self, frame: u32) -> Self {
        self.appear = Some(frame);
        self
    }

    pub fn appear_ms(self, ms: f64, fps: u32) -> Self {
        self.appear(config::ms_to_frames(ms, fps))
    }

    pub fn from(mut self, status: Status) -> Self {
        self.from = Some(status);
        self
    }

    pub fn to(mut self, status: Status) -> Self {
        self.to = Some(status);
        self
    }

    pub fn duration(mut self, frames: u32) -> Self {
        self.duration = Some(frames);
        self
    }

    pub fn duration_ms(self, ms: f64, fps: u32) -> Self {
        self.duration(config::ms_to_frames(ms, fps))
    }

    /// Animate from an effect preset to the shape's current status
    pub fn appear_effect(
        self,
        shape: &Shape,
        effect: AppearEffect,
        sibling_count: usize,
        surface_height: f64,
    ) -> Self {
        self.from(effect.initial_status(shape, sibling_count, surface_height))
            .to(Status::of(shape))
    }

    /// Whether all four parts are set
    pub fn is_complete(&self) -> bool {
        self.appear.is_some() && self.from.is_some() && self.to.is_some() && self.duration.is_some()
    }

    /// Last frame the animation touches, once appear time and duration are set
    pub fn end_frame(&self) -> Option<u64> {
        Some(self.appear? as u64 + self.duration? as u64)
    }

    /// Interpolate `shape` into a frame table
    ///
    /// Returns `None` until every part is set.
    pub fn build(&self, shape: &Shape) -> Option<AnimationTable> {
        let (Some(appear), Some(from), Some(to), Some(duration)) =
            (self.appear, &self.from, &self.to, self.duration)
        else {
            return None;
        };

        let mut fields = Vec::new();
        for (name, value) in from.iter() {
            let (Some(start), Some(end)) = (value.as_f64(), to.number(name)) else {
                continue;
            };
            if shape.field(name).is_none() {
                log::debug!("shape {}: ignoring unknown field {:?}", shape.id, name);
                continue;
            }
            fields.push((name, start, end));
        }

        let frames = (0..=duration)
            .map(|t| {
                let mut snapshot = shape.copy();
                for &(name, start, end) in &fields {
                    snapshot.set_field(name, interpolate(start, end, t, duration));
                }
                snapshot
            })
            .collect();

        Some(AnimationTable {
            start_frame: appear,
            frames,
        })
    }
}

fn interpolate(start: f64, end: f64, t: u32, duration: u32) -> f64 {
    if t >= duration {
        return end;
    }
    if t == 0 {
        return start;
    }
    let (t, d) = (t as f64, duration as f64);
    start * (d - t) / d + end * t / d
}

/// Per-frame snapshots of one shape, starting at an absolute frame
#[derive(Clone, Debug)]
pub struct AnimationTable {
    start_frame: u32,
    frames: Vec<Shape>,
}

impl AnimationTable {
    pub fn start_frame(&self) -> usize {
        self.start_frame as usize
    }

    /// Absolute index of the last frame
    pub fn end_frame(&self) -> usize {
        self.start_frame() + self.frames.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Shape] {
        &self.frames
    }

    /// Snapshot at an absolute frame
    pub fn frame(&self, frame: usize) -> Option<&Shape> {
        frame
            .checked_sub(self.start_frame())
            .and_then(|offset| self.frames.get(offset))
    }

    /// Snapshots paired with their absolute frame
    pub fn into_frames(self) -> impl Iterator<Item = (usize, Shape)> {
        let start = self.start_frame();
        self.frames
            .into_iter()
            .enumerate()
            .map(move |(offset, shape)| (start + offset, shape))
    }
}
