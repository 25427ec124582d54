// Silhouette Core Library
// Segment-list shapes, merge/split engines, animation tables and containers

pub mod animation;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod merge;
pub mod segment;
pub mod shape;
pub mod split;
pub mod surface;

pub use animation::{AnimationBuilder, AnimationTable, AppearEffect, Status};
pub use canvas::{AnimatedCanvas, Canvas};
pub use color::Hsla;
pub use config::EngineConfig;
pub use error::{GeometryError, GeometryResult};
pub use segment::Segment;
pub use shape::Shape;
pub use split::CutLine;
