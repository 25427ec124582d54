//! Integration tests for animated rendering
//!
//! Tests appear animations end to end: building frame tables from shape
//! animations, rasterizing frames, highlighting, and hit testing against the
//! frame on screen.

use image::{Rgba, RgbaImage};
use silhouette_core::animation::{AnimationBuilder, AppearEffect, Status};
use silhouette_core::canvas::AnimatedCanvas;
use silhouette_core::color::Hsla;
use silhouette_core::config::{EngineConfig, MergeConfig};
use silhouette_core::segment::Segment;
use silhouette_core::shape::Shape;
use silhouette_core::surface::{RasterSurface, Surface};

const RED: [u8; 4] = [255, 0, 0, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn block(x0: i32, x1: i32, y_start: i32, y_end: i32) -> Shape {
    let segments = (x0..=x1).map(|x| Segment::new(x, y_start, y_end)).collect();
    Shape::from_segments(segments, Hsla::hsl(0.0, 1.0, 0.5)).unwrap()
}

/// A red bar sliding down from the top edge over two frames
fn setup_sliding_canvas() -> AnimatedCanvas {
    let mut canvas = AnimatedCanvas::new(32, 32);
    let shape = block(4, 6, 10, 20);
    let animation = AnimationBuilder::new()
        .appear(0)
        .from(Status::new().with("y", 0))
        .to(Status::new().with("y", 10))
        .duration(2);
    canvas.add_item(shape.with_animation(animation));
    assert_eq!(canvas.animate_all(), 1);
    canvas
}

#[test]
fn test_frames_rasterize_in_motion() {
    let mut canvas = setup_sliding_canvas();
    let mut surface = RasterSurface::new(32, 32);

    canvas.render(&mut surface, Some(0), None).unwrap();
    assert_eq!(surface.image().get_pixel(5, 5).0, RED);
    assert_eq!(surface.image().get_pixel(5, 15).0, CLEAR);

    canvas.render(&mut surface, Some(2), None).unwrap();
    assert_eq!(surface.image().get_pixel(5, 5).0, CLEAR);
    assert_eq!(surface.image().get_pixel(5, 15).0, RED);
    // Strokes extend one row past each end
    assert_eq!(surface.image().get_pixel(5, 21).0, RED);
    assert_eq!(surface.image().get_pixel(5, 22).0, CLEAR);
}

#[test]
fn test_hit_testing_follows_rendered_frame() {
    let mut canvas = setup_sliding_canvas();
    let mut surface = RasterSurface::new(32, 32);

    canvas.render(&mut surface, Some(0), None).unwrap();
    assert_eq!(canvas.item_at_pixel(5.0, 5.0), Some(0));
    assert_eq!(canvas.item_at_pixel(5.0, 18.0), None);

    canvas.render(&mut surface, None, None).unwrap();
    assert_eq!(canvas.item_at_pixel(5.0, 18.0), Some(0));
}

#[test]
fn test_frame_past_the_end_keeps_background() {
    let mut canvas = setup_sliding_canvas();
    let mut background = RgbaImage::new(32, 32);
    background.put_pixel(0, 0, Rgba([0, 0, 255, 255]));
    canvas.set_background(Some(silhouette_core::canvas::Background {
        image: background,
        alpha: 1.0,
    }));

    let mut surface = RasterSurface::new(32, 32);
    surface.stroke_vertical_segment(10, 0, 31, Hsla::hsl(0.0, 1.0, 0.5));
    assert!(canvas.render(&mut surface, Some(10), None).is_err());
    assert_eq!(surface.image().get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert_eq!(surface.image().get_pixel(10, 5).0, CLEAR);
}

#[test]
fn test_merge_after_animating_draws_survivors() {
    let mut canvas = AnimatedCanvas::new(32, 32);
    for x in [0, 10, 20] {
        let animation = AnimationBuilder::new()
            .appear(0)
            .from(Status::new().with("y", 0))
            .to(Status::new().with("y", 10))
            .duration(2);
        canvas.add_item(block(x, x + 2, 10, 20).with_animation(animation));
    }
    assert_eq!(canvas.animate_all(), 3);

    let ids: Vec<_> = canvas.canvas().items()[..2].iter().map(|s| s.id).collect();
    assert_eq!(canvas.merge_items(&ids, &MergeConfig::default()).unwrap(), 1);

    let mut surface = RasterSurface::new(32, 32);
    canvas.render(&mut surface, Some(0), None).unwrap();
    // The surviving shape is still animated
    assert_eq!(surface.image().get_pixel(21, 5).0, RED);
    // The merged shape is drawn where it rests
    assert_eq!(surface.image().get_pixel(1, 5).0, CLEAR);
    assert_eq!(surface.image().get_pixel(1, 15).0, RED);
    assert_eq!(surface.image().get_pixel(11, 15).0, RED);
}

#[test]
fn test_highlight_dims_other_shapes() {
    let mut canvas = AnimatedCanvas::new(32, 32);
    canvas.add_item(block(2, 2, 0, 10));
    canvas.add_item(block(20, 20, 0, 10));

    let mut surface = RasterSurface::new(32, 32);
    canvas.render(&mut surface, None, Some(0)).unwrap();
    assert_eq!(surface.image().get_pixel(2, 5).0, RED);
    // 0.66 alpha
    assert_eq!(surface.image().get_pixel(20, 5).0, [255, 0, 0, 168]);
}

#[test]
fn test_appear_effects_from_milliseconds() {
    let config = EngineConfig::default();
    let mut canvas = AnimatedCanvas::new(100, 100);
    for x in [10, 40] {
        canvas.add_item(block(x, x + 9, 40, 60));
    }

    let count = canvas.len();
    for index in 0..count {
        let shape = canvas.get_mut(index).unwrap();
        shape.animation = AnimationBuilder::new()
            .appear_ms(500.0, config.fps)
            .duration_ms(1000.0, config.fps)
            .appear_effect(shape, AppearEffect::Position, count, 100.0);
    }
    assert_eq!(canvas.animate_all(), 2);
    assert_eq!(canvas.frame_count(), 31);

    // Each shape starts on its own row: 100 / 3 * index
    assert_eq!(canvas.snapshot(10, 0).unwrap().bbox().y, 0.0);
    assert_eq!(canvas.snapshot(10, 1).unwrap().bbox().y, 100.0 / 3.0);
    assert_eq!(canvas.snapshot(30, 1).unwrap().bbox().y, 40.0);

    // Before the animation starts the base shapes are drawn
    assert_eq!(canvas.shape_at(Some(3), 1).unwrap().bbox().y, 40.0);
}

#[test]
fn test_size_effect_grows_from_center() {
    let mut canvas = AnimatedCanvas::new(100, 100);
    let shape = block(20, 40, 0, 10);
    let animation = AnimationBuilder::new()
        .appear(0)
        .duration(4)
        .appear_effect(&shape, AppearEffect::Size, 1, 100.0);
    canvas.add_item(shape.with_animation(animation));
    canvas.animate_all();

    let first = canvas.snapshot(0, 0).unwrap();
    assert_eq!(first.bbox().w, 10.0);
    assert_eq!(first.bbox().x, 25.0);
    let last = canvas.snapshot(4, 0).unwrap();
    assert_eq!(last.bbox().w, 20.0);
    assert_eq!(last.bbox().x, 20.0);
}
