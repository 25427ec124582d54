//! Integration tests for merge and split workflows
//!
//! Tests shapes going through a container: merging several shapes into one
//! silhouette, cutting it apart again, and the configuration knobs that
//! steer both engines.

use silhouette_core::canvas::Canvas;
use silhouette_core::color::Hsla;
use silhouette_core::config::{EngineConfig, MergeConfig};
use silhouette_core::error::GeometryError;
use silhouette_core::segment::Segment;
use silhouette_core::shape::Shape;
use silhouette_core::split::CutLine;

fn block(x0: i32, x1: i32, y_start: i32, y_end: i32) -> Vec<Segment> {
    (x0..=x1).map(|x| Segment::new(x, y_start, y_end)).collect()
}

/// Two stacked blocks separated by a thin gap
fn setup_stacked_canvas() -> Canvas {
    let mut canvas = Canvas::new(200, 200);
    canvas.add_item(Shape::from_segments(block(0, 40, 0, 30), Hsla::hsl(0.0, 1.0, 0.5)).unwrap());
    canvas.add_item(Shape::from_segments(block(0, 40, 35, 60), Hsla::hsl(120.0, 1.0, 0.5)).unwrap());
    canvas
}

#[test]
fn test_merge_bridges_thin_gap() {
    let mut canvas = setup_stacked_canvas();
    let ids: Vec<_> = canvas.items().iter().map(|s| s.id).collect();

    let index = canvas.merge_items(&ids, &MergeConfig::default()).unwrap();
    assert_eq!(index, 0);
    assert_eq!(canvas.len(), 1);

    let merged = &canvas.items()[0];
    assert_eq!(merged.segments(), block(0, 40, 0, 60).as_slice());
    assert_eq!(merged.area(), 41 * 60);
    // Equal segment counts: the hues average out
    assert_eq!(merged.color.hue, 60.0);
}

#[test]
fn test_merge_then_split_round_trip() {
    let mut canvas = setup_stacked_canvas();
    let ids: Vec<_> = canvas.items().iter().map(|s| s.id).collect();
    let config = EngineConfig::default();
    canvas.merge_items(&ids, &config.merge).unwrap();

    let cut = CutLine::new(41, 30, -1, 30);
    assert!(canvas.items()[0].crosses(cut));

    let piece = canvas.split_item(0, cut, &config.split).unwrap();
    assert_eq!(piece, Some(1));

    let top = &canvas.items()[0];
    let bottom = &canvas.items()[1];
    assert_eq!(top.segments(), block(0, 40, 0, 26).as_slice());
    assert_eq!(bottom.segments(), block(0, 40, 34, 60).as_slice());
    assert_eq!(bottom.color, top.color);
    assert_ne!(bottom.id, top.id);

    // The gap left by the cut is empty
    assert!(!top.contains_pixel(20.0, 30.0));
    assert!(!bottom.contains_pixel(20.0, 30.0));
    assert_eq!(canvas.item_at_pixel(20.0, 10.0), Some(0));
    assert_eq!(canvas.item_at_pixel(20.0, 50.0), Some(1));
}

#[test]
fn test_merge_uses_displayed_geometry() {
    let mut moved = Shape::from_segments(block(0, 10, 0, 40), Hsla::default()).unwrap();
    moved.set_position(100.0, 50.0);

    let merged = Shape::from_merge(&[moved], &MergeConfig::default()).unwrap();
    assert_eq!(merged.bbox().x, 100.0);
    assert_eq!(merged.bbox().y, 50.0);
    assert_eq!(merged.segments()[0], Segment::new(100, 50, 90));
}

#[test]
fn test_degenerate_merge_leaves_canvas_untouched() {
    let mut canvas = Canvas::new(200, 200);
    for row in [0, 50, 100] {
        canvas.add_item(Shape::from_segments(block(0, 2, row, row + 1), Hsla::default()).unwrap());
    }
    let ids: Vec<_> = canvas.items().iter().map(|s| s.id).collect();

    let result = canvas.merge_items(&ids, &MergeConfig::default());
    assert_eq!(result, Err(GeometryError::DegenerateMerge));
    assert_eq!(canvas.len(), 3);

    // Turning off the noise filter keeps every speck
    let keep_all = MergeConfig {
        noise_run_length: 0,
        ..MergeConfig::default()
    };
    canvas.merge_items(&ids, &keep_all).unwrap();
    assert_eq!(canvas.len(), 1);
    assert_eq!(canvas.items()[0].segments().len(), 9);
}

#[test]
fn test_config_file_overrides_split_gap() {
    let config = EngineConfig::from_json_str(r#"{ "split": { "half_gap": 1 } }"#).unwrap();
    let mut shape = Shape::from_segments(block(0, 5, 0, 20), Hsla::default()).unwrap();

    let piece = shape
        .split(CutLine::new(0, 10, 5, 10), &config.split)
        .unwrap()
        .unwrap();
    assert_eq!(shape.segments(), block(0, 5, 0, 9).as_slice());
    assert_eq!(piece.segments(), block(0, 5, 11, 20).as_slice());
}

#[test]
fn test_split_that_detaches_nothing() {
    let mut shape = Shape::from_segments(block(0, 5, 0, 20), Hsla::default()).unwrap();
    let before = shape.segments().to_vec();

    let piece = shape
        .split(CutLine::new(100, 0, 120, 10), &EngineConfig::default().split)
        .unwrap();
    assert!(piece.is_none());
    assert_eq!(shape.segments(), before.as_slice());
}

#[test]
fn test_vertical_cut_leaves_nothing_to_detach() {
    let mut shape = Shape::from_segments(vec![Segment::new(10, 0, 100)], Hsla::default()).unwrap();
    let pieces = silhouette_core::split::split_segments(
        shape.segments(),
        CutLine::new(10, 50, 10, 50),
        &EngineConfig::default().split,
    );
    assert!(pieces.detached.is_empty());
    assert_eq!(
        Shape::from_segments(pieces.detached, Hsla::default()).unwrap_err(),
        GeometryError::EmptyInput
    );
    assert!(shape
        .split(CutLine::new(10, 50, 10, 50), &EngineConfig::default().split)
        .unwrap()
        .is_none());
}

#[test]
fn test_merge_color_ignores_input_order() {
    let a = Shape::from_segments(block(0, 9, 0, 30), Hsla::hsl(30.0, 0.2, 0.4)).unwrap();
    let b = Shape::from_segments(block(5, 7, 25, 50), Hsla::hsl(210.0, 0.9, 0.6)).unwrap();
    let config = MergeConfig::default();

    let forward = Shape::from_merge(&[a.clone(), b.clone()], &config).unwrap();
    let backward = Shape::from_merge(&[b, a], &config).unwrap();
    assert_eq!(forward.segments(), backward.segments());
    assert!((forward.color.hue - backward.color.hue).abs() < 1e-9);
    assert!((forward.color.saturation - backward.color.saturation).abs() < 1e-9);
    assert!((forward.color.lightness - backward.color.lightness).abs() < 1e-9);
}
