//! Redraw detection and the draw pass.

use std::path::Path;

use tilewalk::area::Area;
use tilewalk::components::actor::ActorKind;
use tilewalk::components::animation::{AnimationClock, ImageKey};
use tilewalk::components::sprite::Sprite;
use tilewalk::coords::VICoord;
use tilewalk::descriptor::AreaDescriptor;
use tilewalk::resources::engineconfig::EngineConfig;
use tilewalk::systems::redraw::Renderer;
use tilewalk::systems::spawn::ActorSpawn;

#[derive(Default)]
struct Recorder {
    calls: Vec<(String, f64, f64, f64)>,
}

impl Renderer for Recorder {
    fn draw_image(&mut self, image: &ImageKey, x: f64, y: f64, z: f64) {
        self.calls.push((image.to_string(), x, y, z));
    }
}

fn column(water_ms: u64) -> Area {
    let json = serde_json::json!({
        "width": 1,
        "height": 2,
        "tile_types": [
            { "frames": ["grass"] },
            { "frames": ["water0", "water1"], "frame_ms": water_ms }
        ],
        "layers": [ { "depth": 0.0, "cells": [0, 1] } ]
    });
    let desc: AreaDescriptor = serde_json::from_value(json).unwrap();
    desc.build("column", &EngineConfig::default(), Path::new("."))
        .unwrap()
}

#[test]
fn draws_tiles_then_entities_with_isometric_depth() {
    let mut area = column(0);
    let sprite = Sprite::new([("down", AnimationClock::still("hero"))]);
    area.spawn(
        ActorSpawn::new(ActorKind::Npc, "hero", VICoord::new(0, 1, 0.0)).with_sprite(sprite),
    );

    assert!(area.needs_redraw());
    let mut rec = Recorder::default();
    area.draw(&mut rec);

    assert_eq!(rec.calls.len(), 3);
    assert_eq!(rec.calls[0], ("grass".to_string(), 0.0, 0.0, 0.0));
    assert_eq!(rec.calls[1], ("water0".to_string(), 0.0, 16.0, 0.0));
    let (image, x, y, z) = &rec.calls[2];
    assert_eq!(image, "hero");
    assert_eq!((*x, *y), (0.0, 16.0));
    assert!((z - 0.001).abs() < 1e-12);

    assert!(!area.needs_redraw());
}

#[test]
fn animated_tiles_ask_for_a_redraw_when_their_frame_changes() {
    let mut area = column(100);
    area.draw(&mut Recorder::default());
    assert!(!area.needs_redraw());

    area.tick(50);
    assert!(!area.needs_redraw());
    area.tick(50);
    assert!(area.needs_redraw());

    let mut rec = Recorder::default();
    area.draw(&mut rec);
    assert!(rec.calls.iter().any(|(image, ..)| image == "water1"));
    assert!(!area.needs_redraw());
}

#[test]
fn explicit_requests_force_a_redraw() {
    let mut area = column(0);
    area.draw(&mut Recorder::default());
    assert!(!area.needs_redraw());
    area.request_redraw();
    assert!(area.needs_redraw());
}
