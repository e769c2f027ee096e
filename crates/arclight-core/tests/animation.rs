// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use arclight_core::asset::{AnimationAsset, Key, MemoryResourceProvider, ModelAsset, NodeTrack, SourceNode};
use arclight_core::scene::Transform;
use arclight_core::Model;
use common::{texture_cache, MockGraphicsDevice};
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

fn slide(name: &str, length_ms: u32) -> AnimationAsset {
    AnimationAsset {
        name: name.into(),
        length_ms,
        tracks: vec![NodeTrack {
            node: "arm".into(),
            positions: vec![
                Key {
                    time_ms: 0.0,
                    value: Vec3::ZERO,
                },
                Key {
                    time_ms: 1000.0,
                    value: Vec3::new(10.0, 0.0, 0.0),
                },
            ],
            orientations: vec![
                Key {
                    time_ms: 0.0,
                    value: Quat::IDENTITY,
                },
                Key {
                    time_ms: 1000.0,
                    value: Quat::from_rotation_z(FRAC_PI_2),
                },
            ],
            ..NodeTrack::default()
        }],
    }
}

fn model(animations: Vec<AnimationAsset>) -> Model {
    let device = MockGraphicsDevice::new();
    let mut textures = texture_cache(&device, MemoryResourceProvider::new());
    let root = SourceNode::dummy("root")
        .with_child(
            SourceNode::dummy("arm")
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 1.0))),
        )
        .with_child(
            SourceNode::dummy("leg")
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, -1.0))),
        );
    let asset = Arc::new(ModelAsset {
        name: "puppet".into(),
        root,
        animations,
    });
    Model::load(asset, device.as_ref(), &mut textures).expect("model loads")
}

fn translation_of(model: &Model, name: &str) -> Vec3 {
    let index = model.find(name).expect("node exists");
    model.pose_matrix(index).w_axis.truncate()
}

#[test]
fn update_without_animation_changes_nothing() {
    let mut model = model(vec![slide("walk", 1000)]);
    let before = translation_of(&model, "arm");

    model.update(250);

    assert_eq!(model.cursor_ms(), 0);
    assert_eq!(model.animation_name(), None);
    assert_eq!(translation_of(&model, "arm"), before);
}

#[test]
fn cursor_wraps_at_the_animation_length() {
    let mut model = model(vec![slide("walk", 1000)]);
    assert!(model.load_animation("walk"));

    model.update(600);
    assert_eq!(model.cursor_ms(), 600);
    model.update(600);
    assert_eq!(model.cursor_ms(), 200);
    model.update(800);
    assert_eq!(model.cursor_ms(), 0);
}

#[test]
fn cursor_stays_inside_the_animation() {
    let mut model = model(vec![slide("walk", 733)]);
    model.load_animation("walk");

    for dt in [0, 1, 16, 733, 1000, 5_000, u32::MAX] {
        model.update(dt);
        assert!(model.cursor_ms() < 733, "cursor {} after dt {dt}", model.cursor_ms());
    }
}

#[test]
fn zero_length_animation_pins_the_cursor() {
    let mut model = model(vec![slide("pose", 0)]);
    model.load_animation("pose");

    model.update(40);

    assert_eq!(model.cursor_ms(), 0);
}

#[test]
fn tracks_interpolate_between_keys() {
    let mut model = model(vec![slide("walk", 2000)]);
    model.load_animation("walk");

    model.update(250);
    assert!(translation_of(&model, "arm").abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-5));

    model.update(250);
    let arm = model.node(model.find("arm").expect("arm"));
    let local = arm.local.expect("animated");
    let expected = Quat::IDENTITY.slerp(Quat::from_rotation_z(FRAC_PI_2), 0.5);
    assert!(local.rotation.abs_diff_eq(expected, 1e-5));
}

#[test]
fn tracks_hold_their_last_key() {
    let mut model = model(vec![slide("walk", 3000)]);
    model.load_animation("walk");

    model.update(2500);

    assert!(translation_of(&model, "arm").abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-5));
}

#[test]
fn untracked_nodes_keep_their_bind_transform() {
    let mut model = model(vec![slide("walk", 1000)]);
    model.load_animation("walk");

    model.update(500);

    assert_eq!(translation_of(&model, "leg"), Vec3::new(0.0, 0.0, -1.0));
}

#[test]
fn unknown_animation_keeps_the_current_one() {
    let mut model = model(vec![slide("walk", 1000), slide("run", 500)]);
    assert!(model.load_animation("walk"));
    model.update(300);

    assert!(!model.load_animation("swim"));

    assert_eq!(model.animation_name(), Some("walk"));
    assert_eq!(model.cursor_ms(), 300);
}

#[test]
fn switching_animation_rewinds() {
    let mut model = model(vec![slide("walk", 1000), slide("run", 500)]);
    model.load_animation("walk");
    model.update(300);

    assert!(model.load_animation("RUN"));

    assert_eq!(model.animation_name(), Some("run"));
    assert_eq!(model.cursor_ms(), 0);
}
