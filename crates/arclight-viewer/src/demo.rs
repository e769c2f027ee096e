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


//! The built-in demonstration model shown when no model is requested.

use arclight_core::asset::{
    AnimationAsset, Key, MeshData, ModelAsset, NodeTrack, SourceNode, SourceNodeKind,
};
use arclight_core::scene::Transform;
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Name of the looping animation of [`cube_stack`].
pub const SPIN: &str = "spin";

/// Length of one [`SPIN`] loop.
pub const SPIN_LENGTH_MS: u32 = 4000;

/// An axis-aligned cube of half-extent `half`, four vertices per face so every face
/// gets its own normal, tangent and texture coordinates.
pub fn cube(half: f32, diffuse: &str) -> MeshData {
    let faces = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::NEG_X),
        (Vec3::NEG_Y, Vec3::X),
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::NEG_X),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let uvs = [
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];

    let mut mesh = MeshData {
        diffuse: Some(diffuse.to_owned()),
        ..Default::default()
    };
    for (normal, tangent) in faces {
        // tangent x bitangent == normal keeps every face counter-clockwise from outside.
        let bitangent = normal.cross(tangent);
        let base = mesh.positions.len() as u32;
        for ((s, t), uv) in corners.into_iter().zip(uvs) {
            mesh.positions
                .push((normal + tangent * s + bitangent * t) * half);
            mesh.uvs.push(uv);
            mesh.normals.push(normal);
            mesh.tangents.push(tangent.extend(1.0));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

fn mesh_node(name: &str, mesh: MeshData) -> SourceNode {
    SourceNode::dummy(name).with_kind(SourceNodeKind::TriMesh(mesh))
}

/// Three nested cubes, each smaller and stacked on its parent, spinning about the
/// vertical axis while the top cube bobs.
pub fn cube_stack(diffuse: &str) -> ModelAsset {
    let top = mesh_node("top", cube(0.25, diffuse))
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 0.7)));
    let middle = mesh_node("middle", cube(0.35, diffuse))
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 0.9)))
        .with_child(top);
    let base = mesh_node("base", cube(0.5, diffuse))
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 0.5)))
        .with_child(middle);
    let root = SourceNode::dummy("cube_stack").with_child(base);

    let quarter = SPIN_LENGTH_MS as f32 / 4.0;
    let spin = NodeTrack {
        node: "base".to_owned(),
        orientations: (0..=4)
            .map(|i| Key {
                time_ms: quarter * i as f32,
                value: Quat::from_rotation_z(FRAC_PI_2 * i as f32),
            })
            .collect(),
        ..Default::default()
    };
    // Counter-rotates at half speed relative to its parent.
    let counter = NodeTrack {
        node: "middle".to_owned(),
        orientations: (0..=4)
            .map(|i| Key {
                time_ms: quarter * i as f32,
                value: Quat::from_rotation_z(-FRAC_PI_2 * 0.5 * i as f32),
            })
            .collect(),
        ..Default::default()
    };
    let bob = NodeTrack {
        node: "top".to_owned(),
        positions: vec![
            Key {
                time_ms: 0.0,
                value: Vec3::new(0.0, 0.0, 0.7),
            },
            Key {
                time_ms: SPIN_LENGTH_MS as f32 / 2.0,
                value: Vec3::new(0.0, 0.0, 0.9),
            },
            Key {
                time_ms: SPIN_LENGTH_MS as f32,
                value: Vec3::new(0.0, 0.0, 0.7),
            },
        ],
        ..Default::default()
    };

    ModelAsset {
        name: "cube_stack".to_owned(),
        root,
        animations: vec![AnimationAsset {
            name: SPIN.to_owned(),
            length_ms: SPIN_LENGTH_MS,
            tracks: vec![spin, counter, bob],
        }],
    }
}
