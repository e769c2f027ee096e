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

//! The parsed model tree handed over by the model format parser.

use crate::renderer::error::AssetError;
use crate::scene::transform::Transform;
use crate::scene::vertex::{RigidVertex, SkinnedVertex};
use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A parsed model: one node tree and the animations defined on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    /// The model's resource name.
    pub name: String,
    /// Root of the node tree.
    pub root: SourceNode,
    /// Animations, looked up by name.
    #[serde(default)]
    pub animations: Vec<AnimationAsset>,
}

impl ModelAsset {
    /// Looks up an animation by name, ignoring case.
    pub fn animation(&self, name: &str) -> Option<&AnimationAsset> {
        self.animations
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        fn count(node: &SourceNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Checks mesh data for consistent lengths and in-range indices.
    pub fn validate(&self) -> Result<(), AssetError> {
        fn walk(model: &str, node: &SourceNode) -> Result<(), AssetError> {
            match &node.kind {
                SourceNodeKind::Dummy => {}
                SourceNodeKind::TriMesh(mesh) => mesh.validate(model, &node.name)?,
                SourceNodeKind::Skin(skin) => skin.validate(model, &node.name)?,
            }
            node.children.iter().try_for_each(|c| walk(model, c))
        }
        walk(&self.name, &self.root)
    }
}

/// One node of the parsed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    /// Node name, unique within the model. Animation tracks and skin joints refer to it.
    pub name: String,
    /// Authored local transform, if any.
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Geometry is loaded but never drawn.
    #[serde(default)]
    pub no_render: bool,
    /// What the node carries.
    #[serde(default)]
    pub kind: SourceNodeKind,
    /// Children in authored order.
    #[serde(default)]
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    /// A transform-only node.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
            no_render: false,
            kind: SourceNodeKind::Dummy,
            children: Vec::new(),
        }
    }

    /// Sets the authored transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sets the payload.
    pub fn with_kind(mut self, kind: SourceNodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Payload of a [`SourceNode`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SourceNodeKind {
    /// No geometry.
    #[default]
    Dummy,
    /// Rigid triangle mesh.
    TriMesh(MeshData),
    /// Skinned triangle mesh.
    Skin(SkinData),
}

/// Triangle list geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Texture coordinates, empty or one per position.
    pub uvs: Vec<Vec2>,
    /// Normals, empty or one per position.
    pub normals: Vec<Vec3>,
    /// Tangents with handedness in `w`, empty or one per position.
    pub tangents: Vec<Vec4>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Diffuse texture resource name.
    pub diffuse: Option<String>,
}

impl MeshData {
    /// Builds rigid vertex records; missing attributes take neutral values.
    pub fn rigid_vertices(&self) -> Vec<RigidVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| RigidVertex {
                position: p.to_array(),
                uv: self.uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::Z).to_array(),
                tangent: self
                    .tangents
                    .get(i)
                    .copied()
                    .unwrap_or(Vec4::new(1.0, 0.0, 0.0, 1.0))
                    .to_array(),
            })
            .collect()
    }

    /// Diffuse texture name, treating an empty name as none.
    pub fn diffuse_name(&self) -> Option<&str> {
        self.diffuse.as_deref().filter(|n| !n.is_empty())
    }

    fn validate(&self, model: &str, node: &str) -> Result<(), AssetError> {
        let n = self.positions.len();
        let invalid = |details: String| AssetError::InvalidModel {
            name: model.to_owned(),
            details: format!("node '{node}': {details}"),
        };
        for (what, len) in [
            ("uvs", self.uvs.len()),
            ("normals", self.normals.len()),
            ("tangents", self.tangents.len()),
        ] {
            if len != 0 && len != n {
                return Err(invalid(format!("{len} {what} for {n} positions")));
            }
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "{} indices is not a triangle list",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(invalid(format!("index {bad} out of range")));
        }
        Ok(())
    }
}

/// Skinned geometry: a mesh plus per-vertex bone influences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinData {
    /// The underlying mesh.
    pub mesh: MeshData,
    /// Per-vertex indices into `joints`, `-1` for unused.
    pub bones: Vec<[i32; 4]>,
    /// Per-vertex influence weights.
    pub weights: Vec<[f32; 4]>,
    /// Names of the nodes acting as joints.
    pub joints: Vec<String>,
}

impl SkinData {
    /// Builds skinned vertex records.
    pub fn skinned_vertices(&self) -> Vec<SkinnedVertex> {
        self.mesh
            .rigid_vertices()
            .into_iter()
            .enumerate()
            .map(|(i, v)| SkinnedVertex {
                position: v.position,
                uv: v.uv,
                normal: v.normal,
                tangent: v.tangent,
                bones: self.bones.get(i).copied().unwrap_or([-1; 4]),
                weights: self.weights.get(i).copied().unwrap_or([0.0; 4]),
            })
            .collect()
    }

    fn validate(&self, model: &str, node: &str) -> Result<(), AssetError> {
        self.mesh.validate(model, node)?;
        let n = self.mesh.positions.len();
        let invalid = |details: String| AssetError::InvalidModel {
            name: model.to_owned(),
            details: format!("skin '{node}': {details}"),
        };
        if self.bones.len() != n || self.weights.len() != n {
            return Err(invalid(format!(
                "{} bone sets and {} weight sets for {n} vertices",
                self.bones.len(),
                self.weights.len()
            )));
        }
        let joints = self.joints.len() as i32;
        if let Some(bad) = self.bones.iter().flatten().find(|&&b| b >= joints) {
            return Err(invalid(format!("bone {bad} exceeds {joints} joints")));
        }
        Ok(())
    }
}

/// A key of an animation track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    /// Time of the key in milliseconds.
    pub time_ms: f32,
    /// Value at that time.
    pub value: T,
}

/// Keyframes animating one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTrack {
    /// The animated node's name.
    pub node: String,
    /// Translation keys, sorted by time.
    pub positions: Vec<Key<Vec3>>,
    /// Rotation keys, sorted by time.
    pub orientations: Vec<Key<Quat>>,
    /// Scale keys, sorted by time.
    pub scales: Vec<Key<Vec3>>,
}

impl NodeTrack {
    /// Samples the track at `time_ms`.
    ///
    /// Positions and scales interpolate linearly, orientations spherically.
    /// Times outside the keys clamp to the first or last key, and channels
    /// without keys keep the value of `base`.
    pub fn sample(&self, time_ms: f32, base: &Transform) -> Transform {
        Transform {
            translation: sample_keys(&self.positions, time_ms, Vec3::lerp)
                .unwrap_or(base.translation),
            rotation: sample_keys(&self.orientations, time_ms, Quat::slerp)
                .unwrap_or(base.rotation),
            scale: sample_keys(&self.scales, time_ms, Vec3::lerp).unwrap_or(base.scale),
        }
    }
}

fn sample_keys<T: Copy>(keys: &[Key<T>], time_ms: f32, interp: fn(T, T, f32) -> T) -> Option<T> {
    let first = keys.first()?;
    if time_ms <= first.time_ms {
        return Some(first.value);
    }
    // First key strictly after `time_ms`.
    let next = keys.partition_point(|k| k.time_ms <= time_ms);
    if next == keys.len() {
        return keys.last().map(|k| k.value);
    }
    let (a, b) = (&keys[next - 1], &keys[next]);
    let span = b.time_ms - a.time_ms;
    let t = if span > f32::EPSILON {
        (time_ms - a.time_ms) / span
    } else {
        0.0
    };
    Some(interp(a.value, b.value, t))
}

/// A named looping animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    /// Animation name.
    pub name: String,
    /// Loop length in milliseconds.
    pub length_ms: u32,
    /// One track per animated node.
    #[serde(default)]
    pub tracks: Vec<NodeTrack>,
}

impl AnimationAsset {
    /// The track animating `node`, if any.
    pub fn track(&self, node: &str) -> Option<&NodeTrack> {
        self.tracks.iter().find(|t| t.node == node)
    }
}

/// Turns model resource bytes into a [`ModelAsset`].
pub trait ModelParser: Send + Sync + Debug {
    /// Parses `bytes` loaded for the model `name`.
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<ModelAsset, AssetError>;
}

/// Reads models stored as JSON-serialized [`ModelAsset`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonModelParser;

impl ModelParser for JsonModelParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<ModelAsset, AssetError> {
        let asset: ModelAsset =
            serde_json::from_slice(bytes).map_err(|e| AssetError::InvalidModel {
                name: name.to_owned(),
                details: e.to_string(),
            })?;
        asset.validate()?;
        Ok(asset)
    }
}
