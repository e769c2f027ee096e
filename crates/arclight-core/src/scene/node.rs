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

//! Nodes of the model arena and the GPU data of renderable ones.

use crate::renderer::api::BufferId;
use crate::renderer::{PsoKey, TextureHandle};
use crate::scene::transform::Transform;
use glam::Mat4;

/// Index of a node in its model's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

/// One node of a model's tree.
#[derive(Debug)]
pub struct Node {
    /// Name from the source asset.
    pub name: String,
    /// Transform authored in the source asset.
    pub bind: Option<Transform>,
    /// Current local transform; the bind transform unless animated.
    pub local: Option<Transform>,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeIndex>,
    /// Children in authored order.
    pub children: Vec<NodeIndex>,
    /// Geometry is kept but not drawn.
    pub no_render: bool,
    /// Pipeline features this node draws with.
    pub key: PsoKey,
    /// What the node renders.
    pub kind: NodeKind,
}

impl Node {
    /// The local matrix, identity when no transform is authored.
    pub fn local_matrix(&self) -> Mat4 {
        self.local.map_or(Mat4::IDENTITY, |t| t.to_matrix())
    }

    /// Whether the node issues a draw.
    pub fn is_renderable(&self) -> bool {
        !self.no_render && !matches!(self.kind, NodeKind::Group)
    }
}

/// The renderable payload of a node.
#[derive(Debug)]
pub enum NodeKind {
    /// Transform only.
    Group,
    /// Rigid mesh.
    Mesh(MeshNode),
    /// Skinned mesh.
    Skin(SkinNode),
}

/// GPU geometry shared by meshes and skins.
///
/// Each mesh is drawn as a single instance, so there is no instance buffer. Meshes
/// carry no colour table of their own: paletted colours live in the texture cache's
/// palette layers.
#[derive(Debug)]
pub struct GpuMesh {
    /// Vertex records.
    pub vertex_buffer: BufferId,
    /// `u32` triangle list.
    pub index_buffer: BufferId,
    /// Number of indices.
    pub index_count: u32,
    /// Per-draw `Constants` block.
    pub constants_buffer: BufferId,
    /// Diffuse texture.
    pub texture: TextureHandle,
    /// Name the texture was loaded under, `None` for the placeholder.
    pub texture_name: Option<String>,
}

/// A rigid mesh.
#[derive(Debug)]
pub struct MeshNode {
    /// Its geometry.
    pub gpu: GpuMesh,
}

/// A skinned mesh.
#[derive(Debug)]
pub struct SkinNode {
    /// Its geometry.
    pub gpu: GpuMesh,
    /// The `Joints` block.
    pub joints_buffer: BufferId,
    /// Joint node names from the source asset.
    pub joint_names: Vec<String>,
    /// Resolved joint nodes, filled by skin initialisation.
    pub joints: Vec<NodeIndex>,
    /// Per joint: mesh space to the joint's space at bind time.
    pub inverse_bind: Vec<Mat4>,
    /// All joints resolved.
    pub ready: bool,
}
