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

//! The preview scene graph: a model's node tree, its GPU geometry and its animation.
//!
//! A [`Model`] owns every node of its tree in one arena. Parent and child links are
//! indices into that arena, so the tree never holds references into itself.

pub mod model;
pub mod node;
pub mod transform;
pub mod vertex;

pub use self::model::Model;
pub use self::node::{GpuMesh, MeshNode, Node, NodeIndex, NodeKind, SkinNode};
pub use self::transform::Transform;
pub use self::vertex::{Constants, JointPalette, RigidVertex, SkinnedVertex};

use crate::renderer::{GraphicsDevice, PipelineCache, RenderPass, ShaderManager};
use glam::Mat4;

/// Everything a model needs to record its draws into an open pass.
pub struct DrawContext<'a> {
    /// The pass being recorded.
    pub pass: &'a mut dyn RenderPass,
    /// The device owning the model's buffers.
    pub device: &'a dyn GraphicsDevice,
    /// Pipelines, built on demand.
    pub pipelines: &'a mut PipelineCache,
    /// Shaders pipelines are built from.
    pub shaders: &'a ShaderManager,
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub proj: Mat4,
}
