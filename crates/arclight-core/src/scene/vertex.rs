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

//! GPU-visible vertex records and per-draw constant blocks.

use crate::renderer::api::{
    VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat, VertexStepMode,
};
use crate::renderer::shaders::MAX_JOINTS;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::borrow::Cow;
use std::mem::{offset_of, size_of};

/// Vertex of a rigid mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct RigidVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Tangent, `w` carrying the bitangent sign.
    pub tangent: [f32; 4],
}

/// Vertex of a skinned mesh: a rigid vertex plus up to four bone influences.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SkinnedVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Tangent, `w` carrying the bitangent sign.
    pub tangent: [f32; 4],
    /// Indices into the skin's joint list, `-1` for an unused slot.
    pub bones: [i32; 4],
    /// Influence weights matching `bones`.
    pub weights: [f32; 4],
}

static RIGID_ATTRIBUTES: [VertexAttributeDescriptor; 4] = [
    VertexAttributeDescriptor {
        shader_location: 0,
        format: VertexFormat::Float32x3,
        offset: offset_of!(RigidVertex, position) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 1,
        format: VertexFormat::Float32x2,
        offset: offset_of!(RigidVertex, uv) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 2,
        format: VertexFormat::Float32x3,
        offset: offset_of!(RigidVertex, normal) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 3,
        format: VertexFormat::Float32x4,
        offset: offset_of!(RigidVertex, tangent) as u64,
    },
];

static SKINNED_ATTRIBUTES: [VertexAttributeDescriptor; 6] = [
    VertexAttributeDescriptor {
        shader_location: 0,
        format: VertexFormat::Float32x3,
        offset: offset_of!(SkinnedVertex, position) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 1,
        format: VertexFormat::Float32x2,
        offset: offset_of!(SkinnedVertex, uv) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 2,
        format: VertexFormat::Float32x3,
        offset: offset_of!(SkinnedVertex, normal) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 3,
        format: VertexFormat::Float32x4,
        offset: offset_of!(SkinnedVertex, tangent) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 4,
        format: VertexFormat::Sint32x4,
        offset: offset_of!(SkinnedVertex, bones) as u64,
    },
    VertexAttributeDescriptor {
        shader_location: 5,
        format: VertexFormat::Float32x4,
        offset: offset_of!(SkinnedVertex, weights) as u64,
    },
];

impl RigidVertex {
    /// Input layout of a rigid vertex buffer.
    pub fn layout() -> VertexBufferLayoutDescriptor<'static> {
        VertexBufferLayoutDescriptor {
            array_stride: size_of::<Self>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Borrowed(&RIGID_ATTRIBUTES[..]),
        }
    }
}

impl SkinnedVertex {
    /// Input layout of a skinned vertex buffer.
    pub fn layout() -> VertexBufferLayoutDescriptor<'static> {
        VertexBufferLayoutDescriptor {
            array_stride: size_of::<Self>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Borrowed(&SKINNED_ATTRIBUTES[..]),
        }
    }
}

/// The per-draw `Constants` block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Constants {
    /// Object to world.
    pub model: [[f32; 4]; 4],
    /// World to view.
    pub view: [[f32; 4]; 4],
    /// View to clip.
    pub proj: [[f32; 4]; 4],
    /// `x` is 1 when the diffuse texture is paletted.
    pub params: [u32; 4],
}

impl Constants {
    /// Packs the three matrices and the paletted flag.
    pub fn new(model: Mat4, view: Mat4, proj: Mat4, paletted: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            params: [paletted as u32, 0, 0, 0],
        }
    }
}

/// The `Joints` block of a skinned draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct JointPalette {
    /// Skinning matrix per joint; unused slots are identity.
    pub matrices: [[[f32; 4]; 4]; MAX_JOINTS],
}

impl JointPalette {
    /// Fills the palette from `joints`, truncating past [`MAX_JOINTS`].
    pub fn from_matrices(joints: &[Mat4]) -> Self {
        let mut matrices = [Mat4::IDENTITY.to_cols_array_2d(); MAX_JOINTS];
        for (slot, joint) in matrices.iter_mut().zip(joints) {
            *slot = joint.to_cols_array_2d();
        }
        Self { matrices }
    }
}
