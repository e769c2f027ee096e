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

//! Pipeline state descriptors and the resource variables a pipeline declares.

use crate::renderer::api::common::{CompareFunction, TextureFormat};
use crate::renderer::api::shader::ShaderModuleId;
use bitflags::bitflags;
use std::borrow::Cow;

/// The memory format of a single vertex attribute's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
    /// Four 32-bit signed integer components.
    Sint32x4,
}

impl VertexFormat {
    /// Size of one attribute of this format in bytes.
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 | VertexFormat::Sint32x4 => 16,
        }
    }
}

/// How often a vertex buffer is advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStepMode {
    /// Advanced once per vertex.
    Vertex,
    /// Advanced once per instance.
    Instance,
}

/// Describes a single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// The input location of this attribute in the vertex shader.
    pub shader_location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset of this attribute from the start of the vertex.
    pub offset: u64,
}

/// Describes the memory layout of a single vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayoutDescriptor<'a> {
    /// The byte distance between consecutive elements in the buffer.
    pub array_stride: u64,
    /// How often the vertex buffer is advanced.
    pub step_mode: VertexStepMode,
    /// A list of attributes contained within each element of the buffer.
    pub attributes: Cow<'a, [VertexAttributeDescriptor]>,
}

/// The face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// The vertex winding order that determines the "front" face of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise triangles face the viewer.
    Ccw,
    /// Clockwise triangles face the viewer.
    Cw,
}

/// Describes the state for primitive assembly and rasterization.
///
/// Only triangle lists are drawn by the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveStateDescriptor {
    /// The vertex winding order that determines the "front" face of a triangle.
    pub front_face: FrontFace,
    /// The face culling mode.
    pub cull_mode: Option<CullMode>,
}

impl Default for PrimitiveStateDescriptor {
    fn default() -> Self {
        PrimitiveStateDescriptor {
            front_face: FrontFace::Ccw,
            cull_mode: Some(CullMode::Back),
        }
    }
}

/// Describes the state for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDescriptor {
    /// The format of the depth texture.
    pub format: TextureFormat,
    /// If `true`, depth values will be written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
}

/// Describes the state of a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetStateDescriptor {
    /// The texture format of this color target.
    pub format: TextureFormat,
}

bitflags! {
    /// The shader stages a resource variable is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        /// Visible to the vertex stage.
        const VERTEX = 1 << 0;
        /// Visible to the fragment stage.
        const FRAGMENT = 1 << 1;
    }
}

/// The kind of resource bound to a variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A uniform (constant) buffer.
    UniformBuffer,
    /// A filterable 2D float texture.
    Texture,
    /// A filtering sampler.
    Sampler,
}

/// How often the resource bound to a variable may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Bound once on the pipeline and shared by every resource binding created from it.
    Static,
    /// Set on the resource binding before each draw.
    Mutable,
}

/// A resource variable a pipeline declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderVariableDescriptor<'a> {
    /// The name used to set the variable.
    pub name: Cow<'a, str>,
    /// The binding slot in the shader's resource group.
    pub binding: u32,
    /// The stages the variable is visible to.
    pub stages: ShaderStageFlags,
    /// The kind of resource expected.
    pub kind: ResourceKind,
    /// Whether the variable is static or mutable.
    pub variable_type: VariableType,
}

/// A complete descriptor for a render pipeline.
///
/// This struct aggregates all the state needed by the GPU to render primitives,
/// together with the resource variables the shaders read.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The compiled vertex shader module.
    pub vertex_shader_module: ShaderModuleId,
    /// The name of the entry point function in the vertex shader.
    pub vertex_entry_point: Cow<'a, str>,
    /// The compiled fragment shader module.
    pub fragment_shader_module: ShaderModuleId,
    /// The name of the entry point function in the fragment shader.
    pub fragment_entry_point: Cow<'a, str>,
    /// The layout of the vertex buffers.
    pub vertex_buffers_layout: Cow<'a, [VertexBufferLayoutDescriptor<'a>]>,
    /// The state for primitive assembly and rasterization.
    pub primitive_state: PrimitiveStateDescriptor,
    /// The state for depth testing. If `None`, the test is disabled.
    pub depth_stencil_state: Option<DepthStencilStateDescriptor>,
    /// The states of all color targets this pipeline will render to.
    pub color_target_states: Cow<'a, [ColorTargetStateDescriptor]>,
    /// The resource variables declared by the pipeline.
    pub variables: Cow<'a, [ShaderVariableDescriptor<'a>]>,
}

impl RenderPipelineDescriptor<'_> {
    /// Looks up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&ShaderVariableDescriptor<'_>> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// An opaque handle to a compiled render pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);

/// An opaque handle to a shader resource binding created from a pipeline.
///
/// The binding carries the pipeline's static variables and receives the mutable
/// ones when it is committed for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceBindingId(pub usize);
