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

//! Descriptors and types used while recording GPU commands.

use crate::renderer::api::buffer::BufferId;
use crate::renderer::api::surface::SwapchainId;
use crate::renderer::api::texture::{SamplerId, TextureId};

/// Describes the operation to perform on an attachment at the start of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOp<V> {
    /// The existing contents of the attachment will be loaded into the pass.
    Load,
    /// The attachment will be cleared to the specified value before the pass begins.
    Clear(V),
}

/// A descriptor for a render pass targeting a swapchain's current frame.
///
/// The color attachment is the back buffer acquired with
/// [`GraphicsDevice::acquire_next_frame`](crate::renderer::GraphicsDevice::acquire_next_frame)
/// and the depth attachment is the swapchain's own depth buffer.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label for the render pass.
    pub label: Option<&'a str>,
    /// The swapchain whose current frame is rendered to.
    pub swapchain: SwapchainId,
    /// What happens to the color target when the pass begins.
    pub color_load: LoadOp<[f32; 4]>,
    /// What happens to the depth target when the pass begins.
    pub depth_load: LoadOp<f32>,
}

/// An opaque handle to a recorded command buffer, ready for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandBufferId(pub usize);

/// A concrete GPU resource bound to a shader variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingResource {
    /// A uniform buffer, bound in full.
    Buffer(BufferId),
    /// A texture, bound through its default view.
    Texture(TextureId),
    /// A sampler.
    Sampler(SamplerId),
}

/// Assigns a resource to a named mutable variable for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderVariable<'a> {
    /// Name of the variable declared on the pipeline.
    pub name: &'a str,
    /// The resource to bind.
    pub resource: BindingResource,
}

impl<'a> ShaderVariable<'a> {
    /// Shorthand constructor.
    pub fn new(name: &'a str, resource: BindingResource) -> Self {
        Self { name, resource }
    }
}
