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

use crate::renderer::api::command::{CommandBufferId, RenderPassDescriptor, ShaderVariable};
use crate::renderer::api::{BufferId, IndexFormat, RenderPipelineId, ResourceBindingId};
use crate::renderer::error::RenderError;
use std::ops::Range;

/// A trait representing an active render pass, used for recording drawing commands.
///
/// A `RenderPass` object is obtained from a [`CommandEncoder`] and provides methods
/// to set pipeline state and issue draw calls. Dropping it ends the pass.
pub trait RenderPass {
    /// Sets the active render pipeline for subsequent draw calls.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Binds a resource binding, assigning the given per-draw mutable variables first.
    ///
    /// Static variables keep the resource that was set on the pipeline.
    fn commit_resources(
        &mut self,
        binding: ResourceBindingId,
        variables: &[ShaderVariable<'_>],
    ) -> Result<(), RenderError>;

    /// Binds a vertex buffer to a specific slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat);

    /// Records an indexed draw call.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}

/// A trait for an object that records a sequence of GPU commands.
///
/// A `CommandEncoder` is the main tool for building a [`CommandBufferId`]. Only one
/// render pass can be open at a time since the pass borrows the encoder mutably.
pub trait CommandEncoder {
    /// Begins a new render pass on a swapchain's current frame.
    ///
    /// Fails if no frame has been acquired for the swapchain.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Result<Box<dyn RenderPass + 'encoder>, RenderError>;

    /// Finalizes the command recording and returns a handle to the resulting command buffer.
    ///
    /// This method consumes the encoder. The returned [`CommandBufferId`] can then
    /// be submitted through [`GraphicsDevice::submit_command_buffer`](super::GraphicsDevice::submit_command_buffer).
    fn finish(self: Box<Self>) -> CommandBufferId;
}
