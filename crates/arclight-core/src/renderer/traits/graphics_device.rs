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

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::CommandEncoder;
use std::fmt::Debug;

/// The main interface for creating and managing GPU resources.
///
/// Every object is referenced through an opaque id; the implementation owns the native
/// objects. All calls are made from the single render thread, but implementations are
/// `Send + Sync` so the device can be shared through an `Arc`.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Get the adapter information of the rendering system.
    fn get_adapter_info(&self) -> RendererAdapterInfo;

    /// The native API this device was created on.
    fn backend_type(&self) -> GraphicsBackendType {
        self.get_adapter_info().backend_type
    }

    /// Creates a shader module from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - A reference to a `ShaderModuleDescriptor` containing the shader source and other properties.
    /// ## Returns
    /// A `Result` containing the ID of the created shader module or an error if the creation fails.
    /// ## Errors
    /// * `ResourceError` - If the shader module creation fails.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError>;

    /// Destroys the shader module associated with the given ID.
    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError>;

    /// Creates a render pipeline from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - A reference to a `RenderPipelineDescriptor` containing the pipeline configuration
    ///   and the resource variables it declares.
    /// ## Returns
    /// A `Result` containing the ID of the created render pipeline or an error if the creation fails.
    /// ## Errors
    /// * `ResourceError` - If the render pipeline creation fails.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Destroys the render pipeline associated with the given ID.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError>;

    /// Binds a resource to one of the pipeline's static variables.
    ///
    /// The resource is shared by every resource binding created from the pipeline.
    /// ## Errors
    /// * `ResourceError` - If the variable is unknown, not static, or of another kind.
    fn set_static_variable(
        &self,
        pipeline: RenderPipelineId,
        name: &str,
        resource: BindingResource,
    ) -> Result<(), ResourceError>;

    /// Creates a resource binding for a pipeline.
    ///
    /// Static variables must already be set. Mutable variables are supplied per draw
    /// through [`RenderPass::commit_resources`](super::RenderPass::commit_resources).
    fn create_resource_binding(
        &self,
        pipeline: RenderPipelineId,
    ) -> Result<ResourceBindingId, ResourceError>;

    /// Destroys a resource binding.
    fn destroy_resource_binding(&self, id: ResourceBindingId) -> Result<(), ResourceError>;

    /// Creates a new GPU buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// * `data` - A slice of bytes containing the initial data for the buffer.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Writes data to a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to write to.
    /// * `offset` - The offset in the buffer where the data will be written.
    /// * `data` - A slice of bytes containing the data to be written.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a new 2D GPU texture. A default view over every mip is created with it.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Writes one mip level of a GPU texture.
    /// ## Arguments
    /// * `texture_id` - The ID of the texture to write to.
    /// * `mip_level` - The mip level written.
    /// * `data` - Tightly packed texel data.
    /// * `bytes_per_row` - The number of bytes per row in `data`.
    /// * `size` - The extent of the mip level.
    fn write_texture(
        &self,
        texture_id: TextureId,
        mip_level: u32,
        data: &[u8],
        bytes_per_row: u32,
        size: Extent3D,
    ) -> Result<(), ResourceError>;

    /// Destroys a GPU texture and its default view.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a new sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Creates a swapchain and its depth buffer for a native window.
    /// ## Errors
    /// * `RenderError::NullWindowHandle` - If `handle` has no window.
    /// * `RenderError::SurfaceAcquisitionFailed` - If the backend rejects the window.
    fn create_swapchain(
        &self,
        handle: NativeHandle,
        descriptor: &SwapchainDescriptor,
    ) -> Result<SwapchainId, RenderError>;

    /// Reconfigures a swapchain to a new size and recreates its depth buffer.
    ///
    /// The caller must wait for the device to be idle first.
    fn resize_swapchain(&self, id: SwapchainId, width: u32, height: u32)
        -> Result<(), RenderError>;

    /// The current back buffer size of a swapchain.
    fn swapchain_extent(&self, id: SwapchainId) -> Option<Extent3D>;

    /// Acquires the next back buffer of a swapchain as the target of subsequent passes.
    fn acquire_next_frame(&self, id: SwapchainId) -> Result<(), RenderError>;

    /// Presents the acquired back buffer.
    fn present(&self, id: SwapchainId) -> Result<(), RenderError>;

    /// Destroys a swapchain and its depth buffer.
    fn destroy_swapchain(&self, id: SwapchainId) -> Result<(), ResourceError>;

    /// Creates a new command encoder to record GPU commands.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Submits a previously recorded command buffer to the immediate queue.
    fn submit_command_buffer(&self, command_buffer: CommandBufferId);

    /// Blocks until the GPU has finished all submitted work.
    fn wait_for_idle(&self);
}
