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

//! A recording in-memory graphics device shared by the integration tests.

#![allow(dead_code)]

use arclight_core::asset::{
    JsonModelParser, MemoryResourceProvider, ResourceProvider, ResourceType, StandardImageDecoder,
};
use arclight_core::renderer::*;
use arclight_core::scene::Constants;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct MockTexture {
    pub label: String,
    pub format: TextureFormat,
    pub size: Extent3D,
    pub mip_level_count: u32,
    /// (mip level, bytes per row, extent, data)
    pub writes: Vec<(u32, u32, Extent3D, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct MockPipeline {
    pub label: String,
    pub vertex_stride: u64,
    pub variables: Vec<(String, VariableType)>,
    pub statics: HashMap<String, BindingResource>,
}

#[derive(Debug, Clone)]
pub struct MockSwapchain {
    pub handle: NativeHandle,
    pub width: u32,
    pub height: u32,
    pub acquired: bool,
    pub presents: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginPass {
        swapchain: SwapchainId,
        color: LoadOp<[f32; 4]>,
        depth: LoadOp<f32>,
    },
    SetPipeline(RenderPipelineId),
    Commit {
        binding: ResourceBindingId,
        variables: Vec<(String, BindingResource)>,
    },
    SetVertexBuffer(BufferId),
    SetIndexBuffer(BufferId),
    DrawIndexed(Range<u32>),
}

#[derive(Debug, Default)]
pub struct MockState {
    next_id: usize,
    pub shaders: HashMap<usize, String>,
    pub pipelines: HashMap<usize, MockPipeline>,
    pub pipelines_created: usize,
    pub bindings: HashMap<usize, usize>,
    pub buffers: HashMap<usize, Vec<u8>>,
    pub textures: HashMap<usize, MockTexture>,
    pub textures_created: usize,
    pub samplers: HashMap<usize, String>,
    pub samplers_created: usize,
    pub swapchains: HashMap<usize, MockSwapchain>,
    pub swapchains_created: usize,
    pub wait_idle_calls: usize,
    pub submits: usize,
    pub commands: Vec<Command>,
    /// Destroy calls in order, e.g. `"swapchain"`, `"texture"`.
    pub destroyed: Vec<&'static str>,
    pub fail_shaders: HashSet<String>,
    pub fail_pipelines: bool,
    pub fail_bindings: bool,
    pub fail_acquire: bool,
    /// Destroy calls are recorded but rejected, leaving the object alive.
    pub fail_destroy: bool,
}

impl MockState {
    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed(_)))
            .count()
    }

    pub fn texture(&self, id: TextureId) -> &MockTexture {
        &self.textures[&id.0]
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn get_adapter_info(&self) -> RendererAdapterInfo {
        RendererAdapterInfo {
            name: "Mock".to_string(),
            backend_type: GraphicsBackendType::native(),
            device_type: RendererDeviceType::Cpu,
        }
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let mut state = self.state();
        let label = descriptor.label.unwrap_or_default().to_owned();
        if state.fail_shaders.contains(&label) {
            return Err(ResourceError::BackendError(format!("{label} rejected")));
        }
        let id = state.next();
        state.shaders.insert(id, label);
        Ok(ShaderModuleId(id))
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("shader");
        state
            .shaders
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let mut state = self.state();
        if state.fail_pipelines {
            return Err(ResourceError::BackendError("pipeline rejected".into()));
        }
        for module in [descriptor.vertex_shader_module, descriptor.fragment_shader_module] {
            if !state.shaders.contains_key(&module.0) {
                return Err(ShaderError::InvalidModule { id: module }.into());
            }
        }
        let id = state.next();
        state.pipelines_created += 1;
        state.pipelines.insert(
            id,
            MockPipeline {
                label: descriptor.label.as_deref().unwrap_or_default().to_owned(),
                vertex_stride: descriptor.vertex_buffers_layout[0].array_stride,
                variables: descriptor
                    .variables
                    .iter()
                    .map(|v| (v.name.to_string(), v.variable_type))
                    .collect(),
                statics: HashMap::new(),
            },
        );
        Ok(RenderPipelineId(id))
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("pipeline");
        state
            .pipelines
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn set_static_variable(
        &self,
        pipeline: RenderPipelineId,
        name: &str,
        resource: BindingResource,
    ) -> Result<(), ResourceError> {
        let mut state = self.state();
        let entry = state
            .pipelines
            .get_mut(&pipeline.0)
            .ok_or(ResourceError::InvalidHandle)?;
        match entry.variables.iter().find(|(n, _)| n == name) {
            Some((_, VariableType::Static)) => {
                entry.statics.insert(name.to_owned(), resource);
                Ok(())
            }
            _ => Err(PipelineError::UnknownVariable {
                pipeline,
                name: name.to_owned(),
            }
            .into()),
        }
    }

    fn create_resource_binding(
        &self,
        pipeline: RenderPipelineId,
    ) -> Result<ResourceBindingId, ResourceError> {
        let mut state = self.state();
        if state.fail_bindings {
            return Err(ResourceError::BackendError("binding rejected".into()));
        }
        let entry = state
            .pipelines
            .get(&pipeline.0)
            .ok_or(ResourceError::InvalidHandle)?;
        if let Some((name, _)) = entry
            .variables
            .iter()
            .find(|(n, t)| *t == VariableType::Static && !entry.statics.contains_key(n))
        {
            return Err(PipelineError::UnboundVariable { name: name.clone() }.into());
        }
        let id = state.next();
        state.bindings.insert(id, pipeline.0);
        Ok(ResourceBindingId(id))
    }

    fn destroy_resource_binding(&self, id: ResourceBindingId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("binding");
        state
            .bindings
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let mut state = self.state();
        let id = state.next();
        state.buffers.insert(id, vec![0; descriptor.size as usize]);
        Ok(BufferId(id))
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let mut state = self.state();
        let id = state.next();
        state.buffers.insert(id, data.to_vec());
        Ok(BufferId(id))
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state();
        let buffer = state
            .buffers
            .get_mut(&id.0)
            .ok_or(ResourceError::InvalidHandle)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.len() {
            return Err(ResourceError::OutOfBounds);
        }
        buffer[start..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("buffer");
        if state.fail_destroy {
            return Err(ResourceError::BackendError("destroy rejected".into()));
        }
        state
            .buffers
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let mut state = self.state();
        let id = state.next();
        state.textures_created += 1;
        state.textures.insert(
            id,
            MockTexture {
                label: descriptor.label.as_deref().unwrap_or_default().to_owned(),
                format: descriptor.format,
                size: descriptor.size,
                mip_level_count: descriptor.mip_level_count,
                writes: Vec::new(),
            },
        );
        Ok(TextureId(id))
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        mip_level: u32,
        data: &[u8],
        bytes_per_row: u32,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let mut state = self.state();
        let texture = state
            .textures
            .get_mut(&texture_id.0)
            .ok_or(ResourceError::InvalidHandle)?;
        if mip_level >= texture.mip_level_count {
            return Err(ResourceError::OutOfBounds);
        }
        texture
            .writes
            .push((mip_level, bytes_per_row, size, data.to_vec()));
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("texture");
        if state.fail_destroy {
            return Err(ResourceError::BackendError("destroy rejected".into()));
        }
        state
            .textures
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let mut state = self.state();
        let id = state.next();
        state.samplers_created += 1;
        state.samplers.insert(
            id,
            descriptor.label.as_deref().unwrap_or_default().to_owned(),
        );
        Ok(SamplerId(id))
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("sampler");
        if state.fail_destroy {
            return Err(ResourceError::BackendError("destroy rejected".into()));
        }
        state
            .samplers
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_swapchain(
        &self,
        handle: NativeHandle,
        descriptor: &SwapchainDescriptor,
    ) -> Result<SwapchainId, RenderError> {
        if handle.is_null() {
            return Err(RenderError::NullWindowHandle);
        }
        let mut state = self.state();
        let id = state.next();
        state.swapchains_created += 1;
        state.swapchains.insert(
            id,
            MockSwapchain {
                handle,
                width: descriptor.width,
                height: descriptor.height,
                acquired: false,
                presents: 0,
            },
        );
        Ok(SwapchainId(id))
    }

    fn resize_swapchain(
        &self,
        id: SwapchainId,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let mut state = self.state();
        let swapchain = state
            .swapchains
            .get_mut(&id.0)
            .ok_or(ResourceError::InvalidHandle)?;
        swapchain.width = width;
        swapchain.height = height;
        Ok(())
    }

    fn swapchain_extent(&self, id: SwapchainId) -> Option<Extent3D> {
        self.state()
            .swapchains
            .get(&id.0)
            .map(|s| Extent3D::d2(s.width, s.height))
    }

    fn acquire_next_frame(&self, id: SwapchainId) -> Result<(), RenderError> {
        let mut state = self.state();
        if state.fail_acquire {
            return Err(RenderError::SurfaceAcquisitionFailed("outdated".into()));
        }
        let swapchain = state
            .swapchains
            .get_mut(&id.0)
            .ok_or(ResourceError::InvalidHandle)?;
        swapchain.acquired = true;
        Ok(())
    }

    fn present(&self, id: SwapchainId) -> Result<(), RenderError> {
        let mut state = self.state();
        let swapchain = state
            .swapchains
            .get_mut(&id.0)
            .ok_or(ResourceError::InvalidHandle)?;
        if !swapchain.acquired {
            return Err(RenderError::RenderingFailed("nothing acquired".into()));
        }
        swapchain.acquired = false;
        swapchain.presents += 1;
        Ok(())
    }

    fn destroy_swapchain(&self, id: SwapchainId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state.destroyed.push("swapchain");
        state
            .swapchains
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockCommandEncoder {
            state: Arc::clone(&self.state),
        })
    }

    fn submit_command_buffer(&self, _command_buffer: CommandBufferId) {
        self.state().submits += 1;
    }

    fn wait_for_idle(&self) {
        self.state().wait_idle_calls += 1;
    }
}

struct MockCommandEncoder {
    state: Arc<Mutex<MockState>>,
}

struct MockRenderPass {
    state: Arc<Mutex<MockState>>,
}

impl MockRenderPass {
    fn record(&self, command: Command) {
        self.state.lock().unwrap().commands.push(command);
    }
}

impl CommandEncoder for MockCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Result<Box<dyn RenderPass + 'encoder>, RenderError> {
        let mut state = self.state.lock().unwrap();
        let acquired = state
            .swapchains
            .get(&descriptor.swapchain.0)
            .is_some_and(|s| s.acquired);
        if !acquired {
            return Err(RenderError::RenderingFailed("no frame acquired".into()));
        }
        state.commands.push(Command::BeginPass {
            swapchain: descriptor.swapchain,
            color: descriptor.color_load,
            depth: descriptor.depth_load,
        });
        Ok(Box::new(MockRenderPass {
            state: Arc::clone(&self.state),
        }))
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(0)
    }
}

impl RenderPass for MockRenderPass {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.record(Command::SetPipeline(pipeline));
    }

    fn commit_resources(
        &mut self,
        binding: ResourceBindingId,
        variables: &[ShaderVariable<'_>],
    ) -> Result<(), RenderError> {
        self.record(Command::Commit {
            binding,
            variables: variables
                .iter()
                .map(|v| (v.name.to_owned(), v.resource))
                .collect(),
        });
        Ok(())
    }

    fn set_vertex_buffer(&mut self, _slot: u32, buffer: BufferId, _offset: u64) {
        self.record(Command::SetVertexBuffer(buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _offset: u64, _index_format: IndexFormat) {
        self.record(Command::SetIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.record(Command::DrawIndexed(indices));
    }
}

/// Hands out one pre-built mock device.
#[derive(Debug)]
pub struct MockDeviceProvider {
    pub device: Arc<MockGraphicsDevice>,
    pub fail: bool,
}

impl MockDeviceProvider {
    pub fn new() -> Self {
        Self {
            device: MockGraphicsDevice::new(),
            fail: false,
        }
    }
}

impl GraphicsDeviceProvider for MockDeviceProvider {
    fn create(&self, _settings: &RenderSettings) -> Result<Arc<dyn GraphicsDevice>, RenderError> {
        if self.fail {
            return Err(RenderError::InitializationFailed("no adapter".into()));
        }
        let device: Arc<dyn GraphicsDevice> = self.device.clone();
        Ok(device)
    }
}

/// A resource provider the test can keep adding to after handing it out.
#[derive(Debug, Default, Clone)]
pub struct SharedResources {
    inner: Arc<Mutex<MemoryResourceProvider>>,
}

impl SharedResources {
    pub fn insert(&self, name: &str, ty: ResourceType, bytes: impl Into<Vec<u8>>) {
        self.inner.lock().unwrap().insert(name, ty, bytes);
    }
}

impl ResourceProvider for SharedResources {
    fn demand(&self, name: &str, ty: ResourceType) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().demand(name, ty)
    }

    fn visit(&self, ty: ResourceType, visitor: &mut dyn FnMut(&str)) {
        self.inner.lock().unwrap().visit(ty, visitor);
    }
}

/// A texture cache on `device` reading from `resources`.
pub fn texture_cache(
    device: &Arc<MockGraphicsDevice>,
    resources: MemoryResourceProvider,
) -> TextureCache {
    let shared: Arc<dyn GraphicsDevice> = device.clone();
    TextureCache::new(shared, Arc::new(resources), Arc::new(StandardImageDecoder))
        .expect("placeholder uploads")
}

/// Opens a pass on a throwaway swapchain and hands it to `f`.
pub fn record_pass(device: &Arc<MockGraphicsDevice>, f: impl FnOnce(&mut dyn RenderPass)) {
    let swapchain = device
        .create_swapchain(NativeHandle::from_window(0xdead), &SwapchainDescriptor::default())
        .expect("swapchain");
    device.acquire_next_frame(swapchain).expect("frame");
    let mut encoder = device.create_command_encoder(Some("test"));
    {
        let mut pass = encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: None,
                swapchain,
                color_load: LoadOp::Load,
                depth_load: LoadOp::Load,
            })
            .expect("pass");
        f(pass.as_mut());
    }
    device.submit_command_buffer(encoder.finish());
}

/// The constants last written to `buffer`.
pub fn constants_in(device: &MockGraphicsDevice, buffer: BufferId) -> Constants {
    bytemuck::pod_read_unaligned(&device.state().buffers[&buffer.0])
}

/// Encodes an uncompressed top-left-origin TGA.
pub fn tga(width: u16, height: u16, channels: u8, pixel: impl Fn(u16, u16) -> Vec<u8>) -> Vec<u8> {
    let mut out = vec![0u8, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(channels * 8);
    out.push(if channels == 4 { 0x28 } else { 0x20 });
    for y in 0..height {
        for x in 0..width {
            let px = pixel(x, y);
            // TGA stores BGR(A).
            out.extend_from_slice(&[px[2], px[1], px[0]]);
            if channels == 4 {
                out.push(px[3]);
            }
        }
    }
    out
}

/// Builds a render service over a fresh mock device.
pub fn service_with(
    resources: MemoryResourceProvider,
) -> (RenderService, Arc<MockGraphicsDevice>) {
    let provider = MockDeviceProvider::new();
    let device = Arc::clone(&provider.device);
    let service = RenderService::new(
        &provider,
        Arc::new(resources),
        Arc::new(StandardImageDecoder),
        Arc::new(JsonModelParser),
        RenderSettings::default(),
    )
    .expect("service starts on the mock device");
    (service, device)
}
