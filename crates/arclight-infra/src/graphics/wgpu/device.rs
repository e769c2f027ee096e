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


use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wgpu::util::DeviceExt;

use arclight_core::renderer::traits::CommandEncoder;
use arclight_core::renderer::{
    BindingResource, BufferDescriptor, BufferId, CommandBufferId, Extent3D, GraphicsDevice,
    NativeHandle, PipelineError, RenderError, RenderPipelineDescriptor, RenderPipelineId,
    RendererAdapterInfo, ResourceBindingId, ResourceError, ResourceKind, SamplerDescriptor,
    SamplerId, ShaderError, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData,
    ShaderVariable, SwapchainDescriptor, SwapchainId, TextureDescriptor, TextureId,
    VariableType,
};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{from_wgpu_backend, from_wgpu_device_type, IntoWgpu};
use super::swapchain::WgpuSwapchain;

#[derive(Debug)]
struct WgpuShaderModuleEntry {
    wgpu_module: Arc<wgpu::ShaderModule>,
}

/// One resource variable declared by a pipeline.
#[derive(Debug, Clone)]
pub(crate) struct VariableSlot {
    pub(crate) name: String,
    pub(crate) binding: u32,
    pub(crate) kind: ResourceKind,
    pub(crate) variable_type: VariableType,
}

#[derive(Debug)]
pub(crate) struct WgpuRenderPipelineEntry {
    pub(crate) wgpu_pipeline: Arc<wgpu::RenderPipeline>,
    bind_group_layout: Arc<wgpu::BindGroupLayout>,
    variables: Arc<[VariableSlot]>,
    statics: HashMap<String, BindingResource>,
}

/// A resource binding snapshots the pipeline's static variables when it is created.
#[derive(Debug)]
struct WgpuResourceBindingEntry {
    pipeline: RenderPipelineId,
    bind_group_layout: Arc<wgpu::BindGroupLayout>,
    variables: Arc<[VariableSlot]>,
    statics: HashMap<String, BindingResource>,
}

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64,
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) default_view: Arc<wgpu::TextureView>,
    pub(crate) mip_level_count: u32,
}

#[derive(Debug)]
pub(crate) struct WgpuSamplerEntry {
    pub(crate) wgpu_sampler: Arc<wgpu::Sampler>,
}

/// A resolved bind group resource, kept alive while the bind group is built.
enum ResolvedResource {
    Buffer(Arc<wgpu::Buffer>),
    Texture(Arc<wgpu::TextureView>),
    Sampler(Arc<wgpu::Sampler>),
}

impl ResolvedResource {
    fn as_binding(&self) -> wgpu::BindingResource<'_> {
        match self {
            ResolvedResource::Buffer(buffer) => buffer.as_entire_binding(),
            ResolvedResource::Texture(view) => wgpu::BindingResource::TextureView(view),
            ResolvedResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
        }
    }
}

/// The internal, non-clonable state of the WgpuDevice.
/// This struct holds all the GPU resources and state, protected by an Arc.
#[derive(Debug)]
pub struct WgpuDeviceInternal {
    context: WgpuGraphicsContext,
    shader_modules: Mutex<HashMap<ShaderModuleId, WgpuShaderModuleEntry>>,
    pipelines: Mutex<HashMap<RenderPipelineId, WgpuRenderPipelineEntry>>,
    bindings: Mutex<HashMap<ResourceBindingId, WgpuResourceBindingEntry>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    samplers: Mutex<HashMap<SamplerId, WgpuSamplerEntry>>,
    swapchains: Mutex<HashMap<SwapchainId, WgpuSwapchain>>,

    next_shader_id: AtomicUsize,
    next_pipeline_id: AtomicUsize,
    next_binding_id: AtomicUsize,
    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_sampler_id: AtomicUsize,
    next_swapchain_id: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
    /// A thread-safe counter to generate unique command buffer IDs.
    command_buffer_id_counter: AtomicUsize,
}

/// A clonable, thread-safe handle to the WGPU graphics device.
/// It wraps the actual device state (`WgpuDeviceInternal`) in an Arc,
/// allowing it to be shared with command encoders.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

/// Locks a registry map. A panic while holding the lock leaves the map itself intact,
/// so a poisoned lock is recovered.
fn registry<T>(map: &Mutex<T>) -> MutexGuard<'_, T> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_id(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::Relaxed)
}

impl WgpuDevice {
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                bindings: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                swapchains: Mutex::new(HashMap::new()),
                next_shader_id: AtomicUsize::new(1),
                next_pipeline_id: AtomicUsize::new(1),
                next_binding_id: AtomicUsize::new(1),
                next_buffer_id: AtomicUsize::new(1),
                next_texture_id: AtomicUsize::new(1),
                next_sampler_id: AtomicUsize::new(1),
                next_swapchain_id: AtomicUsize::new(1),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicUsize::new(0),
            }),
        }
    }

    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.internal.context
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        registry(&self.internal.pipelines)
            .get(&id)
            .map(|entry| entry.wgpu_pipeline.clone())
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        registry(&self.internal.buffers)
            .get(&id)
            .map(|entry| entry.wgpu_buffer.clone())
    }

    /// The color and depth views of a swapchain's acquired frame.
    pub(crate) fn frame_targets(
        &self,
        id: SwapchainId,
    ) -> Option<(Arc<wgpu::TextureView>, Arc<wgpu::TextureView>)> {
        registry(&self.internal.swapchains)
            .get(&id)
            .and_then(WgpuSwapchain::targets)
    }

    pub(crate) fn register_command_buffer(&self, command_buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(next_id(&self.internal.command_buffer_id_counter));
        registry(&self.internal.pending_command_buffers).insert(id, command_buffer);
        id
    }

    fn resolve(&self, slot: &VariableSlot, resource: BindingResource) -> Result<ResolvedResource, ResourceError> {
        let mismatch = || PipelineError::VariableTypeMismatch {
            name: slot.name.clone(),
        };
        match (slot.kind, resource) {
            (ResourceKind::UniformBuffer, BindingResource::Buffer(id)) => self
                .get_wgpu_buffer(id)
                .map(ResolvedResource::Buffer)
                .ok_or(ResourceError::InvalidHandle),
            (ResourceKind::Texture, BindingResource::Texture(id)) => registry(&self.internal.textures)
                .get(&id)
                .map(|entry| ResolvedResource::Texture(entry.default_view.clone()))
                .ok_or(ResourceError::InvalidHandle),
            (ResourceKind::Sampler, BindingResource::Sampler(id)) => registry(&self.internal.samplers)
                .get(&id)
                .map(|entry| ResolvedResource::Sampler(entry.wgpu_sampler.clone()))
                .ok_or(ResourceError::InvalidHandle),
            _ => Err(mismatch().into()),
        }
    }

    /// Builds the bind group for one draw from a binding's static variables and the
    /// supplied mutable ones.
    pub(crate) fn build_bind_group(
        &self,
        binding: ResourceBindingId,
        variables: &[ShaderVariable<'_>],
    ) -> Result<wgpu::BindGroup, ResourceError> {
        let (pipeline, layout, slots, statics) = {
            let bindings = registry(&self.internal.bindings);
            let entry = bindings.get(&binding).ok_or(ResourceError::InvalidHandle)?;
            (
                entry.pipeline,
                entry.bind_group_layout.clone(),
                entry.variables.clone(),
                entry.statics.clone(),
            )
        };

        if let Some(unknown) = variables
            .iter()
            .find(|v| !slots.iter().any(|slot| slot.name == v.name))
        {
            return Err(PipelineError::UnknownVariable {
                pipeline,
                name: unknown.name.to_owned(),
            }
            .into());
        }

        let mut resolved = Vec::with_capacity(slots.len());
        for slot in slots.iter() {
            let resource = match slot.variable_type {
                VariableType::Static => statics.get(&slot.name).copied(),
                VariableType::Mutable => variables
                    .iter()
                    .find(|v| v.name == slot.name)
                    .map(|v| v.resource),
            }
            .ok_or_else(|| PipelineError::UnboundVariable {
                name: slot.name.clone(),
            })?;
            resolved.push((slot.binding, self.resolve(slot, resource)?));
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: resource.as_binding(),
            })
            .collect();

        Ok(self
            .internal
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Arclight Resource Binding"),
                layout: &layout,
                entries: &entries,
            }))
    }
}

impl GraphicsDevice for WgpuDevice {
    fn get_adapter_info(&self) -> RendererAdapterInfo {
        let context = &self.internal.context;
        RendererAdapterInfo {
            name: context.adapter_name.clone(),
            backend_type: from_wgpu_backend(context.adapter_backend),
            device_type: from_wgpu_device_type(context.adapter_device_type),
        }
    }

    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let wgpu_source = match &descriptor.source {
            ShaderSourceData::Wgsl(cow_str) => wgpu::ShaderSource::Wgsl(cow_str.clone()),
        };
        let label = descriptor.label;

        log::debug!("WgpuDevice: Creating wgpu::ShaderModule with label: {label:?}");
        let module = self
            .internal
            .context
            .validated(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label,
                    source: wgpu_source,
                })
            })
            .map_err(|e| ShaderError::CompilationError {
                label: label.unwrap_or("Unknown").to_owned(),
                details: format!("{e:#}"),
            })?;

        let id = ShaderModuleId(next_id(&self.internal.next_shader_id));
        registry(&self.internal.shader_modules).insert(
            id,
            WgpuShaderModuleEntry {
                wgpu_module: Arc::new(module),
            },
        );

        log::info!(
            "WgpuDevice: Successfully created shader module '{}' with ID: {:?}",
            label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        if registry(&self.internal.shader_modules).remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}");
            Ok(())
        } else {
            Err(ShaderError::InvalidModule { id }.into())
        }
    }

    // --- Pipeline Operations ---

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let label = descriptor.label.as_deref();
        log::debug!("WgpuDevice: Creating render pipeline with label: {label:?}");

        let (vertex_module, fragment_module) = {
            let modules = registry(&self.internal.shader_modules);
            let lookup = |id: ShaderModuleId| {
                modules
                    .get(&id)
                    .map(|entry| entry.wgpu_module.clone())
                    .ok_or(ShaderError::InvalidModule { id })
            };
            (
                lookup(descriptor.vertex_shader_module)?,
                lookup(descriptor.fragment_shader_module)?,
            )
        };

        let device = self.internal.context.device();

        // --- Resource variables ---
        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .variables
            .iter()
            .map(|variable| wgpu::BindGroupLayoutEntry {
                binding: variable.binding,
                visibility: variable.stages.into_wgpu(),
                ty: variable.kind.into_wgpu(),
                count: None,
            })
            .collect();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label,
            entries: &layout_entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // --- Vertex input ---
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers_layout
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: attr.format.into_wgpu(),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers_layout
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: layout.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_target_states
            .iter()
            .map(|target| {
                Some(wgpu::ColorTargetState {
                    format: target.format.into_wgpu(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let depth_stencil = descriptor
            .depth_stencil_state
            .map(|state| wgpu::DepthStencilState {
                format: state.format.into_wgpu(),
                depth_write_enabled: state.depth_write_enabled,
                depth_compare: state.depth_compare.into_wgpu(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            });

        let pipeline = self
            .internal
            .context
            .validated(|device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label,
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &vertex_module,
                        entry_point: Some(descriptor.vertex_entry_point.as_ref()),
                        compilation_options: Default::default(),
                        buffers: &vertex_buffers,
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &fragment_module,
                        entry_point: Some(descriptor.fragment_entry_point.as_ref()),
                        compilation_options: Default::default(),
                        targets: &color_targets,
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: descriptor.primitive_state.front_face.into_wgpu(),
                        cull_mode: descriptor.primitive_state.cull_mode.map(IntoWgpu::into_wgpu),
                        unclipped_depth: false,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        conservative: false,
                    },
                    depth_stencil,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|e| PipelineError::CompilationFailed {
                label: label.map(str::to_owned),
                details: format!("{e:#}"),
            })?;

        let variables: Arc<[VariableSlot]> = descriptor
            .variables
            .iter()
            .map(|variable| VariableSlot {
                name: variable.name.to_string(),
                binding: variable.binding,
                kind: variable.kind,
                variable_type: variable.variable_type,
            })
            .collect();

        let id = RenderPipelineId(next_id(&self.internal.next_pipeline_id));
        registry(&self.internal.pipelines).insert(
            id,
            WgpuRenderPipelineEntry {
                wgpu_pipeline: Arc::new(pipeline),
                bind_group_layout: Arc::new(bind_group_layout),
                variables,
                statics: HashMap::new(),
            },
        );

        log::info!(
            "WgpuDevice: Successfully created render pipeline '{}' with ID: {:?}",
            label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        if registry(&self.internal.pipelines).remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::InvalidRenderPipeline { id }.into())
        }
    }

    fn set_static_variable(
        &self,
        pipeline: RenderPipelineId,
        name: &str,
        resource: BindingResource,
    ) -> Result<(), ResourceError> {
        let mut pipelines = registry(&self.internal.pipelines);
        let entry = pipelines
            .get_mut(&pipeline)
            .ok_or(PipelineError::InvalidRenderPipeline { id: pipeline })?;
        let slot = entry
            .variables
            .iter()
            .find(|slot| slot.name == name && slot.variable_type == VariableType::Static)
            .ok_or_else(|| PipelineError::UnknownVariable {
                pipeline,
                name: name.to_owned(),
            })?;
        let kind_matches = matches!(
            (slot.kind, resource),
            (ResourceKind::UniformBuffer, BindingResource::Buffer(_))
                | (ResourceKind::Texture, BindingResource::Texture(_))
                | (ResourceKind::Sampler, BindingResource::Sampler(_))
        );
        if !kind_matches {
            return Err(PipelineError::VariableTypeMismatch {
                name: name.to_owned(),
            }
            .into());
        }
        entry.statics.insert(name.to_owned(), resource);
        log::debug!("WgpuDevice: Bound static variable '{name}' of pipeline {pipeline:?}");
        Ok(())
    }

    fn create_resource_binding(
        &self,
        pipeline: RenderPipelineId,
    ) -> Result<ResourceBindingId, ResourceError> {
        let entry = {
            let pipelines = registry(&self.internal.pipelines);
            let entry = pipelines
                .get(&pipeline)
                .ok_or(PipelineError::InvalidRenderPipeline { id: pipeline })?;
            if let Some(unbound) = entry.variables.iter().find(|slot| {
                slot.variable_type == VariableType::Static && !entry.statics.contains_key(&slot.name)
            }) {
                return Err(PipelineError::UnboundVariable {
                    name: unbound.name.clone(),
                }
                .into());
            }
            WgpuResourceBindingEntry {
                pipeline,
                bind_group_layout: entry.bind_group_layout.clone(),
                variables: entry.variables.clone(),
                statics: entry.statics.clone(),
            }
        };

        let id = ResourceBindingId(next_id(&self.internal.next_binding_id));
        registry(&self.internal.bindings).insert(id, entry);
        log::info!("WgpuDevice: Created resource binding {id:?} for pipeline {pipeline:?}");
        Ok(id)
    }

    fn destroy_resource_binding(&self, id: ResourceBindingId) -> Result<(), ResourceError> {
        if registry(&self.internal.bindings).remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed resource binding with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let buffer = self
            .internal
            .context
            .device
            .create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: false,
            });

        let id = BufferId(next_id(&self.internal.next_buffer_id));
        registry(&self.internal.buffers).insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(buffer),
                size: descriptor.size,
            },
        );

        log::info!(
            "WgpuDevice: Created buffer '{:?}' ({} bytes) with ID: {:?}",
            descriptor.label,
            descriptor.size,
            id
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let buffer = self
            .internal
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            });

        let id = BufferId(next_id(&self.internal.next_buffer_id));
        registry(&self.internal.buffers).insert(
            id,
            WgpuBufferEntry {
                size: buffer.size(),
                wgpu_buffer: Arc::new(buffer),
            },
        );

        log::info!(
            "WgpuDevice: Created buffer '{:?}' with {} bytes of data, ID: {:?}",
            descriptor.label,
            data.len(),
            id
        );
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffers = registry(&self.internal.buffers);
        let entry = buffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
        if offset + data.len() as u64 > entry.size {
            return Err(ResourceError::OutOfBounds);
        }
        self.internal
            .context
            .queue
            .write_buffer(&entry.wgpu_buffer, offset, data);
        log::trace!(
            "WgpuDevice: Wrote {} bytes to buffer {id:?} at offset {offset}",
            data.len()
        );
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        if let Some(entry) = registry(&self.internal.buffers).remove(&id) {
            entry.wgpu_buffer.destroy();
            log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self
            .internal
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = TextureId(next_id(&self.internal.next_texture_id));
        registry(&self.internal.textures).insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
                default_view: Arc::new(view),
                mip_level_count: descriptor.mip_level_count,
            },
        );

        log::info!(
            "WgpuDevice: Created texture '{:?}' ({}x{}, {} mips, {:?}) with ID: {:?}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.mip_level_count,
            descriptor.format,
            id
        );
        Ok(id)
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        mip_level: u32,
        data: &[u8],
        bytes_per_row: u32,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let textures = registry(&self.internal.textures);
        let entry = textures
            .get(&texture_id)
            .ok_or(ResourceError::InvalidHandle)?;
        if mip_level >= entry.mip_level_count {
            return Err(ResourceError::OutOfBounds);
        }

        self.internal.context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &entry.wgpu_texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
            size.into_wgpu(),
        );
        log::debug!(
            "WgpuDevice: Wrote {} bytes to mip {mip_level} of texture {texture_id:?}",
            data.len()
        );
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        if let Some(entry) = registry(&self.internal.textures).remove(&id) {
            entry.wgpu_texture.destroy();
            log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Sampler Operations ---

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let sampler = self
            .internal
            .context
            .device
            .create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                address_mode_w: descriptor.address_mode_w.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
                lod_min_clamp: 0.0,
                lod_max_clamp: 32.0,
                compare: descriptor.compare.map(IntoWgpu::into_wgpu),
                anisotropy_clamp: descriptor.anisotropy_clamp.max(1),
                border_color: None,
            });

        let id = SamplerId(next_id(&self.internal.next_sampler_id));
        registry(&self.internal.samplers).insert(
            id,
            WgpuSamplerEntry {
                wgpu_sampler: Arc::new(sampler),
            },
        );

        log::info!(
            "WgpuDevice: Created sampler '{:?}' with ID: {:?}",
            descriptor.label,
            id
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        if registry(&self.internal.samplers).remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Swapchain Operations ---

    fn create_swapchain(
        &self,
        handle: NativeHandle,
        descriptor: &SwapchainDescriptor,
    ) -> Result<SwapchainId, RenderError> {
        if handle.is_null() {
            return Err(RenderError::NullWindowHandle);
        }
        let swapchain = WgpuSwapchain::new(&self.internal.context, handle, descriptor)?;

        let id = SwapchainId(next_id(&self.internal.next_swapchain_id));
        registry(&self.internal.swapchains).insert(id, swapchain);
        log::info!(
            "WgpuDevice: Created swapchain {id:?} ({}x{}) for window {:#x}",
            descriptor.width,
            descriptor.height,
            handle.window
        );
        Ok(id)
    }

    fn resize_swapchain(
        &self,
        id: SwapchainId,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let mut swapchains = registry(&self.internal.swapchains);
        let swapchain = swapchains
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        swapchain.resize(self.internal.context.device(), width, height);
        log::info!("WgpuDevice: Resized swapchain {id:?} to {width}x{height}");
        Ok(())
    }

    fn swapchain_extent(&self, id: SwapchainId) -> Option<Extent3D> {
        registry(&self.internal.swapchains)
            .get(&id)
            .map(WgpuSwapchain::extent)
    }

    fn acquire_next_frame(&self, id: SwapchainId) -> Result<(), RenderError> {
        let mut swapchains = registry(&self.internal.swapchains);
        let swapchain = swapchains
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        swapchain.acquire(self.internal.context.device())
    }

    fn present(&self, id: SwapchainId) -> Result<(), RenderError> {
        let mut swapchains = registry(&self.internal.swapchains);
        let swapchain = swapchains
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        swapchain.present()
    }

    fn destroy_swapchain(&self, id: SwapchainId) -> Result<(), ResourceError> {
        if registry(&self.internal.swapchains).remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed swapchain with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Command Operations ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = self
            .internal
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });

        Box::new(WgpuCommandEncoder {
            encoder,
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer_id: CommandBufferId) {
        let buffer = registry(&self.internal.pending_command_buffers).remove(&command_buffer_id);

        // Submitting an unknown buffer is a logic error in the caller.
        if let Some(buffer) = buffer {
            self.internal.context.queue.submit(std::iter::once(buffer));
        } else {
            log::error!(
                "Attempted to submit a CommandBufferId ({:?}) that does not exist.",
                command_buffer_id
            );
        }
    }

    fn wait_for_idle(&self) {
        let _ = self.internal.context.device.poll(wgpu::Maintain::Wait);
    }
}
