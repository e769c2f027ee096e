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

//! Lazily compiled pipeline state objects keyed by rendering features.

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ShaderError};
use crate::renderer::shader_manager::{ShaderHandle, ShaderManager};
use crate::renderer::shaders::{PS_TEXTURED, VS_RIGID, VS_SKINNED};
use crate::renderer::surface_manager::{SURFACE_COLOR_FORMAT, SURFACE_DEPTH_FORMAT};
use crate::renderer::traits::GraphicsDevice;
use crate::scene::vertex::{RigidVertex, SkinnedVertex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-draw transform block, mutable.
pub const CONSTANTS_VARIABLE: &str = "Constants";
/// Joint palette of skinned draws, mutable.
pub const JOINTS_VARIABLE: &str = "Joints";
/// Diffuse texture, mutable.
pub const TEXTURE_VARIABLE: &str = "g_texture";
/// Shared sampler, static for the pipeline's lifetime.
pub const SAMPLER_VARIABLE: &str = "g_sampler";

/// The rendering features a pipeline is specialised for.
///
/// Two keys with the same flags select the same pipeline. A new flag must also
/// be handled in shader and vertex layout selection below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PsoKey {
    /// The node samples a diffuse texture.
    pub has_diffuse: bool,
    /// The node is skinned.
    pub has_skin: bool,
}

impl PsoKey {
    /// Builds a key from its flags.
    pub const fn new(has_diffuse: bool, has_skin: bool) -> Self {
        Self {
            has_diffuse,
            has_skin,
        }
    }
}

/// A compiled pipeline with the resource binding draws commit through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineEntry {
    /// The pipeline state object.
    pub pipeline: RenderPipelineId,
    /// The resource binding created from it.
    pub binding: ResourceBindingId,
}

/// Builds and memoizes one [`PipelineEntry`] per [`PsoKey`].
///
/// Entries live until [`PipelineCache::clear`]. A failed build is logged and not
/// cached, so the next lookup tries again.
#[derive(Debug)]
pub struct PipelineCache {
    device: Arc<dyn GraphicsDevice>,
    default_sampler: SamplerId,
    entries: HashMap<PsoKey, PipelineEntry>,
}

impl PipelineCache {
    /// Creates an empty cache. `default_sampler` is bound to every pipeline's
    /// static sampler variable.
    pub fn new(device: Arc<dyn GraphicsDevice>, default_sampler: SamplerId) -> Self {
        Self {
            device,
            default_sampler,
            entries: HashMap::new(),
        }
    }

    /// Returns the pipeline for `key`, building it on first use.
    ///
    /// Returns `None` when a shader is missing or the backend rejects the
    /// pipeline or its binding.
    pub fn get_pso(&mut self, key: PsoKey, shaders: &ShaderManager) -> Option<PipelineEntry> {
        if let Some(entry) = self.entries.get(&key) {
            return Some(*entry);
        }
        match self.build(key, shaders) {
            Ok(entry) => {
                log::debug!("Built pipeline for {key:?}: {entry:?}");
                self.entries.insert(key, entry);
                Some(entry)
            }
            Err(e) => {
                log::error!("Failed to build pipeline for {key:?}: {e}");
                None
            }
        }
    }

    /// Whether a pipeline for `key` is cached.
    pub fn contains(&self, key: &PsoKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached pipelines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroys every cached pipeline and binding.
    pub fn clear(&mut self) {
        for (key, entry) in self.entries.drain() {
            if let Err(e) = self.device.destroy_resource_binding(entry.binding) {
                log::warn!("Failed to release binding for {key:?}: {e}");
            }
            if let Err(e) = self.device.destroy_render_pipeline(entry.pipeline) {
                log::warn!("Failed to release pipeline for {key:?}: {e}");
            }
        }
    }

    fn build(&self, key: PsoKey, shaders: &ShaderManager) -> Result<PipelineEntry, RenderError> {
        let vs_name = if key.has_skin { VS_SKINNED } else { VS_RIGID };
        let vs = lookup(shaders, vs_name)?;
        let ps = lookup(shaders, PS_TEXTURED)?;

        let layout = if key.has_skin {
            SkinnedVertex::layout()
        } else {
            RigidVertex::layout()
        };
        let variables = pipeline_variables(key);
        let label = format!(
            "pso(diffuse={}, skin={})",
            key.has_diffuse, key.has_skin
        );

        let descriptor = RenderPipelineDescriptor {
            label: Some(Cow::Owned(label)),
            vertex_shader_module: vs.module,
            vertex_entry_point: Cow::Borrowed(vs.entry_point),
            fragment_shader_module: ps.module,
            fragment_entry_point: Cow::Borrowed(ps.entry_point),
            vertex_buffers_layout: Cow::Owned(vec![layout]),
            primitive_state: PrimitiveStateDescriptor {
                front_face: FrontFace::Ccw,
                cull_mode: Some(CullMode::Back),
            },
            depth_stencil_state: Some(DepthStencilStateDescriptor {
                format: SURFACE_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format: SURFACE_COLOR_FORMAT,
            }]),
            variables: Cow::Owned(variables),
        };

        let pipeline = self.device.create_render_pipeline(&descriptor)?;

        let binding = self
            .device
            .set_static_variable(
                pipeline,
                SAMPLER_VARIABLE,
                BindingResource::Sampler(self.default_sampler),
            )
            .and_then(|()| self.device.create_resource_binding(pipeline));

        match binding {
            Ok(binding) => Ok(PipelineEntry { pipeline, binding }),
            Err(e) => {
                if let Err(e) = self.device.destroy_render_pipeline(pipeline) {
                    log::warn!("Failed to release incomplete pipeline {pipeline:?}: {e}");
                }
                Err(e.into())
            }
        }
    }
}

fn lookup(shaders: &ShaderManager, name: &str) -> Result<ShaderHandle, ShaderError> {
    shaders.get(name).ok_or_else(|| ShaderError::NotFound {
        name: name.to_owned(),
    })
}

/// The resource variables declared for `key`.
pub fn pipeline_variables(key: PsoKey) -> Vec<ShaderVariableDescriptor<'static>> {
    let mut variables = vec![ShaderVariableDescriptor {
        name: Cow::Borrowed(CONSTANTS_VARIABLE),
        binding: 0,
        stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
        kind: ResourceKind::UniformBuffer,
        variable_type: VariableType::Mutable,
    }];
    if key.has_skin {
        variables.push(ShaderVariableDescriptor {
            name: Cow::Borrowed(JOINTS_VARIABLE),
            binding: 1,
            stages: ShaderStageFlags::VERTEX,
            kind: ResourceKind::UniformBuffer,
            variable_type: VariableType::Mutable,
        });
    }
    variables.push(ShaderVariableDescriptor {
        name: Cow::Borrowed(TEXTURE_VARIABLE),
        binding: 2,
        stages: ShaderStageFlags::FRAGMENT,
        kind: ResourceKind::Texture,
        variable_type: VariableType::Mutable,
    });
    variables.push(ShaderVariableDescriptor {
        name: Cow::Borrowed(SAMPLER_VARIABLE),
        binding: 3,
        stages: ShaderStageFlags::FRAGMENT,
        kind: ResourceKind::Sampler,
        variable_type: VariableType::Static,
    });
    variables
}
