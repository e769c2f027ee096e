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

//! The render service: owns the device and every cache, in start-up order.

use crate::asset::image::ImageDecoder;
use crate::asset::model::{ModelAsset, ModelParser};
use crate::asset::resource::{ResourceProvider, ResourceType};
use crate::renderer::api::NativeHandle;
use crate::renderer::error::{AssetError, RenderError};
use crate::renderer::pipeline_cache::{PipelineCache, PipelineEntry, PsoKey};
use crate::renderer::settings::RenderSettings;
use crate::renderer::shader_manager::ShaderManager;
use crate::renderer::shaders::load_builtin_shaders;
use crate::renderer::surface_manager::{Surface, SurfaceManager};
use crate::renderer::texture_cache::{TextureCache, TextureHandle};
use crate::renderer::traits::{GraphicsDevice, GraphicsDeviceProvider};
use crate::scene::Model;
use std::sync::Arc;

/// Owns the graphics device and the caches built on it.
///
/// Constructed once at start-up and passed to whoever renders. Teardown runs in
/// reverse dependency order: surfaces, textures and samplers, pipelines,
/// shaders, then the device.
#[derive(Debug)]
pub struct RenderService {
    settings: RenderSettings,
    resources: Arc<dyn ResourceProvider>,
    parser: Arc<dyn ModelParser>,
    surfaces: SurfaceManager,
    textures: TextureCache,
    pipelines: PipelineCache,
    shaders: ShaderManager,
    device: Arc<dyn GraphicsDevice>,
    shut_down: bool,
}

impl RenderService {
    /// Creates the device and brings up every cache.
    ///
    /// # Errors
    ///
    /// [`RenderError::InitializationFailed`] if the device, the shared samplers or
    /// the placeholder texture cannot be created. Missing built-in shaders or
    /// palette images are logged and tolerated.
    pub fn new(
        provider: &dyn GraphicsDeviceProvider,
        resources: Arc<dyn ResourceProvider>,
        decoder: Arc<dyn ImageDecoder>,
        parser: Arc<dyn ModelParser>,
        settings: RenderSettings,
    ) -> Result<Self, RenderError> {
        log::info!("RenderService: Initializing...");
        let device = provider.create(&settings)?;
        let info = device.get_adapter_info();
        log::info!(
            "Using '{}' ({:?}) on {}",
            info.name,
            info.device_type,
            info.backend_type.name()
        );

        let mut shaders = ShaderManager::new(Arc::clone(&device));
        load_builtin_shaders(&mut shaders);

        let mut textures =
            TextureCache::new(Arc::clone(&device), Arc::clone(&resources), decoder)?;
        let samplers = textures
            .load_samplers(settings.max_anisotropy)
            .map_err(|e| RenderError::InitializationFailed(format!("samplers: {e}")))?;
        textures.load_palette_textures();

        let pipelines = PipelineCache::new(Arc::clone(&device), samplers.default);
        let surfaces = SurfaceManager::new(Arc::clone(&device), &settings);

        log::info!("RenderService: Ready.");
        Ok(Self {
            settings,
            resources,
            parser,
            surfaces,
            textures,
            pipelines,
            shaders,
            device,
            shut_down: false,
        })
    }

    /// The render settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The graphics device.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Returns the surface of a window, creating it on first call.
    pub fn create_surface(
        &mut self,
        handle: NativeHandle,
        width: u32,
        height: u32,
    ) -> Result<Surface, RenderError> {
        self.surfaces.create(handle, width, height)
    }

    /// Destroys a surface. Unknown surfaces are ignored.
    pub fn release_surface(&mut self, surface: &Surface) -> bool {
        self.surfaces.release(surface)
    }

    /// Resizes the surface of a window.
    pub fn resize_surface(
        &mut self,
        handle: NativeHandle,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.surfaces.resize(handle, width, height)
    }

    /// Resolves a texture name; see [`TextureCache::load`].
    pub fn load_texture(&mut self, name: &str) -> TextureHandle {
        self.textures.load(name)
    }

    /// Returns the pipeline for `key`; see [`PipelineCache::get_pso`].
    pub fn get_pso(&mut self, key: PsoKey) -> Option<PipelineEntry> {
        self.pipelines.get_pso(key, &self.shaders)
    }

    /// Loads and instantiates the model resource `name`.
    pub fn load_model(&mut self, name: &str) -> Result<Model, RenderError> {
        let bytes = self
            .resources
            .demand(name, ResourceType::Mdl)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AssetError::NotFound(name.to_owned()))?;
        let asset = self.parser.parse(name, &bytes)?;
        self.instantiate(Arc::new(asset))
    }

    /// Instantiates an already parsed model.
    pub fn instantiate(&mut self, asset: Arc<ModelAsset>) -> Result<Model, RenderError> {
        Model::load(asset, self.device.as_ref(), &mut self.textures)
    }

    /// Frees a model's GPU resources and texture references.
    pub fn release_model(&mut self, model: Model) {
        model.release(self.device.as_ref(), &mut self.textures);
    }

    /// The shader manager.
    pub fn shaders(&self) -> &ShaderManager {
        &self.shaders
    }

    /// Mutable access to the shader manager, for reloading shaders.
    pub fn shaders_mut(&mut self) -> &mut ShaderManager {
        &mut self.shaders
    }

    /// The texture cache.
    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Mutable access to the texture cache.
    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// The pipeline cache.
    pub fn pipelines(&self) -> &PipelineCache {
        &self.pipelines
    }

    /// The surface manager.
    pub fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    /// Splits the service into the parts a frame needs at once.
    pub(crate) fn frame_parts(
        &mut self,
    ) -> (&Arc<dyn GraphicsDevice>, &mut PipelineCache, &ShaderManager) {
        (&self.device, &mut self.pipelines, &self.shaders)
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Releases every GPU object in reverse dependency order. The device itself
    /// goes when the last reference to it is dropped. Idempotent; also run on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        log::info!("RenderService shutting down...");
        self.surfaces.release_all();
        self.device.wait_for_idle();
        self.textures.destroy_all();
        self.pipelines.clear();
        self.shaders.clear();
        log::info!("RenderService shut down.");
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
