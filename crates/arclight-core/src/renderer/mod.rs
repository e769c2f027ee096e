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

//! Provides the public, backend-agnostic rendering contracts of the preview renderer.
//!
//! The `api` and `traits` modules are the "common language" every backend speaks:
//! opaque handles, descriptors and the [`GraphicsDevice`] trait. The remaining modules
//! are written once against that language: the [`ShaderManager`], the
//! [`PipelineCache`], the [`TextureCache`], the [`SurfaceManager`] and the
//! [`RenderService`](service::RenderService) that wires them together at start-up.

pub mod api;
pub mod error;
pub mod pipeline_cache;
pub mod service;
pub mod settings;
pub mod shader_manager;
pub mod shaders;
pub mod surface_manager;
pub mod texture_cache;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{AssetError, PipelineError, RenderError, ResourceError, ShaderError};
pub use self::pipeline_cache::{PipelineCache, PipelineEntry, PsoKey};
pub use self::service::RenderService;
pub use self::settings::{PowerPreference, RenderSettings, SettingsError};
pub use self::shader_manager::{ShaderHandle, ShaderManager};
pub use self::surface_manager::{Surface, SurfaceManager, SURFACE_COLOR_FORMAT, SURFACE_DEPTH_FORMAT};
pub use self::texture_cache::{SamplerSet, TextureCache, TextureHandle};
pub use self::traits::{CommandEncoder, GraphicsDevice, GraphicsDeviceProvider, RenderPass};
