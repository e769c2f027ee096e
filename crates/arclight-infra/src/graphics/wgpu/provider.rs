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


//! Native backend selection and device bring-up.
//!
//! Exactly one native API is compiled in per platform: DirectX 12 on Windows, Metal on
//! Apple platforms and Vulkan everywhere else. There is no fallback to GL.

use std::sync::Arc;
use std::time::Instant;

use arclight_core::renderer::{
    GraphicsBackendType, GraphicsDevice, GraphicsDeviceProvider, RenderError, RenderSettings,
};

use super::context::WgpuGraphicsContext;
use super::device::WgpuDevice;

/// The wgpu backend set matching [`GraphicsBackendType::native`].
pub fn native_backends() -> wgpu::Backends {
    match GraphicsBackendType::native() {
        GraphicsBackendType::Dx12 => wgpu::Backends::DX12,
        GraphicsBackendType::Metal => wgpu::Backends::METAL,
        GraphicsBackendType::Vulkan => wgpu::Backends::VULKAN,
    }
}

/// Creates [`WgpuDevice`]s on the platform's native backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct WgpuDeviceProvider;

impl WgpuDeviceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl GraphicsDeviceProvider for WgpuDeviceProvider {
    fn create(&self, settings: &RenderSettings) -> Result<Arc<dyn GraphicsDevice>, RenderError> {
        let backend = GraphicsBackendType::native();
        log::info!("Creating {} graphics device...", backend.name());
        let start = Instant::now();

        let context = pollster::block_on(WgpuGraphicsContext::new(
            native_backends(),
            settings.power_preference,
        ))
        .map_err(|e| {
            log::error!("{} device creation failed: {e:#}", backend.name());
            RenderError::InitializationFailed(format!("{e:#}"))
        })?;

        log::info!(
            "{} device ready in {:?}",
            backend.name(),
            start.elapsed()
        );
        Ok(Arc::new(WgpuDevice::new(context)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_native_backend() {
        let backends = native_backends();
        assert_eq!(backends.iter().count(), 1);
        #[cfg(target_os = "windows")]
        assert_eq!(backends, wgpu::Backends::DX12);
        #[cfg(target_os = "macos")]
        assert_eq!(backends, wgpu::Backends::METAL);
        #[cfg(target_os = "linux")]
        assert_eq!(backends, wgpu::Backends::VULKAN);
        assert!(!backends.contains(wgpu::Backends::GL));
    }
}
