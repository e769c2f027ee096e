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


use anyhow::{anyhow, Result};
use arclight_core::renderer::PowerPreference;

use super::conversions::IntoWgpu;

/// Holds the core wgpu state objects shared by every swapchain.
///
/// The instance is kept alive because surfaces are created from it whenever a new
/// preview window appears.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_device_type: wgpu::DeviceType,
}

impl WgpuGraphicsContext {
    /// Asynchronously initializes the instance, adapter and logical device.
    ///
    /// ## Arguments
    /// * `backends` - The native APIs the instance may use.
    /// * `power_preference` - Which adapter to prefer when several are present.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or why no device could be created.
    pub async fn new(backends: wgpu::Backends, power_preference: PowerPreference) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context on {backends:?}...");

        // --- 1. Instance and Adapter ---
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power_preference.into_wgpu(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No graphics adapter available for {backends:?}"))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?}, Type: {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        // --- 2. Logical Device and Command Queue ---
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Arclight Logical Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        log::debug!("Device limits: {:?}", device.limits());

        Ok(WgpuGraphicsContext {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Runs `operation` inside a validation error scope.
    ///
    /// wgpu reports invalid shaders and pipelines asynchronously; the scope turns
    /// them into an immediate error instead of an uncaptured one.
    pub fn validated<R>(&self, operation: impl FnOnce(&wgpu::Device) -> R) -> Result<R> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = operation(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(anyhow!("{error}")),
            None => Ok(value),
        }
    }
}
