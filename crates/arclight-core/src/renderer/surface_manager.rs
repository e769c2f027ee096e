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

//! One swapchain-backed render target per native window.

use crate::renderer::api::{NativeHandle, SwapchainDescriptor, SwapchainId, TextureFormat};
use crate::renderer::error::RenderError;
use crate::renderer::settings::RenderSettings;
use crate::renderer::traits::GraphicsDevice;
use std::collections::HashMap;
use std::sync::Arc;

/// Back buffer format of every surface.
pub const SURFACE_COLOR_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;
/// Depth buffer format of every surface.
pub const SURFACE_DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// A render surface bound to one native window.
#[derive(Debug, Clone)]
pub struct Surface {
    /// The window's swapchain.
    pub swapchain: SwapchainId,
    /// The device whose immediate queue renders into it.
    pub context: Arc<dyn GraphicsDevice>,
    /// The window it presents to.
    pub handle: NativeHandle,
}

impl Surface {
    /// Whether `self` and `other` render to the same swapchain on the same device.
    pub fn same_target(&self, other: &Surface) -> bool {
        self.swapchain == other.swapchain && same_device(&self.context, &other.context)
    }
}

fn same_device(a: &Arc<dyn GraphicsDevice>, b: &Arc<dyn GraphicsDevice>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Owns the render surfaces, keyed by native window handle.
#[derive(Debug)]
pub struct SurfaceManager {
    device: Arc<dyn GraphicsDevice>,
    template: SwapchainDescriptor,
    surfaces: HashMap<NativeHandle, Surface>,
}

impl SurfaceManager {
    /// Creates an empty manager presenting with `settings`' vsync and latency.
    pub fn new(device: Arc<dyn GraphicsDevice>, settings: &RenderSettings) -> Self {
        Self {
            device,
            template: SwapchainDescriptor {
                color_format: SURFACE_COLOR_FORMAT,
                depth_format: SURFACE_DEPTH_FORMAT,
                buffer_count: settings.frame_latency.max(1),
                vsync: settings.vsync,
                ..SwapchainDescriptor::default()
            },
            surfaces: HashMap::new(),
        }
    }

    /// Returns the surface of `handle`, creating its swapchain on first call.
    ///
    /// # Errors
    ///
    /// A null handle or a swapchain the backend refuses to create.
    pub fn create(
        &mut self,
        handle: NativeHandle,
        width: u32,
        height: u32,
    ) -> Result<Surface, RenderError> {
        if let Some(surface) = self.surfaces.get(&handle) {
            return Ok(surface.clone());
        }
        if handle.is_null() {
            return Err(RenderError::NullWindowHandle);
        }

        let descriptor = SwapchainDescriptor {
            width: width.max(1),
            height: height.max(1),
            ..self.template
        };
        let swapchain = self.device.create_swapchain(handle, &descriptor)?;
        log::info!(
            "Created surface {swapchain:?} for window {:#x} ({}x{})",
            handle.window,
            descriptor.width,
            descriptor.height
        );

        let surface = Surface {
            swapchain,
            context: Arc::clone(&self.device),
            handle,
        };
        self.surfaces.insert(handle, surface.clone());
        Ok(surface)
    }

    /// The surface of `handle`, if created.
    pub fn get(&self, handle: NativeHandle) -> Option<&Surface> {
        self.surfaces.get(&handle)
    }

    /// Resizes the surface of `handle` after draining the GPU.
    ///
    /// Zero sizes (minimised windows) are ignored.
    pub fn resize(
        &mut self,
        handle: NativeHandle,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let Some(surface) = self.surfaces.get(&handle) else {
            log::debug!("Resize for unknown window {:#x}", handle.window);
            return Ok(());
        };
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize of {:?} to {width}x{height}", surface.swapchain);
            return Ok(());
        }
        self.device.wait_for_idle();
        self.device.resize_swapchain(surface.swapchain, width, height)
    }

    /// Destroys `surface` if this manager owns it. Unknown surfaces are ignored.
    ///
    /// Returns `true` if a surface was removed.
    pub fn release(&mut self, surface: &Surface) -> bool {
        let Some(handle) = self
            .surfaces
            .iter()
            .find(|(_, s)| s.same_target(surface))
            .map(|(handle, _)| *handle)
        else {
            return false;
        };
        self.device.wait_for_idle();
        if let Some(removed) = self.surfaces.remove(&handle) {
            self.destroy(&removed);
        }
        true
    }

    /// Destroys every surface.
    pub fn release_all(&mut self) {
        if self.surfaces.is_empty() {
            return;
        }
        self.device.wait_for_idle();
        for (_, surface) in self.surfaces.drain() {
            if let Err(e) = self.device.destroy_swapchain(surface.swapchain) {
                log::warn!("Failed to destroy swapchain {:?}: {e}", surface.swapchain);
            }
        }
    }

    /// Number of live surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` if there are no surfaces.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    fn destroy(&self, surface: &Surface) {
        log::info!("Destroying surface {:?}", surface.swapchain);
        if let Err(e) = self.device.destroy_swapchain(surface.swapchain) {
            log::warn!("Failed to destroy swapchain {:?}: {e}", surface.swapchain);
        }
    }
}
