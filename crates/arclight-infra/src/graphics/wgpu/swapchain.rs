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


//! One render surface: a configured `wgpu::Surface`, its depth buffer and the frame
//! currently acquired from it.

use std::sync::Arc;

use arclight_core::renderer::{
    Extent3D, NativeHandle, RenderError, SwapchainDescriptor, TextureFormat,
};

use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;
use crate::platform::handle::raw_handles;

#[derive(Debug)]
struct AcquiredFrame {
    texture: wgpu::SurfaceTexture,
    view: Arc<wgpu::TextureView>,
}

#[derive(Debug)]
pub(crate) struct WgpuSwapchain {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    /// The format passes render into; may be an sRGB view of a linear surface format.
    view_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    depth_texture: wgpu::Texture,
    depth_view: Arc<wgpu::TextureView>,
    current: Option<AcquiredFrame>,
}

fn create_depth_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, Arc<wgpu::TextureView>) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Arclight Swapchain Depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, Arc::new(view))
}

impl WgpuSwapchain {
    pub(crate) fn new(
        context: &WgpuGraphicsContext,
        handle: NativeHandle,
        descriptor: &SwapchainDescriptor,
    ) -> Result<Self, RenderError> {
        let (raw_display_handle, raw_window_handle) = raw_handles(handle)?;

        // SAFETY: the window stays alive until its swapchain is destroyed; the surface
        // manager releases every swapchain before the host closes the window.
        let surface = unsafe {
            context
                .instance
                .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                    raw_display_handle,
                    raw_window_handle,
                })
        }
        .map_err(|e| RenderError::SurfaceAcquisitionFailed(format!("Failed to create surface: {e}")))?;

        let caps = surface.get_capabilities(&context.adapter);
        if caps.formats.is_empty() {
            return Err(RenderError::SurfaceAcquisitionFailed(
                "the adapter cannot present to this window".to_owned(),
            ));
        }

        let wanted = descriptor.color_format.into_wgpu();
        let (format, view_formats) = if caps.formats.contains(&wanted) {
            (wanted, Vec::new())
        } else if caps.formats.contains(&wanted.remove_srgb_suffix()) {
            (wanted.remove_srgb_suffix(), vec![wanted])
        } else {
            return Err(RenderError::SurfaceAcquisitionFailed(format!(
                "surface does not support {:?} (supported: {:?})",
                descriptor.color_format, caps.formats
            )));
        };

        // Fifo is guaranteed to be supported.
        let present_mode = if descriptor.vsync {
            wgpu::PresentMode::Fifo
        } else {
            [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
                .into_iter()
                .find(|mode| caps.present_modes.contains(mode))
                .unwrap_or(wgpu::PresentMode::Fifo)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: descriptor.width.max(1),
            height: descriptor.height.max(1),
            present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats,
            desired_maximum_frame_latency: descriptor.buffer_count.max(1),
        };
        surface.configure(context.device(), &config);
        log::debug!(
            "Surface configured: {:?} {}x{} {:?}",
            config.format,
            config.width,
            config.height,
            config.present_mode
        );

        let depth_format = depth_format(descriptor.depth_format);
        let (depth_texture, depth_view) =
            create_depth_target(context.device(), depth_format, config.width, config.height);

        Ok(Self {
            surface,
            config,
            view_format: wanted,
            depth_format,
            depth_texture,
            depth_view,
            current: None,
        })
    }

    /// Reconfigures the surface and recreates the depth buffer. Any acquired frame is
    /// dropped without being presented.
    pub(crate) fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.current = None;
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(device, &self.config);

        self.depth_texture.destroy();
        let (depth_texture, depth_view) =
            create_depth_target(device, self.depth_format, self.config.width, self.config.height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    pub(crate) fn extent(&self) -> Extent3D {
        Extent3D::d2(self.config.width, self.config.height)
    }

    pub(crate) fn acquire(&mut self, device: &wgpu::Device) -> Result<(), RenderError> {
        if self.current.is_some() {
            log::warn!("Swapchain frame acquired twice without a present; reusing it.");
            return Ok(());
        }

        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
                    format: Some(self.view_format),
                    ..Default::default()
                });
                self.current = Some(AcquiredFrame {
                    texture,
                    view: Arc::new(view),
                });
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::DeviceLost),
            Err(error) => {
                if matches!(error, wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) {
                    // The next acquire picks up the reconfigured surface.
                    self.surface.configure(device, &self.config);
                }
                Err(RenderError::SurfaceAcquisitionFailed(error.to_string()))
            }
        }
    }

    pub(crate) fn present(&mut self) -> Result<(), RenderError> {
        let AcquiredFrame { texture, view } = self.current.take().ok_or_else(|| {
            RenderError::RenderingFailed("present called without an acquired frame".to_owned())
        })?;
        drop(view);
        texture.present();
        Ok(())
    }

    /// The color and depth views of the acquired frame.
    pub(crate) fn targets(&self) -> Option<(Arc<wgpu::TextureView>, Arc<wgpu::TextureView>)> {
        self.current
            .as_ref()
            .map(|frame| (frame.view.clone(), self.depth_view.clone()))
    }
}

impl Drop for WgpuSwapchain {
    fn drop(&mut self) {
        self.current = None;
        self.depth_texture.destroy();
    }
}

fn depth_format(format: TextureFormat) -> wgpu::TextureFormat {
    if format.is_depth() {
        format.into_wgpu()
    } else {
        log::warn!("{format:?} is not a depth format; using Depth32Float.");
        wgpu::TextureFormat::Depth32Float
    }
}
