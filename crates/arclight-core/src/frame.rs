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

//! The per-tick frame loop over every visible viewport.

use crate::renderer::api::{LoadOp, NativeHandle, RenderPassDescriptor};
use crate::renderer::error::RenderError;
use crate::renderer::service::RenderService;
use crate::renderer::surface_manager::Surface;
use crate::scene::{DrawContext, Model};
use glam::{Mat4, Vec3};

/// A perspective camera owned by the widget showing a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub position: Vec3,
    /// Point looked at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -4.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// World to view.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View to clip for a target of the given aspect ratio, depth in `[0, 1]`.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

/// One on-screen preview.
#[derive(Debug)]
pub struct Viewport {
    /// The surface it renders into.
    pub surface: Surface,
    /// Hidden viewports are skipped.
    pub visible: bool,
    /// The model shown, if any.
    pub model: Option<Model>,
    /// The camera, updated by the widget.
    pub camera: Camera,
}

/// Renders every visible viewport once per fixed tick.
#[derive(Debug)]
pub struct FrameDriver {
    viewports: Vec<Viewport>,
    tick_ms: u32,
    clear_color: [f32; 4],
    clear_depth: f32,
}

impl FrameDriver {
    /// Creates a driver ticking and clearing as configured in `service`.
    pub fn new(service: &RenderService) -> Self {
        let settings = service.settings();
        Self {
            viewports: Vec::new(),
            tick_ms: settings.tick_ms,
            clear_color: settings.clear_color,
            clear_depth: settings.clear_depth,
        }
    }

    /// The fixed tick in milliseconds.
    pub fn tick_ms(&self) -> u32 {
        self.tick_ms
    }

    /// Registers a visible viewport for `surface`, replacing any previous one
    /// for the same window. Returns the replaced viewport.
    pub fn add_viewport(&mut self, surface: Surface) -> Option<Viewport> {
        let previous = self.remove_viewport(surface.handle);
        self.viewports.push(Viewport {
            surface,
            visible: true,
            model: None,
            camera: Camera::default(),
        });
        previous
    }

    /// Unregisters the viewport of `handle`, handing back its model for release.
    pub fn remove_viewport(&mut self, handle: NativeHandle) -> Option<Viewport> {
        let index = self
            .viewports
            .iter()
            .position(|v| v.surface.handle == handle)?;
        Some(self.viewports.remove(index))
    }

    /// The viewport of `handle`.
    pub fn viewport(&self, handle: NativeHandle) -> Option<&Viewport> {
        self.viewports.iter().find(|v| v.surface.handle == handle)
    }

    /// Mutable access to the viewport of `handle`.
    pub fn viewport_mut(&mut self, handle: NativeHandle) -> Option<&mut Viewport> {
        self.viewports
            .iter_mut()
            .find(|v| v.surface.handle == handle)
    }

    /// Shows or hides a viewport.
    pub fn set_visible(&mut self, handle: NativeHandle, visible: bool) {
        if let Some(viewport) = self.viewport_mut(handle) {
            viewport.visible = visible;
        }
    }

    /// Binds `model` to a viewport, returning the model it replaces.
    pub fn bind_model(&mut self, handle: NativeHandle, model: Model) -> Option<Model> {
        match self.viewport_mut(handle) {
            Some(viewport) => viewport.model.replace(model),
            None => {
                log::warn!("No viewport for window {:#x}", handle.window);
                Some(model)
            }
        }
    }

    /// Number of registered viewports.
    pub fn len(&self) -> usize {
        self.viewports.len()
    }

    /// Returns `true` if no viewport is registered.
    pub fn is_empty(&self) -> bool {
        self.viewports.is_empty()
    }

    /// Advances and renders every visible viewport once. Returns how many rendered.
    ///
    /// A viewport whose frame cannot be acquired or recorded is skipped for this tick.
    pub fn tick(&mut self, service: &mut RenderService) -> usize {
        let mut rendered = 0;
        for viewport in self.viewports.iter_mut().filter(|v| v.visible) {
            if let Some(model) = viewport.model.as_mut() {
                model.update(self.tick_ms);
            }
            match render_viewport(service, viewport, self.clear_color, self.clear_depth) {
                Ok(()) => rendered += 1,
                Err(e) => log::warn!(
                    "Skipping frame of {:?}: {e}",
                    viewport.surface.swapchain
                ),
            }
        }
        rendered
    }

    /// Hands every viewport's model to the service for release.
    pub fn release_models(&mut self, service: &mut RenderService) {
        for viewport in &mut self.viewports {
            if let Some(model) = viewport.model.take() {
                service.release_model(model);
            }
        }
    }
}

fn render_viewport(
    service: &mut RenderService,
    viewport: &Viewport,
    clear_color: [f32; 4],
    clear_depth: f32,
) -> Result<(), RenderError> {
    let (device, pipelines, shaders) = service.frame_parts();
    let swapchain = viewport.surface.swapchain;

    device.acquire_next_frame(swapchain)?;
    let aspect = device
        .swapchain_extent(swapchain)
        .map_or(1.0, |e| e.width as f32 / e.height.max(1) as f32);

    let mut encoder = device.create_command_encoder(Some("preview_frame"));
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("preview_pass"),
            swapchain,
            color_load: LoadOp::Clear(clear_color),
            depth_load: LoadOp::Clear(clear_depth),
        })?;
        if let Some(model) = &viewport.model {
            let mut ctx = DrawContext {
                pass: pass.as_mut(),
                device: device.as_ref(),
                pipelines,
                shaders,
                view: viewport.camera.view(),
                proj: viewport.camera.projection(aspect),
            };
            model.draw(&mut ctx, Mat4::IDENTITY);
        }
    }
    device.submit_command_buffer(encoder.finish());
    device.present(swapchain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let camera = Camera {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            ..Camera::default()
        };
        let clip = camera.projection(1.5) * camera.view() * Vec3::new(0.0, 0.0, -camera.near).extend(1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-5);
        let far = camera.projection(1.5) * Vec3::new(0.0, 0.0, -camera.far).extend(1.0);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        let camera = Camera::default();
        assert_eq!(camera.projection(0.0), camera.projection(1.0));
        assert_eq!(camera.projection(f32::NAN), camera.projection(1.0));
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let camera = Camera::default();
        let eye = camera.view().transform_point3(camera.position);
        assert_relative_eq!(eye, Vec3::ZERO, epsilon = 1e-5);
    }
}
