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


//! The winit application driving the preview.

use anyhow::Result;
use arclight_core::asset::{JsonModelParser, ResourceProvider, StandardImageDecoder};
use arclight_core::renderer::{NativeHandle, RenderSettings};
use arclight_core::{FrameDriver, Model, RenderService};
use arclight_infra::{WgpuDeviceProvider, WinitWindow, WinitWindowBuilder};
use glam::Vec3;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::WindowId;

use crate::demo;

/// What the viewer shows.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub model: Option<String>,
    pub animation: String,
    pub texture: String,
}

/// Everything that exists while the window is open.
///
/// Fields drop in declaration order: models and viewports, then the service (which
/// destroys the swapchain), then the window the swapchain presented to.
struct ViewerState {
    driver: FrameDriver,
    service: RenderService,
    handle: NativeHandle,
    window: WinitWindow,
    next_tick: Instant,
}

impl ViewerState {
    fn open(
        event_loop: &ActiveEventLoop,
        options: &ViewerOptions,
        settings: RenderSettings,
        resources: Arc<dyn ResourceProvider>,
    ) -> Result<Self> {
        let window = WinitWindowBuilder::new()
            .with_title(format!(
                "Arclight Preview - {}",
                options.model.as_deref().unwrap_or("cube stack")
            ))
            .build(event_loop)?;
        let handle = window.native_handle()?;

        let mut service = RenderService::new(
            &WgpuDeviceProvider::new(),
            resources,
            Arc::new(StandardImageDecoder),
            Arc::new(JsonModelParser),
            settings,
        )?;

        let (width, height) = window.inner_size();
        let surface = service.create_surface(handle, width, height)?;
        let mut driver = FrameDriver::new(&service);
        driver.add_viewport(surface);

        let mut model = load_model(&mut service, options)?;
        model.load_animation(&options.animation);
        if let Some(viewport) = driver.viewport_mut(handle) {
            viewport.camera.position = Vec3::new(3.0, -4.0, 2.5);
            viewport.camera.target = Vec3::new(0.0, 0.0, 1.0);
        }
        if let Some(rejected) = driver.bind_model(handle, model) {
            service.release_model(rejected);
        }

        Ok(Self {
            driver,
            service,
            handle,
            window,
            next_tick: Instant::now(),
        })
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.driver.tick_ms().max(1)))
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.driver.set_visible(self.handle, false);
            return;
        }
        self.driver
            .set_visible(self.handle, !self.window.is_minimized());
        if let Err(e) = self.service.resize_surface(self.handle, width, height) {
            log::error!("Failed to resize the preview surface: {e}");
        }
    }

    /// Releases models and the surface before the service shuts the device down.
    fn close(mut self) {
        self.driver.release_models(&mut self.service);
        if let Some(viewport) = self.driver.remove_viewport(self.handle) {
            self.service.release_surface(&viewport.surface);
        }
        self.service.shutdown();
        log::info!("Viewer closed.");
    }
}

fn load_model(service: &mut RenderService, options: &ViewerOptions) -> Result<Model> {
    if let Some(name) = &options.model {
        match service.load_model(name) {
            Ok(model) => return Ok(model),
            Err(e) => log::warn!("Cannot show '{name}' ({e}); showing the cube stack."),
        }
    }
    Ok(service.instantiate(Arc::new(demo::cube_stack(&options.texture)))?)
}

/// The winit application. The window and renderer are created on the first
/// `resumed` and torn down when the window closes.
pub struct ViewerApp {
    options: ViewerOptions,
    settings: Option<RenderSettings>,
    resources: Arc<dyn ResourceProvider>,
    state: Option<ViewerState>,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(
        options: ViewerOptions,
        settings: RenderSettings,
        resources: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            options,
            settings: Some(settings),
            resources,
            state: None,
            error: None,
        }
    }

    /// The outcome of the event loop: the start-up error, if any.
    pub fn finish(mut self) -> Result<()> {
        if let Some(state) = self.state.take() {
            state.close();
        }
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Avoid re-initializing if the app is resumed multiple times.
        let Some(settings) = self.settings.take() else {
            return;
        };

        log::info!("Opening the preview window...");
        match ViewerState::open(event_loop, &self.options, settings, Arc::clone(&self.resources)) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Viewer start-up failed: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutdown requested, exiting event loop...");
                if let Some(state) = self.state.take() {
                    state.close();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Window resized to: {}x{}", size.width, size.height);
                state.resize(size.width, size.height);
            }
            WindowEvent::Occluded(occluded) => {
                state.driver.set_visible(state.handle, !occluded);
            }
            _ => {}
        }
    }

    /// Renders on a fixed tick and sleeps until the next one.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let now = Instant::now();
        if now >= state.next_tick {
            let rendered = state.driver.tick(&mut state.service);
            log::trace!("Rendered {rendered} viewport(s).");

            let interval = state.tick_interval();
            state.next_tick += interval;
            if state.next_tick < now {
                // Fell behind; skip the missed ticks instead of bursting.
                state.next_tick = now + interval;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(state.next_tick));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            state.close();
        }
    }
}
