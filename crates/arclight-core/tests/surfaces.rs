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

mod common;

use arclight_core::renderer::{
    GraphicsDevice, NativeHandle, RenderError, RenderSettings, SurfaceManager, TextureFormat,
    SURFACE_COLOR_FORMAT,
};
use common::MockGraphicsDevice;
use std::sync::Arc;

const WINDOW: NativeHandle = NativeHandle::from_window(0x1000);

fn manager() -> (SurfaceManager, Arc<MockGraphicsDevice>) {
    let device = MockGraphicsDevice::new();
    let shared: Arc<dyn GraphicsDevice> = device.clone();
    (SurfaceManager::new(shared, &RenderSettings::default()), device)
}

#[test]
fn create_is_idempotent_per_window() {
    let (mut surfaces, device) = manager();

    let first = surfaces.create(WINDOW, 640, 480).expect("surface");
    let second = surfaces.create(WINDOW, 800, 600).expect("surface");

    assert_eq!(first.swapchain, second.swapchain);
    assert!(first.same_target(&second));
    assert_eq!(surfaces.len(), 1);
    let state = device.state();
    assert_eq!(state.swapchains_created, 1);
    let swapchain = &state.swapchains[&first.swapchain.0];
    assert_eq!((swapchain.width, swapchain.height), (640, 480));
}

#[test]
fn each_window_gets_its_own_swapchain() {
    let (mut surfaces, device) = manager();

    let a = surfaces.create(WINDOW, 64, 64).expect("surface");
    let b = surfaces
        .create(NativeHandle::from_window(0x2000), 64, 64)
        .expect("surface");

    assert_ne!(a.swapchain, b.swapchain);
    assert!(!a.same_target(&b));
    assert_eq!(device.state().swapchains_created, 2);
    assert_eq!(surfaces.get(WINDOW).map(|s| s.swapchain), Some(a.swapchain));
}

#[test]
fn null_window_is_rejected() {
    let (mut surfaces, device) = manager();

    let result = surfaces.create(NativeHandle::from_window(0), 64, 64);

    assert!(matches!(result, Err(RenderError::NullWindowHandle)));
    assert!(surfaces.is_empty());
    assert_eq!(device.state().swapchains_created, 0);
}

#[test]
fn zero_sized_window_gets_a_one_pixel_swapchain() {
    let (mut surfaces, device) = manager();

    let surface = surfaces.create(WINDOW, 0, 0).expect("surface");

    let extent = device.swapchain_extent(surface.swapchain).expect("extent");
    assert_eq!((extent.width, extent.height), (1, 1));
}

#[test]
fn resize_drains_the_gpu_first() {
    let (mut surfaces, device) = manager();
    let surface = surfaces.create(WINDOW, 64, 64).expect("surface");

    surfaces.resize(WINDOW, 320, 200).expect("resize");

    let state = device.state();
    assert_eq!(state.wait_idle_calls, 1);
    let swapchain = &state.swapchains[&surface.swapchain.0];
    assert_eq!((swapchain.width, swapchain.height), (320, 200));
}

#[test]
fn resize_ignores_zero_sizes_and_unknown_windows() {
    let (mut surfaces, device) = manager();
    let surface = surfaces.create(WINDOW, 64, 64).expect("surface");

    surfaces.resize(WINDOW, 0, 100).expect("ignored");
    surfaces
        .resize(NativeHandle::from_window(0x9999), 10, 10)
        .expect("ignored");

    let state = device.state();
    assert_eq!(state.wait_idle_calls, 0);
    assert_eq!(state.swapchains[&surface.swapchain.0].width, 64);
}

#[test]
fn release_destroys_only_owned_surfaces() {
    let (mut surfaces, device) = manager();
    let (mut other, _other_device) = manager();
    let ours = surfaces.create(WINDOW, 64, 64).expect("surface");
    let theirs = other.create(WINDOW, 64, 64).expect("surface");

    assert!(!surfaces.release(&theirs));
    assert_eq!(surfaces.len(), 1);

    assert!(surfaces.release(&ours));
    assert!(surfaces.is_empty());
    assert!(device.state().swapchains.is_empty());
    assert!(!surfaces.release(&ours));
}

#[test]
fn release_all_destroys_every_swapchain() {
    let (mut surfaces, device) = manager();
    surfaces.create(WINDOW, 64, 64).expect("surface");
    surfaces
        .create(NativeHandle::from_window(0x2000), 64, 64)
        .expect("surface");

    surfaces.release_all();

    assert!(surfaces.is_empty());
    assert!(device.state().swapchains.is_empty());
}

#[test]
fn swapchains_use_the_surface_color_format() {
    assert_eq!(
        SURFACE_COLOR_FORMAT,
        TextureFormat::Bgra8UnormSrgb
    );
}
