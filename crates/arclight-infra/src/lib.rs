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


//! # Arclight Infra
//!
//! Concrete implementations of the contracts defined in `arclight-core`: the wgpu
//! [`GraphicsDevice`](arclight_core::renderer::GraphicsDevice), the winit window
//! wrapper that turns an OS window into a
//! [`NativeHandle`](arclight_core::renderer::NativeHandle), and a resource provider
//! reading loose files from a directory.

pub mod graphics;
pub mod io;
pub mod platform;

pub use graphics::wgpu::{WgpuDevice, WgpuDeviceProvider};
pub use io::DirectoryResourceProvider;
pub use platform::window::{WinitWindow, WinitWindowBuilder};
