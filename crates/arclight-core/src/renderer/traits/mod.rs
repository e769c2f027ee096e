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

//! Defines the core architectural traits for the rendering subsystem.
//!
//! These contracts decouple the preview logic from the native graphics backend.
//!
//! - [`GraphicsDevice`]: creation and destruction of every GPU object, plus submission.
//! - [`CommandEncoder`] and [`RenderPass`]: recording of a frame's draw commands.
//! - [`GraphicsDeviceProvider`]: one-shot creation of the platform's device.

mod command_recorder;
mod device_provider;
mod graphics_device;

pub use self::command_recorder::*;
pub use self::device_provider::GraphicsDeviceProvider;
pub use self::graphics_device::GraphicsDevice;
