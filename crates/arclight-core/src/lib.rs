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

//! # Arclight Core
//!
//! Backend-agnostic contracts and the behaviour that sits on top of them for the
//! content editor's real-time 3D preview: shader and pipeline caches, the texture
//! cache, render surfaces, the model scene graph and the per-tick frame driver.
//!
//! Nothing in this crate talks to a native graphics API. A concrete backend lives in
//! `arclight-infra` and implements [`renderer::GraphicsDevice`].

#![warn(missing_docs)]

pub mod asset;
pub mod frame;
pub mod renderer;
pub mod scene;

pub use frame::{Camera, FrameDriver, Viewport};
pub use renderer::service::RenderService;
pub use scene::Model;
