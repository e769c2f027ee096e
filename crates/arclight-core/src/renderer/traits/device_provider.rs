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

use crate::renderer::error::RenderError;
use crate::renderer::settings::RenderSettings;
use crate::renderer::traits::GraphicsDevice;
use std::sync::Arc;

/// Creates the process's graphics device on the one backend compiled for the platform.
///
/// A concrete implementation lives in `arclight-infra`. Any failure is fatal for
/// start-up and is not retried.
pub trait GraphicsDeviceProvider {
    /// Selects the native backend, obtains an adapter and creates the logical device
    /// together with its immediate command queue.
    ///
    /// # Errors
    ///
    /// [`RenderError::InitializationFailed`] when no backend, adapter or device is available.
    fn create(&self, settings: &RenderSettings) -> Result<Arc<dyn GraphicsDevice>, RenderError>;
}
