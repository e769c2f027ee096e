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

//! Global settings for the preview renderer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Which adapter to prefer when several are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerPreference {
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

/// A collection of settings that affect device creation and the frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Fixed frame tick, also used as the animation step, in milliseconds.
    pub tick_ms: u32,
    /// Color every frame is cleared to.
    pub clear_color: [f32; 4],
    /// Depth every frame is cleared to.
    pub clear_depth: f32,
    /// Whether presentation waits for vertical blank.
    pub vsync: bool,
    /// Adapter preference used when the device is created.
    pub power_preference: PowerPreference,
    /// Anisotropy of the anisotropic shared sampler.
    pub max_anisotropy: u16,
    /// Number of frames in flight per swapchain.
    pub frame_latency: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            clear_color: [0.0, 0.2, 0.2, 1.0],
            clear_depth: 1.0,
            vsync: true,
            power_preference: PowerPreference::HighPerformance,
            max_anisotropy: 16,
            frame_latency: 2,
        }
    }
}

/// An error raised while reading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file exists but could not be read.
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid settings JSON.
    #[error("Malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RenderSettings {
    /// Parses settings from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from a JSON file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No settings file at {}, using defaults.",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
