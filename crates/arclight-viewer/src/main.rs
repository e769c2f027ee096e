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


//! Standalone window hosting one model preview.

mod app;
mod demo;

use anyhow::{Context, Result};
use arclight_core::asset::{MemoryResourceProvider, ResourceProvider};
use arclight_core::renderer::RenderSettings;
use arclight_infra::DirectoryResourceProvider;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use winit::event_loop::EventLoop;

use crate::app::{ViewerApp, ViewerOptions};

#[derive(Parser, Debug)]
#[command(name = "arclight-viewer", version, about = "Preview a model in a window")]
struct Cli {
    /// Directory of loose `<resref>.<ext>` resources.
    #[arg(long, env = "ARCLIGHT_RESOURCES")]
    resources: Option<PathBuf>,

    /// JSON render settings. Defaults apply when the file does not exist.
    #[arg(long, env = "ARCLIGHT_SETTINGS", default_value = "arclight.json")]
    settings: PathBuf,

    /// Model to show instead of the built-in cube stack.
    #[arg(long)]
    model: Option<String>,

    /// Animation to play.
    #[arg(long, default_value = demo::SPIN)]
    animation: String,

    /// Diffuse texture of the built-in cube stack.
    #[arg(long, default_value = "stone")]
    texture: String,
}

fn event_loop() -> Result<EventLoop<()>> {
    let mut builder = EventLoop::builder();
    // Surfaces are created from Xlib handles.
    #[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        builder.with_x11();
    }
    Ok(builder.build()?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = RenderSettings::load(&cli.settings)
        .with_context(|| format!("reading {}", cli.settings.display()))?;
    let resources: Arc<dyn ResourceProvider> = match &cli.resources {
        Some(dir) => Arc::new(
            DirectoryResourceProvider::new(dir)
                .with_context(|| format!("indexing {}", dir.display()))?,
        ),
        None => {
            log::info!("No resource directory given; textures fall back to the placeholder.");
            Arc::new(MemoryResourceProvider::new())
        }
    };

    let options = ViewerOptions {
        model: cli.model,
        animation: cli.animation,
        texture: cli.texture,
    };
    let mut app = ViewerApp::new(options, settings, resources);
    event_loop()?.run_app(&mut app)?;
    app.finish()
}
