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

//! Compiles and caches named shader modules.

use crate::renderer::api::{
    ShaderMacro, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, ShaderStage,
};
use crate::renderer::error::ShaderError;
use crate::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// A compiled shader registered under a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderHandle {
    /// The device module.
    pub module: ShaderModuleId,
    /// The stage it was compiled for.
    pub stage: ShaderStage,
    /// Its entry point.
    pub entry_point: &'static str,
}

/// Name-keyed cache of compiled shader modules.
///
/// Reloading a name is the only way to update a shader: a successful compile
/// replaces the previous module, a failed one leaves it in place.
#[derive(Debug)]
pub struct ShaderManager {
    device: Arc<dyn GraphicsDevice>,
    shaders: HashMap<String, ShaderHandle>,
}

impl ShaderManager {
    /// Creates an empty manager compiling on `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
        }
    }

    /// Returns the shader registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.get(name).copied()
    }

    /// Compiles `source` for `stage` and registers it under `name`.
    ///
    /// Each macro is declared as a module-scope constant ahead of the source.
    /// On failure the error is logged and any module already registered under
    /// `name` is kept.
    pub fn load(
        &mut self,
        name: &str,
        stage: ShaderStage,
        source: &str,
        macros: &[ShaderMacro],
    ) -> Result<ShaderModuleId, ShaderError> {
        let entry_point = stage.default_entry_point();
        let source = expand_macros(source, macros);
        let descriptor = ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSourceData::Wgsl(source),
            stage,
            entry_point,
        };

        let module = match self.device.create_shader_module(&descriptor) {
            Ok(module) => module,
            Err(e) => {
                log::error!("Failed to compile shader '{name}': {e}");
                return Err(ShaderError::CompilationError {
                    label: name.to_owned(),
                    details: e.to_string(),
                });
            }
        };

        let handle = ShaderHandle {
            module,
            stage,
            entry_point,
        };
        if let Some(previous) = self.shaders.insert(name.to_owned(), handle) {
            log::debug!("Replacing shader '{name}' ({:?})", previous.module);
            if let Err(e) = self.device.destroy_shader_module(previous.module) {
                log::warn!("Failed to release replaced shader '{name}': {e}");
            }
        } else {
            log::debug!("Loaded shader '{name}' as {module:?}");
        }
        Ok(module)
    }

    /// Number of registered shaders.
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Returns `true` if no shader is registered.
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Destroys every registered module.
    pub fn clear(&mut self) {
        for (name, handle) in self.shaders.drain() {
            if let Err(e) = self.device.destroy_shader_module(handle.module) {
                log::warn!("Failed to release shader '{name}': {e}");
            }
        }
    }
}

/// Prepends one `const NAME = VALUE;` declaration per macro.
pub(crate) fn expand_macros<'a>(source: &'a str, macros: &[ShaderMacro]) -> Cow<'a, str> {
    if macros.is_empty() {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len() + macros.len() * 32);
    for m in macros {
        let _ = writeln!(out, "const {} = {};", m.name, m.value);
    }
    out.push_str(source);
    Cow::Owned(out)
}
