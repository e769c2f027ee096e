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

//! Built-in shader sources and their registration.

use crate::renderer::api::{ShaderMacro, ShaderStage};
use crate::renderer::shader_manager::ShaderManager;

/// Name of the rigid vertex shader.
pub const VS_RIGID: &str = "vs_rigid";
/// Name of the skinned vertex shader.
pub const VS_SKINNED: &str = "vs_skinned";
/// Name of the textured pixel shader.
pub const PS_TEXTURED: &str = "ps_textured";

/// Capacity of the joint palette of a skinned draw.
pub const MAX_JOINTS: usize = 64;
/// Bone influences per skinned vertex.
pub const MAX_INFLUENCES: usize = 4;

pub(crate) const RIGID_WGSL: &str = include_str!("rigid.wgsl");
pub(crate) const SKINNED_WGSL: &str = include_str!("skinned.wgsl");
pub(crate) const TEXTURED_WGSL: &str = include_str!("textured.wgsl");

/// Macros the skinned vertex shader is compiled with.
pub fn skinned_macros() -> [ShaderMacro; 2] {
    [
        ShaderMacro::new("MAX_JOINTS", format!("{MAX_JOINTS}u")),
        ShaderMacro::new("MAX_INFLUENCES", format!("{MAX_INFLUENCES}u")),
    ]
}

/// Compiles the built-in shaders into `manager`. Returns how many compiled.
pub fn load_builtin_shaders(manager: &mut ShaderManager) -> usize {
    let skinned = skinned_macros();
    let builtins: [(&str, ShaderStage, &str, &[ShaderMacro]); 3] = [
        (VS_RIGID, ShaderStage::Vertex, RIGID_WGSL, &[]),
        (VS_SKINNED, ShaderStage::Vertex, SKINNED_WGSL, &skinned),
        (PS_TEXTURED, ShaderStage::Fragment, TEXTURED_WGSL, &[]),
    ];
    let mut loaded = 0;
    for (name, stage, source, macros) in builtins {
        if manager.load(name, stage, source, macros).is_ok() {
            loaded += 1;
        }
    }
    log::info!("Loaded {loaded}/{} built-in shaders.", builtins.len());
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shader_manager::expand_macros;

    fn parse(source: &str) -> naga::Module {
        naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)))
    }

    fn entry(module: &naga::Module, name: &str, stage: naga::ShaderStage) -> bool {
        module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage)
    }

    #[test]
    fn rigid_shader_parses() {
        let module = parse(RIGID_WGSL);
        assert!(entry(&module, "vs_main", naga::ShaderStage::Vertex));
    }

    #[test]
    fn skinned_shader_parses_with_macros() {
        let source = expand_macros(SKINNED_WGSL, &skinned_macros());
        let module = parse(&source);
        assert!(entry(&module, "vs_main", naga::ShaderStage::Vertex));
    }

    #[test]
    fn skinned_shader_requires_macros() {
        assert!(naga::front::wgsl::parse_str(SKINNED_WGSL).is_err());
    }

    #[test]
    fn textured_shader_parses() {
        let module = parse(TEXTURED_WGSL);
        assert!(entry(&module, "fs_main", naga::ShaderStage::Fragment));
    }
}
