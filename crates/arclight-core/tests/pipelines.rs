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

use arclight_core::renderer::shaders::{load_builtin_shaders, PS_TEXTURED, VS_RIGID, VS_SKINNED};
use arclight_core::renderer::{
    BindingResource, GraphicsDevice, PipelineCache, PsoKey, SamplerId, ShaderManager, ShaderStage,
    VariableType,
};
use common::MockGraphicsDevice;
use std::sync::Arc;

const SAMPLER: SamplerId = SamplerId(700);

fn setup() -> (ShaderManager, PipelineCache, Arc<MockGraphicsDevice>) {
    let device = MockGraphicsDevice::new();
    let shared: Arc<dyn GraphicsDevice> = device.clone();
    let mut shaders = ShaderManager::new(Arc::clone(&shared));
    assert_eq!(load_builtin_shaders(&mut shaders), 3);
    (shaders, PipelineCache::new(shared, SAMPLER), device)
}

#[test]
fn same_key_builds_once() {
    let (shaders, mut cache, device) = setup();
    let key = PsoKey::new(true, false);

    let first = cache.get_pso(key, &shaders).expect("pipeline");
    let second = cache.get_pso(key, &shaders).expect("pipeline");

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(device.state().pipelines_created, 1);
}

#[test]
fn every_key_gets_its_own_pipeline() {
    let (shaders, mut cache, device) = setup();
    let keys = [
        PsoKey::new(false, false),
        PsoKey::new(true, false),
        PsoKey::new(false, true),
        PsoKey::new(true, true),
    ];

    let entries: Vec<_> = keys
        .iter()
        .map(|key| cache.get_pso(*key, &shaders).expect("pipeline"))
        .collect();

    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert_ne!(a.pipeline, b.pipeline);
        }
    }
    assert!(keys.iter().all(|key| cache.contains(key)));

    let state = device.state();
    let rigid = &state.pipelines[&entries[0].pipeline.0];
    let skinned = &state.pipelines[&entries[2].pipeline.0];
    assert_eq!(rigid.vertex_stride, 48);
    assert_eq!(skinned.vertex_stride, 80);
    assert!(!rigid.variables.iter().any(|(name, _)| name == "Joints"));
    assert!(skinned.variables.iter().any(|(name, _)| name == "Joints"));
}

#[test]
fn default_sampler_is_bound_statically() {
    let (shaders, mut cache, device) = setup();

    let entry = cache.get_pso(PsoKey::default(), &shaders).expect("pipeline");

    let state = device.state();
    let pipeline = &state.pipelines[&entry.pipeline.0];
    assert_eq!(
        pipeline.statics.get("g_sampler"),
        Some(&BindingResource::Sampler(SAMPLER))
    );
    assert!(pipeline
        .variables
        .iter()
        .any(|(name, ty)| name == "g_sampler" && *ty == VariableType::Static));
    assert_eq!(state.bindings[&entry.binding.0], entry.pipeline.0);
}

#[test]
fn missing_shader_is_not_cached() {
    let device = MockGraphicsDevice::new();
    let shared: Arc<dyn GraphicsDevice> = device.clone();
    let mut shaders = ShaderManager::new(Arc::clone(&shared));
    let mut cache = PipelineCache::new(shared, SAMPLER);
    let key = PsoKey::new(true, false);

    assert!(cache.get_pso(key, &shaders).is_none());
    assert!(!cache.contains(&key));

    load_builtin_shaders(&mut shaders);
    assert!(cache.get_pso(key, &shaders).is_some());
}

#[test]
fn rejected_binding_releases_the_pipeline() {
    let (shaders, mut cache, device) = setup();
    device.state().fail_bindings = true;

    assert!(cache.get_pso(PsoKey::default(), &shaders).is_none());

    let state = device.state();
    assert_eq!(state.pipelines_created, 1);
    assert!(state.pipelines.is_empty());
    assert!(cache.is_empty());
}

#[test]
fn clear_destroys_pipelines_and_bindings() {
    let (shaders, mut cache, device) = setup();
    cache.get_pso(PsoKey::new(false, false), &shaders);
    cache.get_pso(PsoKey::new(true, true), &shaders);

    cache.clear();

    let state = device.state();
    assert!(state.pipelines.is_empty());
    assert!(state.bindings.is_empty());
    assert!(cache.is_empty());
}

#[test]
fn failed_reload_keeps_the_previous_shader() {
    let (mut shaders, _cache, device) = setup();
    let before = shaders.get(VS_RIGID).expect("loaded");
    device.state().fail_shaders.insert(VS_RIGID.to_owned());

    let result = shaders.load(VS_RIGID, ShaderStage::Vertex, "fn vs_main() {}", &[]);

    assert!(result.is_err());
    assert_eq!(shaders.get(VS_RIGID), Some(before));
    assert_eq!(shaders.len(), 3);
}

#[test]
fn reload_replaces_and_frees_the_old_module() {
    let (mut shaders, _cache, device) = setup();
    let before = shaders.get(PS_TEXTURED).expect("loaded");

    let module = shaders
        .load(PS_TEXTURED, ShaderStage::Fragment, "fn fs_main() {}", &[])
        .expect("reload");

    assert_ne!(module, before.module);
    let state = device.state();
    assert!(!state.shaders.contains_key(&before.module.0));
    assert!(state.shaders.contains_key(&module.0));
    assert!(shaders.get(VS_SKINNED).is_some());
}

#[test]
fn clear_frees_every_shader() {
    let (mut shaders, _cache, device) = setup();
    shaders.clear();
    assert!(shaders.is_empty());
    assert!(device.state().shaders.is_empty());
}
