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

use arclight_core::asset::{
    AnimationAsset, Key, MeshData, MemoryResourceProvider, ModelAsset, NodeTrack, PltImage,
    ResourceType, SkinData, SourceNode, SourceNodeKind,
};
use arclight_core::renderer::shaders::load_builtin_shaders;
use arclight_core::renderer::{
    AssetError, BufferId, GraphicsDevice, PipelineCache, RenderError, SamplerId, ShaderManager,
    TextureCache,
};
use arclight_core::scene::{DrawContext, NodeKind, Transform};
use arclight_core::Model;
use common::{constants_in, record_pass, tga, texture_cache, Command, MockGraphicsDevice};
use glam::{Mat4, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

struct Scene {
    device: Arc<MockGraphicsDevice>,
    shaders: ShaderManager,
    pipelines: PipelineCache,
    textures: TextureCache,
}

impl Scene {
    fn new(resources: MemoryResourceProvider) -> Self {
        let device = MockGraphicsDevice::new();
        let shared: Arc<dyn GraphicsDevice> = device.clone();
        let mut shaders = ShaderManager::new(Arc::clone(&shared));
        load_builtin_shaders(&mut shaders);
        Self {
            textures: texture_cache(&device, resources),
            pipelines: PipelineCache::new(shared, SamplerId(0)),
            shaders,
            device,
        }
    }

    fn load(&mut self, root: SourceNode) -> Model {
        Model::load(asset(root, Vec::new()), self.device.as_ref(), &mut self.textures)
            .expect("model loads")
    }

    fn draw(&mut self, model: &Model, parent: Mat4) {
        let device = Arc::clone(&self.device);
        let (pipelines, shaders) = (&mut self.pipelines, &self.shaders);
        record_pass(&device, |pass| {
            let mut ctx = DrawContext {
                pass,
                device: device.as_ref(),
                pipelines,
                shaders,
                view: Mat4::IDENTITY,
                proj: Mat4::IDENTITY,
            };
            model.draw(&mut ctx, parent);
        });
    }

    fn world_of(&self, model: &Model, name: &str) -> Mat4 {
        let constants = constants_in(&self.device, constants_buffer(model, name));
        Mat4::from_cols_array_2d(&constants.model)
    }
}

fn asset(root: SourceNode, animations: Vec<AnimationAsset>) -> Arc<ModelAsset> {
    Arc::new(ModelAsset {
        name: "test".into(),
        root,
        animations,
    })
}

fn triangle(diffuse: Option<&str>) -> MeshData {
    MeshData {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        indices: vec![0, 1, 2],
        diffuse: diffuse.map(str::to_owned),
        ..MeshData::default()
    }
}

fn mesh(name: &str) -> SourceNode {
    SourceNode::dummy(name).with_kind(SourceNodeKind::TriMesh(triangle(None)))
}

fn skin(name: &str, joints: &[&str]) -> SourceNode {
    SourceNode::dummy(name).with_kind(SourceNodeKind::Skin(SkinData {
        mesh: triangle(None),
        bones: vec![[0, -1, -1, -1]; 3],
        weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
        joints: joints.iter().map(|j| j.to_string()).collect(),
    }))
}

fn constants_buffer(model: &Model, name: &str) -> BufferId {
    let index = model.find(name).expect("node exists");
    match &model.node(index).kind {
        NodeKind::Mesh(mesh) => mesh.gpu.constants_buffer,
        NodeKind::Skin(skin) => skin.gpu.constants_buffer,
        NodeKind::Group => panic!("{name} has no geometry"),
    }
}

fn index_buffers(device: &MockGraphicsDevice) -> Vec<BufferId> {
    device
        .state()
        .commands
        .iter()
        .filter_map(|c| match c {
            Command::SetIndexBuffer(buffer) => Some(*buffer),
            _ => None,
        })
        .collect()
}

fn index_buffer(model: &Model, name: &str) -> BufferId {
    match &model.node(model.find(name).expect("node exists")).kind {
        NodeKind::Mesh(mesh) => mesh.gpu.index_buffer,
        NodeKind::Skin(skin) => skin.gpu.index_buffer,
        NodeKind::Group => panic!("{name} has no geometry"),
    }
}

#[test]
fn world_transform_is_the_product_down_the_tree() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let root = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
    let middle = Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
    let leaf = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let model = scene.load(
        SourceNode::dummy("root").with_transform(root).with_child(
            SourceNode::dummy("middle")
                .with_transform(middle)
                .with_child(mesh("leaf").with_transform(leaf)),
        ),
    );

    scene.draw(&model, Mat4::IDENTITY);

    let expected = root.to_matrix() * middle.to_matrix() * leaf.to_matrix();
    let world = scene.world_of(&model, "leaf");
    assert!(world.abs_diff_eq(expected, 1e-5));
    // The rotated offset lands on -X.
    let origin = world.transform_point3(Vec3::ZERO);
    assert!(origin.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5));
}

#[test]
fn parent_matrix_is_applied_to_the_root() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let model = scene.load(mesh("body"));
    let parent = Mat4::from_scale(Vec3::splat(3.0));

    scene.draw(&model, parent);

    assert!(scene.world_of(&model, "body").abs_diff_eq(parent, 1e-6));
}

#[test]
fn node_without_transform_inherits_its_parent() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let offset = Transform::from_translation(Vec3::new(0.0, 0.0, 5.0));
    let model = scene.load(mesh("torso").with_transform(offset).with_child(mesh("belt")));

    scene.draw(&model, Mat4::IDENTITY);

    assert_eq!(scene.world_of(&model, "belt"), scene.world_of(&model, "torso"));
    assert_eq!(scene.world_of(&model, "belt"), offset.to_matrix());
}

#[test]
fn nodes_draw_parent_first_in_authored_order() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let model = scene.load(
        mesh("a")
            .with_child(mesh("b").with_child(mesh("c")))
            .with_child(mesh("d")),
    );

    scene.draw(&model, Mat4::IDENTITY);

    let expected: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| index_buffer(&model, n))
        .collect();
    assert_eq!(index_buffers(&scene.device), expected);
    assert_eq!(scene.device.state().draw_count(), 4);
}

#[test]
fn hidden_node_still_draws_its_children() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let mut hidden = mesh("hidden").with_child(mesh("shown"));
    hidden.no_render = true;
    let model = scene.load(hidden);

    scene.draw(&model, Mat4::IDENTITY);

    assert_eq!(index_buffers(&scene.device), vec![index_buffer(&model, "shown")]);
}

#[test]
fn failing_node_is_skipped_and_siblings_draw() {
    let device = MockGraphicsDevice::new();
    device.state().fail_shaders.insert("vs_skinned".into());
    let shared: Arc<dyn GraphicsDevice> = device.clone();
    let mut shaders = ShaderManager::new(Arc::clone(&shared));
    assert_eq!(load_builtin_shaders(&mut shaders), 2);
    let mut scene = Scene {
        textures: texture_cache(&device, MemoryResourceProvider::new()),
        pipelines: PipelineCache::new(shared, SamplerId(0)),
        shaders,
        device,
    };
    let model = scene.load(
        SourceNode::dummy("root")
            .with_child(SourceNode::dummy("bone"))
            .with_child(skin("cape", &["bone"]))
            .with_child(mesh("sword")),
    );

    scene.draw(&model, Mat4::IDENTITY);

    assert_eq!(index_buffers(&scene.device), vec![index_buffer(&model, "sword")]);
}

#[test]
fn skin_is_identity_at_bind_pose_and_follows_its_joints() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let track = NodeTrack {
        node: "bone".into(),
        positions: vec![Key {
            time_ms: 0.0,
            value: Vec3::new(0.0, 3.0, 0.0),
        }],
        ..NodeTrack::default()
    };
    let root = SourceNode::dummy("root")
        .with_child(
            SourceNode::dummy("bone")
                .with_transform(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        )
        .with_child(
            skin("cape", &["bone"])
                .with_transform(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        );
    let animation = AnimationAsset {
        name: "lift".into(),
        length_ms: 1000,
        tracks: vec![track],
    };
    let mut model = Model::load(
        asset(root, vec![animation]),
        scene.device.as_ref(),
        &mut scene.textures,
    )
    .expect("model loads");
    let cape = model.find("cape").expect("cape");

    let NodeKind::Skin(node) = &model.node(cape).kind else {
        panic!("cape is a skin");
    };
    assert!(node.ready);
    assert_eq!(node.joints, vec![model.find("bone").expect("bone")]);
    let at_bind = model.joint_matrices(cape);
    assert_eq!(at_bind.len(), 1);
    assert!(at_bind[0].abs_diff_eq(Mat4::IDENTITY, 1e-6));

    assert!(model.load_animation("lift"));
    let lifted = model.joint_matrices(cape);
    assert!(lifted[0].abs_diff_eq(Mat4::from_translation(Vec3::Y), 1e-5));

    scene.draw(&model, Mat4::IDENTITY);
    assert_eq!(scene.device.state().draw_count(), 1);
}

#[test]
fn skin_with_a_missing_joint_is_not_drawn() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let model = scene.load(
        SourceNode::dummy("root")
            .with_child(skin("cape", &["ghost"]))
            .with_child(mesh("sword")),
    );
    let cape = model.find("cape").expect("cape");

    assert!(model.joint_matrices(cape).is_empty());
    scene.draw(&model, Mat4::IDENTITY);

    assert_eq!(index_buffers(&scene.device), vec![index_buffer(&model, "sword")]);
}

#[test]
fn paletted_diffuse_sets_the_constant_flag() {
    let plt = PltImage {
        width: 2,
        height: 2,
        pixels: vec![0; 8],
    };
    let resources = MemoryResourceProvider::new()
        .with("cloak", ResourceType::Plt, plt.to_bytes())
        .with("boots", ResourceType::Tga, tga(1, 1, 3, |_, _| vec![1, 2, 3]));
    let mut scene = Scene::new(resources);
    let model = scene.load(
        SourceNode::dummy("root")
            .with_child(
                SourceNode::dummy("cloak")
                    .with_kind(SourceNodeKind::TriMesh(triangle(Some("cloak")))),
            )
            .with_child(
                SourceNode::dummy("boots")
                    .with_kind(SourceNodeKind::TriMesh(triangle(Some("boots")))),
            ),
    );

    scene.draw(&model, Mat4::IDENTITY);

    let cloak = constants_in(&scene.device, constants_buffer(&model, "cloak"));
    let boots = constants_in(&scene.device, constants_buffer(&model, "boots"));
    assert_eq!(cloak.params[0], 1);
    assert_eq!(boots.params[0], 0);
    let key = model.node(model.find("cloak").expect("cloak")).key;
    assert!(key.has_diffuse && !key.has_skin);
}

#[test]
fn release_returns_buffers_and_texture_references() {
    let resources =
        MemoryResourceProvider::new().with("steel", ResourceType::Tga, tga(1, 1, 3, |_, _| vec![9, 9, 9]));
    let mut scene = Scene::new(resources);
    let model = scene.load(
        SourceNode::dummy("root")
            .with_child(
                SourceNode::dummy("a").with_kind(SourceNodeKind::TriMesh(triangle(Some("Steel")))),
            )
            .with_child(
                SourceNode::dummy("b").with_kind(SourceNodeKind::TriMesh(triangle(Some("steel")))),
            ),
    );
    assert_eq!(scene.textures.ref_count("steel"), Some(2));
    let textures_before = scene.device.state().textures.len();

    model.release(scene.device.as_ref(), &mut scene.textures);

    assert_eq!(scene.textures.ref_count("steel"), None);
    let state = scene.device.state();
    assert!(state.buffers.is_empty());
    assert_eq!(state.textures.len(), textures_before - 1);
}

#[test]
fn release_finishes_even_if_buffers_cannot_be_destroyed() {
    let resources =
        MemoryResourceProvider::new().with("steel", ResourceType::Tga, tga(1, 1, 3, |_, _| vec![9, 9, 9]));
    let mut scene = Scene::new(resources);
    let model = scene.load(
        SourceNode::dummy("root")
            .with_child(
                SourceNode::dummy("a").with_kind(SourceNodeKind::TriMesh(triangle(Some("steel")))),
            )
            .with_child(SourceNode::dummy("b").with_kind(SourceNodeKind::TriMesh(triangle(None)))),
    );
    scene.device.state().fail_destroy = true;

    model.release(scene.device.as_ref(), &mut scene.textures);

    assert_eq!(scene.textures.ref_count("steel"), None);
    let state = scene.device.state();
    let buffers = state.destroyed.iter().filter(|d| **d == "buffer").count();
    assert_eq!(buffers, 6);
}

#[test]
fn invalid_mesh_fails_to_load() {
    let mut scene = Scene::new(MemoryResourceProvider::new());
    let mut broken = triangle(None);
    broken.indices = vec![0, 1, 7];
    let result = Model::load(
        asset(
            SourceNode::dummy("bad").with_kind(SourceNodeKind::TriMesh(broken)),
            Vec::new(),
        ),
        scene.device.as_ref(),
        &mut scene.textures,
    );

    assert!(matches!(
        result,
        Err(RenderError::Asset(AssetError::InvalidModel { .. }))
    ));
}
