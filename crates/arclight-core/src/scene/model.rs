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

//! Loading, animating and drawing a model's node tree.

use crate::asset::model::{MeshData, ModelAsset, SourceNode, SourceNodeKind};
use crate::renderer::api::{
    BindingResource, BufferDescriptor, BufferId, BufferUsage, IndexFormat, ShaderVariable,
};
use crate::renderer::error::{AssetError, RenderError};
use crate::renderer::pipeline_cache::{CONSTANTS_VARIABLE, JOINTS_VARIABLE, TEXTURE_VARIABLE};
use crate::renderer::shaders::MAX_JOINTS;
use crate::renderer::{GraphicsDevice, PsoKey, TextureCache};
use crate::scene::node::{GpuMesh, MeshNode, Node, NodeIndex, NodeKind, SkinNode};
use crate::scene::vertex::{Constants, JointPalette};
use crate::scene::DrawContext;
use glam::Mat4;
use std::borrow::Cow;
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Arc;

/// A loaded model: the root of a node tree with its GPU resources and animation state.
#[derive(Debug)]
pub struct Model {
    asset: Arc<ModelAsset>,
    nodes: Vec<Node>,
    root: NodeIndex,
    animation: Option<usize>,
    cursor_ms: u32,
    pose: Vec<Mat4>,
}

impl Model {
    /// Builds the node tree of `asset`, uploading geometry and resolving textures.
    ///
    /// Fails on structurally invalid mesh data. A mesh whose buffers cannot be
    /// created degrades to a plain transform node.
    pub fn load(
        asset: Arc<ModelAsset>,
        device: &dyn GraphicsDevice,
        textures: &mut TextureCache,
    ) -> Result<Self, RenderError> {
        asset.validate()?;
        let mut nodes = Vec::with_capacity(asset.node_count());
        let root = build_node(&asset.root, None, &mut nodes, device, textures);
        let mut model = Self {
            asset,
            nodes,
            root,
            animation: None,
            cursor_ms: 0,
            pose: Vec::new(),
        };
        model.initialize_skins();
        model.refresh_pose();
        log::info!(
            "Loaded model '{}' ({} nodes)",
            model.asset.name,
            model.nodes.len()
        );
        Ok(model)
    }

    /// Resolves every skin's joints and computes their inverse bind matrices.
    ///
    /// A skin naming a joint that does not exist is left unready and is not drawn.
    pub fn initialize_skins(&mut self) {
        let by_name: HashMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.as_str(), NodeIndex(i)))
            .collect();
        let bind_world = self.world_matrices(|n| n.bind.map_or(Mat4::IDENTITY, |t| t.to_matrix()));

        let mut resolved = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let NodeKind::Skin(skin) = &node.kind else {
                continue;
            };
            let joints: Option<Vec<NodeIndex>> = skin
                .joint_names
                .iter()
                .map(|name| by_name.get(name.as_str()).copied())
                .collect();
            let Some(joints) = joints else {
                log::warn!(
                    "Skin '{}' of '{}' references a missing joint",
                    node.name,
                    self.asset.name
                );
                continue;
            };
            if joints.len() > MAX_JOINTS {
                log::warn!(
                    "Skin '{}' has {} joints, only {MAX_JOINTS} are animated",
                    node.name,
                    joints.len()
                );
            }
            let inverse_bind = joints
                .iter()
                .map(|j| bind_world[j.0].inverse() * bind_world[i])
                .collect();
            resolved.push((i, joints, inverse_bind));
        }

        for (i, joints, inverse_bind) in resolved {
            if let NodeKind::Skin(skin) = &mut self.nodes[i].kind {
                skin.joints = joints;
                skin.inverse_bind = inverse_bind;
                skin.ready = true;
            }
        }
    }

    /// Binds the animation `name` and rewinds to its start.
    ///
    /// Returns `false` and keeps the current animation if the model has none by that name.
    pub fn load_animation(&mut self, name: &str) -> bool {
        let Some(index) = self
            .asset
            .animations
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
        else {
            log::warn!("Model '{}' has no animation '{name}'", self.asset.name);
            return false;
        };
        self.animation = Some(index);
        self.cursor_ms = 0;
        self.apply_animation();
        true
    }

    /// Advances the bound animation by `dt_ms`, looping at its end, and re-poses
    /// every node. Does nothing without an animation.
    pub fn update(&mut self, dt_ms: u32) {
        let Some(index) = self.animation else {
            return;
        };
        let length = self.asset.animations[index].length_ms;
        self.cursor_ms = if length == 0 {
            0
        } else {
            ((u64::from(self.cursor_ms) + u64::from(dt_ms)) % u64::from(length)) as u32
        };
        self.apply_animation();
    }

    /// Records the draws of the whole tree, `parent` being the root's parent transform.
    ///
    /// Nodes are visited parent first, children in authored order. A node that
    /// cannot be drawn is logged and skipped without affecting the others.
    pub fn draw(&self, ctx: &mut DrawContext<'_>, parent: Mat4) {
        self.draw_node(ctx, self.root, parent);
    }

    fn draw_node(&self, ctx: &mut DrawContext<'_>, index: NodeIndex, parent: Mat4) {
        let node = &self.nodes[index.0];
        let world = match node.local {
            Some(local) => parent * local.to_matrix(),
            None => parent,
        };
        if node.is_renderable() {
            if let Err(e) = self.draw_geometry(ctx, index, world) {
                log::warn!("Skipping node '{}': {e}", node.name);
            }
        }
        for child in &node.children {
            self.draw_node(ctx, *child, world);
        }
    }

    fn draw_geometry(
        &self,
        ctx: &mut DrawContext<'_>,
        index: NodeIndex,
        world: Mat4,
    ) -> Result<(), RenderError> {
        let node = &self.nodes[index.0];
        let (gpu, skin) = match &node.kind {
            NodeKind::Group => return Ok(()),
            NodeKind::Mesh(mesh) => (&mesh.gpu, None),
            NodeKind::Skin(skin) if skin.ready => (&skin.gpu, Some(skin)),
            NodeKind::Skin(_) => {
                return Err(RenderError::RenderingFailed("skin has unresolved joints".into()))
            }
        };

        let entry = ctx
            .pipelines
            .get_pso(node.key, ctx.shaders)
            .ok_or_else(|| RenderError::RenderingFailed(format!("no pipeline for {:?}", node.key)))?;

        let constants = Constants::new(world, ctx.view, ctx.proj, gpu.texture.paletted);
        ctx.device
            .write_buffer(gpu.constants_buffer, 0, bytemuck::bytes_of(&constants))?;

        let mut variables = vec![
            ShaderVariable::new(CONSTANTS_VARIABLE, BindingResource::Buffer(gpu.constants_buffer)),
            ShaderVariable::new(TEXTURE_VARIABLE, BindingResource::Texture(gpu.texture.texture)),
        ];
        if let Some(skin) = skin {
            let palette = JointPalette::from_matrices(&self.joint_matrices(index));
            ctx.device
                .write_buffer(skin.joints_buffer, 0, bytemuck::bytes_of(&palette))?;
            variables.push(ShaderVariable::new(
                JOINTS_VARIABLE,
                BindingResource::Buffer(skin.joints_buffer),
            ));
        }

        ctx.pass.set_pipeline(entry.pipeline);
        ctx.pass.commit_resources(entry.binding, &variables)?;
        ctx.pass.set_vertex_buffer(0, gpu.vertex_buffer, 0);
        ctx.pass
            .set_index_buffer(gpu.index_buffer, 0, IndexFormat::Uint32);
        ctx.pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        Ok(())
    }

    /// Current skinning matrices of the skin at `index`, in the skin node's own space.
    ///
    /// Empty for nodes that are not ready skins.
    pub fn joint_matrices(&self, index: NodeIndex) -> Vec<Mat4> {
        let NodeKind::Skin(skin) = &self.nodes[index.0].kind else {
            return Vec::new();
        };
        if !skin.ready {
            return Vec::new();
        }
        let to_mesh = self.pose[index.0].inverse();
        skin.joints
            .iter()
            .zip(&skin.inverse_bind)
            .take(MAX_JOINTS)
            .map(|(joint, inverse_bind)| to_mesh * self.pose[joint.0] * *inverse_bind)
            .collect()
    }

    /// Releases every GPU buffer and texture reference the model holds.
    pub fn release(self, device: &dyn GraphicsDevice, textures: &mut TextureCache) {
        for node in self.nodes {
            let (gpu, joints) = match node.kind {
                NodeKind::Group => continue,
                NodeKind::Mesh(mesh) => (mesh.gpu, None),
                NodeKind::Skin(skin) => (skin.gpu, Some(skin.joints_buffer)),
            };
            for buffer in [gpu.vertex_buffer, gpu.index_buffer, gpu.constants_buffer]
                .into_iter()
                .chain(joints)
            {
                discard_buffer(device, buffer);
            }
            if let Some(name) = gpu.texture_name {
                textures.release(&name);
            }
        }
    }

    /// The source asset.
    pub fn asset(&self) -> &Arc<ModelAsset> {
        &self.asset
    }

    /// The model's name.
    pub fn name(&self) -> &str {
        &self.asset.name
    }

    /// The root node.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// A node by index.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    /// Every node, in load order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Finds a node by name.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.name == name).map(NodeIndex)
    }

    /// Playback position in milliseconds.
    pub fn cursor_ms(&self) -> u32 {
        self.cursor_ms
    }

    /// Name of the bound animation.
    pub fn animation_name(&self) -> Option<&str> {
        self.animation
            .map(|i| self.asset.animations[i].name.as_str())
    }

    /// Model-space transform of `index` in the current pose.
    pub fn pose_matrix(&self, index: NodeIndex) -> Mat4 {
        self.pose[index.0]
    }

    fn apply_animation(&mut self) {
        let Some(index) = self.animation else {
            return;
        };
        let animation = &self.asset.animations[index];
        let time = self.cursor_ms as f32;
        for node in &mut self.nodes {
            node.local = match animation.track(&node.name) {
                Some(track) => Some(track.sample(time, &node.bind.unwrap_or_default())),
                None => node.bind,
            };
        }
        self.refresh_pose();
    }

    fn refresh_pose(&mut self) {
        self.pose = self.world_matrices(Node::local_matrix);
    }

    /// Model-space matrices of every node, using `local` for each node's own transform.
    fn world_matrices(&self, local: impl Fn(&Node) -> Mat4) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((index, parent)) = stack.pop() {
            let node = &self.nodes[index.0];
            let matrix = parent * local(node);
            world[index.0] = matrix;
            stack.extend(node.children.iter().map(|c| (*c, matrix)));
        }
        world
    }
}

fn build_node(
    source: &SourceNode,
    parent: Option<NodeIndex>,
    nodes: &mut Vec<Node>,
    device: &dyn GraphicsDevice,
    textures: &mut TextureCache,
) -> NodeIndex {
    let index = NodeIndex(nodes.len());
    let (kind, key) = match build_geometry(source, device, textures) {
        Ok(built) => built,
        Err(e) => {
            log::warn!("Node '{}' loaded without geometry: {e}", source.name);
            (NodeKind::Group, PsoKey::default())
        }
    };
    nodes.push(Node {
        name: source.name.clone(),
        bind: source.transform,
        local: source.transform,
        parent,
        children: Vec::with_capacity(source.children.len()),
        no_render: source.no_render,
        key,
        kind,
    });
    for child in &source.children {
        let child_index = build_node(child, Some(index), nodes, device, textures);
        nodes[index.0].children.push(child_index);
    }
    index
}

fn build_geometry(
    source: &SourceNode,
    device: &dyn GraphicsDevice,
    textures: &mut TextureCache,
) -> Result<(NodeKind, PsoKey), RenderError> {
    match &source.kind {
        SourceNodeKind::Dummy => Ok((NodeKind::Group, PsoKey::default())),
        SourceNodeKind::TriMesh(mesh) => {
            let vertices = mesh.rigid_vertices();
            let gpu = upload_mesh(&source.name, mesh, bytemuck::cast_slice(&vertices), device, textures)?;
            let key = PsoKey::new(mesh.diffuse_name().is_some(), false);
            Ok((NodeKind::Mesh(MeshNode { gpu }), key))
        }
        SourceNodeKind::Skin(skin) => {
            let vertices = skin.skinned_vertices();
            let joints_buffer = device.create_buffer(&BufferDescriptor {
                label: Some(Cow::Owned(format!("{}_joints", source.name))),
                size: size_of::<JointPalette>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })?;
            let gpu = match upload_mesh(
                &source.name,
                &skin.mesh,
                bytemuck::cast_slice(&vertices),
                device,
                textures,
            ) {
                Ok(gpu) => gpu,
                Err(e) => {
                    discard_buffer(device, joints_buffer);
                    return Err(e);
                }
            };
            let key = PsoKey::new(skin.mesh.diffuse_name().is_some(), true);
            Ok((
                NodeKind::Skin(SkinNode {
                    gpu,
                    joints_buffer,
                    joint_names: skin.joints.clone(),
                    joints: Vec::new(),
                    inverse_bind: Vec::new(),
                    ready: false,
                }),
                key,
            ))
        }
    }
}

fn discard_buffer(device: &dyn GraphicsDevice, buffer: BufferId) {
    if let Err(e) = device.destroy_buffer(buffer) {
        log::warn!("Failed to destroy buffer {buffer:?}: {e}");
    }
}

fn upload_mesh(
    name: &str,
    mesh: &MeshData,
    vertex_bytes: &[u8],
    device: &dyn GraphicsDevice,
    textures: &mut TextureCache,
) -> Result<GpuMesh, RenderError> {
    if mesh.indices.is_empty() || vertex_bytes.is_empty() {
        return Err(AssetError::InvalidModel {
            name: name.to_owned(),
            details: "mesh has no triangles".into(),
        }
        .into());
    }

    let vertex_buffer = device.create_buffer_with_data(
        &BufferDescriptor {
            label: Some(Cow::Owned(format!("{name}_vertices"))),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::VERTEX,
        },
        vertex_bytes,
    )?;
    let index_buffer = device
        .create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Owned(format!("{name}_indices"))),
                size: (mesh.indices.len() * size_of::<u32>()) as u64,
                usage: BufferUsage::INDEX,
            },
            bytemuck::cast_slice(&mesh.indices),
        )
        .inspect_err(|_| discard_buffer(device, vertex_buffer))?;
    let constants_buffer = device
        .create_buffer(&BufferDescriptor {
            label: Some(Cow::Owned(format!("{name}_constants"))),
            size: size_of::<Constants>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })
        .inspect_err(|_| {
            discard_buffer(device, vertex_buffer);
            discard_buffer(device, index_buffer);
        })?;

    let texture_name = mesh.diffuse_name().map(str::to_ascii_lowercase);
    let texture = textures.load_optional(texture_name.as_deref());
    // A name that fell back to the placeholder holds no reference.
    let texture_name = texture_name.filter(|_| texture != textures.placeholder());

    Ok(GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        constants_buffer,
        texture,
        texture_name,
    })
}
