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

//! Reference-counted GPU textures resolved from resource names.

use crate::asset::image::{DecodedImage, ImageDecoder};
use crate::asset::plt::{nearest_mip_chain, PaletteLayer, PltImage};
use crate::asset::resource::{ResourceProvider, ResourceType};
use crate::renderer::api::*;
use crate::renderer::error::{AssetError, RenderError, ResourceError};
use crate::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Source formats a texture name resolves to, in priority order.
pub const TEXTURE_SEARCH_ORDER: [ResourceType; 3] =
    [ResourceType::Dds, ResourceType::Tga, ResourceType::Plt];

const PALETTE_SEARCH_ORDER: [ResourceType; 2] = [ResourceType::Dds, ResourceType::Tga];

const PLACEHOLDER_TGA: &[u8] = include_bytes!("placeholder.tga");

/// A resolved texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    /// The GPU texture.
    pub texture: TextureId,
    /// The source was a PLT: texels hold `(index, layer)` rather than colour.
    pub paletted: bool,
}

#[derive(Debug)]
struct TextureEntry {
    handle: TextureHandle,
    ref_count: u32,
}

/// The five shared samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSet {
    /// Linear filtering, repeating.
    pub default: SamplerId,
    /// Point filtering, repeating.
    pub nearest: SamplerId,
    /// Linear filtering, clamped to edge.
    pub clamp: SamplerId,
    /// Anisotropic filtering, repeating.
    pub anisotropic: SamplerId,
    /// Depth comparison, clamped to edge.
    pub comparison: SamplerId,
}

impl SamplerSet {
    /// Every sampler of the set.
    pub fn all(&self) -> [SamplerId; 5] {
        [
            self.default,
            self.nearest,
            self.clamp,
            self.anisotropic,
            self.comparison,
        ]
    }
}

/// Deduplicates textures by name and counts their users.
///
/// Names are case-insensitive. A name that fails to load resolves to the
/// placeholder and leaves no entry behind, so a later load can still succeed.
#[derive(Debug)]
pub struct TextureCache {
    device: Arc<dyn GraphicsDevice>,
    resources: Arc<dyn ResourceProvider>,
    decoder: Arc<dyn ImageDecoder>,
    entries: HashMap<String, TextureEntry>,
    placeholder: TextureId,
    palettes: [Option<TextureId>; PaletteLayer::COUNT],
    samplers: Option<SamplerSet>,
}

impl TextureCache {
    /// Creates the cache and uploads the placeholder texture.
    ///
    /// # Errors
    ///
    /// Fails when the placeholder cannot be decoded or uploaded. Nothing can be
    /// served without it.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        resources: Arc<dyn ResourceProvider>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, RenderError> {
        let placeholder = Self::load_placeholder(device.as_ref(), decoder.as_ref())?;
        Ok(Self {
            device,
            resources,
            decoder,
            entries: HashMap::new(),
            placeholder,
            palettes: [None; PaletteLayer::COUNT],
            samplers: None,
        })
    }

    /// Decodes the embedded grid image and uploads it as a single-mip RGBA texture.
    pub fn load_placeholder(
        device: &dyn GraphicsDevice,
        decoder: &dyn ImageDecoder,
    ) -> Result<TextureId, RenderError> {
        let image = decoder
            .decode("placeholder", ResourceType::Tga, PLACEHOLDER_TGA)
            .map_err(|e| RenderError::InitializationFailed(format!("placeholder texture: {e}")))?;
        upload_rgba(device, "placeholder", image)
            .map_err(|e| RenderError::InitializationFailed(format!("placeholder texture: {e}")))
    }

    /// The fallback texture.
    pub fn placeholder(&self) -> TextureHandle {
        TextureHandle {
            texture: self.placeholder,
            paletted: false,
        }
    }

    /// Resolves `name` to a texture.
    ///
    /// A cached name gains one reference. Otherwise the resource is fetched as
    /// DDS, TGA, then PLT; the first found is decoded and uploaded with a count
    /// of 1. Any failure returns the placeholder without counting.
    pub fn load(&mut self, name: &str) -> TextureHandle {
        let key = name.trim().to_ascii_lowercase();
        if key.is_empty() {
            return self.placeholder();
        }
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.ref_count += 1;
            return entry.handle;
        }

        match self.create(&key) {
            Ok(handle) => {
                log::debug!("Loaded texture '{key}' as {:?}", handle.texture);
                self.entries.insert(
                    key,
                    TextureEntry {
                        handle,
                        ref_count: 1,
                    },
                );
                handle
            }
            Err(e) => {
                log::warn!("Texture '{key}' unavailable, using placeholder: {e}");
                self.placeholder()
            }
        }
    }

    /// Like [`load`](Self::load), with `None` meaning "no texture".
    pub fn load_optional(&mut self, name: Option<&str>) -> TextureHandle {
        match name {
            Some(name) => self.load(name),
            None => self.placeholder(),
        }
    }

    /// Drops one reference to `name`, destroying the texture when none remain.
    ///
    /// Returns `true` if the texture was destroyed. Unknown names are ignored.
    pub fn release(&mut self, name: &str) -> bool {
        let key = name.trim().to_ascii_lowercase();
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return false;
        }
        if let Some(entry) = self.entries.remove(&key) {
            log::debug!("Releasing texture '{key}'");
            if let Err(e) = self.device.destroy_texture(entry.handle.texture) {
                log::warn!("Failed to destroy texture '{key}': {e}");
            }
        }
        true
    }

    /// Current reference count of `name`, `None` if it is not cached.
    pub fn ref_count(&self, name: &str) -> Option<u32> {
        self.entries
            .get(&name.trim().to_ascii_lowercase())
            .map(|e| e.ref_count)
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no name is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads the palette image of every [`PaletteLayer`]. Returns how many loaded.
    ///
    /// A layer whose image is missing or broken stays empty.
    pub fn load_palette_textures(&mut self) -> usize {
        for layer in PaletteLayer::ALL {
            let name = layer.palette_resource();
            let result = fetch(self.resources.as_ref(), name, &PALETTE_SEARCH_ORDER)
                .and_then(|(ty, bytes)| {
                    self.decoder
                        .decode(name, ty, &bytes)
                        .map_err(RenderError::from)
                })
                .and_then(|image| upload_rgba(self.device.as_ref(), name, image).map_err(Into::into));
            match result {
                Ok(texture) => {
                    if let Some(old) = self.palettes[layer.index()].replace(texture) {
                        discard_texture(self.device.as_ref(), old);
                    }
                }
                Err(e) => log::warn!("Palette layer {layer:?} skipped: {e}"),
            }
        }
        let loaded = self.palettes.iter().flatten().count();
        log::info!("Loaded {loaded}/{} palette layers.", PaletteLayer::COUNT);
        loaded
    }

    /// The palette texture of `layer`, if it loaded.
    ///
    /// No built-in pipeline samples these yet; `ps_textured` shows a paletted
    /// texture's index as luminance. They are kept for a palette lookup pass.
    pub fn palette(&self, layer: PaletteLayer) -> Option<TextureId> {
        self.palettes[layer.index()]
    }

    /// Creates the shared samplers. Later calls return the existing set.
    pub fn load_samplers(&mut self, max_anisotropy: u16) -> Result<SamplerSet, ResourceError> {
        if let Some(samplers) = self.samplers {
            log::debug!("Samplers already created");
            return Ok(samplers);
        }

        let device = self.device.as_ref();
        let linear = SamplerDescriptor::default();
        let clamped = SamplerDescriptor {
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            ..SamplerDescriptor::default()
        };
        let samplers = SamplerSet {
            default: device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed("sampler_default")),
                ..linear.clone()
            })?,
            nearest: device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed("sampler_nearest")),
                mag_filter: FilterMode::Nearest,
                min_filter: FilterMode::Nearest,
                mipmap_filter: FilterMode::Nearest,
                ..linear.clone()
            })?,
            clamp: device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed("sampler_clamp")),
                ..clamped.clone()
            })?,
            anisotropic: device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed("sampler_aniso")),
                anisotropy_clamp: max_anisotropy.max(1),
                ..linear
            })?,
            comparison: device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed("sampler_shadow")),
                compare: Some(CompareFunction::LessEqual),
                ..clamped
            })?,
        };
        self.samplers = Some(samplers);
        Ok(samplers)
    }

    /// The shared samplers, once created.
    pub fn samplers(&self) -> Option<SamplerSet> {
        self.samplers
    }

    /// Destroys every cached named texture regardless of its count.
    pub fn clear(&mut self) {
        for (name, entry) in self.entries.drain() {
            if let Err(e) = self.device.destroy_texture(entry.handle.texture) {
                log::warn!("Failed to destroy texture '{name}': {e}");
            }
        }
    }

    /// Destroys everything the cache owns: named textures, palettes, samplers
    /// and the placeholder. The cache must not be used afterwards.
    pub fn destroy_all(&mut self) {
        self.clear();
        for texture in self.palettes.iter_mut().filter_map(Option::take) {
            discard_texture(self.device.as_ref(), texture);
        }
        if let Some(samplers) = self.samplers.take() {
            for sampler in samplers.all() {
                if let Err(e) = self.device.destroy_sampler(sampler) {
                    log::warn!("Failed to destroy sampler {sampler:?}: {e}");
                }
            }
        }
        if let Err(e) = self.device.destroy_texture(self.placeholder) {
            log::warn!("Failed to destroy placeholder texture: {e}");
        }
    }

    fn create(&self, name: &str) -> Result<TextureHandle, RenderError> {
        let (ty, bytes) = fetch(self.resources.as_ref(), name, &TEXTURE_SEARCH_ORDER)?;
        if ty == ResourceType::Plt {
            let image = self.decoder.decode_plt(name, &bytes)?;
            let texture = upload_plt(self.device.as_ref(), name, &image)?;
            Ok(TextureHandle {
                texture,
                paletted: true,
            })
        } else {
            let image = self.decoder.decode(name, ty, &bytes)?;
            let texture = upload_rgba(self.device.as_ref(), name, image)?;
            Ok(TextureHandle {
                texture,
                paletted: false,
            })
        }
    }
}

fn fetch(
    resources: &dyn ResourceProvider,
    name: &str,
    order: &[ResourceType],
) -> Result<(ResourceType, Vec<u8>), RenderError> {
    let (ty, bytes) = resources
        .demand_in_order(name, order)
        .ok_or_else(|| AssetError::NotFound(name.to_owned()))?;
    if bytes.is_empty() {
        return Err(AssetError::Empty(name.to_owned()).into());
    }
    Ok((ty, bytes))
}

fn discard_texture(device: &dyn GraphicsDevice, texture: TextureId) {
    if let Err(e) = device.destroy_texture(texture) {
        log::warn!("Failed to destroy texture {texture:?}: {e}");
    }
}

fn upload_rgba(
    device: &dyn GraphicsDevice,
    name: &str,
    mut image: DecodedImage,
) -> Result<TextureId, ResourceError> {
    if image.flipped {
        image.flip_rows();
    }
    let (width, height) = (image.width, image.height);
    let pixels = image.into_rgba();
    let size = Extent3D::d2(width, height);
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(Cow::Borrowed(name)),
        size,
        mip_level_count: 1,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
    })?;
    if let Err(e) = device.write_texture(texture, 0, &pixels, width * 4, size) {
        discard_texture(device, texture);
        return Err(e);
    }
    Ok(texture)
}

fn upload_plt(
    device: &dyn GraphicsDevice,
    name: &str,
    image: &PltImage,
) -> Result<TextureId, ResourceError> {
    let levels = nearest_mip_chain(image.width, image.height, 2, &image.pixels);
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(Cow::Borrowed(name)),
        size: Extent3D::d2(image.width, image.height),
        mip_level_count: levels.len() as u32,
        format: TextureFormat::Rg8Unorm,
        usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
    })?;
    for (level, (w, h, data)) in levels.iter().enumerate() {
        if let Err(e) = device.write_texture(texture, level as u32, data, w * 2, Extent3D::d2(*w, *h))
        {
            discard_texture(device, texture);
            return Err(e);
        }
    }
    Ok(texture)
}
