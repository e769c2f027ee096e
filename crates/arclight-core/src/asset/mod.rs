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

//! Interfaces to the collaborators that supply raw assets, and the decoders
//! shipped with the core.

pub mod image;
pub mod model;
pub mod plt;
pub mod resource;

pub use self::image::{DecodedImage, ImageDecoder, StandardImageDecoder};
pub use self::model::{
    AnimationAsset, JsonModelParser, Key, MeshData, ModelAsset, ModelParser, NodeTrack, SkinData,
    SourceNode, SourceNodeKind,
};
pub use self::plt::{nearest_mip_chain, PaletteLayer, PltImage};
pub use self::resource::{MemoryResourceProvider, ResourceProvider, ResourceType};
