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

//! Name-based access to the game's resource archives.

use std::collections::HashMap;
use std::fmt::Debug;

/// The resource formats the preview consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// DirectDraw surface image.
    Dds,
    /// Targa image.
    Tga,
    /// PNG image.
    Png,
    /// Paletted layered texture.
    Plt,
    /// Binary model.
    Mdl,
}

impl ResourceType {
    /// The file extension used for this type.
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceType::Dds => "dds",
            ResourceType::Tga => "tga",
            ResourceType::Png => "png",
            ResourceType::Plt => "plt",
            ResourceType::Mdl => "mdl",
        }
    }

    /// Parses a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "dds" => Some(ResourceType::Dds),
            "tga" => Some(ResourceType::Tga),
            "png" => Some(ResourceType::Png),
            "plt" => Some(ResourceType::Plt),
            "mdl" => Some(ResourceType::Mdl),
            _ => None,
        }
    }
}

/// Supplies raw resource bytes by name.
///
/// Names are resource references: case-insensitive and without extension.
pub trait ResourceProvider: Send + Sync + Debug {
    /// Returns the bytes of `name` stored as `ty`, if present.
    fn demand(&self, name: &str, ty: ResourceType) -> Option<Vec<u8>>;

    /// Tries each type of `types` in order and returns the first hit with its type.
    fn demand_in_order(&self, name: &str, types: &[ResourceType]) -> Option<(ResourceType, Vec<u8>)> {
        types
            .iter()
            .find_map(|ty| self.demand(name, *ty).map(|bytes| (*ty, bytes)))
    }

    /// Calls `visitor` with the name of every resource of type `ty`.
    fn visit(&self, ty: ResourceType, visitor: &mut dyn FnMut(&str));
}

/// An in-memory [`ResourceProvider`].
#[derive(Debug, Default, Clone)]
pub struct MemoryResourceProvider {
    resources: HashMap<(String, ResourceType), Vec<u8>>,
}

impl MemoryResourceProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, name: &str, ty: ResourceType, bytes: impl Into<Vec<u8>>) {
        self.resources
            .insert((name.to_ascii_lowercase(), ty), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: &str, ty: ResourceType, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, ty, bytes);
        self
    }

    /// Removes a resource, returning its bytes.
    pub fn remove(&mut self, name: &str, ty: ResourceType) -> Option<Vec<u8>> {
        self.resources.remove(&(name.to_ascii_lowercase(), ty))
    }
}

impl ResourceProvider for MemoryResourceProvider {
    fn demand(&self, name: &str, ty: ResourceType) -> Option<Vec<u8>> {
        self.resources
            .get(&(name.to_ascii_lowercase(), ty))
            .cloned()
    }

    fn visit(&self, ty: ResourceType, visitor: &mut dyn FnMut(&str)) {
        let mut names: Vec<&str> = self
            .resources
            .keys()
            .filter(|(_, t)| *t == ty)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        for name in names {
            visitor(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_in_order_prefers_earlier_types() {
        let provider = MemoryResourceProvider::new()
            .with("Body", ResourceType::Plt, vec![1])
            .with("body", ResourceType::Tga, vec![2]);
        let (ty, bytes) = provider
            .demand_in_order("BODY", &[ResourceType::Dds, ResourceType::Tga, ResourceType::Plt])
            .expect("found");
        assert_eq!(ty, ResourceType::Tga);
        assert_eq!(bytes, vec![2]);
        assert!(provider
            .demand_in_order("body", &[ResourceType::Dds])
            .is_none());
    }

    #[test]
    fn visit_filters_by_type() {
        let provider = MemoryResourceProvider::new()
            .with("b", ResourceType::Mdl, vec![])
            .with("a", ResourceType::Mdl, vec![])
            .with("c", ResourceType::Tga, vec![]);
        let mut seen = Vec::new();
        provider.visit(ResourceType::Mdl, &mut |name| seen.push(name.to_owned()));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn extensions_round_trip() {
        for ty in [ResourceType::Dds, ResourceType::Tga, ResourceType::Plt] {
            assert_eq!(ResourceType::from_extension(ty.extension()), Some(ty));
        }
        assert_eq!(ResourceType::from_extension("TGA"), Some(ResourceType::Tga));
        assert_eq!(ResourceType::from_extension("txt"), None);
    }
}
