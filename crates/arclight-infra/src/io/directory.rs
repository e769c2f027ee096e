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


use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arclight_core::asset::{ResourceProvider, ResourceType};

/// Serves loose `<resref>.<ext>` files from one directory.
///
/// The directory is indexed when the provider is created, so lookups ignore the case
/// of file names on case-sensitive file systems too. Files whose extension is not a
/// [`ResourceType`] are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryResourceProvider {
    root: PathBuf,
    index: HashMap<(String, ResourceType), PathBuf>,
}

impl DirectoryResourceProvider {
    /// Indexes `root`.
    ///
    /// # Errors
    /// Returns the I/O error if `root` cannot be listed.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let mut provider = Self {
            root: root.into(),
            index: HashMap::new(),
        };
        provider.rescan()?;
        Ok(provider)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuilds the index after files were added or removed.
    pub fn rescan(&mut self) -> io::Result<()> {
        self.index.clear();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let (Some(stem), Some(ty)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ResourceType::from_extension),
            ) else {
                continue;
            };
            let key = (stem.to_ascii_lowercase(), ty);
            if let Some(previous) = self.index.get(&key) {
                log::warn!(
                    "{} shadows {} (names are case-insensitive).",
                    path.display(),
                    previous.display()
                );
            }
            self.index.insert(key, path);
        }
        log::info!(
            "Indexed {} resources in {}",
            self.index.len(),
            self.root.display()
        );
        Ok(())
    }
}

impl ResourceProvider for DirectoryResourceProvider {
    fn demand(&self, name: &str, ty: ResourceType) -> Option<Vec<u8>> {
        let path = self.index.get(&(name.to_ascii_lowercase(), ty))?;
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                None
            }
        }
    }

    fn visit(&self, ty: ResourceType, visitor: &mut dyn FnMut(&str)) {
        let mut names: Vec<&str> = self
            .index
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
