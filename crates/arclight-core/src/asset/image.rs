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

//! Image decoding at the collaborator boundary.

use crate::asset::plt::PltImage;
use crate::asset::resource::ResourceType;
use crate::renderer::error::AssetError;
use image::{DynamicImage, ImageFormat};
use std::fmt::Debug;

/// A decoded 8-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// 3 (RGB) or 4 (RGBA).
    pub channels: u8,
    /// `width * height * channels` bytes.
    pub pixels: Vec<u8>,
    /// Rows are stored bottom to top.
    pub flipped: bool,
}

impl DecodedImage {
    /// Returns the image as tightly packed RGBA.
    ///
    /// Three-channel pixels keep their colour and get a fully opaque alpha.
    pub fn into_rgba(self) -> Vec<u8> {
        match self.channels {
            4 => self.pixels,
            3 => {
                let mut rgba = Vec::with_capacity(self.pixels.len() / 3 * 4);
                for px in self.pixels.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
                }
                rgba
            }
            n => {
                // Other layouts never leave a decoder; treat them as grey.
                let n = n.max(1) as usize;
                self.pixels
                    .chunks_exact(n)
                    .flat_map(|px| [px[0], px[0], px[0], u8::MAX])
                    .collect()
            }
        }
    }

    /// Reverses row order in place and clears [`flipped`](Self::flipped).
    pub fn flip_rows(&mut self) {
        let stride = self.width as usize * self.channels as usize;
        if stride == 0 {
            return;
        }
        let rows = self.pixels.len() / stride;
        for y in 0..rows / 2 {
            let (top, bottom) = self.pixels.split_at_mut((rows - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
        self.flipped = !self.flipped;
    }
}

/// Decodes raw resource bytes into pixels.
pub trait ImageDecoder: Send + Sync + Debug {
    /// Decodes a DDS, TGA or PNG resource.
    fn decode(&self, name: &str, ty: ResourceType, bytes: &[u8])
        -> Result<DecodedImage, AssetError>;

    /// Decodes a PLT resource.
    fn decode_plt(&self, name: &str, bytes: &[u8]) -> Result<PltImage, AssetError> {
        PltImage::parse(name, bytes)
    }
}

/// [`ImageDecoder`] backed by the `image` crate.
///
/// Output rows are always top to bottom.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardImageDecoder;

impl ImageDecoder for StandardImageDecoder {
    fn decode(
        &self,
        name: &str,
        ty: ResourceType,
        bytes: &[u8],
    ) -> Result<DecodedImage, AssetError> {
        let format = match ty {
            ResourceType::Dds => ImageFormat::Dds,
            ResourceType::Tga => ImageFormat::Tga,
            ResourceType::Png => ImageFormat::Png,
            other => {
                return Err(AssetError::Decode {
                    name: name.to_owned(),
                    details: format!("{other:?} is not an image format"),
                })
            }
        };
        let image =
            image::load_from_memory_with_format(bytes, format).map_err(|e| AssetError::Decode {
                name: name.to_owned(),
                details: e.to_string(),
            })?;

        let (width, height) = (image.width(), image.height());
        let (channels, pixels) = match image {
            DynamicImage::ImageRgb8(rgb) => (3, rgb.into_raw()),
            luma @ DynamicImage::ImageLuma8(_) => (3, luma.to_rgb8().into_raw()),
            other => (4, other.to_rgba8().into_raw()),
        };
        Ok(DecodedImage {
            width,
            height,
            channels,
            pixels,
            flipped: false,
        })
    }
}
