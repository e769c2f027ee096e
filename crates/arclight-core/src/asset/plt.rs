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

//! The layered paletted texture format.
//!
//! Layout: the 8-byte signature `PLT V1  `, 8 reserved bytes, little-endian `u32`
//! width and height, then one `(colour index, layer)` byte pair per pixel, rows
//! top to bottom.

use crate::renderer::error::AssetError;

const SIGNATURE: &[u8; 8] = b"PLT V1  ";
const HEADER_LEN: usize = 24;

/// The palette a PLT pixel's colour index is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PaletteLayer {
    /// Skin tones.
    Skin = 0,
    /// Hair colours.
    Hair,
    /// First metal tint.
    Metal1,
    /// Second metal tint.
    Metal2,
    /// First cloth tint.
    Cloth1,
    /// Second cloth tint.
    Cloth2,
    /// First leather tint.
    Leather1,
    /// Second leather tint.
    Leather2,
    /// First tattoo tint.
    Tattoo1,
    /// Second tattoo tint.
    Tattoo2,
}

impl PaletteLayer {
    /// Number of layers.
    pub const COUNT: usize = 10;

    /// Every layer in index order.
    pub const ALL: [PaletteLayer; Self::COUNT] = [
        PaletteLayer::Skin,
        PaletteLayer::Hair,
        PaletteLayer::Metal1,
        PaletteLayer::Metal2,
        PaletteLayer::Cloth1,
        PaletteLayer::Cloth2,
        PaletteLayer::Leather1,
        PaletteLayer::Leather2,
        PaletteLayer::Tattoo1,
        PaletteLayer::Tattoo2,
    ];

    /// Layer index as stored in the second byte of a PLT pixel.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks a layer up by its stored index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The palette image this layer reads its colours from.
    pub fn palette_resource(self) -> &'static str {
        match self {
            PaletteLayer::Skin => "pal_skin01",
            PaletteLayer::Hair => "pal_hair01",
            PaletteLayer::Metal1 => "pal_armor01",
            PaletteLayer::Metal2 => "pal_armor02",
            PaletteLayer::Cloth1 | PaletteLayer::Cloth2 => "pal_cloth01",
            PaletteLayer::Leather1 | PaletteLayer::Leather2 => "pal_leath01",
            PaletteLayer::Tattoo1 | PaletteLayer::Tattoo2 => "pal_tattoo01",
        }
    }
}

/// A decoded PLT image: two bytes per pixel, colour index then layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PltImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height` pairs of `(index, layer)`.
    pub pixels: Vec<u8>,
}

impl PltImage {
    /// Parses a PLT file.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let decode_err = |details: String| AssetError::Decode {
            name: name.to_owned(),
            details,
        };

        if bytes.len() < HEADER_LEN {
            return Err(decode_err(format!("truncated header ({} bytes)", bytes.len())));
        }
        if &bytes[..8] != SIGNATURE {
            return Err(decode_err("bad signature".into()));
        }
        let width = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let height = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        if width == 0 || height == 0 {
            return Err(decode_err(format!("empty image {width}x{height}")));
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(2))
            .ok_or_else(|| decode_err(format!("image too large {width}x{height}")))?;
        let body = &bytes[HEADER_LEN..];
        if body.len() < len {
            return Err(decode_err(format!(
                "expected {len} pixel bytes, found {}",
                body.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: body[..len].to_vec(),
        })
    }

    /// Serializes the image. Used to author fixtures.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.pixels.len());
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.pixels);
        out
    }

    /// The `(index, layer)` pair at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8) {
        let i = ((y * self.width + x) * 2) as usize;
        (self.pixels[i], self.pixels[i + 1])
    }
}

/// Builds a full mip chain by nearest-neighbour downsampling, level 0 first.
///
/// Indexed data cannot be averaged, so each texel of a smaller level copies
/// the top-left texel of its 2x2 parent block.
pub fn nearest_mip_chain(
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    level0: &[u8],
) -> Vec<(u32, u32, Vec<u8>)> {
    let mut levels = vec![(width, height, level0.to_vec())];
    let (mut w, mut h) = (width, height);
    while w > 1 || h > 1 {
        let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
        let Some((_, _, prev)) = levels.last() else {
            break;
        };
        let mut next = Vec::with_capacity(nw as usize * nh as usize * bytes_per_pixel);
        for y in 0..nh {
            let sy = (y * 2).min(h - 1);
            for x in 0..nw {
                let sx = (x * 2).min(w - 1);
                let src = (sy as usize * w as usize + sx as usize) * bytes_per_pixel;
                next.extend_from_slice(&prev[src..src + bytes_per_pixel]);
            }
        }
        levels.push((nw, nh, next));
        (w, h) = (nw, nh);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: u32, height: u32) -> PltImage {
        let pixels = (0..width * height)
            .flat_map(|i| [i as u8, (i % 10) as u8])
            .collect();
        PltImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn parses_header_and_pixels() {
        let image = sample(4, 2);
        let parsed = PltImage::parse("t", &image.to_bytes()).expect("valid plt");
        assert_eq!(parsed, image);
        assert_eq!(parsed.pixel(1, 1), (5, 5));
    }

    #[test]
    fn rejects_bad_signature_and_truncation() {
        let mut bytes = sample(2, 2).to_bytes();
        assert!(PltImage::parse("t", &bytes[..HEADER_LEN + 3]).is_err());
        bytes[0] = b'X';
        assert!(matches!(
            PltImage::parse("t", &bytes),
            Err(AssetError::Decode { .. })
        ));
        assert!(PltImage::parse("t", &[]).is_err());
    }

    #[test]
    fn rejects_zero_dimensions() {
        let image = PltImage {
            width: 0,
            height: 3,
            pixels: vec![],
        };
        assert!(PltImage::parse("t", &image.to_bytes()).is_err());
    }

    #[test]
    fn mip_chain_reaches_one_by_one() {
        let image = sample(8, 2);
        let chain = nearest_mip_chain(8, 2, 2, &image.pixels);
        let dims: Vec<_> = chain.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        for (w, h, data) in &chain {
            assert_eq!(data.len(), (*w * *h * 2) as usize);
        }
        // Level 1 texel 1 comes from level 0 texel (2, 0).
        assert_eq!(&chain[1].2[2..4], &image.pixels[4..6]);
    }

    #[test]
    fn layers_map_to_palettes() {
        assert_eq!(PaletteLayer::ALL.len(), PaletteLayer::COUNT);
        assert_eq!(PaletteLayer::from_index(9), Some(PaletteLayer::Tattoo2));
        assert_eq!(PaletteLayer::from_index(10), None);
        assert_eq!(PaletteLayer::Metal2.palette_resource(), "pal_armor02");
        assert_eq!(
            PaletteLayer::Cloth1.palette_resource(),
            PaletteLayer::Cloth2.palette_resource()
        );
    }
}
